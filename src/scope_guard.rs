use serde::Serialize;

use crate::text::{Tokens, parse_count};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeCategory {
    DateRange,
    QuarterOrClutch,
    PlayerStats,
    LiveData,
    Prediction,
    ShotData,
    Playoffs,
    CustomFormula,
}

impl ScopeCategory {
    pub fn label(self) -> &'static str {
        match self {
            ScopeCategory::DateRange => "custom date ranges",
            ScopeCategory::QuarterOrClutch => "quarter or clutch filtering",
            ScopeCategory::PlayerStats => "player-level statistics",
            ScopeCategory::LiveData => "live data",
            ScopeCategory::Prediction => "predictions",
            ScopeCategory::ShotData => "shot location and play-by-play data",
            ScopeCategory::Playoffs => "playoff-only filters",
            ScopeCategory::CustomFormula => "custom formulas",
        }
    }
}

/// One disallowed concept: any of `patterns` (whole words or phrases) triggers it.
#[derive(Debug, Clone, Serialize)]
pub struct DenyRule {
    pub category: ScopeCategory,
    pub patterns: &'static [&'static str],
    pub reason: &'static str,
    pub alternative: &'static str,
}

pub static DENY_RULES: &[DenyRule] = &[
    DenyRule {
        category: ScopeCategory::QuarterOrClutch,
        patterns: &[
            "clutch",
            "quarter",
            "quarters",
            "4th quarter",
            "crunch time",
            "close games",
            "first half",
            "second half",
            "halftime",
            "overtime",
        ],
        reason: "Quarter and clutch filtering is not supported; metrics cover whole games only.",
        alternative: "Top 10 teams by net rating over the last 10 games",
    },
    DenyRule {
        category: ScopeCategory::DateRange,
        patterns: &[
            "since",
            "between",
            "after",
            "before",
            "yesterday",
            "last week",
            "last month",
            "this week",
            "this month",
            "christmas",
            "all-star break",
            "january",
            "february",
            "march",
            "in may",
            "during may",
            "april",
            "june",
            "july",
            "august",
            "september",
            "october",
            "november",
            "december",
            "date range",
        ],
        reason: "Custom date ranges are not supported; use SEASON, LAST_5, LAST_10 or LAST_20.",
        alternative: "Top teams by offensive rating over the last 20 games",
    },
    DenyRule {
        category: ScopeCategory::PlayerStats,
        patterns: &[
            "player",
            "players",
            "starter",
            "starters",
            "bench",
            "rookie",
            "rookies",
            "mvp",
            "lebron",
            "curry",
            "jokic",
            "giannis",
        ],
        reason: "Player-level statistics are not supported; only team performance is analysed.",
        alternative: "Compare Lakers and Warriors",
    },
    DenyRule {
        category: ScopeCategory::LiveData,
        patterns: &["live", "real-time", "real time", "right now", "tonight", "today", "in-game"],
        reason: "Live data is not supported; results cover completed games only.",
        alternative: "Top teams by net rating this season",
    },
    DenyRule {
        category: ScopeCategory::Prediction,
        patterns: &[
            "predict",
            "prediction",
            "predictions",
            "will",
            "forecast",
            "projected",
            "projection",
            "odds",
            "future",
            "next season",
            "next game",
        ],
        reason: "Predictions are not supported; only historical performance is shown.",
        alternative: "Top 10 teams by net rating over the last 10 games",
    },
    DenyRule {
        category: ScopeCategory::ShotData,
        patterns: &["shot chart", "shot charts", "shot location", "play-by-play", "play by play"],
        reason: "Shot location and play-by-play data are not available; metrics come from team box scores.",
        alternative: "Show the shooting landscape (eFG% vs TS%)",
    },
    DenyRule {
        category: ScopeCategory::Playoffs,
        patterns: &["playoff", "playoffs", "postseason", "play-in"],
        reason: "Playoff-only filters are not supported; the dataset covers the regular season.",
        alternative: "Top teams by net rating this season",
    },
    DenyRule {
        category: ScopeCategory::CustomFormula,
        patterns: &["custom", "formula", "my own", "weighted"],
        reason: "Custom formulas are not supported; use ORtg, DRtg, NET_RTG, eFG%, TS%, PACE, AST_RATE, TOV_RATE or PPG.",
        alternative: "Top 10 teams by true shooting",
    },
];

/// Static denylist consulted before any positive intent matching.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScopeGuard;

impl ScopeGuard {
    pub fn rules(&self) -> &'static [DenyRule] {
        DENY_RULES
    }

    /// First rule with a matching pattern, in table order.
    pub fn check(&self, tokens: &Tokens) -> Option<(&'static DenyRule, &'static str)> {
        DENY_RULES.iter().find_map(|rule| {
            let hit = rule.patterns.iter().copied().find(|p| tokens.contains_phrase(p));
            let hit = match rule.category {
                ScopeCategory::DateRange => hit.or_else(|| date_shape(tokens)),
                _ => hit,
            };
            hit.map(|p| (rule, p))
        })
    }
}

const CALENDAR_UNITS: &[&str] = &["day", "days", "week", "weeks", "month", "months"];

/// Date spans no fixed phrase covers: "last 10 days" and explicit dates such as
/// `2024-01-01` or `1/15/2024`.
fn date_shape(tokens: &Tokens) -> Option<&'static str> {
    for (idx, token) in tokens.as_slice().iter().enumerate() {
        if is_calendar_date(token) {
            return Some("calendar date");
        }
        let relative = matches!(token.as_str(), "last" | "past" | "previous" | "next")
            && tokens.get(idx + 1).and_then(parse_count).is_some()
            && tokens.get(idx + 2).is_some_and(|unit| CALENDAR_UNITS.contains(&unit));
        if relative {
            return Some("last N days");
        }
    }
    None
}

// Three numeric fields; two-field labels like 2023-24 are seasons.
fn is_calendar_date(token: &str) -> bool {
    let fields: Vec<&str> = token.split(['-', '/']).collect();
    fields.len() == 3
        && fields
            .iter()
            .all(|f| !f.is_empty() && f.len() <= 4 && f.chars().all(|c| c.is_ascii_digit()))
}
