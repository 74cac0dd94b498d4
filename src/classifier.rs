use once_cell::sync::Lazy;
use serde::Serialize;
use tracing::debug;

use crate::dataset::SeasonDataset;
use crate::error::{QueryError, Result};
use crate::metrics::Metric;
use crate::query::{QueryRequest, QuerySpec, SortOrder, ValidatedQuery};
use crate::scope_guard::{ScopeCategory, ScopeGuard};
use crate::season_index::{SeasonIndex, normalize_season_label};
use crate::teams::TEAM_PHRASES;
use crate::text::{Tokens, parse_count};
use crate::validator::{QueryValidator, default_order};

pub const DEFAULT_TOP_N: usize = 10;

const GENERIC_SUGGESTIONS: &[&str] = &[
    "Top 10 teams by net rating over the last 10 games",
    "Show the efficiency landscape",
    "Compare Celtics and Lakers",
];

/// Explicit per-request season context; nothing here is global.
#[derive(Debug, Clone, Copy)]
pub struct QueryContext<'a> {
    pub index: &'a SeasonIndex,
    pub selected_season: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassifiedQuery {
    /// Season the query was validated against (and should run on).
    pub season: String,
    /// True when the utterance named a season other than the selected one.
    pub season_override: bool,
    pub query: ValidatedQuery,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifierResult {
    Structured(ClassifiedQuery),
    Clarify {
        question: String,
        season: String,
        candidates: Vec<QuerySpec>,
    },
    OutOfScope {
        reason: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        category: Option<ScopeCategory>,
        suggestions: Vec<String>,
    },
}

/// Maps free text to a structured request. The rule-based implementation below is one
/// strategy; the validator and aggregator never depend on how classification happens.
pub trait QueryClassifier {
    fn classify(&self, utterance: &str, ctx: &QueryContext<'_>) -> ClassifierResult;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Strength {
    None,
    Weak,
    Strong,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Chart {
    Leaderboard,
    Scatter,
    Compare,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OrderWord {
    Better,
    Worse,
    Highest,
    Lowest,
}

static METRIC_PHRASES: Lazy<Vec<(Vec<&'static str>, Metric)>> = Lazy::new(|| {
    let table: &[(&str, Metric)] = &[
        ("net rating", Metric::NetRtg),
        ("net ratings", Metric::NetRtg),
        ("net rtg", Metric::NetRtg),
        ("net_rtg", Metric::NetRtg),
        ("netrtg", Metric::NetRtg),
        ("point differential", Metric::NetRtg),
        ("plus minus", Metric::NetRtg),
        ("plus-minus", Metric::NetRtg),
        ("offensive rating", Metric::ORtg),
        ("offensive ratings", Metric::ORtg),
        ("off rating", Metric::ORtg),
        ("off rtg", Metric::ORtg),
        ("ortg", Metric::ORtg),
        ("offense", Metric::ORtg),
        ("offenses", Metric::ORtg),
        ("offensive", Metric::ORtg),
        ("defensive rating", Metric::DRtg),
        ("defensive ratings", Metric::DRtg),
        ("def rating", Metric::DRtg),
        ("def rtg", Metric::DRtg),
        ("drtg", Metric::DRtg),
        ("defense", Metric::DRtg),
        ("defenses", Metric::DRtg),
        ("defensive", Metric::DRtg),
        ("points allowed", Metric::DRtg),
        ("pace", Metric::Pace),
        ("tempo", Metric::Pace),
        ("points per game", Metric::Ppg),
        ("ppg", Metric::Ppg),
        ("scoring", Metric::Ppg),
        ("points", Metric::Ppg),
        ("effective field goal percentage", Metric::EfgPct),
        ("effective field goal", Metric::EfgPct),
        ("effective fg", Metric::EfgPct),
        ("efg", Metric::EfgPct),
        ("true shooting percentage", Metric::TsPct),
        ("true shooting", Metric::TsPct),
        ("ts", Metric::TsPct),
        ("assist rate", Metric::AstRate),
        ("ast rate", Metric::AstRate),
        ("ast_rate", Metric::AstRate),
        ("assists", Metric::AstRate),
        ("assist", Metric::AstRate),
        ("turnover rate", Metric::TovRate),
        ("tov rate", Metric::TovRate),
        ("tov_rate", Metric::TovRate),
        ("turnovers", Metric::TovRate),
        ("turnover", Metric::TovRate),
        ("tov", Metric::TovRate),
    ];
    let mut out: Vec<(Vec<&'static str>, Metric)> = table
        .iter()
        .map(|(phrase, metric)| (phrase.split(' ').collect(), *metric))
        .collect();
    out.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
    out
});

const RANKING_WORDS: &[&str] = &[
    "top", "best", "worst", "bottom", "rank", "ranked", "ranking", "rankings", "leaderboard",
    "leaders", "leader", "highest", "lowest", "most", "fewest", "least",
];
const SCATTER_WORDS: &[&str] = &["scatter", "plot", "landscape"];
const COMPARE_WORDS: &[&str] = &["compare", "comparison", "vs", "versus", "head-to-head", "matchup"];
const SEASON_WINDOW_PHRASES: &[&str] = &["this season", "full season", "whole season", "season-long", "ytd", "to date"];

/// Everything pulled out of one utterance before chart resolution.
#[derive(Debug, Default)]
struct Signals {
    metrics: Vec<Metric>,
    teams: Vec<&'static str>,
    window: Option<String>,
    top_n: Option<i64>,
    order: Option<OrderWord>,
    ranking: bool,
    scatter_word: bool,
    efficiency: bool,
    shooting: bool,
    compare_word: bool,
}

impl Signals {
    fn extract(tokens: &Tokens) -> Self {
        let mut used = vec![false; tokens.len()];
        let mut out = Signals::default();

        if let Some(season_pos) = (0..tokens.len())
            .find(|i| tokens.get(*i).and_then(normalize_season_label).is_some())
        {
            used[season_pos] = true;
        }

        out.window = extract_window(tokens, &mut used);

        let metric_hits = match_phrases(tokens, METRIC_PHRASES.as_slice(), &mut used);
        for (_, metric) in metric_hits {
            if !out.metrics.contains(&metric) {
                out.metrics.push(metric);
            }
        }

        let team_hits = match_phrases(tokens, TEAM_PHRASES.as_slice(), &mut used);
        for (_, abbr) in team_hits {
            if !out.teams.contains(&abbr) {
                out.teams.push(abbr);
            }
        }

        for (idx, token) in tokens.as_slice().iter().enumerate() {
            if used[idx] {
                continue;
            }
            let token = token.as_str();
            if RANKING_WORDS.contains(&token) {
                out.ranking = true;
                if out.order.is_none() {
                    out.order = order_word(token);
                }
                if out.top_n.is_none() && matches!(token, "top" | "best" | "worst" | "bottom") {
                    out.top_n = tokens.get(idx + 1).and_then(parse_count);
                }
            }
            out.scatter_word |= SCATTER_WORDS.contains(&token);
            out.compare_word |= COMPARE_WORDS.contains(&token);
            out.efficiency |= token == "efficiency";
            out.shooting |= token == "shooting";
        }
        out
    }

    fn strength(&self, chart: Chart) -> Strength {
        match chart {
            Chart::Leaderboard if self.ranking => Strength::Strong,
            Chart::Leaderboard if self.metrics.len() == 1 => Strength::Weak,
            Chart::Scatter if self.scatter_word => Strength::Strong,
            Chart::Scatter if self.metrics.len() >= 2 && self.teams.len() < 2 => Strength::Strong,
            Chart::Scatter if self.efficiency => Strength::Weak,
            Chart::Compare if self.teams.len() >= 2 => Strength::Strong,
            Chart::Compare if self.compare_word || self.teams.len() == 1 => Strength::Weak,
            _ => Strength::None,
        }
    }
}

/// Pattern-based classifier: denylist first, then season, metric, window, chart and team
/// matching, then validation.
#[derive(Debug, Clone, Copy)]
pub struct RuleBasedClassifier {
    guard: ScopeGuard,
    default_top_n: usize,
}

impl Default for RuleBasedClassifier {
    fn default() -> Self {
        Self {
            guard: ScopeGuard,
            default_top_n: DEFAULT_TOP_N,
        }
    }
}

impl RuleBasedClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_top_n(mut self, top_n: usize) -> Self {
        self.default_top_n = top_n.max(1);
        self
    }

    fn resolve(&self, tokens: &Tokens, dataset: &SeasonDataset, season_override: bool) -> ClassifierResult {
        let signals = Signals::extract(tokens);
        let validator = QueryValidator::new(dataset);

        let charts = [Chart::Leaderboard, Chart::Scatter, Chart::Compare];
        let best = charts
            .iter()
            .map(|c| signals.strength(*c))
            .max()
            .unwrap_or(Strength::None);

        if best == Strength::None {
            return out_of_scope(
                "Unrecognized request: no supported metric or chart type was found.".to_string(),
                None,
                GENERIC_SUGGESTIONS.iter().map(|s| s.to_string()).collect(),
            );
        }

        let tied: Vec<Chart> = charts
            .into_iter()
            .filter(|c| signals.strength(*c) == best)
            .collect();

        if tied.len() > 1 {
            let requests: Vec<QueryRequest> = tied
                .iter()
                .filter_map(|chart| self.candidate_request(*chart, &signals, dataset))
                .collect();
            let candidates = match validate_candidates(&validator, &requests) {
                Ok(candidates) => candidates,
                Err(err) => return rejected(err),
            };
            let question = format!(
                "Did you mean {}?",
                candidates
                    .iter()
                    .map(|spec| describe_spec(spec, dataset))
                    .collect::<Vec<_>>()
                    .join(", or ")
            );
            return clarify(question, dataset, candidates);
        }

        let request = match tied[0] {
            Chart::Leaderboard => match signals.metrics.len() {
                1 => self.leaderboard_request(signals.metrics[0], &signals, dataset),
                0 => {
                    let candidates = [Metric::NetRtg, Metric::ORtg, Metric::DRtg]
                        .into_iter()
                        .map(|m| self.leaderboard_request(m, &signals, dataset))
                        .collect::<Vec<_>>();
                    return clarify_with(
                        "Which metric should teams be ranked by?",
                        dataset,
                        &validator,
                        candidates,
                    );
                }
                _ => {
                    let candidates = signals
                        .metrics
                        .iter()
                        .map(|m| self.leaderboard_request(*m, &signals, dataset))
                        .collect::<Vec<_>>();
                    return clarify_with(
                        "A leaderboard ranks one metric. Which one should it use?",
                        dataset,
                        &validator,
                        candidates,
                    );
                }
            },
            Chart::Scatter => match scatter_axes(&signals) {
                Some((x, y)) => scatter_request(x, y, &signals),
                None => {
                    let x = signals.metrics[0];
                    let candidates = [Metric::ORtg, Metric::DRtg, Metric::NetRtg]
                        .into_iter()
                        .filter(|y| *y != x)
                        .map(|y| scatter_request(x, y, &signals))
                        .collect::<Vec<_>>();
                    return clarify_with(
                        &format!("Which metric should be plotted against {x}?"),
                        dataset,
                        &validator,
                        candidates,
                    );
                }
            },
            Chart::Compare => match signals.teams.as_slice() {
                [a, b] => compare_request(a, b, &signals),
                [a] => {
                    return clarify_with(
                        &format!("Which team should {} be compared with?", a.to_uppercase()),
                        dataset,
                        &validator,
                        compare_partners(a, &signals, dataset),
                    );
                }
                [] => {
                    let example: Vec<&str> = dataset
                        .teams()
                        .take(2)
                        .map(|t| t.abbreviation.as_str())
                        .collect();
                    let candidates = match example.as_slice() {
                        [a, b] => vec![compare_request(a, b, &signals)],
                        _ => Vec::new(),
                    };
                    return clarify_with(
                        "Which two teams should be compared?",
                        dataset,
                        &validator,
                        candidates,
                    );
                }
                [a, b, c, ..] => {
                    let candidates = vec![
                        compare_request(a, b, &signals),
                        compare_request(a, c, &signals),
                        compare_request(b, c, &signals),
                    ];
                    return clarify_with(
                        "A comparison covers two teams. Which pair did you mean?",
                        dataset,
                        &validator,
                        candidates,
                    );
                }
            },
        };

        match validator.validate(&request) {
            Ok(query) => {
                debug!(season = dataset.season(), spec = ?query.spec(), "classified as structured query");
                ClassifierResult::Structured(ClassifiedQuery {
                    season: dataset.season().to_string(),
                    season_override,
                    query,
                })
            }
            Err(err) => rejected(err),
        }
    }

    fn leaderboard_request(&self, metric: Metric, signals: &Signals, dataset: &SeasonDataset) -> QueryRequest {
        let top_n = signals.top_n.unwrap_or_else(|| {
            self.default_top_n.min(dataset.team_count()).max(1) as i64
        });
        let order = signals.order.and_then(|word| match word {
            OrderWord::Better => None,
            OrderWord::Worse => Some(default_order(metric).reversed()),
            OrderWord::Highest => Some(SortOrder::Desc),
            OrderWord::Lowest => Some(SortOrder::Asc),
        });
        QueryRequest::Leaderboard {
            metric: metric.name().to_string(),
            top_n,
            window: signals.window.clone(),
            order,
        }
    }

    fn candidate_request(&self, chart: Chart, signals: &Signals, dataset: &SeasonDataset) -> Option<QueryRequest> {
        match chart {
            Chart::Leaderboard => signals
                .metrics
                .first()
                .map(|m| self.leaderboard_request(*m, signals, dataset)),
            Chart::Scatter => {
                let (x, y) = match signals.metrics.as_slice() {
                    [x, y, ..] => (*x, *y),
                    _ if signals.shooting => (Metric::EfgPct, Metric::TsPct),
                    _ => (Metric::ORtg, Metric::DRtg),
                };
                Some(scatter_request(x, y, signals))
            }
            Chart::Compare => match signals.teams.as_slice() {
                [a, b, ..] => Some(compare_request(a, b, signals)),
                _ => None,
            },
        }
    }
}

impl QueryClassifier for RuleBasedClassifier {
    fn classify(&self, utterance: &str, ctx: &QueryContext<'_>) -> ClassifierResult {
        let tokens = Tokens::new(utterance);

        if let Some((rule, pattern)) = self.guard.check(&tokens) {
            debug!(category = rule.category.label(), pattern, "scope guard rejected utterance");
            return out_of_scope(
                rule.reason.to_string(),
                Some(rule.category),
                vec![rule.alternative.to_string()],
            );
        }

        let mentioned = tokens
            .as_slice()
            .iter()
            .find_map(|t| normalize_season_label(t));
        let season = match mentioned {
            Some(label) if !ctx.index.contains(&label) => {
                let closest = ctx.index.closest_seasons(&label, 3);
                let reason = if closest.is_empty() {
                    format!("Season {label} is not available and no seasons are loaded.")
                } else {
                    format!(
                        "Season {label} is not available. Closest seasons: {}.",
                        closest.join(", ")
                    )
                };
                return out_of_scope(
                    reason,
                    None,
                    closest
                        .iter()
                        .map(|s| format!("Top 10 teams by net rating in {s}"))
                        .collect(),
                );
            }
            Some(label) => label,
            None => ctx.selected_season.to_string(),
        };

        let dataset = match ctx.index.snapshot(&season) {
            Ok(dataset) => dataset,
            Err(err) => {
                return out_of_scope(
                    format!("{err}; select one of: {}.", ctx.index.seasons().join(", ")),
                    None,
                    GENERIC_SUGGESTIONS.iter().map(|s| s.to_string()).collect(),
                );
            }
        };

        let season_override = season != ctx.selected_season;
        self.resolve(&tokens, &dataset, season_override)
    }
}

/// `last N` only counts as a game window when followed by "games" or nothing.
fn extract_window(tokens: &Tokens, used: &mut [bool]) -> Option<String> {
    for idx in 0..tokens.len() {
        let token = tokens.get(idx).unwrap_or_default();
        if matches!(token, "last" | "past" | "previous" | "recent") {
            if let Some(n) = tokens.get(idx + 1).and_then(parse_count) {
                let span = match tokens.get(idx + 2) {
                    None => 2,
                    Some("games" | "game") => 3,
                    Some(_) => continue,
                };
                used[idx..idx + span].iter_mut().for_each(|u| *u = true);
                return Some(format!("LAST_{n}"));
            }
        }
        if let Some(n) = token.strip_prefix('l').and_then(|rest| rest.parse::<i64>().ok()) {
            used[idx] = true;
            return Some(format!("LAST_{n}"));
        }
    }
    for phrase in SEASON_WINDOW_PHRASES {
        let words: Vec<&str> = phrase.split(' ').collect();
        if let Some(start) = tokens.word_positions(&words).first() {
            used[*start..*start + words.len()].iter_mut().for_each(|u| *u = true);
            return Some("SEASON".to_string());
        }
    }
    None
}

/// Longest phrases claim their tokens first; hits come back in mention order.
fn match_phrases<T: Copy>(tokens: &Tokens, phrases: &[(Vec<&str>, T)], used: &mut [bool]) -> Vec<(usize, T)> {
    let mut hits = Vec::new();
    for (words, value) in phrases {
        for start in tokens.word_positions(words) {
            let span = start..start + words.len();
            if used[span.clone()].iter().any(|u| *u) {
                continue;
            }
            used[span].iter_mut().for_each(|u| *u = true);
            hits.push((start, *value));
        }
    }
    hits.sort_by_key(|(pos, _)| *pos);
    hits
}

fn order_word(token: &str) -> Option<OrderWord> {
    match token {
        "top" | "best" | "leaders" | "leader" => Some(OrderWord::Better),
        "worst" | "bottom" => Some(OrderWord::Worse),
        "highest" | "most" => Some(OrderWord::Highest),
        "lowest" | "fewest" | "least" => Some(OrderWord::Lowest),
        _ => None,
    }
}

fn scatter_axes(signals: &Signals) -> Option<(Metric, Metric)> {
    match signals.metrics.as_slice() {
        [x, y, ..] => Some((*x, *y)),
        [] if signals.shooting => Some((Metric::EfgPct, Metric::TsPct)),
        [] => Some((Metric::ORtg, Metric::DRtg)),
        [Metric::ORtg] | [Metric::DRtg] => Some((Metric::ORtg, Metric::DRtg)),
        [_] => None,
    }
}

fn scatter_request(x: Metric, y: Metric, signals: &Signals) -> QueryRequest {
    QueryRequest::Scatter {
        x_metric: x.name().to_string(),
        y_metric: y.name().to_string(),
        window: signals.window.clone(),
    }
}

fn compare_request(a: &str, b: &str, signals: &Signals) -> QueryRequest {
    QueryRequest::Compare {
        team_a: a.to_string(),
        team_b: b.to_string(),
        window: signals.window.clone(),
    }
}

/// The named team paired with the first few other teams of the season.
fn compare_partners(team: &str, signals: &Signals, dataset: &SeasonDataset) -> Vec<QueryRequest> {
    let anchor = dataset.find_team(team).map(|t| t.id);
    let partners: Vec<QueryRequest> = dataset
        .teams()
        .filter(|t| Some(t.id) != anchor)
        .take(3)
        .map(|t| compare_request(team, &t.abbreviation, signals))
        .collect();
    if partners.is_empty() {
        // Validation reports why the lone team cannot be compared.
        return vec![compare_request(team, team, signals)];
    }
    partners
}

fn describe_spec(spec: &QuerySpec, dataset: &SeasonDataset) -> String {
    let team = |id| {
        dataset
            .team(id)
            .map(|t| t.abbreviation.clone())
            .unwrap_or_else(|| id.to_string())
    };
    match spec {
        QuerySpec::Leaderboard { metric, window, top_n, .. } => {
            format!("the top {top_n} teams by {metric} ({window})")
        }
        QuerySpec::Scatter { x_metric, y_metric, window } => {
            format!("a scatter of {x_metric} vs {y_metric} for every team ({window})")
        }
        QuerySpec::Compare { team_a, team_b, window } => {
            format!("a comparison of {} and {} ({window})", team(*team_a), team(*team_b))
        }
    }
}

fn clarify(question: String, dataset: &SeasonDataset, candidates: Vec<QuerySpec>) -> ClassifierResult {
    if candidates.is_empty() {
        return out_of_scope(
            "Unrecognized request: no runnable query could be built.".to_string(),
            None,
            GENERIC_SUGGESTIONS.iter().map(|s| s.to_string()).collect(),
        );
    }
    debug!(candidates = candidates.len(), "classified as clarification");
    ClassifierResult::Clarify {
        question,
        season: dataset.season().to_string(),
        candidates,
    }
}

fn clarify_with(
    question: &str,
    dataset: &SeasonDataset,
    validator: &QueryValidator<'_>,
    requests: Vec<QueryRequest>,
) -> ClassifierResult {
    match validate_candidates(validator, &requests) {
        Ok(candidates) => clarify(question.to_string(), dataset, candidates),
        Err(err) => rejected(err),
    }
}

/// Candidates that pass validation; the first error when none do.
fn validate_candidates(validator: &QueryValidator<'_>, requests: &[QueryRequest]) -> Result<Vec<QuerySpec>> {
    let mut candidates = Vec::new();
    let mut first_err = None;
    for request in requests {
        match validator.validate(request) {
            Ok(query) => candidates.push(query.into_spec()),
            Err(err) => {
                debug!(error = %err, "clarification candidate failed validation");
                first_err.get_or_insert(err);
            }
        }
    }
    match first_err {
        Some(err) if candidates.is_empty() => Err(err),
        _ => Ok(candidates),
    }
}

fn rejected(err: QueryError) -> ClassifierResult {
    debug!(error = %err, "classified request failed validation");
    out_of_scope(
        format!("Request could not be run: {err}."),
        None,
        GENERIC_SUGGESTIONS.iter().map(|s| s.to_string()).collect(),
    )
}

fn out_of_scope(reason: String, category: Option<ScopeCategory>, suggestions: Vec<String>) -> ClassifierResult {
    debug!(%reason, "classified as out of scope");
    ClassifierResult::OutOfScope {
        reason,
        category,
        suggestions,
    }
}
