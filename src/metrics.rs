use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::dataset::{SeasonDataset, TeamGameRow};
use crate::error::{QueryError, Result};

/// Free-throw weight in Dean Oliver's possession estimate.
pub const FTA_POSSESSION_WEIGHT: f64 = 0.44;
pub const GAME_MINUTES: f64 = 48.0;
pub const PLAYERS_ON_FLOOR: f64 = 5.0;
pub const DEFAULT_TEAM_MINUTES: u32 = 240;

/// The closed allow-list of team metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Metric {
    ORtg,
    DRtg,
    NetRtg,
    EfgPct,
    TsPct,
    Pace,
    AstRate,
    TovRate,
    Ppg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    HigherBetter,
    LowerBetter,
}

impl Metric {
    pub const ALL: [Metric; 9] = [
        Metric::ORtg,
        Metric::DRtg,
        Metric::NetRtg,
        Metric::EfgPct,
        Metric::TsPct,
        Metric::Pace,
        Metric::AstRate,
        Metric::TovRate,
        Metric::Ppg,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Metric::ORtg => "ORtg",
            Metric::DRtg => "DRtg",
            Metric::NetRtg => "NET_RTG",
            Metric::EfgPct => "eFG%",
            Metric::TsPct => "TS%",
            Metric::Pace => "PACE",
            Metric::AstRate => "AST_RATE",
            Metric::TovRate => "TOV_RATE",
            Metric::Ppg => "PPG",
        }
    }

    /// Strict lookup against the allow-list. `eFG` and `TS` are accepted without the
    /// percent sign; anything else is rejected verbatim.
    pub fn parse(raw: &str) -> Result<Metric> {
        let token = raw.trim();
        let found = match token {
            "ORtg" => Some(Metric::ORtg),
            "DRtg" => Some(Metric::DRtg),
            "NET_RTG" => Some(Metric::NetRtg),
            "eFG%" | "eFG" => Some(Metric::EfgPct),
            "TS%" | "TS" => Some(Metric::TsPct),
            "PACE" => Some(Metric::Pace),
            "AST_RATE" => Some(Metric::AstRate),
            "TOV_RATE" => Some(Metric::TovRate),
            "PPG" => Some(Metric::Ppg),
            _ => None,
        };
        found.ok_or_else(|| QueryError::UnknownMetric(raw.to_string()))
    }

    pub fn direction(self) -> Direction {
        match self {
            Metric::DRtg | Metric::TovRate => Direction::LowerBetter,
            _ => Direction::HigherBetter,
        }
    }

    /// Metrics that can only be computed with the opponent's row of the same game.
    pub fn needs_opponent(self) -> bool {
        matches!(self, Metric::DRtg | Metric::NetRtg)
    }

    pub fn formula(self) -> &'static str {
        match self {
            Metric::ORtg => "ORtg = 100 * PTS / POSS",
            Metric::DRtg => "DRtg = 100 * opponent PTS / opponent POSS",
            Metric::NetRtg => "NET_RTG = ORtg - DRtg",
            Metric::EfgPct => "eFG% = (FGM + 0.5 * 3PM) / FGA",
            Metric::TsPct => "TS% = PTS / (2 * (FGA + 0.44 * FTA))",
            Metric::Pace => "PACE = 48 * POSS / (MIN / 5)",
            Metric::AstRate => "AST_RATE = AST / POSS",
            Metric::TovRate => "TOV_RATE = TOV / POSS",
            Metric::Ppg => "PPG = PTS / games",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Metric {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self> {
        Metric::parse(s)
    }
}

impl Serialize for Metric {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Metric {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Metric::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Raw box-score counts. A single game and a window of games share this shape so the
/// same formulas apply to both: windowed rates are always computed from summed counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct BoxCounts {
    pub games: u32,
    pub fgm: f64,
    pub fga: f64,
    pub fg3m: f64,
    pub ftm: f64,
    pub fta: f64,
    pub oreb: f64,
    pub dreb: f64,
    pub ast: f64,
    pub tov: f64,
    pub pts: f64,
    pub minutes: f64,
}

impl BoxCounts {
    pub fn from_row(row: &TeamGameRow) -> Self {
        Self {
            games: 1,
            fgm: f64::from(row.fgm),
            fga: f64::from(row.fga),
            fg3m: f64::from(row.fg3m),
            ftm: f64::from(row.ftm),
            fta: f64::from(row.fta),
            oreb: f64::from(row.oreb),
            dreb: f64::from(row.dreb),
            ast: f64::from(row.ast),
            tov: f64::from(row.tov),
            pts: f64::from(row.pts),
            minutes: f64::from(row.minutes),
        }
    }

    pub fn add(&mut self, other: &BoxCounts) {
        self.games += other.games;
        self.fgm += other.fgm;
        self.fga += other.fga;
        self.fg3m += other.fg3m;
        self.ftm += other.ftm;
        self.fta += other.fta;
        self.oreb += other.oreb;
        self.dreb += other.dreb;
        self.ast += other.ast;
        self.tov += other.tov;
        self.pts += other.pts;
        self.minutes += other.minutes;
    }

    pub fn possessions(&self) -> f64 {
        self.fga + FTA_POSSESSION_WEIGHT * self.fta - self.oreb + self.tov
    }

    pub fn offensive_rating(&self) -> Option<f64> {
        ratio(100.0 * self.pts, self.possessions())
    }

    pub fn efg_pct(&self) -> Option<f64> {
        ratio(self.fgm + 0.5 * self.fg3m, self.fga)
    }

    pub fn ts_pct(&self) -> Option<f64> {
        ratio(self.pts, 2.0 * (self.fga + FTA_POSSESSION_WEIGHT * self.fta))
    }

    pub fn pace(&self) -> Option<f64> {
        ratio(GAME_MINUTES * self.possessions(), self.minutes / PLAYERS_ON_FLOOR)
    }

    pub fn ast_rate(&self) -> Option<f64> {
        ratio(self.ast, self.possessions())
    }

    pub fn tov_rate(&self) -> Option<f64> {
        ratio(self.tov, self.possessions())
    }

    pub fn points_per_game(&self) -> Option<f64> {
        ratio(self.pts, f64::from(self.games))
    }
}

/// Offense-only metrics of one team in one game.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DerivedGameMetrics {
    pub possessions: f64,
    pub offensive_rating: Option<f64>,
    pub efg_pct: Option<f64>,
    pub ts_pct: Option<f64>,
    pub pace: Option<f64>,
    pub ast_rate: Option<f64>,
    pub tov_rate: Option<f64>,
}

/// Ratings that need both sides of a game.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PairedRatings {
    pub offensive_rating: Option<f64>,
    pub defensive_rating: Option<f64>,
    pub net_rating: Option<f64>,
}

pub fn derive_game_metrics(row: &TeamGameRow) -> DerivedGameMetrics {
    let counts = BoxCounts::from_row(row);
    DerivedGameMetrics {
        possessions: counts.possessions(),
        offensive_rating: counts.offensive_rating(),
        efg_pct: counts.efg_pct(),
        ts_pct: counts.ts_pct(),
        pace: counts.pace(),
        ast_rate: counts.ast_rate(),
        tov_rate: counts.tov_rate(),
    }
}

/// Points allowed per 100 opposing possessions: the opponent's ORtg in the same game.
pub fn defensive_rating(dataset: &SeasonDataset, row: &TeamGameRow) -> Result<Option<f64>> {
    let opponent = dataset.opponent_of(row)?;
    Ok(BoxCounts::from_row(opponent).offensive_rating())
}

pub fn paired_ratings(dataset: &SeasonDataset, row: &TeamGameRow) -> Result<PairedRatings> {
    let offensive_rating = BoxCounts::from_row(row).offensive_rating();
    let defensive_rating = defensive_rating(dataset, row)?;
    Ok(PairedRatings {
        offensive_rating,
        defensive_rating,
        net_rating: net(offensive_rating, defensive_rating),
    })
}

/// Per-game metrics for every row, in dataset order.
pub fn enrich(dataset: &SeasonDataset) -> Vec<DerivedGameMetrics> {
    use rayon::prelude::*;

    dataset.rows().par_iter().map(derive_game_metrics).collect()
}

pub(crate) fn net(ortg: Option<f64>, drtg: Option<f64>) -> Option<f64> {
    match (ortg, drtg) {
        (Some(o), Some(d)) => Some(o - d),
        _ => None,
    }
}

fn ratio(num: f64, den: f64) -> Option<f64> {
    if den > 0.0 && num.is_finite() && den.is_finite() {
        Some(num / den)
    } else {
        None
    }
}
