use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dataset::TeamId;
use crate::error::{QueryError, Result};
use crate::metrics::{Direction, Metric};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Window {
    #[serde(rename = "SEASON")]
    Season,
    #[serde(rename = "LAST_5")]
    Last5,
    #[serde(rename = "LAST_10")]
    Last10,
    #[serde(rename = "LAST_20")]
    Last20,
}

impl Window {
    pub const ALL: [Window; 4] = [Window::Season, Window::Last5, Window::Last10, Window::Last20];

    pub fn name(self) -> &'static str {
        match self {
            Window::Season => "SEASON",
            Window::Last5 => "LAST_5",
            Window::Last10 => "LAST_10",
            Window::Last20 => "LAST_20",
        }
    }

    /// Only the four enumerated constants are accepted (case-insensitive).
    pub fn parse(raw: &str) -> Result<Window> {
        let upper = raw.trim().to_ascii_uppercase();
        Window::ALL
            .into_iter()
            .find(|w| w.name() == upper)
            .ok_or_else(|| QueryError::UnsupportedWindow(raw.to_string()))
    }

    /// Most recent games per team, `None` for the whole season.
    pub fn game_limit(self) -> Option<usize> {
        match self {
            Window::Season => None,
            Window::Last5 => Some(5),
            Window::Last10 => Some(10),
            Window::Last20 => Some(20),
        }
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn for_direction(dir: Direction) -> Self {
        match dir {
            Direction::HigherBetter => SortOrder::Desc,
            Direction::LowerBetter => SortOrder::Asc,
        }
    }

    pub fn reversed(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortOrder::Asc => "ascending",
            SortOrder::Desc => "descending",
        }
    }
}

/// Unvalidated request as a programmatic caller (or the classifier) shapes it.
///
/// Fields stay raw strings so the validator can name the exact offending token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "chart_type", rename_all = "snake_case")]
pub enum QueryRequest {
    Leaderboard {
        metric: String,
        #[serde(default = "default_request_top_n")]
        top_n: i64,
        #[serde(default)]
        window: Option<String>,
        #[serde(default)]
        order: Option<SortOrder>,
    },
    Scatter {
        x_metric: String,
        y_metric: String,
        #[serde(default)]
        window: Option<String>,
    },
    Compare {
        team_a: String,
        team_b: String,
        #[serde(default)]
        window: Option<String>,
    },
}

fn default_request_top_n() -> i64 {
    10
}

impl QueryRequest {
    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        use anyhow::Context;

        serde_json::from_str(raw).context("invalid query request json")
    }
}

/// A typed request. Only [`QueryValidator`](crate::validator::QueryValidator) turns one
/// into a [`ValidatedQuery`], which is what the aggregator accepts.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "chart_type", rename_all = "snake_case")]
pub enum QuerySpec {
    Leaderboard {
        metric: Metric,
        window: Window,
        top_n: usize,
        order: SortOrder,
    },
    Scatter {
        x_metric: Metric,
        y_metric: Metric,
        window: Window,
    },
    Compare {
        team_a: TeamId,
        team_b: TeamId,
        window: Window,
    },
}

impl QuerySpec {
    pub fn window(&self) -> Window {
        match self {
            QuerySpec::Leaderboard { window, .. }
            | QuerySpec::Scatter { window, .. }
            | QuerySpec::Compare { window, .. } => *window,
        }
    }

    pub fn chart_label(&self) -> &'static str {
        match self {
            QuerySpec::Leaderboard { .. } => "leaderboard",
            QuerySpec::Scatter { .. } => "scatter",
            QuerySpec::Compare { .. } => "compare",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidatedQuery {
    spec: QuerySpec,
}

impl ValidatedQuery {
    pub(crate) fn new(spec: QuerySpec) -> Self {
        Self { spec }
    }

    pub fn spec(&self) -> &QuerySpec {
        &self.spec
    }

    pub fn into_spec(self) -> QuerySpec {
        self.spec
    }
}
