use thiserror::Error;

/// Typed failures raised by the validator, the metrics engine and season lookup.
///
/// Clarification and scope rejection are not errors; they are
/// [`ClassifierResult`](crate::classifier::ClassifierResult) variants.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    #[error("unknown metric '{0}'")]
    UnknownMetric(String),

    #[error("unsupported window '{0}' (use SEASON, LAST_5, LAST_10 or LAST_20)")]
    UnsupportedWindow(String),

    #[error("{field} must be between {min} and {max}, got {value}")]
    Range {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("team identity error: {0}")]
    TeamIdentity(String),

    #[error("game {game_id} has no opponent row for team {team_id}")]
    DataIntegrity { game_id: String, team_id: u32 },

    #[error("season {0} not found")]
    SeasonNotFound(String),
}

pub type Result<T> = std::result::Result<T, QueryError>;
