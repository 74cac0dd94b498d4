use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{QueryError, Result};
use crate::metrics::DEFAULT_TEAM_MINUTES;
use crate::teams::full_name;

pub type TeamId = u32;

/// One team's box score in one game. Two rows exist per game, one per side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamGameRow {
    pub season: String,
    pub game_id: String,
    pub game_date: NaiveDate,
    pub team_id: TeamId,
    pub team_abbreviation: String,
    #[serde(default)]
    pub team_name: String,
    pub opponent_team_id: TeamId,
    pub fgm: u32,
    pub fga: u32,
    pub fg3m: u32,
    #[serde(default)]
    pub fg3a: u32,
    pub ftm: u32,
    pub fta: u32,
    pub oreb: u32,
    pub dreb: u32,
    pub ast: u32,
    pub tov: u32,
    pub pts: u32,
    #[serde(default = "default_minutes")]
    pub minutes: u32,
}

fn default_minutes() -> u32 {
    DEFAULT_TEAM_MINUTES
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamRef {
    pub id: TeamId,
    pub abbreviation: String,
    pub name: String,
}

/// Immutable row set of one season plus the lookups the engine needs.
///
/// Opponent pairing is an index lookup by game id; rows never point at each other.
#[derive(Debug, Clone)]
pub struct SeasonDataset {
    season: String,
    rows: Vec<TeamGameRow>,
    by_game: HashMap<String, Vec<usize>>,
    // Row indices per team, most recent first (date desc, game id desc).
    by_team: BTreeMap<TeamId, Vec<usize>>,
    teams: BTreeMap<TeamId, TeamRef>,
    latest_date: Option<NaiveDate>,
}

impl SeasonDataset {
    pub fn new(season: impl Into<String>, rows: Vec<TeamGameRow>) -> Self {
        let mut by_game: HashMap<String, Vec<usize>> = HashMap::new();
        let mut by_team: BTreeMap<TeamId, Vec<usize>> = BTreeMap::new();
        let mut teams: BTreeMap<TeamId, TeamRef> = BTreeMap::new();
        let mut latest_date: Option<NaiveDate> = None;

        for (idx, row) in rows.iter().enumerate() {
            by_game.entry(row.game_id.clone()).or_default().push(idx);
            by_team.entry(row.team_id).or_default().push(idx);
            teams.entry(row.team_id).or_insert_with(|| TeamRef {
                id: row.team_id,
                abbreviation: row.team_abbreviation.clone(),
                name: if row.team_name.is_empty() {
                    full_name(&row.team_abbreviation)
                        .unwrap_or_default()
                        .to_string()
                } else {
                    row.team_name.clone()
                },
            });
            latest_date = latest_date.max(Some(row.game_date));
        }

        for indices in by_team.values_mut() {
            indices.sort_by(|a, b| {
                let (ra, rb) = (&rows[*a], &rows[*b]);
                rb.game_date
                    .cmp(&ra.game_date)
                    .then_with(|| rb.game_id.cmp(&ra.game_id))
            });
        }

        Self {
            season: season.into(),
            rows,
            by_game,
            by_team,
            teams,
            latest_date,
        }
    }

    pub fn season(&self) -> &str {
        &self.season
    }

    pub fn rows(&self) -> &[TeamGameRow] {
        &self.rows
    }

    pub fn row(&self, idx: usize) -> Option<&TeamGameRow> {
        self.rows.get(idx)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn team_count(&self) -> usize {
        self.teams.len()
    }

    /// Teams ordered by id.
    pub fn teams(&self) -> impl Iterator<Item = &TeamRef> {
        self.teams.values()
    }

    pub fn team(&self, id: TeamId) -> Option<&TeamRef> {
        self.teams.get(&id)
    }

    /// Resolve a team by abbreviation (case-insensitive) or numeric id.
    pub fn find_team(&self, key: &str) -> Option<&TeamRef> {
        let key = key.trim();
        if let Ok(id) = key.parse::<TeamId>() {
            if let Some(team) = self.teams.get(&id) {
                return Some(team);
            }
        }
        self.teams
            .values()
            .find(|t| t.abbreviation.eq_ignore_ascii_case(key))
    }

    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.latest_date
    }

    /// Row indices of one team's games, most recent first.
    pub fn team_games(&self, team_id: TeamId) -> &[usize] {
        self.by_team
            .get(&team_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// The other side of `row`'s game.
    pub fn opponent_of(&self, row: &TeamGameRow) -> Result<&TeamGameRow> {
        let missing = || QueryError::DataIntegrity {
            game_id: row.game_id.clone(),
            team_id: row.team_id,
        };
        let indices = self.by_game.get(&row.game_id).ok_or_else(missing)?;
        if indices.len() != 2 {
            return Err(missing());
        }
        indices
            .iter()
            .map(|idx| &self.rows[*idx])
            .find(|other| {
                other.team_id == row.opponent_team_id && other.opponent_team_id == row.team_id
            })
            .ok_or_else(missing)
    }

    /// Game ids that do not have exactly two reciprocal sides.
    pub fn unpaired_games(&self) -> Vec<&str> {
        let mut out: Vec<&str> = self
            .rows
            .iter()
            .filter(|row| self.opponent_of(row).is_err())
            .map(|row| row.game_id.as_str())
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }
}
