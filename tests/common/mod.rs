#![allow(dead_code)]

use chrono::{Duration, NaiveDate};

use nba_lens::dataset::{SeasonDataset, TeamGameRow, TeamId};

pub const SEASON: &str = "2023-24";

pub const TEAMS: &[(TeamId, &str, &str)] = &[
    (1610612737, "ATL", "Atlanta Hawks"),
    (1610612738, "BOS", "Boston Celtics"),
    (1610612739, "CLE", "Cleveland Cavaliers"),
    (1610612742, "DAL", "Dallas Mavericks"),
    (1610612743, "DEN", "Denver Nuggets"),
    (1610612744, "GSW", "Golden State Warriors"),
    (1610612747, "LAL", "Los Angeles Lakers"),
    (1610612748, "MIA", "Miami Heat"),
    (1610612749, "MIL", "Milwaukee Bucks"),
    (1610612752, "NYK", "New York Knicks"),
    (1610612755, "PHI", "Philadelphia 76ers"),
    (1610612760, "OKC", "Oklahoma City Thunder"),
];

/// Box-score counts of one side of one game.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line {
    pub fgm: u32,
    pub fga: u32,
    pub fg3m: u32,
    pub ftm: u32,
    pub fta: u32,
    pub oreb: u32,
    pub dreb: u32,
    pub ast: u32,
    pub tov: u32,
    pub pts: u32,
}

impl Default for Line {
    fn default() -> Self {
        Self {
            fgm: 40,
            fga: 88,
            fg3m: 12,
            ftm: 15,
            fta: 20,
            oreb: 10,
            dreb: 34,
            ast: 25,
            tov: 13,
            pts: 107,
        }
    }
}

pub fn date(days_after_opener: i64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 10, 24).expect("valid opener") + Duration::days(days_after_opener)
}

pub fn team_row(
    season: &str,
    game_id: &str,
    game_date: NaiveDate,
    team: (TeamId, &str),
    opponent: TeamId,
    line: Line,
) -> TeamGameRow {
    TeamGameRow {
        season: season.to_string(),
        game_id: game_id.to_string(),
        game_date,
        team_id: team.0,
        team_abbreviation: team.1.to_string(),
        team_name: String::new(),
        opponent_team_id: opponent,
        fgm: line.fgm,
        fga: line.fga,
        fg3m: line.fg3m,
        fg3a: line.fg3m * 3,
        ftm: line.ftm,
        fta: line.fta,
        oreb: line.oreb,
        dreb: line.dreb,
        ast: line.ast,
        tov: line.tov,
        pts: line.pts,
        minutes: 240,
    }
}

/// Both rows of one game, pointing at each other.
pub fn game(
    game_id: &str,
    game_date: NaiveDate,
    home: (TeamId, &str, Line),
    away: (TeamId, &str, Line),
) -> [TeamGameRow; 2] {
    [
        team_row(SEASON, game_id, game_date, (home.0, home.1), away.0, home.2),
        team_row(SEASON, game_id, game_date, (away.0, away.1), home.0, away.2),
    ]
}

// Deterministic but uneven counts so per-game possessions differ.
fn line_for(team_idx: usize, round: usize) -> Line {
    let t = team_idx as u32;
    let r = round as u32;
    let fta = 16 + (r * 2 + t) % 9;
    Line {
        fgm: 37 + (t * 3 + r) % 9,
        fga: 82 + (t + r * 2) % 11,
        fg3m: 9 + (r + t) % 7,
        ftm: fta * 3 / 4,
        fta,
        oreb: 7 + (t + r * 5) % 7,
        dreb: 31 + (t * 2 + r) % 8,
        ast: 21 + (t + r) % 8,
        tov: 10 + (r + t * 2) % 7,
        pts: 98 + (t * 7 + r * 3) % 29,
    }
}

/// Round-robin season: every team plays once per round, one day per round.
pub fn synthetic_rows(season: &str, rounds: usize) -> Vec<TeamGameRow> {
    let n = TEAMS.len();
    let mut rows = Vec::new();
    for round in 0..rounds {
        let mut rest: Vec<usize> = (1..n).collect();
        rest.rotate_left(round % (n - 1));
        let arrangement: Vec<usize> = std::iter::once(0).chain(rest).collect();
        for k in 0..n / 2 {
            let (a, b) = (arrangement[k], arrangement[n - 1 - k]);
            let game_id = format!("00223{round:03}{k:02}");
            let (a_id, a_abbr, _) = TEAMS[a];
            let (b_id, b_abbr, _) = TEAMS[b];
            let when = date(round as i64);
            rows.push(team_row(season, &game_id, when, (a_id, a_abbr), b_id, line_for(a, round)));
            rows.push(team_row(season, &game_id, when, (b_id, b_abbr), a_id, line_for(b, round)));
        }
    }
    rows
}

pub fn synthetic_season(rounds: usize) -> SeasonDataset {
    SeasonDataset::new(SEASON, synthetic_rows(SEASON, rounds))
}

pub fn team_id(abbreviation: &str) -> TeamId {
    TEAMS
        .iter()
        .find(|(_, abbr, _)| *abbr == abbreviation)
        .map(|(id, _, _)| *id)
        .expect("team in synthetic league")
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}
