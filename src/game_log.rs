use std::collections::{BTreeMap, HashMap};

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use serde_json::Value;

use crate::dataset::{TeamGameRow, TeamId};
use crate::metrics::DEFAULT_TEAM_MINUTES;

/// One raw team-game line from a league game log, before opponent pairing.
#[derive(Debug, Clone, PartialEq)]
pub struct GameLogRecord {
    pub game_id: String,
    pub game_date: NaiveDate,
    pub team_id: TeamId,
    pub team_abbreviation: String,
    pub team_name: String,
    pub matchup: Option<String>,
    pub fgm: u32,
    pub fga: u32,
    pub fg3m: u32,
    pub fg3a: u32,
    pub ftm: u32,
    pub fta: u32,
    pub oreb: u32,
    pub dreb: u32,
    pub ast: u32,
    pub tov: u32,
    pub pts: u32,
    pub minutes: u32,
}

#[derive(Debug, Clone, Default)]
pub struct CanonicalLog {
    pub rows: Vec<TeamGameRow>,
    /// Games that could not be paired, duplicate lines and similar oddities.
    pub warnings: Vec<String>,
}

/// Parse a game log. Accepts either a JSON array of row objects keyed by column name, or
/// the stats API shape `{"resultSets": [{"headers": [...], "rowSet": [[...], ...]}]}`.
pub fn parse_game_log_json(raw: &str) -> Result<Vec<GameLogRecord>> {
    let value: Value = serde_json::from_str(raw).context("parse game log json")?;
    let objects = match &value {
        Value::Array(items) => items.clone(),
        Value::Object(_) => result_set_rows(&value)?,
        _ => return Err(anyhow!("game log must be an array or a resultSets object")),
    };

    objects
        .iter()
        .enumerate()
        .map(|(idx, obj)| parse_record(obj).with_context(|| format!("game log row {idx}")))
        .collect()
}

fn result_set_rows(value: &Value) -> Result<Vec<Value>> {
    let set = value
        .get("resultSets")
        .and_then(|v| v.as_array())
        .and_then(|sets| sets.first())
        .or_else(|| value.get("resultSet"))
        .ok_or_else(|| anyhow!("missing resultSets"))?;
    let headers = set
        .get("headers")
        .and_then(|v| v.as_array())
        .ok_or_else(|| anyhow!("missing headers"))?;
    let rows = set
        .get("rowSet")
        .and_then(|v| v.as_array())
        .ok_or_else(|| anyhow!("missing rowSet"))?;

    let names: Vec<&str> = headers.iter().filter_map(|h| h.as_str()).collect();
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let Some(cells) = row.as_array() else {
            continue;
        };
        let obj: serde_json::Map<String, Value> = names
            .iter()
            .zip(cells.iter())
            .map(|(name, cell)| (name.to_string(), cell.clone()))
            .collect();
        out.push(Value::Object(obj));
    }
    Ok(out)
}

fn parse_record(obj: &Value) -> Result<GameLogRecord> {
    let game_id = id_string(obj.get("GAME_ID")).ok_or_else(|| anyhow!("missing GAME_ID"))?;
    let team_id = obj
        .get("TEAM_ID")
        .and_then(value_u64)
        .and_then(|id| TeamId::try_from(id).ok())
        .ok_or_else(|| anyhow!("missing TEAM_ID"))?;
    let raw_date = obj
        .get("GAME_DATE")
        .and_then(|v| v.as_str())
        .ok_or_else(|| anyhow!("missing GAME_DATE"))?;
    let game_date = parse_game_date(raw_date)?;

    Ok(GameLogRecord {
        game_id,
        game_date,
        team_id,
        team_abbreviation: text(obj, "TEAM_ABBREVIATION"),
        team_name: text(obj, "TEAM_NAME"),
        matchup: obj.get("MATCHUP").and_then(|v| v.as_str()).map(str::to_string),
        fgm: count(obj, "FGM"),
        fga: count(obj, "FGA"),
        fg3m: count(obj, "FG3M"),
        fg3a: count(obj, "FG3A"),
        ftm: count(obj, "FTM"),
        fta: count(obj, "FTA"),
        oreb: count(obj, "OREB"),
        dreb: count(obj, "DREB"),
        ast: count(obj, "AST"),
        tov: count(obj, "TOV"),
        pts: count(obj, "PTS"),
        minutes: obj
            .get("MIN")
            .and_then(value_u64)
            .and_then(|m| u32::try_from(m).ok())
            .filter(|m| *m > 0)
            .unwrap_or(DEFAULT_TEAM_MINUTES),
    })
}

/// `2024-01-15`, `2024-01-15T00:00:00` and `2024-01-15 00:00:00` all parse to the date.
pub fn parse_game_date(raw: &str) -> Result<NaiveDate> {
    let trimmed = raw.trim();
    let date_part = trimmed
        .split(|c: char| c == 'T' || c == ' ')
        .next()
        .unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%b %d, %Y"))
        .with_context(|| format!("invalid GAME_DATE '{raw}'"))
}

/// Pair rows on game id and emit canonical rows for `season`.
///
/// Games without exactly two distinct sides are kept with `opponent_team_id = 0`; the
/// metrics engine reports them as data-integrity errors for opponent metrics.
pub fn canonicalize(season: &str, records: Vec<GameLogRecord>) -> CanonicalLog {
    let mut warnings = Vec::new();

    // Last line wins when a team appears twice in one game.
    let mut by_game: BTreeMap<String, Vec<GameLogRecord>> = BTreeMap::new();
    for record in records {
        let sides = by_game.entry(record.game_id.clone()).or_default();
        if let Some(existing) = sides.iter_mut().find(|r| r.team_id == record.team_id) {
            warnings.push(format!(
                "game {}: duplicate line for team {}",
                record.game_id, record.team_id
            ));
            *existing = record;
        } else {
            sides.push(record);
        }
    }

    let mut rows = Vec::new();
    for (game_id, sides) in by_game {
        let opponents: HashMap<TeamId, TeamId> = match sides.as_slice() {
            [a, b] => HashMap::from([(a.team_id, b.team_id), (b.team_id, a.team_id)]),
            _ => {
                warnings.push(format!("game {game_id}: {} side(s), expected 2", sides.len()));
                HashMap::new()
            }
        };
        for record in sides {
            let opponent_team_id = opponents.get(&record.team_id).copied().unwrap_or(0);
            rows.push(to_row(season, record, opponent_team_id));
        }
    }

    CanonicalLog { rows, warnings }
}

fn to_row(season: &str, r: GameLogRecord, opponent_team_id: TeamId) -> TeamGameRow {
    TeamGameRow {
        season: season.to_string(),
        game_id: r.game_id,
        game_date: r.game_date,
        team_id: r.team_id,
        team_abbreviation: r.team_abbreviation,
        team_name: r.team_name,
        opponent_team_id,
        fgm: r.fgm,
        fga: r.fga,
        fg3m: r.fg3m,
        fg3a: r.fg3a,
        ftm: r.ftm,
        fta: r.fta,
        oreb: r.oreb,
        dreb: r.dreb,
        ast: r.ast,
        tov: r.tov,
        pts: r.pts,
        minutes: r.minutes,
    }
}

fn id_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn text(obj: &Value, key: &str) -> String {
    obj.get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

// Box-score columns sometimes arrive as floats (`40.0`) or null.
fn count(obj: &Value, key: &str) -> u32 {
    obj.get(key)
        .and_then(value_u64)
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or(0)
}

fn value_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64)),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
}
