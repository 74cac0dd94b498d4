use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{Connection, params};
use tracing::{info, warn};

use crate::dataset::{SeasonDataset, TeamGameRow};
use crate::season_index::{SeasonIndex, is_stale};

const CACHE_DIR: &str = "nba_lens";
const DB_FILE: &str = "seasons.sqlite";

#[derive(Debug, Clone)]
pub struct StoredSeason {
    pub season: String,
    pub fetched_at: DateTime<Utc>,
    pub row_count: usize,
    pub source: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UpsertSummary {
    pub season: String,
    pub rows_written: usize,
    pub fetched_at: DateTime<Utc>,
}

pub fn app_cache_dir() -> Option<PathBuf> {
    if let Ok(base) = std::env::var("XDG_CACHE_HOME") {
        if !base.trim().is_empty() {
            return Some(PathBuf::from(base).join(CACHE_DIR));
        }
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(CACHE_DIR))
}

pub fn default_db_path() -> Option<PathBuf> {
    app_cache_dir().map(|dir| dir.join(DB_FILE))
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let conn =
        Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        CREATE TABLE IF NOT EXISTS seasons (
            season TEXT PRIMARY KEY,
            fetched_at TEXT NOT NULL,
            row_count INTEGER NOT NULL,
            source TEXT NULL
        );

        CREATE TABLE IF NOT EXISTS team_games (
            season TEXT NOT NULL,
            game_id TEXT NOT NULL,
            game_date TEXT NOT NULL,
            team_id INTEGER NOT NULL,
            team_abbreviation TEXT NOT NULL,
            team_name TEXT NOT NULL,
            opponent_team_id INTEGER NOT NULL,
            fgm INTEGER NOT NULL,
            fga INTEGER NOT NULL,
            fg3m INTEGER NOT NULL,
            fg3a INTEGER NOT NULL,
            ftm INTEGER NOT NULL,
            fta INTEGER NOT NULL,
            oreb INTEGER NOT NULL,
            dreb INTEGER NOT NULL,
            ast INTEGER NOT NULL,
            tov INTEGER NOT NULL,
            pts INTEGER NOT NULL,
            minutes INTEGER NOT NULL,
            PRIMARY KEY (season, game_id, team_id)
        );
        CREATE INDEX IF NOT EXISTS idx_team_games_team ON team_games(season, team_id);
        CREATE INDEX IF NOT EXISTS idx_team_games_date ON team_games(season, game_date);
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

/// Replace every stored row of `season` in one transaction and stamp `fetched_at`.
pub fn upsert_season(
    conn: &mut Connection,
    season: &str,
    rows: &[TeamGameRow],
    source: Option<&str>,
) -> Result<UpsertSummary> {
    let fetched_at = Utc::now();
    let tx = conn.transaction().context("begin season transaction")?;
    tx.execute("DELETE FROM team_games WHERE season = ?1", params![season])
        .context("clear season rows")?;
    for row in rows {
        insert_row(&tx, season, row)?;
    }
    tx.execute(
        r#"
        INSERT INTO seasons (season, fetched_at, row_count, source)
        VALUES (?1, ?2, ?3, ?4)
        ON CONFLICT(season) DO UPDATE SET
            fetched_at = excluded.fetched_at,
            row_count = excluded.row_count,
            source = excluded.source
        "#,
        params![season, fetched_at.to_rfc3339(), rows.len() as i64, source],
    )
    .context("upsert season")?;
    tx.commit().context("commit season transaction")?;

    info!(season, rows = rows.len(), "stored season");
    Ok(UpsertSummary {
        season: season.to_string(),
        rows_written: rows.len(),
        fetched_at,
    })
}

fn insert_row(tx: &rusqlite::Transaction<'_>, season: &str, r: &TeamGameRow) -> Result<()> {
    tx.execute(
        r#"
        INSERT OR REPLACE INTO team_games (
            season, game_id, game_date, team_id, team_abbreviation, team_name,
            opponent_team_id, fgm, fga, fg3m, fg3a, ftm, fta,
            oreb, dreb, ast, tov, pts, minutes
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6,
            ?7, ?8, ?9, ?10, ?11, ?12, ?13,
            ?14, ?15, ?16, ?17, ?18, ?19
        )
        "#,
        params![
            season,
            r.game_id,
            r.game_date.format("%Y-%m-%d").to_string(),
            r.team_id as i64,
            r.team_abbreviation,
            r.team_name,
            r.opponent_team_id as i64,
            r.fgm as i64,
            r.fga as i64,
            r.fg3m as i64,
            r.fg3a as i64,
            r.ftm as i64,
            r.fta as i64,
            r.oreb as i64,
            r.dreb as i64,
            r.ast as i64,
            r.tov as i64,
            r.pts as i64,
            r.minutes as i64,
        ],
    )
    .with_context(|| format!("insert row game={} team={}", r.game_id, r.team_id))?;
    Ok(())
}

pub fn load_season_rows(conn: &Connection, season: &str) -> Result<Vec<TeamGameRow>> {
    let mut stmt = conn
        .prepare(
            r#"
            SELECT
                game_id, game_date, team_id, team_abbreviation, team_name,
                opponent_team_id, fgm, fga, fg3m, fg3a, ftm, fta,
                oreb, dreb, ast, tov, pts, minutes
            FROM team_games
            WHERE season = ?1
            ORDER BY game_date ASC, game_id ASC, team_id ASC
            "#,
        )
        .context("prepare load season query")?;

    let rows = stmt
        .query_map(params![season], |row| {
            let game_date: String = row.get(1)?;
            Ok((
                game_date,
                TeamGameRow {
                    season: season.to_string(),
                    game_id: row.get(0)?,
                    game_date: NaiveDate::MIN,
                    team_id: row.get::<_, u32>(2)?,
                    team_abbreviation: row.get(3)?,
                    team_name: row.get(4)?,
                    opponent_team_id: row.get::<_, u32>(5)?,
                    fgm: row.get::<_, u32>(6)?,
                    fga: row.get::<_, u32>(7)?,
                    fg3m: row.get::<_, u32>(8)?,
                    fg3a: row.get::<_, u32>(9)?,
                    ftm: row.get::<_, u32>(10)?,
                    fta: row.get::<_, u32>(11)?,
                    oreb: row.get::<_, u32>(12)?,
                    dreb: row.get::<_, u32>(13)?,
                    ast: row.get::<_, u32>(14)?,
                    tov: row.get::<_, u32>(15)?,
                    pts: row.get::<_, u32>(16)?,
                    minutes: row.get::<_, u32>(17)?,
                },
            ))
        })
        .context("query load season")?;

    let mut out = Vec::new();
    for row in rows {
        let (raw_date, mut game_row) = row.context("decode team game row")?;
        game_row.game_date = NaiveDate::parse_from_str(&raw_date, "%Y-%m-%d")
            .with_context(|| format!("stored game_date '{raw_date}'"))?;
        out.push(game_row);
    }
    Ok(out)
}

/// Stored seasons, newest label first.
pub fn list_seasons(conn: &Connection) -> Result<Vec<StoredSeason>> {
    let mut stmt = conn
        .prepare("SELECT season, fetched_at, row_count, source FROM seasons ORDER BY season DESC")
        .context("prepare list seasons query")?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, Option<String>>(3)?,
            ))
        })
        .context("query list seasons")?;

    let mut out = Vec::new();
    for row in rows {
        let (season, fetched_at, row_count, source) = row.context("decode season row")?;
        let fetched_at = DateTime::parse_from_rfc3339(&fetched_at)
            .with_context(|| format!("season {season}: fetched_at '{fetched_at}'"))?
            .with_timezone(&Utc);
        out.push(StoredSeason {
            season,
            fetched_at,
            row_count: usize::try_from(row_count).unwrap_or(0),
            source,
        });
    }
    Ok(out)
}

/// Build a [`SeasonIndex`] from every stored season.
pub fn load_index(conn: &Connection) -> Result<SeasonIndex> {
    let now = Utc::now();
    let mut index = SeasonIndex::new();
    for stored in list_seasons(conn)? {
        let rows = load_season_rows(conn, &stored.season)?;
        let dataset = SeasonDataset::new(stored.season.clone(), rows);
        let unpaired = dataset.unpaired_games().len();
        if unpaired > 0 {
            warn!(season = %stored.season, unpaired, "season has games without an opponent row");
        }
        index.insert(dataset, stored.fetched_at);
        if is_stale(stored.fetched_at, now) {
            warn!(season = %stored.season, fetched_at = %stored.fetched_at, "season data is stale");
        }
    }
    info!(seasons = index.seasons().len(), "loaded season index");
    Ok(index)
}
