mod common;

use chrono::{Duration, Utc};
use rusqlite::Connection;

use common::{SEASON, synthetic_rows};
use nba_lens::season_index::is_stale;
use nba_lens::season_store::{init_schema, list_seasons, load_index, load_season_rows, upsert_season};

fn memory_db() -> Connection {
    let conn = Connection::open_in_memory().expect("in-memory sqlite");
    init_schema(&conn).expect("schema");
    conn
}

#[test]
fn stored_rows_load_back_unchanged() {
    let mut conn = memory_db();
    let mut rows = synthetic_rows(SEASON, 4);
    let summary = upsert_season(&mut conn, SEASON, &rows, Some("fixture")).expect("upsert");
    assert_eq!(summary.rows_written, rows.len());

    let mut loaded = load_season_rows(&conn, SEASON).expect("load");
    let key = |r: &nba_lens::dataset::TeamGameRow| (r.game_date, r.game_id.clone(), r.team_id);
    rows.sort_by_key(key);
    loaded.sort_by_key(key);
    assert_eq!(loaded, rows);
}

#[test]
fn upsert_replaces_the_whole_season() {
    let mut conn = memory_db();
    upsert_season(&mut conn, SEASON, &synthetic_rows(SEASON, 4), None).expect("first upsert");
    upsert_season(&mut conn, SEASON, &synthetic_rows(SEASON, 2), None).expect("second upsert");

    let loaded = load_season_rows(&conn, SEASON).expect("load");
    assert_eq!(loaded.len(), 12 * 2);

    let seasons = list_seasons(&conn).expect("list");
    assert_eq!(seasons.len(), 1);
    assert_eq!(seasons[0].row_count, 24);
    assert_eq!(seasons[0].source, None);
}

#[test]
fn index_holds_every_stored_season() {
    let mut conn = memory_db();
    upsert_season(&mut conn, "2022-23", &synthetic_rows("2022-23", 3), None).expect("2022-23");
    upsert_season(&mut conn, SEASON, &synthetic_rows(SEASON, 5), None).expect("2023-24");

    let listed: Vec<String> = list_seasons(&conn)
        .expect("list")
        .into_iter()
        .map(|s| s.season)
        .collect();
    assert_eq!(listed, vec!["2023-24", "2022-23"]);

    let index = load_index(&conn).expect("index");
    assert_eq!(index.seasons(), vec!["2023-24", "2022-23"]);
    assert_eq!(index.latest_season(), Some("2023-24"));

    let dataset = index.snapshot(SEASON).expect("snapshot");
    assert_eq!(dataset.team_count(), 12);
    assert_eq!(dataset.rows().len(), 12 * 5);
    assert!(dataset.unpaired_games().is_empty());

    let entry = index.entry(SEASON).expect("entry");
    assert!(!entry.is_stale(chrono::Utc::now()));
    assert!(index.snapshot("1999-00").is_err());
}

#[test]
fn stored_and_indexed_seasons_share_the_staleness_rule() {
    let mut conn = memory_db();
    upsert_season(&mut conn, SEASON, &synthetic_rows(SEASON, 2), None).expect("upsert");
    let stored = list_seasons(&conn).expect("list");
    let index = load_index(&conn).expect("index");
    let entry = index.entry(SEASON).expect("indexed season");

    let now = Utc::now();
    assert!(!is_stale(stored[0].fetched_at, now));
    assert!(!entry.is_stale(now));

    let later = now + Duration::hours(25);
    assert!(is_stale(stored[0].fetched_at, later));
    assert!(entry.is_stale(later));
}
