use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;

use nba_lens::dataset::SeasonDataset;
use nba_lens::game_log::{canonicalize, parse_game_date, parse_game_log_json};
use nba_lens::season_index::{normalize_season_label, season_start_year};
use nba_lens::text::{Tokens, parse_count};

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

#[test]
fn parses_game_log_fixture() {
    let raw = read_fixture("game_log_small.json");
    let records = parse_game_log_json(&raw).expect("fixture should parse");
    assert_eq!(records.len(), 5);

    assert_eq!(records[0].game_id, "0022300001");
    assert_eq!(records[0].team_abbreviation, "ATL");
    assert_eq!(
        records[0].game_date,
        NaiveDate::from_ymd_opt(2023, 10, 25).expect("date")
    );
    // Float-encoded counts.
    assert_eq!(records[1].pts, 116);
    assert_eq!(records[1].minutes, 240);
    // Null and missing columns.
    assert_eq!(records[2].fg3a, 0);
    assert_eq!(records[2].minutes, 240);
    assert_eq!(records[3].tov, 0);
    assert_eq!(records[3].minutes, 265);
    assert_eq!(records[3].matchup.as_deref(), Some("MIA @ LAL"));
}

#[test]
fn canonicalize_pairs_opponents_by_game() {
    let raw = read_fixture("game_log_small.json");
    let records = parse_game_log_json(&raw).expect("fixture should parse");
    let log = canonicalize("2023-24", records);

    assert_eq!(log.rows.len(), 5);
    assert_eq!(log.warnings.len(), 1);
    assert!(log.warnings[0].contains("0022300003"));

    let atl = log.rows.iter().find(|r| r.team_abbreviation == "ATL").expect("ATL");
    assert_eq!(atl.opponent_team_id, 1610612738);
    assert_eq!(atl.season, "2023-24");
    let den = log.rows.iter().find(|r| r.team_abbreviation == "DEN").expect("DEN");
    assert_eq!(den.opponent_team_id, 0);

    let dataset = SeasonDataset::new("2023-24", log.rows);
    assert_eq!(dataset.team_count(), 5);
    assert_eq!(dataset.unpaired_games(), vec!["0022300003"]);
}

#[test]
fn duplicate_team_lines_keep_the_last() {
    let raw = r#"[
        {"GAME_ID": "g1", "GAME_DATE": "2024-01-02", "TEAM_ID": 1, "PTS": 90},
        {"GAME_ID": "g1", "GAME_DATE": "2024-01-02", "TEAM_ID": 2, "PTS": 95},
        {"GAME_ID": "g1", "GAME_DATE": "2024-01-02", "TEAM_ID": 1, "PTS": 99}
    ]"#;
    let log = canonicalize("2023-24", parse_game_log_json(raw).expect("parse"));
    assert_eq!(log.rows.len(), 2);
    assert_eq!(log.warnings.len(), 1);
    let team_one = log.rows.iter().find(|r| r.team_id == 1).expect("team 1");
    assert_eq!(team_one.pts, 99);
    assert_eq!(team_one.opponent_team_id, 2);
}

#[test]
fn parses_result_set_shape() {
    let raw = r#"{
        "resultSets": [{
            "name": "LeagueGameLog",
            "headers": ["TEAM_ID", "TEAM_ABBREVIATION", "GAME_ID", "GAME_DATE", "PTS", "FGA"],
            "rowSet": [
                [1610612744, "GSW", "0022300010", "2023-11-01", 121, 92],
                [1610612756, "PHX", "0022300010", "2023-11-01", 118, 89]
            ]
        }]
    }"#;
    let records = parse_game_log_json(raw).expect("result set should parse");
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].team_abbreviation, "GSW");
    assert_eq!(records[1].fga, 89);
}

#[test]
fn rows_without_ids_are_rejected() {
    let raw = r#"[{"GAME_DATE": "2024-01-02", "TEAM_ID": 1}]"#;
    let err = parse_game_log_json(raw).expect_err("missing GAME_ID");
    assert!(format!("{err:#}").contains("GAME_ID"));
}

#[test]
fn game_dates_accept_time_suffixes() {
    let expected = NaiveDate::from_ymd_opt(2024, 1, 15).expect("date");
    for raw in ["2024-01-15", "2024-01-15T00:00:00", "2024-01-15 19:30:00", "Jan 15, 2024"] {
        assert_eq!(parse_game_date(raw).expect(raw), expected);
    }
    assert!(parse_game_date("15/01/2024").is_err());
}

#[test]
fn season_labels_normalize() {
    assert_eq!(normalize_season_label("2023-24").as_deref(), Some("2023-24"));
    assert_eq!(normalize_season_label("2023-2024").as_deref(), Some("2023-24"));
    assert_eq!(normalize_season_label("2023/24").as_deref(), Some("2023-24"));
    assert_eq!(normalize_season_label("play-by-play"), None);
    assert_eq!(normalize_season_label("10-20"), None);
    assert_eq!(season_start_year("2021-22"), Some(2021));
}

#[test]
fn tokens_keep_hyphenated_words() {
    let tokens = Tokens::new("What's the TS% for 2023-24, head-to-head?");
    assert!(tokens.contains("2023-24"));
    assert!(tokens.contains("head-to-head"));
    assert!(tokens.contains("ts"));
    assert!(tokens.contains_phrase("for 2023-24"));
    assert_eq!(parse_count("ten"), Some(10));
    assert_eq!(parse_count("7"), Some(7));
    assert_eq!(parse_count("games"), None);
}
