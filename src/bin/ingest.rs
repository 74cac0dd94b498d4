use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use tracing::warn;

use nba_lens::config::{AppConfig, init_logging};
use nba_lens::dataset::SeasonDataset;
use nba_lens::game_log;
use nba_lens::season_index::normalize_season_label;
use nba_lens::season_store;

const USAGE: &str = "usage: nba_lens_ingest <season YYYY-YY> <game_log.json> [--db PATH]";

fn main() -> Result<()> {
    init_logging();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let positional = positional_args(&args);
    let [season_raw, log_path] = positional.as_slice() else {
        return Err(anyhow!("{USAGE}"));
    };
    let season = normalize_season_label(season_raw)
        .ok_or_else(|| anyhow!("invalid season '{season_raw}' (expected YYYY-YY)"))?;

    let db_path = match parse_db_path_arg(&args) {
        Some(path) => path,
        None => AppConfig::load()?.db_path,
    };

    let raw = std::fs::read_to_string(log_path)
        .with_context(|| format!("read game log {log_path}"))?;
    let records = game_log::parse_game_log_json(&raw)?;
    let canonical = game_log::canonicalize(&season, records);
    for warning in &canonical.warnings {
        warn!(season = %season, "{warning}");
    }

    let dataset = SeasonDataset::new(season.clone(), canonical.rows.clone());
    let mut conn = season_store::open_db(&db_path)?;
    let summary =
        season_store::upsert_season(&mut conn, &season, &canonical.rows, Some(log_path.as_str()))?;

    println!("Season ingest complete");
    println!("DB: {}", db_path.display());
    println!("Season: {}", summary.season);
    println!("Rows stored: {}", summary.rows_written);
    println!("Teams: {}", dataset.team_count());
    println!(
        "Latest game: {}",
        dataset
            .latest_date()
            .map(|d| d.to_string())
            .unwrap_or_else(|| "n/a".to_string())
    );
    if !canonical.warnings.is_empty() {
        println!("  warnings: {}", canonical.warnings.len());
        for w in canonical.warnings.iter().take(6) {
            println!("   - {w}");
        }
    }

    Ok(())
}

fn positional_args(args: &[String]) -> Vec<String> {
    let mut out = Vec::new();
    let mut skip_next = false;
    for arg in args {
        if skip_next {
            skip_next = false;
            continue;
        }
        if arg == "--db" {
            skip_next = true;
            continue;
        }
        if arg.starts_with("--") {
            continue;
        }
        out.push(arg.clone());
    }
    out
}

fn parse_db_path_arg(args: &[String]) -> Option<PathBuf> {
    for (idx, arg) in args.iter().enumerate() {
        if let Some(path) = arg.strip_prefix("--db=") {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return Some(PathBuf::from(trimmed));
            }
        }
        if arg == "--db" {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(PathBuf::from(next));
            }
        }
    }
    None
}
