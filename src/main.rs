use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};
use chrono::Utc;
use tracing::{info, warn};

use nba_lens::aggregate::{Aggregator, QueryOutput};
use nba_lens::classifier::{ClassifierResult, QueryClassifier, QueryContext, RuleBasedClassifier};
use nba_lens::config::{AppConfig, init_logging};
use nba_lens::export;
use nba_lens::query::{QueryRequest, SortOrder};
use nba_lens::season_index::{SeasonIndex, is_stale, normalize_season_label};
use nba_lens::season_store;
use nba_lens::validator::QueryValidator;

const USAGE: &str = "usage: nba_lens [--db PATH] [--season YYYY-YY] [--json] [--xlsx PATH] <command>
commands:
  ask \"<question>\"
  leaderboard --metric M [--top N] [--window W] [--order asc|desc]
  scatter --x M --y M [--window W]
  compare --teams A,B [--window W]
  seasons";

#[derive(Debug, Default)]
struct CliArgs {
    db: Option<PathBuf>,
    season: Option<String>,
    json: bool,
    xlsx: Option<PathBuf>,
    command: Option<String>,
    positional: Vec<String>,
    options: HashMap<String, String>,
}

impl CliArgs {
    fn option(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    fn required(&self, key: &str) -> Result<&str> {
        self.option(key)
            .ok_or_else(|| anyhow!("missing --{key}\n{USAGE}"))
    }
}

fn main() -> Result<()> {
    init_logging();

    let args = parse_args(std::env::args().skip(1).collect())?;
    let Some(command) = args.command.clone() else {
        println!("{USAGE}");
        return Ok(());
    };

    let mut config = AppConfig::load()?;
    if let Some(db) = args.db.clone() {
        config.db_path = db;
    }
    if let Some(season) = args.season.as_deref() {
        config.season = Some(normalize_season_label(season).unwrap_or_else(|| season.to_string()));
    }

    let conn = season_store::open_db(&config.db_path)?;
    if command == "seasons" {
        return print_seasons(&conn);
    }

    let index = season_store::load_index(&conn)?;
    let selected = config
        .season
        .clone()
        .or_else(|| index.latest_season().map(str::to_string))
        .ok_or_else(|| {
            anyhow!(
                "no seasons stored in {}; run nba_lens_ingest first",
                config.db_path.display()
            )
        })?;
    info!(season = %selected, db = %config.db_path.display(), "selected season");

    match command.as_str() {
        "ask" => run_ask(&args, &config, &index, &selected),
        "leaderboard" => {
            let top_n = match args.option("top") {
                Some(raw) => raw
                    .trim()
                    .parse::<i64>()
                    .with_context(|| format!("invalid --top '{raw}'"))?,
                None => config.default_top_n as i64,
            };
            let order = match args.option("order") {
                Some(raw) if raw.eq_ignore_ascii_case("asc") => Some(SortOrder::Asc),
                Some(raw) if raw.eq_ignore_ascii_case("desc") => Some(SortOrder::Desc),
                Some(raw) => bail!("invalid --order '{raw}' (asc or desc)"),
                None => None,
            };
            let request = QueryRequest::Leaderboard {
                metric: args.required("metric")?.to_string(),
                top_n,
                window: args.option("window").map(str::to_string),
                order,
            };
            run_request(&args, &index, &selected, &request)
        }
        "scatter" => {
            let request = QueryRequest::Scatter {
                x_metric: args.required("x")?.to_string(),
                y_metric: args.required("y")?.to_string(),
                window: args.option("window").map(str::to_string),
            };
            run_request(&args, &index, &selected, &request)
        }
        "compare" => {
            let teams = args.required("teams")?;
            let (team_a, team_b) = teams
                .split_once(',')
                .ok_or_else(|| anyhow!("--teams expects two teams separated by a comma"))?;
            let request = QueryRequest::Compare {
                team_a: team_a.trim().to_string(),
                team_b: team_b.trim().to_string(),
                window: args.option("window").map(str::to_string),
            };
            run_request(&args, &index, &selected, &request)
        }
        other => bail!("unknown command '{other}'\n{USAGE}"),
    }
}

fn parse_args(raw: Vec<String>) -> Result<CliArgs> {
    let mut args = CliArgs::default();
    let mut iter = raw.into_iter().peekable();
    while let Some(arg) = iter.next() {
        let Some(flag) = arg.strip_prefix("--") else {
            if args.command.is_none() {
                args.command = Some(arg);
            } else {
                args.positional.push(arg);
            }
            continue;
        };
        if flag == "json" {
            args.json = true;
            continue;
        }
        let (key, value) = match flag.split_once('=') {
            Some((key, value)) => (key.to_string(), value.to_string()),
            None => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--{flag} expects a value"))?;
                (flag.to_string(), value)
            }
        };
        match key.as_str() {
            "db" => args.db = Some(PathBuf::from(value.trim())),
            "season" => args.season = Some(value.trim().to_string()),
            "xlsx" => args.xlsx = Some(PathBuf::from(value.trim())),
            _ => {
                args.options.insert(key, value);
            }
        }
    }
    Ok(args)
}

fn run_ask(args: &CliArgs, config: &AppConfig, index: &SeasonIndex, selected: &str) -> Result<()> {
    let utterance = args.positional.join(" ");
    if utterance.trim().is_empty() {
        bail!("ask expects a question\n{USAGE}");
    }
    let classifier = RuleBasedClassifier::new().with_default_top_n(config.default_top_n);
    let ctx = QueryContext {
        index,
        selected_season: selected,
    };

    match classifier.classify(&utterance, &ctx) {
        ClassifierResult::Structured(classified) => {
            if classified.season_override {
                println!("Using season {} (named in the question)", classified.season);
            }
            let dataset = index.snapshot(&classified.season)?;
            let output = Aggregator::new(&dataset).run(&classified.query)?;
            emit(args, &output)
        }
        other if args.json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&other).context("serialize classifier result")?
            );
            Ok(())
        }
        ClassifierResult::Clarify {
            question,
            candidates,
            ..
        } => {
            println!("{question}");
            for (idx, spec) in candidates.iter().enumerate() {
                println!(
                    "  {}. {}",
                    idx + 1,
                    serde_json::to_string(spec).context("serialize candidate")?
                );
            }
            Ok(())
        }
        ClassifierResult::OutOfScope {
            reason,
            suggestions,
            ..
        } => {
            println!("Not supported: {reason}");
            if !suggestions.is_empty() {
                println!("Try instead:");
                for s in &suggestions {
                    println!("  - {s}");
                }
            }
            Ok(())
        }
    }
}

fn run_request(
    args: &CliArgs,
    index: &SeasonIndex,
    selected: &str,
    request: &QueryRequest,
) -> Result<()> {
    let dataset = index.snapshot(selected)?;
    if let Some(entry) = index.entry(selected)
        && entry.is_stale(Utc::now())
    {
        warn!(season = selected, fetched_at = %entry.fetched_at, "running on stale season data");
    }
    let query = QueryValidator::new(&dataset).validate(request)?;
    let output = Aggregator::new(&dataset).run(&query)?;
    emit(args, &output)
}

fn emit(args: &CliArgs, output: &QueryOutput) -> Result<()> {
    if args.json {
        println!("{}", export::to_json(output)?);
    } else {
        print_table(&export::table_rows(output));
        println!();
        for part in output.explanation.split(" | ") {
            println!("  {part}");
        }
    }
    if let Some(path) = &args.xlsx {
        export::export_xlsx(path, output)?;
        println!("Wrote {}", path.display());
    }
    Ok(())
}

fn print_table(rows: &[Vec<String>]) {
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    let widths: Vec<usize> = (0..columns)
        .map(|col| {
            rows.iter()
                .filter_map(|row| row.get(col))
                .map(|cell| cell.chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect();
    for row in rows {
        let line = row
            .iter()
            .enumerate()
            .map(|(col, cell)| format!("{cell:<width$}", width = widths[col]))
            .collect::<Vec<_>>()
            .join("  ");
        println!("{}", line.trim_end());
    }
}

fn print_seasons(conn: &rusqlite::Connection) -> Result<()> {
    let seasons = season_store::list_seasons(conn)?;
    if seasons.is_empty() {
        println!("No seasons stored.");
        return Ok(());
    }
    let now = Utc::now();
    for s in seasons {
        let stale = is_stale(s.fetched_at, now);
        println!(
            "{}  rows={}  fetched={}{}",
            s.season,
            s.row_count,
            s.fetched_at.format("%Y-%m-%d %H:%M UTC"),
            if stale { "  (stale)" } else { "" }
        );
    }
    Ok(())
}
