use chrono::{Duration, NaiveDate, Utc};
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use nba_lens::aggregate::Aggregator;
use nba_lens::classifier::{QueryClassifier, QueryContext, RuleBasedClassifier};
use nba_lens::dataset::{SeasonDataset, TeamGameRow};
use nba_lens::metrics::enrich;
use nba_lens::query::QueryRequest;
use nba_lens::season_index::SeasonIndex;
use nba_lens::teams::TEAM_DIRECTORY;
use nba_lens::validator::QueryValidator;

const SEASON: &str = "2023-24";

fn row(game_id: &str, day: i64, team: u32, abbr: &str, opponent: u32, seed: u32) -> TeamGameRow {
    let opener = NaiveDate::from_ymd_opt(2023, 10, 24).expect("valid date");
    TeamGameRow {
        season: SEASON.to_string(),
        game_id: game_id.to_string(),
        game_date: opener + Duration::days(day),
        team_id: team,
        team_abbreviation: abbr.to_string(),
        team_name: String::new(),
        opponent_team_id: opponent,
        fgm: 38 + seed % 9,
        fga: 84 + seed % 11,
        fg3m: 10 + seed % 7,
        fg3a: 34 + seed % 9,
        ftm: 14 + seed % 6,
        fta: 18 + seed % 8,
        oreb: 8 + seed % 6,
        dreb: 32 + seed % 7,
        ast: 22 + seed % 8,
        tov: 11 + seed % 6,
        pts: 100 + seed % 27,
        minutes: 240,
    }
}

// 30 teams, 82 rounds of round-robin pairings.
fn full_season() -> SeasonDataset {
    let n = TEAM_DIRECTORY.len();
    let mut rows = Vec::with_capacity(n * 82);
    for round in 0..82usize {
        let mut rest: Vec<usize> = (1..n).collect();
        rest.rotate_left(round % (n - 1));
        let order: Vec<usize> = std::iter::once(0).chain(rest).collect();
        for k in 0..n / 2 {
            let (a, b) = (order[k], order[n - 1 - k]);
            let game_id = format!("00223{round:03}{k:02}");
            let (a_id, b_id) = (1000 + a as u32, 1000 + b as u32);
            let seed = (round * 31 + k * 7) as u32;
            rows.push(row(&game_id, round as i64, a_id, TEAM_DIRECTORY[a].0, b_id, seed));
            rows.push(row(&game_id, round as i64, b_id, TEAM_DIRECTORY[b].0, a_id, seed + 13));
        }
    }
    SeasonDataset::new(SEASON, rows)
}

fn bench_enrich(c: &mut Criterion) {
    let dataset = full_season();
    c.bench_function("enrich_full_season", |b| {
        b.iter(|| {
            let metrics = enrich(black_box(&dataset));
            black_box(metrics.len());
        })
    });
}

fn bench_leaderboard(c: &mut Criterion) {
    let dataset = full_season();
    let request = QueryRequest::Leaderboard {
        metric: "NET_RTG".to_string(),
        top_n: 10,
        window: Some("LAST_10".to_string()),
        order: None,
    };
    let query = QueryValidator::new(&dataset)
        .validate(&request)
        .expect("valid request");
    c.bench_function("leaderboard_net_rtg_last_10", |b| {
        b.iter(|| {
            let output = Aggregator::new(&dataset).run(black_box(&query)).unwrap();
            black_box(output.games_contributing);
        })
    });
}

fn bench_classify(c: &mut Criterion) {
    let mut index = SeasonIndex::new();
    index.insert(full_season(), Utc::now());
    let ctx = QueryContext {
        index: &index,
        selected_season: SEASON,
    };
    let classifier = RuleBasedClassifier::new();
    let utterances = [
        "Top 10 teams by net rating last 10 games",
        "show me offensive efficiency",
        "Celtics vs Lakers last 5 games",
        "best net rating in clutch situations",
    ];
    c.bench_function("classify_utterances", |b| {
        b.iter(|| {
            for text in &utterances {
                black_box(classifier.classify(black_box(text), &ctx));
            }
        })
    });
}

criterion_group!(benches, bench_enrich, bench_leaderboard, bench_classify);
criterion_main!(benches);
