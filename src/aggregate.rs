use std::cmp::Ordering;

use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;

use crate::dataset::{SeasonDataset, TeamId, TeamRef};
use crate::error::{QueryError, Result};
use crate::metrics::{BoxCounts, Metric, net};
use crate::query::{QuerySpec, SortOrder, ValidatedQuery, Window};

/// One team reduced over a window. Every rate is computed from the summed counts.
#[derive(Debug, Clone, Serialize)]
pub struct TeamAggregate {
    pub team: TeamRef,
    pub games: u32,
    pub possessions: f64,
    pub totals: BoxCounts,
    /// Summed opponent counts over the same games; `None` when a game lacks its pairing.
    pub opponent_totals: Option<BoxCounts>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unpaired_game: Option<String>,
    pub ortg: Option<f64>,
    pub drtg: Option<f64>,
    pub net_rtg: Option<f64>,
    pub efg_pct: Option<f64>,
    pub ts_pct: Option<f64>,
    pub pace: Option<f64>,
    pub ast_rate: Option<f64>,
    pub tov_rate: Option<f64>,
    pub ppg: Option<f64>,
}

impl TeamAggregate {
    /// Value of `metric`, or a data-integrity error when the metric needs opponent rows
    /// that are missing. `Ok(None)` means the rate is undefined (zero denominator).
    pub fn value(&self, metric: Metric) -> Result<Option<f64>> {
        if metric.needs_opponent() {
            if let Some(game_id) = &self.unpaired_game {
                return Err(QueryError::DataIntegrity {
                    game_id: game_id.clone(),
                    team_id: self.team.id,
                });
            }
        }
        Ok(match metric {
            Metric::ORtg => self.ortg,
            Metric::DRtg => self.drtg,
            Metric::NetRtg => self.net_rtg,
            Metric::EfgPct => self.efg_pct,
            Metric::TsPct => self.ts_pct,
            Metric::Pace => self.pace,
            Metric::AstRate => self.ast_rate,
            Metric::TovRate => self.tov_rate,
            Metric::Ppg => self.ppg,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardRow {
    pub rank: usize,
    pub team: TeamRef,
    pub games: u32,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScatterPoint {
    pub team: TeamRef,
    pub games: u32,
    pub x: Option<f64>,
    pub y: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "chart_type", rename_all = "snake_case")]
pub enum ResultTable {
    Leaderboard {
        metric: Metric,
        rows: Vec<LeaderboardRow>,
    },
    Scatter {
        x_metric: Metric,
        y_metric: Metric,
        points: Vec<ScatterPoint>,
    },
    Compare {
        teams: Vec<TeamAggregate>,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryOutput {
    pub season: String,
    pub spec: QuerySpec,
    pub table: ResultTable,
    pub explanation: String,
    pub teams_contributing: usize,
    pub games_contributing: u32,
    /// Teams with fewer games than the window asked for (all their games were used).
    pub short_teams: usize,
}

pub struct Aggregator<'a> {
    dataset: &'a SeasonDataset,
}

impl<'a> Aggregator<'a> {
    pub fn new(dataset: &'a SeasonDataset) -> Self {
        Self { dataset }
    }

    pub fn run(&self, query: &ValidatedQuery) -> Result<QueryOutput> {
        let spec = query.spec();
        let window = spec.window();
        let team_ids: Vec<TeamId> = match spec {
            QuerySpec::Compare { team_a, team_b, .. } => {
                for id in [*team_a, *team_b] {
                    if self.dataset.team(id).is_none() {
                        return Err(QueryError::TeamIdentity(format!(
                            "team {id} is not in season {}",
                            self.dataset.season()
                        )));
                    }
                }
                vec![*team_a, *team_b]
            }
            _ => self.dataset.teams().map(|t| t.id).collect(),
        };
        let aggregates = aggregate_teams(self.dataset, &team_ids, window);

        let teams_contributing = aggregates.iter().filter(|a| a.games > 0).count();
        let games_contributing = aggregates.iter().map(|a| a.games).sum();
        let short_teams = match window.game_limit() {
            Some(k) => aggregates.iter().filter(|a| (a.games as usize) < k).count(),
            None => 0,
        };
        debug!(
            season = self.dataset.season(),
            chart = spec.chart_label(),
            window = window.name(),
            teams = teams_contributing,
            games = games_contributing,
            "aggregated window"
        );

        let table = match spec {
            QuerySpec::Leaderboard {
                metric,
                top_n,
                order,
                ..
            } => ResultTable::Leaderboard {
                metric: *metric,
                rows: leaderboard_rows(&aggregates, *metric, *order, *top_n)?,
            },
            QuerySpec::Scatter {
                x_metric, y_metric, ..
            } => {
                let points = aggregates
                    .iter()
                    .map(|a| {
                        Ok(ScatterPoint {
                            team: a.team.clone(),
                            games: a.games,
                            x: a.value(*x_metric)?,
                            y: a.value(*y_metric)?,
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                ResultTable::Scatter {
                    x_metric: *x_metric,
                    y_metric: *y_metric,
                    points,
                }
            }
            QuerySpec::Compare { .. } => ResultTable::Compare { teams: aggregates },
        };

        let explanation = build_explanation(
            spec,
            self.dataset.season(),
            teams_contributing,
            games_contributing,
            short_teams,
        );

        Ok(QueryOutput {
            season: self.dataset.season().to_string(),
            spec: spec.clone(),
            table,
            explanation,
            teams_contributing,
            games_contributing,
            short_teams,
        })
    }
}

/// Aggregate the given teams over `window`, in the order given.
pub fn aggregate_teams(
    dataset: &SeasonDataset,
    team_ids: &[TeamId],
    window: Window,
) -> Vec<TeamAggregate> {
    team_ids
        .par_iter()
        .filter_map(|id| dataset.team(*id))
        .map(|team| aggregate_team(dataset, team, window))
        .collect()
}

pub fn aggregate_team(dataset: &SeasonDataset, team: &TeamRef, window: Window) -> TeamAggregate {
    let mut totals = BoxCounts::default();
    let mut opp_totals = BoxCounts::default();
    let mut unpaired_game: Option<String> = None;

    for idx in window_games(dataset, team.id, window) {
        let Some(row) = dataset.row(*idx) else {
            continue;
        };
        totals.add(&BoxCounts::from_row(row));
        match dataset.opponent_of(row) {
            Ok(opp) => opp_totals.add(&BoxCounts::from_row(opp)),
            Err(_) => {
                if unpaired_game.is_none() {
                    unpaired_game = Some(row.game_id.clone());
                }
            }
        }
    }

    let ortg = totals.offensive_rating();
    let (opponent_totals, drtg) = if unpaired_game.is_none() && totals.games > 0 {
        (Some(opp_totals), opp_totals.offensive_rating())
    } else {
        (None, None)
    };

    TeamAggregate {
        team: team.clone(),
        games: totals.games,
        possessions: totals.possessions(),
        totals,
        opponent_totals,
        unpaired_game,
        ortg,
        drtg,
        net_rtg: net(ortg, drtg),
        efg_pct: totals.efg_pct(),
        ts_pct: totals.ts_pct(),
        pace: totals.pace(),
        ast_rate: totals.ast_rate(),
        tov_rate: totals.tov_rate(),
        ppg: totals.points_per_game(),
    }
}

/// Row indices of a team's games inside `window`, most recent first. Teams with fewer
/// games than the window get all of their games.
pub fn window_games(dataset: &SeasonDataset, team_id: TeamId, window: Window) -> &[usize] {
    let games = dataset.team_games(team_id);
    match window.game_limit() {
        Some(k) => &games[..games.len().min(k)],
        None => games,
    }
}

fn leaderboard_rows(
    aggregates: &[TeamAggregate],
    metric: Metric,
    order: SortOrder,
    top_n: usize,
) -> Result<Vec<LeaderboardRow>> {
    let mut scored: Vec<(&TeamAggregate, Option<f64>)> = aggregates
        .iter()
        .filter(|a| a.games > 0)
        .map(|a| a.value(metric).map(|v| (a, v)))
        .collect::<Result<Vec<_>>>()?;

    scored.sort_by(|(a, va), (b, vb)| {
        compare_values(*va, *vb, order).then_with(|| a.team.id.cmp(&b.team.id))
    });

    Ok(scored
        .into_iter()
        .take(top_n)
        .enumerate()
        .map(|(idx, (agg, value))| LeaderboardRow {
            rank: idx + 1,
            team: agg.team.clone(),
            games: agg.games,
            value,
        })
        .collect())
}

// Undefined values always sort last, whatever the order.
fn compare_values(a: Option<f64>, b: Option<f64>, order: SortOrder) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => match order {
            SortOrder::Asc => a.total_cmp(&b),
            SortOrder::Desc => b.total_cmp(&a),
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn build_explanation(
    spec: &QuerySpec,
    season: &str,
    teams: usize,
    games: u32,
    short_teams: usize,
) -> String {
    let window = spec.window();
    let mut parts = vec![
        format!("Chart: {}", spec.chart_label()),
        format!("Season: {season}"),
        match window.game_limit() {
            Some(k) => format!("Window: {window} (most recent {k} games per team)"),
            None => format!("Window: {window} (all games to date)"),
        },
    ];

    let metrics: Vec<Metric> = match spec {
        QuerySpec::Leaderboard {
            metric,
            top_n,
            order,
            ..
        } => {
            parts.push(format!(
                "Metric: {metric} (sorted {}, top {top_n}, ties by team id)",
                order.label()
            ));
            vec![*metric]
        }
        QuerySpec::Scatter {
            x_metric, y_metric, ..
        } => {
            parts.push(format!("X: {x_metric}, Y: {y_metric}"));
            parts.push("Each point is one team aggregated over the window".to_string());
            vec![*x_metric, *y_metric]
        }
        QuerySpec::Compare { .. } => {
            parts.push("Metrics: full standard set per team".to_string());
            Metric::ALL.to_vec()
        }
    };

    parts.push(format!("Teams: {teams}, team-games: {games}"));
    if !matches!(spec, QuerySpec::Compare { .. }) {
        for m in &metrics {
            parts.push(m.formula().to_string());
        }
    }
    parts.push(
        "Rates recomputed from summed box-score counts and possessions over the window, not averaged per game"
            .to_string(),
    );
    if metrics.iter().any(|m| m.needs_opponent()) {
        parts.push("Defensive figures use the opponent row of each game".to_string());
    }
    if short_teams > 0 {
        if let Some(k) = window.game_limit() {
            parts.push(format!(
                "{short_teams} team(s) had fewer than {k} games; all of their games were used"
            ));
        }
    }
    parts.join(" | ")
}
