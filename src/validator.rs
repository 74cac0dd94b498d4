use crate::dataset::{SeasonDataset, TeamId};
use crate::error::{QueryError, Result};
use crate::metrics::Metric;
use crate::query::{QueryRequest, QuerySpec, SortOrder, ValidatedQuery, Window};

/// Gate between callers and the aggregator. Checks a request against the metric and
/// window allow-lists and against the teams of the active season.
#[derive(Debug, Clone, Copy)]
pub struct QueryValidator<'a> {
    dataset: &'a SeasonDataset,
}

impl<'a> QueryValidator<'a> {
    pub fn new(dataset: &'a SeasonDataset) -> Self {
        Self { dataset }
    }

    pub fn validate(&self, request: &QueryRequest) -> Result<ValidatedQuery> {
        let spec = match request {
            QueryRequest::Leaderboard {
                metric,
                top_n,
                window,
                order,
            } => {
                let metric = Metric::parse(metric)?;
                let window = parse_window(window.as_deref())?;
                let top_n = self.check_top_n(*top_n)?;
                let order = order.unwrap_or_else(|| default_order(metric));
                QuerySpec::Leaderboard {
                    metric,
                    window,
                    top_n,
                    order,
                }
            }
            QueryRequest::Scatter {
                x_metric,
                y_metric,
                window,
            } => QuerySpec::Scatter {
                x_metric: Metric::parse(x_metric)?,
                y_metric: Metric::parse(y_metric)?,
                window: parse_window(window.as_deref())?,
            },
            QueryRequest::Compare {
                team_a,
                team_b,
                window,
            } => {
                let a = self.resolve_team(team_a)?;
                let b = self.resolve_team(team_b)?;
                self.check_pair(a, b)?;
                QuerySpec::Compare {
                    team_a: a,
                    team_b: b,
                    window: parse_window(window.as_deref())?,
                }
            }
        };
        Ok(ValidatedQuery::new(spec))
    }

    /// Re-check an already typed spec against this season (e.g. a clarification
    /// candidate picked by the user, or a spec carried over from another season).
    pub fn validate_spec(&self, spec: &QuerySpec) -> Result<ValidatedQuery> {
        match spec {
            QuerySpec::Leaderboard { top_n, .. } => {
                self.check_top_n(i64::try_from(*top_n).unwrap_or(i64::MAX))?;
            }
            QuerySpec::Scatter { .. } => {}
            QuerySpec::Compare { team_a, team_b, .. } => {
                for id in [team_a, team_b] {
                    if self.dataset.team(*id).is_none() {
                        return Err(QueryError::TeamIdentity(format!(
                            "team {id} is not in season {}",
                            self.dataset.season()
                        )));
                    }
                }
                self.check_pair(*team_a, *team_b)?;
            }
        }
        Ok(ValidatedQuery::new(spec.clone()))
    }

    fn check_top_n(&self, top_n: i64) -> Result<usize> {
        let max = self.dataset.team_count() as i64;
        if top_n < 1 || top_n > max {
            return Err(QueryError::Range {
                field: "top_n",
                value: top_n,
                min: 1,
                max,
            });
        }
        Ok(top_n as usize)
    }

    fn resolve_team(&self, key: &str) -> Result<TeamId> {
        self.dataset.find_team(key).map(|t| t.id).ok_or_else(|| {
            QueryError::TeamIdentity(format!(
                "team '{}' is not in season {}",
                key.trim(),
                self.dataset.season()
            ))
        })
    }

    fn check_pair(&self, a: TeamId, b: TeamId) -> Result<()> {
        if a == b {
            let label = self
                .dataset
                .team(a)
                .map(|t| t.abbreviation.clone())
                .unwrap_or_else(|| a.to_string());
            return Err(QueryError::TeamIdentity(format!(
                "compare needs two different teams, got {label} twice"
            )));
        }
        Ok(())
    }
}

pub fn default_order(metric: Metric) -> SortOrder {
    SortOrder::for_direction(metric.direction())
}

fn parse_window(raw: Option<&str>) -> Result<Window> {
    match raw {
        None => Ok(Window::Season),
        Some(raw) => Window::parse(raw),
    }
}
