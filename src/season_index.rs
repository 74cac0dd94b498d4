use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::dataset::SeasonDataset;
use crate::error::{QueryError, Result};

/// Seasons older than this are reported stale; refreshing them is the loader's job.
pub const STALE_AFTER_HOURS: i64 = 24;

#[derive(Debug, Clone)]
pub struct SeasonEntry {
    pub dataset: Arc<SeasonDataset>,
    pub fetched_at: DateTime<Utc>,
}

impl SeasonEntry {
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        is_stale(self.fetched_at, now)
    }
}

pub fn is_stale(fetched_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now.signed_duration_since(fetched_at) > Duration::hours(STALE_AFTER_HOURS)
}

/// Season label -> immutable dataset snapshot.
///
/// Requests clone the `Arc` once and work on that snapshot, so replacing an entry while
/// a request is running never changes the rows it sees.
#[derive(Debug, Clone, Default)]
pub struct SeasonIndex {
    entries: BTreeMap<String, SeasonEntry>,
}

impl SeasonIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, dataset: SeasonDataset, fetched_at: DateTime<Utc>) {
        let label = dataset.season().to_string();
        self.entries.insert(
            label,
            SeasonEntry {
                dataset: Arc::new(dataset),
                fetched_at,
            },
        );
    }

    pub fn contains(&self, season: &str) -> bool {
        self.entries.contains_key(season)
    }

    pub fn entry(&self, season: &str) -> Option<&SeasonEntry> {
        self.entries.get(season)
    }

    pub fn snapshot(&self, season: &str) -> Result<Arc<SeasonDataset>> {
        self.entries
            .get(season)
            .map(|e| Arc::clone(&e.dataset))
            .ok_or_else(|| QueryError::SeasonNotFound(season.to_string()))
    }

    /// Season labels, newest first.
    pub fn seasons(&self) -> Vec<&str> {
        let mut out: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        out.sort_by(|a, b| b.cmp(a));
        out
    }

    pub fn latest_season(&self) -> Option<&str> {
        self.entries.keys().next_back().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Up to `n` known seasons nearest to `season` by start year, newer first on ties.
    pub fn closest_seasons(&self, season: &str, n: usize) -> Vec<String> {
        let Some(target) = season_start_year(season) else {
            return self.seasons().into_iter().take(n).map(str::to_string).collect();
        };
        let mut known: Vec<(i32, i32, &str)> = self
            .entries
            .keys()
            .filter_map(|label| {
                season_start_year(label).map(|year| ((year - target).abs(), -year, label.as_str()))
            })
            .collect();
        known.sort();
        known
            .into_iter()
            .take(n)
            .map(|(_, _, label)| label.to_string())
            .collect()
    }
}

pub fn season_start_year(label: &str) -> Option<i32> {
    let (start, _) = label.split_once('-')?;
    if start.len() != 4 {
        return None;
    }
    start.parse().ok()
}

/// Normalise `2023-24`, `2023-2024` and `2023/24` to `2023-24`.
pub fn normalize_season_label(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let (start, end) = raw.split_once(['-', '/'])?;
    if start.len() != 4 || !start.starts_with("20") || !start.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    if !end.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let end = match end.len() {
        2 => end,
        4 if end.starts_with("20") => &end[2..],
        _ => return None,
    };
    Some(format!("{start}-{end}"))
}
