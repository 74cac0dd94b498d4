use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use crate::classifier::DEFAULT_TOP_N;
use crate::season_index::normalize_season_label;
use crate::season_store;

pub const ENV_DB: &str = "NBA_LENS_DB";
pub const ENV_SEASON: &str = "NBA_LENS_SEASON";
pub const ENV_TOP_N: &str = "NBA_LENS_TOP_N";

const DEFAULT_LOG_FILTER: &str = "warn,nba_lens=info";

/// Stderr subscriber for both binaries; `RUST_LOG` overrides the default filter.
pub fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Runtime settings shared by the binaries. Command-line flags override these.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    /// `None` selects the newest stored season.
    pub season: Option<String>,
    pub default_top_n: usize,
}

impl AppConfig {
    /// Read `.env.local`/`.env` (if present) and then the process environment.
    pub fn load() -> Result<Self> {
        let _ = dotenvy::from_filename(".env.local");
        let _ = dotenvy::from_filename(".env");
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let db_path = lookup(ENV_DB)
            .filter(|v| !v.trim().is_empty())
            .map(|v| PathBuf::from(v.trim()))
            .or_else(season_store::default_db_path)
            .context("unable to resolve sqlite path (set NBA_LENS_DB)")?;

        let season = lookup(ENV_SEASON)
            .filter(|v| !v.trim().is_empty())
            .map(|v| normalize_season_label(&v).unwrap_or_else(|| v.trim().to_string()));

        let default_top_n = lookup(ENV_TOP_N)
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(DEFAULT_TOP_N)
            .max(1);

        Ok(Self {
            db_path,
            season,
            default_top_n,
        })
    }
}
