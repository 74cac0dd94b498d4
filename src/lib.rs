pub mod aggregate;
pub mod classifier;
pub mod config;
pub mod dataset;
pub mod error;
pub mod export;
pub mod game_log;
pub mod metrics;
pub mod query;
pub mod scope_guard;
pub mod season_index;
pub mod season_store;
pub mod teams;
pub mod text;
pub mod validator;
