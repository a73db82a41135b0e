use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

/// Runtime settings. Sources, lowest precedence first: built-in defaults,
/// an optional `charm.toml`, then `CHARM_*` environment variables.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Settings {
    pub patterns_path: PathBuf,
    pub processed_dir: PathBuf,
    pub db_path: PathBuf,
    pub use_sqlite: bool,
    pub seen_cache_path: PathBuf,
    pub top_n_skills: usize,
}

impl Settings {
    pub fn load() -> Result<Self> {
        Self::from_builder(
            Config::builder()
                .add_source(File::with_name("charm").required(false))
                .add_source(Environment::with_prefix("CHARM")),
        )
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self> {
        builder
            .set_default("patterns_path", "config/job_patterns.json")?
            .set_default("processed_dir", "data/processed")?
            .set_default("db_path", "data/charm.db")?
            .set_default("use_sqlite", true)?
            .set_default("seen_cache_path", "data/seen.json")?
            .set_default("top_n_skills", 30)?
            .build()
            .context("failed to build settings")?
            .try_deserialize()
            .context("invalid settings")
    }
}
