// ⚙️ Configuration - TOML file + environment overrides
//
// Lookup order: explicit path → $TRIAGE_CONFIG → ./triage.toml.
// A missing file is not an error; defaults are used.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

use crate::error::{Result, TriageError};

pub const CONFIG_ENV: &str = "TRIAGE_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "./triage.toml";

const MAX_SEED_COUNT: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriageConfig {
    /// Period of the simulated ingest feed
    pub ingest_interval_ms: u64,

    /// Entities generated into Unreviewed at startup
    pub seed_count: usize,

    /// Where exported reports are written
    pub report_dir: PathBuf,

    /// Archive the Deleted collection along with Flagged/Priority on submit
    pub submit_includes_deleted: bool,

    /// Fixed RNG seed for reproducible mock data
    pub rng_seed: Option<u64>,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            ingest_interval_ms: 2000,
            seed_count: 25,
            report_dir: PathBuf::from("./reports"),
            submit_includes_deleted: false,
            rng_seed: None,
        }
    }
}

impl TriageConfig {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => PathBuf::from(
                env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string()),
            ),
        };

        let mut config = if path.exists() {
            let content = fs::read_to_string(&path).map_err(|source| TriageError::Io {
                path: path.clone(),
                source,
            })?;
            Self::from_toml_str(&content)?
        } else {
            warn!(path = %path.display(), "config file not found, using defaults");
            TriageConfig::default()
        };

        config.apply_overrides(|key| env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply TRIAGE_* overrides from any key/value lookup (the process
    /// environment in production).
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("TRIAGE_INGEST_INTERVAL_MS") {
            match value.trim().parse::<u64>() {
                Ok(ms) => self.ingest_interval_ms = ms,
                Err(_) => warn!(%value, "ignoring non-numeric TRIAGE_INGEST_INTERVAL_MS"),
            }
        }
        if let Some(value) = lookup("TRIAGE_REPORT_DIR") {
            if !value.trim().is_empty() {
                self.report_dir = PathBuf::from(value.trim());
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.ingest_interval_ms == 0 {
            return Err(TriageError::InvalidConfig(
                "ingest_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.seed_count > MAX_SEED_COUNT {
            return Err(TriageError::InvalidConfig(format!(
                "seed_count {} exceeds the maximum of {}",
                self.seed_count, MAX_SEED_COUNT
            )));
        }
        Ok(())
    }

    pub fn ingest_interval(&self) -> Duration {
        Duration::from_millis(self.ingest_interval_ms)
    }
}
