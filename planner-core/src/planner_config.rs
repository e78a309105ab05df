//! Planner configuration.

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::{PlannerError, PlannerResult};
use crate::recurrence::{DEFAULT_MAX_COUNT, TermBoundary};

fn default_max_count() -> u32 {
    DEFAULT_MAX_COUNT
}

fn default_boundary_month() -> u32 {
    1
}

fn default_boundary_day() -> u32 {
    15
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    4096
}

/// Configuration at ~/.config/planner/config.toml, overridable with
/// `PLANNER_*` environment variables (e.g. `PLANNER_PORT=8080`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Occurrence bound when a request doesn't give one
    #[serde(default = "default_max_count")]
    pub default_max_count: u32,

    /// Term boundary that caps recurrence horizons
    #[serde(default = "default_boundary_month")]
    pub term_boundary_month: u32,
    #[serde(default = "default_boundary_day")]
    pub term_boundary_day: u32,

    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        PlannerConfig {
            default_max_count: default_max_count(),
            term_boundary_month: default_boundary_month(),
            term_boundary_day: default_boundary_day(),
            host: default_host(),
            port: default_port(),
        }
    }
}

impl PlannerConfig {
    pub fn config_path() -> PlannerResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| PlannerError::Config("Could not determine config directory".into()))?
            .join("planner");

        Ok(config_dir.join("config.toml"))
    }

    /// Load from the default location. A missing file means all defaults.
    pub fn load() -> PlannerResult<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> PlannerResult<Self> {
        let config: PlannerConfig = Config::builder()
            .add_source(File::from(path.to_path_buf()).required(false))
            .add_source(Environment::with_prefix("PLANNER").try_parsing(true))
            .build()
            .map_err(|e| PlannerError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| PlannerError::Config(e.to_string()))?;

        config.term_boundary()?;
        Ok(config)
    }

    pub fn term_boundary(&self) -> PlannerResult<TermBoundary> {
        TermBoundary::new(self.term_boundary_month, self.term_boundary_day)
    }
}
