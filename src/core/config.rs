//! Configuration system: TOML file + env var overrides + smart defaults.

#![allow(missing_docs)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::{PwfError, Result};
use crate::generator::category::TestCategory;
use crate::harness::plan::{DEFAULT_CHECKPOINT_INTERVAL, RunPlan};

/// Full pwfuzz configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Config {
    pub run: RunConfig,
    pub paths: PathsConfig,
}

/// Generation run knobs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RunConfig {
    pub categories: Vec<TestCategory>,
    pub repetitions: u64,
    pub fail_fast: bool,
    pub show_progress: bool,
    pub checkpoint_interval: u64,
    /// Cases a generator may queue ahead of the scorer; 0 is a rendezvous.
    pub handoff_capacity: usize,
    /// Fixed seed for reproducible runs; random when absent.
    pub seed: Option<u64>,
}

/// Filesystem paths used by pwfuzz.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PathsConfig {
    pub config_file: PathBuf,
    pub results_file: PathBuf,
    /// JSONL event log; disabled when absent.
    pub event_log: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            categories: TestCategory::ALL.to_vec(),
            repetitions: 100,
            fail_fast: false,
            show_progress: false,
            checkpoint_interval: DEFAULT_CHECKPOINT_INTERVAL,
            handoff_capacity: 0,
            seed: None,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        let home_dir = env::var_os("HOME").map_or_else(
            || {
                eprintln!(
                    "[PWF-CONFIG] WARNING: HOME not set, falling back to /tmp for config path"
                );
                PathBuf::from("/tmp")
            },
            PathBuf::from,
        );
        Self {
            config_file: home_dir.join(".config").join("pwfuzz").join("config.toml"),
            results_file: PathBuf::from("results.csv"),
            event_log: None,
        }
    }
}

impl Config {
    /// Default configuration path.
    #[must_use]
    pub fn default_path() -> PathBuf {
        PathsConfig::default().config_file
    }

    /// Load config from default or explicit path, then apply env overrides.
    ///
    /// Missing config file is not an error when loading from default path; defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with(path, env_var)
    }

    fn load_with<F>(path: Option<&Path>, lookup: F) -> Result<Self>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);
        let is_explicit_path = path.is_some();

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|e| PwfError::io(&path_buf, e))?;
            let parsed: Self = toml::from_str(&raw)?;
            parsed
        } else if is_explicit_path {
            return Err(PwfError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.paths.config_file = path_buf;
        cfg.apply_env_overrides_from(lookup)?;
        cfg.normalize();
        cfg.validate()?;
        Ok(cfg)
    }

    /// Deterministic hash of the effective config for the event log.
    ///
    /// FNV-1a over canonical JSON, stable across processes and toolchains.
    pub fn stable_hash(&self) -> Result<String> {
        let canonical = serde_json::to_string(self)?;
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in canonical.as_bytes() {
            hash ^= u64::from(*byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        Ok(format!("{hash:016x}"))
    }

    /// Freeze the run section into an executable plan.
    pub fn run_plan(&self) -> Result<RunPlan> {
        Ok(
            RunPlan::new(self.run.categories.iter().copied(), self.run.repetitions)?
                .with_fail_fast(self.run.fail_fast)
                .with_checkpoint_interval(self.run.checkpoint_interval)
                .with_handoff_capacity(self.run.handoff_capacity)
                .with_seed(self.run.seed),
        )
    }

    fn apply_env_overrides_from<F>(&mut self, mut lookup: F) -> Result<()>
    where
        F: FnMut(&str) -> Option<String>,
    {
        // run
        if let Some(raw) = lookup("PWF_RUN_REPETITIONS") {
            self.run.repetitions = parse_env("PWF_RUN_REPETITIONS", &raw)?;
        }
        if let Some(raw) = lookup("PWF_RUN_FAIL_FAST") {
            self.run.fail_fast = parse_env("PWF_RUN_FAIL_FAST", &raw)?;
        }
        if let Some(raw) = lookup("PWF_RUN_SHOW_PROGRESS") {
            self.run.show_progress = parse_env("PWF_RUN_SHOW_PROGRESS", &raw)?;
        }
        if let Some(raw) = lookup("PWF_RUN_CHECKPOINT_INTERVAL") {
            self.run.checkpoint_interval = parse_env("PWF_RUN_CHECKPOINT_INTERVAL", &raw)?;
        }
        if let Some(raw) = lookup("PWF_RUN_HANDOFF_CAPACITY") {
            self.run.handoff_capacity = parse_env("PWF_RUN_HANDOFF_CAPACITY", &raw)?;
        }
        if let Some(raw) = lookup("PWF_RUN_SEED") {
            self.run.seed = Some(parse_env("PWF_RUN_SEED", &raw)?);
        }
        if let Some(raw) = lookup("PWF_RUN_CATEGORIES") {
            self.run.categories = raw
                .split(',')
                .filter(|item| !item.trim().is_empty())
                .map(|item| {
                    item.parse::<TestCategory>()
                        .map_err(|error| PwfError::ConfigParse {
                            context: "env",
                            details: format!("PWF_RUN_CATEGORIES={raw:?}: {error}"),
                        })
                })
                .collect::<Result<_>>()?;
        }

        // paths
        if let Some(raw) = lookup("PWF_PATHS_RESULTS_FILE") {
            self.paths.results_file = PathBuf::from(raw);
        }
        if let Some(raw) = lookup("PWF_PATHS_EVENT_LOG") {
            self.paths.event_log = Some(PathBuf::from(raw));
        }

        Ok(())
    }

    fn normalize(&mut self) {
        self.run.categories.sort_unstable();
        self.run.categories.dedup();
    }

    pub fn validate(&self) -> Result<()> {
        if self.run.repetitions == 0 {
            return Err(PwfError::InvalidConfig {
                details: "run.repetitions must be > 0".to_string(),
            });
        }
        if self.run.checkpoint_interval == 0 {
            return Err(PwfError::InvalidConfig {
                details: "run.checkpoint_interval must be > 0".to_string(),
            });
        }
        if self.run.categories.is_empty() {
            return Err(PwfError::InvalidConfig {
                details: "run.categories must name at least one category".to_string(),
            });
        }
        if self.paths.results_file.as_os_str().is_empty() {
            return Err(PwfError::InvalidConfig {
                details: "paths.results_file must not be empty".to_string(),
            });
        }
        if self
            .paths
            .event_log
            .as_ref()
            .is_some_and(|p| p.as_os_str().is_empty())
        {
            return Err(PwfError::InvalidConfig {
                details: "paths.event_log must not be empty when set".to_string(),
            });
        }
        Ok(())
    }
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|raw| !raw.trim().is_empty())
}

fn parse_env<T>(name: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse::<T>().map_err(|error| PwfError::ConfigParse {
        context: "env",
        details: format!("{name}={raw:?}: {error}"),
    })
}
