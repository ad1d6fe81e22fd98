use directories::ProjectDirs;
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::clock::Millis;
use crate::content::Language;
use crate::error::{FlinchError, Result};
use crate::runtime::TICK_RATE_MS;
use crate::session::{
    SessionConfig, DEFAULT_MAX_WAIT_MS, DEFAULT_MIN_WAIT_MS, DEFAULT_PAUSE_MS,
    DEFAULT_PENALTY_MS, DEFAULT_ROUNDS,
};

/// Slowest allowed app loop tick
pub const MAX_TICK_MS: Millis = 100;

/// Persisted settings. Missing fields fall back to the defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub rounds: usize,
    pub min_wait_ms: Millis,
    pub max_wait_ms: Millis,
    pub penalty_ms: Millis,
    pub pause_ms: Millis,
    pub language: Language,
    /// How often the app loop polls the game clock
    pub tick_ms: Millis,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rounds: DEFAULT_ROUNDS,
            min_wait_ms: DEFAULT_MIN_WAIT_MS,
            max_wait_ms: DEFAULT_MAX_WAIT_MS,
            penalty_ms: DEFAULT_PENALTY_MS,
            pause_ms: DEFAULT_PAUSE_MS,
            language: Language::English,
            tick_ms: TICK_RATE_MS,
        }
    }
}

impl Config {
    /// Validate into a round schedule
    pub fn session_config(&self) -> Result<SessionConfig> {
        SessionConfig::new(self.rounds, self.min_wait_ms, self.max_wait_ms)?
            .with_penalty(self.penalty_ms)?
            .with_pause(self.pause_ms)
    }

    /// Validated loop tick
    pub fn tick_interval(&self) -> Result<Duration> {
        if self.tick_ms == 0 || self.tick_ms > MAX_TICK_MS {
            return Err(FlinchError::config(format!(
                "tick ({}ms) must be between 1ms and {MAX_TICK_MS}ms",
                self.tick_ms
            )));
        }
        Ok(Duration::from_millis(self.tick_ms))
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "flinch") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("flinch_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        let Ok(bytes) = fs::read(&self.path) else {
            return Config::default();
        };

        match serde_json::from_slice::<Config>(&bytes) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!("ignoring unreadable config {}: {e}", self.path.display());
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}
