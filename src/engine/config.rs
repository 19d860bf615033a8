//! Session configuration, loaded from TOML at runtime.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::engine::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Players needed before the game can start: 2 or 3.
    #[serde(default = "default_players_number")]
    pub players_number: usize,
    #[serde(default = "default_suspension_timeout_secs")]
    pub suspension_timeout_secs: u64,
    /// Character cards and coins.
    #[serde(default = "default_expert_mode")]
    pub expert_mode: bool,
    /// Seed for the reference rule engine's bag and character draw.
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_players_number() -> usize {
    2
}

fn default_suspension_timeout_secs() -> u64 {
    60
}

fn default_expert_mode() -> bool {
    true
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            players_number: default_players_number(),
            suspension_timeout_secs: default_suspension_timeout_secs(),
            expert_mode: default_expert_mode(),
            seed: None,
        }
    }
}

impl SessionConfig {
    pub fn for_players(players_number: usize) -> Self {
        Self {
            players_number,
            ..Self::default()
        }
    }

    pub fn suspension_timeout(&self) -> Duration {
        Duration::from_secs(self.suspension_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(2..=3).contains(&self.players_number) {
            return Err(ConfigError::PlayerCount(self.players_number));
        }
        if self.suspension_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }
}

/// Load and validate a config file.
pub fn load_config(path: &Path) -> Result<SessionConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let config: SessionConfig = toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })?;
    config.validate()?;
    Ok(config)
}

/// Try well-known paths, falling back to defaults.
pub fn load_default_config() -> SessionConfig {
    let candidates = [
        "eriantys.toml",
        "../eriantys.toml",
        "/etc/eriantys/eriantys.toml",
    ];
    for path in &candidates {
        let p = Path::new(path);
        if p.exists() {
            match load_config(p) {
                Ok(config) => {
                    tracing::info!(path = %p.display(), players = config.players_number, "loaded session config");
                    return config;
                }
                Err(e) => {
                    tracing::warn!(path = %p.display(), error = %e, "failed to load session config");
                }
            }
        }
    }
    tracing::info!("no eriantys.toml found, using built-in defaults");
    SessionConfig::default()
}
