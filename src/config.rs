use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::AppError;

const EMBEDDED_CONFIG: &str = include_str!("../config/config.toml");

/// Environment variable naming a TOML file that replaces the embedded config.
pub const CONFIG_PATH_ENV: &str = "POKEDEX_CONFIG";

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub pokemon: PokemonConfig,
    pub cache: CacheConfig,
    pub scoring: ScoringConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct PokemonConfig {
    pub api_url: String,
    pub page_size: u32,
    /// Transport timeout in seconds. Unset leaves reqwest's defaults alone.
    pub timeout: Option<u64>,
    pub cache_enabled: bool,
}

impl Default for PokemonConfig {
    fn default() -> Self {
        Self {
            api_url: "https://pokeapi.co/api/v2".to_string(),
            page_size: 30,
            timeout: None,
            cache_enabled: true,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct CacheConfig {
    pub max_size: u32,
    /// Seconds an entry stays fresh.
    pub expiration: u64,
    /// Seconds between background sweeps of expired entries.
    pub sweep_interval: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: 1000,
            expiration: 3600,
            sweep_interval: 300,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct ScoringConfig {
    pub duel_jitter: f64,
    pub team_jitter: f64,
    pub seed: Option<u64>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            duel_jitter: 100.0,
            team_jitter: 200.0,
            seed: None,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
}

impl Config {
    /// Loads the file named by `POKEDEX_CONFIG`, or the embedded default.
    pub fn load() -> Result<Self, AppError> {
        match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_file(&path),
            Err(_) => Self::from_toml(EMBEDDED_CONFIG),
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AppError::ConfigError(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self, AppError> {
        let config: Config = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.pokemon.page_size == 0 {
            return Err(AppError::ConfigError(
                "pokemon.page_size must be at least 1".to_string(),
            ));
        }
        for (name, jitter) in [
            ("scoring.duel_jitter", self.scoring.duel_jitter),
            ("scoring.team_jitter", self.scoring.team_jitter),
        ] {
            if !jitter.is_finite() || jitter < 0.0 {
                return Err(AppError::ConfigError(format!(
                    "{name} must be a finite, non-negative number"
                )));
            }
        }
        Ok(())
    }
}
