use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Solana wallet address whose owned blueprints confer ship bonuses.
    /// May also be supplied with `--wallet`.
    pub wallet_address: Option<String>,

    pub api: ApiConfig,
    pub sync: SyncConfig,
    pub game: GameConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    /// Base URL of the game API (catalog, player record, trade, faucet).
    pub base_url: String,
    /// Base URL of the NFT indexer used for ownership snapshots.
    pub indexer_url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SyncConfig {
    /// How often the ownership snapshot is refreshed.
    pub blueprint_refresh_interval_secs: u64,
    /// Backoff before retrying a failed player-record save.
    pub save_retry_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GameConfig {
    /// Transition delay between departing and arriving at a planet.
    pub travel_transition_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            wallet_address: None,
            api: ApiConfig {
                base_url: "https://play.astrotrader.io/api".to_string(),
                indexer_url: "https://indexer.astrotrader.io".to_string(),
            },
            sync: SyncConfig {
                blueprint_refresh_interval_secs: 300,
                save_retry_secs: 30,
            },
            game: GameConfig {
                travel_transition_ms: 1000,
            },
        }
    }
}

impl Config {
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".astrotrader")
            .join("config.toml")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let config_str = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;

        let config: Config = toml::from_str(&config_str)
            .context("Failed to parse config file")?;

        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let config_str = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create config directory {:?}", dir))?;
        }
        fs::write(path, config_str)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Load the config, creating one with defaults on first run.
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            info!("First run: writing default configuration to {:?}", path);
            let config = Config::default();
            config.save(path)?;
            Ok(config)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_round_trip_through_toml() {
        let config = Config::default();
        let serialized = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&serialized).unwrap();

        assert_eq!(parsed.api.base_url, config.api.base_url);
        assert_eq!(
            parsed.sync.blueprint_refresh_interval_secs,
            config.sync.blueprint_refresh_interval_secs
        );
        assert_eq!(parsed.game.travel_transition_ms, 1000);
        assert!(parsed.wallet_address.is_none());
    }

    #[test]
    fn test_load_missing_file_fails() {
        let path = PathBuf::from("/nonexistent/astrotrader/config.toml");
        assert!(Config::load(&path).is_err());
    }
}
