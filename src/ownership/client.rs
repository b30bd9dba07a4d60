use anyhow::{Context, Result};
use reqwest::Client;
use tracing::{info, warn};

use super::parser::{parse_blueprint, RawAsset};
use crate::types::ProcessedBlueprint;

/// HTTP client for the NFT indexer that tracks wallet-owned assets.
pub struct LedgerClient {
    client: Client,
    indexer_url: String,
}

impl LedgerClient {
    pub fn new(indexer_url: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to create HTTP client"),
            indexer_url,
        }
    }

    /// Fetch every asset owned by `wallet_address` and keep the ones that
    /// decode as blueprints. Assets with missing or malformed attributes
    /// are dropped with a warning; they never fail the whole fetch.
    pub async fn fetch_owned(&self, wallet_address: &str) -> Result<Vec<ProcessedBlueprint>> {
        let url = format!(
            "{}/owned?owner={}",
            self.indexer_url,
            urlencoding::encode(wallet_address)
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to send request to NFT indexer")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            anyhow::bail!("Indexer error {}: {}", status, error_text);
        }

        let raw_assets: Vec<RawAsset> = response
            .json()
            .await
            .context("Failed to parse indexer response")?;

        let total = raw_assets.len();
        let mut blueprints = Vec::new();
        for asset in &raw_assets {
            match parse_blueprint(asset) {
                Ok(blueprint) => blueprints.push(blueprint),
                Err(rejection) => {
                    warn!(
                        "Asset {} ({}) is not a usable blueprint: {}",
                        asset.mint_address,
                        asset.name.as_deref().unwrap_or("unnamed"),
                        rejection
                    );
                }
            }
        }

        info!(
            "Processed {} blueprint(s) from {} owned asset(s)",
            blueprints.len(),
            total
        );

        Ok(blueprints)
    }
}
