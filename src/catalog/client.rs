use anyhow::{Context, Result};
use chrono::Utc;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::info;

use super::Catalog;
use crate::types::{BlueprintDefinition, Commodity, Planet};

/// HTTP client for the static game-definition endpoints.
pub struct CatalogClient {
    client: Client,
    api_base: String,
}

impl CatalogClient {
    pub fn new(api_base: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to create HTTP client"),
            api_base,
        }
    }

    /// Fetch all three definition sets. Called once at session start; the
    /// returned catalog is shared read-only for the rest of the process.
    pub async fn fetch_catalog(&self) -> Result<Catalog> {
        let planets: Vec<Planet> = self
            .fetch("planets")
            .await
            .context("Failed to fetch planet definitions")?;
        let commodities: Vec<Commodity> = self
            .fetch("commodities")
            .await
            .context("Failed to fetch commodity definitions")?;
        let blueprint_definitions: Vec<BlueprintDefinition> = self
            .fetch("blueprint-definitions")
            .await
            .context("Failed to fetch blueprint definitions")?;

        if planets.is_empty() {
            anyhow::bail!("Catalog contains no planets; cannot start a session");
        }

        info!(
            "Catalog loaded: {} planets, {} commodities, {} blueprint definitions",
            planets.len(),
            commodities.len(),
            blueprint_definitions.len()
        );

        Ok(Catalog {
            planets,
            commodities,
            blueprint_definitions,
            loaded_at: Utc::now(),
        })
    }

    async fn fetch<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}/catalog/{}", self.api_base, path);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", url))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            anyhow::bail!("Catalog API error {}: {}", status, error_text);
        }

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse response from {}", url))
    }
}
