use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::types::{ShipState, UserData};

/// The player record as loaded from the remote keyed store. `found` is
/// false when the server had to create a default record for this account.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadedRecord {
    pub user_data: UserData,
    pub found: bool,
}

/// Partial save body. Unspecified fields are retained server-side; the
/// server merges over the last-known record (last write wins).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SaveRecordRequest<'a> {
    current_planet_id: &'a str,
    ship: &'a ShipState,
    has_claimed_initial_credits: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SaveRecordResponse {
    saved_at: i64,
}

/// Gateway to the persisted per-account player record. The remote copy is
/// the source of truth; this client only loads and merge-saves.
pub struct PlayerRecordGateway {
    client: Client,
    api_base: String,
    /// Per-process id attached to saves for server-side log correlation.
    session_id: Uuid,
}

impl PlayerRecordGateway {
    pub fn new(api_base: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to create HTTP client"),
            api_base,
            session_id: Uuid::new_v4(),
        }
    }

    /// Load the player record. The server creates a default record (base
    /// ship stats, first catalog planet) when none exists.
    pub async fn load(&self) -> Result<LoadedRecord> {
        let url = format!("{}/player/record", self.api_base);

        let response = self
            .client
            .get(&url)
            .header("x-session-id", self.session_id.to_string())
            .send()
            .await
            .context("Failed to request player record")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            anyhow::bail!("Player record load failed {}: {}", status, error_text);
        }

        let record: LoadedRecord = response
            .json()
            .await
            .context("Failed to parse player record response")?;

        if record.found {
            info!(
                "Player record loaded for {} (last saved {})",
                record.user_data.civic_user_id, record.user_data.last_saved
            );
        } else {
            info!(
                "New player record created for {}",
                record.user_data.civic_user_id
            );
        }

        Ok(record)
    }

    /// Merge-save the mutable fields of the record. Returns the server-side
    /// save timestamp.
    pub async fn save(&self, user_data: &UserData) -> Result<i64> {
        let url = format!("{}/player/record", self.api_base);
        let body = SaveRecordRequest {
            current_planet_id: &user_data.current_planet_id,
            ship: &user_data.ship,
            has_claimed_initial_credits: user_data.has_claimed_initial_credits,
        };

        let response = self
            .client
            .post(&url)
            .header("x-session-id", self.session_id.to_string())
            .json(&body)
            .send()
            .await
            .context("Failed to send player record save")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            anyhow::bail!("Player record save failed {}: {}", status, error_text);
        }

        let saved: SaveRecordResponse = response
            .json()
            .await
            .context("Failed to parse save response")?;

        debug!("Player record saved at {}", saved.saved_at);
        Ok(saved.saved_at)
    }
}
