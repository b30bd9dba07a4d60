use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Payout receipt for a completed sell. The server re-validates the price
/// against the catalog before paying out, so the receipt is authoritative.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellReceipt {
    pub signature: String,
    pub credits_awarded: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SellRequest<'a> {
    commodity_id: &'a str,
    quantity: u32,
    planet_id: &'a str,
}

/// Result of an initial-credits claim. Idempotent per user: a replay
/// returns `already_claimed` instead of paying twice.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimOutcome {
    #[serde(default)]
    pub already_claimed: bool,
    #[serde(default)]
    pub amount: u64,
}

/// Result of a blueprint mint request. Idempotent per (user, blueprint):
/// replays come back with `already_minted` set.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MintOutcome {
    #[serde(default)]
    pub already_minted: bool,
    #[serde(default)]
    pub mint_address: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MintRequest<'a> {
    blueprint_id: &'a str,
    transaction_signature: &'a str,
}

/// Client for the money-movement endpoints. Everything behind these calls
/// (token transfers, treasury accounts) is an opaque remote service.
pub struct TradeClient {
    client: Client,
    api_base: String,
}

impl TradeClient {
    pub fn new(api_base: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to create HTTP client"),
            api_base,
        }
    }

    /// Sell cargo to the current planet. The caller is expected to update
    /// the hold through the store only after this succeeds.
    pub async fn execute_sell(
        &self,
        commodity_id: &str,
        quantity: u32,
        planet_id: &str,
    ) -> Result<SellReceipt> {
        let url = format!("{}/trade/sell", self.api_base);
        let body = SellRequest { commodity_id, quantity, planet_id };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .context("Failed to send sell request")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            anyhow::bail!("Sell rejected {}: {}", status, error_text);
        }

        let receipt: SellReceipt = response
            .json()
            .await
            .context("Failed to parse sell receipt")?;

        info!(
            "Sold {} x {} at {}: +{} GC (signature {})",
            quantity, commodity_id, planet_id, receipt.credits_awarded, receipt.signature
        );

        Ok(receipt)
    }

    /// Claim the one-time starting credits for this account.
    pub async fn claim_initial_credits(&self) -> Result<ClaimOutcome> {
        let url = format!("{}/faucet/claim-initial-credits", self.api_base);

        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({}))
            .send()
            .await
            .context("Failed to send faucet claim")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            anyhow::bail!("Faucet claim failed {}: {}", status, error_text);
        }

        let outcome: ClaimOutcome = response
            .json()
            .await
            .context("Failed to parse faucet response")?;

        if outcome.already_claimed {
            info!("Initial credits were already claimed for this account");
        } else {
            info!("Claimed {} GC in initial credits", outcome.amount);
        }

        Ok(outcome)
    }

    /// Mint the physical blueprint NFT after its payment transaction has
    /// been signed by the presentation layer. Safe to replay: the server
    /// deduplicates per (user, blueprint).
    pub async fn mint_blueprint(
        &self,
        blueprint_id: &str,
        transaction_signature: &str,
    ) -> Result<MintOutcome> {
        let url = format!("{}/blueprints/mint", self.api_base);
        let body = MintRequest { blueprint_id, transaction_signature };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .context("Failed to send mint request")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            anyhow::bail!("Mint rejected {}: {}", status, error_text);
        }

        let outcome: MintOutcome = response
            .json()
            .await
            .context("Failed to parse mint response")?;

        if outcome.already_minted {
            info!("Blueprint {} was already minted for this account", blueprint_id);
        } else {
            info!(
                "Minted blueprint {} (mint {})",
                blueprint_id,
                outcome.mint_address.as_deref().unwrap_or("pending")
            );
        }

        Ok(outcome)
    }
}
