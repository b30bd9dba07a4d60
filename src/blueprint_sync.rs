use std::sync::Arc;

use anyhow::Result;
use tokio::time::{interval, Duration};
use tracing::{error, info};

use crate::ownership::LedgerClient;
use crate::state::GameStore;

/// Periodically refreshes the ownership snapshot from the NFT indexer and
/// replays blueprint effects into the ship stats.
pub struct BlueprintSyncService {
    ledger: LedgerClient,
    store: Arc<GameStore>,
    wallet_address: String,
    refresh_interval_secs: u64,
}

impl BlueprintSyncService {
    pub fn new(
        ledger: LedgerClient,
        store: Arc<GameStore>,
        wallet_address: String,
        refresh_interval_secs: u64,
    ) -> Self {
        Self {
            ledger,
            store,
            wallet_address,
            refresh_interval_secs,
        }
    }

    pub async fn run(&self) {
        let mut ticker = interval(Duration::from_secs(self.refresh_interval_secs));

        info!(
            "Blueprint sync service started (interval: {}s)",
            self.refresh_interval_secs
        );

        loop {
            ticker.tick().await;

            if let Err(e) = self.sync_once().await {
                error!("Blueprint refresh failed: {}", e);
            }
        }
    }

    /// Run one ownership refresh. At most one fetch may be in flight; when
    /// the store reports one outstanding this call is a no-op.
    pub async fn sync_once(&self) -> Result<()> {
        if !self.store.begin_blueprint_refresh() {
            info!("Blueprint refresh already in flight; skipping");
            return Ok(());
        }

        match self.ledger.fetch_owned(&self.wallet_address).await {
            Ok(blueprints) => {
                self.store.finish_blueprint_refresh(Ok(blueprints)).await;
                Ok(())
            }
            Err(e) => {
                self.store
                    .finish_blueprint_refresh(Err(e.to_string()))
                    .await;
                Err(e)
            }
        }
    }
}
