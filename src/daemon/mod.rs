use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::blueprint_sync::BlueprintSyncService;
use crate::catalog::{Catalog, CatalogClient};
use crate::config::Config;
use crate::gateway::{PlayerRecordGateway, SellReceipt, TradeClient};
use crate::ownership::LedgerClient;
use crate::state::GameStore;
use crate::sync::start_persist_loop;
use crate::types::UserData;

/// Reset records that reference a planet no longer in the catalog to the
/// first catalog planet, instead of stranding the ship at a dead id.
/// Returns whether the record was changed.
fn normalize_start_planet(catalog: &Catalog, user_data: &mut UserData) -> bool {
    if catalog.planet(&user_data.current_planet_id).is_some() {
        return false;
    }
    let Some(first) = catalog.first_planet() else {
        return false;
    };
    warn!(
        "Record references unknown planet {}; resetting to {}",
        user_data.current_planet_id, first.id
    );
    user_data.current_planet_id = first.id.clone();
    true
}

/// Resolve the per-unit payout for selling a commodity at a planet. The
/// server re-validates before paying; this keeps doomed requests local.
fn sell_unit_price(catalog: &Catalog, planet_id: &str, commodity_id: &str) -> Result<u64> {
    if catalog.commodity(commodity_id).is_none() {
        anyhow::bail!("Unknown commodity {}", commodity_id);
    }
    let planet = catalog
        .planet(planet_id)
        .with_context(|| format!("Unknown planet {}", planet_id))?;
    let listing = planet
        .listing(commodity_id)
        .with_context(|| format!("{} is not listed at {}", commodity_id, planet.name))?;
    if !listing.is_traded() {
        anyhow::bail!("{} is not traded at {}", commodity_id, planet.name);
    }
    listing
        .sell_price
        .with_context(|| format!("{} does not buy {}", planet.name, commodity_id))
}

/// Wires the catalog, player record, reducer, and sync loops into one
/// running session.
pub struct AstroDaemon {
    config: Config,
    catalog: Arc<Catalog>,
    store: Arc<GameStore>,
    trade: TradeClient,
    wallet_address: String,
    gateway: PlayerRecordGateway,
    persist_rx: mpsc::UnboundedReceiver<UserData>,
}

impl AstroDaemon {
    /// Load the catalog and player record and build the session state.
    pub async fn new(config: Config, wallet_address: String) -> Result<Self> {
        let catalog_client = CatalogClient::new(config.api.base_url.clone());
        let catalog = Arc::new(catalog_client.fetch_catalog().await?);

        let (persist_tx, persist_rx) = mpsc::unbounded_channel();
        let store = Arc::new(GameStore::new(
            catalog.clone(),
            persist_tx,
            Duration::from_millis(config.game.travel_transition_ms),
        ));

        let gateway = PlayerRecordGateway::new(config.api.base_url.clone());
        let mut record = gateway
            .load()
            .await
            .context("Failed to load player record")?;
        normalize_start_planet(&catalog, &mut record.user_data);
        store.set_user_data(record.user_data).await;

        let trade = TradeClient::new(config.api.base_url.clone());

        Ok(Self {
            config,
            catalog,
            store,
            trade,
            wallet_address,
            gateway,
            persist_rx,
        })
    }

    pub fn store(&self) -> Arc<GameStore> {
        self.store.clone()
    }

    pub fn catalog(&self) -> Arc<Catalog> {
        self.catalog.clone()
    }

    /// Sell cargo at the current planet: server-validated payout first,
    /// then the hold update. The only trade that runs headless; buys and
    /// refuels need the presentation layer's wallet to sign the payment.
    pub async fn sell_cargo(&self, commodity_id: &str, quantity: u32) -> Result<SellReceipt> {
        let user_data = self
            .store
            .user_data()
            .await
            .context("No player record loaded")?;

        if !self.store.can_sell_commodity(commodity_id, quantity).await {
            anyhow::bail!(
                "Cannot sell {} x {}: not enough in cargo",
                quantity,
                commodity_id
            );
        }

        let unit_price =
            sell_unit_price(&self.catalog, &user_data.current_planet_id, commodity_id)?;
        debug!(
            "Selling {} x {} at {} (expecting {} GC/unit)",
            quantity, commodity_id, user_data.current_planet_id, unit_price
        );

        self.store.set_is_trading(true).await;
        let result = self
            .trade
            .execute_sell(commodity_id, quantity, &user_data.current_planet_id)
            .await;
        self.store.set_is_trading(false).await;

        let receipt = result?;
        self.store.update_cargo_on_sell(commodity_id, quantity).await?;
        Ok(receipt)
    }

    pub async fn run(self) -> Result<()> {
        let store = self.store.clone();

        // Persistence loop drains the pending-write queue
        let retry = Duration::from_secs(self.config.sync.save_retry_secs);
        tokio::spawn(start_persist_loop(self.gateway, self.persist_rx, retry));

        // One-time faucet claim for fresh accounts
        if let Some(user_data) = store.user_data().await {
            if !user_data.has_claimed_initial_credits {
                match self.trade.claim_initial_credits().await {
                    Ok(_) => store.mark_credits_claimed().await,
                    Err(e) => warn!("Initial credits claim failed: {}", e),
                }
            }
        }

        // Ownership refresh loop keeps ship stats in step with the ledger
        let blueprint_sync = BlueprintSyncService::new(
            LedgerClient::new(self.config.api.indexer_url.clone()),
            store.clone(),
            self.wallet_address.clone(),
            self.config.sync.blueprint_refresh_interval_secs,
        );
        tokio::spawn(async move {
            blueprint_sync.run().await;
        });

        info!("Session ready; observing state changes");

        // Observer loop (runs in the current task): log every state change
        let mut revisions = store.subscribe();
        loop {
            if revisions.changed().await.is_err() {
                break;
            }
            let revision = *revisions.borrow();
            let state = store.snapshot().await;
            if let Some(user_data) = &state.user_data {
                let ship = &user_data.ship;
                debug!(
                    "rev {}: at {} | cargo {}/{} | fuel {}/{}{}{}",
                    revision,
                    user_data.current_planet_id,
                    ship.cargo_used(),
                    ship.cargo_capacity,
                    ship.fuel,
                    ship.max_fuel,
                    if state.is_traveling { " | traveling" } else { "" },
                    if state.is_trading { " | trading" } else { "" },
                );
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Commodity, Coordinates, Planet, PlanetMarketListing, ShipState};
    use chrono::Utc;

    fn commodity(id: &str) -> Commodity {
        Commodity {
            id: id.into(),
            name: id.into(),
            description: String::new(),
            base_value: None,
        }
    }

    fn market_catalog() -> Catalog {
        Catalog {
            planets: vec![Planet {
                id: "terra-prime".into(),
                name: "Terra Prime".into(),
                description: String::new(),
                coordinates: Coordinates { x: 100.0, y: 100.0 },
                market_listings: vec![
                    PlanetMarketListing {
                        commodity_id: "water".into(),
                        buy_price: Some(10),
                        sell_price: Some(8),
                        stock: None,
                        demand_factor: None,
                    },
                    PlanetMarketListing {
                        commodity_id: "relics".into(),
                        buy_price: None,
                        sell_price: None,
                        stock: None,
                        demand_factor: None,
                    },
                    PlanetMarketListing {
                        commodity_id: "tech".into(),
                        buy_price: Some(40),
                        sell_price: None,
                        stock: None,
                        demand_factor: None,
                    },
                ],
                fuel_price: 5,
            }],
            commodities: vec![commodity("water"), commodity("relics"), commodity("tech")],
            blueprint_definitions: vec![],
            loaded_at: Utc::now(),
        }
    }

    #[test]
    fn test_sell_price_resolved_from_listing() {
        let catalog = market_catalog();
        assert_eq!(
            sell_unit_price(&catalog, "terra-prime", "water").unwrap(),
            8
        );
    }

    #[test]
    fn test_sell_rejected_for_unsellable_listings() {
        let catalog = market_catalog();

        // Listed but not traded at all
        let err = sell_unit_price(&catalog, "terra-prime", "relics").unwrap_err();
        assert!(err.to_string().contains("not traded"));

        // Traded, but the planet only sells it
        let err = sell_unit_price(&catalog, "terra-prime", "tech").unwrap_err();
        assert!(err.to_string().contains("does not buy"));

        assert!(sell_unit_price(&catalog, "terra-prime", "phantom").is_err());
        assert!(sell_unit_price(&catalog, "ghost-planet", "water").is_err());
    }

    #[test]
    fn test_unknown_start_planet_resets_to_first() {
        let catalog = market_catalog();
        let mut user_data = UserData {
            civic_user_id: "user-1".into(),
            sol_wallet_address: "wallet-1".into(),
            current_planet_id: "decommissioned-hub".into(),
            ship: ShipState::stock("Stardust Hopper MkI"),
            has_claimed_initial_credits: true,
            last_saved: 0,
        };

        assert!(normalize_start_planet(&catalog, &mut user_data));
        assert_eq!(user_data.current_planet_id, "terra-prime");

        // Known planet: untouched
        assert!(!normalize_start_planet(&catalog, &mut user_data));
    }
}
