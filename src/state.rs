use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, watch, RwLock};
use tracing::{info, warn};

use crate::catalog::Catalog;
use crate::types::{
    BlueprintEffectType, CargoLine, ProcessedBlueprint, UserData, BASE_CARGO_CAPACITY,
    BASE_MAX_FUEL,
};

/// Mutable per-session state guarded by the store.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    /// Cached copy of the persisted player record. `None` until loaded.
    pub user_data: Option<UserData>,
    /// Latest ownership snapshot; replaced wholesale on each refresh.
    pub owned_blueprints: Vec<ProcessedBlueprint>,
    /// Last ownership refresh error, if any. A failed refresh keeps the
    /// previous (possibly stale) snapshot.
    pub blueprints_error: Option<String>,
    pub is_traveling: bool,
    pub is_trading: bool,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateError {
    #[error("no player record loaded")]
    NoUserData,
    #[error("not enough cargo space: {used}/{capacity} units used, {requested} requested")]
    InsufficientCargoSpace { used: u32, capacity: u32, requested: u32 },
    #[error("not enough {commodity_id} in cargo: have {held}, requested {requested}")]
    InsufficientCargo { commodity_id: String, held: u32, requested: u32 },
}

/// Advisory result of a buy affordability check. No side effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeCheck {
    pub can_afford: bool,
    pub has_space: bool,
    pub reason: Option<String>,
}

impl TradeCheck {
    pub fn ok(&self) -> bool {
        self.can_afford && self.has_space
    }

    fn fail_closed(reason: &str) -> Self {
        Self {
            can_afford: false,
            has_space: false,
            reason: Some(reason.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefuelOutcome {
    pub success: bool,
    pub new_fuel: u64,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TravelOutcome {
    Arrived { planet_id: String, fuel_spent: u64 },
    AlreadyTraveling,
    AlreadyThere,
    UnknownPlanet,
    NotReady,
    InsufficientFuel { needed: u64, available: u64 },
}

/// In-memory authority over the player session: decides whether an action
/// can happen, applies it, and enqueues a save after every mutation.
///
/// Saves are optimistic fire-and-forget: the snapshot goes onto the pending
/// write queue and the sync loop owns delivery and retries. Local state is
/// never rolled back on a failed save.
pub struct GameStore {
    catalog: Arc<Catalog>,
    state: Arc<RwLock<SessionState>>,
    persist_tx: mpsc::UnboundedSender<UserData>,
    revision: watch::Sender<u64>,
    blueprints_in_flight: AtomicBool,
    travel_delay: Duration,
}

impl GameStore {
    pub fn new(
        catalog: Arc<Catalog>,
        persist_tx: mpsc::UnboundedSender<UserData>,
        travel_delay: Duration,
    ) -> Self {
        let (revision, _) = watch::channel(0u64);
        Self {
            catalog,
            state: Arc::new(RwLock::new(SessionState::default())),
            persist_tx,
            revision,
            blueprints_in_flight: AtomicBool::new(false),
            travel_delay,
        }
    }

    /// Observer channel: the value bumps on every state change; subscribers
    /// call `snapshot()` when it does.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    pub async fn snapshot(&self) -> SessionState {
        self.state.read().await.clone()
    }

    pub async fn user_data(&self) -> Option<UserData> {
        self.state.read().await.user_data.clone()
    }

    pub async fn set_user_data(&self, user_data: UserData) {
        {
            let mut state = self.state.write().await;
            state.user_data = Some(user_data);
        }
        self.touch();
    }

    /// UI-level busy flag around buy/sell calls. Not a correctness
    /// mechanism.
    pub async fn set_is_trading(&self, is_trading: bool) {
        {
            let mut state = self.state.write().await;
            state.is_trading = is_trading;
        }
        self.touch();
    }

    /// Affordability and capacity check for a buy. Total, no side effects;
    /// fails closed when no player record is loaded.
    pub async fn can_buy_commodity(
        &self,
        commodity_id: &str,
        quantity: u32,
        price: u64,
        available_credits: u64,
    ) -> TradeCheck {
        let state = self.state.read().await;
        let Some(user_data) = &state.user_data else {
            return TradeCheck::fail_closed("Ship state not loaded");
        };
        let ship = &user_data.ship;

        // Overflowing totals fail closed rather than wrapping past the check
        let Some(total_cost) = (quantity as u64).checked_mul(price) else {
            return TradeCheck::fail_closed("Order total exceeds the credit ledger");
        };
        let can_afford = available_credits >= total_cost;
        let has_space = ship
            .cargo_used()
            .checked_add(quantity)
            .map_or(false, |total| total <= ship.cargo_capacity);

        let mut reasons = Vec::new();
        if !can_afford {
            reasons.push(format!(
                "Insufficient credits: need {} GC, have {} GC",
                total_cost, available_credits
            ));
        }
        if !has_space {
            reasons.push(format!(
                "Not enough cargo space for {} {}: {}/{} units used",
                quantity,
                commodity_id,
                ship.cargo_used(),
                ship.cargo_capacity
            ));
        }

        TradeCheck {
            can_afford,
            has_space,
            reason: if reasons.is_empty() { None } else { Some(reasons.join("; ")) },
        }
    }

    /// Add purchased units to the hold. Re-validates capacity instead of
    /// trusting that the caller ran `can_buy_commodity` first.
    pub async fn update_cargo_on_buy(
        &self,
        commodity_id: &str,
        quantity: u32,
    ) -> Result<(), StateError> {
        let snapshot = {
            let mut state = self.state.write().await;
            let user_data = state.user_data.as_mut().ok_or(StateError::NoUserData)?;
            let ship = &mut user_data.ship;

            let used = ship.cargo_used();
            let fits = used
                .checked_add(quantity)
                .map_or(false, |total| total <= ship.cargo_capacity);
            if !fits {
                return Err(StateError::InsufficientCargoSpace {
                    used,
                    capacity: ship.cargo_capacity,
                    requested: quantity,
                });
            }

            match ship
                .current_cargo
                .iter_mut()
                .find(|line| line.commodity_id == commodity_id)
            {
                Some(line) => line.quantity += quantity,
                None => ship.current_cargo.push(CargoLine {
                    commodity_id: commodity_id.to_string(),
                    quantity,
                }),
            }

            user_data.clone()
        };

        self.queue_persist(snapshot);
        self.touch();
        Ok(())
    }

    /// True iff the hold has at least `quantity` units of the commodity.
    pub async fn can_sell_commodity(&self, commodity_id: &str, quantity: u32) -> bool {
        let state = self.state.read().await;
        state
            .user_data
            .as_ref()
            .map(|u| u.ship.cargo_quantity(commodity_id) >= quantity)
            .unwrap_or(false)
    }

    /// Remove sold units from the hold, pruning the line when it reaches
    /// zero. Re-validates holdings.
    pub async fn update_cargo_on_sell(
        &self,
        commodity_id: &str,
        quantity: u32,
    ) -> Result<(), StateError> {
        let snapshot = {
            let mut state = self.state.write().await;
            let user_data = state.user_data.as_mut().ok_or(StateError::NoUserData)?;
            let ship = &mut user_data.ship;

            let held = ship.cargo_quantity(commodity_id);
            if held < quantity {
                return Err(StateError::InsufficientCargo {
                    commodity_id: commodity_id.to_string(),
                    held,
                    requested: quantity,
                });
            }

            for line in ship.current_cargo.iter_mut() {
                if line.commodity_id == commodity_id {
                    line.quantity -= quantity;
                }
            }
            ship.current_cargo.retain(|line| line.quantity > 0);

            user_data.clone()
        };

        self.queue_persist(snapshot);
        self.touch();
        Ok(())
    }

    /// Move the ship to another planet. Computes the Euclidean fuel cost,
    /// holds the transient traveling flag across the transition delay, then
    /// commits location and fuel in one step.
    pub async fn travel_to_planet(&self, planet_id: &str) -> TravelOutcome {
        let fuel_needed = {
            let mut state = self.state.write().await;
            if state.is_traveling {
                return TravelOutcome::AlreadyTraveling;
            }
            let Some(user_data) = &state.user_data else {
                return TravelOutcome::NotReady;
            };
            if user_data.current_planet_id == planet_id {
                return TravelOutcome::AlreadyThere;
            }

            let (Some(current), Some(target)) = (
                self.catalog.planet(&user_data.current_planet_id),
                self.catalog.planet(planet_id),
            ) else {
                return TravelOutcome::UnknownPlanet;
            };

            let fuel_needed = current.fuel_cost_to(target);
            if user_data.ship.fuel < fuel_needed {
                return TravelOutcome::InsufficientFuel {
                    needed: fuel_needed,
                    available: user_data.ship.fuel,
                };
            }

            state.is_traveling = true;
            fuel_needed
        };
        self.touch();

        tokio::time::sleep(self.travel_delay).await;

        let snapshot = {
            let mut state = self.state.write().await;
            state.is_traveling = false;
            let Some(user_data) = state.user_data.as_mut() else {
                return TravelOutcome::NotReady;
            };
            user_data.current_planet_id = planet_id.to_string();
            user_data.ship.fuel = user_data.ship.fuel.saturating_sub(fuel_needed);
            user_data.clone()
        };

        info!(
            "Arrived at {} ({} fuel spent, {} remaining)",
            planet_id, fuel_needed, snapshot.ship.fuel
        );

        self.queue_persist(snapshot);
        self.touch();
        TravelOutcome::Arrived {
            planet_id: planet_id.to_string(),
            fuel_spent: fuel_needed,
        }
    }

    /// Add fuel, clamped to the tank size. Never overfills.
    pub async fn refuel_ship(
        &self,
        amount: u64,
        cost: u64,
        available_credits: u64,
    ) -> RefuelOutcome {
        let (outcome, snapshot) = {
            let mut state = self.state.write().await;
            let Some(user_data) = state.user_data.as_mut() else {
                return RefuelOutcome {
                    success: false,
                    new_fuel: 0,
                    reason: Some("Ship state not loaded".to_string()),
                };
            };
            let ship = &mut user_data.ship;

            if available_credits < cost {
                return RefuelOutcome {
                    success: false,
                    new_fuel: ship.fuel,
                    reason: Some("Insufficient credits".to_string()),
                };
            }
            if ship.fuel >= ship.max_fuel {
                return RefuelOutcome {
                    success: false,
                    new_fuel: ship.fuel,
                    reason: Some("Fuel tank is already full".to_string()),
                };
            }

            ship.fuel = (ship.fuel + amount).min(ship.max_fuel);
            let outcome = RefuelOutcome {
                success: true,
                new_fuel: ship.fuel,
                reason: None,
            };
            (outcome, user_data.clone())
        };

        self.queue_persist(snapshot);
        self.touch();
        outcome
    }

    /// Recompute derived ship stats from the current ownership snapshot:
    /// BASE + sum of owned blueprint effects. Fuel is clamped down when the
    /// tank shrinks below it. Writes (and persists) only when the computed
    /// values differ. Returns whether anything changed.
    pub async fn apply_blueprint_effects_to_ship(&self) -> bool {
        let snapshot = {
            let mut state = self.state.write().await;

            let mut cargo_bonus: u32 = 0;
            let mut fuel_bonus: u64 = 0;
            // Effect values come from ledger metadata; saturate, never wrap
            for blueprint in &state.owned_blueprints {
                let attrs = &blueprint.parsed_attributes;
                match attrs.effect_type {
                    BlueprintEffectType::IncreaseCargoCapacity => {
                        cargo_bonus = cargo_bonus.saturating_add(attrs.effect_value);
                    }
                    BlueprintEffectType::IncreaseMaxFuel => {
                        fuel_bonus = fuel_bonus.saturating_add(attrs.effect_value as u64);
                    }
                }
            }
            let new_capacity = BASE_CARGO_CAPACITY.saturating_add(cargo_bonus);
            let new_max_fuel = BASE_MAX_FUEL.saturating_add(fuel_bonus);

            let Some(user_data) = state.user_data.as_mut() else {
                return false;
            };
            let ship = &mut user_data.ship;

            if ship.cargo_capacity == new_capacity && ship.max_fuel == new_max_fuel {
                return false;
            }

            info!(
                "Ship stats recomputed: cargo capacity {} -> {}, max fuel {} -> {}",
                ship.cargo_capacity, new_capacity, ship.max_fuel, new_max_fuel
            );

            ship.cargo_capacity = new_capacity;
            ship.max_fuel = new_max_fuel;
            if ship.fuel > ship.max_fuel {
                ship.fuel = ship.max_fuel;
            }

            user_data.clone()
        };

        self.queue_persist(snapshot);
        self.touch();
        true
    }

    /// Claim the in-flight slot for an ownership refresh. At most one fetch
    /// may be outstanding; a false return means skip this refresh entirely.
    pub fn begin_blueprint_refresh(&self) -> bool {
        self.blueprints_in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Complete an ownership refresh started with `begin_blueprint_refresh`.
    /// Success replaces the whole snapshot and reapplies effects; failure
    /// records the error and keeps the previous snapshot.
    pub async fn finish_blueprint_refresh(
        &self,
        result: Result<Vec<ProcessedBlueprint>, String>,
    ) {
        match result {
            Ok(blueprints) => {
                for blueprint in &blueprints {
                    let id = &blueprint.parsed_attributes.blueprint_id;
                    if self.catalog.blueprint_definition(id).is_none() {
                        warn!(
                            "Owned blueprint {} references unknown definition {}",
                            blueprint.mint_address, id
                        );
                    }
                }
                {
                    let mut state = self.state.write().await;
                    info!(
                        "Ownership snapshot replaced: {} blueprint(s)",
                        blueprints.len()
                    );
                    state.owned_blueprints = blueprints;
                    state.blueprints_error = None;
                }
                self.apply_blueprint_effects_to_ship().await;
            }
            Err(message) => {
                warn!("Blueprint refresh failed: {}", message);
                let mut state = self.state.write().await;
                state.blueprints_error = Some(message);
            }
        }
        self.blueprints_in_flight.store(false, Ordering::SeqCst);
        self.touch();
    }

    /// Record a successful initial-credits claim on the cached record.
    pub async fn mark_credits_claimed(&self) {
        let snapshot = {
            let mut state = self.state.write().await;
            let Some(user_data) = state.user_data.as_mut() else {
                return;
            };
            if user_data.has_claimed_initial_credits {
                return;
            }
            user_data.has_claimed_initial_credits = true;
            user_data.clone()
        };

        self.queue_persist(snapshot);
        self.touch();
    }

    fn queue_persist(&self, snapshot: UserData) {
        if self.persist_tx.send(snapshot).is_err() {
            warn!("Pending-write queue closed; dropping save request");
        }
    }

    fn touch(&self) {
        self.revision.send_modify(|r| *r += 1);
    }
}
