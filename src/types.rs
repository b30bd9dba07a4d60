use serde::{Deserialize, Serialize};

/// Cargo capacity of a stock ship before blueprint bonuses.
pub const BASE_CARGO_CAPACITY: u32 = 20;
/// Fuel tank size of a stock ship before blueprint bonuses.
pub const BASE_MAX_FUEL: u64 = 100;
/// One unit of fuel moves the ship this many map units.
pub const FUEL_UNITS_PER_DISTANCE: f64 = 10.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Commodity {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_value: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub x: f64,
    pub y: f64,
}

impl Coordinates {
    pub fn distance_to(&self, other: &Coordinates) -> f64 {
        ((other.x - self.x).powi(2) + (other.y - self.y).powi(2)).sqrt()
    }
}

/// One market entry on a planet. A listing with neither price means the
/// commodity is known here but not traded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanetMarketListing {
    pub commodity_id: String,
    /// Price the planet sells TO the player.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buy_price: Option<u64>,
    /// Price the planet pays the player.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sell_price: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub demand_factor: Option<f64>,
}

impl PlanetMarketListing {
    pub fn is_traded(&self) -> bool {
        self.buy_price.is_some() || self.sell_price.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Planet {
    pub id: String,
    pub name: String,
    pub description: String,
    pub coordinates: Coordinates,
    pub market_listings: Vec<PlanetMarketListing>,
    /// Price per unit of fuel at this planet's refuel station.
    pub fuel_price: u64,
}

impl Planet {
    pub fn listing(&self, commodity_id: &str) -> Option<&PlanetMarketListing> {
        self.market_listings
            .iter()
            .find(|l| l.commodity_id == commodity_id)
    }

    /// Fuel needed to travel from this planet to `other`.
    pub fn fuel_cost_to(&self, other: &Planet) -> u64 {
        let distance = self.coordinates.distance_to(&other.coordinates);
        (distance / FUEL_UNITS_PER_DISTANCE).ceil() as u64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlueprintEffectType {
    IncreaseCargoCapacity,
    IncreaseMaxFuel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlueprintEffect {
    #[serde(rename = "type")]
    pub effect_type: BlueprintEffectType,
    pub value: u32,
}

/// Immutable catalog entry describing a mintable blueprint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlueprintDefinition {
    pub id: String,
    pub name: String,
    pub description: String,
    pub tier: u32,
    pub image_url: String,
    pub metadata_uri: String,
    pub effects: Vec<BlueprintEffect>,
}

/// Game attributes decoded from an owned NFT's metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedBlueprintAttributes {
    pub blueprint_id: String,
    pub effect_type: BlueprintEffectType,
    pub effect_value: u32,
    pub tier: u32,
    pub description: String,
}

/// An owned blueprint as seen in the latest ownership snapshot. Not
/// authoritative: rebuilt from ledger metadata on every refresh, identified
/// only by its mint address.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedBlueprint {
    pub mint_address: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub nft_description: String,
    pub parsed_attributes: ParsedBlueprintAttributes,
}

/// One `{commodity, quantity}` entry in the cargo hold. Unique per
/// commodity; zero-quantity lines are pruned rather than kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CargoLine {
    pub commodity_id: String,
    pub quantity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipState {
    pub name: String,
    /// Derived: BASE_CARGO_CAPACITY + owned blueprint bonuses.
    pub cargo_capacity: u32,
    pub current_cargo: Vec<CargoLine>,
    pub fuel: u64,
    /// Derived: BASE_MAX_FUEL + owned blueprint bonuses.
    pub max_fuel: u64,
}

impl ShipState {
    /// A stock ship with base stats and an empty hold.
    pub fn stock(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cargo_capacity: BASE_CARGO_CAPACITY,
            current_cargo: vec![],
            fuel: BASE_MAX_FUEL,
            max_fuel: BASE_MAX_FUEL,
        }
    }

    pub fn cargo_used(&self) -> u32 {
        // Line quantities come off the wire; saturate rather than wrap
        self.current_cargo
            .iter()
            .fold(0u32, |used, line| used.saturating_add(line.quantity))
    }

    pub fn cargo_quantity(&self, commodity_id: &str) -> u32 {
        self.current_cargo
            .iter()
            .find(|line| line.commodity_id == commodity_id)
            .map(|line| line.quantity)
            .unwrap_or(0)
    }
}

/// The persisted per-account player record. The remote copy is the source
/// of truth; the store holds a cached copy and saves merge over the last
/// fetched snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    pub civic_user_id: String,
    pub sol_wallet_address: String,
    pub current_planet_id: String,
    pub ship: ShipState,
    pub has_claimed_initial_credits: bool,
    /// Unix timestamp in milliseconds, set by the server on save.
    pub last_saved: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fuel_cost_between_planets() {
        let terra = planet_at("terra-prime", 100.0, 100.0);
        let mars = planet_at("mars-colony", 250.0, 150.0);

        // sqrt(150^2 + 50^2) ~= 158.11 -> ceil(15.81) = 16
        assert_eq!(terra.fuel_cost_to(&mars), 16);
        assert_eq!(mars.fuel_cost_to(&terra), 16);
        assert_eq!(terra.fuel_cost_to(&terra), 0);
    }

    #[test]
    fn test_cargo_helpers() {
        let mut ship = ShipState::stock("Stardust Hopper MkI");
        assert_eq!(ship.cargo_used(), 0);

        ship.current_cargo = vec![
            CargoLine { commodity_id: "ore".into(), quantity: 3 },
            CargoLine { commodity_id: "water".into(), quantity: 5 },
        ];
        assert_eq!(ship.cargo_used(), 8);
        assert_eq!(ship.cargo_quantity("ore"), 3);
        assert_eq!(ship.cargo_quantity("tech"), 0);
    }

    #[test]
    fn test_cargo_used_saturates_on_corrupt_records() {
        let mut ship = ShipState::stock("Stardust Hopper MkI");
        ship.current_cargo = vec![
            CargoLine { commodity_id: "ore".into(), quantity: u32::MAX },
            CargoLine { commodity_id: "water".into(), quantity: u32::MAX },
        ];
        assert_eq!(ship.cargo_used(), u32::MAX);
    }

    #[test]
    fn test_effect_type_wire_format() {
        let json = serde_json::to_string(&BlueprintEffectType::IncreaseCargoCapacity).unwrap();
        assert_eq!(json, "\"INCREASE_CARGO_CAPACITY\"");

        let parsed: BlueprintEffectType = serde_json::from_str("\"INCREASE_MAX_FUEL\"").unwrap();
        assert_eq!(parsed, BlueprintEffectType::IncreaseMaxFuel);
    }

    #[test]
    fn test_untraded_listing() {
        let listing = PlanetMarketListing {
            commodity_id: "tech".into(),
            buy_price: None,
            sell_price: None,
            stock: None,
            demand_factor: None,
        };
        assert!(!listing.is_traded());
    }

    fn planet_at(id: &str, x: f64, y: f64) -> Planet {
        Planet {
            id: id.into(),
            name: id.into(),
            description: String::new(),
            coordinates: Coordinates { x, y },
            market_listings: vec![],
            fuel_price: 5,
        }
    }
}
