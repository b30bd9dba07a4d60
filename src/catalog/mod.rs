mod client;

pub use client::CatalogClient;

use chrono::{DateTime, Utc};

use crate::types::{BlueprintDefinition, Commodity, Planet};

/// Immutable game definitions, fetched once per session and never mutated
/// afterwards.
#[derive(Debug, Clone)]
pub struct Catalog {
    pub planets: Vec<Planet>,
    pub commodities: Vec<Commodity>,
    pub blueprint_definitions: Vec<BlueprintDefinition>,
    pub loaded_at: DateTime<Utc>,
}

impl Catalog {
    pub fn planet(&self, id: &str) -> Option<&Planet> {
        self.planets.iter().find(|p| p.id == id)
    }

    pub fn commodity(&self, id: &str) -> Option<&Commodity> {
        self.commodities.iter().find(|c| c.id == id)
    }

    pub fn blueprint_definition(&self, id: &str) -> Option<&BlueprintDefinition> {
        self.blueprint_definitions.iter().find(|b| b.id == id)
    }

    /// The default starting planet for new player records.
    pub fn first_planet(&self) -> Option<&Planet> {
        self.planets.first()
    }
}
