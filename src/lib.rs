//! Headless client for the AstroTrader space-trading game.
//!
//! The crate owns the client-authoritative game session: the immutable
//! catalog, the cached player record, the trade/travel/refuel reducer, and
//! the blueprint-derived ship stats. Blockchain transfers, wallet keys, and
//! NFT metadata live behind narrow HTTP clients and stay opaque here.

pub mod blueprint_sync;
pub mod catalog;
pub mod config;
pub mod daemon;
pub mod gateway;
pub mod ownership;
pub mod state;
pub mod sync;
pub mod types;
