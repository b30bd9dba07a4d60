mod client;
mod parser;

pub use client::LedgerClient;
pub use parser::{parse_blueprint, ParseRejection, RawAsset, RawAssetAttribute};
