mod record;
mod trade;

pub use record::{LoadedRecord, PlayerRecordGateway};
pub use trade::{ClaimOutcome, MintOutcome, SellReceipt, TradeClient};
