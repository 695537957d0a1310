//! Fee-burn events realized by a liquidity pool.

use alloy::primitives::U256;
use serde::{Deserialize, Serialize};

/// One fee-burn event: the two fee amounts a pool realized into its reserves at a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeEvent {
    /// Block the event was emitted in.
    pub block_number: u64,
    /// Position of the log within its block.
    pub log_index: u64,
    /// Fees in token0 smallest units.
    pub fees0: U256,
    /// Fees in token1 smallest units.
    pub fees1: U256,
}

impl FeeEvent {
    pub fn new(block_number: u64, log_index: u64, fees0: U256, fees1: U256) -> Self {
        Self {
            block_number,
            log_index,
            fees0,
            fees1,
        }
    }
}

/// Ordered slice of events processed as one unit of concurrency.
pub type EventChunk = Vec<FeeEvent>;

/// Split `events` into chunks of at most `chunk_size`, preserving order.
///
/// A `chunk_size` of zero is treated as one.
pub fn partition(events: &[FeeEvent], chunk_size: usize) -> Vec<EventChunk> {
    events
        .chunks(chunk_size.max(1))
        .map(|chunk| chunk.to_vec())
        .collect()
}
