//! Per-pool attribution result.

use crate::domain::{BlockRange, FeeAmount};
use serde::Serialize;

/// Fees attributed to the user for one pool over one block range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributionResult {
    /// User share of token0 fees, raw units.
    pub user_fees0: FeeAmount,
    /// User share of token1 fees, raw units.
    pub user_fees1: FeeAmount,
    /// Block range actually scanned.
    pub range: BlockRange,
    /// Number of fee events in the range.
    pub events_scanned: usize,
    /// Number of chunks the events were processed in.
    pub chunks: usize,
}

impl AttributionResult {
    /// Empty accumulator for `range`.
    pub fn empty(range: BlockRange) -> Self {
        AttributionResult {
            user_fees0: FeeAmount::ZERO,
            user_fees1: FeeAmount::ZERO,
            range,
            events_scanned: 0,
            chunks: 0,
        }
    }
}

/// Running totals of one chunk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChunkTotals {
    pub fees0: FeeAmount,
    pub fees1: FeeAmount,
    pub events: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BlockTag;
    use alloy::primitives::U256;

    #[test]
    fn test_empty_result() {
        let result = AttributionResult::empty(BlockRange::new(5, BlockTag::Latest));
        assert!(result.user_fees0.is_zero());
        assert!(result.user_fees1.is_zero());
        assert_eq!(result.events_scanned, 0);
    }

    #[test]
    fn test_result_serialization() {
        let mut result = AttributionResult::empty(BlockRange::new(5, BlockTag::Number(9)));
        result.user_fees0 = FeeAmount::from_raw(U256::from(55));
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["user_fees0"], "55");
        assert_eq!(json["user_fees1"], "0");
        assert_eq!(json["range"]["start_block"], 5);
    }
}
