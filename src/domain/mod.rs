//! Domain types for fee attribution.
//!
//! This module provides:
//! - Chain-facing primitives: BlockTag, BlockRange, TimeWindow, PoolId
//! - Exact fixed-point fee amounts (`FeeAmount`) and a price `Decimal`
//! - Fee events, stake positions and per-pool attribution results

pub mod amount;
pub mod attribution;
pub mod decimal;
pub mod fee_event;
pub mod primitives;
pub mod stake;

pub use amount::FeeAmount;
pub use attribution::{AttributionResult, ChunkTotals};
pub use decimal::Decimal;
pub use fee_event::{partition, EventChunk, FeeEvent};
pub use primitives::{BlockRange, BlockTag, PoolId, TimeWindow, UnixSecs, WindowBound};
pub use stake::{PoolStake, StakeSnapshotPolicy};
