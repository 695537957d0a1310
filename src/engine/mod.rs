//! Fee attribution engine and the pieces it is built from.
//!
//! - `resolver`: wall-clock window to block range
//! - `snapshot`: stake reads from the registry
//! - `workers`: the bounded pool shared by every chunk task of a run
//! - `attribution`: chunked concurrent attribution of fee events
//! - `lp_equivalent`: fees expressed in LP tokens

pub mod attribution;
pub mod lp_equivalent;
pub mod resolver;
pub mod snapshot;
pub mod workers;

pub use attribution::{AttributionError, FeeAttributionEngine, DEFAULT_CHUNK_SIZE};
pub use lp_equivalent::{lp_equivalent, lp_equivalent_from_reserves};
pub use resolver::{
    approximate_block, parse_timestamp, parse_window, parse_window_bound, ResolveError,
    TimeToBlockResolver, DEFAULT_BLOCK_INTERVAL_SECS,
};
pub use snapshot::StakeSnapshotProvider;
pub use workers::{WorkerPool, DEFAULT_MAX_CONCURRENCY};
