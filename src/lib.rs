pub mod chain;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod orchestration;
pub mod pricing;
pub mod report;

pub use chain::{ChainReadError, ChainReader, MockChainReader, RpcChainReader};
pub use config::Config;
pub use domain::{
    AttributionResult, BlockRange, BlockTag, Decimal, FeeAmount, FeeEvent, PoolId, PoolStake,
    StakeSnapshotPolicy, TimeWindow,
};
pub use engine::{FeeAttributionEngine, StakeSnapshotProvider, TimeToBlockResolver, WorkerPool};
pub use error::AppError;
pub use orchestration::{FeeShareRunner, RunError};
pub use pricing::{HttpPriceSource, PriceCache, PriceSource, StaticPriceSource};
pub use report::{write_report, RewardsReport};
