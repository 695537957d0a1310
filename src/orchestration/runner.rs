use crate::chain::{ChainReadError, ChainReader};
use crate::config::Config;
use crate::domain::{AttributionResult, BlockRange, PoolStake, StakeSnapshotPolicy};
use crate::engine::{
    parse_window, AttributionError, FeeAttributionEngine, ResolveError, StakeSnapshotProvider,
    TimeToBlockResolver, WorkerPool,
};
use crate::orchestration::discover_stakes;
use crate::pricing::{PriceCache, PriceSource};
use crate::report::{FailedPool, ReportAggregator, ReportHeader, RewardsReport};
use futures::future::join_all;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

/// Errors that abort a whole run. Per-pool failures are recorded in the report instead.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error("stake discovery failed: {0}")]
    Discovery(ChainReadError),
}

/// Drives one rewards computation for the configured wallet and window.
#[derive(Debug, Clone)]
pub struct FeeShareRunner {
    reader: Arc<dyn ChainReader>,
    prices: Arc<dyn PriceSource>,
    config: Config,
}

impl FeeShareRunner {
    pub fn new(reader: Arc<dyn ChainReader>, prices: Arc<dyn PriceSource>, config: Config) -> Self {
        Self {
            reader,
            prices,
            config,
        }
    }

    pub async fn run(&self) -> Result<RewardsReport, RunError> {
        let config = &self.config;

        let window = parse_window(&config.start_datetime, &config.end_datetime)?;
        let range = TimeToBlockResolver::new(self.reader.clone(), config.block_interval_secs)
            .resolve(&window)
            .await?;

        let stakes = StakeSnapshotProvider::new(self.reader.clone(), config.registry_address);
        let pools = discover_stakes(&stakes, config.user_address, config.max_concurrency)
            .await
            .map_err(RunError::Discovery)?;

        let engine = FeeAttributionEngine::new(
            self.reader.clone(),
            stakes,
            config.user_address,
            WorkerPool::new(config.max_concurrency),
        )
        .with_chunk_size(config.chunk_size);

        let outcomes = self.attribute_all(&engine, &pools, range).await;

        let mut aggregator =
            ReportAggregator::new(self.reader.clone(), PriceCache::new(self.prices.clone()));
        let mut rows = Vec::with_capacity(pools.len());
        let mut failed = Vec::new();

        for (stake, outcome) in pools.iter().zip(outcomes) {
            let row = match outcome {
                Ok(result) => aggregator
                    .pool_report(stake, &result)
                    .await
                    .map_err(|e| e.to_string()),
                Err(e) => Err(e.to_string()),
            };
            match row {
                Ok(row) => rows.push(row),
                Err(message) => {
                    error!(
                        pid = %stake.pool_id,
                        lp = %stake.lp_contract_address,
                        error = %message,
                        "Pool failed"
                    );
                    failed.push(FailedPool {
                        pid: stake.pool_id.to_string(),
                        lp_address: stake.lp_contract_address,
                        error: message,
                    });
                }
            }
        }

        let header = ReportHeader {
            start_date: config.start_datetime.clone(),
            end_date: config.end_datetime.clone(),
            wallet_address: config.user_address,
            masterchef_address: config.registry_address,
        };
        let report = RewardsReport::new(header, rows, failed);
        info!(
            pools_reported = report.totals.pools_reported,
            pools_failed = report.totals.pools_failed,
            total_usd = %report.totals.total_usd.round_dp(2),
            "Rewards computed"
        );
        Ok(report)
    }

    /// Attribute every pool concurrently; each outcome is independent of the others.
    async fn attribute_all(
        &self,
        engine: &FeeAttributionEngine,
        pools: &[PoolStake],
        range: BlockRange,
    ) -> Vec<Result<AttributionResult, AttributionError>> {
        let historical = self.config.historical_balances;
        join_all(pools.iter().map(|stake| {
            let policy = StakeSnapshotPolicy::for_stake(stake, historical);
            engine.attribute(stake, range, policy)
        }))
        .await
    }
}
