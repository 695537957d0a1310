//! Fee attribution: apportion every fee-burn event in a block range to the user.
//!
//! Events are fetched in one bulk read, split into fixed-size chunks and processed on the
//! shared worker pool. Each chunk keeps its own running totals; the totals are reduced on
//! the calling task once every chunk has reported. A failed chunk aborts its siblings and
//! the whole pool, so a partial sum is never returned.

use super::snapshot::StakeSnapshotProvider;
use super::workers::WorkerPool;
use crate::chain::{decode_fee_event, zero_burn_topic, ChainReadError, ChainReader};
use crate::domain::{
    partition, AttributionResult, BlockRange, BlockTag, ChunkTotals, FeeAmount, FeeEvent,
    PoolId, PoolStake, StakeSnapshotPolicy,
};
use alloy::primitives::Address;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Maximum fee events per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 32;

#[derive(Debug, Error)]
pub enum AttributionError {
    #[error("chain read failed: {0}")]
    ChainRead(#[from] ChainReadError),
    #[error("incomplete attribution: {completed} of {dispatched} chunks completed")]
    IncompleteAttribution { dispatched: usize, completed: usize },
    #[error("fee arithmetic overflow: {0}")]
    Overflow(String),
    #[error("worker pool closed")]
    WorkerPoolClosed,
}

/// Owned inputs of one chunk task.
#[derive(Debug, Clone)]
struct ChunkContext {
    reader: Arc<dyn ChainReader>,
    stakes: StakeSnapshotProvider,
    user: Address,
    pool: PoolId,
    lp_token: Address,
    policy: StakeSnapshotPolicy,
}

impl ChunkContext {
    async fn process(&self, chunk: &[FeeEvent]) -> Result<ChunkTotals, AttributionError> {
        let mut totals = ChunkTotals::default();

        for event in chunk {
            let stake = self
                .stakes
                .stake_at_event(self.policy, self.pool, self.user, event.block_number)
                .await?;
            let supply = self
                .reader
                .total_supply(self.lp_token, BlockTag::Number(event.block_number))
                .await?;

            let share0 = FeeAmount::share_of(event.fees0, stake, supply)
                .ok_or_else(|| overflow_at(event))?;
            let share1 = FeeAmount::share_of(event.fees1, stake, supply)
                .ok_or_else(|| overflow_at(event))?;

            totals.fees0 = totals.fees0.checked_add(share0).ok_or_else(|| overflow_at(event))?;
            totals.fees1 = totals.fees1.checked_add(share1).ok_or_else(|| overflow_at(event))?;
            totals.events += 1;

            debug!(
                block = event.block_number,
                %stake,
                %supply,
                share0 = %share0,
                share1 = %share1,
                "Attributed fee event"
            );
        }

        Ok(totals)
    }
}

fn overflow_at(event: &FeeEvent) -> AttributionError {
    AttributionError::Overflow(format!("fee event at block {}", event.block_number))
}

/// Apportions a pool's fee-burn events to one user.
#[derive(Debug, Clone)]
pub struct FeeAttributionEngine {
    reader: Arc<dyn ChainReader>,
    stakes: StakeSnapshotProvider,
    user: Address,
    workers: WorkerPool,
    chunk_size: usize,
}

impl FeeAttributionEngine {
    pub fn new(
        reader: Arc<dyn ChainReader>,
        stakes: StakeSnapshotProvider,
        user: Address,
        workers: WorkerPool,
    ) -> Self {
        Self {
            reader,
            stakes,
            user,
            workers,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Override the number of events per chunk. Totals do not depend on it.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Fee-burn events of `lp_token` within `range`, in chain order.
    pub async fn fetch_fee_events(
        &self,
        lp_token: Address,
        range: &BlockRange,
    ) -> Result<Vec<FeeEvent>, ChainReadError> {
        let logs = self
            .reader
            .logs(lp_token, zero_burn_topic(), range.start_block, range.end_block)
            .await?;
        logs.iter().map(decode_fee_event).collect()
    }

    /// Attribute `pool_stake`'s share of every fee event in `range`.
    pub async fn attribute(
        &self,
        pool_stake: &PoolStake,
        range: BlockRange,
        policy: StakeSnapshotPolicy,
    ) -> Result<AttributionResult, AttributionError> {
        let events = self
            .fetch_fee_events(pool_stake.lp_contract_address, &range)
            .await?;
        let chunks = partition(&events, self.chunk_size);
        let dispatched = chunks.len();

        info!(
            pool = %pool_stake.pool_id,
            lp = %pool_stake.lp_contract_address,
            %range,
            events = events.len(),
            chunks = dispatched,
            "Fee events to scan"
        );

        let context = ChunkContext {
            reader: self.reader.clone(),
            stakes: self.stakes.clone(),
            user: self.user,
            pool: pool_stake.pool_id,
            lp_token: pool_stake.lp_contract_address,
            policy,
        };

        let mut tasks = JoinSet::new();
        for chunk in chunks {
            let context = context.clone();
            let workers = self.workers.clone();
            tasks.spawn(async move {
                let _permit = workers
                    .acquire()
                    .await
                    .map_err(|_| AttributionError::WorkerPoolClosed)?;
                context.process(&chunk).await
            });
        }

        let mut result = AttributionResult::empty(range);
        result.chunks = dispatched;
        let mut completed = 0;

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(totals)) => {
                    completed += 1;
                    result.user_fees0 = result
                        .user_fees0
                        .checked_add(totals.fees0)
                        .ok_or_else(|| AttributionError::Overflow("token0 total".to_string()))?;
                    result.user_fees1 = result
                        .user_fees1
                        .checked_add(totals.fees1)
                        .ok_or_else(|| AttributionError::Overflow("token1 total".to_string()))?;
                    result.events_scanned += totals.events;
                }
                Ok(Err(e)) => {
                    tasks.abort_all();
                    warn!(pool = %pool_stake.pool_id, error = %e, "Chunk failed, abandoning pool");
                    return Err(e);
                }
                Err(e) => {
                    tasks.abort_all();
                    error!(pool = %pool_stake.pool_id, error = %e, "Chunk task did not complete");
                    break;
                }
            }
        }

        if completed != dispatched {
            return Err(AttributionError::IncompleteAttribution {
                dispatched,
                completed,
            });
        }

        info!(
            pool = %pool_stake.pool_id,
            user_fees0 = %result.user_fees0,
            user_fees1 = %result.user_fees1,
            "Attributed pool fees"
        );
        Ok(result)
    }
}
