//! User stake at a block, read from the staking registry.

use crate::chain::{ChainReadError, ChainReader};
use crate::domain::{BlockTag, PoolId, PoolStake, StakeSnapshotPolicy};
use alloy::primitives::{Address, U256};
use std::sync::Arc;

/// Reads stake positions from one staking registry.
///
/// Every call is a fresh read; nothing is cached, so the provider can be cloned into
/// concurrent tasks freely.
#[derive(Debug, Clone)]
pub struct StakeSnapshotProvider {
    reader: Arc<dyn ChainReader>,
    registry: Address,
}

impl StakeSnapshotProvider {
    pub fn new(reader: Arc<dyn ChainReader>, registry: Address) -> Self {
        Self { reader, registry }
    }

    pub fn registry(&self) -> Address {
        self.registry
    }

    /// Number of pools the registry lists.
    pub async fn pool_count(&self) -> Result<u64, ChainReadError> {
        self.reader.pool_count(self.registry).await
    }

    /// `user`'s stake in `pool` as of `at`, or `None` when there is no position.
    pub async fn snapshot(
        &self,
        pool: PoolId,
        user: Address,
        at: BlockTag,
    ) -> Result<Option<U256>, ChainReadError> {
        let amount = self
            .reader
            .staked_amount(self.registry, pool, user, at)
            .await?;
        Ok((!amount.is_zero()).then_some(amount))
    }

    /// Full position (with LP token) of `user` in `pool` as of `at`.
    pub async fn pool_stake(
        &self,
        pool: PoolId,
        user: Address,
        at: BlockTag,
    ) -> Result<Option<PoolStake>, ChainReadError> {
        let Some(amount) = self.snapshot(pool, user, at).await? else {
            return Ok(None);
        };
        let lp_token = self.reader.lp_token(self.registry, pool, at).await?;
        Ok(PoolStake::new(pool, lp_token, amount))
    }

    /// Stake applicable to a fee event at `block` under `policy`. No position counts as zero.
    pub async fn stake_at_event(
        &self,
        policy: StakeSnapshotPolicy,
        pool: PoolId,
        user: Address,
        block: u64,
    ) -> Result<U256, ChainReadError> {
        match policy {
            StakeSnapshotPolicy::Constant(stake) => Ok(stake),
            StakeSnapshotPolicy::Historical => Ok(self
                .snapshot(pool, user, BlockTag::Number(block))
                .await?
                .unwrap_or(U256::ZERO)),
        }
    }
}
