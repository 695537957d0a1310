use crate::chain::ChainReadError;
use crate::domain::{BlockTag, PoolId, PoolStake};
use crate::engine::StakeSnapshotProvider;
use alloy::primitives::Address;
use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::info;

/// Every pool in the registry where `user` currently has a positive stake, in pool order.
///
/// At most `concurrency` pools are queried at once.
pub async fn discover_stakes(
    stakes: &StakeSnapshotProvider,
    user: Address,
    concurrency: usize,
) -> Result<Vec<PoolStake>, ChainReadError> {
    let pool_count = stakes.pool_count().await?;
    info!(registry = %stakes.registry(), pool_count, "Scanning registry pools");

    let positions: Vec<Option<PoolStake>> = stream::iter(0..pool_count)
        .map(|pid| stakes.pool_stake(PoolId::new(pid), user, BlockTag::Latest))
        .buffered(concurrency.max(1))
        .try_collect()
        .await?;

    let found: Vec<PoolStake> = positions.into_iter().flatten().collect();
    info!(
        %user,
        pools = ?found.iter().map(|s| s.pool_id.to_string()).collect::<Vec<_>>(),
        "Found staked pools"
    );
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{ChainReader, MockChainReader};
    use alloy::primitives::U256;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_discovers_positive_stakes_in_pool_order() {
        let user = Address::repeat_byte(0x11);
        let mut mock = MockChainReader::new(100, 1_000);
        for pid in 0..6u8 {
            mock = mock.with_pool(PoolId::new(pid as u64), Address::repeat_byte(0xa0 + pid));
        }
        let mock = mock
            .with_stake(PoolId::new(4), user, 0, 40)
            .with_stake(PoolId::new(1), user, 0, 10)
            .with_stake(PoolId::new(2), Address::repeat_byte(0x22), 0, 99);

        let reader: Arc<dyn ChainReader> = Arc::new(mock);
        let provider = StakeSnapshotProvider::new(reader, Address::repeat_byte(0xcc));
        let found = discover_stakes(&provider, user, 2).await.unwrap();

        assert_eq!(found.len(), 2);
        assert_eq!(found[0].pool_id, PoolId::new(1));
        assert_eq!(found[0].lp_contract_address, Address::repeat_byte(0xa1));
        assert_eq!(found[0].stake_amount, U256::from(10));
        assert_eq!(found[1].pool_id, PoolId::new(4));
    }

    #[tokio::test]
    async fn test_empty_registry() {
        let reader: Arc<dyn ChainReader> = Arc::new(MockChainReader::new(100, 1_000));
        let provider = StakeSnapshotProvider::new(reader, Address::ZERO);
        let found = discover_stakes(&provider, Address::ZERO, 4).await.unwrap();
        assert!(found.is_empty());
    }
}
