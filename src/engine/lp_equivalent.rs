//! Attributed fees expressed as LP tokens at the current pool composition.

use crate::chain::{ChainReadError, ChainReader};
use crate::domain::{BlockTag, FeeAmount};
use alloy::primitives::{Address, U256};
use tracing::warn;

/// LP tokens worth `fees0` of token0 plus `fees1` of token1, given the pool holds
/// `reserve0`/`reserve1` against `supply` LP tokens.
///
/// Each leg converts as `fees * supply / reserve`. `None` if the pool is empty on either side.
pub fn lp_equivalent_from_reserves(
    fees0: &FeeAmount,
    fees1: &FeeAmount,
    reserve0: U256,
    reserve1: U256,
    supply: U256,
) -> Option<FeeAmount> {
    if supply.is_zero() || reserve0.is_zero() || reserve1.is_zero() {
        return None;
    }
    let leg0 = fees0.scale_by(supply, reserve0)?;
    let leg1 = fees1.scale_by(supply, reserve1)?;
    leg0.checked_add(leg1)
}

/// Read the pool's reserves and supply at the chain tip and convert the fees to LP tokens.
pub async fn lp_equivalent(
    reader: &dyn ChainReader,
    lp_token: Address,
    token0: Address,
    token1: Address,
    fees0: &FeeAmount,
    fees1: &FeeAmount,
) -> Result<Option<FeeAmount>, ChainReadError> {
    let (reserve0, reserve1, supply) = tokio::try_join!(
        reader.balance_of(token0, lp_token, BlockTag::Latest),
        reader.balance_of(token1, lp_token, BlockTag::Latest),
        reader.total_supply(lp_token, BlockTag::Latest),
    )?;

    let equivalent = lp_equivalent_from_reserves(fees0, fees1, reserve0, reserve1, supply);
    if equivalent.is_none() {
        warn!(
            lp = %lp_token,
            %reserve0,
            %reserve1,
            %supply,
            "Cannot price fees in LP tokens: rebalance needed, or zero liquidity?"
        );
    }
    Ok(equivalent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::MockChainReader;

    fn raw(n: u64) -> FeeAmount {
        FeeAmount::from_raw(U256::from(n))
    }

    #[test]
    fn test_from_reserves() {
        // 1000 LP against 500 token0 and 2000 token1: 1 token0 = 2 LP, 1 token1 = 0.5 LP.
        let lp = lp_equivalent_from_reserves(
            &raw(10),
            &raw(40),
            U256::from(500),
            U256::from(2_000),
            U256::from(1_000),
        )
        .unwrap();
        assert_eq!(lp.to_raw_string(), "40");
    }

    #[test]
    fn test_zero_liquidity_is_none() {
        assert!(lp_equivalent_from_reserves(
            &raw(1),
            &raw(1),
            U256::ZERO,
            U256::from(1),
            U256::from(1)
        )
        .is_none());
        assert!(lp_equivalent_from_reserves(
            &raw(1),
            &raw(1),
            U256::from(1),
            U256::from(1),
            U256::ZERO
        )
        .is_none());
    }

    #[tokio::test]
    async fn test_lp_equivalent_reads_tip_state() {
        let lp = Address::repeat_byte(0xaa);
        let t0 = Address::repeat_byte(0x01);
        let t1 = Address::repeat_byte(0x02);
        let mock = MockChainReader::new(100, 1_000)
            .with_supply(lp, 0, 100)
            .with_balance(t0, lp, 100)
            .with_balance(t1, lp, 400);

        let result = lp_equivalent(&mock, lp, t0, t1, &raw(3), &raw(8))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(result.to_raw_string(), "5");
    }

    #[tokio::test]
    async fn test_lp_equivalent_empty_pool() {
        let lp = Address::repeat_byte(0xaa);
        let mock = MockChainReader::new(100, 1_000);
        let result = lp_equivalent(
            &mock,
            lp,
            Address::repeat_byte(0x01),
            Address::repeat_byte(0x02),
            &raw(3),
            &raw(8),
        )
        .await
        .unwrap();
        assert!(result.is_none());
    }
}
