//! Stake positions and the policy for resolving stake per event.

use crate::domain::PoolId;
use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};

/// A user's position in one registry pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStake {
    /// Index of the pool in the staking registry.
    pub pool_id: PoolId,
    /// LP token contract emitting the fee events.
    pub lp_contract_address: Address,
    /// Staked LP amount in raw units.
    pub stake_amount: U256,
}

impl PoolStake {
    /// Returns `None` for a zero stake: no position, nothing to attribute.
    pub fn new(pool_id: PoolId, lp_contract_address: Address, stake_amount: U256) -> Option<Self> {
        if stake_amount.is_zero() {
            return None;
        }
        Some(Self {
            pool_id,
            lp_contract_address,
            stake_amount,
        })
    }
}

/// How the user's stake is resolved for each fee event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StakeSnapshotPolicy {
    /// Reuse one stake amount for every event.
    Constant(U256),
    /// Re-read the stake at each event's block.
    Historical,
}

impl StakeSnapshotPolicy {
    /// Policy for `stake` given the run's historical-balance setting.
    pub fn for_stake(stake: &PoolStake, historical: bool) -> Self {
        if historical {
            StakeSnapshotPolicy::Historical
        } else {
            StakeSnapshotPolicy::Constant(stake.stake_amount)
        }
    }
}
