//! Contract bindings for the LP pair and the staking registry.

use super::{ChainReadError, RawLog};
use crate::domain::FeeEvent;
use alloy::primitives::B256;
use alloy::sol;
use alloy::sol_types::SolEvent;

sol! {
    #[sol(rpc)]
    interface IGammaPair {
        event ZeroBurn(uint8 fee, uint256 fees0, uint256 fees1);

        function totalSupply() external view returns (uint256);
        function balanceOf(address account) external view returns (uint256);
        function token0() external view returns (address);
        function token1() external view returns (address);
        function decimals() external view returns (uint8);
        function name() external view returns (string);
        function symbol() external view returns (string);
    }

    #[sol(rpc)]
    interface IMasterChef {
        function poolLength() external view returns (uint256);
        function lpToken(uint256 pid) external view returns (address);
        function userInfo(uint256 pid, address user) external view returns (uint256 amount, uint256 rewardDebt);
    }
}

/// First topic of every fee-burn log.
pub fn zero_burn_topic() -> B256 {
    IGammaPair::ZeroBurn::SIGNATURE_HASH
}

/// Decode a fee-burn log into a [`FeeEvent`].
pub fn decode_fee_event(log: &RawLog) -> Result<FeeEvent, ChainReadError> {
    let event = IGammaPair::ZeroBurn::decode_raw_log(log.topics.iter().copied(), &log.data)
        .map_err(|e| {
            ChainReadError::Decode(format!(
                "ZeroBurn at block {} index {}: {}",
                log.block_number, log.log_index, e
            ))
        })?;
    Ok(FeeEvent::new(
        log.block_number,
        log.log_index,
        event.fees0,
        event.fees1,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{keccak256, Address, Bytes, U256};

    #[test]
    fn test_zero_burn_topic_matches_signature() {
        assert_eq!(
            zero_burn_topic(),
            keccak256("ZeroBurn(uint8,uint256,uint256)")
        );
    }

    #[test]
    fn test_decode_fee_event() {
        let event = IGammaPair::ZeroBurn {
            fee: 10,
            fees0: U256::from(100),
            fees1: U256::from(7),
        };
        let log = RawLog {
            address: Address::ZERO,
            block_number: 12,
            log_index: 3,
            topics: vec![zero_burn_topic()],
            data: Bytes::from(event.encode_data()),
        };

        let decoded = decode_fee_event(&log).unwrap();
        assert_eq!(decoded, FeeEvent::new(12, 3, U256::from(100), U256::from(7)));
    }

    #[test]
    fn test_decode_rejects_truncated_data() {
        let log = RawLog {
            address: Address::ZERO,
            block_number: 12,
            log_index: 0,
            topics: vec![zero_burn_topic()],
            data: Bytes::from(vec![0u8; 16]),
        };
        let err = decode_fee_event(&log).unwrap_err();
        assert!(matches!(err, ChainReadError::Decode(_)));
    }
}
