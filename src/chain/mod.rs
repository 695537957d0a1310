//! Read-only chain access: block headers, event logs and contract state at a block.

use crate::domain::{BlockTag, PoolId, UnixSecs};
use alloy::primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;

pub mod contracts;
pub mod mock;
pub mod rpc;

pub use contracts::{decode_fee_event, zero_burn_topic};
pub use mock::MockChainReader;
pub use rpc::RpcChainReader;

/// Height and timestamp of a block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockHeader {
    pub number: u64,
    pub timestamp: UnixSecs,
}

/// An undecoded event log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLog {
    pub address: Address,
    pub block_number: u64,
    pub log_index: u64,
    pub topics: Vec<B256>,
    pub data: Bytes,
}

/// ERC-20 style token metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenMetadata {
    pub address: Address,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Read-only capability set over a chain.
///
/// Implementations must be safe to share across concurrent tasks. Every state read takes
/// a [`BlockTag`]; `BlockTag::Latest` is forwarded to the node unresolved.
#[async_trait]
pub trait ChainReader: Send + Sync + fmt::Debug {
    /// Height and timestamp of the current chain tip.
    async fn current_block(&self) -> Result<BlockHeader, ChainReadError>;

    /// Timestamp of the block at `number`.
    async fn block_timestamp(&self, number: u64) -> Result<UnixSecs, ChainReadError>;

    /// Logs emitted by `address` with first topic `topic` in `from_block..=to_block`,
    /// ordered by block and log index.
    async fn logs(
        &self,
        address: Address,
        topic: B256,
        from_block: u64,
        to_block: BlockTag,
    ) -> Result<Vec<RawLog>, ChainReadError>;

    /// `totalSupply()` of `token` at `at`.
    async fn total_supply(&self, token: Address, at: BlockTag) -> Result<U256, ChainReadError>;

    /// `balanceOf(holder)` of `token` at `at`.
    async fn balance_of(
        &self,
        token: Address,
        holder: Address,
        at: BlockTag,
    ) -> Result<U256, ChainReadError>;

    /// Name, symbol and decimals of `token` at the chain tip.
    async fn token_metadata(&self, token: Address) -> Result<TokenMetadata, ChainReadError>;

    /// `(token0, token1)` of an LP pair.
    async fn pair_tokens(&self, pair: Address) -> Result<(Address, Address), ChainReadError>;

    /// Number of pools in the staking registry.
    async fn pool_count(&self, registry: Address) -> Result<u64, ChainReadError>;

    /// LP token staked in registry pool `pool`.
    async fn lp_token(
        &self,
        registry: Address,
        pool: PoolId,
        at: BlockTag,
    ) -> Result<Address, ChainReadError>;

    /// Amount `user` has staked in registry pool `pool` at `at`.
    async fn staked_amount(
        &self,
        registry: Address,
        pool: PoolId,
        user: Address,
        at: BlockTag,
    ) -> Result<U256, ChainReadError>;
}

/// Error type for chain reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainReadError {
    /// Transport or node error (connection failure, JSON-RPC error response)
    Rpc(String),
    /// A single read exceeded the per-read timeout
    Timeout { operation: String, after_ms: u64 },
    /// A response or log could not be decoded
    Decode(String),
    /// The node returned no block for a requested height
    MissingBlock(String),
    /// Other error
    Other(String),
}

impl ChainReadError {
    /// Whether retrying the same read may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ChainReadError::Rpc(_) | ChainReadError::Timeout { .. } | ChainReadError::MissingBlock(_)
        )
    }
}

impl fmt::Display for ChainReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainReadError::Rpc(msg) => write!(f, "RPC error: {}", msg),
            ChainReadError::Timeout {
                operation,
                after_ms,
            } => write!(f, "Timed out after {}ms: {}", after_ms, operation),
            ChainReadError::Decode(msg) => write!(f, "Decode error: {}", msg),
            ChainReadError::MissingBlock(block) => write!(f, "Block not found: {}", block),
            ChainReadError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for ChainReadError {}
