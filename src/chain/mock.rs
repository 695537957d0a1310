//! Mock chain reader for testing without network calls.

use super::contracts::{zero_burn_topic, IGammaPair};
use super::{BlockHeader, ChainReadError, ChainReader, RawLog, TokenMetadata};
use crate::domain::{BlockTag, PoolId, UnixSecs};
use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::sol_types::SolEvent;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// In-memory chain with a fixed tip.
///
/// State values are step functions of block height: a value recorded at block `n` holds
/// for every block from `n` until the next recorded change.
#[derive(Debug, Clone, Default)]
pub struct MockChainReader {
    head: BlockHeader,
    block_times: BTreeMap<u64, UnixSecs>,
    logs: Vec<RawLog>,
    supplies: HashMap<Address, BTreeMap<u64, U256>>,
    balances: HashMap<(Address, Address), U256>,
    tokens: HashMap<Address, TokenMetadata>,
    pairs: HashMap<Address, (Address, Address)>,
    pools: BTreeMap<PoolId, Address>,
    stakes: HashMap<(PoolId, Address), BTreeMap<u64, U256>>,
    failing_supply_blocks: HashSet<u64>,
    failing_pairs: HashSet<Address>,
    reads: Arc<ReadCounters>,
}

/// Number of reads served, per kind.
#[derive(Debug, Default)]
pub struct ReadCounters {
    pub current_block: AtomicUsize,
    pub logs: AtomicUsize,
    pub total_supply: AtomicUsize,
    pub staked_amount: AtomicUsize,
}

impl MockChainReader {
    /// Create a chain whose tip is block `number` at `timestamp`.
    pub fn new(number: u64, timestamp: i64) -> Self {
        Self {
            head: BlockHeader {
                number,
                timestamp: UnixSecs::new(timestamp),
            },
            ..Default::default()
        }
    }

    /// Record the timestamp of a historical block.
    pub fn with_block_time(mut self, number: u64, timestamp: i64) -> Self {
        self.block_times.insert(number, UnixSecs::new(timestamp));
        self
    }

    /// Add a fee-burn log emitted by `pair` at `block`.
    pub fn with_fee_event(mut self, pair: Address, block: u64, fees0: u64, fees1: u64) -> Self {
        self.push_fee_event(pair, block, U256::from(fees0), U256::from(fees1));
        self
    }

    /// Add a fee-burn log with full-width amounts.
    pub fn with_fee_event_u256(mut self, pair: Address, block: u64, fees0: U256, fees1: U256) -> Self {
        self.push_fee_event(pair, block, fees0, fees1);
        self
    }

    fn push_fee_event(&mut self, pair: Address, block: u64, fees0: U256, fees1: U256) {
        let event = IGammaPair::ZeroBurn {
            fee: 10,
            fees0,
            fees1,
        };
        let log_index = self
            .logs
            .iter()
            .filter(|l| l.block_number == block)
            .count() as u64;
        self.logs.push(RawLog {
            address: pair,
            block_number: block,
            log_index,
            topics: vec![zero_burn_topic()],
            data: Bytes::from(event.encode_data()),
        });
    }

    /// Add an arbitrary log.
    pub fn with_raw_log(mut self, log: RawLog) -> Self {
        self.logs.push(log);
        self
    }

    /// Set `token` total supply from `block` onwards.
    pub fn with_supply(mut self, token: Address, block: u64, supply: u64) -> Self {
        self.supplies
            .entry(token)
            .or_default()
            .insert(block, U256::from(supply));
        self
    }

    /// Set `holder`'s balance of `token`.
    pub fn with_balance(mut self, token: Address, holder: Address, balance: u64) -> Self {
        self.balances.insert((token, holder), U256::from(balance));
        self
    }

    /// Register token metadata.
    pub fn with_token(mut self, address: Address, name: &str, symbol: &str, decimals: u8) -> Self {
        self.tokens.insert(
            address,
            TokenMetadata {
                address,
                name: name.to_string(),
                symbol: symbol.to_string(),
                decimals,
            },
        );
        self
    }

    /// Register the two tokens of an LP pair.
    pub fn with_pair(mut self, pair: Address, token0: Address, token1: Address) -> Self {
        self.pairs.insert(pair, (token0, token1));
        self
    }

    /// Register a registry pool staking `lp_token`.
    pub fn with_pool(mut self, pool: PoolId, lp_token: Address) -> Self {
        self.pools.insert(pool, lp_token);
        self
    }

    /// Set `user`'s stake in `pool` from `block` onwards.
    pub fn with_stake(mut self, pool: PoolId, user: Address, block: u64, amount: u64) -> Self {
        self.stakes
            .entry((pool, user))
            .or_default()
            .insert(block, U256::from(amount));
        self
    }

    /// Make every `totalSupply` read at `block` fail with an RPC error.
    pub fn failing_supply_at(mut self, block: u64) -> Self {
        self.failing_supply_blocks.insert(block);
        self
    }

    /// Make every read of `pair`'s tokens fail with an RPC error.
    pub fn failing_pair(mut self, pair: Address) -> Self {
        self.failing_pairs.insert(pair);
        self
    }

    /// Shared read counters; clones of this reader count into the same counters.
    pub fn reads(&self) -> Arc<ReadCounters> {
        self.reads.clone()
    }

    fn resolve(&self, at: BlockTag) -> u64 {
        at.number().unwrap_or(self.head.number)
    }

    fn value_at(series: Option<&BTreeMap<u64, U256>>, block: u64) -> U256 {
        series
            .and_then(|s| s.range(..=block).next_back())
            .map(|(_, v)| *v)
            .unwrap_or(U256::ZERO)
    }
}

#[async_trait]
impl ChainReader for MockChainReader {
    async fn current_block(&self) -> Result<BlockHeader, ChainReadError> {
        self.reads.current_block.fetch_add(1, Ordering::SeqCst);
        Ok(self.head)
    }

    async fn block_timestamp(&self, number: u64) -> Result<UnixSecs, ChainReadError> {
        if number == self.head.number {
            return Ok(self.head.timestamp);
        }
        self.block_times
            .get(&number)
            .copied()
            .ok_or_else(|| ChainReadError::MissingBlock(number.to_string()))
    }

    async fn logs(
        &self,
        address: Address,
        topic: B256,
        from_block: u64,
        to_block: BlockTag,
    ) -> Result<Vec<RawLog>, ChainReadError> {
        self.reads.logs.fetch_add(1, Ordering::SeqCst);
        let to_block = self.resolve(to_block);
        let mut logs: Vec<RawLog> = self
            .logs
            .iter()
            .filter(|l| {
                l.address == address
                    && l.topics.first() == Some(&topic)
                    && l.block_number >= from_block
                    && l.block_number <= to_block
            })
            .cloned()
            .collect();
        logs.sort_by_key(|l| (l.block_number, l.log_index));
        Ok(logs)
    }

    async fn total_supply(&self, token: Address, at: BlockTag) -> Result<U256, ChainReadError> {
        self.reads.total_supply.fetch_add(1, Ordering::SeqCst);
        let block = self.resolve(at);
        if self.failing_supply_blocks.contains(&block) {
            return Err(ChainReadError::Rpc(format!(
                "totalSupply unavailable at block {}",
                block
            )));
        }
        Ok(Self::value_at(self.supplies.get(&token), block))
    }

    async fn balance_of(
        &self,
        token: Address,
        holder: Address,
        _at: BlockTag,
    ) -> Result<U256, ChainReadError> {
        Ok(self
            .balances
            .get(&(token, holder))
            .copied()
            .unwrap_or(U256::ZERO))
    }

    async fn token_metadata(&self, token: Address) -> Result<TokenMetadata, ChainReadError> {
        self.tokens
            .get(&token)
            .cloned()
            .ok_or_else(|| ChainReadError::Rpc(format!("no contract at {}", token)))
    }

    async fn pair_tokens(&self, pair: Address) -> Result<(Address, Address), ChainReadError> {
        if self.failing_pairs.contains(&pair) {
            return Err(ChainReadError::Rpc(format!("token0 reverted for {}", pair)));
        }
        self.pairs
            .get(&pair)
            .copied()
            .ok_or_else(|| ChainReadError::Rpc(format!("no pair at {}", pair)))
    }

    async fn pool_count(&self, _registry: Address) -> Result<u64, ChainReadError> {
        Ok(self.pools.len() as u64)
    }

    async fn lp_token(
        &self,
        _registry: Address,
        pool: PoolId,
        _at: BlockTag,
    ) -> Result<Address, ChainReadError> {
        self.pools
            .get(&pool)
            .copied()
            .ok_or_else(|| ChainReadError::Rpc(format!("pool {} out of range", pool)))
    }

    async fn staked_amount(
        &self,
        _registry: Address,
        pool: PoolId,
        user: Address,
        at: BlockTag,
    ) -> Result<U256, ChainReadError> {
        self.reads.staked_amount.fetch_add(1, Ordering::SeqCst);
        let block = self.resolve(at);
        Ok(Self::value_at(self.stakes.get(&(pool, user)), block))
    }
}
