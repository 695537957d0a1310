//! JSON-RPC chain reader over an alloy HTTP provider.

use super::contracts::{IGammaPair, IMasterChef};
use super::{BlockHeader, ChainReadError, ChainReader, RawLog, TokenMetadata};
use crate::domain::{BlockTag, PoolId, UnixSecs};
use alloy::eips::{BlockId, BlockNumberOrTag};
use alloy::primitives::{Address, B256, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::Filter;
use async_trait::async_trait;
use backoff::future::retry;
use backoff::ExponentialBackoff;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Chain reader backed by a JSON-RPC node.
///
/// Every read is bounded by `read_timeout` per attempt and retried with exponential
/// backoff while the error is transient.
#[derive(Clone)]
pub struct RpcChainReader {
    provider: DynProvider,
    read_timeout: Duration,
    max_retry_elapsed: Duration,
}

impl fmt::Debug for RpcChainReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RpcChainReader")
            .field("read_timeout", &self.read_timeout)
            .field("max_retry_elapsed", &self.max_retry_elapsed)
            .finish_non_exhaustive()
    }
}

impl RpcChainReader {
    /// Connect to `rpc_url` and check that it serves `expected_chain_id`.
    pub async fn connect(
        rpc_url: &str,
        expected_chain_id: u64,
        read_timeout: Duration,
    ) -> Result<Self, ChainReadError> {
        let provider = ProviderBuilder::new()
            .connect(rpc_url)
            .await
            .map_err(|e| ChainReadError::Rpc(e.to_string()))?
            .erased();

        let reader = Self {
            provider,
            read_timeout,
            max_retry_elapsed: read_timeout * 4,
        };

        let provider = reader.provider.clone();
        let chain_id = reader
            .read("eth_chainId", move || {
                let provider = provider.clone();
                async move { provider.get_chain_id().await.map_err(rpc_err) }
            })
            .await?;
        if chain_id != expected_chain_id {
            return Err(ChainReadError::Other(format!(
                "node serves chain {} but {} was configured",
                chain_id, expected_chain_id
            )));
        }

        Ok(reader)
    }

    async fn read<T, F, Fut>(&self, operation: &str, f: F) -> Result<T, ChainReadError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, ChainReadError>>,
    {
        let backoff = ExponentialBackoff {
            max_elapsed_time: Some(self.max_retry_elapsed),
            ..Default::default()
        };
        let read_timeout = self.read_timeout;
        let f = &f;

        retry(backoff, || {
            let attempt = f();
            async move {
                match tokio::time::timeout(read_timeout, attempt).await {
                    Ok(Ok(value)) => Ok(value),
                    Ok(Err(e)) if e.is_transient() => {
                        debug!(operation, error = %e, "Transient chain read failure");
                        Err(backoff::Error::transient(e))
                    }
                    Ok(Err(e)) => Err(backoff::Error::permanent(e)),
                    Err(_) => Err(backoff::Error::transient(ChainReadError::Timeout {
                        operation: operation.to_string(),
                        after_ms: read_timeout.as_millis() as u64,
                    })),
                }
            }
        })
        .await
    }

    async fn block_header(&self, tag: BlockNumberOrTag) -> Result<BlockHeader, ChainReadError> {
        let provider = self.provider.clone();
        self.read("eth_getBlockByNumber", move || {
            let provider = provider.clone();
            async move {
                let block = provider
                    .get_block_by_number(tag)
                    .await
                    .map_err(rpc_err)?
                    .ok_or_else(|| ChainReadError::MissingBlock(tag.to_string()))?;
                Ok(BlockHeader {
                    number: block.header.number,
                    timestamp: UnixSecs::new(block.header.timestamp as i64),
                })
            }
        })
        .await
    }
}

fn rpc_err(e: impl fmt::Display) -> ChainReadError {
    ChainReadError::Rpc(e.to_string())
}

fn contract_err(e: alloy::contract::Error) -> ChainReadError {
    match e {
        alloy::contract::Error::TransportError(e) => ChainReadError::Rpc(e.to_string()),
        other => ChainReadError::Decode(other.to_string()),
    }
}

fn block_id(at: BlockTag) -> BlockId {
    match at {
        BlockTag::Number(n) => BlockId::number(n),
        BlockTag::Latest => BlockId::latest(),
    }
}

fn block_number_or_tag(at: BlockTag) -> BlockNumberOrTag {
    match at {
        BlockTag::Number(n) => BlockNumberOrTag::Number(n),
        BlockTag::Latest => BlockNumberOrTag::Latest,
    }
}

#[async_trait]
impl ChainReader for RpcChainReader {
    async fn current_block(&self) -> Result<BlockHeader, ChainReadError> {
        self.block_header(BlockNumberOrTag::Latest).await
    }

    async fn block_timestamp(&self, number: u64) -> Result<UnixSecs, ChainReadError> {
        let header = self.block_header(BlockNumberOrTag::Number(number)).await?;
        Ok(header.timestamp)
    }

    async fn logs(
        &self,
        address: Address,
        topic: B256,
        from_block: u64,
        to_block: BlockTag,
    ) -> Result<Vec<RawLog>, ChainReadError> {
        debug!(%address, from_block, %to_block, "Fetching logs");

        let filter = Filter::new()
            .address(address)
            .event_signature(topic)
            .from_block(from_block)
            .to_block(block_number_or_tag(to_block));
        let provider = self.provider.clone();
        let logs = self
            .read("eth_getLogs", move || {
                let provider = provider.clone();
                let filter = filter.clone();
                async move { provider.get_logs(&filter).await.map_err(rpc_err) }
            })
            .await?;

        logs.into_iter()
            .map(|log| {
                let block_number = log.block_number.ok_or_else(|| {
                    ChainReadError::Decode("log without block number".to_string())
                })?;
                Ok(RawLog {
                    address: log.address(),
                    block_number,
                    log_index: log.log_index.unwrap_or_default(),
                    topics: log.topics().to_vec(),
                    data: log.data().data.clone(),
                })
            })
            .collect()
    }

    async fn total_supply(&self, token: Address, at: BlockTag) -> Result<U256, ChainReadError> {
        let provider = self.provider.clone();
        self.read("totalSupply", move || {
            let pair = IGammaPair::new(token, provider.clone());
            async move {
                pair.totalSupply()
                    .block(block_id(at))
                    .call()
                    .await
                    .map_err(contract_err)
            }
        })
        .await
    }

    async fn balance_of(
        &self,
        token: Address,
        holder: Address,
        at: BlockTag,
    ) -> Result<U256, ChainReadError> {
        let provider = self.provider.clone();
        self.read("balanceOf", move || {
            let erc20 = IGammaPair::new(token, provider.clone());
            async move {
                erc20
                    .balanceOf(holder)
                    .block(block_id(at))
                    .call()
                    .await
                    .map_err(contract_err)
            }
        })
        .await
    }

    async fn token_metadata(&self, token: Address) -> Result<TokenMetadata, ChainReadError> {
        let provider = self.provider.clone();
        self.read("token metadata", move || {
            let erc20 = IGammaPair::new(token, provider.clone());
            async move {
                let decimals = erc20.decimals().call().await.map_err(contract_err)?;
                let name = erc20.name().call().await.map_err(contract_err)?;
                let symbol = erc20.symbol().call().await.map_err(contract_err)?;
                Ok(TokenMetadata {
                    address: token,
                    name,
                    symbol,
                    decimals,
                })
            }
        })
        .await
    }

    async fn pair_tokens(&self, pair: Address) -> Result<(Address, Address), ChainReadError> {
        let provider = self.provider.clone();
        self.read("token0/token1", move || {
            let pair = IGammaPair::new(pair, provider.clone());
            async move {
                let token0 = pair.token0().call().await.map_err(contract_err)?;
                let token1 = pair.token1().call().await.map_err(contract_err)?;
                Ok((token0, token1))
            }
        })
        .await
    }

    async fn pool_count(&self, registry: Address) -> Result<u64, ChainReadError> {
        let provider = self.provider.clone();
        let count = self
            .read("poolLength", move || {
                let chef = IMasterChef::new(registry, provider.clone());
                async move { chef.poolLength().call().await.map_err(contract_err) }
            })
            .await?;
        u64::try_from(count)
            .map_err(|_| ChainReadError::Decode(format!("pool count {} exceeds u64", count)))
    }

    async fn lp_token(
        &self,
        registry: Address,
        pool: PoolId,
        at: BlockTag,
    ) -> Result<Address, ChainReadError> {
        let provider = self.provider.clone();
        self.read("lpToken", move || {
            let chef = IMasterChef::new(registry, provider.clone());
            async move {
                chef.lpToken(pool.as_u256())
                    .block(block_id(at))
                    .call()
                    .await
                    .map_err(contract_err)
            }
        })
        .await
    }

    async fn staked_amount(
        &self,
        registry: Address,
        pool: PoolId,
        user: Address,
        at: BlockTag,
    ) -> Result<U256, ChainReadError> {
        let provider = self.provider.clone();
        self.read("userInfo", move || {
            let chef = IMasterChef::new(registry, provider.clone());
            async move {
                let info = chef
                    .userInfo(pool.as_u256(), user)
                    .block(block_id(at))
                    .call()
                    .await
                    .map_err(contract_err)?;
                Ok(info.amount)
            }
        })
        .await
    }
}
