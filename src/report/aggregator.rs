//! Turns raw per-pool attribution results into report rows.

use super::{PoolReport, TokenFees};
use crate::chain::{ChainReadError, ChainReader, TokenMetadata};
use crate::domain::{AttributionResult, Decimal, FeeAmount, PoolStake};
use crate::engine::lp_equivalent;
use crate::pricing::PriceCache;
use std::sync::Arc;
use tracing::{info, warn};

/// Enriches attribution results with token metadata, USD prices and LP equivalents.
///
/// Pools are aggregated one at a time so the price cache needs no locking.
#[derive(Debug)]
pub struct ReportAggregator {
    reader: Arc<dyn ChainReader>,
    prices: PriceCache,
}

impl ReportAggregator {
    pub fn new(reader: Arc<dyn ChainReader>, prices: PriceCache) -> Self {
        Self { reader, prices }
    }

    /// Build the report row for `stake`. Chain read failures fail this pool only.
    pub async fn pool_report(
        &mut self,
        stake: &PoolStake,
        result: &AttributionResult,
    ) -> Result<PoolReport, ChainReadError> {
        let lp = stake.lp_contract_address;
        let (token0, token1) = self.reader.pair_tokens(lp).await?;
        let (meta0, meta1, lp_meta) = tokio::try_join!(
            self.reader.token_metadata(token0),
            self.reader.token_metadata(token1),
            self.reader.token_metadata(lp),
        )?;

        let leg0 = self.token_fees(meta0, result.user_fees0).await;
        let leg1 = self.token_fees(meta1, result.user_fees1).await;

        let total_fees_usd = match (leg0.fees_usd, leg1.fees_usd) {
            (None, None) => None,
            (a, b) => Some(a.unwrap_or_default() + b.unwrap_or_default()),
        };

        let lp_equivalent = lp_equivalent(
            self.reader.as_ref(),
            lp,
            token0,
            token1,
            &result.user_fees0,
            &result.user_fees1,
        )
        .await?;

        info!(
            pid = %stake.pool_id,
            lp = %lp,
            stake = %stake.stake_amount,
            "Rewards for LP {}: {} {} and {} {}",
            lp_meta.name,
            leg0.fees_normalised,
            leg0.symbol,
            leg1.fees_normalised,
            leg1.symbol
        );

        Ok(PoolReport {
            pid: stake.pool_id.to_string(),
            lp_address: lp,
            lp_name: lp_meta.name,
            stake_amount: stake.stake_amount.to_string(),
            block_range: result.range,
            events_scanned: result.events_scanned,
            token0: leg0,
            token1: leg1,
            total_fees_usd,
            lp_equivalent,
        })
    }

    async fn token_fees(&mut self, meta: TokenMetadata, fees: FeeAmount) -> TokenFees {
        let price = self.prices.usd_price(&meta.symbol).await;
        let fees_usd = price.and_then(|price| {
            let amount = Decimal::from_fee_amount(&fees, meta.decimals);
            let usd = amount.and_then(|a| a.checked_mul(price));
            if usd.is_none() {
                warn!(symbol = %meta.symbol, "USD value out of range, leaving token unpriced");
            }
            usd
        });

        TokenFees {
            address: meta.address,
            fees_normalised: fees.to_normalised_string(meta.decimals),
            fees_raw: fees,
            fees_usd,
            name: meta.name,
            symbol: meta.symbol,
            decimals: meta.decimals,
        }
    }
}
