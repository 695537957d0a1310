//! Rewards report: per-pool fee totals with token metadata and USD values.

use crate::domain::{BlockRange, Decimal, FeeAmount};
use alloy::primitives::Address;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

pub mod aggregator;
pub mod writer;

pub use aggregator::ReportAggregator;
pub use writer::{report_file_name, write_report};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to write report: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Identifies whose rewards over which window a report covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportHeader {
    /// Window start exactly as configured.
    pub start_date: String,
    /// Window end exactly as configured (`now` for an open window).
    pub end_date: String,
    pub wallet_address: Address,
    pub masterchef_address: Address,
}

/// One token leg of a pool's fees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenFees {
    pub address: Address,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    /// Raw units, with any fractional part kept.
    pub fees_raw: FeeAmount,
    /// Whole-token amount with `decimals` fractional digits.
    pub fees_normalised: String,
    /// Absent when the token has no price.
    pub fees_usd: Option<Decimal>,
}

/// Fees attributed to the wallet in one pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolReport {
    pub pid: String,
    pub lp_address: Address,
    pub lp_name: String,
    pub stake_amount: String,
    pub block_range: BlockRange,
    pub events_scanned: usize,
    pub token0: TokenFees,
    pub token1: TokenFees,
    /// Sum of the priced legs; absent when neither leg is priced.
    pub total_fees_usd: Option<Decimal>,
    /// Fees expressed as LP tokens at the current pool composition.
    pub lp_equivalent: Option<FeeAmount>,
}

/// A pool whose attribution or enrichment failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedPool {
    pub pid: String,
    pub lp_address: Address,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportTotals {
    pub total_usd: Decimal,
    pub pools_reported: usize,
    pub pools_failed: usize,
}

/// Complete rewards report for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RewardsReport {
    #[serde(flatten)]
    pub header: ReportHeader,
    pub generated_at: DateTime<Utc>,
    pub pools: Vec<PoolReport>,
    pub failed_pools: Vec<FailedPool>,
    pub totals: ReportTotals,
}

impl RewardsReport {
    /// Assemble a report, deriving the totals from `pools` and `failed_pools`.
    pub fn new(header: ReportHeader, pools: Vec<PoolReport>, failed_pools: Vec<FailedPool>) -> Self {
        let total_usd = pools.iter().filter_map(|p| p.total_fees_usd).sum();
        let totals = ReportTotals {
            total_usd,
            pools_reported: pools.len(),
            pools_failed: failed_pools.len(),
        };
        Self {
            header,
            generated_at: Utc::now(),
            pools,
            failed_pools,
            totals,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.failed_pools.is_empty()
    }
}
