//! Wall-clock window to block range conversion.
//!
//! Blocks are located by linear extrapolation from the chain tip with a fixed assumed block
//! interval. The error is bounded by how far the real average interval drifts from the
//! assumed one over the window; no search by block timestamp is performed.

use crate::chain::{BlockHeader, ChainReadError, ChainReader};
use crate::domain::{BlockRange, BlockTag, TimeWindow, UnixSecs, WindowBound};
use chrono::NaiveDateTime;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Default assumed seconds between blocks.
pub const DEFAULT_BLOCK_INTERVAL_SECS: u64 = 2;

/// Etherscan-style timestamp, 12-hour clock: `Jan-01-2024 12:00:00 AM`.
const FORMAT_12H: &str = "%b-%d-%Y %I:%M:%S %p";
/// 24-hour variant: `Jan-01-2024 00:00:00`.
const FORMAT_24H: &str = "%b-%d-%Y %H:%M:%S";

const NOW: &str = "now";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("invalid time format: {0}")]
    InvalidTimeFormat(String),
    #[error("unsupported timezone: +{0}")]
    UnsupportedTimezone(String),
    #[error("window end block {end} precedes start block {start}")]
    InvalidWindow { start: u64, end: u64 },
    #[error(transparent)]
    Chain(#[from] ChainReadError),
}

/// Parse a UTC timestamp such as `Jan-01-2024 12:00:00 AM +UTC`.
///
/// The zone suffix may be omitted and then means UTC. Any explicit zone other than `UTC`
/// is refused rather than converted.
pub fn parse_timestamp(input: &str) -> Result<UnixSecs, ResolveError> {
    let input = input.trim();
    let (body, zone) = match input.rsplit_once(" +") {
        Some((body, zone)) => (body, Some(zone)),
        None => (input, None),
    };

    if let Some(zone) = zone {
        if zone.is_empty() || !zone.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(ResolveError::InvalidTimeFormat(input.to_string()));
        }
        if zone != "UTC" {
            return Err(ResolveError::UnsupportedTimezone(zone.to_string()));
        }
    }

    [FORMAT_12H, FORMAT_24H]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(body, fmt).ok())
        .map(|dt| UnixSecs::new(dt.and_utc().timestamp()))
        .ok_or_else(|| ResolveError::InvalidTimeFormat(input.to_string()))
}

/// Parse one side of a window; `now` is the live chain tip.
pub fn parse_window_bound(input: &str) -> Result<WindowBound, ResolveError> {
    if input.trim().eq_ignore_ascii_case(NOW) {
        return Ok(WindowBound::Now);
    }
    parse_timestamp(input).map(WindowBound::At)
}

/// Parse a `(start, end)` pair of window strings.
pub fn parse_window(start: &str, end: &str) -> Result<TimeWindow, ResolveError> {
    Ok(TimeWindow::new(
        parse_window_bound(start)?,
        parse_window_bound(end)?,
    ))
}

/// Block expected at `target`, extrapolated back from `head`.
///
/// Targets at or after the head's timestamp resolve to the head; targets before genesis
/// saturate at block 0.
pub fn approximate_block(head: BlockHeader, target: UnixSecs, block_interval_secs: u64) -> u64 {
    let elapsed = head.timestamp.as_i64().saturating_sub(target.as_i64());
    if elapsed <= 0 {
        return head.number;
    }
    let offset = elapsed as u64 / block_interval_secs.max(1);
    head.number.saturating_sub(offset)
}

/// Converts time windows into block ranges against the live chain tip.
#[derive(Debug, Clone)]
pub struct TimeToBlockResolver {
    reader: Arc<dyn ChainReader>,
    block_interval_secs: u64,
}

impl TimeToBlockResolver {
    pub fn new(reader: Arc<dyn ChainReader>, block_interval_secs: u64) -> Self {
        Self {
            reader,
            block_interval_secs: block_interval_secs.max(1),
        }
    }

    /// Resolve `window` with one read of the current block.
    ///
    /// An end of `now` resolves to [`BlockTag::Latest`], never to the height observed here.
    pub async fn resolve(&self, window: &TimeWindow) -> Result<BlockRange, ResolveError> {
        let head = self.reader.current_block().await?;

        let start_block = match window.start {
            WindowBound::At(t) => approximate_block(head, t, self.block_interval_secs),
            WindowBound::Now => head.number,
        };
        let end_block = match window.end {
            WindowBound::At(t) => {
                BlockTag::Number(approximate_block(head, t, self.block_interval_secs))
            }
            WindowBound::Now => BlockTag::Latest,
        };

        if let BlockTag::Number(end) = end_block {
            if end < start_block {
                return Err(ResolveError::InvalidWindow {
                    start: start_block,
                    end,
                });
            }
        }

        let range = BlockRange::new(start_block, end_block);
        info!(
            head = head.number,
            head_time = head.timestamp.as_i64(),
            %range,
            "Resolved time window to blocks"
        );
        Ok(range)
    }
}
