//! Domain primitives: UnixSecs, BlockTag, BlockRange, TimeWindow, PoolId.

use alloy::primitives::U256;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Time in seconds since Unix epoch (UTC).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnixSecs(pub i64);

impl UnixSecs {
    /// Create a UnixSecs from seconds.
    pub fn new(secs: i64) -> Self {
        UnixSecs(secs)
    }

    /// Get the underlying seconds value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

/// Index of a pool inside the staking registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PoolId(pub U256);

impl PoolId {
    pub fn new(pid: u64) -> Self {
        PoolId(U256::from(pid))
    }

    pub fn as_u256(&self) -> U256 {
        self.0
    }
}

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A block height, or the chain tip as seen at query time.
///
/// `Latest` is passed through to every read unresolved, so each query observes the
/// freshest tip rather than a height memoized earlier in the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockTag {
    Number(u64),
    Latest,
}

impl BlockTag {
    /// The concrete height, if this tag is not the `Latest` sentinel.
    pub fn number(&self) -> Option<u64> {
        match self {
            BlockTag::Number(n) => Some(*n),
            BlockTag::Latest => None,
        }
    }

    pub fn is_latest(&self) -> bool {
        matches!(self, BlockTag::Latest)
    }
}

impl From<u64> for BlockTag {
    fn from(value: u64) -> Self {
        BlockTag::Number(value)
    }
}

impl fmt::Display for BlockTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockTag::Number(n) => write!(f, "{}", n),
            BlockTag::Latest => write!(f, "latest"),
        }
    }
}

/// Inclusive pair of block heights bounding a log scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRange {
    pub start_block: u64,
    pub end_block: BlockTag,
}

impl BlockRange {
    pub fn new(start_block: u64, end_block: BlockTag) -> Self {
        Self {
            start_block,
            end_block,
        }
    }

    /// Whether `block` falls inside the range, resolving `Latest` against `head`.
    pub fn contains(&self, block: u64, head: u64) -> bool {
        let end = self.end_block.number().unwrap_or(head);
        block >= self.start_block && block <= end
    }
}

impl fmt::Display for BlockRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.start_block, self.end_block)
    }
}

/// One side of a time window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowBound {
    At(UnixSecs),
    Now,
}

/// Wall-clock window a report covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: WindowBound,
    pub end: WindowBound,
}

impl TimeWindow {
    pub fn new(start: WindowBound, end: WindowBound) -> Self {
        Self { start, end }
    }

    /// Window from a fixed start until the live chain tip.
    pub fn since(start: UnixSecs) -> Self {
        Self::new(WindowBound::At(start), WindowBound::Now)
    }
}
