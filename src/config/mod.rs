//! # relq Configuration Module
//!
//! Tuning constants live in [`constants`]; per-engine settings live in
//! [`EngineConfig`], which is carried by every
//! [`Transaction`](crate::storage::Transaction) so that operators never reach
//! for global state.
//!
//! ## Configuration Options
//!
//! | Option        | Default             | Description                                  |
//! |---------------|---------------------|----------------------------------------------|
//! | block_size    | `DEFAULT_BLOCK_SIZE`| Block size used by cost estimates            |
//! | hash_buckets  | `HASH_JOIN_BUCKETS` | Partitions per side in the hash join         |
//! | join_strategy | `JoinStrategy::Hash`| Equijoin operator chosen by the planner      |
//!
//! ## Usage
//!
//! ```ignore
//! let config = EngineConfig::default()
//!     .with_block_size(4096)
//!     .with_join_strategy(JoinStrategy::Merge);
//! let tx = Transaction::new(config);
//! ```

pub mod constants;
pub use constants::*;

/// Equijoin algorithm the table planner uses when a join predicate connects
/// a candidate table to the accumulated plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinStrategy {
    #[default]
    Hash,
    NestedLoop,
    Merge,
}

impl JoinStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            JoinStrategy::Hash => "hash",
            JoinStrategy::NestedLoop => "nested_loop",
            JoinStrategy::Merge => "merge",
        }
    }
}

impl std::str::FromStr for JoinStrategy {
    type Err = eyre::Report;

    fn from_str(s: &str) -> eyre::Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "hash" => Ok(JoinStrategy::Hash),
            "nested_loop" | "nested" => Ok(JoinStrategy::NestedLoop),
            "merge" => Ok(JoinStrategy::Merge),
            other => eyre::bail!("unknown join strategy '{}'", other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    block_size: usize,
    hash_buckets: usize,
    join_strategy: JoinStrategy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            hash_buckets: HASH_JOIN_BUCKETS,
            join_strategy: JoinStrategy::default(),
        }
    }
}

impl EngineConfig {
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size.max(MIN_BLOCK_SIZE);
        self
    }

    pub fn with_hash_buckets(mut self, buckets: usize) -> Self {
        self.hash_buckets = buckets.max(1);
        self
    }

    pub fn with_join_strategy(mut self, strategy: JoinStrategy) -> Self {
        self.join_strategy = strategy;
        self
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn hash_buckets(&self) -> usize {
        self.hash_buckets
    }

    pub fn join_strategy(&self) -> JoinStrategy {
        self.join_strategy
    }
}
