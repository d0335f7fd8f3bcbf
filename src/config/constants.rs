//! # relq Configuration Constants
//!
//! This module centralizes the tuning constants used by the execution core.
//! Interdependent values are co-located and their relationships enforced
//! through compile-time assertions.
//!
//! ## Dependency Graph
//!
//! ```text
//! DEFAULT_BLOCK_SIZE (400 bytes)
//!       │
//!       └─> records per block = DEFAULT_BLOCK_SIZE / slot size
//!             slot size = RECORD_FLAG_SIZE + Σ field sizes
//!             field size = INT_FIELD_SIZE          (Int)
//!                        = STR_LENGTH_PREFIX + n   (Str(n))
//!             MIN_BLOCK_SIZE guarantees at least one Int field fits
//!
//! HASH_JOIN_BUCKETS (100)
//!       │
//!       └─> number of temp tables per join side, at most
//! ```
//!
//! ## Critical Invariants
//!
//! 1. `DEFAULT_BLOCK_SIZE >= MIN_BLOCK_SIZE`
//! 2. `HASH_JOIN_BUCKETS > 0` (bucket index is `hash mod HASH_JOIN_BUCKETS`)
//!
//! ## Usage
//!
//! ```ignore
//! use relq::config::{DEFAULT_BLOCK_SIZE, HASH_JOIN_BUCKETS};
//! ```

// ============================================================================
// RECORD LAYOUT
// Used by cost formulas to turn record counts into block counts
// ============================================================================

/// Size of a block in bytes. Cost estimates are expressed in blocks.
pub const DEFAULT_BLOCK_SIZE: usize = 400;

/// Per-slot in-use flag.
pub const RECORD_FLAG_SIZE: usize = 4;

/// Bytes occupied by an integer field.
pub const INT_FIELD_SIZE: usize = 8;

/// Length prefix stored in front of every string field.
pub const STR_LENGTH_PREFIX: usize = 4;

/// Smallest block that can hold a record with a single integer field.
pub const MIN_BLOCK_SIZE: usize = RECORD_FLAG_SIZE + INT_FIELD_SIZE;

const _: () = assert!(
    DEFAULT_BLOCK_SIZE >= MIN_BLOCK_SIZE,
    "DEFAULT_BLOCK_SIZE must hold at least one single-field record"
);

// ============================================================================
// JOIN CONFIGURATION
// ============================================================================

/// Number of partitions used by the hash join on each side.
pub const HASH_JOIN_BUCKETS: usize = 100;

const _: () = assert!(HASH_JOIN_BUCKETS > 0, "HASH_JOIN_BUCKETS must be non-zero");

// ============================================================================
// ESTIMATION
// ============================================================================

/// Reduction factor assumed for range comparisons (`<`, `>`, `<=`, `>=`, `<>`)
/// when no histogram is available.
pub const RANGE_REDUCTION_FACTOR: usize = 3;

/// Prefix of names given to temporary tables.
pub const TEMP_TABLE_PREFIX: &str = "temp";
