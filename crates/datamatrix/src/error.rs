//! Error types for binding and configuring a [`DataMatrix`](crate::DataMatrix).
//!
//! Only configuration problems are reported through these types. Precondition
//! violations on the hot path (exemplar index out of range, zero total weight)
//! are programming errors and are checked with `debug_assert!` instead.

use crate::config::ConfigError;

/// Errors raised while binding an array or setting scale/weights.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DataMatrixError {
    #[error("dimension tags ({tags}) do not match array rank ({rank})")]
    RankMismatch { tags: usize, rank: usize },

    #[error("no data or dual axis tagged; cannot index exemplars")]
    NoDataAxis,

    #[error("array has no exemplars")]
    NoExemplars,

    #[error("weight index {index} out of range for {features} features")]
    WeightIndexOutOfRange { index: usize, features: usize },

    #[error("scale has {got} entries, expected {expected}")]
    ScaleLengthMismatch { expected: usize, got: usize },

    #[error("conversion does not fit a {vector_len}-element vector: {reason}")]
    ConversionMismatch { vector_len: usize, reason: String },

    #[error("no array bound; call set() first")]
    NotBound,

    #[error("weighted draw requested before the cumulative weights were built; call set_scale()")]
    WeightCacheNotBuilt,

    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
}

/// Errors raised while parsing textual dimension or conversion codes.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("unknown dimension code '{0}' (expected 'd', 'b' or 'f')")]
    UnknownDimCode(char),

    #[error("unknown encoding code '{0}'")]
    UnknownEncoding(char),

    #[error("conversion token '{token}' at position {position} must be exactly two codes")]
    MalformedToken { token: String, position: usize },
}
