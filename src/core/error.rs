//! Error types for cloudtile

use thiserror::Error;

/// Rejected structure parameters.
///
/// Raised only while building a [`Structure`](crate::structure::Structure).
/// A structure that constructs successfully never fails a lookup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Base depth too small: {base_depth} (minimum is 4)")]
    BaseDepthTooSmall { base_depth: u64 },

    #[error("Points per chunk not specified, but a cold depth was given")]
    MissingPointsPerChunk,

    #[error(
        "Invalid chunk specification {points_per_chunk} - \
         must be of the form 4^n for quadtree, or 8^n for octree (factor {factor})"
    )]
    InvalidPointsPerChunk { points_per_chunk: u64, factor: u64 },

    #[error("Invalid dimensions: {0} (expected 2 or 3)")]
    InvalidDimensions(u64),

    #[error("Sparse depth {sparse_depth} is shallower than the nominal chunk depth {nominal_depth}")]
    SparseDepthTooShallow { sparse_depth: u64, nominal_depth: u64 },
}

/// Main error type for the crate
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Streaming error: {0}")]
    Streaming(String),
}
