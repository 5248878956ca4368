//! Core type aliases

/// Global node index, chunk number or node count.
///
/// Sparse trees address nodes far beyond the range of any machine word, so
/// every index-like quantity is an arbitrary precision unsigned integer.
pub type Id = num_bigint::BigUint;

/// Standard Result type for the crate
pub type Result<T> = std::result::Result<T, crate::core::error::Error>;
