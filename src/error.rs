//! Structured error types for the foldcode crate.

use thiserror::Error;

/// Unified error type for all foldcode operations.
#[derive(Debug, Error)]
pub enum FoldcodeError {
    /// Model asset cannot be parsed or has inconsistent dimensions.
    #[error("malformed model asset: {0}")]
    AssetMalformed(String),

    /// Coordinate arrays of unequal length.
    #[error("coordinate arrays differ in length: ca={ca}, n={n}, c={c}, cb={cb}")]
    InputShapeMismatch {
        ca: usize,
        n: usize,
        c: usize,
        cb: usize,
    },

    /// Coincident atoms prevent unit-vector construction. Recovered per
    /// residue by the encoder; surfaces only from direct geometry calls.
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, FoldcodeError>;
