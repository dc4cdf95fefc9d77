//! Error types for the nearfield library.
//!
//! All crates return `NearfieldResult<T>` from fallible operations.
//! Errors surface at the call boundary on the host; there is no
//! in-kernel error channel, so a failed call leaves no partial results
//! a caller may rely on.

use thiserror::Error;

/// Unified error type for the nearfield library.
#[derive(Debug, Error)]
pub enum NearfieldError {
    /// A build or find submitted more elements than the index was sized for.
    /// Recoverable by constructing a new index with a larger capacity.
    #[error("capacity exceeded: {requested} elements for an index sized for {capacity}")]
    CapacityExceeded {
        requested: usize,
        capacity: usize,
    },

    /// A caller buffer does not divide into the expected per-query rows.
    #[error("buffer shape mismatch: {0}")]
    BufferShapeMismatch(String),

    /// The element encoding of a caller buffer is not accepted by this call.
    #[error("unsupported encoding: {0}")]
    EncodingUnsupported(String),

    /// The backing allocator refused the request.
    #[error("allocation failed: {requested} bytes requested, {remaining} available")]
    AllocationFailed {
        requested: usize,
        remaining: usize,
    },

    /// The kernel library refused to produce a compute pipeline.
    #[error("pipeline creation failed: {0}")]
    PipelineCreationFailed(String),

    /// A configuration value is invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Convenience alias for `Result<T, NearfieldError>`.
pub type NearfieldResult<T> = Result<T, NearfieldError>;
