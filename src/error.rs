//! # Construction errors
//!
//! Only malformed input is reported through `Error`. Conditions found while solving (an infeasible
//! node, an unbounded relaxation, a limit that was hit) are statuses in the solve results, so that
//! a caller can tell "no feasible solution exists" apart from "the input was wrong".
use thiserror::Error;

/// Input that could not be turned into a model or a partition.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The arrays describing a model are inconsistent.
    ///
    /// The contained `String` is a message for the end user.
    #[error("malformed model: {0}")]
    MalformedModel(String),
    /// A block partition does not fit the model it should partition.
    #[error("invalid partition: {0}")]
    InvalidPartition(String),
}

/// Result type for model and partition construction.
pub type Result<T> = std::result::Result<T, Error>;
