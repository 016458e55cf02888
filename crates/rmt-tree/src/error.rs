//! Error types for the tree layer.

use crate::clock::LamportTs;
use thiserror::Error;

/// Errors that can occur while applying move operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// An incoming operation carried a timestamp already present in the log.
    /// Timestamps are unique across the system by construction, so this is a
    /// protocol violation by the sender, not a concurrency artifact.
    #[error("operation timestamp {0} duplicates an applied operation")]
    DuplicateTimestamp(LamportTs),
}

pub type Result<T> = std::result::Result<T, TreeError>;
