//! Error types for the clustering engine.

use crate::index::ClusterId;
use thiserror::Error;

/// Errors surfaced by index builds and cluster navigation.
///
/// Invalid input points are not fatal: the build drops them and reports the
/// count through [`BuildStats`](crate::index::BuildStats). `InvalidPoint` is
/// produced by the validation helpers for callers that want the reason.
#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("invalid point: {0}")]
    InvalidPoint(String),

    /// The id does not belong to the index it was used against, most often
    /// because it was issued by an earlier build. Re-query the viewport.
    #[error("unknown cluster id {0}")]
    UnknownClusterId(ClusterId),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A background rebuild could not be started or did not finish.
    #[error("rebuild worker failed: {0}")]
    Worker(String),

    #[cfg(feature = "toml")]
    #[error("toml error: {0}")]
    Toml(String),
}

pub type Result<T> = std::result::Result<T, ClusterError>;
