//! Error types for the cache
//!
//! Provides unified error handling using thiserror.
//!
//! A lookup miss is not an error: `get` returns `None` and `remove_key`
//! returns `false`. `NotFound` exists only so the HTTP layer can map a
//! miss to a 404.

use std::io;
use std::path::PathBuf;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Invalid construction parameters
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A value could not be encoded into the snapshot format
    #[error("Snapshot serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),

    /// Writing or replacing the snapshot file failed
    #[error("Failed to persist snapshot to {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Snapshot file missing, unreadable or structurally invalid
    #[error("Failed to load snapshot from {}: {reason}", path.display())]
    Load { path: PathBuf, reason: String },

    /// Key not found in cache
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Internal invariant failure
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CacheError {
    pub(crate) fn load(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        CacheError::Load {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_) | CacheError::Config(_) => StatusCode::BAD_REQUEST,
            CacheError::Serialization(_) => StatusCode::UNPROCESSABLE_ENTITY,
            CacheError::Load { .. } => StatusCode::CONFLICT,
            CacheError::Persistence { .. } | CacheError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
