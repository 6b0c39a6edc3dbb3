//! API Handlers
//!
//! HTTP request handlers for each cache server endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;

use crate::cache::Cache;
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::models::{
    ClearResponse, GetResponse, HealthResponse, KeyResponse, SetRequest, SnapshotResponse,
    StatsResponse, SweeperResponse, ViewResponse,
};

/// Cache type served over HTTP: string keys, arbitrary JSON values.
pub type JsonCache = Cache<String, Value>;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<JsonCache>,
}

impl AppState {
    /// Wraps an existing cache.
    pub fn new(cache: JsonCache) -> Self {
        Self {
            cache: Arc::new(cache),
        }
    }

    /// Builds the cache from configuration.
    ///
    /// Starts the expiry sweeper when a TTL is configured, so this must run
    /// inside a Tokio runtime.
    pub fn from_config(config: CacheConfig) -> Result<Self> {
        Ok(Self::new(Cache::new(config)?))
    }
}

/// Handler for PUT /set
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<KeyResponse>> {
    req.validate()?;
    state.cache.put(req.key.clone(), req.value).await;

    Ok(Json(KeyResponse::set(req.key)))
}

/// Handler for GET /get/:key
///
/// A miss maps to 404; the server never fills the cache on its own.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    match state.cache.get(key.as_str()).await {
        Some(value) => Ok(Json(GetResponse::new(key, value))),
        None => Err(CacheError::NotFound(key)),
    }
}

/// Handler for DELETE /del/:key
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<KeyResponse>> {
    if state.cache.remove_key(key.as_str()).await {
        Ok(Json(KeyResponse::deleted(key)))
    } else {
        Err(CacheError::NotFound(key))
    }
}

/// Handler for POST /clear
pub async fn clear_handler(State(state): State<AppState>) -> Json<ClearResponse> {
    let cleared = {
        let store = state.cache.store();
        let mut guard = store.lock().await;
        let count = guard.len();
        guard.clear_all();
        count
    };

    Json(ClearResponse {
        message: "Cache cleared".to_string(),
        cleared,
    })
}

/// Handler for GET /view
pub async fn view_handler(State(state): State<AppState>) -> Json<ViewResponse> {
    Json(state.cache.snapshot_view().await.into())
}

/// Handler for POST /snapshot/write
pub async fn write_snapshot_handler(
    State(state): State<AppState>,
) -> Result<Json<SnapshotResponse>> {
    let entries = state.cache.write_snapshot().await?;

    Ok(Json(SnapshotResponse {
        message: "Snapshot written".to_string(),
        entries,
        path: state.cache.config().snapshot_path.display().to_string(),
    }))
}

/// Handler for POST /snapshot/load
pub async fn load_snapshot_handler(
    State(state): State<AppState>,
) -> Result<Json<SnapshotResponse>> {
    let entries = state.cache.load_snapshot().await?;

    Ok(Json(SnapshotResponse {
        message: "Snapshot loaded".to_string(),
        entries,
        path: state.cache.config().snapshot_path.display().to_string(),
    }))
}

/// Handler for POST /sweeper/stop
pub async fn stop_sweeper_handler(State(state): State<AppState>) -> Json<SweeperResponse> {
    state.cache.stop_sweeper().await;
    Json(SweeperResponse {
        state: state.cache.sweeper_state().await,
    })
}

/// Handler for POST /sweeper/restart
///
/// Reports `stopped` when the cache has no TTL configured.
pub async fn restart_sweeper_handler(State(state): State<AppState>) -> Json<SweeperResponse> {
    state.cache.restart_sweeper().await;
    Json(SweeperResponse {
        state: state.cache.sweeper_state().await,
    })
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(state.cache.stats().await.into())
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn state() -> AppState {
        AppState::from_config(CacheConfig::new(100, "unused.json")).unwrap()
    }

    fn set_request(key: &str, value: Value) -> Json<SetRequest> {
        Json(SetRequest {
            key: key.to_string(),
            value,
        })
    }

    #[tokio::test]
    async fn test_set_and_get_handler() {
        let state = state();

        let result = set_handler(State(state.clone()), set_request("test_key", json!([1, 2]))).await;
        assert!(result.is_ok());

        let response = get_handler(State(state), Path("test_key".to_string()))
            .await
            .unwrap();
        assert_eq!(response.value, json!([1, 2]));
    }

    #[tokio::test]
    async fn test_get_nonexistent_key() {
        let result = get_handler(State(state()), Path("nonexistent".to_string())).await;
        assert!(matches!(result, Err(CacheError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_handler() {
        let state = state();
        set_handler(State(state.clone()), set_request("to_delete", json!("v")))
            .await
            .unwrap();

        let result = delete_handler(State(state.clone()), Path("to_delete".to_string())).await;
        assert!(result.is_ok());

        let result = delete_handler(State(state), Path("to_delete".to_string())).await;
        assert!(matches!(result, Err(CacheError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_clear_handler() {
        let state = state();
        for key in ["a", "b"] {
            set_handler(State(state.clone()), set_request(key, json!(0)))
                .await
                .unwrap();
        }

        let response = clear_handler(State(state.clone())).await;
        assert_eq!(response.cleared, 2);
        assert!(state.cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_set_invalid_request() {
        let result = set_handler(State(state()), set_request("", json!("value"))).await;
        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }
}
