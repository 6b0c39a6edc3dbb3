//! Response DTOs for the cache server API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;
use serde_json::Value;

use crate::cache::{CacheStats, SnapshotView};
use crate::tasks::SweeperState;

/// Response body for the GET operation (GET /get/:key)
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    /// The requested key
    pub key: String,
    /// The stored value
    pub value: Value,
}

impl GetResponse {
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// Acknowledgement for mutating operations on a single key
/// (PUT /set, DELETE /del/:key)
#[derive(Debug, Clone, Serialize)]
pub struct KeyResponse {
    /// Success message
    pub message: String,
    /// The key that was affected
    pub key: String,
}

impl KeyResponse {
    pub fn set(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' set successfully", key),
            key,
        }
    }

    pub fn deleted(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' deleted successfully", key),
            key,
        }
    }
}

/// Response body for POST /clear
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    pub message: String,
    /// Entries dropped by the clear
    pub cleared: usize,
}

/// Response body for GET /view
///
/// Entries are listed most recently used first.
#[derive(Debug, Clone, Serialize)]
pub struct ViewResponse {
    pub keys: Vec<String>,
    pub values: Vec<Value>,
    pub head: Option<String>,
    pub tail: Option<String>,
}

impl From<SnapshotView<String, Value>> for ViewResponse {
    fn from(view: SnapshotView<String, Value>) -> Self {
        let SnapshotView {
            mut values,
            order,
            head,
            tail,
        } = view;
        let values = order
            .iter()
            .map(|key| values.remove(key).unwrap_or(Value::Null))
            .collect();

        Self {
            keys: order,
            values,
            head,
            tail,
        }
    }
}

/// Response body for snapshot writes and loads
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotResponse {
    pub message: String,
    /// Number of entries written or loaded
    pub entries: usize,
    pub path: String,
}

/// Response body for sweeper control endpoints
#[derive(Debug, Clone, Serialize)]
pub struct SweeperResponse {
    pub state: SweeperState,
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Number of cache hits
    pub hits: u64,
    /// Number of cache misses
    pub misses: u64,
    /// Number of capacity evictions
    pub evictions: u64,
    /// Number of sweep removals
    pub expirations: u64,
    /// Current number of entries in cache
    pub total_entries: usize,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl From<CacheStats> for StatsResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            hits: stats.hits,
            misses: stats.misses,
            evictions: stats.evictions,
            expirations: stats.expirations,
            total_entries: stats.total_entries,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn test_key_response_messages() {
        let set = serde_json::to_string(&KeyResponse::set("my_key")).unwrap();
        assert!(set.contains("my_key"));
        assert!(set.contains("set successfully"));

        let deleted = serde_json::to_string(&KeyResponse::deleted("gone")).unwrap();
        assert!(deleted.contains("deleted successfully"));
    }

    #[test]
    fn test_view_response_keeps_order() {
        let view = SnapshotView {
            values: HashMap::from([
                ("a".to_string(), json!(1)),
                ("b".to_string(), json!({"x": true})),
            ]),
            order: vec!["b".to_string(), "a".to_string()],
            head: Some("b".to_string()),
            tail: Some("a".to_string()),
        };

        let json = serde_json::to_value(ViewResponse::from(view)).unwrap();
        assert_eq!(json["keys"], json!(["b", "a"]));
        assert_eq!(json["values"], json!([{"x": true}, 1]));
        assert_eq!(json["head"], json!("b"));
    }

    #[test]
    fn test_stats_response_hit_rate() {
        let stats = CacheStats {
            hits: 80,
            misses: 20,
            evictions: 5,
            expirations: 2,
            total_entries: 100,
        };
        let resp = StatsResponse::from(stats);
        assert!((resp.hit_rate - 0.8).abs() < 0.001);
        assert_eq!(resp.expirations, 2);
    }

    #[test]
    fn test_sweeper_state_serializes_lowercase() {
        let resp = SweeperResponse {
            state: SweeperState::Running,
        };
        assert_eq!(serde_json::to_value(resp).unwrap(), json!({"state": "running"}));
    }

    #[test]
    fn test_health_response_serialize() {
        let json = serde_json::to_string(&HealthResponse::healthy()).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }
}
