//! LRU Snapshot Cache - a bounded in-memory cache
//!
//! Provides LRU eviction, optional TTL expiry swept in the background and
//! durable JSON snapshots. An optional HTTP surface exposes a
//! `Cache<String, serde_json::Value>`.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::{Cache, CacheStore, SnapshotView};
pub use config::{CacheConfig, ServerConfig};
pub use error::{CacheError, Result};
pub use tasks::SweeperState;
