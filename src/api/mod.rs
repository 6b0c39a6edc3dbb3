//! API Module
//!
//! HTTP handlers and routing exposing a `Cache<String, serde_json::Value>`.
//!
//! # Endpoints
//! - `PUT /set` - Store a key-value pair
//! - `GET /get/:key` - Retrieve a value by key
//! - `DELETE /del/:key` - Delete a key
//! - `POST /clear` - Drop every entry
//! - `GET /view` - Keys and values in recency order
//! - `POST /snapshot/write` - Persist the cache to its snapshot file
//! - `POST /snapshot/load` - Replace the cache with the snapshot file
//! - `POST /sweeper/stop` - Stop the expiry sweeper
//! - `POST /sweeper/restart` - Restart the expiry sweeper
//! - `GET /stats` - Cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
