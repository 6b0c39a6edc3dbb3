//! Cache Module
//!
//! Bounded in-memory caching with LRU eviction, TTL expiry and JSON
//! snapshots.
//!
//! Layers, leaves first:
//! - [`EntryIndex`]: recency order and expiry timestamps
//! - [`ValueStore`]: key to value mapping
//! - [`CacheStore`]: the engine composing both under the LRU/TTL policy
//! - [`Cache`]: the shared handle that also drives the expiry sweeper
//! - [`snapshot`]: disk persistence

mod entry;
mod handle;
mod index;
pub mod snapshot;
mod stats;
mod store;
mod values;


// Re-export public types
pub use entry::{CacheEntry, SlotId};
pub use handle::Cache;
pub use index::{Entries, EntryIndex, Keys};
pub use snapshot::SnapshotFile;
pub use stats::CacheStats;
pub use store::{CacheStore, SnapshotView};
pub use values::ValueStore;
