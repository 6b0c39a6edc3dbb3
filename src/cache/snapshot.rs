//! Cache snapshot persistence
//!
//! Snapshots are JSON documents holding two parallel arrays:
//!
//! ```json
//! {"keys": [...], "values": [...]}
//! ```
//!
//! `keys[i]` maps to `values[i]`, most recently used first. Keys are kept in
//! an array rather than as object fields so non-string keys survive.
//!
//! Each write stages into its own `.tmp` sibling, syncs it and renames it
//! over the target. Where the rename is refused because the target exists
//! the target is removed first. That fallback is not crash-atomic: a crash
//! between the remove and the rename leaves no snapshot on disk.

use std::collections::HashSet;
use std::hash::Hash;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::cache::{CacheStore, SnapshotView};
use crate::error::{CacheError, Result};

// == Snapshot File ==
/// On-disk snapshot layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotFile<K, V> {
    pub keys: Vec<K>,
    pub values: Vec<V>,
}

impl<K, V> SnapshotFile<K, V>
where
    K: Hash + Eq,
{
    /// Lays out a view as parallel arrays in recency order.
    pub fn from_view(view: SnapshotView<K, V>) -> Result<Self> {
        let SnapshotView {
            mut values, order, ..
        } = view;

        let ordered_values = order
            .iter()
            .map(|key| values.remove(key))
            .collect::<Option<Vec<V>>>()
            .ok_or_else(|| {
                CacheError::Internal("snapshot view is missing a value for a live key".to_string())
            })?;

        Ok(Self {
            keys: order,
            values: ordered_values,
        })
    }

    /// Pairs keys with values, rejecting structurally invalid files.
    pub fn into_entries(self) -> std::result::Result<Vec<(K, V)>, String> {
        if self.keys.len() != self.values.len() {
            return Err(format!(
                "mismatched lengths: {} keys, {} values",
                self.keys.len(),
                self.values.len()
            ));
        }

        {
            let mut seen = HashSet::with_capacity(self.keys.len());
            if !self.keys.iter().all(|key| seen.insert(key)) {
                return Err("duplicate key".to_string());
            }
        }

        Ok(self.keys.into_iter().zip(self.values).collect())
    }
}

static STAGING_SEQ: AtomicU64 = AtomicU64::new(0);

/// Sibling path a single write stages into before replacing the target.
///
/// Concurrent writers never share a staging file.
pub fn temp_path(path: &Path, seq: u64) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(format!(".{}.{}.tmp", std::process::id(), seq));
    path.with_file_name(name)
}

// == Write ==
/// Persists the store's contents to `path`.
///
/// The view is copied under the store lock; serialization and file I/O run
/// after the lock is released. A value that cannot be encoded aborts the
/// write before anything touches the disk.
///
/// Returns the number of entries written.
pub async fn write_snapshot<K, V>(store: &Mutex<CacheStore<K, V>>, path: &Path) -> Result<usize>
where
    K: Hash + Eq + Clone + Serialize,
    V: Clone + Serialize,
{
    let view = store.lock().await.snapshot_view();
    let snapshot = SnapshotFile::from_view(view)?;
    let count = snapshot.keys.len();

    let bytes = serde_json::to_vec(&snapshot).map_err(CacheError::Serialization)?;

    let staging = temp_path(path, STAGING_SEQ.fetch_add(1, Ordering::Relaxed));
    if let Err(source) = write_synced(&staging, &bytes).await {
        let _ = fs::remove_file(&staging).await;
        return Err(CacheError::Persistence {
            path: staging,
            source,
        });
    }

    if let Err(source) = replace(&staging, path).await {
        let _ = fs::remove_file(&staging).await;
        return Err(CacheError::Persistence {
            path: path.to_path_buf(),
            source,
        });
    }

    info!("Cache snapshot saved: {} entries to {}", count, path.display());
    Ok(count)
}

async fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await
}

/// Renames `staging` over `target`, removing `target` first only if the
/// rename was refused because `target` already exists.
async fn replace(staging: &Path, target: &Path) -> std::io::Result<()> {
    let err = match fs::rename(staging, target).await {
        Ok(()) => return Ok(()),
        Err(err) => err,
    };

    let refused = matches!(
        err.kind(),
        ErrorKind::AlreadyExists | ErrorKind::PermissionDenied
    );
    if !refused
        || !fs::try_exists(staging).await.unwrap_or(false)
        || !fs::try_exists(target).await.unwrap_or(false)
    {
        return Err(err);
    }

    warn!(
        error = %err,
        "Atomic replace of {} failed, falling back to remove-then-rename",
        target.display()
    );
    fs::remove_file(target).await?;
    fs::rename(staging, target).await
}

// == Load ==
/// Replaces the store's contents with the snapshot at `path`.
///
/// The file is read, decoded and validated before the store is locked, so a
/// failed load leaves the cache untouched.
///
/// Returns the number of entries loaded.
pub async fn load_snapshot<K, V>(store: &Mutex<CacheStore<K, V>>, path: &Path) -> Result<usize>
where
    K: Hash + Eq + Clone + DeserializeOwned,
    V: DeserializeOwned,
{
    let bytes = fs::read(path)
        .await
        .map_err(|e| CacheError::load(path, e.to_string()))?;

    let snapshot: SnapshotFile<K, V> = serde_json::from_slice(&bytes)
        .map_err(|e| CacheError::load(path, format!("malformed snapshot: {}", e)))?;

    let entries = snapshot
        .into_entries()
        .map_err(|reason| CacheError::load(path, reason))?;

    let loaded = store.lock().await.restore(entries);

    info!("Cache snapshot loaded: {} entries from {}", loaded, path.display());
    Ok(loaded)
}
