//! Expiry Sweeper
//!
//! Background task that periodically removes expired cache entries.
//!
//! The sweeper is either `Stopped` or `Running`. Stopping is cooperative:
//! the stop signal is checked between ticks, a sweep in progress always
//! finishes, and `stop` waits for the task to exit so no sweep runs after
//! it returns.

use std::hash::Hash;
use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::cache::CacheStore;

/// Cache engine shared between callers and the sweeper.
pub type SharedStore<K, V> = Arc<Mutex<CacheStore<K, V>>>;

/// Whether a sweep task is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SweeperState {
    Stopped,
    Running,
}

#[derive(Debug)]
struct RunningSweep {
    stop_tx: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

// == Sweeper ==
/// Owns the sweep task and its stop signal.
#[derive(Debug)]
pub struct Sweeper {
    interval: Duration,
    running: Option<RunningSweep>,
}

impl Sweeper {
    /// Creates a stopped sweeper ticking every `interval`.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            running: None,
        }
    }

    pub fn state(&self) -> SweeperState {
        match self.running {
            Some(_) => SweeperState::Running,
            None => SweeperState::Stopped,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    // == Start ==
    /// Spawns the sweep task. No-op if already running.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start<K, V>(&mut self, store: &SharedStore<K, V>)
    where
        K: Hash + Eq + Clone + Send + 'static,
        V: Send + 'static,
    {
        if self.running.is_some() {
            return;
        }
        let (stop_tx, stop_rx) = oneshot::channel();
        let handle = spawn_sweep_task(Arc::downgrade(store), self.interval, stop_rx);
        self.running = Some(RunningSweep { stop_tx, handle });
    }

    // == Stop ==
    /// Signals the task and waits for it to exit. Removes nothing itself.
    pub async fn stop(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };
        let _ = running.stop_tx.send(());
        if let Err(err) = running.handle.await {
            if err.is_panic() {
                error!("Expiry sweeper panicked: {}", err);
            }
        }
    }

    // == Restart ==
    /// Stops the current task, if any, and starts a fresh one. The first
    /// sweep runs one interval after the restart.
    pub async fn restart<K, V>(&mut self, store: &SharedStore<K, V>)
    where
        K: Hash + Eq + Clone + Send + 'static,
        V: Send + 'static,
    {
        self.stop().await;
        self.start(store);
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        if let Some(running) = self.running.take() {
            running.handle.abort();
        }
    }
}

/// Spawns the periodic sweep loop.
///
/// Each tick takes the store lock once, scans every live entry and removes
/// those whose expiry time has passed. The task holds only a weak reference
/// and exits on its own once the store is dropped.
///
/// # Arguments
/// * `store` - Weak reference to the shared cache engine
/// * `interval` - Time between sweeps; the first sweep runs after one interval
/// * `stop_rx` - Resolves when the owner asks the task to exit
pub fn spawn_sweep_task<K, V>(
    store: Weak<Mutex<CacheStore<K, V>>>,
    interval: Duration,
    mut stop_rx: oneshot::Receiver<()>,
) -> JoinHandle<()>
where
    K: Hash + Eq + Clone + Send + 'static,
    V: Send + 'static,
{
    tokio::spawn(async move {
        info!(
            "Starting expiry sweeper with interval of {} ms",
            interval.as_millis()
        );

        let mut ticker = time::interval_at(Instant::now() + interval, interval);
        // Late ticks are pushed back rather than bunched up
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = &mut stop_rx => break,
                _ = ticker.tick() => {}
            }

            let Some(store) = store.upgrade() else {
                debug!("Cache dropped, expiry sweeper exiting");
                break;
            };

            let removed = {
                let mut guard = store.lock().await;
                guard.sweep_expired(Utc::now())
            };

            if removed > 0 {
                info!("Expiry sweep: removed {} expired entries", removed);
            } else {
                debug!("Expiry sweep: no expired entries found");
            }
        }

        info!("Expiry sweeper stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TICK: Duration = Duration::from_millis(100);

    fn shared(ttl: Duration) -> SharedStore<String, String> {
        Arc::new(Mutex::new(CacheStore::new(100, Some(ttl)).unwrap()))
    }

    async fn put(store: &SharedStore<String, String>, key: &str) {
        store
            .lock()
            .await
            .put(key.to_string(), "value".to_string());
    }

    async fn contains(store: &SharedStore<String, String>, key: &str) -> bool {
        store.lock().await.contains_key(key)
    }

    #[tokio::test]
    async fn test_sweeper_removes_expired_entries() {
        let store = shared(Duration::from_millis(200));
        put(&store, "expire_soon").await;

        let mut sweeper = Sweeper::new(TICK);
        sweeper.start(&store);
        assert_eq!(sweeper.state(), SweeperState::Running);

        time::sleep(Duration::from_millis(100)).await;
        assert!(contains(&store, "expire_soon").await);

        time::sleep(Duration::from_millis(300)).await;
        assert!(!contains(&store, "expire_soon").await);
        assert_eq!(store.lock().await.stats().expirations, 1);

        sweeper.stop().await;
    }

    #[tokio::test]
    async fn test_sweeper_preserves_valid_entries() {
        let store = shared(Duration::from_secs(3600));
        put(&store, "long_lived").await;

        let mut sweeper = Sweeper::new(TICK);
        sweeper.start(&store);

        time::sleep(Duration::from_millis(350)).await;
        assert!(contains(&store, "long_lived").await);

        sweeper.stop().await;
    }

    #[tokio::test]
    async fn test_stop_removes_nothing_and_halts_sweeps() {
        let store = shared(Duration::from_millis(100));
        let mut sweeper = Sweeper::new(TICK);
        sweeper.start(&store);

        sweeper.stop().await;
        assert_eq!(sweeper.state(), SweeperState::Stopped);

        put(&store, "survivor").await;
        time::sleep(Duration::from_millis(400)).await;

        // Expired, but nothing sweeps while stopped
        assert!(contains(&store, "survivor").await);
        assert_eq!(store.lock().await.stats().expirations, 0);
    }

    #[tokio::test]
    async fn test_restart_sweeps_after_first_tick() {
        let store = shared(Duration::from_millis(50));
        let mut sweeper = Sweeper::new(Duration::from_millis(300));

        put(&store, "stale").await;
        time::sleep(Duration::from_millis(100)).await;

        sweeper.restart(&store).await;
        assert_eq!(sweeper.state(), SweeperState::Running);

        // Not swept before the first tick after restart
        time::sleep(Duration::from_millis(100)).await;
        assert!(contains(&store, "stale").await);

        time::sleep(Duration::from_millis(350)).await;
        assert!(!contains(&store, "stale").await);

        sweeper.stop().await;
    }

    #[tokio::test]
    async fn test_start_is_idempotent() {
        let store = shared(Duration::from_secs(60));
        let mut sweeper = Sweeper::new(TICK);

        sweeper.start(&store);
        sweeper.start(&store);
        assert_eq!(sweeper.state(), SweeperState::Running);

        sweeper.stop().await;
        sweeper.stop().await;
        assert_eq!(sweeper.state(), SweeperState::Stopped);
    }

    #[tokio::test]
    async fn test_task_exits_when_store_dropped() {
        let store = shared(Duration::from_secs(60));
        let (_stop_tx, stop_rx) = oneshot::channel();
        let handle = spawn_sweep_task(Arc::downgrade(&store), TICK, stop_rx);

        drop(store);
        time::sleep(Duration::from_millis(250)).await;

        assert!(handle.is_finished(), "Task should exit once the store is gone");
    }
}
