//! TTL Cleanup Task
//!
//! Background task that periodically removes expired cache entries.

use std::sync::{Arc, Weak};

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::error::{CacheError, Result};

// == Sweep ==
/// Something whose expired entries can be removed in one pass.
pub trait Sweep: Send + Sync + 'static {
    /// Removes expired entries and returns how many were removed.
    fn sweep_expired(&self) -> usize;
}

/// Spawns a background task that periodically sweeps `target`.
///
/// The sweep runs on tokio's blocking pool and is awaited before the next
/// tick, so passes never overlap. The task holds only a weak reference and
/// exits once `target` has been dropped.
///
/// # Errors
/// `CacheError::RuntimeUnavailable` when called outside a tokio runtime.
///
/// # Example
/// ```ignore
/// let handle = spawn_cleanup_task(Arc::downgrade(&shards), Duration::from_secs(60))?;
/// // Later, during shutdown:
/// handle.abort();
/// ```
pub fn spawn_cleanup_task<S: Sweep>(
    target: Weak<S>,
    interval: std::time::Duration,
) -> Result<JoinHandle<()>> {
    let runtime = Handle::try_current().map_err(|_| CacheError::RuntimeUnavailable)?;

    Ok(runtime.spawn(async move {
        info!(
            "Starting TTL cleanup task with interval of {}ms",
            interval.as_millis()
        );

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;

            let Some(target) = target.upgrade() else {
                debug!("TTL cleanup: cache dropped, stopping task");
                return;
            };

            let removed = match run_sweep(target).await {
                Ok(removed) => removed,
                Err(e) => {
                    warn!("TTL cleanup: sweep did not complete: {}", e);
                    continue;
                }
            };

            if removed > 0 {
                info!("TTL cleanup: removed {} expired entries", removed);
            } else {
                debug!("TTL cleanup: no expired entries found");
            }
        }
    }))
}

async fn run_sweep<S: Sweep>(target: Arc<S>) -> std::result::Result<usize, tokio::task::JoinError> {
    tokio::task::spawn_blocking(move || target.sweep_expired()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct CountingSweeper {
        passes: AtomicUsize,
    }

    impl Sweep for CountingSweeper {
        fn sweep_expired(&self) -> usize {
            self.passes.fetch_add(1, Ordering::SeqCst);
            0
        }
    }

    #[tokio::test]
    async fn test_cleanup_task_sweeps_periodically() {
        let sweeper = Arc::new(CountingSweeper::default());
        let handle =
            spawn_cleanup_task(Arc::downgrade(&sweeper), Duration::from_millis(20)).unwrap();

        tokio::time::sleep(Duration::from_millis(200)).await;
        handle.abort();

        assert!(sweeper.passes.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn test_cleanup_task_skips_immediate_tick() {
        let sweeper = Arc::new(CountingSweeper::default());
        let handle =
            spawn_cleanup_task(Arc::downgrade(&sweeper), Duration::from_secs(3600)).unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(sweeper.passes.load(Ordering::SeqCst), 0);

        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_can_be_aborted() {
        let sweeper = Arc::new(CountingSweeper::default());
        let handle = spawn_cleanup_task(Arc::downgrade(&sweeper), Duration::from_secs(1)).unwrap();

        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }

    #[tokio::test]
    async fn test_cleanup_task_stops_when_target_dropped() {
        let sweeper = Arc::new(CountingSweeper::default());
        let handle =
            spawn_cleanup_task(Arc::downgrade(&sweeper), Duration::from_millis(10)).unwrap();

        drop(sweeper);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(handle.is_finished(), "Task should exit once target is gone");
    }

    #[test]
    fn test_cleanup_task_requires_runtime() {
        let sweeper = Arc::new(CountingSweeper::default());
        let result = spawn_cleanup_task(Arc::downgrade(&sweeper), Duration::from_secs(1));
        assert!(matches!(result, Err(CacheError::RuntimeUnavailable)));
    }
}
