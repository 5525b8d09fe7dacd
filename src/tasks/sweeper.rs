//! TTL Sweeper Task
//!
//! Background task that periodically purges expired memory cache entries.
//! Reads never depend on it; it only bounds how long dead entries stay resident.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::WeakMemoryCacheProvider;

/// Shortest pause between sweeps; each sweep takes the table's write lock.
pub const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(1);

fn sweep_interval(requested: Duration) -> Duration {
    requested.max(MIN_SWEEP_INTERVAL)
}

/// Spawns a background task that purges expired entries every `interval`
/// (at least [`MIN_SWEEP_INTERVAL`]).
///
/// The task holds only a weak handle to the provider and returns once every
/// strong handle has been dropped. It can also be stopped early with
/// `JoinHandle::abort`.
///
/// # Example
/// ```ignore
/// let provider = MemoryCacheProvider::new(Duration::from_secs(60));
/// let sweeper = spawn_sweeper(provider.downgrade(), Duration::from_secs(1));
/// // Later, during shutdown:
/// sweeper.abort();
/// ```
pub fn spawn_sweeper(provider: WeakMemoryCacheProvider, interval: Duration) -> JoinHandle<()> {
    let interval = sweep_interval(interval);
    tokio::spawn(async move {
        info!(interval_ms = interval.as_millis() as u64, "Starting TTL sweeper");

        loop {
            tokio::time::sleep(interval).await;

            let Some(cache) = provider.upgrade() else {
                info!("Memory cache dropped, stopping TTL sweeper");
                break;
            };

            match cache.purge_expired() {
                Ok(0) => debug!("TTL sweep: no expired entries found"),
                Ok(removed) => info!("TTL sweep: removed {} expired entries", removed),
                Err(err) => warn!(error = %err, "TTL sweep failed"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheProvider, Expiration, MemoryCacheProvider};

    #[tokio::test]
    async fn test_sweeper_removes_expired_entries() {
        let provider = MemoryCacheProvider::new(Duration::from_secs(60));
        provider
            .set("expire_soon", "value", Expiration::After(Duration::from_millis(50)))
            .unwrap();

        let handle = provider.spawn_sweeper(Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert!(provider.is_empty(), "Expired entry should have been swept");
        assert_eq!(provider.stats().unwrap().expirations, 1);

        handle.abort();
    }

    #[tokio::test]
    async fn test_sweeper_preserves_valid_entries() {
        let provider = MemoryCacheProvider::new(Duration::from_secs(60));
        provider
            .set("long_lived", "value", Expiration::After(Duration::from_secs(3600)))
            .unwrap();

        let handle = provider.spawn_sweeper(Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(100)).await;

        let mut out = String::new();
        assert!(provider.try_get("long_lived", &mut out).unwrap());
        assert_eq!(out, "value");

        handle.abort();
    }

    #[tokio::test]
    async fn test_sweeper_stops_when_provider_dropped() {
        let provider = MemoryCacheProvider::new(Duration::from_secs(60));
        let handle = provider.spawn_sweeper(Duration::from_millis(10));

        drop(provider);
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("sweeper should exit on its own")
            .unwrap();
    }

    #[test]
    fn test_interval_is_clamped() {
        assert_eq!(sweep_interval(Duration::ZERO), MIN_SWEEP_INTERVAL);
        assert_eq!(sweep_interval(Duration::from_micros(10)), MIN_SWEEP_INTERVAL);
        assert_eq!(sweep_interval(Duration::from_secs(2)), Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_zero_interval_sweeper_still_yields() {
        let provider = MemoryCacheProvider::new(Duration::from_secs(60));
        provider
            .set("expire_soon", "value", Expiration::After(Duration::from_millis(20)))
            .unwrap();

        let handle = provider.spawn_sweeper(Duration::ZERO);
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(provider.is_empty(), "Expired entry should have been swept");
        handle.abort();
    }

    #[tokio::test]
    async fn test_sweeper_can_be_aborted() {
        let provider = MemoryCacheProvider::new(Duration::from_secs(60));
        let handle = provider.spawn_sweeper(Duration::from_secs(1));

        handle.abort();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
