//! Memory Provider Module
//!
//! In-process cache backend: a lock-guarded table of encoded values with
//! per-entry expiration. Expired entries are logically absent on every read
//! path, whether or not a sweep has removed them yet.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::cache::{CacheBackend, CacheEntry, CacheStats, Expiration};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::tasks::spawn_sweeper;

// == Table ==
#[derive(Debug, Default)]
struct Table {
    entries: HashMap<String, CacheEntry>,
    stats: CacheStats,
}

impl Table {
    /// Drops `key` if it is resident but expired. Returns true if it did.
    fn evict_if_expired(&mut self, key: &str, now: Instant) -> bool {
        let expired = self
            .entries
            .get(key)
            .is_some_and(|entry| entry.is_expired_at(now));
        if expired {
            self.entries.remove(key);
            self.stats.record_expirations(1);
        }
        expired
    }
}

#[derive(Debug)]
struct Inner {
    table: RwLock<Table>,
    default_expiration: Expiration,
}

// == Memory Cache Provider ==
/// In-process cache provider.
///
/// Cloning is cheap and every clone shares the same table. The table lives
/// as long as the last clone; a sweeper spawned with [`spawn_sweeper`]
/// only holds a weak handle and stops once the table is gone.
///
/// [`spawn_sweeper`]: MemoryCacheProvider::spawn_sweeper
#[derive(Debug, Clone)]
pub struct MemoryCacheProvider {
    inner: Arc<Inner>,
}

/// Non-owning handle to a memory provider's table.
#[derive(Debug, Clone)]
pub struct WeakMemoryCacheProvider {
    inner: Weak<Inner>,
}

impl WeakMemoryCacheProvider {
    /// Returns the provider if any strong handle is still alive.
    pub fn upgrade(&self) -> Option<MemoryCacheProvider> {
        self.inner.upgrade().map(|inner| MemoryCacheProvider { inner })
    }
}

impl MemoryCacheProvider {
    // == Constructor ==
    /// Creates a provider whose writes with `Expiration::Default` expire after
    /// `default_ttl`. A zero `default_ttl` means such writes never expire.
    pub fn new(default_ttl: Duration) -> Self {
        Self::with_default_expiration(Expiration::from(default_ttl))
    }

    /// Creates a provider that resolves `Expiration::Default` writes against
    /// `default_expiration`.
    pub fn with_default_expiration(default_expiration: Expiration) -> Self {
        Self {
            inner: Arc::new(Inner {
                table: RwLock::new(Table::default()),
                default_expiration,
            }),
        }
    }

    /// Creates a provider using `CACHE_DEFAULT_TTL_MS` from `config`.
    pub fn with_config(config: &Config) -> Self {
        Self::new(config.default_ttl())
    }

    /// Expiration applied to writes that ask for the provider default.
    pub fn default_expiration(&self) -> Expiration {
        self.inner.default_expiration
    }

    // == Handles ==
    /// Returns a handle that does not keep the table alive.
    pub fn downgrade(&self) -> WeakMemoryCacheProvider {
        WeakMemoryCacheProvider {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Spawns a tokio task that purges expired entries every `interval`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn_sweeper(&self, interval: Duration) -> JoinHandle<()> {
        spawn_sweeper(self.downgrade(), interval)
    }

    // == Cleanup Expired ==
    /// Removes all expired entries. Returns the number removed.
    pub fn purge_expired(&self) -> Result<usize> {
        let mut table = self.write()?;
        let now = Instant::now();
        let before = table.entries.len();
        table.entries.retain(|_, entry| !entry.is_expired_at(now));
        let removed = before - table.entries.len();
        table.stats.record_expirations(removed);
        Ok(removed)
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> Result<CacheStats> {
        let table = self.read()?;
        let mut stats = table.stats.clone();
        stats.set_total_entries(table.entries.len());
        Ok(stats)
    }

    /// Number of resident entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.read().map(|table| table.entries.len()).unwrap_or(0)
    }

    /// True when no entry is resident.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Table>> {
        self.inner
            .table
            .read()
            .map_err(|_| CacheError::Internal("memory cache lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Table>> {
        self.inner
            .table
            .write()
            .map_err(|_| CacheError::Internal("memory cache lock poisoned".to_string()))
    }

    fn entry(&self, value: Vec<u8>, ttl: Expiration) -> CacheEntry {
        CacheEntry::new(value, ttl.resolve(self.inner.default_expiration))
    }
}

impl CacheBackend for MemoryCacheProvider {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let value = {
            let mut guard = self.write()?;
            let table = &mut *guard;
            if table.evict_if_expired(key, Instant::now()) {
                debug!(key, "cache entry expired");
            }
            match table.entries.get(key) {
                Some(entry) => {
                    table.stats.record_hit();
                    Some(Arc::clone(&entry.value))
                }
                None => {
                    table.stats.record_miss();
                    None
                }
            }
        };

        if value.is_none() {
            debug!(key, "cache miss");
        }
        Ok(value.map(|bytes| bytes.to_vec()))
    }

    fn create_raw(&self, key: &str, value: Vec<u8>, ttl: Expiration) -> Result<bool> {
        let entry = self.entry(value, ttl);
        let mut table = self.write()?;
        table.evict_if_expired(key, entry.created_at);
        if table.entries.contains_key(key) {
            debug!(key, "cache create skipped, key exists");
            return Ok(false);
        }
        table.entries.insert(key.to_string(), entry);
        trace!(key, "cache entry created");
        Ok(true)
    }

    fn set_raw(&self, key: &str, value: Vec<u8>, ttl: Expiration) -> Result<()> {
        let entry = self.entry(value, ttl);
        self.write()?.entries.insert(key.to_string(), entry);
        trace!(key, "cache entry set");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        let mut table = self.write()?;
        let expired = table.evict_if_expired(key, Instant::now());
        let removed = table.entries.remove(key).is_some();
        trace!(key, removed, expired, "cache entry removed");
        Ok(removed)
    }
}
