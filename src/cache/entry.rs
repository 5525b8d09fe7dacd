//! Cache Entry Module
//!
//! Defines a single resident entry of the memory provider with TTL support.

use std::sync::Arc;
use std::time::{Duration, Instant};

// == Cache Entry ==
/// Encoded value plus expiration metadata.
#[derive(Debug, Clone)]
pub(crate) struct CacheEntry {
    /// Encoded value, shared so reads can copy it out cheaply
    pub(crate) value: Arc<[u8]>,
    /// When the entry was written
    pub(crate) created_at: Instant,
    /// Expiration instant, None = no expiration
    pub(crate) expires_at: Option<Instant>,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry with optional TTL.
    ///
    /// # Arguments
    /// * `value` - The encoded value to store
    /// * `ttl` - Optional TTL; `None` never expires. A TTL too long to
    ///   represent as an `Instant` also never expires.
    pub(crate) fn new(value: Vec<u8>, ttl: Option<Duration>) -> Self {
        let now = Instant::now();
        Self {
            value: value.into(),
            created_at: now,
            expires_at: ttl.and_then(|ttl| now.checked_add(ttl)),
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired as of `now`.
    ///
    /// An entry is expired once `now >= expires_at`, so it is gone the moment
    /// its TTL has fully elapsed.
    pub(crate) fn is_expired_at(&self, now: Instant) -> bool {
        match self.expires_at {
            Some(expires) => now >= expires,
            None => false,
        }
    }
}
