//! Cache Provider Contract
//!
//! `CacheBackend` is the byte-level, object-safe contract each store
//! implements. `CacheProvider` layers the typed Get/TryGet/Create/Set/Remove
//! surface and its panicking `must_*` variants on top of any backend.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::trace;

use crate::cache::codec;
use crate::error::Result;

// == Expiration ==
/// Time-to-live requested for a write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Expiration {
    /// Use the provider's default expiration
    #[default]
    Default,
    /// Keep the entry until it is removed
    Never,
    /// Expire once the duration has elapsed
    After(Duration),
}

/// Zero value of `Expiration`: defer to the provider default.
pub const CACHE_EXPIRATION_ZERO: Expiration = Expiration::Default;

impl Expiration {
    /// Resolves `Default` against a provider default, yielding the concrete TTL
    /// (`None` = never expires).
    pub fn resolve(self, default: Expiration) -> Option<Duration> {
        match self {
            Expiration::Default => match default {
                Expiration::After(ttl) => Some(ttl),
                Expiration::Default | Expiration::Never => None,
            },
            Expiration::Never => None,
            Expiration::After(ttl) => Some(ttl),
        }
    }
}

impl From<Duration> for Expiration {
    /// A zero duration means "provider default".
    fn from(ttl: Duration) -> Self {
        if ttl.is_zero() {
            Expiration::Default
        } else {
            Expiration::After(ttl)
        }
    }
}

impl From<Option<Duration>> for Expiration {
    /// `None` means "never expire".
    fn from(ttl: Option<Duration>) -> Self {
        ttl.map_or(Expiration::Never, Expiration::from)
    }
}

// == Cache Backend ==
/// Byte-level storage contract shared by all providers.
pub trait CacheBackend: Send + Sync {
    /// Short backend name used in logs.
    fn name(&self) -> &'static str;

    /// Returns the stored bytes, or `None` on a miss.
    fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Stores `value` only if `key` is absent. Returns whether it was written.
    fn create_raw(&self, key: &str, value: Vec<u8>, ttl: Expiration) -> Result<bool>;

    /// Stores `value` unconditionally, resetting the expiration.
    fn set_raw(&self, key: &str, value: Vec<u8>, ttl: Expiration) -> Result<()>;

    /// Deletes `key`. Returns whether it was present.
    fn remove(&self, key: &str) -> Result<bool>;
}

// == Cache Provider ==
/// Typed Get/TryGet/Create/Set/Remove over any `CacheBackend`.
///
/// A miss is never an error: `get` and `try_get` leave `out` untouched when
/// the key is absent or expired. The `must_*` variants panic on error but
/// still return the boolean results.
pub trait CacheProvider: CacheBackend {
    /// Decodes the value under `key` into `out`. A miss leaves `out` as is.
    fn get<T: DeserializeOwned>(&self, key: &str, out: &mut T) -> Result<()> {
        self.try_get(key, out).map(|_| ())
    }

    /// Like `get`, but reports whether the key was found.
    fn try_get<T: DeserializeOwned>(&self, key: &str, out: &mut T) -> Result<bool> {
        match self.get_raw(key)? {
            Some(bytes) => {
                *out = codec::decode(key, &bytes)?;
                trace!(backend = self.name(), key, "cache hit");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Writes `value` only if `key` is absent (or logically expired).
    fn create<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Expiration) -> Result<bool> {
        let bytes = codec::encode(key, value)?;
        self.create_raw(key, bytes, ttl)
    }

    /// Writes `value` unconditionally.
    fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Expiration) -> Result<()> {
        let bytes = codec::encode(key, value)?;
        self.set_raw(key, bytes, ttl)
    }

    // == Must Variants ==
    /// `get`, panicking on a backend or decode error.
    fn must_get<T: DeserializeOwned>(&self, key: &str, out: &mut T) {
        self.get(key, out)
            .unwrap_or_else(|err| panic!("cache get {key} failed: {err}"))
    }

    /// `try_get`, panicking on error. Still returns whether the key was found.
    fn must_try_get<T: DeserializeOwned>(&self, key: &str, out: &mut T) -> bool {
        self.try_get(key, out)
            .unwrap_or_else(|err| panic!("cache try_get {key} failed: {err}"))
    }

    /// `create`, panicking on error. Still returns whether the value was written.
    fn must_create<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Expiration) -> bool {
        self.create(key, value, ttl)
            .unwrap_or_else(|err| panic!("cache create {key} failed: {err}"))
    }

    /// `set`, panicking on error.
    fn must_set<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Expiration) {
        self.set(key, value, ttl)
            .unwrap_or_else(|err| panic!("cache set {key} failed: {err}"))
    }

    /// `remove`, panicking on error. Still returns whether the key was present.
    fn must_remove(&self, key: &str) -> bool {
        self.remove(key)
            .unwrap_or_else(|err| panic!("cache remove {key} failed: {err}"))
    }
}

impl<B: CacheBackend + ?Sized> CacheProvider for B {}
