//! Untyped Key Operation
//!
//! `Operation` describes one logical cache table (namespace, prefix, number of
//! key parts, provider, default expiration). `Operation::key` binds a concrete
//! key string to that provider; the value type is chosen per call through an
//! out-parameter.

use std::fmt::{self, Display};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::cache::{CacheBackend, CacheProvider, Expiration};
use crate::error::Result;
use crate::key::parts::{key_base, push_part};

// == Operation ==
/// Immutable descriptor of a cache table whose keys have `arity` parts.
#[derive(Clone)]
pub struct Operation {
    base: String,
    arity: usize,
    provider: Arc<dyn CacheBackend>,
    expiration: Expiration,
}

impl Operation {
    // == Constructor ==
    /// Creates an operation whose keys are `<namespace>:<prefix>` followed by
    /// exactly `arity` parts, stored in `provider` with `expiration`.
    pub fn new(
        namespace: &str,
        prefix: &str,
        arity: usize,
        provider: Arc<dyn CacheBackend>,
        expiration: Expiration,
    ) -> Self {
        Self {
            base: key_base(namespace, prefix),
            arity,
            provider,
            expiration,
        }
    }

    /// Number of parts every key must have.
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Expiration bound to every key built by this operation.
    pub fn expiration(&self) -> Expiration {
        self.expiration
    }

    /// Builds the key for `parts`.
    ///
    /// # Panics
    /// If `parts.len()` differs from the arity the operation was built with.
    pub fn key(&self, parts: &[&dyn Display]) -> Key {
        assert_eq!(
            parts.len(),
            self.arity,
            "cache key {} expects {} parts, got {}",
            self.base,
            self.arity,
            parts.len()
        );

        let mut key = self.base.clone();
        for part in parts {
            push_part(&mut key, *part);
        }

        Key {
            key,
            provider: Arc::clone(&self.provider),
            expiration: self.expiration,
        }
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("base", &self.base)
            .field("arity", &self.arity)
            .field("provider", &self.provider.name())
            .field("expiration", &self.expiration)
            .finish()
    }
}

// == Key ==
/// A formatted key bound to a provider and an expiration.
#[derive(Clone)]
pub struct Key {
    key: String,
    provider: Arc<dyn CacheBackend>,
    expiration: Expiration,
}

impl Key {
    /// The formatted storage key.
    pub fn as_str(&self) -> &str {
        &self.key
    }

    /// Expiration used by `create` and `set`.
    pub fn expiration(&self) -> Expiration {
        self.expiration
    }

    /// Decodes the cached value into `out`; a miss leaves `out` untouched.
    pub fn get<T: DeserializeOwned>(&self, out: &mut T) -> Result<()> {
        self.provider.get(&self.key, out)
    }

    /// Like `get`, but reports whether the key was found.
    pub fn try_get<T: DeserializeOwned>(&self, out: &mut T) -> Result<bool> {
        self.provider.try_get(&self.key, out)
    }

    // == Writes ==
    /// Writes `value` only if the key is absent. Returns whether it was written.
    pub fn create<T: Serialize + ?Sized>(&self, value: &T) -> Result<bool> {
        self.create_with_ttl(value, self.expiration)
    }

    /// `create` with `ttl` instead of the bound expiration.
    pub fn create_with_ttl<T: Serialize + ?Sized>(&self, value: &T, ttl: Expiration) -> Result<bool> {
        self.provider.create(&self.key, value, ttl)
    }

    /// Writes `value` unconditionally.
    pub fn set<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        self.set_with_ttl(value, self.expiration)
    }

    /// `set` with `ttl` instead of the bound expiration.
    pub fn set_with_ttl<T: Serialize + ?Sized>(&self, value: &T, ttl: Expiration) -> Result<()> {
        self.provider.set(&self.key, value, ttl)
    }

    /// Deletes the key. Returns whether it was present.
    pub fn remove(&self) -> Result<bool> {
        self.provider.remove(&self.key)
    }

    // == Must Variants ==
    /// `get`, panicking on error.
    pub fn must_get<T: DeserializeOwned>(&self, out: &mut T) {
        self.provider.must_get(&self.key, out)
    }

    /// `try_get`, panicking on error.
    pub fn must_try_get<T: DeserializeOwned>(&self, out: &mut T) -> bool {
        self.provider.must_try_get(&self.key, out)
    }

    /// `create`, panicking on error.
    pub fn must_create<T: Serialize + ?Sized>(&self, value: &T) -> bool {
        self.provider.must_create(&self.key, value, self.expiration)
    }

    /// `set`, panicking on error.
    pub fn must_set<T: Serialize + ?Sized>(&self, value: &T) {
        self.provider.must_set(&self.key, value, self.expiration)
    }

    /// `remove`, panicking on error.
    pub fn must_remove(&self) -> bool {
        self.provider.must_remove(&self.key)
    }
}

impl Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Key")
            .field("key", &self.key)
            .field("provider", &self.provider.name())
            .field("expiration", &self.expiration)
            .finish()
    }
}
