//! Typed Key Operation
//!
//! `TypedOperation<K, V>` fixes both the key-part tuple `K` and the value
//! type `V` at compile time, so its keys return values directly instead of
//! filling an out-parameter.

use std::fmt::{self, Display};
use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::trace;

use crate::cache::{codec, CacheBackend, CacheProvider, Expiration};
use crate::error::Result;
use crate::key::parts::{key_base, KeyParts};

// == Typed Operation ==
/// Immutable descriptor of a cache table keyed by `K` and holding `V`.
pub struct TypedOperation<K, V> {
    base: String,
    provider: Arc<dyn CacheBackend>,
    expiration: Expiration,
    _marker: PhantomData<fn(K) -> V>,
}

impl<K: KeyParts, V> TypedOperation<K, V> {
    // == Constructor ==
    /// Creates an operation whose keys are `<namespace>:<prefix>` followed by
    /// the parts of `K`, stored in `provider` with `expiration`.
    pub fn new(
        namespace: &str,
        prefix: &str,
        provider: Arc<dyn CacheBackend>,
        expiration: Expiration,
    ) -> Self {
        Self {
            base: key_base(namespace, prefix),
            provider,
            expiration,
            _marker: PhantomData,
        }
    }

    /// Number of parts in `K`.
    pub fn arity(&self) -> usize {
        K::ARITY
    }

    /// Expiration bound to every key built by this operation.
    pub fn expiration(&self) -> Expiration {
        self.expiration
    }

    /// Builds the key for `parts`.
    pub fn key(&self, parts: K) -> TypedKey<V> {
        let mut key = self.base.clone();
        parts.write_parts(&mut key);
        TypedKey {
            key,
            provider: Arc::clone(&self.provider),
            expiration: self.expiration,
            _marker: PhantomData,
        }
    }
}

impl<K, V> Clone for TypedOperation<K, V> {
    fn clone(&self) -> Self {
        Self {
            base: self.base.clone(),
            provider: Arc::clone(&self.provider),
            expiration: self.expiration,
            _marker: PhantomData,
        }
    }
}

impl<K, V> fmt::Debug for TypedOperation<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedOperation")
            .field("base", &self.base)
            .field("provider", &self.provider.name())
            .field("expiration", &self.expiration)
            .finish()
    }
}

// == Typed Key ==
/// A formatted key bound to a provider, an expiration and the value type `V`.
pub struct TypedKey<V> {
    key: String,
    provider: Arc<dyn CacheBackend>,
    expiration: Expiration,
    _marker: PhantomData<fn() -> V>,
}

impl<V> TypedKey<V> {
    /// The formatted storage key.
    pub fn as_str(&self) -> &str {
        &self.key
    }

    /// Expiration used by `create` and `set`.
    pub fn expiration(&self) -> Expiration {
        self.expiration
    }

    /// Deletes the key. Returns whether it was present.
    pub fn remove(&self) -> Result<bool> {
        self.provider.remove(&self.key)
    }

    /// `remove`, panicking on error.
    pub fn must_remove(&self) -> bool {
        self.provider.must_remove(&self.key)
    }
}

impl<V: DeserializeOwned> TypedKey<V> {
    /// Returns the cached value, or `None` on a miss.
    pub fn try_get(&self) -> Result<Option<V>> {
        let Some(bytes) = self.provider.get_raw(&self.key)? else {
            return Ok(None);
        };
        let value = codec::decode(&self.key, &bytes)?;
        trace!(key = %self.key, "cache hit");
        Ok(Some(value))
    }

    /// `try_get`, panicking on error.
    pub fn must_try_get(&self) -> Option<V> {
        self.try_get()
            .unwrap_or_else(|err| panic!("cache try_get {} failed: {err}", self.key))
    }
}

impl<V: DeserializeOwned + Default> TypedKey<V> {
    /// Returns the cached value, or `V::default()` on a miss.
    pub fn get(&self) -> Result<V> {
        self.try_get().map(Option::unwrap_or_default)
    }

    /// `get`, panicking on error.
    pub fn must_get(&self) -> V {
        self.get()
            .unwrap_or_else(|err| panic!("cache get {} failed: {err}", self.key))
    }
}

impl<V: Serialize> TypedKey<V> {
    /// Writes `value` only if the key is absent. Returns whether it was written.
    pub fn create(&self, value: &V) -> Result<bool> {
        self.create_with_ttl(value, self.expiration)
    }

    /// `create` with `ttl` instead of the bound expiration.
    pub fn create_with_ttl(&self, value: &V, ttl: Expiration) -> Result<bool> {
        self.provider.create(&self.key, value, ttl)
    }

    /// Writes `value` unconditionally.
    pub fn set(&self, value: &V) -> Result<()> {
        self.set_with_ttl(value, self.expiration)
    }

    /// `set` with `ttl` instead of the bound expiration.
    pub fn set_with_ttl(&self, value: &V, ttl: Expiration) -> Result<()> {
        self.provider.set(&self.key, value, ttl)
    }

    // == Must Variants ==
    /// `create`, panicking on error.
    pub fn must_create(&self, value: &V) -> bool {
        self.provider.must_create(&self.key, value, self.expiration)
    }

    /// `set`, panicking on error.
    pub fn must_set(&self, value: &V) {
        self.provider.must_set(&self.key, value, self.expiration)
    }
}

impl<V> Clone for TypedKey<V> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            provider: Arc::clone(&self.provider),
            expiration: self.expiration,
            _marker: PhantomData,
        }
    }
}

impl<V> Display for TypedKey<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

impl<V> fmt::Debug for TypedKey<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedKey")
            .field("key", &self.key)
            .field("provider", &self.provider.name())
            .field("expiration", &self.expiration)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{MemoryCacheProvider, CACHE_EXPIRATION_ZERO};
    use chrono::{DateTime, TimeZone, Utc};
    use std::time::Duration;

    fn provider() -> Arc<dyn CacheBackend> {
        Arc::new(MemoryCacheProvider::new(Duration::from_secs(1)))
    }

    #[test]
    fn test_typed_key_lifecycle() {
        let op = TypedOperation::<(&str, i32), DateTime<Utc>>::new(
            "ns",
            "prefix",
            provider(),
            CACHE_EXPIRATION_ZERO,
        );

        let key = op.key(("a", 1));
        assert_eq!(key.as_str(), "ns:prefix_a_1");

        assert_eq!(key.must_get(), DateTime::<Utc>::default());
        assert!(key.must_try_get().is_none());

        let v = Utc.with_ymd_and_hms(2022, 3, 27, 18, 55, 0).unwrap();
        key.must_set(&v);
        assert_eq!(key.must_try_get(), Some(v));

        assert!(!key.must_create(&Utc::now()));
        assert_eq!(key.must_get(), v);
        assert!(key.must_remove());
        assert!(!key.must_remove());
    }

    #[test]
    fn test_typed_operation_arity() {
        let op = TypedOperation::<(String, u32, bool), String>::new(
            "ns",
            "p",
            provider(),
            CACHE_EXPIRATION_ZERO,
        );
        assert_eq!(op.arity(), 3);
        assert_eq!(
            op.key(("x".to_string(), 2, true)).to_string(),
            "ns:p_x_2_true"
        );
    }

    #[test]
    fn test_decode_error_surfaces_through_typed_key() {
        let shared = provider();
        let text = TypedOperation::<(u8,), String>::new("ns", "p", Arc::clone(&shared), CACHE_EXPIRATION_ZERO);
        let number = TypedOperation::<(u8,), u64>::new("ns", "p", shared, CACHE_EXPIRATION_ZERO);

        text.key((1,)).must_set(&"not a number".to_string());
        assert!(number.key((1,)).try_get().is_err());
    }

    #[test]
    fn test_create_with_ttl_overrides_bound_expiration() {
        let op = TypedOperation::<(u8,), u8>::new("ns", "p", provider(), Expiration::Never);
        let key = op.key((9,));

        assert!(key
            .create_with_ttl(&1, Expiration::After(Duration::from_millis(30)))
            .unwrap());
        std::thread::sleep(Duration::from_millis(60));
        assert!(key.try_get().unwrap().is_none());
        assert!(key.create(&2).unwrap());
        assert_eq!(key.get().unwrap(), 2);
    }
}
