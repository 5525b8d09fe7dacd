//! Key Cache - typed cache keys over interchangeable backends
//!
//! Provides a uniform get/set/create/remove contract over an in-process
//! memory store and a remote Redis store, plus a key builder that derives
//! `<namespace>:<prefix>_<part>...` keys and binds them to a value type.

pub mod cache;
pub mod config;
pub mod error;
pub mod key;
pub mod tasks;

pub use cache::{
    CacheBackend, CacheProvider, Expiration, MemoryCacheProvider, RemoteCacheProvider,
    CACHE_EXPIRATION_ZERO,
};
pub use config::Config;
pub use error::{CacheError, Result};
pub use key::{Key, Operation, TypedKey, TypedOperation};
pub use tasks::spawn_sweeper;
