//! Cache Module
//!
//! The provider contract plus its two backends: an in-process table with
//! per-entry expiration and a serialization adapter over a remote Redis store.

pub mod codec;
mod entry;
mod memory;
mod provider;
mod remote;
mod stats;


// Re-export public types
pub use codec::UnixTime;
pub(crate) use entry::CacheEntry;
pub use memory::{MemoryCacheProvider, WeakMemoryCacheProvider};
pub use provider::{CacheBackend, CacheProvider, Expiration, CACHE_EXPIRATION_ZERO};
pub use remote::{ClientShape, CommandClient, RemoteCacheProvider};
pub use stats::CacheStats;
