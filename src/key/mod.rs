//! Key Module
//!
//! Builds canonical cache keys from a namespace, a prefix and ordered key
//! parts, and binds them to a provider.
//!
//! ```ignore
//! let op = TypedOperation::<(&str, i32), DateTime<Utc>>::new("ns", "prefix", provider, CACHE_EXPIRATION_ZERO);
//! let key = op.key(("a", 1)); // "ns:prefix_a_1"
//! key.must_set(&Utc::now());
//! ```

mod operation;
mod parts;
mod typed;

pub use operation::{Key, Operation};
pub use parts::{key_base, KeyParts, NAMESPACE_SEPARATOR, PART_SEPARATOR};
pub use typed::{TypedKey, TypedOperation};
