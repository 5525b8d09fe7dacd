//! Error types for the cache layer
//!
//! Provides unified error handling using thiserror. A cache miss is never an
//! error; it is reported through `Option`/`bool` results instead.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for cache providers and key handles.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Transport, protocol or server-reported failure from the remote store
    #[error("Backend error: {0}")]
    Backend(#[from] redis::RedisError),

    /// Value could not be serialized before being written
    #[error("Failed to encode value for key {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Stored bytes do not match the shape of the requested value
    #[error("Failed to decode value for key {key}: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Unsupported or missing backend client at construction time
    #[error("Invalid cache configuration: {0}")]
    Config(String),

    /// Internal failure, e.g. a poisoned lock
    #[error("Internal error: {0}")]
    Internal(String),
}

// == Result Type Alias ==
/// Convenience Result type for the cache layer.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_names_key() {
        let source = serde_json::from_slice::<u32>(b"not json").unwrap_err();
        let err = CacheError::Decode {
            key: "ns:prefix_a".to_string(),
            source,
        };
        assert!(err.to_string().contains("ns:prefix_a"));
    }

    #[test]
    fn test_backend_error_from_redis() {
        let redis_err = redis::RedisError::from((redis::ErrorKind::IoError, "connection refused"));
        let err: CacheError = redis_err.into();
        assert!(matches!(err, CacheError::Backend(_)));
        assert!(err.to_string().starts_with("Backend error"));
    }
}
