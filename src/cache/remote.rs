//! Remote Provider Module
//!
//! Serialization adapter over an externally owned Redis client. All state
//! lives in the remote store; this side only maps the cache contract onto
//! GET / SET [PX] / SET NX [PX] / DEL.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use redis::{ConnectionLike, ErrorKind, RedisError, RedisResult};
use tracing::{debug, trace, warn};

use crate::cache::{CacheBackend, Expiration};
use crate::error::{CacheError, Result};

// == Client Shape ==
/// Kind of client handed to a `RemoteCacheProvider`.
///
/// The set is closed: the shape follows from the client's type, and only the
/// types below implement [`CommandClient`]. Sentinel-only clients and other
/// client kinds are rejected when the program is compiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientShape {
    /// `redis::Client`, opening a connection per call
    Standalone,
    /// `redis::cluster::ClusterClient`
    Cluster,
    /// One dedicated connection (`Mutex<C: ConnectionLike>`) shared behind a lock
    Connection,
}

mod sealed {
    pub trait Sealed {}

    impl Sealed for redis::Client {}
    impl Sealed for redis::cluster::ClusterClient {}
    impl<C: redis::ConnectionLike + Send> Sealed for std::sync::Mutex<C> {}
}

// == Command Client ==
/// Byte-level command set the remote provider needs from a client.
///
/// Sealed: implemented for `redis::Client`, `redis::cluster::ClusterClient`
/// and `Mutex<C>` for any `C: ConnectionLike + Send`. A TTL of `None` sends
/// no expiry, leaving the key persistent.
///
/// ```compile_fail
/// use key_cache::cache::CommandClient;
///
/// struct SentinelOnly;
///
/// impl CommandClient for SentinelOnly {}
/// ```
pub trait CommandClient: sealed::Sealed + Send + Sync {
    /// Which supported client kind this is.
    fn shape(&self) -> ClientShape;

    /// GET. Returns `None` when the key does not exist.
    fn get(&self, key: &str) -> RedisResult<Option<Vec<u8>>>;

    /// SET with optional PX expiry.
    fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> RedisResult<()>;

    /// SET NX with optional PX expiry. Returns whether the value was written.
    fn set_nx(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> RedisResult<bool>;

    /// DEL. Returns whether the key existed.
    fn del(&self, key: &str) -> RedisResult<bool>;
}

mod command {
    use super::*;

    /// PX takes whole milliseconds and rejects 0.
    fn ttl_millis(ttl: Duration) -> u64 {
        u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
    }

    pub(super) fn set_cmd(key: &str, value: &[u8], ttl: Option<Duration>) -> redis::Cmd {
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value);
        if let Some(ttl) = ttl {
            cmd.arg("PX").arg(ttl_millis(ttl));
        }
        cmd
    }

    pub fn get(con: &mut dyn ConnectionLike, key: &str) -> RedisResult<Option<Vec<u8>>> {
        redis::cmd("GET").arg(key).query(con)
    }

    pub fn set(
        con: &mut dyn ConnectionLike,
        key: &str,
        value: &[u8],
        ttl: Option<Duration>,
    ) -> RedisResult<()> {
        set_cmd(key, value, ttl).query(con)
    }

    /// `OK` when written, nil when the key already exists.
    pub fn set_nx(
        con: &mut dyn ConnectionLike,
        key: &str,
        value: &[u8],
        ttl: Option<Duration>,
    ) -> RedisResult<bool> {
        let mut cmd = set_cmd(key, value, ttl);
        cmd.arg("NX");
        let reply: Option<String> = cmd.query(con)?;
        Ok(reply.is_some())
    }

    pub fn del(con: &mut dyn ConnectionLike, key: &str) -> RedisResult<bool> {
        let deleted: i64 = redis::cmd("DEL").arg(key).query(con)?;
        Ok(deleted > 0)
    }
}

impl CommandClient for redis::Client {
    fn shape(&self) -> ClientShape {
        ClientShape::Standalone
    }

    fn get(&self, key: &str) -> RedisResult<Option<Vec<u8>>> {
        command::get(&mut self.get_connection()?, key)
    }

    fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> RedisResult<()> {
        command::set(&mut self.get_connection()?, key, value, ttl)
    }

    fn set_nx(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> RedisResult<bool> {
        command::set_nx(&mut self.get_connection()?, key, value, ttl)
    }

    fn del(&self, key: &str) -> RedisResult<bool> {
        command::del(&mut self.get_connection()?, key)
    }
}

impl CommandClient for redis::cluster::ClusterClient {
    fn shape(&self) -> ClientShape {
        ClientShape::Cluster
    }

    fn get(&self, key: &str) -> RedisResult<Option<Vec<u8>>> {
        command::get(&mut self.get_connection()?, key)
    }

    fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> RedisResult<()> {
        command::set(&mut self.get_connection()?, key, value, ttl)
    }

    fn set_nx(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> RedisResult<bool> {
        command::set_nx(&mut self.get_connection()?, key, value, ttl)
    }

    fn del(&self, key: &str) -> RedisResult<bool> {
        command::del(&mut self.get_connection()?, key)
    }
}

fn lock_connection<C>(con: &Mutex<C>) -> RedisResult<MutexGuard<'_, C>> {
    con.lock()
        .map_err(|_| RedisError::from((ErrorKind::ClientError, "redis connection lock poisoned")))
}

impl<C: ConnectionLike + Send> CommandClient for Mutex<C> {
    fn shape(&self) -> ClientShape {
        ClientShape::Connection
    }

    fn get(&self, key: &str) -> RedisResult<Option<Vec<u8>>> {
        command::get(&mut *lock_connection(self)?, key)
    }

    fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> RedisResult<()> {
        command::set(&mut *lock_connection(self)?, key, value, ttl)
    }

    fn set_nx(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> RedisResult<bool> {
        command::set_nx(&mut *lock_connection(self)?, key, value, ttl)
    }

    fn del(&self, key: &str) -> RedisResult<bool> {
        command::del(&mut *lock_connection(self)?, key)
    }
}

// == Remote Cache Provider ==
/// Cache provider backed by a remote Redis store.
///
/// The client is shared, not owned: any number of providers may wrap the
/// same `Arc`, and its timeouts apply to every call made through them.
#[derive(Clone)]
pub struct RemoteCacheProvider {
    client: Arc<dyn CommandClient>,
}

impl RemoteCacheProvider {
    /// Wraps `client`.
    ///
    /// Only the client kinds listed in [`ClientShape`] implement
    /// [`CommandClient`], so an unsupported client never reaches this call.
    ///
    /// # Panics
    /// If `client` is `None`. This is a configuration error and is never
    /// deferred to first use.
    pub fn new<C: CommandClient + 'static>(client: Option<Arc<C>>) -> Self {
        Self::try_new(client).unwrap_or_else(|err| panic!("{err}"))
    }

    /// Like `new`, but returns the configuration error instead of panicking.
    pub fn try_new<C: CommandClient + 'static>(client: Option<Arc<C>>) -> Result<Self> {
        let client: Arc<dyn CommandClient> = client
            .ok_or_else(|| CacheError::Config("remote cache client is missing".to_string()))?;
        debug!(shape = ?client.shape(), "remote cache provider ready");
        Ok(Self { client })
    }

    /// Opens a standalone client for `url`. No connection is made until the
    /// first command.
    pub fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)?;
        Self::try_new(Some(Arc::new(client)))
    }

    /// Kind of client this provider talks through.
    pub fn shape(&self) -> ClientShape {
        self.client.shape()
    }

    fn backend_error(&self, op: &'static str, key: &str, err: RedisError) -> CacheError {
        warn!(op, key, error = %err, "remote cache command failed");
        CacheError::Backend(err)
    }
}

impl fmt::Debug for RemoteCacheProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteCacheProvider")
            .field("shape", &self.client.shape())
            .finish()
    }
}

/// Remote writes without an explicit TTL stay until deleted.
fn remote_ttl(ttl: Expiration) -> Option<Duration> {
    ttl.resolve(Expiration::Never)
}

impl CacheBackend for RemoteCacheProvider {
    fn name(&self) -> &'static str {
        "redis"
    }

    fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let value = self
            .client
            .get(key)
            .map_err(|err| self.backend_error("GET", key, err))?;
        if value.is_none() {
            debug!(key, "cache miss");
        }
        Ok(value)
    }

    fn create_raw(&self, key: &str, value: Vec<u8>, ttl: Expiration) -> Result<bool> {
        let created = self
            .client
            .set_nx(key, &value, remote_ttl(ttl))
            .map_err(|err| self.backend_error("SETNX", key, err))?;
        if !created {
            debug!(key, "cache create skipped, key exists");
        }
        Ok(created)
    }

    fn set_raw(&self, key: &str, value: Vec<u8>, ttl: Expiration) -> Result<()> {
        self.client
            .set(key, &value, remote_ttl(ttl))
            .map_err(|err| self.backend_error("SET", key, err))?;
        trace!(key, "cache entry set");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        self.client
            .del(key)
            .map_err(|err| self.backend_error("DEL", key, err))
    }
}
