//! Key Cache probe
//!
//! Builds the configured provider and runs a set/try_get/create/remove round
//! trip through a typed key, exiting non-zero if the backend misbehaves.

use std::sync::Arc;

use anyhow::{ensure, Context};
use chrono::{DateTime, Utc};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use key_cache::config::Backend;
use key_cache::{
    CacheBackend, Config, MemoryCacheProvider, RemoteCacheProvider, TypedOperation,
    CACHE_EXPIRATION_ZERO,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "key_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    info!(
        "Configuration loaded: backend={:?}, default_ttl={}ms, sweep_interval={}ms, namespace={}",
        config.backend, config.default_ttl_ms, config.sweep_interval_ms, config.namespace
    );

    let mut sweeper = None;
    let provider: Arc<dyn CacheBackend> = match config.backend {
        Backend::Memory => {
            let memory = MemoryCacheProvider::with_config(&config);
            sweeper = Some(memory.spawn_sweeper(config.sweep_interval()));
            Arc::new(memory)
        }
        Backend::Redis => Arc::new(
            RemoteCacheProvider::connect(&config.redis_url)
                .with_context(|| format!("invalid redis url {}", config.redis_url))?,
        ),
    };

    // The remote client is blocking; keep it off the runtime workers.
    let namespace = config.namespace.clone();
    tokio::task::spawn_blocking(move || probe(&namespace, provider))
        .await
        .context("probe task panicked")??;

    if let Some(handle) = sweeper {
        handle.abort();
    }
    info!("Probe complete");
    Ok(())
}

fn probe(namespace: &str, provider: Arc<dyn CacheBackend>) -> anyhow::Result<()> {
    let op = TypedOperation::<(&str, u32), DateTime<Utc>>::new(
        namespace,
        "probe",
        provider,
        CACHE_EXPIRATION_ZERO,
    );
    let key = op.key(("pid", std::process::id()));
    info!(key = %key, "Probing cache backend");

    let now = Utc::now();
    key.set(&now).context("set failed")?;

    let read = key.try_get().context("try_get failed")?;
    ensure!(read == Some(now), "read back {read:?}, expected {now}");

    let created = key.create(&Utc::now()).context("create failed")?;
    ensure!(!created, "create overwrote an existing key");

    ensure!(key.remove().context("remove failed")?, "remove reported a missing key");
    ensure!(!key.remove().context("remove failed")?, "second remove reported a present key");

    Ok(())
}
