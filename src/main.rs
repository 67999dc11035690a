// # HotKV Server
//
// Main entry point for the HotKV server. Loads configuration, establishes
// the backend session pool, and starts the HTTP listener. Startup is fatal
// when no backend session can be established: the process exits without
// binding the listener.

use anyhow::Context;
use hotkv::storage::postgres_backend::PostgresSession;
use hotkv::{Config, ConnectionPool, KvStore, server};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => {
            Config::from_file(&path).with_context(|| format!("loading config from {path}"))?
        }
        None => Config::default(),
    };
    config.validate().context("validating configuration")?;

    info!("Initializing HotKV server");
    info!(
        "Backend: {}:{}/{}, pool_size={}, cache_capacity={}",
        config.db_host, config.db_port, config.db_name, config.pool_size, config.cache_capacity
    );

    // Session establishment blocks on network round-trips; keep it off the
    // async workers.
    let pool = {
        let config = config.clone();
        tokio::task::spawn_blocking(move || {
            ConnectionPool::establish(config.pool_size, || PostgresSession::connect(&config))
        })
        .await
        .context("establishing connection pool")?
    };

    if !pool.is_connected() {
        anyhow::bail!(
            "no backend sessions could be established against {}:{}; refusing to start",
            config.db_host,
            config.db_port
        );
    }

    {
        let mut session = pool.acquire();
        session
            .ensure_schema()
            .context("creating the kv_store table")?;
    }
    info!("Backend schema ready");

    let store = Arc::new(KvStore::new(Arc::new(pool), config.cache_capacity));

    server::serve(&config, store)
        .await
        .context("running the HTTP server")?;
    Ok(())
}
