// HTTP surface for the KV store
//
// Thin dispatcher: parse the verb and its parameters, forward to the
// coordinator, map the outcome to a status code and plain-text body. The
// coordinator blocks (pool acquire, backend round-trips), so handlers run
// it on the blocking thread pool instead of the async workers.

use crate::config::Config;
use crate::error::Result;
use crate::kv::{KvStore, ValueSource};
use crate::storage::KvBackend;
use axum::{
    Form, Router,
    extract::{Query, State},
    http::StatusCode,
    routing::{delete, get, post},
};
use serde::Deserialize;
use std::fmt::Write as _;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Form fields accepted by `POST /create`
#[derive(Debug, Deserialize)]
struct CreateParams {
    key: Option<String>,
    value: Option<String>,
}

/// Query parameters accepted by `GET /read` and `DELETE /delete`
#[derive(Debug, Deserialize)]
struct KeyParams {
    key: Option<String>,
}

/// Build the application router over a shared store
pub fn router<S>(store: Arc<KvStore<S>>) -> Router
where
    S: KvBackend + 'static,
{
    Router::new()
        .route("/create", post(create_handler::<S>))
        .route("/read", get(read_handler::<S>))
        .route("/delete", delete(delete_handler::<S>))
        .route("/cache-status", get(cache_status_handler::<S>))
        .route("/health", get(health_handler::<S>))
        .with_state(store)
        .layer(TraceLayer::new_for_http())
}

/// Bind the configured listener and serve until shutdown
pub async fn serve<S>(config: &Config, store: Arc<KvStore<S>>) -> Result<()>
where
    S: KvBackend + 'static,
{
    let app = router(store);
    let listener = tokio::net::TcpListener::bind(config.listen_socket()).await?;
    info!("listening on {}", config.listen_socket());
    axum::serve(listener, app).await?;
    Ok(())
}

async fn create_handler<S>(
    State(store): State<Arc<KvStore<S>>>,
    Form(params): Form<CreateParams>,
) -> (StatusCode, String)
where
    S: KvBackend + 'static,
{
    let (Some(key), Some(value)) = (params.key, params.value) else {
        return (
            StatusCode::BAD_REQUEST,
            "Missing 'key' or 'value' parameter".to_string(),
        );
    };

    let outcome = {
        let store = Arc::clone(&store);
        let key = key.clone();
        tokio::task::spawn_blocking(move || store.put(&key, &value)).await
    };

    match outcome {
        Ok(Ok(())) => (
            StatusCode::OK,
            format!("Successfully created/updated key: {key}"),
        ),
        Ok(Err(err)) => {
            error!("create failed for key '{key}': {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to create/update key: {key}"),
            )
        }
        Err(join_err) => {
            error!("create worker for key '{key}' died: {join_err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to create/update key: {key}"),
            )
        }
    }
}

async fn read_handler<S>(
    State(store): State<Arc<KvStore<S>>>,
    Query(params): Query<KeyParams>,
) -> (StatusCode, String)
where
    S: KvBackend + 'static,
{
    let Some(key) = params.key else {
        return (StatusCode::BAD_REQUEST, "Missing 'key' parameter".to_string());
    };

    let outcome = {
        let store = Arc::clone(&store);
        let key = key.clone();
        tokio::task::spawn_blocking(move || store.get(&key)).await
    };

    match outcome {
        Ok(Ok(Some((value, ValueSource::Cache)))) => {
            (StatusCode::OK, format!("Value (from cache): {value}"))
        }
        Ok(Ok(Some((value, ValueSource::Backend)))) => {
            (StatusCode::OK, format!("Value (from DB): {value}"))
        }
        Ok(Ok(None)) => (StatusCode::NOT_FOUND, format!("Key not found: {key}")),
        Ok(Err(err)) => {
            // Read failures are indistinguishable from absence at this layer
            error!("read failed for key '{key}': {err}");
            (StatusCode::NOT_FOUND, format!("Key not found: {key}"))
        }
        Err(join_err) => {
            error!("read worker for key '{key}' died: {join_err}");
            (StatusCode::NOT_FOUND, format!("Key not found: {key}"))
        }
    }
}

async fn delete_handler<S>(
    State(store): State<Arc<KvStore<S>>>,
    Query(params): Query<KeyParams>,
) -> (StatusCode, String)
where
    S: KvBackend + 'static,
{
    let Some(key) = params.key else {
        return (StatusCode::BAD_REQUEST, "Missing 'key' parameter".to_string());
    };

    let outcome = {
        let store = Arc::clone(&store);
        let key = key.clone();
        tokio::task::spawn_blocking(move || store.delete(&key)).await
    };

    match outcome {
        Ok(Ok(())) => (StatusCode::OK, format!("Successfully deleted key: {key}")),
        Ok(Err(err)) => {
            error!("delete failed for key '{key}': {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to delete key: {key}"),
            )
        }
        Err(join_err) => {
            error!("delete worker for key '{key}' died: {join_err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to delete key: {key}"),
            )
        }
    }
}

async fn cache_status_handler<S>(State(store): State<Arc<KvStore<S>>>) -> (StatusCode, String)
where
    S: KvBackend + 'static,
{
    let snapshot = store.cache_snapshot();

    let mut body = String::new();
    body.push_str("--- Cache Status ---\n");
    let _ = writeln!(body, "Occupied: {} / {}", snapshot.len, snapshot.capacity);
    body.push('\n');
    body.push_str("--- Items (MRU to LRU) ---\n");
    if snapshot.is_empty() {
        body.push_str("(Cache is empty)\n");
    } else {
        for (position, (key, value)) in snapshot.entries.iter().enumerate() {
            let _ = writeln!(body, "{}. Key: '{}', Value: '{}'", position + 1, key, value);
        }
    }

    (StatusCode::OK, body)
}

async fn health_handler<S>(State(store): State<Arc<KvStore<S>>>) -> (StatusCode, String)
where
    S: KvBackend + 'static,
{
    if store.pool().is_connected() {
        (StatusCode::OK, "OK".to_string())
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            "backend unavailable".to_string(),
        )
    }
}
