use std::sync::Arc;

use anyhow::Context;
use axum::{Router, middleware, routing::get};
use forum_api::{config::ApiConfig, state::ApiState};
use forum_db::{MemoryTopicStore, PgTopicStore, TopicStore};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration from environment variables
    dotenvy::dotenv().ok();
    let config = ApiConfig::from_env().context("invalid configuration")?;

    forum_api::tracing::init_tracing(config.env)?;

    let metrics_handle = forum_api::metrics::init_metrics()?;
    tracing::info!("Prometheus metrics exporter initialized");

    let store: Arc<dyn TopicStore> = match config.database_url.as_deref() {
        Some(database_url) => {
            let pool = forum_db::create_pool(database_url, config.db_max_connections).await?;
            forum_db::ensure_db_and_migrate(database_url, &pool).await?;
            tracing::info!("Connected to PostgreSQL, migrations applied");
            Arc::new(PgTopicStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, topics are kept in memory only");
            Arc::new(MemoryTopicStore::seeded())
        }
    };

    let state = ApiState::new(&config, store);

    let cors = forum_api::middleware::cors::create_cors_layer(config.parsed_allowed_origins());

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    // Metrics endpoint has its own state
    let metrics_app = Router::new()
        .route("/metrics", get(forum_api::metrics::metrics_handler))
        .with_state(metrics_handle);

    let app = forum_api::router::router()
        .with_state(state)
        .merge(metrics_app)
        .layer(cors)
        .layer(trace_layer)
        .layer(middleware::from_fn(forum_api::metrics::track_metrics))
        .layer(middleware::from_fn(
            forum_api::middleware::request_id::request_id_middleware,
        ));

    // X-Content-Type-Options, X-Frame-Options, HSTS in production
    let app = forum_api::middleware::security_headers::apply_security_headers(app, config.env);

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;
    tracing::info!("Server running on http://{address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
    }
}
