/*
 * Responsibility
 * - Config読み込み → 依存生成 (store / id codec / image dir) → Router 組み立て
 * - Middleware の適用 (HTTP / CORS)
 * - axum::serve() で起動、終了シグナルで drain → store を close
 */
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    api,
    config::Config,
    middleware,
    repos::{InMemoryPostStore, PgPostStore, PostStore},
    services::{IdCodec, ImageStore},
    state::AppState,
};

pub async fn run() -> Result<()> {
    let config = Config::from_env()?;
    init_tracing();

    let id_codec = IdCodec::new(config.sqids_min_length, &config.sqids_alphabet)?;
    let images = ImageStore::open(&config.image_dir).await?;
    let posts = open_post_store(&config).await?;

    tracing::info!(
        store = posts.backend_name(),
        image_dir = %images.dir().display(),
        "application state initialized"
    );

    let state = AppState::new(Arc::clone(&posts), id_codec, images);
    let app = build_router(state, &config);

    let listener = TcpListener::bind(config.addr).await?;
    tracing::info!(addr = %config.addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    posts.close().await;
    tracing::info!("shutdown complete");
    Ok(())
}

pub fn build_router(state: AppState, config: &Config) -> Router {
    let router = api::routes().with_state(state);
    let router = middleware::http::apply(router, config);
    middleware::cors::apply(router, config)
}

async fn open_post_store(config: &Config) -> Result<Arc<dyn PostStore>> {
    let Some(url) = config.database_url.as_deref() else {
        tracing::warn!("DATABASE_URL not set. Posts are kept in memory and lost on restart.");
        return Ok(Arc::new(InMemoryPostStore::new()));
    };

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(url)
        .await?;

    let store = PgPostStore::new(pool);
    store.ensure_schema().await?;
    tracing::info!("database connection established");

    Ok(Arc::new(store))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,posts_api=debug,tower_http=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
