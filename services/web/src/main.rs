use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod error;
mod middleware;
mod models;
mod repositories;
mod routes;
mod session;
mod state;
mod templates;
#[cfg(test)]
mod testing;
mod validation;

use common::{
    cache::{RedisConfig, RedisPool},
    database::{DatabaseConfig, health_check, init_pool},
};

use crate::{
    config::{AppConfig, SessionBackend},
    repositories::{SnippetRepository, UserRepository},
    session::{AppSessionStore, MemorySessionStore, RedisSessionStore, session_layer},
    state::AppState,
    templates::Templates,
};

/// How often the in-memory session store drops expired records
const SESSION_SWEEP_PERIOD: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Snippetbox web service");

    let config = AppConfig::load().context("Failed to load configuration")?;

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    if health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    let store = match config.session_backend {
        SessionBackend::Redis => {
            let redis = RedisPool::new(&RedisConfig::from_env())?;
            if !redis.health_check().await? {
                anyhow::bail!("Failed to connect to Redis");
            }
            info!("Sessions stored in Redis");
            AppSessionStore::Redis(RedisSessionStore::new(redis))
        }
        SessionBackend::Memory => {
            info!("Sessions stored in process memory");
            let store = MemorySessionStore::default();
            tokio::spawn(store.clone().sweep_expired(SESSION_SWEEP_PERIOD));
            AppSessionStore::Memory(store)
        }
    };

    let app_state = AppState {
        snippets: Arc::new(SnippetRepository::new(pool.clone(), config.query_timeout())),
        users: Arc::new(UserRepository::new(pool, config.query_timeout())),
        sessions: session_layer(store, &config),
        templates: Arc::new(Templates::new().context("Failed to compile templates")?),
    };

    let app = routes::create_router(app_state);

    let listener = TcpListener::bind(&config.listen_addr).await?;
    info!("Web service listening on {}", config.listen_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Gracefully shutdown");
    Ok(())
}

/// Resolves on Ctrl-C or, on Unix, SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
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
}
