//! money_transfer - Money Transfer Backend API
//!
//! Moves money between accounts in possibly different currencies,
//! converting through an external rate service with bounded retries.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use money_transfer::api::{self, AppState};
use money_transfer::engine::TransferEngine;
use money_transfer::rates::{CurrencyConverter, HttpRateClient};
use money_transfer::service::{AccountService, UserService};
use money_transfer::store::{PgAccountStore, PgTransactionLog, PgUserStore};
use money_transfer::{db, Config};

/// Initialize tracing/logging
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "money_transfer=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wire stores, gateway, engine, and services into the router state
fn build_state(pool: sqlx::PgPool, config: &Config) -> AppState {
    let accounts = Arc::new(PgAccountStore::new(pool.clone()));
    let users = Arc::new(PgUserStore::new(pool.clone()));
    let log = Arc::new(PgTransactionLog::new(pool));

    let converter = CurrencyConverter::new(
        Arc::new(HttpRateClient::new(config.rate_service_url.clone())),
        config.retry_policy(),
    );

    let engine = TransferEngine::new(accounts.clone(), log.clone(), converter.clone());
    let account_service = AccountService::new(
        accounts.clone(),
        users.clone(),
        log,
        engine.clone(),
        converter,
    );
    let user_service = UserService::new(users, accounts, account_service.clone());

    AppState {
        engine,
        accounts: account_service,
        users: user_service,
    }
}

/// Build the application router
fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", axum::routing::get(health_check))
        .nest("/api/v1", api::create_router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    init_tracing();

    let config = Config::from_env()?;
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    tracing::info!("Starting money_transfer server");
    tracing::info!("Connecting to database...");

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await?;

    db::verify_connection(&pool).await?;

    if !db::check_schema(&pool).await? {
        tracing::error!("Database schema is not complete. Please run migrations.");
        return Err(anyhow::anyhow!("Database schema incomplete"));
    }

    tracing::info!("Database connected successfully");
    tracing::info!(rate_service = %config.rate_service_url, "Using external rate service");
    tracing::info!("Listening on http://{}", addr);

    let app = build_router(build_state(pool.clone(), &config));

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutting down...");
    pool.close().await;
    tracing::info!("Database connections closed. Goodbye!");

    Ok(())
}

/// Shutdown signal handler for graceful shutdown
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}
