//! Service entrypoint: configuration, tracing, database pool, and the
//! axum server wiring.

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderValue;
use axum::routing::get;
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use calmwave::adapters::http::billing::{billing_router, handlers::health, BillingAppState};
use calmwave::adapters::pixflow::PixflowGateway;
use calmwave::adapters::postgres::PostgresSubscriptionLedger;
use calmwave::adapters::vendra::VendraClient;
use calmwave::application::handlers::PollingPolicy;
use calmwave::config::AppConfig;
use calmwave::ports::CheckoutProvider;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    init_tracing(&config);

    let pool = PgPoolOptions::new()
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .connect(&config.database.url)
        .await?;

    if config.database.run_migrations {
        tracing::info!("Running database migrations");
        sqlx::migrate!("./migrations").run(&pool).await?;
    }

    let gateway = Arc::new(PixflowGateway::new(config.pixflow.clone())?);
    let ledger = Arc::new(PostgresSubscriptionLedger::new(pool));

    // Webhook processing only needs the shared token; the account API
    // client is optional.
    let checkout: Option<Arc<dyn CheckoutProvider>> = if config.vendra.has_api_credentials() {
        Some(Arc::new(VendraClient::new(config.vendra.clone())?))
    } else {
        tracing::warn!("Vendra API credentials not set, checkout endpoints disabled");
        None
    };

    let state = BillingAppState {
        gateway,
        ledger,
        checkout,
        webhook_token: config.vendra.webhook_token.clone(),
        polling: PollingPolicy::from_config(&config.pixflow),
    };

    let app = Router::new()
        .route("/health", get(health))
        .nest("/api", billing_router())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(cors_layer(&config));

    let addr = config.server.socket_addr()?;
    tracing::info!(%addr, environment = ?config.server.environment, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    if config.server.is_production() {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .server
        .cors_origins_list()
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    if origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
