//! API server entry point.

use std::sync::Arc;

use api::config::{Config, LogFormat};
use api::state::AppState;
use cart_store::{CartStore, InMemoryCartStore, PostgresCartStore};
use checkout::{HttpOrderService, InMemoryOrderService, OrderService};
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::postgres::PgPoolOptions;
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match config.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn serve<S, O>(config: &Config, state: AppState<S, O>, metrics_handle: PrometheusHandle)
where
    S: CartStore + 'static,
    O: OrderService + 'static,
{
    let app = api::create_app(Arc::new(state), metrics_handle);

    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

async fn serve_with_store<S>(config: &Config, store: S, metrics_handle: PrometheusHandle)
where
    S: CartStore + 'static,
{
    match &config.order_service_url {
        Some(url) => {
            tracing::info!(%url, timeout = ?config.order_service_timeout, "using HTTP order service");
            let orders = HttpOrderService::new(url.as_str());
            serve(config, AppState::with_config(store, orders, config), metrics_handle).await;
        }
        None => {
            tracing::warn!("ORDER_SERVICE_URL not set, using in-memory order service");
            let orders = InMemoryOrderService::new();
            serve(config, AppState::with_config(store, orders, config), metrics_handle).await;
        }
    }
}

#[tokio::main]
async fn main() {
    // 1. Load configuration and initialize tracing
    let config = Config::from_env();
    init_tracing(&config);

    // 2. Install Prometheus metrics recorder
    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Pick the cart store and start serving
    match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(url)
                .await
                .expect("failed to connect to database");
            let store = PostgresCartStore::new(pool);
            store
                .run_migrations()
                .await
                .expect("failed to run migrations");
            tracing::info!("using PostgreSQL cart store");
            serve_with_store(&config, store, metrics_handle).await;
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory cart store");
            serve_with_store(&config, InMemoryCartStore::new(), metrics_handle).await;
        }
    }

    tracing::info!("server shut down gracefully");
}
