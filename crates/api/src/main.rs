//! API server entry point.

use api::config::{Config, DatabaseConfig};
use ledger::{InMemoryInventoryLedger, InventoryLedger, PostgresInventoryLedger};
use metrics_exporter_prometheus::PrometheusHandle;
use reservations::{InMemoryReservationStore, RedisReservationStore, ReservationStore};
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
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let json = config.log_json.then(|| tracing_subscriber::fmt::layer().json());
    let text = (!config.log_json).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(text)
        .init();
}

async fn connect_ledger(db: &DatabaseConfig) -> PostgresInventoryLedger {
    let pool = PgPoolOptions::new()
        .max_connections(db.max_connections)
        .min_connections(db.min_connections)
        .max_lifetime(db.max_conn_lifetime)
        .connect(&db.url)
        .await
        .expect("failed to connect to database");

    let ledger = PostgresInventoryLedger::new(pool);
    ledger
        .run_migrations()
        .await
        .expect("failed to run migrations");
    ledger
}

async fn serve<L, R>(
    config: &Config,
    ledger: L,
    reservations: R,
    storage: &'static str,
    metrics_handle: PrometheusHandle,
) where
    L: InventoryLedger + Clone + 'static,
    R: ReservationStore + 'static,
{
    let state = api::create_state(ledger, reservations, config.purchase_config(), storage);
    let app = api::create_app(state, metrics_handle);

    let addr = config.addr();
    tracing::info!(%addr, storage, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

#[tokio::main]
async fn main() {
    // 1. Load configuration and initialize tracing
    let config = Config::from_env();
    init_tracing(&config);

    // 2. Install Prometheus metrics recorder
    let prometheus_builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let metrics_handle = prometheus_builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Wire storage backends and serve
    match (&config.database, &config.redis) {
        (Some(db), Some(redis)) => {
            let ledger = connect_ledger(db).await;
            let reservations = RedisReservationStore::connect(&redis.url(), config.cache_op_timeout)
                .await
                .expect("failed to connect to redis");
            serve(&config, ledger, reservations, "postgres+redis", metrics_handle).await;
        }
        (None, None) => {
            tracing::warn!("DB_URL and REDIS_HOST not set, using in-memory stores");
            serve(
                &config,
                InMemoryInventoryLedger::new(),
                InMemoryReservationStore::new(),
                "in-memory",
                metrics_handle,
            )
            .await;
        }
        (Some(_), None) | (None, Some(_)) => {
            tracing::error!("DB_URL and REDIS_HOST must be configured together");
            std::process::exit(1);
        }
    }

    tracing::info!("server shut down gracefully");
}
