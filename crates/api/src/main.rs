use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use competency_api::config::{ServerConfig, StoreBackend};
use competency_api::router::build_app_router;
use competency_api::state::AppState;
use competency_core::store::CompetencyStore;
use competency_db::PgCompetencyStore;
use competency_engine::{CompetencyEngine, EngineConfig, InMemoryStore};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "competency_api=debug,competency_engine=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    let engine_config = EngineConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = %config.port,
        backend = ?config.store_backend,
        level_min = engine_config.level_scale.min(),
        level_max = engine_config.level_scale.max(),
        "Loaded server configuration"
    );

    // --- Backing store ---
    let store: Arc<dyn CompetencyStore> = match config.store_backend {
        StoreBackend::Postgres => Arc::new(connect_postgres().await),
        StoreBackend::Memory => {
            let store = InMemoryStore::new();
            seed_demo_catalog(&store).await;
            tracing::warn!("Using in-memory store; data is lost on shutdown");
            Arc::new(store)
        }
    };

    let state = AppState {
        engine: CompetencyEngine::new(store, engine_config),
        config: Arc::new(config.clone()),
    };
    let app = build_app_router(state);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Graceful shutdown complete");
}

/// Connect, health-check and migrate the database, panicking on any failure.
async fn connect_postgres() -> PgCompetencyStore {
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = competency_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    competency_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    competency_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    PgCompetencyStore::new(pool)
}

/// Reference data for the `memory` backend, which has no other way to
/// receive competencies and positions.
async fn seed_demo_catalog(store: &InMemoryStore) {
    for (name, category) in [
        ("Communication", "Interpersonal"),
        ("Delegation", "Leadership"),
        ("Planning", "Leadership"),
        ("Coaching", "Leadership"),
        ("SQL", "Technical"),
    ] {
        store.add_competency(name, Some(category)).await;
    }
    for (title, department) in [
        ("Engineering Manager", "Engineering"),
        ("Team Lead", "Engineering"),
        ("Data Analyst", "Analytics"),
    ] {
        store.add_position(title, Some(department)).await;
    }
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
