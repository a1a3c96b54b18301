use blog_portal::{
    AppState,
    config::{AppConfig, Env},
    create_router,
    repository::{MemoryRepository, PostgresRepository, RepositoryState},
    session::{MemorySessionStore, SessionState},
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Loads configuration, installs logging, connects the entity store, and
/// serves the router.
#[tokio::main]
async fn main() {
    // 1. Configuration (fail-fast in production)
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // 2. Logging: RUST_LOG wins, otherwise sensible local defaults.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "blog_portal=debug,tower_http=info,axum=trace".into());

    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    // 3. Entity store: Postgres when configured, in-memory otherwise (local only).
    let repo: RepositoryState = match &config.db_url {
        Some(db_url) => {
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(db_url)
                .await
                .expect("FATAL: Failed to connect to Postgres. Check DATABASE_URL.");

            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .expect("FATAL: Failed to run database migrations.");

            Arc::new(PostgresRepository::new(pool)) as RepositoryState
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using the in-memory store; data is lost on exit");
            Arc::new(MemoryRepository::new()) as RepositoryState
        }
    };

    // 4. Sessions live in process memory.
    let sessions = Arc::new(MemorySessionStore::new()) as SessionState;

    let bind_addr = config.bind_addr.clone();
    let app_state = AppState {
        repo,
        sessions,
        config,
    };

    // 5. Router and server
    let app = create_router(app_state);

    let listener = TcpListener::bind(&bind_addr).await.unwrap();

    tracing::info!("Listening on {}", bind_addr);
    tracing::info!("API Documentation (Swagger UI) available at: http://{}/swagger-ui", bind_addr);

    axum::serve(listener, app).await.unwrap();
}
