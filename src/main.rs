use std::sync::Arc;

use sqlx::sqlite::SqlitePoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use laurel::{
    auth::HeaderSessionProvider,
    config::Settings,
    domain::PointConfig,
    invalidation::LogSink,
    service::ServiceContext,
    storage::FsObjectStorage,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "laurel=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let settings = Settings::new().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config: {}. Using defaults.", e);
        Settings::default()
    });

    tracing::info!(
        "Starting Laurel server on {}:{}",
        settings.server.host,
        settings.server.port
    );

    // Point categories are configuration, not data; a bad list is fatal.
    let point_config = PointConfig::parse(&settings.points.types_json)
        .map_err(|e| anyhow::anyhow!("Invalid point type configuration: {}", e))?;

    // Initialize database
    let db_pool = SqlitePoolOptions::new()
        .max_connections(settings.database.max_connections)
        .connect(&settings.database.url)
        .await?;

    // Run migrations
    sqlx::migrate!("./migrations").run(&db_pool).await?;

    // Evidence object storage
    let storage = Arc::new(FsObjectStorage::new(&settings.storage.uploads_dir));

    // Create service context
    let service_context = Arc::new(ServiceContext::new(
        db_pool.clone(),
        point_config,
        settings.points.max_boost,
        storage,
    ));

    service_context
        .invalidation_manager
        .register(Arc::new(LogSink))
        .await;

    // Session emails arrive from the fronting auth proxy
    let session_provider = Arc::new(HeaderSessionProvider);

    let app = laurel::api::create_app(
        service_context,
        session_provider,
        Arc::new(settings.clone()),
    );

    let listener = tokio::net::TcpListener::bind(format!(
        "{}:{}",
        settings.server.host, settings.server.port
    ))
    .await?;

    tracing::info!(
        "Server listening on http://{}:{}",
        settings.server.host,
        settings.server.port
    );

    axum::serve(listener, app).await?;

    Ok(())
}
