mod auth;
mod category;
mod db;
mod error;
mod group;
mod middleware;
mod routes;
mod state;

use anyhow::Context;
use category::{
    category_memory_repository::InMemoryCategoryRepository,
    category_repository::{CategoryRepository, CategoryStore},
    category_service::CategoryService,
};
use db::{create_pool, run_migrations};
use group::{
    group_memory_repository::InMemoryGroupRepository,
    group_repository::{GroupRepository, GroupStore},
    group_service::GroupService,
};
use routes::create_router;
use state::{AppState, Config, StorageBackend};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,hobbyhub_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Arc::new(Config::from_env()?);

    // Create stores
    let (group_store, category_store): (Arc<dyn GroupStore>, Arc<dyn CategoryStore>) =
        match config.storage_backend {
            StorageBackend::Postgres => {
                let database_url = config
                    .database_url
                    .as_deref()
                    .context("DATABASE_URL must be set")?;

                // Sanitize URL for logging (hide password)
                let url_for_logging = database_url
                    .split('@')
                    .last()
                    .map(|host| format!("<hidden>@{}", host))
                    .unwrap_or_else(|| "<invalid format>".to_string());

                tracing::info!("Connecting to database at {}...", url_for_logging);
                let db = create_pool(database_url, config.database_max_connections)
                    .await
                    .with_context(|| format!("Failed to connect to database at {}", url_for_logging))?;

                tracing::info!("Running migrations...");
                run_migrations(&db).await?;

                (
                    Arc::new(GroupRepository::new(db.clone())) as Arc<dyn GroupStore>,
                    Arc::new(CategoryRepository::new(db)) as Arc<dyn CategoryStore>,
                )
            }
            StorageBackend::Memory => {
                tracing::warn!("Using in-memory storage; data is lost on restart");
                (
                    Arc::new(InMemoryGroupRepository::new()) as Arc<dyn GroupStore>,
                    Arc::new(InMemoryCategoryRepository::new()) as Arc<dyn CategoryStore>,
                )
            }
        };

    // Create services
    let category_service = CategoryService::new(category_store);
    let group_service = GroupService::new(group_store, category_service.clone());

    // Create application state
    let state = AppState {
        config: config.clone(),
        group_service,
        category_service,
    };

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.host, config.port);

    tracing::info!("Server starting on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
