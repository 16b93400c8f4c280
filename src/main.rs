use std::sync::Arc;
use std::time::Duration;

use myschool_api::app::{self, AppState};
use myschool_api::cache::{Cache, MemoryCache};
use myschool_api::permissions::{PermissionStore, PgPermissionSource};
use myschool_api::users::{PgUserSource, UserSource};

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, API_KEY, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let config = myschool_api::config::config();
    tracing::info!("Starting MySchool API in {:?} mode", config.environment);

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect_lazy(&database_url)
        .expect("invalid DATABASE_URL");

    let cache: Arc<dyn Cache> = Arc::new(MemoryCache::new());
    let permissions = Arc::new(PermissionStore::new(
        cache,
        Arc::new(PgPermissionSource::new(pool.clone())),
        Duration::from_secs(config.security.permission_cache_ttl_secs),
    ));
    let users: Arc<dyn UserSource> = Arc::new(PgUserSource::new(pool));

    let app = app::router(AppState {
        security: Arc::new(config.security.clone()),
        permissions,
        users,
    });

    let port = std::env::var("PORT")
        .ok()
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("MySchool API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}
