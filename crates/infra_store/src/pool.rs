//! Connection pool construction

use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::error::StoreError;

/// Creates a PostgreSQL pool from a connection string
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<PgPool, StoreError> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Creates a pool from the `DATABASE_URL` environment variable
pub async fn create_pool_from_env() -> Result<PgPool, StoreError> {
    dotenvy::dotenv().ok();
    let url = std::env::var("DATABASE_URL")
        .map_err(|_| StoreError::ConnectionFailed("DATABASE_URL is not set".to_string()))?;
    create_pool(&url, 5).await
}
