pub mod history_repository;

use sqlx::MySqlPool;
use sqlx::mysql::MySqlPoolOptions;

/// Create the history store pool.
///
/// Connections are established lazily so the gateway comes up even when
/// the store is temporarily unreachable; inserts then fail per request.
pub fn create_pool(database_url: &str) -> Result<MySqlPool, sqlx::Error> {
    MySqlPoolOptions::new()
        .max_connections(10)
        .connect_lazy(database_url)
}

/// Apply the history schema.
pub async fn run_migrations(pool: &MySqlPool) -> Result<(), sqlx::Error> {
    sqlx::query(SCHEMA_SQL).execute(pool).await?;
    log::info!("History schema applied");
    Ok(())
}

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS history (
    id INT AUTO_INCREMENT PRIMARY KEY,
    filename VARCHAR(255) NOT NULL,
    classification VARCHAR(64) NOT NULL,
    accuracy FLOAT NOT NULL,
    dryness_level INT NOT NULL,
    is_banana BOOLEAN NOT NULL,
    created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
)
"#;
