//! Database migration command.
//!
//! # Environment Variables
//!
//! - `MADRONA_DATABASE_URL` - `PostgreSQL` connection string

use madrona_store::{StoreConfig, db};

/// Errors that can occur while migrating.
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("configuration error: {0}")]
    Config(#[from] madrona_store::ConfigError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run the store schema migrations.
///
/// # Errors
///
/// Returns `MigrationError` if configuration is missing, the database is
/// unreachable, or a migration fails.
pub async fn run() -> Result<(), MigrationError> {
    let config = StoreConfig::from_env()?;

    tracing::info!("connecting to store database");
    let pool = db::create_pool(&config).await?;

    tracing::info!("running store migrations");
    db::MIGRATOR.run(&pool).await?;

    tracing::info!("store migrations complete");
    Ok(())
}
