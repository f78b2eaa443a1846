//! Database migration commands.
//!
//! The storefront owns a single table, the `tower-sessions` session table,
//! whose schema is managed by `tower-sessions-sqlx-store`.
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string

use tower_sessions_sqlx_store::PostgresStore;

use super::{CommandError, connect};

/// Create the session schema and table if they do not exist.
///
/// # Errors
///
/// Returns `CommandError` if the database URL is missing or the migration fails.
pub async fn sessions() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!("Creating session table...");
    PostgresStore::new(pool).migrate().await?;

    tracing::info!("Session table ready");
    Ok(())
}
