//! Session maintenance commands.

use tower_sessions::ExpiredDeletion;
use tower_sessions_sqlx_store::PostgresStore;

use super::{CommandError, connect};

/// Delete every session whose expiry has passed.
///
/// # Errors
///
/// Returns `CommandError` if the database URL is missing or the delete fails.
pub async fn purge() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!("Deleting expired sessions...");
    PostgresStore::new(pool).delete_expired().await?;

    tracing::info!("Expired sessions deleted");
    Ok(())
}
