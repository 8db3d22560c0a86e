//! Database migration command.
//!
//! Applies `crates/api/migrations/` to the database named by
//! `STRIDE_DATABASE_URL` (or `DATABASE_URL`).

use stride_api::db;

use super::{CommandError, database_url};

/// Run pending migrations.
///
/// # Errors
///
/// Returns an error if the URL is missing, the connection fails, or a
/// migration fails to apply.
pub async fn run() -> Result<(), CommandError> {
    let url = database_url()?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&url).await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../api/migrations").run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
