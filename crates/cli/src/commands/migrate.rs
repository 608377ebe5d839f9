//! Database migration command.
//!
//! Migrations live in `crates/api/migrations/` and are embedded at compile
//! time; the server never runs them on startup.

use super::CliError;

/// Run all pending migrations.
///
/// # Errors
///
/// Returns `CliError` if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), CliError> {
    let pool = super::connect().await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../api/migrations").run(&pool).await?;

    tracing::info!("Migrations complete");
    Ok(())
}
