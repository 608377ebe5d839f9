//! Admin user management.

use threadcart_api::db::UserRepository;

use super::CliError;

/// Grant the admin flag to an existing user.
///
/// # Errors
///
/// Returns `CliError` if the user does not exist or the update fails.
pub async fn grant(email: &str) -> Result<(), CliError> {
    let pool = super::connect().await?;

    let user_id = UserRepository::new(&pool).grant_admin(email).await?;
    tracing::info!(%user_id, email, "admin flag granted");
    Ok(())
}
