//! Account role management commands.
//!
//! # Usage
//!
//! ```bash
//! # Grant the admin role to an existing account
//! clementine-cli grant-admin -e shopkeeper@example.com
//! ```
//!
//! # Environment Variables
//!
//! - `API_DATABASE_URL` - `PostgreSQL` connection string (falls back to
//!   `DATABASE_URL`)

use clementine_core::Email;

use super::{CommandError, connect};

/// Add the `admin` role to the account with the given email.
///
/// Re-running for an account that is already an admin is a no-op.
///
/// # Arguments
///
/// * `email` - The account's email address
///
/// # Returns
///
/// The ID of the updated account.
///
/// # Errors
///
/// Returns an error if the email is invalid, no account matches, or a
/// database operation fails.
pub async fn grant_admin(email: &str) -> Result<i32, CommandError> {
    let email = Email::parse(email).map_err(|_| CommandError::InvalidEmail(email.to_owned()))?;

    let pool = connect().await?;

    let user_id: Option<i32> = sqlx::query_scalar("SELECT id FROM users WHERE email = $1")
        .bind(email.as_str())
        .fetch_optional(&pool)
        .await?;

    let Some(user_id) = user_id else {
        return Err(CommandError::UserNotFound(email.into_inner()));
    };

    let updated: Option<i32> = sqlx::query_scalar(
        "UPDATE users
         SET roles = array_append(roles, 'admin'), updated_at = NOW()
         WHERE id = $1 AND NOT ('admin' = ANY(roles))
         RETURNING id",
    )
    .bind(user_id)
    .fetch_optional(&pool)
    .await?;

    if updated.is_some() {
        tracing::info!(user_id, email = %email, "Admin role granted");
    } else {
        tracing::info!(user_id, email = %email, "Account already has the admin role");
    }

    Ok(user_id)
}
