//! Account route handlers.
//!
//! Signup and login return a bearer token plus the user's profile; the SPA
//! stores the token and sends it on every subsequent request. Password reset
//! is a two-step flow: request a mailed single-purpose token, then confirm
//! with the new password.

use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use clementine_core::Email;

use crate::db::users::UserRepository;
use crate::error::{Result, set_sentry_user};
use crate::middleware::RequireAuth;
use crate::models::user::{User, UserProfile};
use crate::services::auth::AuthService;
use crate::services::tokens::TokenPurpose;
use crate::state::AppState;

/// Signup request payload.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

/// Login request payload.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Profile fields a user may change about themselves.
#[derive(Debug, Deserialize)]
pub struct ProfileUpdateRequest {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

/// Password reset request payload (step one).
#[derive(Debug, Deserialize)]
pub struct PasswordResetRequest {
    pub email: String,
}

/// Password reset confirmation payload (step two).
#[derive(Debug, Deserialize)]
pub struct PasswordResetConfirm {
    pub token: String,
    pub password: String,
}

/// Public view of a user account.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub roles: Vec<String>,
    pub full_name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id.as_i32(),
            username: user.username,
            email: user.email.into_inner(),
            roles: user.roles.to_strings(),
            full_name: user.profile.full_name,
            address: user.profile.address,
            city: user.profile.city,
            state: user.profile.state,
            country: user.profile.country,
            created_at: user.created_at,
        }
    }
}

/// Token plus profile returned by signup and login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}

/// Create an account and log straight into it.
#[instrument(skip(state, payload), fields(username = %payload.username))]
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    let auth = AuthService::new(state.pool());
    let profile = UserProfile {
        full_name: payload.full_name,
        address: payload.address,
        city: payload.city,
        state: payload.state,
        country: payload.country,
    };

    let user = auth
        .signup(&payload.username, &payload.email, &payload.password, &profile)
        .await?;

    let token = state
        .tokens()
        .issue_login(user.id, &user.username, &user.roles)?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    tracing::info!(user_id = %user.id, "New account created");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: user.into(),
        }),
    ))
}

/// Login with email and password.
#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let auth = AuthService::new(state.pool());
    let user = auth.login(&payload.email, &payload.password).await?;

    let token = state
        .tokens()
        .issue_login(user.id, &user.username, &user.roles)?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    tracing::info!(user_id = %user.id, "Login");

    Ok(Json(AuthResponse {
        token,
        user: user.into(),
    }))
}

/// Get the authenticated user's profile.
///
/// Re-reads the user row so a deleted account invalidates the still-signed
/// token immediately.
#[instrument(skip(state, auth))]
pub async fn me(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
) -> Result<Json<UserResponse>> {
    let user = AuthService::new(state.pool()).get_user(auth.user_id).await?;
    Ok(Json(user.into()))
}

/// Update the authenticated user's profile fields.
#[instrument(skip(state, auth, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Json(payload): Json<ProfileUpdateRequest>,
) -> Result<Json<UserResponse>> {
    let profile = UserProfile {
        full_name: payload.full_name,
        address: payload.address,
        city: payload.city,
        state: payload.state,
        country: payload.country,
    };

    let user = UserRepository::new(state.pool())
        .update_profile(auth.user_id, &profile)
        .await?;
    tracing::info!(user_id = %auth.user_id, "Profile updated");

    Ok(Json(user.into()))
}

/// Request a password reset mail.
///
/// Always answers 202, whether or not the address has an account, so the
/// endpoint cannot be used to probe for registered emails. Mail failures are
/// logged and swallowed for the same reason.
#[instrument(skip(state, payload))]
pub async fn password_reset_request(
    State(state): State<AppState>,
    Json(payload): Json<PasswordResetRequest>,
) -> Result<StatusCode> {
    let Ok(email) = Email::parse(&payload.email) else {
        return Ok(StatusCode::ACCEPTED);
    };

    match UserRepository::new(state.pool()).get_by_email(&email).await? {
        Some(user) => {
            let token = state.tokens().issue_single_purpose(
                user.id,
                &user.username,
                &user.roles,
                TokenPurpose::PasswordReset,
            )?;

            if let Err(e) = state
                .mailer()
                .send_password_reset(&user.email, &user.username, &token)
                .await
            {
                tracing::warn!(user_id = %user.id, error = %e, "Password reset mail failed");
            } else {
                tracing::info!(user_id = %user.id, "Password reset mail sent");
            }
        }
        None => {
            tracing::info!("Password reset requested for unknown email");
        }
    }

    Ok(StatusCode::ACCEPTED)
}

/// Complete a password reset with a mailed token.
#[instrument(skip(state, payload))]
pub async fn password_reset_confirm(
    State(state): State<AppState>,
    Json(payload): Json<PasswordResetConfirm>,
) -> Result<StatusCode> {
    let claims = state
        .tokens()
        .verify(&payload.token, TokenPurpose::PasswordReset)?;

    AuthService::new(state.pool())
        .reset_password(claims.user_id, &payload.password)
        .await?;
    tracing::info!(user_id = %claims.user_id, "Password reset completed");

    Ok(StatusCode::OK)
}
