//! Signed bearer tokens for API sessions.
//!
//! Login tokens authenticate the SPA for 12 hours. Single-purpose tokens
//! (password reset, email change) live for 15 minutes and are never
//! interchangeable with login tokens: verification checks the embedded
//! purpose before trusting any other claim.

use chrono::Utc;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
    errors::ErrorKind,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use clementine_core::{RoleSet, UserId};

/// Lifetime of a login token.
const LOGIN_TTL_SECS: i64 = 12 * 60 * 60;

/// Lifetime of a single-purpose token.
const SINGLE_PURPOSE_TTL_SECS: i64 = 15 * 60;

/// Errors that can occur issuing or verifying tokens.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// The token's signature, structure, or claims are invalid.
    #[error("invalid token")]
    Invalid,
    /// The token has expired.
    #[error("token expired")]
    Expired,
    /// The token is valid but was issued for a different purpose.
    #[error("token not valid for this operation")]
    WrongPurpose,
    /// Signing failed.
    #[error("token signing failed: {0}")]
    Signing(String),
}

/// What a token authorizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenPurpose {
    /// Full API session.
    Login,
    /// Completing a password reset.
    PasswordReset,
    /// Confirming an email change.
    EmailChange,
}

/// JWT claims carried by every token.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: i32,
    username: String,
    roles: Vec<String>,
    purpose: TokenPurpose,
    iat: i64,
    exp: i64,
}

/// Verified identity extracted from a token.
#[derive(Debug, Clone)]
pub struct AuthClaims {
    pub user_id: UserId,
    pub username: String,
    pub roles: RoleSet,
    pub purpose: TokenPurpose,
}

/// Issues and verifies HS256-signed bearer tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenService {
    /// Create a token service from the session signing secret.
    #[must_use]
    pub fn new(secret: &SecretString) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 30;
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            validation,
        }
    }

    /// Issue a 12-hour login token.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Signing`] if encoding fails.
    pub fn issue_login(
        &self,
        user_id: UserId,
        username: &str,
        roles: &RoleSet,
    ) -> Result<String, TokenError> {
        self.issue(user_id, username, roles, TokenPurpose::Login, LOGIN_TTL_SECS)
    }

    /// Issue a 15-minute single-purpose token.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Signing`] if encoding fails, or
    /// [`TokenError::WrongPurpose`] when asked to mint a login token
    /// through this path.
    pub fn issue_single_purpose(
        &self,
        user_id: UserId,
        username: &str,
        roles: &RoleSet,
        purpose: TokenPurpose,
    ) -> Result<String, TokenError> {
        if purpose == TokenPurpose::Login {
            return Err(TokenError::WrongPurpose);
        }
        self.issue(user_id, username, roles, purpose, SINGLE_PURPOSE_TTL_SECS)
    }

    fn issue(
        &self,
        user_id: UserId,
        username: &str,
        roles: &RoleSet,
        purpose: TokenPurpose,
        ttl_secs: i64,
    ) -> Result<String, TokenError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id.as_i32(),
            username: username.to_owned(),
            roles: roles.to_strings(),
            purpose,
            iat: now,
            exp: now + ttl_secs,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verify a login token.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Expired`] past the expiry, [`TokenError::WrongPurpose`]
    /// for single-purpose tokens, and [`TokenError::Invalid`] for anything else.
    pub fn verify_login(&self, token: &str) -> Result<AuthClaims, TokenError> {
        self.verify(token, TokenPurpose::Login)
    }

    /// Verify a token against an expected purpose.
    ///
    /// # Errors
    ///
    /// Same contract as [`Self::verify_login`].
    pub fn verify(&self, token: &str, expected: TokenPurpose) -> Result<AuthClaims, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            }
        })?;

        let claims = data.claims;
        if claims.purpose != expected {
            return Err(TokenError::WrongPurpose);
        }

        let roles = RoleSet::parse(&claims.roles).map_err(|_| TokenError::Invalid)?;

        Ok(AuthClaims {
            user_id: UserId::new(claims.sub),
            username: claims.username,
            roles,
            purpose: claims.purpose,
        })
    }
}
