//! User domain types.

use chrono::{DateTime, Utc};

use clementine_core::{Email, RoleSet, UserId};

/// A registered account (domain type).
///
/// Users are never hard-deleted; orders keep a valid owner for their
/// whole lifetime.
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Unique handle chosen at signup.
    pub username: String,
    /// Unique email, stored lowercased.
    pub email: Email,
    /// Roles held by this user (at least `user`).
    pub roles: RoleSet,
    /// Optional shipping/profile fields.
    pub profile: UserProfile,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Optional profile fields collected at signup or edited later.
#[derive(Debug, Clone, Default)]
pub struct UserProfile {
    pub full_name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
}
