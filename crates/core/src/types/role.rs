//! User roles and role sets.

use serde::{Deserialize, Serialize};

/// A role a user can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Regular shopper.
    #[default]
    User,
    /// Store administrator with access to the admin surface.
    Admin,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = RoleSetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            _ => Err(RoleSetError::UnknownRole(s.to_owned())),
        }
    }
}

/// Errors that can occur building a [`RoleSet`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RoleSetError {
    /// The set would be empty.
    #[error("a user must hold at least one role")]
    Empty,
    /// A role string is not recognized.
    #[error("unknown role: {0}")]
    UnknownRole(String),
}

/// The non-empty set of roles a user holds.
///
/// Every user holds at least `user`; admins additionally hold `admin`.
/// The set is deduplicated and kept in a fixed order so that serialized
/// forms and database values compare stably.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleSet(Vec<Role>);

impl RoleSet {
    /// Build a role set from parsed roles.
    ///
    /// # Errors
    ///
    /// Returns [`RoleSetError::Empty`] if `roles` is empty.
    pub fn new(roles: Vec<Role>) -> Result<Self, RoleSetError> {
        if roles.is_empty() {
            return Err(RoleSetError::Empty);
        }
        let mut roles = roles;
        roles.sort_unstable_by_key(|r| match r {
            Role::User => 0u8,
            Role::Admin => 1u8,
        });
        roles.dedup();
        Ok(Self(roles))
    }

    /// Parse a role set from raw strings, e.g. a `TEXT[]` column.
    ///
    /// # Errors
    ///
    /// Returns [`RoleSetError::UnknownRole`] on the first unrecognized
    /// string, or [`RoleSetError::Empty`] for an empty list.
    pub fn parse<I, S>(raw: I) -> Result<Self, RoleSetError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let roles = raw
            .into_iter()
            .map(|s| s.as_ref().parse())
            .collect::<Result<Vec<Role>, _>>()?;
        Self::new(roles)
    }

    /// The set every newly signed-up user starts with.
    #[must_use]
    pub fn default_user() -> Self {
        Self(vec![Role::User])
    }

    /// Whether the set contains `role`.
    #[must_use]
    pub fn contains(&self, role: Role) -> bool {
        self.0.contains(&role)
    }

    /// Whether the user holds the admin role.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.contains(Role::Admin)
    }

    /// The roles in the set, in stable order.
    #[must_use]
    pub fn as_slice(&self) -> &[Role] {
        &self.0
    }

    /// String forms of the roles, for storage as `TEXT[]`.
    #[must_use]
    pub fn to_strings(&self) -> Vec<String> {
        self.0.iter().map(ToString::to_string).collect()
    }
}

impl Default for RoleSet {
    fn default() -> Self {
        Self::default_user()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_role_roundtrip() {
        assert_eq!("user".parse::<Role>().unwrap(), Role::User);
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!(Role::Admin.to_string(), "admin");
    }

    #[test]
    fn test_unknown_role_rejected() {
        assert!(matches!(
            "root".parse::<Role>(),
            Err(RoleSetError::UnknownRole(_))
        ));
    }

    #[test]
    fn test_empty_set_rejected() {
        assert!(matches!(RoleSet::new(vec![]), Err(RoleSetError::Empty)));
        assert!(matches!(
            RoleSet::parse(Vec::<String>::new()),
            Err(RoleSetError::Empty)
        ));
    }

    #[test]
    fn test_dedup_and_order() {
        let set = RoleSet::new(vec![Role::Admin, Role::User, Role::Admin]).unwrap();
        assert_eq!(set.as_slice(), &[Role::User, Role::Admin]);
    }

    #[test]
    fn test_parse_from_column_values() {
        let set = RoleSet::parse(["admin", "user"]).unwrap();
        assert!(set.is_admin());
        assert_eq!(set.to_strings(), vec!["user", "admin"]);
    }

    #[test]
    fn test_default_user() {
        let set = RoleSet::default();
        assert!(set.contains(Role::User));
        assert!(!set.is_admin());
    }

    #[test]
    fn test_serde_transparent() {
        let set = RoleSet::parse(["user", "admin"]).unwrap();
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"["user","admin"]"#);
        let back: RoleSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, set);
    }
}
