//! Resolved principals returned by the realm.

use serde::{Deserialize, Serialize};

use crate::directory::Group;

/// Authorization role granted to an identity.
///
/// Derived from a group name without any transformation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Authority(String);

impl Authority {
    /// Returns the same string as a string slice `&str`.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Authority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Directory user with its group memberships.
///
/// Carries no credential: the password checked during authentication is
/// never stored here.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    username: String,
    group_names: Vec<String>,
}

impl Identity {
    /// Create a new [`Identity`].
    pub fn new(username: impl Into<String>, group_names: Vec<String>) -> Self {
        Self {
            username: username.into(),
            group_names,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Group memberships, in directory order.
    pub fn group_names(&self) -> &[String] {
        &self.group_names
    }

    /// One authority per group, in the same order.
    pub fn authorities(&self) -> Vec<Authority> {
        self.group_names.iter().cloned().map(Authority).collect()
    }

    pub fn has_authority(&self, name: &str) -> bool {
        self.group_names.iter().any(|group| group == name)
    }

    /// Always `None`.
    pub fn password(&self) -> Option<&str> {
        None
    }

    // Account state is checked by the directory at authentication time.

    pub fn is_enabled(&self) -> bool {
        true
    }

    pub fn is_account_non_expired(&self) -> bool {
        true
    }

    pub fn is_account_non_locked(&self) -> bool {
        true
    }

    pub fn is_credentials_non_expired(&self) -> bool {
        true
    }
}

/// Canonical name of a directory group.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupIdentity {
    pub name: String,
}

impl From<Group> for GroupIdentity {
    fn from(group: Group) -> Self {
        Self { name: group.name }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorities_follow_groups() {
        let identity = Identity::new(
            "alice",
            vec!["jira-users".into(), "admins".into(), "dev".into()],
        );

        let authorities = identity.authorities();
        let names: Vec<&str> = authorities.iter().map(Authority::as_str).collect();
        assert_eq!(names, ["jira-users", "admins", "dev"]);
        assert!(identity.has_authority("admins"));
        assert!(!identity.has_authority("root"));
    }

    #[test]
    fn test_account_flags_are_constant() {
        let identity = Identity::new("bob", Vec::new());

        assert!(identity.authorities().is_empty());
        assert!(identity.password().is_none());
        assert!(identity.is_enabled());
        assert!(identity.is_account_non_expired());
        assert!(identity.is_account_non_locked());
        assert!(identity.is_credentials_non_expired());
    }

    #[test]
    fn test_serialized_identity_has_no_password() {
        let identity = Identity::new("alice", vec!["admins".into()]);
        let json = serde_json::to_value(&identity).unwrap();

        assert_eq!(
            json,
            serde_json::json!({ "username": "alice", "group_names": ["admins"] })
        );
    }

    #[test]
    fn test_group_identity_from_record() {
        let group = Group {
            name: "admins".into(),
            description: Some("administrators".into()),
            active: true,
        };

        assert_eq!(GroupIdentity::from(group).name, "admins");
    }
}
