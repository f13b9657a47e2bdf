use crate::types::Role;
use serde::{Deserialize, Serialize};

/// The user driving a wizard session. The role is passed explicitly into
/// every decision instead of being read from ambient auth state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActingUser {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub role: Role,
}

impl ActingUser {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            role,
        }
    }
}

/// A directory entry that may be picked as the responsible party.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryUser {
    pub id: String,
    pub name: String,
    pub role: Role,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl DirectoryUser {
    pub fn new(id: impl Into<String>, name: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role,
            is_active: true,
        }
    }
}

/// Snapshot of the users a draft's `responsible_id` may reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AssignableUsers {
    users: Vec<DirectoryUser>,
}

impl AssignableUsers {
    /// Keep only active users whose role is in `roles`.
    pub fn filtered(users: Vec<DirectoryUser>, roles: &[Role]) -> Self {
        Self {
            users: users
                .into_iter()
                .filter(|u| u.is_active && roles.contains(&u.role))
                .collect(),
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.users.iter().any(|u| u.id == id)
    }

    pub fn get(&self, id: &str) -> Option<&DirectoryUser> {
        self.users.iter().find(|u| u.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DirectoryUser> {
        self.users.iter()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filtered_drops_inactive_and_unlisted_roles() {
        let mut gone = DirectoryUser::new("u3", "Gone", Role::Lawyer);
        gone.is_active = false;
        let users = AssignableUsers::filtered(
            vec![
                DirectoryUser::new("u1", "Ana", Role::Lawyer),
                DirectoryUser::new("u2", "Root", Role::Admin),
                gone,
            ],
            &[Role::Lawyer, Role::Agent],
        );
        assert_eq!(users.len(), 1);
        assert!(users.contains("u1"));
        assert!(!users.contains("u2"));
        assert!(!users.contains("u3"));
    }
}
