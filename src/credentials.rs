//! In-memory credential store for the REST surface.
//!
//! Built once from configuration at startup and never mutated afterwards,
//! so concurrent reads need no synchronization.

use std::collections::HashMap;

use crate::config::UserConfig;

/// A stored principal: identifier, secret and granted roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub username: String,
    pub secret: String,
    pub roles: Vec<String>,
}

/// Immutable mapping from principal identifier to [`Credential`].
#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    users: HashMap<String, Credential>,
}

impl CredentialStore {
    /// Build the store from configured user entries. Later duplicates of a
    /// username replace earlier ones.
    pub fn from_users(users: &[UserConfig]) -> Self {
        let users = users
            .iter()
            .map(|u| {
                (
                    u.username.clone(),
                    Credential {
                        username: u.username.clone(),
                        secret: u.password.clone(),
                        roles: u.roles.clone(),
                    },
                )
            })
            .collect();
        Self { users }
    }

    /// Look up a principal. Absence is a normal outcome, not an error.
    pub fn lookup(&self, username: &str) -> Option<&Credential> {
        self.users.get(username)
    }

    /// Check a username/password pair. Returns the credential on success.
    ///
    /// Unknown user and wrong password are indistinguishable to the caller;
    /// surfacing the difference would enable username enumeration.
    pub fn authenticate(&self, username: &str, password: &str) -> Option<&Credential> {
        self.lookup(username).filter(|c| c.secret == password)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
