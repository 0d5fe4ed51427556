//! Auth Gate
//!
//! Pluggable credential check used by the reserved `auth` command.
//!
//! Gates are shared by every session, so implementations must be callable
//! concurrently (stateless, immutable, or internally synchronized).

use std::collections::HashMap;
use std::fmt;

/// Decides whether a username/password pair is accepted
pub trait AuthGate: Send + Sync {
    fn authenticate(&self, username: &str, password: &str) -> bool;
}

/// Rejects every credential. Default gate for a server nobody configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct DenyAll;

impl AuthGate for DenyAll {
    fn authenticate(&self, _username: &str, _password: &str) -> bool {
        false
    }
}

/// Fixed in-memory credential table
#[derive(Default, Clone)]
pub struct StaticAuthGate {
    credentials: HashMap<String, String>,
}

impl StaticAuthGate {
    /// Build a gate from `(username, password)` pairs. Later pairs win.
    pub fn new<I, U, P>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (U, P)>,
        U: Into<String>,
        P: Into<String>,
    {
        Self {
            credentials: pairs
                .into_iter()
                .map(|(user, pass)| (user.into(), pass.into()))
                .collect(),
        }
    }

    /// Number of known users
    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }
}

impl AuthGate for StaticAuthGate {
    fn authenticate(&self, username: &str, password: &str) -> bool {
        self.credentials
            .get(username)
            .is_some_and(|expected| expected == password)
    }
}

// Never print passwords
impl fmt::Debug for StaticAuthGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut users: Vec<&String> = self.credentials.keys().collect();
        users.sort();
        f.debug_struct("StaticAuthGate").field("users", &users).finish()
    }
}
