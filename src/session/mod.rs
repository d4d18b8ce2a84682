//! Client-side session state: the `{accessToken, isAuthenticated, user}`
//! tuple persisted between runs, plus the in-memory auth state machine.

pub mod state;
pub mod store;

pub use state::AuthState;
pub use store::{SessionStore, STORAGE_FILE};

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Role {
    #[serde(rename = "ROLE_USER")]
    User,
    #[serde(rename = "ROLE_ADMIN")]
    Admin,
}

/// Immutable user snapshot returned at login. Not refreshed independently;
/// stale until the next login.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub user_id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
}

/// The persisted session tuple. Constructors enforce the invariant
/// `is_authenticated == !access_token.is_empty()`, and a blob read back from
/// storage is normalized rather than trusted.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    access_token: String,
    is_authenticated: bool,
    user: Option<UserSummary>,
}

impl Session {
    #[must_use]
    pub fn anonymous() -> Self {
        Self {
            access_token: String::new(),
            is_authenticated: false,
            user: None,
        }
    }

    /// Builds an authenticated session. An empty token degrades to the
    /// anonymous session so the invariant cannot be violated from outside.
    #[must_use]
    pub fn authenticated(access_token: impl Into<String>, user: UserSummary) -> Self {
        let access_token = access_token.into();
        if access_token.is_empty() {
            return Self::anonymous();
        }
        Self {
            access_token,
            is_authenticated: true,
            user: Some(user),
        }
    }

    #[must_use]
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.is_authenticated
    }

    #[must_use]
    pub fn user(&self) -> Option<&UserSummary> {
        self.user.as_ref()
    }

    /// Re-derives the invariant after deserialization. A stored blob with a
    /// token but a stale flag (or the reverse) is repaired here.
    #[must_use]
    pub(crate) fn normalized(mut self) -> Self {
        self.is_authenticated = !self.access_token.is_empty();
        if !self.is_authenticated {
            self.user = None;
        }
        self
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::anonymous()
    }
}

// The token is a credential; keep it out of debug logs.
impl fmt::Debug for Session {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Session")
            .field("access_token", &"<redacted>")
            .field("is_authenticated", &self.is_authenticated)
            .field("user", &self.user)
            .finish()
    }
}
