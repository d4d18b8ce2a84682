//! In-memory mirror of the persisted session for the running process. Two
//! states, Anonymous and Authenticated; every mutation funnels through the
//! named transitions and writes through to the store. Backend invalidation
//! of server-side sessions is the caller's fire-and-forget concern; local
//! state is cleared unconditionally.

use super::{Session, SessionStore, UserSummary};
use anyhow::Result;
use tracing::debug;

#[derive(Debug)]
pub struct AuthState {
    session: Session,
    store: SessionStore,
    hydrated: bool,
}

impl AuthState {
    #[must_use]
    pub fn new(store: SessionStore) -> Self {
        Self {
            session: Session::anonymous(),
            store,
            hydrated: false,
        }
    }

    /// Attempts hydration from the store exactly once. A missing or
    /// unparsable blob leaves the default Anonymous state without
    /// surfacing an error.
    pub fn hydrate(&mut self) {
        if self.hydrated {
            return;
        }
        self.hydrated = true;
        if let Some(session) = self.store.read() {
            debug!("session hydrated from {}", self.store.path().display());
            self.session = session;
        }
    }

    /// Anonymous -> Authenticated, writing through to the store.
    ///
    /// # Errors
    /// Returns an error when the store cannot be written; in-memory state is
    /// already updated at that point.
    pub fn login(&mut self, access_token: impl Into<String>, user: UserSummary) -> Result<()> {
        self.session = Session::authenticated(access_token, user);
        self.store.write(&self.session)
    }

    /// Authenticated -> Anonymous. Local-only; the store is cleared even if
    /// a preceding backend call failed.
    ///
    /// # Errors
    /// Returns an error when the stored blob cannot be removed; in-memory
    /// state is reset regardless.
    pub fn logout(&mut self) -> Result<()> {
        self.session = Session::anonymous();
        self.store.clear()
    }

    /// Same local transition as [`AuthState::logout`]; the caller invalidates
    /// all server-side sessions beforehand.
    ///
    /// # Errors
    /// See [`AuthState::logout`].
    pub fn logout_all(&mut self) -> Result<()> {
        self.logout()
    }

    #[must_use]
    pub fn token(&self) -> Option<&str> {
        if self.session.access_token().is_empty() {
            None
        } else {
            Some(self.session.access_token())
        }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{store::STORAGE_FILE, Role};
    use std::fs;

    fn sample_user() -> UserSummary {
        UserSummary {
            user_id: "u-9".to_string(),
            email: "admin@sentinel.dev".to_string(),
            name: "Admin".to_string(),
            role: Role::Admin,
        }
    }

    #[test]
    fn login_writes_through_and_logout_clears() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let store = SessionStore::new(dir.path().join(STORAGE_FILE));
        let mut state = AuthState::new(store.clone());

        state.login("tok-1", sample_user())?;
        assert!(state.is_authenticated());
        assert_eq!(state.token(), Some("tok-1"));
        assert!(store.read().is_some());

        state.logout()?;
        assert!(!state.is_authenticated());
        assert_eq!(state.token(), None);
        assert!(store.read().is_none());
        Ok(())
    }

    #[test]
    fn logout_resets_memory_even_if_store_clear_fails() -> Result<()> {
        let dir = tempfile::tempdir()?;
        // Point the store at a path whose parent is a file so clear() can
        // fail with something other than NotFound.
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "x")?;
        let store = SessionStore::new(blocker.join("session.json"));
        let mut state = AuthState::new(store);
        state.session = Session::authenticated("tok", sample_user());

        let _ = state.logout();
        assert!(!state.is_authenticated());
        Ok(())
    }

    #[test]
    fn hydrate_runs_once_and_degrades_silently() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join(STORAGE_FILE);
        fs::write(&path, "garbage")?;

        let store = SessionStore::new(path.clone());
        let mut state = AuthState::new(store.clone());
        state.hydrate();
        assert!(!state.is_authenticated());

        // A session appearing later is not picked up; hydration is one-shot.
        store.write(&Session::authenticated("tok", sample_user()))?;
        state.hydrate();
        assert!(!state.is_authenticated());
        Ok(())
    }

    #[test]
    fn logout_all_is_the_same_local_transition() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let store = SessionStore::new(dir.path().join(STORAGE_FILE));
        let mut state = AuthState::new(store.clone());

        state.login("tok", sample_user())?;
        state.logout_all()?;
        assert!(!state.is_authenticated());
        assert!(store.read().is_none());
        Ok(())
    }
}
