//! File-backed persistence for the session tuple, the durable analogue of the
//! browser storage key the console previously used. The whole blob is
//! replaced on every mutation and never partially patched. Single-writer
//! model: there is no locking, only an atomic whole-file replace so a racing
//! writer clobbers but never corrupts.

use super::Session;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Well-known file name under the per-user config directory.
pub const STORAGE_FILE: &str = "session.json";

#[derive(Clone, Debug)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default location, `<config_dir>/sentinel/session.json`.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("sentinel").join(STORAGE_FILE))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the stored session. Absence and malformed JSON both yield
    /// `None`; this must not fail, a broken blob simply means logged out.
    #[must_use]
    pub fn read(&self) -> Option<Session> {
        let raw = fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str::<Session>(&raw) {
            Ok(session) => Some(session.normalized()),
            Err(err) => {
                debug!("discarding unparsable session blob: {err}");
                None
            }
        }
    }

    /// Replaces the stored value wholesale.
    ///
    /// # Errors
    /// Returns an error when the directory cannot be created or the file
    /// cannot be written.
    pub fn write(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating session dir {}", parent.display()))?;
        }

        let raw = serde_json::to_string(session).context("serializing session")?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, raw).with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("replacing {}", self.path.display()))?;
        Ok(())
    }

    /// Removes the stored value entirely. A missing file is already clear.
    ///
    /// # Errors
    /// Returns an error for I/O failures other than the file being absent.
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => {
                Err(err).with_context(|| format!("removing {}", self.path.display()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{Role, UserSummary};

    fn sample_session() -> Session {
        Session::authenticated(
            "tok-1",
            UserSummary {
                user_id: "u-1".to_string(),
                email: "user@sentinel.dev".to_string(),
                name: "User".to_string(),
                role: Role::Admin,
            },
        )
    }

    #[test]
    fn read_returns_none_when_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join(STORAGE_FILE));
        assert!(store.read().is_none());
    }

    #[test]
    fn write_then_read_round_trips() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let store = SessionStore::new(dir.path().join(STORAGE_FILE));

        store.write(&sample_session())?;
        let restored = store.read().expect("stored session");
        assert_eq!(restored, sample_session());
        Ok(())
    }

    #[test]
    fn malformed_blob_reads_as_none() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join(STORAGE_FILE);
        fs::write(&path, "{not even json")?;

        let store = SessionStore::new(path);
        assert!(store.read().is_none());
        Ok(())
    }

    #[test]
    fn read_normalizes_invariant_violations() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join(STORAGE_FILE);
        fs::write(
            &path,
            r#"{"accessToken":"tok","isAuthenticated":false,"user":null}"#,
        )?;

        let store = SessionStore::new(path);
        let session = store.read().expect("session");
        assert!(session.is_authenticated());
        Ok(())
    }

    #[test]
    fn clear_is_idempotent() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let store = SessionStore::new(dir.path().join(STORAGE_FILE));

        store.write(&sample_session())?;
        store.clear()?;
        store.clear()?;
        assert!(store.read().is_none());
        Ok(())
    }
}
