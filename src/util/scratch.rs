//! Transient materialization of downloaded bytes. A scratch file is the
//! disk-side analogue of a temporary object URL: it exists so the bytes can
//! be viewed or handed to another program, and it must not leak. Release is
//! deterministic on drop, with a delayed background sweep as a stopgap for
//! handles that are forgotten rather than dropped.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

/// How long the background sweep waits before revoking an unkept file.
pub const RELEASE_AFTER: Duration = Duration::from_secs(60);

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
    kept: Arc<AtomicBool>,
}

impl ScratchFile {
    /// Writes `bytes` under `dir` with a collision-free name and schedules
    /// the delayed sweep when a tokio runtime is running.
    ///
    /// # Errors
    /// Returns an error when the directory or file cannot be written.
    pub fn materialize(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("creating scratch dir {}", dir.display()))?;

        let sequence = SEQUENCE.fetch_add(1, Ordering::SeqCst);
        let name = format!("{}-{}-{}", std::process::id(), sequence, sanitize(file_name));
        let path = dir.join(name);
        fs::write(&path, bytes).with_context(|| format!("writing {}", path.display()))?;

        let kept = Arc::new(AtomicBool::new(false));
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let sweep_path = path.clone();
            let sweep_kept = Arc::clone(&kept);
            handle.spawn(async move {
                sleep(RELEASE_AFTER).await;
                if !sweep_kept.load(Ordering::SeqCst) {
                    debug!("revoking scratch file {}", sweep_path.display());
                    let _ = tokio::fs::remove_file(&sweep_path).await;
                }
            });
        }

        Ok(Self { path, kept })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Defuses both the drop cleanup and the delayed sweep, handing the file
    /// over to the caller for good.
    #[must_use]
    pub fn keep(self) -> PathBuf {
        self.kept.store(true, Ordering::SeqCst);
        self.path.clone()
    }

    /// Releases the file now instead of waiting for drop.
    pub fn release(self) {}
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        if !self.kept.load(Ordering::SeqCst) {
            let _ = fs::remove_file(&self.path);
        }
    }
}

/// Reduces a server-supplied file name to a safe base name: only the final
/// path component survives, and hostile characters are replaced.
fn sanitize(file_name: &str) -> String {
    let base = file_name.rsplit(['/', '\\']).next().unwrap_or("");
    let cleaned: String = base
        .chars()
        .map(|c| match c {
            ':' | '\0' => '_',
            other => other,
        })
        .collect();
    let trimmed = cleaned.trim_matches(['.', ' ']);
    if trimmed.is_empty() {
        "download".to_string()
    } else {
        trimmed.to_string()
    }
}
