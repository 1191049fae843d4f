//! Job-scoped workspace directories.
//!
//! Each processing attempt gets a fresh, uniquely named directory that is
//! removed recursively on every exit path. Removal is tied to `Drop`, so
//! the guarantee holds whether the attempt returns, errors out on its
//! first step, or panics.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::debug;

use reverie_models::{AssetRole, JobId};

use crate::error::MediaResult;

/// Conventional file name of the produced artifact.
const OUTPUT_FILE_NAME: &str = "output.mp4";

/// An ephemeral directory exclusively owned by one job-processing attempt.
#[derive(Debug)]
pub struct JobWorkspace {
    dir: TempDir,
    job_id: JobId,
}

impl JobWorkspace {
    /// Allocate a fresh workspace under `root` for the given job.
    ///
    /// `root` is created if it does not exist yet.
    pub fn create(root: impl AsRef<Path>, job_id: &JobId) -> MediaResult<Self> {
        let root = root.as_ref();
        std::fs::create_dir_all(root)?;

        let dir = tempfile::Builder::new()
            .prefix(&format!("export-{}-", job_id))
            .tempdir_in(root)?;

        debug!(job_id = %job_id, path = %dir.path().display(), "Allocated job workspace");

        Ok(Self {
            dir,
            job_id: job_id.clone(),
        })
    }

    /// Path of the workspace directory.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path where the asset for `role` is stored.
    pub fn asset_path(&self, role: AssetRole) -> PathBuf {
        self.dir.path().join(role.file_name())
    }

    /// Path of the output artifact.
    pub fn output_path(&self) -> PathBuf {
        self.dir.path().join(OUTPUT_FILE_NAME)
    }

    /// Remove the workspace now, surfacing removal errors.
    ///
    /// Dropping the workspace removes it too; `close` exists for callers
    /// that want the failure reported instead of best-effort.
    pub fn close(self) -> MediaResult<()> {
        let path = self.dir.path().to_path_buf();
        self.dir.close()?;
        debug!(job_id = %self.job_id, path = %path.display(), "Removed job workspace");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job_id() -> JobId {
        JobId::from_string("job-1")
    }

    #[test]
    fn test_workspace_paths() {
        let root = tempfile::tempdir().unwrap();
        let ws = JobWorkspace::create(root.path(), &job_id()).unwrap();

        assert!(ws.path().exists());
        assert!(ws
            .path()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("export-job-1-"));
        assert_eq!(ws.asset_path(AssetRole::Sky).file_name().unwrap(), "sky.mp4");
        assert_eq!(ws.output_path().file_name().unwrap(), "output.mp4");
    }

    #[test]
    fn test_close_removes_directory_and_contents() {
        let root = tempfile::tempdir().unwrap();
        let ws = JobWorkspace::create(root.path(), &job_id()).unwrap();
        let path = ws.path().to_path_buf();
        std::fs::write(ws.asset_path(AssetRole::Ground), b"data").unwrap();

        ws.close().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_drop_removes_directory() {
        let root = tempfile::tempdir().unwrap();
        let path = {
            let ws = JobWorkspace::create(root.path(), &job_id()).unwrap();
            ws.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn test_panic_still_removes_directory() {
        let root = tempfile::tempdir().unwrap();
        let path = std::sync::Arc::new(std::sync::Mutex::new(PathBuf::new()));

        let path_clone = std::sync::Arc::clone(&path);
        let root_path = root.path().to_path_buf();
        let result = std::panic::catch_unwind(move || {
            let ws = JobWorkspace::create(&root_path, &job_id()).unwrap();
            *path_clone.lock().unwrap() = ws.path().to_path_buf();
            panic!("boom");
        });

        assert!(result.is_err());
        assert!(!path.lock().unwrap().exists());
    }

    #[test]
    fn test_workspaces_are_unique_per_attempt() {
        let root = tempfile::tempdir().unwrap();
        let a = JobWorkspace::create(root.path(), &job_id()).unwrap();
        let b = JobWorkspace::create(root.path(), &job_id()).unwrap();
        assert_ne!(a.path(), b.path());
    }
}
