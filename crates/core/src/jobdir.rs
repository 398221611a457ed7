//! Job working-directory lifecycle.
//!
//! Each job gets an isolated directory under `{workdir}/jobs/{job_id}`
//! holding the decoded input images, the patched workflow document, and
//! the engine's output files. The directory is removed unconditionally
//! when the job ends, so output collection must happen first.

use std::path::{Path, PathBuf};

use crate::error::JobError;

/// Length of the job-id slice used in the output filename prefix.
const PREFIX_ID_LEN: usize = 8;

/// An isolated working directory for a single job.
#[derive(Debug)]
pub struct JobDir {
    root: PathBuf,
    job_id: String,
}

impl JobDir {
    /// Create `{workdir}/jobs/{uuid}` and its `output/` subdirectory.
    pub fn create(workdir: &Path) -> Result<Self, JobError> {
        let job_id = uuid::Uuid::new_v4().to_string();
        let root = workdir.join("jobs").join(&job_id);
        std::fs::create_dir_all(root.join("output"))?;
        Ok(Self { root, job_id })
    }

    /// Unique identifier of this job (UUID v4, string form).
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Root of the job directory tree.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Filename prefix tagging this job's outputs, `tryon_{id[..8]}`.
    pub fn output_prefix(&self) -> String {
        format!("tryon_{}", &self.job_id[..PREFIX_ID_LEN])
    }

    /// Destination for the patched workflow document.
    pub fn workflow_path(&self) -> PathBuf {
        self.root.join("workflow.json")
    }

    /// Destination for the decoded human photo.
    pub fn human_image_path(&self) -> PathBuf {
        self.root.join("human.png")
    }

    /// Destination for the decoded tattoo design.
    pub fn tattoo_image_path(&self) -> PathBuf {
        self.root.join("tattoo.png")
    }

    /// Destination for the decoded placement mask.
    pub fn mask_image_path(&self) -> PathBuf {
        self.root.join("mask.png")
    }

    /// Directory the engine writes generated images into.
    pub fn output_dir(&self) -> PathBuf {
        self.root.join("output")
    }

    /// Remove the whole job directory tree, ignoring errors.
    ///
    /// Must run on every exit path, strictly after output collection.
    pub fn cleanup(&self) {
        let _ = std::fs::remove_dir_all(&self.root);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_builds_expected_layout() {
        let workdir = tempfile::tempdir().unwrap();
        let job = JobDir::create(workdir.path()).unwrap();

        assert!(job.root().starts_with(workdir.path().join("jobs")));
        assert!(job.root().is_dir());
        assert!(job.output_dir().is_dir());
        assert_eq!(job.workflow_path(), job.root().join("workflow.json"));
        assert_eq!(job.human_image_path(), job.root().join("human.png"));
        assert_eq!(job.tattoo_image_path(), job.root().join("tattoo.png"));
        assert_eq!(job.mask_image_path(), job.root().join("mask.png"));
    }

    #[test]
    fn output_prefix_uses_first_eight_id_chars() {
        let workdir = tempfile::tempdir().unwrap();
        let job = JobDir::create(workdir.path()).unwrap();

        let prefix = job.output_prefix();
        assert_eq!(prefix, format!("tryon_{}", &job.job_id()[..8]));
        assert_eq!(prefix.len(), "tryon_".len() + 8);
    }

    #[test]
    fn two_jobs_get_distinct_directories() {
        let workdir = tempfile::tempdir().unwrap();
        let a = JobDir::create(workdir.path()).unwrap();
        let b = JobDir::create(workdir.path()).unwrap();
        assert_ne!(a.root(), b.root());
        assert_ne!(a.job_id(), b.job_id());
    }

    #[test]
    fn cleanup_removes_tree_and_is_idempotent() {
        let workdir = tempfile::tempdir().unwrap();
        let job = JobDir::create(workdir.path()).unwrap();
        std::fs::write(job.output_dir().join("tryon_leftover.png"), b"x").unwrap();

        job.cleanup();
        assert!(!job.root().exists());

        // Second cleanup on an already-removed tree is a no-op.
        job.cleanup();
        assert!(!job.root().exists());
    }
}
