//! Path Resolver (spec §4.1). A pure function component: given dataset
//! coordinates it returns canonical filesystem paths and never itself reads
//! or writes anything other than idempotent directory creation.

use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::{CoreError, CoreResult};

/// Resolves canonical paths for one `(project_id, dataset_id)` pair.
#[derive(Debug, Clone)]
pub struct DatasetLayout {
    root: PathBuf,
}

impl DatasetLayout {
    pub fn new(config: &Config, project_id: &str, dataset_id: &str) -> CoreResult<Self> {
        let project = sanitize_segment(project_id, "project_id")?;
        let dataset = sanitize_segment(dataset_id, "dataset_id")?;
        let root = config
            .data_root
            .join("projects")
            .join(project)
            .join("datasets")
            .join(dataset);
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn main(&self) -> PathBuf {
        self.root.join("main")
    }

    pub fn staging(&self, cr_id: &str) -> CoreResult<PathBuf> {
        let cr = sanitize_segment(cr_id, "cr_id")?;
        Ok(self.root.join("staging").join(cr))
    }

    pub fn staging_root(&self) -> PathBuf {
        self.root.join("staging")
    }

    pub fn live_edit_edits(&self, session_id: &str) -> CoreResult<PathBuf> {
        let session = sanitize_segment(session_id, "session_id")?;
        Ok(self.root.join("live_edit").join(session).join("edits"))
    }

    pub fn imports(&self, upload_id: &str) -> CoreResult<PathBuf> {
        let upload = sanitize_segment(upload_id, "upload_id")?;
        Ok(self.root.join("imports").join(upload))
    }

    pub fn audit_root(&self) -> PathBuf {
        self.root.join("audit")
    }

    pub fn audit_validation_runs(&self) -> PathBuf {
        self.audit_root().join("validation_runs")
    }

    pub fn audit_change_requests(&self, cr_id: &str) -> CoreResult<PathBuf> {
        let cr = sanitize_segment(cr_id, "cr_id")?;
        Ok(self.audit_root().join("change_requests").join(cr))
    }

    pub fn audit_snapshots(&self) -> PathBuf {
        self.audit_root().join("snapshots")
    }

    pub fn audit_history(&self) -> PathBuf {
        self.audit_root().join("history")
    }

    /// Creates the full dataset skeleton idempotently: `main`, `staging`,
    /// `live_edit`, `imports`, and the three `audit/*` subtrees.
    pub async fn ensure_skeleton(&self) -> CoreResult<()> {
        for dir in [
            self.main(),
            self.staging_root(),
            self.root.join("live_edit"),
            self.root.join("imports"),
            self.audit_validation_runs(),
            self.audit_root().join("change_requests"),
            self.audit_snapshots(),
            self.audit_history(),
        ] {
            tokio::fs::create_dir_all(&dir).await?;
        }
        Ok(())
    }
}

pub fn pending_uploads_root(config: &Config) -> PathBuf {
    config.data_root.join("pending_uploads")
}

pub fn pending_upload_dir(config: &Config, upload_id: &str) -> CoreResult<PathBuf> {
    let upload = sanitize_segment(upload_id, "upload_id")?;
    Ok(pending_uploads_root(config).join(upload))
}

/// Rejects path traversal and separator characters inside a single path
/// segment. Identifiers come from request bodies; they must never be able
/// to escape the dataset root.
fn sanitize_segment<'a>(segment: &'a str, field: &str) -> CoreResult<&'a str> {
    if segment.is_empty() {
        return Err(CoreError::precondition_failed(format!("{field} must not be empty")));
    }
    if segment == "." || segment == ".." {
        return Err(CoreError::precondition_failed(format!(
            "{field} must not be a relative path component"
        )));
    }
    if segment.contains('/') || segment.contains('\\') || segment.contains("..") {
        return Err(CoreError::precondition_failed(format!(
            "{field} must not contain path separators"
        )));
    }
    Ok(segment)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> DatasetLayout {
        let cfg = Config {
            data_root: PathBuf::from("/tmp/oreo-test-root"),
            ..Config::default()
        };
        DatasetLayout::new(&cfg, "proj-1", "ds-1").unwrap()
    }

    #[test]
    fn resolves_canonical_paths() {
        let layout = layout();
        assert_eq!(
            layout.main(),
            PathBuf::from("/tmp/oreo-test-root/projects/proj-1/datasets/ds-1/main")
        );
        assert_eq!(
            layout.staging("cr-7").unwrap(),
            PathBuf::from("/tmp/oreo-test-root/projects/proj-1/datasets/ds-1/staging/cr-7")
        );
        assert_eq!(
            layout.live_edit_edits("sess-1").unwrap(),
            PathBuf::from(
                "/tmp/oreo-test-root/projects/proj-1/datasets/ds-1/live_edit/sess-1/edits"
            )
        );
    }

    #[test]
    fn rejects_traversal_in_any_segment() {
        let cfg = Config::default();
        assert!(DatasetLayout::new(&cfg, "../etc", "ds").is_err());
        let layout = layout();
        assert!(layout.staging("../../escape").is_err());
        assert!(layout.staging("a/b").is_err());
    }

    #[tokio::test]
    async fn ensure_skeleton_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config {
            data_root: dir.path().to_path_buf(),
            ..Config::default()
        };
        let layout = DatasetLayout::new(&cfg, "p", "d").unwrap();
        layout.ensure_skeleton().await.unwrap();
        layout.ensure_skeleton().await.unwrap();
        assert!(layout.main().is_dir());
        assert!(layout.audit_validation_runs().is_dir());
    }
}
