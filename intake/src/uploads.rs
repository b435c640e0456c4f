//! On-disk upload tree.
//!
//! ```text
//! {root}/
//!   {submission_id}/
//!     {section}__{slot}__{sanitized filename}
//! ```

use std::path::{Component, Path, PathBuf};

use menage_checklist::SEPARATOR;

use crate::errors::{IntakeError, Result};
use crate::model::SubmissionId;

/// Stored filename for one slot. Deterministic in (section, slot), so a
/// submission can hold at most one file per slot.
pub fn stored_name(section_key: &str, slot: &str, sanitized: &str) -> String {
    format!("{section_key}{SEPARATOR}{slot}{SEPARATOR}{sanitized}")
}

/// Whether `name` is exactly one normal path component.
fn is_plain_component(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(c)), None) if c == name
    )
}

#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    /// Use `root` as the upload tree, creating it if needed.
    pub fn with_root(root: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&root).map_err(|e| {
            IntakeError::upload_with_source(
                format!("failed to create upload root: {}", root.display()),
                e,
            )
        })?;
        Ok(Self { root })
    }

    /// Directory holding the files of one submission.
    pub fn submission_dir(&self, id: SubmissionId) -> PathBuf {
        self.root.join(id.to_string())
    }

    /// Write `content` as `{root}/{id}/{name}` through a `.tmp` sibling.
    pub fn save(&self, id: SubmissionId, name: &str, content: &[u8]) -> Result<PathBuf> {
        if !is_plain_component(name) {
            return Err(IntakeError::internal(format!(
                "refusing to store upload under non-plain name {name:?}"
            )));
        }

        let dir = self.submission_dir(id);
        std::fs::create_dir_all(&dir).map_err(|e| {
            IntakeError::upload_with_source(
                format!("failed to create upload dir: {}", dir.display()),
                e,
            )
        })?;

        let path = dir.join(name);
        let tmp = dir.join(format!("{name}.tmp"));
        std::fs::write(&tmp, content).map_err(|e| {
            IntakeError::upload_with_source(format!("failed to write {}", tmp.display()), e)
        })?;
        std::fs::rename(&tmp, &path).map_err(|e| {
            IntakeError::upload_with_source(format!("failed to move {}", path.display()), e)
        })?;

        tracing::debug!(submission_id = %id, file = name, bytes = content.len(), "Upload stored");
        Ok(path)
    }

    /// Path of a stored file, if it exists.
    ///
    /// Any regular file in the submission's directory resolves, whether or
    /// not the submission's references name it.
    pub fn resolve(&self, id: SubmissionId, filename: &str) -> Option<PathBuf> {
        if !is_plain_component(filename) {
            return None;
        }
        let dir = self.submission_dir(id);
        if !dir.is_dir() {
            return None;
        }
        let path = dir.join(filename);
        path.is_file().then_some(path)
    }
}
