//! Submission records and the raw form payload they are built from.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Store-assigned submission identifier. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionId(pub i64);

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One posted file.
#[derive(Debug, Clone, Default)]
pub struct UploadedFile {
    /// Client-declared filename, untrusted.
    pub filename: String,
    pub content: Vec<u8>,
}

impl UploadedFile {
    pub fn new(filename: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
        }
    }
}

/// Every named text and file field of one multipart post.
#[derive(Debug, Clone, Default)]
pub struct RawForm {
    pub fields: HashMap<String, String>,
    pub files: HashMap<String, UploadedFile>,
}

impl RawForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style text field insert.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Builder-style file insert.
    pub fn file(mut self, name: impl Into<String>, file: UploadedFile) -> Self {
        self.files.insert(name.into(), file);
        self
    }

    /// Trimmed value of a text field, empty when absent.
    pub fn text(&self, name: &str) -> &str {
        self.fields.get(name).map(|v| v.trim()).unwrap_or_default()
    }

    /// A checkbox is ticked iff its value is exactly `"on"`.
    pub fn is_checked(&self, name: &str) -> bool {
        self.fields.get(name).is_some_and(|v| v == "on")
    }
}

/// Per-section checklist state: task states for rooms and chores, text for notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SectionData {
    Tasks(BTreeMap<String, bool>),
    Text(String),
}

impl SectionData {
    pub fn is_checked(&self, task_key: &str) -> bool {
        match self {
            Self::Tasks(tasks) => tasks.get(task_key).copied().unwrap_or(false),
            Self::Text(_) => false,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Tasks(_) => None,
        }
    }
}

/// section key -> section data
pub type ChecklistData = BTreeMap<String, SectionData>;

/// section key -> slot name -> filename (or `None`)
pub type FileReferences = BTreeMap<String, BTreeMap<String, Option<String>>>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// A validated submission ready for its first write.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSubmission {
    pub created_at: DateTime<Utc>,
    pub email: String,
    pub apartment: String,
    pub date: String,
    pub person_name: String,
    pub coordinates: Option<Coordinates>,
    pub checklist: ChecklistData,
    /// Sanitized client-declared names until the files are on disk.
    pub files: FileReferences,
}

/// A persisted submission.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub id: SubmissionId,
    pub created_at: DateTime<Utc>,
    pub email: String,
    pub apartment: String,
    pub date: String,
    pub person_name: String,
    pub coordinates: Option<Coordinates>,
    pub checklist: ChecklistData,
    pub files: FileReferences,
}

impl Submission {
    /// Stored filename for a section slot, if one was kept.
    pub fn file(&self, section_key: &str, slot: &str) -> Option<&str> {
        self.files.get(section_key)?.get(slot)?.as_deref()
    }
}
