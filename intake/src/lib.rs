//! Checklist submission intake.
//!
//! A submission moves through [`validate`] (pure), then
//! [`SubmissionProcessor::process`] which writes the row, stores uploads
//! under `{upload_dir}/{id}/` and records the stored names. The admin side
//! reads the newest rows back through [`SubmissionReader`] once
//! [`AdminGate`] has accepted the token.

pub mod config;
pub mod errors;
pub mod model;
pub mod processor;
pub mod reader;
pub mod store;
pub mod uploads;
pub mod validate;

pub use config::IntakeConfig;
pub use errors::{ErrorCategory, IntakeError, Result, ValidationError};
pub use model::{
    ChecklistData, Coordinates, FileReferences, NewSubmission, RawForm, SectionData, Submission,
    SubmissionId, UploadedFile,
};
pub use processor::SubmissionProcessor;
pub use reader::{AdminAccess, AdminGate, SubmissionReader, acknowledge, parse_sid};
pub use store::SubmissionStore;
pub use uploads::UploadStore;
pub use validate::{ValidatedSubmission, allowed_file, secure_filename, validate};
