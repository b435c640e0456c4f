//! Submission processing: validate, insert, store files, record file names.

use std::sync::Arc;

use chrono::Utc;
use menage_checklist::ChecklistSchema;

use crate::errors::{IntakeError, Result};
use crate::model::{RawForm, SubmissionId};
use crate::store::SubmissionStore;
use crate::uploads::{UploadStore, stored_name};
use crate::validate::validate;

/// Turns one raw form post into a persisted submission.
///
/// Nothing is written unless validation passes. Once the row exists its id
/// is final; a later upload failure leaves the row in place with the
/// client-declared names in its file references.
#[derive(Clone)]
pub struct SubmissionProcessor {
    schema: Arc<ChecklistSchema>,
    store: Arc<SubmissionStore>,
    uploads: Arc<UploadStore>,
}

impl SubmissionProcessor {
    pub fn new(
        schema: Arc<ChecklistSchema>,
        store: Arc<SubmissionStore>,
        uploads: Arc<UploadStore>,
    ) -> Self {
        Self {
            schema,
            store,
            uploads,
        }
    }

    pub fn process(&self, form: RawForm) -> Result<SubmissionId> {
        let validated = match validate(&self.schema, &form, Utc::now()) {
            Ok(validated) => validated,
            Err(errors) => {
                tracing::warn!(
                    missing_fields = errors.missing_fields.len(),
                    missing_sections = errors.missing_sections.len(),
                    unrecognized_fields = ?errors.unrecognized_fields,
                    "Submission rejected"
                );
                return Err(errors.into());
            }
        };

        let mut record = validated.record;
        let id = self.store.insert(&record)?;

        for upload in &validated.uploads {
            let Some(file) = form.files.get(&upload.field) else {
                return Err(IntakeError::internal(format!(
                    "accepted upload {} vanished from the form",
                    upload.field
                )));
            };
            let name = stored_name(&upload.section_key, &upload.slot, &upload.filename);

            if let Err(err) = self.uploads.save(id, &name, &file.content) {
                tracing::error!(
                    submission_id = %id,
                    file = %name,
                    error = %err,
                    "Upload failed after insert; row kept with declared file names"
                );
                return Err(err);
            }

            if let Some(slot) = record
                .files
                .get_mut(&upload.section_key)
                .and_then(|slots| slots.get_mut(&upload.slot))
            {
                *slot = Some(name);
            }
        }

        self.store.update_file_references(id, &record.files)?;

        tracing::info!(
            submission_id = %id,
            apartment = %record.apartment,
            files = validated.uploads.len(),
            "Submission stored"
        );
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCategory;
    use crate::model::UploadedFile;
    use menage_checklist::get_schema;

    fn processor(root: &std::path::Path) -> (SubmissionProcessor, Arc<SubmissionStore>) {
        let store = Arc::new(SubmissionStore::open_in_memory().expect("store"));
        let uploads = Arc::new(UploadStore::with_root(root.to_path_buf()).expect("uploads"));
        (
            SubmissionProcessor::new(get_schema(), Arc::clone(&store), uploads),
            store,
        )
    }

    fn minimal_form() -> RawForm {
        let mut form = RawForm::new()
            .field("email", "a@b.c")
            .field("apartment", "B12")
            .field("date", "2024-05-01")
            .field("person_name", "Ana");
        for section in get_schema().required_sections() {
            form = form.field(format!("{}__{}", section.key, section.tasks[0].key), "on");
        }
        form
    }

    #[test]
    fn stores_row_and_renames_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (processor, store) = processor(dir.path());

        let form = minimal_form().file(
            "kitchen__photo_before",
            UploadedFile::new("my kitchen.JPG", b"jpeg".to_vec()),
        );
        let id = processor.process(form).expect("process");

        let row = store.get(id).expect("get").expect("row");
        assert_eq!(
            row.file("kitchen", "photo_before"),
            Some("kitchen__photo_before__my_kitchen.JPG")
        );
        assert_eq!(row.file("kitchen", "photo_after"), None);
        assert!(
            dir.path()
                .join(id.to_string())
                .join("kitchen__photo_before__my_kitchen.JPG")
                .is_file()
        );
    }

    #[test]
    fn rejected_form_writes_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (processor, store) = processor(dir.path());

        let form = RawForm::new()
            .field("email", "a@b.c")
            .file("kitchen__photo_before", UploadedFile::new("k.png", b"x".to_vec()));
        let err = processor.process(form).expect_err("should reject");

        let report = err.as_validation().expect("validation error");
        assert_eq!(report.missing_fields, vec!["Appartement", "Date", "Nom"]);
        assert_eq!(store.count().expect("count"), 0);
        assert_eq!(std::fs::read_dir(dir.path()).expect("read_dir").count(), 0);
    }

    #[test]
    fn upload_failure_keeps_row_with_declared_names() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (processor, store) = processor(dir.path());
        // The first submission directory cannot be created.
        std::fs::write(dir.path().join("1"), b"not a dir").expect("blocker");

        let form = minimal_form().file(
            "kitchen__photo_before",
            UploadedFile::new("my k.png", b"png".to_vec()),
        );
        let err = processor.process(form).expect_err("upload should fail");

        assert_eq!(err.category(), ErrorCategory::UploadError);
        assert_eq!(err.category().as_str(), "UPLOAD_ERROR");
        assert_eq!(store.count().expect("count"), 1);
        let row = store.get(SubmissionId(1)).expect("get").expect("row");
        assert_eq!(row.file("kitchen", "photo_before"), Some("my_k.png"));
    }

    #[test]
    fn submission_without_uploads_records_empty_slots() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (processor, store) = processor(dir.path());

        let id = processor.process(minimal_form()).expect("process");

        let row = store.get(id).expect("get").expect("row");
        assert_eq!(row.file("kitchen", "photo_before"), None);
        assert!(row.files.contains_key("kitchen"));
        assert!(!dir.path().join(id.to_string()).exists());
    }

    #[test]
    fn very_long_filename_is_stored() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (processor, store) = processor(dir.path());

        let declared = format!("{}.jpg", "x".repeat(400));
        let form = minimal_form().file(
            "kitchen__photo_after",
            UploadedFile::new(declared, b"jpeg".to_vec()),
        );
        let id = processor.process(form).expect("process");

        let row = store.get(id).expect("get").expect("row");
        let stored = row.file("kitchen", "photo_after").expect("stored name");
        assert!(stored.starts_with("kitchen__photo_after__xxx"));
        assert!(stored.ends_with(".jpg"));
        assert!(dir.path().join(id.to_string()).join(stored).is_file());
    }
}
