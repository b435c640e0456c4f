//! Validation of a raw form post against the checklist schema.
//!
//! Pure: nothing here touches the store or the upload tree, so a refused
//! submission leaves no trace.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Utc};
use menage_checklist::{ChecklistSchema, FieldKey, SectionKind, SlotRef, TaskRef, TopField};
use unicode_normalization::UnicodeNormalization;

use crate::errors::ValidationError;
use crate::model::{
    ChecklistData, Coordinates, FileReferences, NewSubmission, RawForm, SectionData,
};

/// Image extensions accepted for photo slots (compared lowercase).
pub const ALLOWED_EXTENSIONS: [&str; 7] = ["png", "jpg", "jpeg", "gif", "webp", "heic", "heif"];

/// An upload that passed the extension check and will be written once the
/// submission has an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedUpload {
    /// Wire name of the file field, used to pull the bytes out of the form.
    pub field: String,
    pub section_key: String,
    pub slot: String,
    /// Sanitized client filename.
    pub filename: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedSubmission {
    pub record: NewSubmission,
    pub uploads: Vec<AcceptedUpload>,
}

/// Whether `filename` ends in one of [`ALLOWED_EXTENSIONS`].
pub fn allowed_file(filename: &str) -> bool {
    filename.rsplit_once('.').is_some_and(|(_, ext)| {
        let ext = ext.to_ascii_lowercase();
        ALLOWED_EXTENSIONS.contains(&ext.as_str())
    })
}

/// Reduce a client filename to a safe single path component.
///
/// Non-ASCII characters are decomposed and dropped, path separators and
/// whitespace runs become `_`, anything outside `[A-Za-z0-9._-]` is removed
/// and leading/trailing dots and underscores are stripped. Names longer than
/// [`MAX_FILENAME_LEN`] lose the tail of their stem; the extension is kept.
/// May return an empty string.
pub fn secure_filename(filename: &str) -> String {
    let ascii: String = filename.nfkd().filter(char::is_ascii).collect();
    let spaced = ascii.replace(['/', '\\'], " ");
    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");
    let kept: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();
    truncate_filename(kept.trim_matches(|c| c == '.' || c == '_'))
}

/// Longest sanitized name kept. Leaves room for the `{section}__{slot}__`
/// prefix within the usual 255-byte filesystem limit.
pub const MAX_FILENAME_LEN: usize = 100;

/// Input is ASCII, so byte offsets are char boundaries.
fn truncate_filename(name: &str) -> String {
    if name.len() <= MAX_FILENAME_LEN {
        return name.to_string();
    }
    match name.rsplit_once('.') {
        Some((stem, ext)) if ext.len() < MAX_FILENAME_LEN / 2 => {
            let keep = MAX_FILENAME_LEN - ext.len() - 1;
            let stem = stem
                .get(..keep)
                .unwrap_or(stem)
                .trim_end_matches(['.', '_']);
            format!("{stem}.{ext}")
        }
        _ => name
            .get(..MAX_FILENAME_LEN)
            .unwrap_or(name)
            .trim_end_matches(['.', '_'])
            .to_string(),
    }
}

fn parse_coordinate(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Validate `form` and derive the normalized record.
///
/// Every problem is collected before returning: missing required fields,
/// required sections with no ticked task, and field names the schema does
/// not know.
pub fn validate(
    schema: &ChecklistSchema,
    form: &RawForm,
    now: DateTime<Utc>,
) -> Result<ValidatedSubmission, ValidationError> {
    let mut errors = ValidationError::default();

    let mut top: HashMap<TopField, &str> = HashMap::new();
    let mut checked: HashSet<TaskRef> = HashSet::new();
    let mut notes: HashMap<usize, &str> = HashMap::new();

    for (name, value) in &form.fields {
        match schema.decode_field(name) {
            Some(FieldKey::Top(field)) => {
                top.insert(field, value.trim());
            }
            Some(FieldKey::Task(task)) => {
                if value == "on" {
                    checked.insert(task);
                }
            }
            Some(FieldKey::Note(section)) => {
                notes.insert(section, value.trim());
            }
            // A file input posted without a file part carries no upload.
            None if schema.decode_file(name).is_some() => {}
            None => errors.unrecognized_fields.push(name.clone()),
        }
    }

    let mut posted_files: HashMap<SlotRef, &str> = HashMap::new();
    for (name, file) in &form.files {
        match schema.decode_file(name) {
            Some(slot) => {
                posted_files.insert(slot, file.filename.as_str());
            }
            None => errors.unrecognized_fields.push(name.clone()),
        }
    }
    errors.unrecognized_fields.sort();

    let text = |field: TopField| top.get(&field).copied().unwrap_or_default();

    for field in TopField::REQUIRED {
        if text(field).is_empty() {
            errors.missing_fields.push(field.label());
        }
    }

    let mut checklist = ChecklistData::new();
    let mut files = FileReferences::new();
    let mut uploads = Vec::new();

    for (section_idx, section) in schema.sections().iter().enumerate() {
        match &section.kind {
            SectionKind::Note { .. } => {
                let body = notes.get(&section_idx).copied().unwrap_or_default();
                checklist.insert(section.key.clone(), SectionData::Text(body.to_string()));
            }
            SectionKind::Room | SectionKind::Chores { .. } => {
                let tasks: BTreeMap<String, bool> = section
                    .tasks
                    .iter()
                    .enumerate()
                    .map(|(task_idx, task)| {
                        let task_ref = TaskRef {
                            section: section_idx,
                            task: task_idx,
                        };
                        (task.key.clone(), checked.contains(&task_ref))
                    })
                    .collect();

                if section.is_required() && !tasks.values().any(|&ticked| ticked) {
                    errors.missing_sections.push(section.title.clone());
                }
                checklist.insert(section.key.clone(), SectionData::Tasks(tasks));
            }
        }

        if section.slots.is_empty() {
            continue;
        }
        let section_files = files.entry(section.key.clone()).or_default();
        for &slot in &section.slots {
            let slot_ref = SlotRef {
                section: section_idx,
                slot,
            };
            let accepted = posted_files
                .get(&slot_ref)
                .filter(|name| !name.is_empty() && allowed_file(name))
                .map(|name| secure_filename(name))
                .filter(|clean| !clean.is_empty());

            if let Some(filename) = &accepted {
                uploads.push(AcceptedUpload {
                    field: menage_checklist::keys::encode(&section.key, slot.as_str()),
                    section_key: section.key.clone(),
                    slot: slot.as_str().to_string(),
                    filename: filename.clone(),
                });
            } else if posted_files.get(&slot_ref).is_some_and(|name| !name.is_empty()) {
                tracing::debug!(
                    section = %section.key,
                    slot = slot.as_str(),
                    "Dropped upload with disallowed filename"
                );
            }
            section_files.insert(slot.as_str().to_string(), accepted);
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    let coordinates = match (
        parse_coordinate(text(TopField::Lat)),
        parse_coordinate(text(TopField::Lng)),
    ) {
        (Some(lat), Some(lng)) => Some(Coordinates { lat, lng }),
        _ => None,
    };

    Ok(ValidatedSubmission {
        record: NewSubmission {
            created_at: now,
            email: text(TopField::Email).to_string(),
            apartment: text(TopField::Apartment).to_string(),
            date: text(TopField::Date).to_string(),
            person_name: text(TopField::PersonName).to_string(),
            coordinates,
            checklist,
            files,
        },
        uploads,
    })
}
