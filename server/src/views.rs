//! Askama page models built from the schema and stored submissions.

use askama::Template;
use menage_checklist::{ChecklistSchema, Section, SlotRef, TaskRef, TopField};
use menage_intake::{SectionData, Submission, acknowledge};

pub struct InputView {
    pub name: &'static str,
    pub label: &'static str,
    pub input_type: &'static str,
}

pub struct CheckboxView {
    pub name: String,
    pub label: String,
}

pub struct SlotView {
    pub name: String,
    pub label: &'static str,
}

pub struct SectionView {
    pub title: String,
    pub required: bool,
    pub tasks: Vec<CheckboxView>,
    /// Textarea name, empty for task sections.
    pub note_field: String,
    pub slots: Vec<SlotView>,
}

#[derive(Template)]
#[template(path = "form.html")]
pub struct FormPage {
    /// Message from a refused submission, empty when there is none.
    pub flash: String,
    pub inputs: Vec<InputView>,
    pub sections: Vec<SectionView>,
}

impl FormPage {
    pub fn new(schema: &ChecklistSchema, flash: Option<String>) -> Self {
        let inputs = TopField::REQUIRED
            .into_iter()
            .map(|field| InputView {
                name: field.name(),
                label: field.label(),
                input_type: match field {
                    TopField::Email => "email",
                    TopField::Date => "date",
                    _ => "text",
                },
            })
            .collect();

        let sections = schema
            .sections()
            .iter()
            .enumerate()
            .map(|(index, section)| section_view(schema, index, section))
            .collect();

        Self {
            flash: flash.unwrap_or_default(),
            inputs,
            sections,
        }
    }
}

fn section_view(schema: &ChecklistSchema, index: usize, section: &Section) -> SectionView {
    let tasks = (0..section.tasks.len())
        .filter_map(|task| {
            let name = schema.field_name(TaskRef {
                section: index,
                task,
            })?;
            Some(CheckboxView {
                name,
                label: section.tasks[task].label.clone(),
            })
        })
        .collect();

    let slots = section
        .slots
        .iter()
        .filter_map(|&slot| {
            let name = schema.file_field_name(SlotRef {
                section: index,
                slot,
            })?;
            Some(SlotView {
                name,
                label: slot.label(),
            })
        })
        .collect();

    SectionView {
        title: section.title.clone(),
        required: section.is_required(),
        tasks,
        note_field: section.text_field().unwrap_or_default().to_string(),
        slots,
    }
}

pub struct PhotoView {
    pub label: &'static str,
    pub url: String,
}

pub struct EntrySectionView {
    pub title: String,
    pub ticked: Vec<String>,
    pub task_count: usize,
    pub note: String,
    pub photos: Vec<PhotoView>,
}

pub struct EntryView {
    pub id: i64,
    pub created_at: String,
    pub email: String,
    pub apartment: String,
    pub date: String,
    pub person_name: String,
    /// `lat, lng`, empty when the submission has no coordinates.
    pub coordinates: String,
    pub map_url: String,
    pub sections: Vec<EntrySectionView>,
}

impl EntryView {
    /// Render a stored submission against the live schema. Sections the row
    /// predates show up empty.
    pub fn new(schema: &ChecklistSchema, submission: &Submission) -> Self {
        let sections = schema
            .sections()
            .iter()
            .map(|section| {
                let data = submission.checklist.get(&section.key);
                let ticked = section
                    .tasks
                    .iter()
                    .filter(|task| data.is_some_and(|d| d.is_checked(&task.key)))
                    .map(|task| task.label.clone())
                    .collect();
                let note = data
                    .and_then(SectionData::text)
                    .unwrap_or_default()
                    .to_string();
                let photos = section
                    .slots
                    .iter()
                    .filter_map(|slot| {
                        let stored = submission.file(&section.key, slot.as_str())?;
                        Some(PhotoView {
                            label: slot.label(),
                            url: upload_url(submission, stored),
                        })
                    })
                    .collect();

                EntrySectionView {
                    title: section.title.clone(),
                    ticked,
                    task_count: section.tasks.len(),
                    note,
                    photos,
                }
            })
            .collect();

        let (coordinates, map_url) = match submission.coordinates {
            Some(c) => (
                format!("{}, {}", c.lat, c.lng),
                format!("https://www.openstreetmap.org/?mlat={}&mlon={}", c.lat, c.lng),
            ),
            None => (String::new(), String::new()),
        };

        Self {
            id: submission.id.0,
            created_at: submission.created_at.format("%Y-%m-%d %H:%M UTC").to_string(),
            email: submission.email.clone(),
            apartment: submission.apartment.clone(),
            date: submission.date.clone(),
            person_name: submission.person_name.clone(),
            coordinates,
            map_url,
            sections,
        }
    }
}

fn upload_url(submission: &Submission, stored: &str) -> String {
    format!("/uploads/{}/{}", submission.id, urlencoding::encode(stored))
}

/// Admin listing and the thank-you acknowledgement share one page.
#[derive(Template)]
#[template(path = "submissions.html")]
pub struct SubmissionsPage {
    /// Acknowledgement text; empty on the admin listing.
    pub message: String,
    pub entries: Vec<EntryView>,
}

impl SubmissionsPage {
    pub fn listing(schema: &ChecklistSchema, submissions: &[Submission]) -> Self {
        Self {
            message: String::new(),
            entries: submissions
                .iter()
                .map(|submission| EntryView::new(schema, submission))
                .collect(),
        }
    }

    pub fn thank_you(sid: Option<&str>) -> Self {
        Self {
            message: acknowledge(sid),
            entries: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixtures::sample_submission;
    use menage_checklist::get_schema;

    mod fixtures {
        use menage_intake::{
            ChecklistData, Coordinates, FileReferences, SectionData, Submission, SubmissionId,
        };
        use std::collections::BTreeMap;

        pub fn sample_submission() -> Submission {
            let mut checklist = ChecklistData::new();
            checklist.insert(
                "kitchen".to_string(),
                SectionData::Tasks(BTreeMap::from([("counter_clean".to_string(), true)])),
            );
            checklist.insert(
                "extra".to_string(),
                SectionData::Text("<b>merci</b>".to_string()),
            );
            let mut files = FileReferences::new();
            files.insert(
                "kitchen".to_string(),
                BTreeMap::from([(
                    "photo_before".to_string(),
                    Some("kitchen__photo_before__a b.png".to_string()),
                )]),
            );
            Submission {
                id: SubmissionId(9),
                created_at: "2024-05-01T10:30:00Z".parse().expect("timestamp"),
                email: "a@b.c".to_string(),
                apartment: "B12".to_string(),
                date: "2024-05-01".to_string(),
                person_name: "Ana".to_string(),
                coordinates: Some(Coordinates {
                    lat: 48.5,
                    lng: 2.25,
                }),
                checklist,
                files,
            }
        }
    }

    #[test]
    fn form_has_every_field_name() {
        let schema = get_schema();
        let html = FormPage::new(&schema, None).render().expect("render");
        for slot in schema.slots() {
            let name = schema.file_field_name(slot).expect("slot name");
            assert!(html.contains(&format!("name=\"{name}\"")), "missing {name}");
        }
        for field in TopField::ALL {
            assert!(html.contains(&format!("name=\"{}\"", field.name())));
        }
        assert!(html.contains("name=\"kitchen__counter_clean\""));
        assert!(html.contains("name=\"special_text\""));
    }

    #[test]
    fn form_shows_flash_escaped() {
        let html = FormPage::new(&get_schema(), Some("<oops>".to_string()))
            .render()
            .expect("render");
        assert!(html.contains("&lt;oops&gt;"));
        assert!(!html.contains("<oops>"));
    }

    #[test]
    fn entry_view_reads_against_schema() {
        let schema = get_schema();
        let entry = EntryView::new(&schema, &sample_submission());

        assert_eq!(entry.created_at, "2024-05-01 10:30 UTC");
        assert_eq!(entry.coordinates, "48.5, 2.25");

        let kitchen = entry
            .sections
            .iter()
            .find(|s| s.title.contains("Cuisine"))
            .expect("kitchen");
        assert_eq!(kitchen.ticked.len(), 1);
        assert_eq!(kitchen.photos.len(), 1);
        assert_eq!(
            kitchen.photos[0].url,
            "/uploads/9/kitchen__photo_before__a%20b.png"
        );

        let room1 = &entry.sections[0];
        assert!(room1.ticked.is_empty());
        assert!(room1.photos.is_empty());
    }

    #[test]
    fn listing_escapes_notes() {
        let page = SubmissionsPage::listing(&get_schema(), &[sample_submission()]);
        let html = page.render().expect("render");
        assert!(html.contains("&lt;b&gt;merci"));
        assert!(html.contains("#9"));
    }

    #[test]
    fn thank_you_echoes_sid() {
        let html = SubmissionsPage::thank_you(Some("123"))
            .render()
            .expect("render");
        assert!(html.contains("#123"));
    }
}
