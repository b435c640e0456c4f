//! Checklist sections, tasks and upload slots.

use std::collections::HashMap;

use crate::keys::{FieldKey, SlotRef, TaskRef, TopField, encode};

/// One checkbox inside a section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub key: String,
    pub label: String,
}

impl Task {
    fn new(key: &str, label: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
        }
    }
}

/// Named photo slot of a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Slot {
    PhotoBefore,
    PhotoAfter,
    Photo,
}

impl Slot {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PhotoBefore => "photo_before",
            Self::PhotoAfter => "photo_after",
            Self::Photo => "photo",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::PhotoBefore => "Photo avant || Фото до",
            Self::PhotoAfter => "Photo après || Фото після",
            Self::Photo => "Photo || Фото",
        }
    }
}

/// Shape of a section. Rooms share one task list, chores each have their own,
/// notes carry free text instead of tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionKind {
    Room,
    Chores { required: bool },
    Note { text_field: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub key: String,
    pub title: String,
    pub kind: SectionKind,
    pub tasks: Vec<Task>,
    pub slots: Vec<Slot>,
}

impl Section {
    /// Whether at least one task must be ticked for a submission to pass.
    pub fn is_required(&self) -> bool {
        matches!(self.kind, SectionKind::Chores { required: true })
    }

    /// Text-field name for note sections.
    pub fn text_field(&self) -> Option<&str> {
        match &self.kind {
            SectionKind::Note { text_field } => Some(text_field),
            _ => None,
        }
    }
}

/// The canonical checklist: ordered sections plus decode tables for the
/// flat field names the form posts back.
#[derive(Debug, Clone)]
pub struct ChecklistSchema {
    sections: Vec<Section>,
    fields: HashMap<String, FieldKey>,
    files: HashMap<String, SlotRef>,
}

impl ChecklistSchema {
    /// Build a schema and its field-name index.
    ///
    /// Section keys must be unique, and task keys unique within a section.
    pub fn new(sections: Vec<Section>) -> Self {
        let mut fields = HashMap::new();
        let mut files = HashMap::new();

        for top in TopField::ALL {
            fields.insert(top.name().to_string(), FieldKey::Top(top));
        }

        for (section_idx, section) in sections.iter().enumerate() {
            debug_assert!(
                sections.iter().filter(|s| s.key == section.key).count() == 1,
                "duplicate section key {}",
                section.key
            );

            for (task_idx, task) in section.tasks.iter().enumerate() {
                let previous = fields.insert(
                    encode(&section.key, &task.key),
                    FieldKey::Task(TaskRef {
                        section: section_idx,
                        task: task_idx,
                    }),
                );
                debug_assert!(previous.is_none(), "duplicate task field {}", task.key);
            }

            if let Some(text_field) = section.text_field() {
                fields.insert(text_field.to_string(), FieldKey::Note(section_idx));
            }

            for slot in &section.slots {
                files.insert(
                    encode(&section.key, slot.as_str()),
                    SlotRef {
                        section: section_idx,
                        slot: *slot,
                    },
                );
            }
        }

        Self {
            sections,
            fields,
            files,
        }
    }

    /// The cleaning checklist served by the intake form.
    pub fn standard() -> Self {
        let room_tasks = vec![
            Task::new("bed_made", "Lit fait || Ліжко заправлене"),
            Task::new(
                "floor_clean",
                "Sol aspiré/lavé || Підлога пропилосошена / вимита",
            ),
            Task::new("dust_removed", "Poussière enlevée || Пил витертий"),
            Task::new("bin_emptied", "Poubelle vidée || Смітник спорожнений"),
        ];
        let before_after = vec![Slot::PhotoBefore, Slot::PhotoAfter];

        let mut sections: Vec<Section> = (1..=4)
            .map(|n| Section {
                key: format!("room{n}"),
                title: format!("🛏️  Chambre {n} || Кімната {n}"),
                kind: SectionKind::Room,
                tasks: room_tasks.clone(),
                slots: before_after.clone(),
            })
            .collect();

        let chores = |key: &str, title: &str, tasks: Vec<Task>| Section {
            key: key.to_string(),
            title: title.to_string(),
            kind: SectionKind::Chores { required: true },
            tasks,
            slots: before_after.clone(),
        };

        sections.push(chores(
            "kitchen",
            "🍽️ Cuisine || Кухня",
            vec![
                Task::new(
                    "counter_clean",
                    "Plan de travail nettoyé || Робоча поверхня очищена",
                ),
                Task::new("floor_mopped", "Sol lavé || Підлога вимита"),
                Task::new(
                    "fridge_outside_clean",
                    "Frigo propre à l’extérieur || Холодильник чистий зовні",
                ),
                Task::new(
                    "cupboards_tidy",
                    "Placards rangés || Шафи впорядковані",
                ),
            ],
        ));
        sections.push(chores(
            "dishes",
            "Vaisselle || Посуд",
            vec![
                Task::new(
                    "clean_and_stowed",
                    "Vaisselle propre et rangée (couverts, poêles, casseroles) || Посуд чистий і складений",
                ),
                Task::new(
                    "dishwasher_emptied",
                    "Vider le lave-vaisselle || Спорожнити посудомийну машину",
                ),
            ],
        ));
        sections.push(chores(
            "oven",
            "Four || Духовка",
            vec![
                Task::new("inside_clean", "Intérieur propre || Внутрішня частина чиста"),
                Task::new(
                    "outside_clean",
                    "Extérieur nettoyé || Зовнішня частина очищена",
                ),
            ],
        ));
        sections.push(chores(
            "microwave",
            "Micro-ondes || Мікрохвильова піч",
            vec![
                Task::new(
                    "mw_inside_clean",
                    "Intérieur propre || Внутрішня частина чиста",
                ),
                Task::new(
                    "mw_outside_clean",
                    "Extérieur nettoyé || Зовнішня частина очищена",
                ),
            ],
        ));
        sections.push(chores(
            "shower",
            "Douche || Душ",
            vec![
                Task::new(
                    "walls_floor_clean",
                    "Murs et sol nettoyés || Стіни та підлога очищені",
                ),
                Task::new("no_hair_soap", "Pas de cheveux / savon || Немає волосся / мила"),
                Task::new(
                    "use_destop_if_clogged",
                    "Mettre du Destop si bouché (à vérifier) || Використати засіб «Destop», якщо забито",
                ),
                Task::new(
                    "refill_gel_shampoo",
                    "Remplir gel douche et shampoing || Поповнити запаси гелю для душу та шампуню",
                ),
            ],
        ));
        sections.push(chores(
            "toilet",
            "Toilette || Туалет",
            vec![
                Task::new("bowl_cleaned", "Cuvette nettoyée || Унітаз очищений"),
                Task::new("toilet_floor_mopped", "Sol lavé || Підлога вимита"),
                Task::new(
                    "toilet_paper_present",
                    "Papier toilette présent || Туалетний папір наявний",
                ),
            ],
        ));

        sections.push(Section {
            key: "special".to_string(),
            title: "📎 Cas spécial ou oubli || Особливий випадок або забуто".to_string(),
            kind: SectionKind::Note {
                text_field: "special_text".to_string(),
            },
            tasks: Vec::new(),
            slots: Vec::new(),
        });
        sections.push(Section {
            key: "extra".to_string(),
            title: "📸 Veuillez ajouter une photo ou un commentaire || Будь ласка, додайте фото або коментар".to_string(),
            kind: SectionKind::Note {
                text_field: "extra_text".to_string(),
            },
            tasks: Vec::new(),
            slots: vec![Slot::Photo],
        });

        Self::new(sections)
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn section(&self, key: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.key == key)
    }

    pub fn required_sections(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter().filter(|s| s.is_required())
    }

    /// Decode a text-field name. `None` means the name is not part of this form.
    pub fn decode_field(&self, name: &str) -> Option<FieldKey> {
        self.fields.get(name).copied()
    }

    /// Decode a file-field name. `None` means the name is not part of this form.
    pub fn decode_file(&self, name: &str) -> Option<SlotRef> {
        self.files.get(name).copied()
    }

    /// Wire name of a checkbox.
    pub fn field_name(&self, task: TaskRef) -> Option<String> {
        let section = self.sections.get(task.section)?;
        let task = section.tasks.get(task.task)?;
        Some(encode(&section.key, &task.key))
    }

    /// Wire name of an upload slot.
    pub fn file_field_name(&self, slot: SlotRef) -> Option<String> {
        let section = self.sections.get(slot.section)?;
        Some(encode(&section.key, slot.slot.as_str()))
    }

    /// Every (section, slot) pair, in schema order.
    pub fn slots(&self) -> impl Iterator<Item = SlotRef> + '_ {
        self.sections
            .iter()
            .enumerate()
            .flat_map(|(section, s)| s.slots.iter().map(move |&slot| SlotRef { section, slot }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    #[test]
    fn standard_section_order() {
        let schema = ChecklistSchema::standard();
        let keys: Vec<&str> = schema.sections().iter().map(|s| s.key.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "room1", "room2", "room3", "room4", "kitchen", "dishes", "oven", "microwave",
                "shower", "toilet", "special", "extra",
            ]
        );
    }

    #[test]
    fn six_required_sections() {
        let schema = ChecklistSchema::standard();
        let required: Vec<&str> = schema.required_sections().map(|s| s.key.as_str()).collect();
        assert_eq!(
            required,
            vec!["kitchen", "dishes", "oven", "microwave", "shower", "toilet"]
        );
    }

    #[test]
    fn keys_are_unique() {
        let schema = ChecklistSchema::standard();
        let mut seen = HashSet::new();
        for section in schema.sections() {
            assert!(seen.insert(section.key.clone()), "duplicate {}", section.key);
            let mut tasks = HashSet::new();
            for task in &section.tasks {
                assert!(tasks.insert(task.key.clone()), "duplicate {}", task.key);
            }
        }
    }

    #[test]
    fn every_task_name_round_trips() {
        let schema = ChecklistSchema::standard();
        for (s, section) in schema.sections().iter().enumerate() {
            for t in 0..section.tasks.len() {
                let task = TaskRef { section: s, task: t };
                let name = schema.field_name(task).expect("name");
                assert_eq!(schema.decode_field(&name), Some(FieldKey::Task(task)));
            }
        }
    }

    #[test]
    fn decodes_known_names() {
        let schema = ChecklistSchema::standard();
        let kitchen = schema
            .sections()
            .iter()
            .position(|s| s.key == "kitchen")
            .expect("kitchen");

        assert_eq!(
            schema.decode_field("kitchen__floor_mopped"),
            Some(FieldKey::Task(TaskRef {
                section: kitchen,
                task: 1
            }))
        );
        assert_eq!(
            schema.decode_field("email"),
            Some(FieldKey::Top(TopField::Email))
        );
        assert!(matches!(
            schema.decode_field("special_text"),
            Some(FieldKey::Note(_))
        ));
        assert_eq!(
            schema.decode_file("kitchen__photo_after"),
            Some(SlotRef {
                section: kitchen,
                slot: Slot::PhotoAfter
            })
        );
    }

    #[test]
    fn rejects_unknown_names() {
        let schema = ChecklistSchema::standard();
        assert_eq!(schema.decode_field("kitchen__bed_made"), None);
        assert_eq!(schema.decode_field("room5__bed_made"), None);
        assert_eq!(schema.decode_field("kitchen"), None);
        assert_eq!(schema.decode_file("special__photo"), None);
        assert_eq!(schema.decode_file("extra__photo_before"), None);
    }

    #[test]
    fn slot_pairs_cover_rooms_chores_and_extra() {
        let schema = ChecklistSchema::standard();
        let names: Vec<String> = schema
            .slots()
            .filter_map(|slot| schema.file_field_name(slot))
            .collect();
        assert_eq!(names.len(), 4 * 2 + 6 * 2 + 1);
        assert!(names.contains(&"room1__photo_before".to_string()));
        assert!(names.contains(&"toilet__photo_after".to_string()));
        assert_eq!(names.last().map(String::as_str), Some("extra__photo"));
    }
}
