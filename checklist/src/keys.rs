//! Typed keys for form-field names.
//!
//! Browsers only speak flat string names, so a (section, task) pair travels
//! as `"{section}__{task}"` and a (section, slot) pair as
//! `"{section}__{slot}"`. Everything past the HTTP boundary works with the
//! typed forms below; [`crate::ChecklistSchema`] owns the decode tables.

/// Separator between a section key and a task key or slot name.
pub const SEPARATOR: &str = "__";

/// Join a section key and a task key (or slot name) into a field name.
pub fn encode(section_key: &str, part: &str) -> String {
    format!("{section_key}{SEPARATOR}{part}")
}

/// Top-level (non-checklist) text fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TopField {
    Email,
    Apartment,
    Date,
    PersonName,
    Lat,
    Lng,
}

impl TopField {
    pub const ALL: [TopField; 6] = [
        Self::Email,
        Self::Apartment,
        Self::Date,
        Self::PersonName,
        Self::Lat,
        Self::Lng,
    ];

    /// The four fields that must be non-empty after trimming, in report order.
    pub const REQUIRED: [TopField; 4] =
        [Self::Email, Self::Apartment, Self::Date, Self::PersonName];

    /// Form-field name on the wire.
    pub fn name(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Apartment => "apartment",
            Self::Date => "date",
            Self::PersonName => "person_name",
            Self::Lat => "lat",
            Self::Lng => "lng",
        }
    }

    /// Localized label used in "missing field" reports.
    pub fn label(self) -> &'static str {
        match self {
            Self::Email => "Email",
            Self::Apartment => "Appartement",
            Self::Date => "Date",
            Self::PersonName => "Nom",
            Self::Lat => "Latitude",
            Self::Lng => "Longitude",
        }
    }

    pub fn is_required(self) -> bool {
        Self::REQUIRED.contains(&self)
    }
}

/// A checkbox: task `task` of section `section` (both schema indices).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskRef {
    pub section: usize,
    pub task: usize,
}

/// An upload slot of section `section` (schema index).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotRef {
    pub section: usize,
    pub slot: crate::Slot,
}

/// Decoded text-field name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKey {
    Top(TopField),
    Task(TaskRef),
    /// Free-text body of a note section (schema index).
    Note(usize),
}
