//! Form schema for the cleaning checklist.
//!
//! The schema is plain data: the ordered sections (rooms, chores, notes),
//! their tasks and photo slots, and which sections need at least one ticked
//! box. It is built once per process and shared read-only by the form
//! renderer and the submission processor.

pub mod keys;
pub mod schema;

use std::sync::Arc;

use once_cell::sync::Lazy;

pub use keys::{FieldKey, SEPARATOR, SlotRef, TaskRef, TopField};
pub use schema::{ChecklistSchema, Section, SectionKind, Slot, Task};

static SCHEMA: Lazy<Arc<ChecklistSchema>> = Lazy::new(|| Arc::new(ChecklistSchema::standard()));

/// The process-wide checklist schema.
pub fn get_schema() -> Arc<ChecklistSchema> {
    Arc::clone(&SCHEMA)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_schema_is_shared() {
        let a = get_schema();
        let b = get_schema();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
