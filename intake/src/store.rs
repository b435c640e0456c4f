//! SQLite store for submissions
//!
//! One `submissions` row per accepted checklist. Checklist state and file
//! references are stored as JSON text so the table stays valid when the form
//! schema grows new sections.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::errors::{IntakeError, Result};
use crate::model::{Coordinates, FileReferences, NewSubmission, Submission, SubmissionId};

/// Embedded schema SQL
const SCHEMA_SQL: &str = include_str!("../SUBMISSIONS_SCHEMA.sql");

const SELECT_COLUMNS: &str = "id, created_at, email, apartment, date_iso, person_name, \
                              lat, lng, data_json, files_json";

/// Submission table wrapper.
///
/// The connection is shared behind a mutex; every method is a single
/// statement, so callers never hold the lock across other I/O.
pub struct SubmissionStore {
    conn: Mutex<Connection>,
}

impl SubmissionStore {
    /// Open (or create) the database file and apply the schema.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                IntakeError::store_with_source(
                    format!("failed to create db directory: {}", parent.display()),
                    e,
                )
            })?;
        }

        let conn = Connection::open(path).map_err(|e| {
            IntakeError::store_with_source(format!("failed to open db at {}", path.display()), e)
        })?;

        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| IntakeError::store_with_source("failed to enable WAL", e))?;

        Self::apply_schema(&conn)?;

        tracing::debug!(path = %path.display(), "Submission store initialized");

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory database, for tests and throwaway runs.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| IntakeError::store_with_source("failed to open in-memory db", e))?;

        Self::apply_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn apply_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(SCHEMA_SQL)
            .map_err(|e| IntakeError::store_with_source("failed to apply schema", e))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| IntakeError::store("submission store lock poisoned"))
    }

    /// Insert a new row and return its store-assigned id.
    pub fn insert(&self, submission: &NewSubmission) -> Result<SubmissionId> {
        let data_json = serde_json::to_string(&submission.checklist)
            .map_err(|e| IntakeError::store_with_source("failed to encode checklist data", e))?;
        let files_json = serde_json::to_string(&submission.files)
            .map_err(|e| IntakeError::store_with_source("failed to encode file references", e))?;

        let conn = self.lock()?;
        conn.execute(
            r#"
            INSERT INTO submissions
                (created_at, email, apartment, date_iso, person_name, lat, lng, data_json, files_json)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                submission.created_at.to_rfc3339(),
                submission.email,
                submission.apartment,
                submission.date,
                submission.person_name,
                submission.coordinates.map(|c| c.lat),
                submission.coordinates.map(|c| c.lng),
                data_json,
                files_json,
            ],
        )
        .map_err(|e| IntakeError::store_with_source("failed to insert submission", e))?;

        Ok(SubmissionId(conn.last_insert_rowid()))
    }

    /// Replace the file references of an existing row.
    pub fn update_file_references(&self, id: SubmissionId, files: &FileReferences) -> Result<()> {
        let files_json = serde_json::to_string(files)
            .map_err(|e| IntakeError::store_with_source("failed to encode file references", e))?;

        let updated = self
            .lock()?
            .execute(
                "UPDATE submissions SET files_json = ?2 WHERE id = ?1",
                params![id.0, files_json],
            )
            .map_err(|e| IntakeError::store_with_source("failed to update file references", e))?;

        if updated == 0 {
            return Err(IntakeError::store(format!("submission {id} disappeared")));
        }
        Ok(())
    }

    /// Fetch one submission by id.
    pub fn get(&self, id: SubmissionId) -> Result<Option<Submission>> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                &format!("SELECT {SELECT_COLUMNS} FROM submissions WHERE id = ?1"),
                params![id.0],
                RawRow::from_row,
            )
            .optional()
            .map_err(|e| IntakeError::store_with_source("failed to get submission", e))?;

        row.map(RawRow::decode).transpose()
    }

    /// The newest `limit` submissions, highest id first.
    pub fn list_recent(&self, limit: usize) -> Result<Vec<Submission>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {SELECT_COLUMNS} FROM submissions ORDER BY id DESC LIMIT ?1"
            ))
            .map_err(|e| IntakeError::store_with_source("failed to prepare query", e))?;

        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt
            .query_map(params![limit], RawRow::from_row)
            .map_err(|e| IntakeError::store_with_source("failed to query submissions", e))?;

        let mut submissions = Vec::new();
        for row in rows {
            let raw = row
                .map_err(|e| IntakeError::store_with_source("failed to read submission row", e))?;
            let id = raw.id;
            match raw.decode() {
                Ok(submission) => submissions.push(submission),
                Err(e) => tracing::warn!(
                    submission_id = id,
                    error = %e,
                    "Skipping undecodable submission row"
                ),
            }
        }
        Ok(submissions)
    }

    /// Row count (for logging and tests).
    pub fn count(&self) -> Result<i64> {
        self.lock()?
            .query_row("SELECT COUNT(*) FROM submissions", [], |row| row.get(0))
            .map_err(|e| IntakeError::store_with_source("failed to count submissions", e))
    }
}

/// Column values before the JSON blobs and timestamp are decoded.
struct RawRow {
    id: i64,
    created_at: String,
    email: String,
    apartment: String,
    date: String,
    person_name: String,
    lat: Option<f64>,
    lng: Option<f64>,
    data_json: String,
    files_json: String,
}

impl RawRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            created_at: row.get(1)?,
            email: row.get(2)?,
            apartment: row.get(3)?,
            date: row.get(4)?,
            person_name: row.get(5)?,
            lat: row.get(6)?,
            lng: row.get(7)?,
            data_json: row.get(8)?,
            files_json: row.get(9)?,
        })
    }

    fn decode(self) -> Result<Submission> {
        let id = SubmissionId(self.id);
        let created_at = parse_created_at(&self.created_at).map_err(|e| {
            IntakeError::store_with_source(format!("bad created_at on submission {id}"), e)
        })?;
        let checklist = serde_json::from_str(&self.data_json).map_err(|e| {
            IntakeError::store_with_source(format!("bad data_json on submission {id}"), e)
        })?;
        let files = serde_json::from_str(&self.files_json).map_err(|e| {
            IntakeError::store_with_source(format!("bad files_json on submission {id}"), e)
        })?;

        Ok(Submission {
            id,
            created_at,
            email: self.email,
            apartment: self.apartment,
            date: self.date,
            person_name: self.person_name,
            coordinates: match (self.lat, self.lng) {
                (Some(lat), Some(lng)) => Some(Coordinates { lat, lng }),
                _ => None,
            },
            checklist,
            files,
        })
    }
}

/// RFC 3339 as written by `insert`, or a naive ISO timestamp taken as UTC.
fn parse_created_at(value: &str) -> std::result::Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(value, NAIVE_TIMESTAMP_FORMAT).map(|n| n.and_utc())
        })
}

const NAIVE_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ChecklistData, SectionData};
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    fn sample(email: &str) -> NewSubmission {
        let mut checklist = ChecklistData::new();
        checklist.insert(
            "kitchen".to_string(),
            SectionData::Tasks(BTreeMap::from([
                ("counter_clean".to_string(), true),
                ("floor_mopped".to_string(), false),
            ])),
        );
        checklist.insert("extra".to_string(), SectionData::Text("merci".to_string()));

        let mut files = FileReferences::new();
        files.insert(
            "kitchen".to_string(),
            BTreeMap::from([
                ("photo_before".to_string(), Some("k.png".to_string())),
                ("photo_after".to_string(), None),
            ]),
        );

        NewSubmission {
            created_at: Utc::now(),
            email: email.to_string(),
            apartment: "B12".to_string(),
            date: "2024-05-01".to_string(),
            person_name: "Ana".to_string(),
            coordinates: None,
            checklist,
            files,
        }
    }

    #[test]
    fn test_schema_applies() {
        let store = SubmissionStore::open_in_memory().expect("should open");
        assert_eq!(store.count().expect("count"), 0);
    }

    #[test]
    fn test_insert_and_get() {
        let store = SubmissionStore::open_in_memory().expect("should open");
        let mut new = sample("ana@example.com");
        new.coordinates = Some(Coordinates {
            lat: 48.85,
            lng: 2.35,
        });

        let id = store.insert(&new).expect("insert");
        let got = store.get(id).expect("get").expect("exists");

        assert_eq!(got.id, id);
        assert_eq!(got.email, "ana@example.com");
        assert_eq!(got.coordinates, new.coordinates);
        assert_eq!(got.checklist, new.checklist);
        assert_eq!(got.files, new.files);
        assert_eq!(got.created_at.timestamp(), new.created_at.timestamp());
        assert_eq!(got.file("kitchen", "photo_before"), Some("k.png"));
        assert_eq!(got.file("kitchen", "photo_after"), None);

        assert!(store.get(SubmissionId(999)).expect("get").is_none());
    }

    #[test]
    fn test_ids_increase() {
        let store = SubmissionStore::open_in_memory().expect("should open");
        let a = store.insert(&sample("a@x")).expect("insert");
        let b = store.insert(&sample("b@x")).expect("insert");
        let c = store.insert(&sample("c@x")).expect("insert");
        assert!(a < b && b < c);
    }

    #[test]
    fn test_update_file_references() {
        let store = SubmissionStore::open_in_memory().expect("should open");
        let id = store.insert(&sample("a@x")).expect("insert");

        let mut files = FileReferences::new();
        files.insert(
            "kitchen".to_string(),
            BTreeMap::from([(
                "photo_before".to_string(),
                Some("kitchen__photo_before__k.png".to_string()),
            )]),
        );
        store.update_file_references(id, &files).expect("update");

        let got = store.get(id).expect("get").expect("exists");
        assert_eq!(
            got.file("kitchen", "photo_before"),
            Some("kitchen__photo_before__k.png")
        );

        assert!(
            store
                .update_file_references(SubmissionId(42), &files)
                .is_err()
        );
    }

    #[test]
    fn test_list_recent_is_newest_first() {
        let store = SubmissionStore::open_in_memory().expect("should open");
        for email in ["a@x", "b@x", "c@x"] {
            store.insert(&sample(email)).expect("insert");
        }

        let recent = store.list_recent(2).expect("list");
        let emails: Vec<&str> = recent.iter().map(|s| s.email.as_str()).collect();
        assert_eq!(emails, vec!["c@x", "b@x"]);
    }

    #[test]
    fn test_reopen_keeps_rows() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("instance").join("submissions.sqlite3");

        let first = {
            let store = SubmissionStore::open(&path).expect("open");
            store.insert(&sample("a@x")).expect("insert")
        };

        let store = SubmissionStore::open(&path).expect("reopen");
        assert_eq!(store.count().expect("count"), 1);
        let second = store.insert(&sample("b@x")).expect("insert");
        assert!(second > first);
    }

    fn insert_raw(store: &SubmissionStore, created_at: &str, email: &str) {
        store
            .lock()
            .expect("lock")
            .execute(
                "INSERT INTO submissions \
                 (created_at, email, apartment, date_iso, person_name, data_json, files_json) \
                 VALUES (?1, ?2, 'B12', '2024-05-01', 'Ana', '{}', '{}')",
                params![created_at, email],
            )
            .expect("raw insert");
    }

    #[test]
    fn test_naive_timestamps_read_as_utc() {
        let store = SubmissionStore::open_in_memory().expect("should open");
        insert_raw(&store, "2024-05-01T10:30:00.123456", "naive@x");
        insert_raw(&store, "2024-05-01T10:30:00", "plain@x");

        let recent = store.list_recent(10).expect("list");
        assert_eq!(recent.len(), 2);
        assert_eq!(
            recent[1].created_at.to_rfc3339(),
            "2024-05-01T10:30:00.123456+00:00"
        );
        assert_eq!(recent[0].created_at.to_rfc3339(), "2024-05-01T10:30:00+00:00");
        assert!(recent[1].checklist.is_empty());
    }

    #[test]
    fn test_list_recent_skips_undecodable_rows() {
        let store = SubmissionStore::open_in_memory().expect("should open");
        store.insert(&sample("a@x")).expect("insert");
        insert_raw(&store, "yesterday-ish", "bad@x");
        store.insert(&sample("c@x")).expect("insert");

        let recent = store.list_recent(10).expect("list");
        let emails: Vec<&str> = recent.iter().map(|s| s.email.as_str()).collect();
        assert_eq!(emails, vec!["c@x", "a@x"]);
        assert!(store.get(SubmissionId(2)).is_err());
    }
}
