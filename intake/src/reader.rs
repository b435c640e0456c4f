//! Token-gated admin listing and the thank-you acknowledgement.

use std::fmt;
use std::sync::Arc;

use crate::errors::Result;
use crate::model::{Submission, SubmissionId};
use crate::store::SubmissionStore;

/// Proof that the caller presented the admin token.
///
/// Only [`AdminGate::authorize`] constructs one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminAccess {
    _private: (),
}

/// Compares presented tokens against the configured shared secret.
#[derive(Clone)]
pub struct AdminGate {
    secret: String,
}

impl fmt::Debug for AdminGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminGate").finish_non_exhaustive()
    }
}

impl AdminGate {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// `None` on a missing or mismatching token.
    pub fn authorize(&self, token: Option<&str>) -> Option<AdminAccess> {
        match token {
            Some(token) if token == self.secret => Some(AdminAccess { _private: () }),
            _ => {
                tracing::warn!("Admin listing refused: bad token");
                None
            }
        }
    }
}

/// Read side over the submission store.
#[derive(Clone)]
pub struct SubmissionReader {
    store: Arc<SubmissionStore>,
    limit: usize,
}

impl SubmissionReader {
    pub fn new(store: Arc<SubmissionStore>, limit: usize) -> Self {
        Self { store, limit }
    }

    /// The newest submissions, highest id first, at most the configured limit.
    pub fn list_recent(&self, _access: &AdminAccess) -> Result<Vec<Submission>> {
        let rows = self.store.list_recent(self.limit)?;
        tracing::debug!(rows = rows.len(), limit = self.limit, "Admin listing read");
        Ok(rows)
    }
}

/// Text of the thank-you page. Echoes the id without checking it exists.
pub fn acknowledge(sid: Option<&str>) -> String {
    match sid.map(str::trim).filter(|s| !s.is_empty()) {
        Some(sid) => format!("Merci ! Votre soumission #{sid} a été enregistrée."),
        None => "Merci ! Votre soumission a été enregistrée.".to_string(),
    }
}

impl AdminAccess {
    #[cfg(test)]
    pub(crate) fn for_tests() -> Self {
        Self { _private: () }
    }
}

/// Parse the `sid` echoed back to the thank-you page, if it is an id.
pub fn parse_sid(sid: &str) -> Option<SubmissionId> {
    sid.trim().parse().ok().map(SubmissionId)
}
