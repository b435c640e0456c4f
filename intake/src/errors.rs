//! Intake error types
//!
//! Validation failures are user-facing and always reported before anything
//! is written. Store and upload failures are fatal for the request and are
//! never retried.

use std::fmt;

use thiserror::Error;

/// Error category for structured logging and response mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// `menage.toml` or env misconfigured
    ConfigError,
    /// Missing required fields or section selections
    ValidationError,
    /// SQLite open/insert/update/query failures
    StoreError,
    /// Failures writing uploaded files under the upload root
    UploadError,
    /// Unexpected logic bugs
    InternalError,
}

impl ErrorCategory {
    /// Machine-readable code for logging
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ConfigError => "CONFIG_ERROR",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::StoreError => "STORE_ERROR",
            Self::UploadError => "UPLOAD_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Whether the message may be shown back to the person filling the form
    pub fn is_user_facing(self) -> bool {
        matches!(self, Self::ValidationError)
    }
}

/// Aggregated reasons a submission was refused.
///
/// All three lists are collected in one pass; any non-empty list blocks the
/// write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationError {
    /// Labels of required text fields that were empty after trimming.
    pub missing_fields: Vec<&'static str>,
    /// Titles of required sections with no ticked task.
    pub missing_sections: Vec<String>,
    /// Posted field names that do not belong to the form.
    pub unrecognized_fields: Vec<String>,
}

impl ValidationError {
    pub fn is_empty(&self) -> bool {
        self.missing_fields.is_empty()
            && self.missing_sections.is_empty()
            && self.unrecognized_fields.is_empty()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if !self.missing_fields.is_empty() {
            parts.push(format!(
                "Champs requis manquants / Обов'язкові поля відсутні: {}",
                self.missing_fields.join(", ")
            ));
        }
        if !self.missing_sections.is_empty() {
            parts.push(format!(
                "Sélectionnez au moins une case dans: {}",
                self.missing_sections.join("; ")
            ));
        }
        if !self.unrecognized_fields.is_empty() {
            parts.push(format!(
                "Champs inconnus / Невідомі поля: {}",
                self.unrecognized_fields.join(", ")
            ));
        }
        f.write_str(&parts.join(" | "))
    }
}

impl std::error::Error for ValidationError {}

/// Intake error with category and context
#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("config error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("{0}")]
    Validation(ValidationError),

    #[error("store error: {message}")]
    Store {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("upload error: {message}")]
    Upload {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("internal error: {message}")]
    Internal { message: String },
}

impl IntakeError {
    /// Get the error category
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Config { .. } => ErrorCategory::ConfigError,
            Self::Validation(_) => ErrorCategory::ValidationError,
            Self::Store { .. } => ErrorCategory::StoreError,
            Self::Upload { .. } => ErrorCategory::UploadError,
            Self::Internal { .. } => ErrorCategory::InternalError,
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    /// Create a config error with source
    pub fn config_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a store error
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
            source: None,
        }
    }

    /// Create a store error with source
    pub fn store_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Store {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an upload error with source
    pub fn upload_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Upload {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// The validation report, if this is a validation failure
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(v) => Some(v),
            _ => None,
        }
    }
}

impl From<ValidationError> for IntakeError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err)
    }
}

/// Result type for intake operations
pub type Result<T> = std::result::Result<T, IntakeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_joins_both_lists() {
        let err = ValidationError {
            missing_fields: vec!["Email", "Nom"],
            missing_sections: vec!["Four || Духовка".to_string(), "Douche || Душ".to_string()],
            unrecognized_fields: Vec::new(),
        };
        assert_eq!(
            err.to_string(),
            "Champs requis manquants / Обов'язкові поля відсутні: Email, Nom | \
             Sélectionnez au moins une case dans: Four || Духовка; Douche || Душ"
        );
    }

    #[test]
    fn categories() {
        assert_eq!(
            IntakeError::from(ValidationError::default()).category(),
            ErrorCategory::ValidationError
        );
        assert!(ErrorCategory::ValidationError.is_user_facing());
        assert!(!IntakeError::store("down").category().is_user_facing());
        assert_eq!(IntakeError::store("down").category().as_str(), "STORE_ERROR");
    }
}
