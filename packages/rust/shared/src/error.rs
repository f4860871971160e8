//! Error types for Leadline.
//!
//! Library crates use [`LeadlineError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//!
//! Only [`LeadlineError::ContactResolution`] is fatal to a submission. The
//! record, note and notification variants are logged by the pipeline and
//! degrade to a partial success.

use std::path::PathBuf;

/// Top-level error type for all Leadline operations.
#[derive(Debug, thiserror::Error)]
pub enum LeadlineError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Transport-level HTTP failure talking to an external service.
    #[error("network error: {0}")]
    Network(String),

    /// The CRM answered, but refused the call or returned an unexpected body.
    #[error("crm error: {0}")]
    Crm(String),

    /// A contact could not be found or created; the submission must abort.
    #[error("contact resolution failed: {0}")]
    ContactResolution(String),

    /// Lead or Deal creation failed after the contact was resolved.
    #[error("record creation failed: {0}")]
    RecordCreation(String),

    /// Attaching a note to a Lead or Deal failed.
    #[error("note attachment failed: {0}")]
    NoteAttachment(String),

    /// Email dispatch failed.
    #[error("notification failed: {0}")]
    Notification(String),

    /// Database or storage layer error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (malformed payload, unknown submission type, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Document layout or PDF encoding error.
    #[error("render error: {0}")]
    Render(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, LeadlineError>;

impl LeadlineError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error should change the HTTP-level outcome of a submission.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::RecordCreation(_) | Self::NoteAttachment(_) | Self::Notification(_)
        )
    }
}
