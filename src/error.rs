use chrono::NaiveDate;
use thiserror::Error;

/// Input rejected before it reaches the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("activity must not be empty")]
    EmptyActivity,

    #[error("session ends at {end} before it starts at {start}")]
    EndBeforeStart { start: String, end: String },

    #[error("start date {start} must not be after end date {end}")]
    InvertedRange { start: NaiveDate, end: NaiveDate },

    #[error("task text must not be empty")]
    EmptyTask,

    #[error("paste some notes first")]
    EmptyNotes,

    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        min: u32,
        max: u32,
        value: u32,
    },

    #[error("correct choice {index} is out of range for {choices} choices")]
    ChoiceOutOfRange { index: usize, choices: usize },

    #[error("session target must be one of 15, 25, 30, 45, 60, 90 or 120 minutes, got {0}")]
    UnknownTarget(u32),
}

/// Attached as context to every failed database operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("storage error: {operation}")]
pub struct StorageError {
    pub operation: String,
}

impl StorageError {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
        }
    }
}

/// An update addressed a row that does not exist.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} {id} not found")]
pub struct NotFound {
    pub kind: &'static str,
    pub id: i64,
}

pub fn is_storage_error(err: &anyhow::Error) -> bool {
    err.downcast_ref::<StorageError>().is_some()
}

pub fn as_validation_error(err: &anyhow::Error) -> Option<&ValidationError> {
    err.downcast_ref::<ValidationError>()
}

pub fn as_not_found(err: &anyhow::Error) -> Option<&NotFound> {
    err.downcast_ref::<NotFound>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Context};

    #[test]
    fn storage_context_is_detectable() {
        let err = Err::<(), _>(anyhow!("disk I/O error"))
            .context(StorageError::new("insert session"))
            .unwrap_err();

        assert!(is_storage_error(&err));
        assert_eq!(err.to_string(), "storage error: insert session");
    }

    #[test]
    fn validation_error_survives_anyhow() {
        let err = anyhow::Error::new(ValidationError::EmptyTask);
        assert_eq!(as_validation_error(&err), Some(&ValidationError::EmptyTask));
        assert!(!is_storage_error(&err));
    }

    #[test]
    fn not_found_names_the_row() {
        let err = anyhow::Error::new(NotFound { kind: "Task", id: 7 });
        assert_eq!(err.to_string(), "Task 7 not found");
        assert_eq!(as_not_found(&err).map(|e| e.id), Some(7));
        assert!(!is_storage_error(&err));
    }
}
