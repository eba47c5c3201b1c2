use thiserror::Error;

use crate::model::{ProjectId, TaskId};

pub type StoreResult<T> = Result<T, StoreError>;

/// Failure of a store operation. The display string is what lands in the
/// store's `error` field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("store has not been initialized")]
    NotInitialized,

    #[error("project name must not be empty")]
    EmptyProjectName,

    #[error("no project selected")]
    NoProjectSelected,

    #[error("project not found: {0}")]
    ProjectNotFound(ProjectId),

    #[error("task not found: {0}")]
    TaskNotFound(TaskId),
}

/// Failure of the durable key/value slot.
#[derive(Debug, Error)]
pub enum SlotError {
    #[error("storage I/O failed for `{key}`: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
}

/// Failure to turn a persisted payload back into state.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("malformed persisted payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("persisted payload has version {found}, newest supported is {supported}")]
    UnsupportedVersion { found: u64, supported: u64 },

    #[error("persisted payload has no state object")]
    MissingState,
}

/// Failure while exchanging task data with CSV files.
#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("I/O failed for `{path}`: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(
        "CSV is missing required columns. Found headers: {0:?}. Need a column for the task name."
    )]
    MissingColumns(Vec<String>),

    #[error("CSV file is empty or has no data rows")]
    Empty,
}
