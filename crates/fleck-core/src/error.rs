use crate::status::Status;
use std::fmt;

pub type Result<T> = std::result::Result<T, FleckError>;

/// Errors surfaced by the library crates.
///
/// Corrupt stores never show up here: loads fall back to the default
/// document and log a warning instead.
#[derive(Debug, thiserror::Error)]
pub enum FleckError {
    #[error("no active task. Run `fleck create <name>` or `fleck switch <name>` first")]
    NoActiveTask,

    #[error("task not found: {0}")]
    TaskNotFound(String),

    #[error("todo #{todo_id} not found in task '{task}'")]
    TodoNotFound { task: String, todo_id: String },

    #[error("no saved workspace found for task: {0}")]
    SnapshotNotFound(String),

    #[error("task already exists: {0}")]
    AlreadyExists(String),

    #[error("todo #{todo_id} cannot move from {from} to {to}")]
    InvalidTransition {
        todo_id: String,
        from: Status,
        to: Status,
    },

    #[error("invalid task name: {0:?}")]
    InvalidName(String),

    #[error("external tool failed: {0}")]
    ExternalTool(String),

    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification of [`FleckError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    AlreadyExists,
    InvalidTransition,
    StorageCorrupt,
    ExternalToolFailure,
    Io,
}

impl FleckError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NoActiveTask
            | Self::TaskNotFound(_)
            | Self::TodoNotFound { .. }
            | Self::SnapshotNotFound(_) => ErrorKind::NotFound,
            Self::AlreadyExists(_) => ErrorKind::AlreadyExists,
            Self::InvalidTransition { .. } | Self::InvalidName(_) => ErrorKind::InvalidTransition,
            Self::ExternalTool(_) => ErrorKind::ExternalToolFailure,
            Self::Storage(_) => ErrorKind::StorageCorrupt,
            Self::Io(_) => ErrorKind::Io,
        }
    }
}

/// User-facing `(success, message)` result of a core operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub success: bool,
    pub message: String,
}

impl Outcome {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

impl From<&FleckError> for Outcome {
    fn from(err: &FleckError) -> Self {
        Outcome::failed(err.to_string())
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = if self.success { "✓" } else { "✗" };
        write!(f, "{mark} {}", self.message)
    }
}
