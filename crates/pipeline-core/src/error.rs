use crate::configurator::ValidationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("pipeline stage not found for {entity_type}/{entity_id}")]
    StageNotFound {
        entity_type: String,
        entity_id: String,
    },

    #[error("failed to load {resource}: {reason}")]
    LoadFailure { resource: String, reason: String },

    #[error("store error during {operation}: {message}")]
    Store { operation: String, message: String },

    #[error("invalid transition from {from} to {to}: {reason}")]
    InvalidTransition {
        from: String,
        to: String,
        reason: String,
    },

    #[error("session is not interactive: {0}")]
    NotInteractive(String),

    #[error("operation requires step {expected}, session is at {actual}")]
    WrongStep { expected: String, actual: String },

    #[error("session already closed")]
    SessionClosed,

    #[error("at least one action must be selected before continuing")]
    EmptySelection,

    #[error("no actions selected: go back to choose actions")]
    NoChanges,

    #[error("action '{0}' is required and cannot be deselected")]
    RequiredActionLocked(String),

    #[error("action '{0}' is not selectable for this role and stage")]
    ActionNotSelectable(String),

    #[error("draft index {index} out of range ({len} drafts)")]
    DraftIndexOutOfRange { index: usize, len: usize },

    #[error("draft {index} is invalid: {source}")]
    Validation {
        index: usize,
        #[source]
        source: ValidationError,
    },

    #[error("duplicate action type code in catalog: {0}")]
    DuplicateActionType(String),

    #[error("invalid stage: {0}")]
    InvalidStage(String),

    #[error("invalid role: {0}")]
    InvalidRole(String),

    #[error("invalid priority: {0}")]
    InvalidPriority(String),

    #[error("invalid entity type: {0}")]
    InvalidEntityType(String),

    #[error("invalid action status: {0}")]
    InvalidStatus(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    pub fn store(operation: impl Into<String>, message: impl Into<String>) -> Self {
        PipelineError::Store {
            operation: operation.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
