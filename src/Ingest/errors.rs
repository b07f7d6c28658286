use crate::Reactions::errors::ReactionError;
use thiserror::Error;

/// configuration file errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config format error: {0}")]
    Format(#[from] serde_json::Error),
    #[error("Invalid config value: {0}")]
    InvalidValue(String),
}

/// record store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store file error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Store format error: {0}")]
    Format(#[from] serde_json::Error),
    #[error("Record not found: {0}")]
    NotFound(String),
}

/// Everything that stops the ingestion of one folder (or, in strict mode, of the run).
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Reaction(#[from] ReactionError),
    #[error("Writing the record of '{folder}' failed: {source}")]
    Store {
        folder: String,
        #[source]
        source: StoreError,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Wrong folder '{folder}': {message}")]
    Folder { folder: String, message: String },
}

impl IngestError {
    /// folder the error belongs to, if any
    pub fn folder(&self) -> Option<&str> {
        match self {
            IngestError::Reaction(e) => Some(e.folder()),
            IngestError::Store { folder, .. } | IngestError::Folder { folder, .. } => Some(folder),
            IngestError::Config(_) => None,
        }
    }

    pub(crate) fn folder_error(folder: &str, message: impl Into<String>) -> Self {
        IngestError::Folder {
            folder: folder.to_string(),
            message: message.into(),
        }
    }
}
