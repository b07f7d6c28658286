use thiserror::Error;

/// Fatal conditions of one final folder. Every variant carries the folder
/// the condition was found in, so the diagnostics log can point at it.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ReactionError {
    #[error("Wrong reaction folder '{folder}': {message}")]
    ParseError { folder: String, message: String },
    #[error("{message} (folder: '{folder}')")]
    MatchInconsistency { folder: String, message: String },
    #[error("reaction energy failed for files in '{folder}': {message}")]
    EnergyComputationError { folder: String, message: String },
    #[error("{message} \n  Folder: {folder}")]
    EnergyBoundsViolation { folder: String, message: String },
}

impl ReactionError {
    pub fn folder(&self) -> &str {
        match self {
            ReactionError::ParseError { folder, .. }
            | ReactionError::MatchInconsistency { folder, .. }
            | ReactionError::EnergyComputationError { folder, .. }
            | ReactionError::EnergyBoundsViolation { folder, .. } => folder,
        }
    }

    pub(crate) fn parse(folder: &str, message: impl Into<String>) -> Self {
        ReactionError::ParseError {
            folder: folder.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn mismatch(folder: &str, message: impl Into<String>) -> Self {
        ReactionError::MatchInconsistency {
            folder: folder.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn computation(folder: &str, message: impl Into<String>) -> Self {
        ReactionError::EnergyComputationError {
            folder: folder.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn bounds(folder: &str, message: impl Into<String>) -> Self {
        ReactionError::EnergyBoundsViolation {
            folder: folder.to_string(),
            message: message.into(),
        }
    }
}
