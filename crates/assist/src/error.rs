//! Error taxonomy for the pipeline.
//!
//! Data-quality advisories are not errors; they travel as `issues` on a
//! successful preview.

use std::fmt;

use gridwise_core::GridError;

/// Failure of a remote collaborator (rate source, holiday calendar, chat).
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteError {
    /// The source answered but has no data for the key
    NotFound(String),
    /// Transport failure or non-success status
    Network(String),
    /// Response body could not be understood
    Malformed(String),
    /// Jurisdiction or feature not served by this collaborator
    Unsupported(String),
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteError::NotFound(msg) => write!(f, "{}", msg),
            RemoteError::Network(msg) => write!(f, "Chyba sítě: {}", msg),
            RemoteError::Malformed(msg) => write!(f, "Neplatná odpověď serveru: {}", msg),
            RemoteError::Unsupported(msg) => write!(f, "Nepodporováno: {}", msg),
        }
    }
}

impl std::error::Error for RemoteError {}

#[derive(Debug, Clone, PartialEq)]
pub enum AssistError {
    /// Missing or invalid selection, column mismatch, empty range. Always blocks.
    Input(String),
    /// Remote collaborator failure, shown verbatim
    Remote(RemoteError),
    /// Unexpected failure; detail is for diagnostics only
    Internal(String),
}

impl AssistError {
    pub fn input(msg: impl Into<String>) -> Self {
        AssistError::Input(msg.into())
    }

    /// Text safe to show the user. Internal detail is replaced by a generic message.
    pub fn user_message(&self) -> String {
        match self {
            AssistError::Input(msg) => msg.clone(),
            AssistError::Remote(e) => e.to_string(),
            AssistError::Internal(_) => {
                "Došlo k interní chybě. Podrobnosti jsou v diagnostickém záznamu.".to_string()
            }
        }
    }
}

impl fmt::Display for AssistError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssistError::Input(msg) => write!(f, "{}", msg),
            AssistError::Remote(e) => write!(f, "{}", e),
            AssistError::Internal(detail) => write!(f, "internal error: {}", detail),
        }
    }
}

impl std::error::Error for AssistError {}

impl From<GridError> for AssistError {
    fn from(e: GridError) -> Self {
        AssistError::Internal(e.to_string())
    }
}

impl From<RemoteError> for AssistError {
    fn from(e: RemoteError) -> Self {
        AssistError::Remote(e)
    }
}

impl From<serde_json::Error> for AssistError {
    fn from(e: serde_json::Error) -> Self {
        AssistError::Internal(format!("json: {}", e))
    }
}

impl From<regex::Error> for AssistError {
    fn from(e: regex::Error) -> Self {
        AssistError::Internal(format!("pattern: {}", e))
    }
}
