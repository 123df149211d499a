use thiserror::Error;

/// Errors that can occur during data-access operations.
///
/// Every store failure is translated into one of these kinds so callers can
/// branch on "absent" versus "broken" without looking at SDK types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("Connection failed: {message}")]
    Connection {
        message: String,
        cause: Option<String>,
    },
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Record not found")]
    RecordNotFound,
    #[error("No records found")]
    NoRecordsFound,
    #[error("Transport error: {message}")]
    Transport {
        message: String,
        cause: Option<String>,
    },
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl SourceError {
    /// Connection failure with the underlying cause attached.
    pub fn connection(message: impl Into<String>, cause: impl ToString) -> Self {
        Self::Connection {
            message: message.into(),
            cause: Some(cause.to_string()),
        }
    }

    /// Transport failure without an underlying cause (e.g. a rejected response).
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            cause: None,
        }
    }

    /// Transport failure with the underlying cause attached.
    pub fn transport_with_cause(message: impl Into<String>, cause: impl ToString) -> Self {
        Self::Transport {
            message: message.into(),
            cause: Some(cause.to_string()),
        }
    }

    /// Returns true for both the single-item and the collection not-found kinds.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::RecordNotFound | Self::NoRecordsFound)
    }

    /// The original cause, when one was preserved.
    pub fn cause(&self) -> Option<&str> {
        match self {
            Self::Connection { cause, .. } | Self::Transport { cause, .. } => cause.as_deref(),
            _ => None,
        }
    }
}

/// Result type for data-access operations.
pub type Result<T> = std::result::Result<T, SourceError>;
