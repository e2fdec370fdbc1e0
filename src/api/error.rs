//! Error taxonomy for table service operations

use std::fmt;

/// Failure classes surfaced by the client.
///
/// Validation failures are raised before any network activity. Protocol and
/// batch faults carry whatever the service returned, unmodified; retry and
/// backoff are the transport's concern, not handled here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    /// A required argument was empty or malformed; nothing was sent.
    Validation(String),
    /// The response status was outside the expected set for the operation.
    Protocol { status: u16, message: String },
    /// A changeset part failed; the whole batch committed nothing.
    BatchFault {
        index: usize,
        status: u16,
        message: String,
    },
}

impl TableError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// HTTP status associated with the failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            TableError::Validation(_) => None,
            TableError::Protocol { status, .. } => Some(*status),
            TableError::BatchFault { status, .. } => Some(*status),
        }
    }
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableError::Validation(message) => write!(f, "validation failed: {}", message),
            TableError::Protocol { status, message } => {
                write!(f, "service returned HTTP {}: {}", status, message)
            }
            TableError::BatchFault {
                index,
                status,
                message,
            } => write!(
                f,
                "batch operation {} failed with HTTP {}: {} (changeset not committed)",
                index, status, message
            ),
        }
    }
}

impl std::error::Error for TableError {}
