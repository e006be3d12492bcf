//! Error types shared by the sync engine and the mutation operations.

use std::fmt;

use thiserror::Error;

/// Result type for notesync operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The kind of resource an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Note,
    Book,
    User,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Note => write!(f, "note"),
            ResourceKind::Book => write!(f, "book"),
            ResourceKind::User => write!(f, "user"),
        }
    }
}

/// Errors that can occur in the sync engine.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or out-of-range input. Raised before persistence is touched.
    #[error("invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    /// The resource exists but belongs to another user.
    #[error("{kind} {uuid} is not owned by the acting user")]
    Ownership { kind: ResourceKind, uuid: String },

    /// The referenced resource does not exist for the user.
    #[error("{kind} not found: {uuid}")]
    NotFound { kind: ResourceKind, uuid: String },

    /// A live book with the same label already exists.
    #[error("duplicate book exists: {0}")]
    Conflict(String),

    /// The storage layer failed. The enclosing transaction is rolled back.
    #[error("database error: {0}")]
    Persistence(#[from] sqlx::Error),
}

impl Error {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn not_found(kind: ResourceKind, uuid: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            uuid: uuid.into(),
        }
    }

    pub fn ownership(kind: ResourceKind, uuid: impl Into<String>) -> Self {
        Self::Ownership {
            kind,
            uuid: uuid.into(),
        }
    }

    /// Short machine-readable code used in API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Validation { .. } => "validation_error",
            Error::Ownership { .. } | Error::NotFound { .. } => "not_found",
            Error::Conflict(_) => "conflict",
            Error::Persistence(_) => "internal_error",
        }
    }
}
