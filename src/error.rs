//! Gateway error type.
//!
//! CHANGELOG:
//! - 10/12/2026 - Initial implementation

use std::fmt;
use thiserror::Error;

use crate::store::StoreError;

/// Kind of record a lookup was looking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Contact,
    Chat,
    GroupMetadata,
    CurrentUser,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Contact => write!(f, "Contact"),
            RecordKind::Chat => write!(f, "Chat"),
            RecordKind::GroupMetadata => write!(f, "Group metadata"),
            RecordKind::CurrentUser => write!(f, "Current user"),
        }
    }
}

/// Errors surfaced to gateway callers. Nothing here is retried.
#[derive(Error, Debug)]
pub enum Error {
    #[error("{kind} not found: {id}")]
    NotFound { kind: RecordKind, id: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl Error {
    pub(crate) fn not_found(kind: RecordKind, id: &str) -> Self {
        Error::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = Error::not_found(RecordKind::GroupMetadata, "g1@g.us");
        assert_eq!(err.to_string(), "Group metadata not found: g1@g.us");
    }
}
