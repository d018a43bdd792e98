use thiserror::Error;

use crate::types::PageNumber;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid database header: {reason}")]
    InvalidHeader { reason: String },

    #[error("Invalid page type {tag} on page {page_number}")]
    InvalidPageType { page_number: PageNumber, tag: u8 },

    #[error("Unsupported serial type: {0}")]
    UnsupportedSerialType(u64),

    #[error("Corrupted record: {reason}")]
    CorruptedRecord { reason: String },

    #[error("Corrupted page: page_number={page_number}, reason={reason}")]
    CorruptedPage {
        page_number: PageNumber,
        reason: String,
    },

    #[error("{what} out of bounds: offset {offset}, length {len}")]
    OutOfBounds {
        what: String,
        offset: usize,
        len: usize,
    },

    #[error("Table '{name}' not found")]
    TableNotFound { name: String },

    #[error("Column '{name}' not found in table '{table}'")]
    ColumnNotFound { name: String, table: String },

    #[error("Unsupported query: {details}")]
    UnsupportedQuery { details: String },

    #[error("SQL parsing error: {details}")]
    SqlParseError { details: String },

    #[error("Unknown command {0}")]
    UnknownCommand(String),
}

/// Coarse classification of [`DatabaseError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Format,
    Bounds,
    Io,
    NotFound,
    UnsupportedQuery,
    Parse,
    Command,
}

impl DatabaseError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DatabaseError::Io(_) => ErrorKind::Io,
            DatabaseError::InvalidHeader { .. }
            | DatabaseError::InvalidPageType { .. }
            | DatabaseError::UnsupportedSerialType(_)
            | DatabaseError::CorruptedRecord { .. }
            | DatabaseError::CorruptedPage { .. } => ErrorKind::Format,
            DatabaseError::OutOfBounds { .. } => ErrorKind::Bounds,
            DatabaseError::TableNotFound { .. } | DatabaseError::ColumnNotFound { .. } => {
                ErrorKind::NotFound
            }
            DatabaseError::UnsupportedQuery { .. } => ErrorKind::UnsupportedQuery,
            DatabaseError::SqlParseError { .. } => ErrorKind::Parse,
            DatabaseError::UnknownCommand(_) => ErrorKind::Command,
        }
    }

    pub(crate) fn out_of_bounds(what: impl Into<String>, offset: usize, len: usize) -> Self {
        DatabaseError::OutOfBounds {
            what: what.into(),
            offset,
            len,
        }
    }

    pub(crate) fn unsupported(details: impl Into<String>) -> Self {
        DatabaseError::UnsupportedQuery {
            details: details.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DatabaseError>;
