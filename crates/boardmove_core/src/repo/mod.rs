//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Expose the store surface the move pipelines consume: fetch by id,
//!   ordered key projections, partial updates and the list cascade.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Ordered reads are deterministic: `sort_order ASC, <uuid> ASC`.
//! - Repository APIs return semantic errors (`*NotFound`) in addition to DB
//!   transport errors.

use crate::db::DbError;
use crate::model::board::{BoardId, CardId, ListId};
use crate::model::comment::CommentValidationError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod board_repo;
pub mod comment_repo;
mod sql;

pub type RepoResult<T> = Result<T, RepoError>;

/// Errors from board store operations.
#[derive(Debug)]
pub enum RepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    BoardNotFound(BoardId),
    ListNotFound(ListId),
    CardNotFound(CardId),
    /// Write model rejected before reaching SQL.
    Validation(CommentValidationError),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::BoardNotFound(id) => write!(f, "board not found: {id}"),
            Self::ListNotFound(id) => write!(f, "list not found: {id}"),
            Self::CardNotFound(id) => write!(f, "card not found: {id}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "board repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "board repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "board repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid board data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<CommentValidationError> for RepoError {
    fn from(value: CommentValidationError) -> Self {
        Self::Validation(value)
    }
}
