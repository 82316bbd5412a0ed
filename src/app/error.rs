use thiserror::Error;

use crate::domain::feed::UnknownSortMode;
use crate::domain::vote::InvalidVoteValue;

const FOREIGN_KEY_VIOLATION: &str = "23503";
const UNIQUE_VIOLATION: &str = "23505";

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Unauthorized,
    Storage,
    Internal,
}

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Bad input from the caller. Never worth retrying.
    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("unauthorized")]
    Unauthorized,

    /// The store failed. May be transient.
    #[error("storage failure: {0}")]
    Storage(#[from] sqlx::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(entity: impl Into<String>) -> Self {
        Self::NotFound(entity.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::Unauthorized => ErrorKind::Unauthorized,
            Self::Storage(_) => ErrorKind::Storage,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }
}

impl From<InvalidVoteValue> for ServiceError {
    fn from(err: InvalidVoteValue) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<UnknownSortMode> for ServiceError {
    fn from(err: UnknownSortMode) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Name of the foreign key constraint `err` violated, if that is what it is.
fn foreign_key_violation(err: &sqlx::Error) -> Option<&str> {
    violated_constraint(err, FOREIGN_KEY_VIOLATION)
}

/// Maps a foreign key violation on one of the `(column, entity)` references
/// to `NotFound(entity)`. Any other failure stays a storage error.
pub(crate) fn missing_reference(err: sqlx::Error, references: &[(&str, &str)]) -> ServiceError {
    let entity = foreign_key_violation(&err)
        .and_then(|constraint| referenced_entity(constraint, references));
    match entity {
        Some(entity) => ServiceError::not_found(entity),
        None => ServiceError::Storage(err),
    }
}

fn referenced_entity<'a>(constraint: &str, references: &[(&str, &'a str)]) -> Option<&'a str> {
    references
        .iter()
        .find(|(column, _)| constraint.contains(*column))
        .map(|(_, entity)| *entity)
}

/// Name of the unique constraint `err` violated, if that is what it is.
pub(crate) fn unique_violation(err: &sqlx::Error) -> Option<&str> {
    violated_constraint(err, UNIQUE_VIOLATION)
}

fn violated_constraint<'a>(err: &'a sqlx::Error, code: &str) -> Option<&'a str> {
    let db_err = err.as_database_error()?;
    if db_err.code().as_deref() != Some(code) {
        return None;
    }
    Some(db_err.constraint().unwrap_or_default())
}
