//! Filesystem error types.

use thiserror::Error;

/// Result type for filesystem operations.
pub type VfsResult<T> = Result<T, VfsError>;

/// Filesystem operation errors.
///
/// UI callers discriminate on the variant; the display message is for
/// dialog text only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VfsError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("not a file: {0}")]
    NotAFile(String),
    #[error("not a folder: {0}")]
    NotAFolder(String),
    #[error("already exists: {0}")]
    AlreadyExists(String),
    #[error("name already exists: {0}")]
    NameAlreadyExists(String),
    #[error("invalid name: {0:?}")]
    InvalidName(String),
    #[error("cannot delete the root folder")]
    CannotDeleteRoot,
    #[error("cannot rename the root folder")]
    CannotRenameRoot,
    #[error("destination not found: {0}")]
    DestinationNotFound(String),
    #[error("destination is not a folder: {0}")]
    DestinationNotAFolder(String),
    #[error("destination already exists: {0}")]
    DestinationAlreadyExists(String),
    #[error("cannot move {0} into itself")]
    CannotMoveIntoSelf(String),
}
