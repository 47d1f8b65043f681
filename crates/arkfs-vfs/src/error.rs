//! Error surface of the archive filesystem.

use arkfs_types::NameError;
use thiserror::Error;

/// Result type for archive filesystem operations.
pub type FsResult<T> = Result<T, FsError>;

/// Archive filesystem operation errors.
///
/// Variants carry the offending entry name where one exists. Every check
/// runs before mutation, so a returned error means the filesystem is
/// unchanged.
#[derive(Debug, Error)]
pub enum FsError {
    #[error("entry not found: {0}")]
    NotFound(String),
    #[error("entry exists already: {0}")]
    AlreadyExists(String),
    #[error("only files can get replaced: {0}")]
    NotReplaceable(String),
    #[error("entry exists as a different kind: {0}")]
    TypeMismatch(String),
    #[error("only file and directory entries are supported: {0}")]
    UnsupportedType(String),
    #[error("parent entry is not a directory: {0}")]
    NotADirectory(String),
    #[error("missing parent directory entry: {0}")]
    MissingParent(String),
    #[error("directory not empty: {name} contains {members} member(s)")]
    DirectoryNotEmpty { name: String, members: usize },
    #[error(transparent)]
    InvalidName(#[from] NameError),
    #[error("read-only file system: {0}")]
    ReadOnly(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("the touch listener has already been set")]
    ListenerAlreadySet,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_the_offending_name() {
        assert_eq!(FsError::NotFound("a/b".into()).to_string(), "entry not found: a/b");
        assert_eq!(
            FsError::DirectoryNotEmpty { name: "a".into(), members: 2 }.to_string(),
            "directory not empty: a contains 2 member(s)"
        );
    }

    #[test]
    fn invalid_name_converts_from_the_driver_error() {
        let err: FsError = NameError::new("x").into();
        assert!(matches!(err, FsError::InvalidName(_)));
    }

    #[test]
    fn io_errors_convert_for_touch_vetoes() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "veto");
        let err: FsError = io.into();
        assert!(matches!(err, FsError::Io(_)));
    }
}
