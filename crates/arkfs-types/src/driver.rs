//! The driver seam — how the filesystem asks a codec to mint new entries.

use bitflags::bitflags;
use thiserror::Error;

use crate::entry::{ArchiveEntry, EntryKind};

bitflags! {
    /// Options for linking a new entry into an archive filesystem.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct MknodOptions: u8 {
        /// Create and link any missing parent directories.
        const CREATE_PARENTS = 1 << 0;
        /// Fail if an entry already exists at the target path.
        const EXCLUSIVE = 1 << 1;
    }
}

/// The driver rejected an entry name, typically because it cannot be
/// represented in the archive's character encoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid entry name: {name}")]
pub struct NameError {
    pub name: String,
}

impl NameError {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// An archive format codec, reduced to the operations the filesystem needs.
///
/// The codec methods proper (reading and writing entry payloads) live with
/// the driver implementations and are of no concern here.
pub trait ArchiveDriver<E: ArchiveEntry> {
    /// Mint a new, unlinked archive entry.
    ///
    /// If `template` is given, the entry inherits as many of its properties
    /// as the format can represent, with the exception of name and kind.
    fn new_entry(
        &self,
        name: &str,
        kind: EntryKind,
        options: MknodOptions,
        template: Option<&E>,
    ) -> Result<E, NameError>;

    /// Check that `name` is representable in the archive's encoding without
    /// minting an entry.
    fn assert_encodable(&self, name: &str) -> Result<(), NameError>;
}
