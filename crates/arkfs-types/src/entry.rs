//! The archive entry model — kinds, access and size dimensions, sentinels.

/// Sentinel for an unknown time or size.
pub const UNKNOWN: i64 = -1;

/// Kind of archive entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    File,
    Directory,
    /// Anything that is neither a file nor a directory (devices, fifos, ...).
    /// Such entries can be carried through an archive but never created.
    Special,
}

impl EntryKind {
    /// Every entry kind, in declaration order.
    pub const ALL: [EntryKind; 3] = [EntryKind::File, EntryKind::Directory, EntryKind::Special];

    /// Returns true if this is a regular file.
    pub fn is_file(self) -> bool {
        self == EntryKind::File
    }

    /// Returns true if this is a directory.
    pub fn is_directory(self) -> bool {
        self == EntryKind::Directory
    }
}

/// A way an entry can be accessed. Each access kind carries its own time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Access {
    Create,
    Read,
    Write,
}

impl Access {
    /// Every access kind, in declaration order.
    pub const ALL: [Access; 3] = [Access::Create, Access::Read, Access::Write];

    /// Stable index for table-backed entry implementations.
    pub fn index(self) -> usize {
        self as usize
    }
}

/// A size dimension of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SizeKind {
    /// Uncompressed payload size.
    Data,
    /// Size occupied inside the archive.
    Storage,
}

impl SizeKind {
    /// Every size kind, in declaration order.
    pub const ALL: [SizeKind; 2] = [SizeKind::Data, SizeKind::Storage];

    /// Stable index for table-backed entry implementations.
    pub fn index(self) -> usize {
        self as usize
    }
}

/// One record inside an archive container.
///
/// `name` is the canonical archive path: `/`-delimited, no leading separator,
/// no trailing separator. Times are integer milliseconds since the epoch;
/// [`UNKNOWN`] stands for "never recorded". Sizes follow the same convention.
pub trait ArchiveEntry: std::fmt::Debug {
    /// The canonical archive path of this entry.
    fn name(&self) -> &str;

    /// The kind of this entry.
    fn kind(&self) -> EntryKind;

    /// The time of the given access kind, or [`UNKNOWN`].
    fn time(&self, access: Access) -> i64;

    /// Set the time of the given access kind.
    ///
    /// Returns false if this entry does not support the given access kind.
    fn set_time(&mut self, access: Access, value: i64) -> bool;

    /// The size of the given dimension, or [`UNKNOWN`].
    fn size(&self, kind: SizeKind) -> i64;

    /// Set the size of the given dimension.
    ///
    /// Returns false if this entry does not support the given size kind.
    fn set_size(&mut self, kind: SizeKind, value: i64) -> bool;
}
