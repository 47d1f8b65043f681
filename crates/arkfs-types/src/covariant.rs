//! Covariant entries — the per-path bundle of archive entries.
//!
//! An archive may legally contain several entries for one path: a ZIP written
//! by some tools carries both `foo` (a file) and `foo/` (a directory). The
//! filesystem view keeps at most one archive entry per kind under a single
//! canonical path and projects whichever kind the caller asks for.

use indexmap::IndexSet;

use crate::entry::{ArchiveEntry, EntryKind};

/// The archive entries stored at one canonical path, at most one per kind,
/// plus the path's directory membership.
///
/// The member set is only meaningful while a directory entry is present; it
/// records the base names of the directory's children in insertion order.
#[derive(Debug, Clone)]
pub struct CovariantEntry<E> {
    path: String,
    file: Option<E>,
    dir: Option<E>,
    special: Option<E>,
    members: IndexSet<String>,
}

impl<E> CovariantEntry<E> {
    /// Create an empty covariant entry for the given canonical path.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            file: None,
            dir: None,
            special: None,
            members: IndexSet::new(),
        }
    }

    /// The canonical path of this entry.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Store `entry` under the given kind, replacing any previous entry of
    /// that kind.
    pub fn put(&mut self, kind: EntryKind, entry: E) {
        *self.slot_mut(kind) = Some(entry);
    }

    /// The archive entry of the given kind, if present.
    pub fn get(&self, kind: EntryKind) -> Option<&E> {
        self.slot(kind).as_ref()
    }

    /// Mutable access to the archive entry of the given kind.
    pub fn get_mut(&mut self, kind: EntryKind) -> Option<&mut E> {
        self.slot_mut(kind).as_mut()
    }

    /// Returns true if an archive entry of the given kind is present.
    pub fn is_kind(&self, kind: EntryKind) -> bool {
        self.slot(kind).is_some()
    }

    /// Any archive entry present at this path, preferring File, then
    /// Directory, then Special.
    pub fn entry(&self) -> Option<&E> {
        self.file.as_ref().or(self.dir.as_ref()).or(self.special.as_ref())
    }

    /// Mutable counterpart of [`CovariantEntry::entry`].
    pub fn entry_mut(&mut self) -> Option<&mut E> {
        self.file.as_mut().or(self.dir.as_mut()).or(self.special.as_mut())
    }

    /// The base names of this directory's children, in insertion order.
    pub fn members(&self) -> &IndexSet<String> {
        &self.members
    }

    /// Register a child under this directory.
    ///
    /// Returns true if the member set actually grew.
    pub fn add_member(&mut self, name: &str) -> bool {
        if self.members.contains(name) {
            return false;
        }
        self.members.insert(name.to_owned())
    }

    /// Remove a child from this directory.
    ///
    /// Returns true if the member was present. Removal keeps the insertion
    /// order of the remaining members.
    pub fn remove_member(&mut self, name: &str) -> bool {
        self.members.shift_remove(name)
    }

    fn slot(&self, kind: EntryKind) -> &Option<E> {
        match kind {
            EntryKind::File => &self.file,
            EntryKind::Directory => &self.dir,
            EntryKind::Special => &self.special,
        }
    }

    fn slot_mut(&mut self, kind: EntryKind) -> &mut Option<E> {
        match kind {
            EntryKind::File => &mut self.file,
            EntryKind::Directory => &mut self.dir,
            EntryKind::Special => &mut self.special,
        }
    }
}

impl<E: ArchiveEntry> CovariantEntry<E> {
    /// Store `entry` under its own kind.
    pub fn put_entry(&mut self, entry: E) {
        self.put(entry.kind(), entry);
    }
}
