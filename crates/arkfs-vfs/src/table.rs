//! The master entry table: an insertion-ordered mapping from canonical path
//! to covariant entry.

use arkfs_types::{ArchiveEntry, CovariantEntry};
use indexmap::IndexMap;

/// Insertion-ordered mapping of canonical paths to covariant entries.
///
/// Iteration yields entries in the order their paths were first added, which
/// keeps archive output reproducible.
#[derive(Debug)]
pub struct EntryTable<E> {
    map: IndexMap<String, CovariantEntry<E>>,
}

/// Iterator over the table's covariant entries in insertion order.
pub type Entries<'a, E> = indexmap::map::Values<'a, String, CovariantEntry<E>>;

impl<E> EntryTable<E> {
    /// Create an empty table with room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self { map: IndexMap::with_capacity(capacity) }
    }

    /// Number of covariant entries in the table.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns true if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// The covariant entry at `path`, if any.
    pub fn get(&self, path: &str) -> Option<&CovariantEntry<E>> {
        self.map.get(path)
    }

    /// Mutable access to the covariant entry at `path`.
    pub fn get_mut(&mut self, path: &str) -> Option<&mut CovariantEntry<E>> {
        self.map.get_mut(path)
    }

    /// Remove and return the covariant entry at `path`.
    ///
    /// Removal preserves the insertion order of the remaining entries.
    pub fn remove(&mut self, path: &str) -> Option<CovariantEntry<E>> {
        self.map.shift_remove(path)
    }

    /// Iterate over the covariant entries in insertion order.
    pub fn iter(&self) -> Entries<'_, E> {
        self.map.values()
    }
}

impl<E: ArchiveEntry> EntryTable<E> {
    /// Store `entry` under `path`, finding or creating the covariant wrapper
    /// at that path. Returns the wrapper.
    pub fn add(&mut self, path: &str, entry: E) -> &mut CovariantEntry<E> {
        let ce = self
            .map
            .entry(path.to_owned())
            .or_insert_with(|| CovariantEntry::new(path));
        ce.put_entry(entry);
        ce
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestEntry;
    use arkfs_types::EntryKind;

    #[test]
    fn add_finds_or_creates_the_wrapper() {
        let mut table: EntryTable<TestEntry> = EntryTable::with_capacity(4);
        table.add("foo", TestEntry::new("foo", EntryKind::File));
        table.add("foo", TestEntry::new("foo", EntryKind::Directory));

        assert_eq!(table.len(), 1);
        let ce = table.get("foo").unwrap();
        assert!(ce.is_kind(EntryKind::File));
        assert!(ce.is_kind(EntryKind::Directory));
    }

    #[test]
    fn iteration_follows_insertion_order() {
        let mut table: EntryTable<TestEntry> = EntryTable::with_capacity(4);
        for name in ["z", "a", "m"] {
            table.add(name, TestEntry::new(name, EntryKind::File));
        }
        let order: Vec<&str> = table.iter().map(|ce| ce.path()).collect();
        assert_eq!(order, ["z", "a", "m"]);
    }

    #[test]
    fn remove_keeps_the_order_of_the_rest() {
        let mut table: EntryTable<TestEntry> = EntryTable::with_capacity(4);
        for name in ["z", "a", "m"] {
            table.add(name, TestEntry::new(name, EntryKind::File));
        }
        assert!(table.remove("a").is_some());
        assert!(table.remove("a").is_none());

        let order: Vec<&str> = table.iter().map(|ce| ce.path()).collect();
        assert_eq!(order, ["z", "m"]);
    }
}
