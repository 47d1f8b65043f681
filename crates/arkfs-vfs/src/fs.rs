//! The read/write virtual filesystem over archive entries.
//!
//! A filesystem is built either empty or from the flat entry list of an
//! [`EntryContainer`]. Construction runs an integrity pass which synthesizes
//! missing parent directories as *ghosts*: directory entries whose times are
//! all [`UNKNOWN`]. Ghosts keep the tree consistent while preserving the
//! signal that no modification time was ever recorded for them, so commits
//! never stamp them and the driver may elect not to persist them.
//!
//! Mutators notify an optional [`TouchListener`] exactly once per transition
//! from clean to dirty; the listener may veto by returning an error, in
//! which case the filesystem is left unmodified.

use std::time::{SystemTime, UNIX_EPOCH};

use arkfs_types::{
    Access, ArchiveDriver, ArchiveEntry, CovariantEntry, EntryContainer, EntryKind, MknodOptions,
    SizeKind, UNKNOWN,
};

use crate::error::{FsError, FsResult};
use crate::paths;
pub use crate::paths::ROOT_PATH;
use crate::table::{Entries, EntryTable};

// Extra table capacity for parent directories missing from the container.
const TABLE_OVERHEAD: usize = 16;

/// Observer of the filesystem's clean → dirty transition.
pub trait TouchListener {
    /// Called immediately before the filesystem is going to get modified
    /// (touched) for the first time. Returning an error vetoes the
    /// modification.
    fn pre_touch(&self) -> std::io::Result<()>;
}

/// Template for a new entry's properties.
///
/// A covariant template is unwrapped to its variant of the requested kind.
#[derive(Debug, Clone, Copy)]
pub enum Template<'a, E> {
    Entry(&'a E),
    Covariant(&'a CovariantEntry<E>),
}

/// A read/write virtual filesystem view over the entries of one archive.
///
/// Not internally thread-safe: the owning controller serializes access.
pub struct ArchiveFileSystem<E, D> {
    driver: D,
    table: EntryTable<E>,
    /// Whether this filesystem has been modified since construction.
    touched: bool,
    touch_listener: Option<Box<dyn TouchListener>>,
    read_only: bool,
}

impl<E, D> std::fmt::Debug for ArchiveFileSystem<E, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveFileSystem")
            .field("entries", &self.table.len())
            .field("touched", &self.touched)
            .field("read_only", &self.read_only)
            .finish_non_exhaustive()
    }
}

impl<E, D> ArchiveFileSystem<E, D>
where
    E: ArchiveEntry + Clone,
    D: ArchiveDriver<E>,
{
    /// Create a new empty filesystem.
    ///
    /// Only the root directory exists, with every access time set to the
    /// current time. The filesystem is writable and already marked touched.
    pub fn new_empty(driver: D) -> Self {
        let mut root = Self::new_entry_unchecked(
            &driver,
            ROOT_PATH,
            EntryKind::Directory,
            MknodOptions::empty(),
            None,
        );
        let now = current_time_millis();
        for access in Access::ALL {
            root.set_time(access, now);
        }
        let mut table = EntryTable::with_capacity(TABLE_OVERHEAD);
        table.add(ROOT_PATH, root);
        Self { driver, table, touched: true, touch_listener: None, read_only: false }
    }

    /// Create a filesystem populated from the given container.
    ///
    /// Entry names are canonicalized on the way in (backslashes rewritten,
    /// `.`/`..` resolved, trailing separators cut). The root entry is then
    /// rebuilt from `root_template`, replacing whatever the container may
    /// have carried at the root path, and finally the integrity pass links
    /// every entry to its parent chain, synthesizing ghost directories
    /// where parents are missing.
    ///
    /// Absolute entry names and names escaping the root via `..` are stored
    /// but left out of the integrity pass.
    ///
    /// If `read_only` is set, every subsequent mutator fails with
    /// [`FsError::ReadOnly`].
    pub fn new_populated<C>(
        driver: D,
        container: &C,
        root_template: Option<&E>,
        read_only: bool,
    ) -> FsResult<Self>
    where
        C: EntryContainer<E>,
    {
        let mut table = EntryTable::with_capacity(container.len() + TABLE_OVERHEAD);
        let mut queue = Vec::with_capacity(container.len());
        for entry in container.iter() {
            let path = paths::canonicalize(entry.name());
            table.add(&path, entry.clone());
            if Self::fixable(&path) {
                queue.push(path);
            } else if !paths::is_root(&path) {
                tracing::warn!("leaving foreign entry name unfixed: {:?}", path);
            }
        }
        // The root entry never comes from the container.
        let root = Self::new_entry_unchecked(
            &driver,
            ROOT_PATH,
            EntryKind::Directory,
            MknodOptions::empty(),
            root_template,
        );
        table.add(ROOT_PATH, root);
        tracing::debug!(
            "populated {} entries, {} queued for integrity fix",
            table.len(),
            queue.len()
        );
        let mut fs = Self { driver, table, touched: false, touch_listener: None, read_only };
        for path in queue {
            fs.fix(&path)?;
        }
        Ok(fs)
    }

    // A path takes part in the integrity pass unless it is the root,
    // absolute, or escapes the root through a leading `..`.
    fn fixable(path: &str) -> bool {
        !(paths::is_root(path) || path.starts_with('/') || path == ".." || path.starts_with("../"))
    }

    /// Ensure every parent directory of `path` exists, is a directory, and
    /// contains the respective base name.
    ///
    /// Missing or non-directory parents are replaced by ghost directories:
    /// fresh directory entries with every time set to [`UNKNOWN`].
    fn fix(&mut self, path: &str) -> FsResult<()> {
        // Recursion re-enters with the parent path, which may be the root.
        if paths::is_root(path) {
            return Ok(());
        }
        let (parent_path, base) = paths::split(path);
        let needs_ghost = match self.table.get(parent_path) {
            Some(parent) => !parent.is_kind(EntryKind::Directory),
            None => true,
        };
        if needs_ghost {
            tracing::debug!("synthesizing ghost directory: {:?}", parent_path);
            let mut ghost = self.new_checked_entry(
                parent_path,
                EntryKind::Directory,
                MknodOptions::empty(),
                None,
            )?;
            for access in Access::ALL {
                ghost.set_time(access, UNKNOWN);
            }
            self.table.add(parent_path, ghost);
        }
        self.table
            .get_mut(parent_path)
            .expect("parent directory is missing - archive file system is corrupted")
            .add_member(base);
        self.fix(parent_path)
    }

    /// Returns true if this filesystem rejects all mutations.
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Returns true if the named entry could be written.
    pub fn is_writable(&self, _name: &str) -> bool {
        !self.is_read_only()
    }

    /// Request that the named entry become read-only.
    ///
    /// Archive entries cannot carry a per-entry read-only attribute, so
    /// this succeeds only if the whole filesystem is already read-only.
    pub fn set_read_only(&mut self, name: &str) -> FsResult<()> {
        if self.is_read_only() {
            Ok(())
        } else {
            Err(FsError::ReadOnly(name.to_owned()))
        }
    }

    /// Returns true if this filesystem has been modified since construction.
    pub fn is_touched(&self) -> bool {
        self.touched
    }

    /// Number of entries in this filesystem, the root included.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns true if not even the root entry exists. Never true for a
    /// filesystem built by one of the constructors.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Iterate over all covariant entries in insertion order.
    ///
    /// Mutating the filesystem while iterating is prevented by the borrow.
    pub fn iter(&self) -> Entries<'_, E> {
        self.table.iter()
    }

    /// A defensive copy of the covariant entry stored under the canonical
    /// form of `name`, or `None`.
    ///
    /// Mutating the returned value does not show any effect on this
    /// filesystem.
    pub fn entry(&self, name: &str) -> Option<CovariantEntry<E>> {
        self.table.get(&paths::canonicalize(name)).cloned()
    }

    /// Set the filesystem touch listener.
    ///
    /// Passing `None` clears the listener. Setting a listener while one is
    /// already installed fails with [`FsError::ListenerAlreadySet`].
    pub fn set_touch_listener(
        &mut self,
        listener: Option<Box<dyn TouchListener>>,
    ) -> FsResult<()> {
        if listener.is_some() && self.touch_listener.is_some() {
            return Err(FsError::ListenerAlreadySet);
        }
        self.touch_listener = listener;
        Ok(())
    }

    /// Mark this filesystem as touched, notifying the listener if and only
    /// if the touch status is actually changing.
    ///
    /// A listener error vetoes the transition and leaves the filesystem
    /// unmodified.
    fn touch(&mut self) -> FsResult<()> {
        if self.read_only {
            return Err(FsError::ReadOnly(ROOT_PATH.to_owned()));
        }
        if self.touched {
            return Ok(());
        }
        if let Some(listener) = &self.touch_listener {
            listener.pre_touch()?;
        }
        self.touched = true;
        Ok(())
    }

    /// Begin a transaction to create (or replace) the entry chain for
    /// `name` and finally link it into this filesystem.
    ///
    /// Nothing is mutated until [`Mknod::commit`] is called on the returned
    /// operation; dropping it abandons the transaction. The operation
    /// borrows the filesystem exclusively, so the validated state cannot
    /// change before the commit.
    ///
    /// With [`MknodOptions::CREATE_PARENTS`], missing parent directories
    /// are staged along with the entry itself; otherwise a missing parent
    /// fails with [`FsError::MissingParent`]. Only files may be replaced,
    /// and only by files; [`MknodOptions::EXCLUSIVE`] forbids even that.
    pub fn mknod<'t>(
        &mut self,
        name: &str,
        kind: EntryKind,
        options: MknodOptions,
        template: Option<Template<'t, E>>,
    ) -> FsResult<Mknod<'_, E, D>> {
        if self.read_only {
            return Err(FsError::ReadOnly(name.to_owned()));
        }
        if kind != EntryKind::File && kind != EntryKind::Directory {
            return Err(FsError::UnsupportedType(name.to_owned()));
        }
        let path = paths::canonicalize(name);
        if let Some(old) = self.table.get(&path) {
            if !old.is_kind(EntryKind::File) {
                return Err(FsError::NotReplaceable(path));
            }
            if kind != EntryKind::File {
                return Err(FsError::TypeMismatch(path));
            }
            if options.contains(MknodOptions::EXCLUSIVE) {
                return Err(FsError::AlreadyExists(path));
            }
        }
        let template = match template {
            Some(Template::Covariant(ce)) => ce.get(kind),
            Some(Template::Entry(entry)) => Some(entry),
            None => None,
        };
        let create_parents = options.contains(MknodOptions::CREATE_PARENTS);
        let options = options & !MknodOptions::CREATE_PARENTS;
        let (head, links) = self.new_segment_links(&path, kind, options, create_parents, template)?;
        Ok(Mknod { fs: self, head, links })
    }

    /// Stage the segment chain for `path`, depth-first.
    ///
    /// Returns the path of the existing directory anchoring the chain and
    /// the staged segments, outermost parent first.
    fn new_segment_links(
        &self,
        path: &str,
        kind: EntryKind,
        options: MknodOptions,
        create_parents: bool,
        template: Option<&E>,
    ) -> FsResult<(String, Vec<Segment<E>>)> {
        let (parent_path, base) = paths::split(path);
        if let Some(parent) = self.table.get(parent_path) {
            if !parent.is_kind(EntryKind::Directory) {
                return Err(FsError::NotADirectory(path.to_owned()));
            }
            let entry = self.new_checked_entry(path, kind, options, template)?;
            Ok((parent_path.to_owned(), vec![Segment::new(path, base, entry)]))
        } else if create_parents {
            let (head, mut links) =
                self.new_segment_links(parent_path, EntryKind::Directory, options, true, None)?;
            let entry = self.new_checked_entry(path, kind, options, template)?;
            links.push(Segment::new(path, base, entry));
            Ok((head, links))
        } else {
            Err(FsError::MissingParent(path.to_owned()))
        }
    }

    /// Test the named entry and, unless it is the root, notify the listener
    /// and delete it.
    ///
    /// Directory entries must be empty. For the root, the tests run but the
    /// entry is neither deleted nor the listener notified.
    pub fn unlink(&mut self, name: &str) -> FsResult<()> {
        if self.read_only {
            return Err(FsError::ReadOnly(name.to_owned()));
        }
        // Test.
        let path = paths::canonicalize(name);
        let ce = self
            .table
            .get(&path)
            .ok_or_else(|| FsError::NotFound(path.clone()))?;
        if ce.is_kind(EntryKind::Directory) {
            let members = ce.members().len();
            if members != 0 {
                return Err(FsError::DirectoryNotEmpty { name: path, members });
            }
        }
        if paths::is_root(&path) {
            return Ok(());
        }

        // Notify listener and modify.
        self.touch()?;
        let mut removed = self
            .table
            .remove(&path)
            .expect("entry vanished between lookup and removal");
        // Signal to the driver that the entry should not be included in the
        // archive's central directory even if it is physically present in
        // the old archive file. Drivers for formats without a central
        // directory ignore this.
        if let Some(ae) = removed.entry_mut() {
            for kind in SizeKind::ALL {
                ae.set_size(kind, UNKNOWN);
            }
            for access in Access::ALL {
                ae.set_time(access, UNKNOWN);
            }
        }
        let (parent_path, base) = paths::split(&path);
        let parent = self
            .table
            .get_mut(parent_path)
            .expect("parent directory is missing - archive file system is corrupted");
        let removed_member = parent.remove_member(base);
        debug_assert!(
            removed_member,
            "parent directory does not contain this entry - archive file system is corrupted"
        );
        if let Some(dir) = parent.get_mut(EntryKind::Directory) {
            // never touch ghosts
            if dir.time(Access::Write) != UNKNOWN {
                dir.set_time(Access::Write, current_time_millis());
            }
        }
        Ok(())
    }

    /// Set the time of the given access kinds on the named entry to
    /// `value` (milliseconds since the epoch).
    ///
    /// Returns true only if the entry supported every requested kind.
    pub fn set_time(&mut self, name: &str, kinds: &[Access], value: i64) -> FsResult<bool> {
        if self.read_only {
            return Err(FsError::ReadOnly(name.to_owned()));
        }
        if value < 0 {
            return Err(FsError::InvalidArgument(format!("{name} (negative access time)")));
        }
        let path = paths::canonicalize(name);
        if self.table.get(&path).is_none() {
            return Err(FsError::NotFound(path));
        }
        // Order is important here!
        self.touch()?;
        let ae = self
            .table
            .get_mut(&path)
            .and_then(CovariantEntry::entry_mut)
            .expect("entry vanished during touch - archive file system is corrupted");
        let mut ok = true;
        for &kind in kinds {
            ok &= ae.set_time(kind, value);
        }
        Ok(ok)
    }

    /// Set per-kind times on the named entry.
    ///
    /// Each pair is applied only if its value is non-negative; a negative
    /// value counts as a partial failure. Returns true only if every pair
    /// was applied successfully.
    pub fn set_times(&mut self, name: &str, times: &[(Access, i64)]) -> FsResult<bool> {
        if self.read_only {
            return Err(FsError::ReadOnly(name.to_owned()));
        }
        let path = paths::canonicalize(name);
        if self.table.get(&path).is_none() {
            return Err(FsError::NotFound(path));
        }
        // Order is important here!
        self.touch()?;
        let ae = self
            .table
            .get_mut(&path)
            .and_then(CovariantEntry::entry_mut)
            .expect("entry vanished during touch - archive file system is corrupted");
        let mut ok = true;
        for &(kind, value) in times {
            ok &= value >= 0 && ae.set_time(kind, value);
        }
        Ok(ok)
    }

    /// Mint a new entry for a filesystem-generated name.
    ///
    /// Such names are canonical by construction, so a driver rejecting one
    /// is an unrecoverable programmer error.
    fn new_entry_unchecked(
        driver: &D,
        name: &str,
        kind: EntryKind,
        options: MknodOptions,
        template: Option<&E>,
    ) -> E {
        match driver.new_entry(name, kind, options, template) {
            Ok(entry) => entry,
            Err(err) => panic!("driver rejected a filesystem-generated name: {err}"),
        }
    }

    /// Mint a new entry, surfacing name-encoding failures as
    /// [`FsError::InvalidName`].
    fn new_checked_entry(
        &self,
        name: &str,
        kind: EntryKind,
        options: MknodOptions,
        template: Option<&E>,
    ) -> FsResult<E> {
        self.driver.assert_encodable(name)?;
        Ok(self.driver.new_entry(name, kind, options, template)?)
    }
}

impl<'a, E, D> IntoIterator for &'a ArchiveFileSystem<E, D>
where
    E: ArchiveEntry + Clone,
    D: ArchiveDriver<E>,
{
    type Item = &'a CovariantEntry<E>;
    type IntoIter = Entries<'a, E>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// One staged link of a [`Mknod`] chain.
#[derive(Debug)]
struct Segment<E> {
    path: String,
    base: String,
    entry: E,
}

impl<E> Segment<E> {
    fn new(path: &str, base: &str, entry: E) -> Self {
        Self { path: path.to_owned(), base: base.to_owned(), entry }
    }
}

/// A staged transaction to link a chain of one or more entries into an
/// archive filesystem.
///
/// While this value exists it exclusively borrows its filesystem, so the
/// validated state cannot be altered before [`Mknod::commit`].
pub struct Mknod<'a, E, D> {
    fs: &'a mut ArchiveFileSystem<E, D>,
    /// Path of the existing directory anchoring the staged chain.
    head: String,
    /// Staged entries, outermost parent first. Never empty.
    links: Vec<Segment<E>>,
}

impl<E: std::fmt::Debug, D> std::fmt::Debug for Mknod<'_, E, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mknod")
            .field("head", &self.head)
            .field("links", &self.links)
            .finish()
    }
}

impl<E, D> Mknod<'_, E, D>
where
    E: ArchiveEntry + Clone,
    D: ArchiveDriver<E>,
{
    /// The staged entry at the end of the chain.
    pub fn target(&self) -> &E {
        &self.links.last().expect("mknod stages at least one segment").entry
    }

    /// The canonical path of the staged entry at the end of the chain.
    pub fn target_path(&self) -> &str {
        &self.links.last().expect("mknod stages at least one segment").path
    }

    /// Commit the transaction: mark the filesystem as touched and link the
    /// staged chain into the entry table.
    ///
    /// Every staged entry whose write time is still [`UNKNOWN`] is stamped
    /// with the commit time, captured lazily and at most once. Parents of
    /// genuinely new members get the same stamp, except for ghost
    /// directories, which are never touched.
    pub fn commit(self) -> FsResult<()> {
        let Mknod { fs, head, links } = self;
        fs.touch()?;
        let mut time = UNKNOWN;
        let mut parent_path = head;
        for link in links {
            let Segment { path, base, entry } = link;
            let kind = entry.kind();
            let parent = fs
                .table
                .get_mut(&parent_path)
                .expect("parent directory is missing - archive file system is corrupted");
            if parent.add_member(&base) {
                if let Some(dir) = parent.get_mut(EntryKind::Directory) {
                    // never touch ghosts
                    if dir.time(Access::Write) != UNKNOWN {
                        let now = lazy_now(&mut time);
                        dir.set_time(Access::Write, now);
                    }
                }
            }
            let ce = fs.table.add(&path, entry);
            // Staged entries are freshly minted, never ghosts; entries that
            // inherited a concrete time from a template keep it.
            if let Some(ae) = ce.get_mut(kind) {
                if ae.time(Access::Write) == UNKNOWN {
                    let now = lazy_now(&mut time);
                    ae.set_time(Access::Write, now);
                }
            }
            parent_path = path;
        }
        Ok(())
    }
}

fn lazy_now(time: &mut i64) -> i64 {
    if *time == UNKNOWN {
        *time = current_time_millis();
    }
    *time
}

pub(crate) fn current_time_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
