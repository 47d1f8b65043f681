//! Test doubles for unit tests: a table-backed entry, a permissive driver,
//! a vector-backed container, and a counting touch listener.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use arkfs_types::{
    Access, ArchiveDriver, ArchiveEntry, EntryContainer, EntryKind, MknodOptions, NameError,
    SizeKind, UNKNOWN,
};

use crate::fs::TouchListener;

/// An archive entry holding its times and sizes in plain arrays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestEntry {
    name: String,
    kind: EntryKind,
    times: [i64; 3],
    sizes: [i64; 2],
}

impl TestEntry {
    pub fn new(name: impl Into<String>, kind: EntryKind) -> Self {
        Self {
            name: name.into(),
            kind,
            times: [UNKNOWN; 3],
            sizes: [UNKNOWN; 2],
        }
    }

    pub fn with_time(mut self, access: Access, value: i64) -> Self {
        self.times[access.index()] = value;
        self
    }

    pub fn with_size(mut self, kind: SizeKind, value: i64) -> Self {
        self.sizes[kind.index()] = value;
        self
    }
}

impl ArchiveEntry for TestEntry {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> EntryKind {
        self.kind
    }

    fn time(&self, access: Access) -> i64 {
        self.times[access.index()]
    }

    fn set_time(&mut self, access: Access, value: i64) -> bool {
        self.times[access.index()] = value;
        true
    }

    fn size(&self, kind: SizeKind) -> i64 {
        self.sizes[kind.index()]
    }

    fn set_size(&mut self, kind: SizeKind, value: i64) -> bool {
        self.sizes[kind.index()] = value;
        true
    }
}

/// A driver minting [`TestEntry`] values. Optionally rejects names
/// containing a configured fragment, for exercising the invalid-name path.
#[derive(Debug, Default)]
pub struct TestDriver {
    reject: Option<String>,
}

impl TestDriver {
    /// A driver that rejects any name containing `fragment`.
    pub fn rejecting(fragment: impl Into<String>) -> Self {
        Self { reject: Some(fragment.into()) }
    }
}

impl ArchiveDriver<TestEntry> for TestDriver {
    fn new_entry(
        &self,
        name: &str,
        kind: EntryKind,
        _options: MknodOptions,
        template: Option<&TestEntry>,
    ) -> Result<TestEntry, NameError> {
        self.assert_encodable(name)?;
        let mut entry = TestEntry::new(name, kind);
        if let Some(template) = template {
            for access in Access::ALL {
                entry.set_time(access, template.time(access));
            }
            for size in SizeKind::ALL {
                entry.set_size(size, template.size(size));
            }
        }
        Ok(entry)
    }

    fn assert_encodable(&self, name: &str) -> Result<(), NameError> {
        match &self.reject {
            Some(fragment) if name.contains(fragment.as_str()) => Err(NameError::new(name)),
            _ => Ok(()),
        }
    }
}

/// A container over a plain vector of entries.
pub struct TestContainer {
    entries: Vec<TestEntry>,
}

impl TestContainer {
    pub fn new(entries: Vec<TestEntry>) -> Self {
        Self { entries }
    }
}

impl EntryContainer<TestEntry> for TestContainer {
    fn len(&self) -> usize {
        self.entries.len()
    }

    fn entry(&self, name: &str) -> Option<&TestEntry> {
        self.entries.iter().find(|e| e.name() == name)
    }

    fn iter(&self) -> Box<dyn Iterator<Item = &TestEntry> + '_> {
        Box::new(self.entries.iter())
    }
}

/// A touch listener counting its invocations, with a switchable veto.
pub struct CountingListener {
    calls: Arc<AtomicUsize>,
    veto: Arc<AtomicBool>,
}

impl CountingListener {
    /// Returns the listener plus shared handles to its call counter and
    /// veto switch.
    pub fn new() -> (Self, Arc<AtomicUsize>, Arc<AtomicBool>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let veto = Arc::new(AtomicBool::new(false));
        let listener = Self { calls: calls.clone(), veto: veto.clone() };
        (listener, calls, veto)
    }
}

impl TouchListener for CountingListener {
    fn pre_touch(&self) -> std::io::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.veto.load(Ordering::SeqCst) {
            Err(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "modification vetoed",
            ))
        } else {
            Ok(())
        }
    }
}
