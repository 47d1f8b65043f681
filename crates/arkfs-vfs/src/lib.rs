//! arkfs-vfs: a read/write virtual filesystem view over archive entries.
//!
//! Archive containers are flat, possibly duplicated, possibly malformed
//! lists of named entries. This crate reconstructs a consistent directory
//! tree from such a list and keeps it consistent across mutations:
//!
//! - **paths**: canonical entry-name handling (normalization, splitting)
//! - **EntryTable**: the insertion-ordered path → covariant-entry mapping
//! - **ArchiveFileSystem**: tree assembly, integrity fix-up, transactional
//!   `mknod`, `unlink`, time updates, read-only mode, touch notification
//! - **ReadOnlyFile**: the random-access read seam for entry payloads
//! - **DriverRegistry**: scheme → driver lookup for mount points
//!
//! The filesystem is not internally thread-safe; the owning controller
//! serializes access. No operation blocks.

pub mod error;
pub mod fs;
pub mod paths;
pub mod registry;
pub mod rof;
pub mod table;

#[cfg(test)]
pub mod testing;

pub use error::{FsError, FsResult};
pub use fs::{ArchiveFileSystem, Mknod, Template, TouchListener, ROOT_PATH};
pub use registry::{DriverRegistry, Scheme, SchemeError};
pub use rof::ReadOnlyFile;
pub use table::EntryTable;
