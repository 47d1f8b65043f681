//! Pure data types for arkfs — the archive entry model and its seams.
//!
//! This crate is a leaf dependency with no I/O and no archive codecs. It
//! exists so that consumers (drivers, controllers, external tools) can work
//! with arkfs's entry model without pulling in the filesystem layer.

pub mod container;
pub mod covariant;
pub mod driver;
pub mod entry;

// Flat re-exports for convenience
pub use container::*;
pub use covariant::*;
pub use driver::*;
pub use entry::*;
