//! Scheme → driver lookup for mount points.
//!
//! A mount point names its archive format by a URI-style scheme (`zip`,
//! `tar`, ...). The registry maps each scheme to the driver responsible for
//! it, so a controller stack can pick the right codec per mount.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use thiserror::Error;

/// The given string is not a valid scheme.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid scheme: {0:?}")]
pub struct SchemeError(String);

/// A URI-style scheme identifying an archive format.
///
/// Schemes are case-insensitive and stored lowercased: a letter followed by
/// letters, digits, `+`, `-`, or `.`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Scheme(String);

impl Scheme {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Scheme {
    type Err = SchemeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let valid = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
            && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
        if valid {
            Ok(Scheme(s.to_ascii_lowercase()))
        } else {
            Err(SchemeError(s.to_owned()))
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An insertion-ordered mapping of schemes to archive drivers.
#[derive(Debug, Default)]
pub struct DriverRegistry<D> {
    drivers: IndexMap<Scheme, D>,
}

impl<D> DriverRegistry<D> {
    pub fn new() -> Self {
        Self { drivers: IndexMap::new() }
    }

    /// Register `driver` for `scheme`, returning any driver it displaces.
    pub fn insert(&mut self, scheme: Scheme, driver: D) -> Option<D> {
        self.drivers.insert(scheme, driver)
    }

    /// The driver registered for `scheme`, if any.
    pub fn get(&self, scheme: &Scheme) -> Option<&D> {
        self.drivers.get(scheme)
    }

    /// Number of registered schemes.
    pub fn len(&self) -> usize {
        self.drivers.len()
    }

    /// Returns true if no driver has been registered.
    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty()
    }

    /// Iterate over registrations in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&Scheme, &D)> {
        self.drivers.iter()
    }
}
