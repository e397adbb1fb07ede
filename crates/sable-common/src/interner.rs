//! String interning for identifier deduplication.
//!
//! Identifiers, member names, and literal text are interned once and referred
//! to by `Atom` thereafter, so symbol comparison is an integer compare and
//! diagnostics can resolve names late, at render time.

use dashmap::DashMap;
use rustc_hash::FxBuildHasher;
use std::sync::RwLock;

/// An interned string handle.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Atom(pub u32);

impl Atom {
    /// The empty string, pre-registered in every interner.
    pub const EMPTY: Atom = Atom(0);
}

/// Thread-safe string interner.
///
/// Interning takes a write path only the first time a string is seen; resolve
/// is a read-locked index into the backing store. The interner is append-only
/// for the lifetime of a compilation.
pub struct Interner {
    map: DashMap<Box<str>, Atom, FxBuildHasher>,
    strings: RwLock<Vec<Box<str>>>,
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

impl Interner {
    pub fn new() -> Self {
        let interner = Self {
            map: DashMap::with_hasher(FxBuildHasher),
            strings: RwLock::new(Vec::new()),
        };
        let empty = interner.intern("");
        debug_assert_eq!(empty, Atom::EMPTY);
        interner
    }

    /// Intern a string, returning its stable `Atom`.
    pub fn intern(&self, text: &str) -> Atom {
        if let Some(existing) = self.map.get(text) {
            return *existing;
        }
        // The id is the backing vector's index, allocated under its write
        // lock so concurrent interns of distinct strings stay consistent.
        *self
            .map
            .entry(text.into())
            .or_insert_with(|| {
                let mut strings = self.strings.write().unwrap_or_else(|e| e.into_inner());
                let id = strings.len() as u32;
                strings.push(text.into());
                Atom(id)
            })
            .value()
    }

    /// Resolve an `Atom` back to its string.
    pub fn resolve(&self, atom: Atom) -> String {
        let strings = self.strings.read().unwrap_or_else(|e| e.into_inner());
        strings
            .get(atom.0 as usize)
            .map(|s| s.to_string())
            .unwrap_or_default()
    }

    /// Number of distinct interned strings.
    pub fn len(&self) -> usize {
        self.strings
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
