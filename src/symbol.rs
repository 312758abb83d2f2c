//! Core symbol types.
//!
//! Symbols are the atomic concepts of the legal ontology. Every concept, role
//! and marker is identified by a [`SymbolId`] and described by a
//! [`SymbolMeta`]. The [`AtomicSymbolAllocator`] provides thread-safe ID
//! generation.

use std::num::NonZeroU64;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Unique, niche-optimized identifier for a symbol.
///
/// Uses `NonZeroU64` so that `Option<SymbolId>` is the same size as `SymbolId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct SymbolId(NonZeroU64);

impl SymbolId {
    /// Create a `SymbolId` from a raw `u64`. Returns `None` if `raw` is zero.
    pub fn new(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(SymbolId)
    }

    /// Get the underlying `u64` value.
    pub fn get(self) -> u64 {
        self.0.get()
    }
}

impl std::fmt::Display for SymbolId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sym:{}", self.0)
    }
}

/// Classification of a symbol in the ontology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    /// A filler: party, court, legal concept, verb, value.
    Concept,
    /// An attribute role that fillers are bound to (`attr:agent`, `attr:role`).
    Role,
    /// A structural marker such as negation.
    Marker,
}

impl std::fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SymbolKind::Concept => write!(f, "Concept"),
            SymbolKind::Role => write!(f, "Role"),
            SymbolKind::Marker => write!(f, "Marker"),
        }
    }
}

/// Metadata describing a symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolMeta {
    pub id: SymbolId,
    pub kind: SymbolKind,
    /// Normalised name; the ontology key.
    pub name: String,
}

/// Normalise a symbol name: trim, collapse interior whitespace, lower-case.
///
/// Returns `None` when nothing remains.
pub fn normalize_name(raw: &str) -> Option<String> {
    let joined = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if joined.is_empty() {
        None
    } else {
        Some(joined.to_lowercase())
    }
}

/// Thread-safe symbol ID allocator.
///
/// Produces monotonically increasing IDs starting from 1.
#[derive(Debug)]
pub struct AtomicSymbolAllocator {
    next: AtomicU64,
}

impl AtomicSymbolAllocator {
    /// Create a new allocator that starts from ID 1.
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// Create an allocator that resumes from a given ID.
    pub fn starting_from(start: u64) -> Self {
        Self {
            next: AtomicU64::new(start.max(1)),
        }
    }

    /// Allocate the next symbol ID.
    ///
    /// The ID space holds 2^64 - 1 values; wrapping to zero is treated as
    /// exhaustion and yields `None`.
    pub fn next_id(&self) -> Option<SymbolId> {
        SymbolId::new(self.next.fetch_add(1, Ordering::Relaxed))
    }

    /// Return the next ID that *would* be allocated, without consuming it.
    pub fn peek_next(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }
}

impl Default for AtomicSymbolAllocator {
    fn default() -> Self {
        Self::new()
    }
}
