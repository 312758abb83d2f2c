//! Vector Symbolic Architecture (VSA) core.
//!
//! Bipolar hyperdimensional computing with configurable dimension
//! (default 10,000). It provides:
//!
//! - [`HyperVec`]: the bit-packed bipolar hypervector
//! - [`VsaOps`](ops::VsaOps): bind, bundle, permute, similarity
//! - [`SituationEncoder`](encode::SituationEncoder): structured extraction to
//!   situation vector

pub mod encode;
pub mod ops;

use serde::{Deserialize, Serialize};

/// Configurable hypervector dimensionality.
///
/// Typical values: 10,000 for good capacity, 1,000 for testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimension(pub usize);

impl Dimension {
    /// Standard high-capacity dimension.
    pub const DEFAULT: Self = Self(10_000);

    /// Smaller dimension for fast testing.
    pub const TEST: Self = Self(1_000);

    /// Number of `u64` words needed to hold one vector.
    pub fn word_len(self) -> usize {
        self.0.div_ceil(64)
    }

    /// Mask of the used bits in the last word.
    fn tail_mask(self) -> u64 {
        match self.0 % 64 {
            0 => u64::MAX,
            used => (1u64 << used) - 1,
        }
    }
}

impl Default for Dimension {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A bipolar hypervector.
///
/// Component `i` is bit `i % 64` of word `i / 64`; a set bit is +1 and a clear
/// bit is -1. Bits beyond `dim` are always zero so word-level comparisons stay
/// exact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HyperVec {
    words: Vec<u64>,
    dim: Dimension,
}

impl HyperVec {
    /// Create a hypervector from packed words, clearing bits past `dim`.
    pub fn from_words(mut words: Vec<u64>, dim: Dimension) -> Self {
        words.resize(dim.word_len(), 0);
        if let Some(last) = words.last_mut() {
            *last &= dim.tail_mask();
        }
        Self { words, dim }
    }

    /// The all -1 hypervector. Used as the vector of an empty situation.
    pub fn zero(dim: Dimension) -> Self {
        Self {
            words: vec![0u64; dim.word_len()],
            dim,
        }
    }

    /// Packed words.
    pub fn words(&self) -> &[u64] {
        &self.words
    }

    /// The dimension of this hypervector.
    pub fn dim(&self) -> Dimension {
        self.dim
    }

    /// Whether component `index` is +1.
    pub fn get_bit(&self, index: usize) -> bool {
        debug_assert!(index < self.dim.0);
        (self.words[index / 64] >> (index % 64)) & 1 == 1
    }

    /// Set component `index` to +1 (`true`) or -1 (`false`).
    pub fn set_bit(&mut self, index: usize, value: bool) {
        debug_assert!(index < self.dim.0);
        let mask = 1u64 << (index % 64);
        if value {
            self.words[index / 64] |= mask;
        } else {
            self.words[index / 64] &= !mask;
        }
    }

    /// Number of +1 components.
    pub fn count_ones(&self) -> u32 {
        self.words.iter().map(|w| w.count_ones()).sum()
    }
}
