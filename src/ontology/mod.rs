//! Legal ontology: the registry of symbol hypervectors.
//!
//! The ontology maps normalised symbol names to their hypervectors. It is an
//! explicit object owned by the caller and passed by reference to encoders,
//! detectors and the analogy engine, so every test can work with an isolated
//! registry.
//!
//! - Lazy allocation: [`Ontology::get_or_create`] derives a vector from the
//!   ontology seed and the symbol name on first access
//! - Single writer per key: creation runs under the DashMap entry lock, so
//!   concurrent first lookups of one name observe one vector
//! - Exact nearest-neighbour search over the registered symbols
//! - Snapshots for an external persistence layer

pub mod seed;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{OntologyError, VsaError};
use crate::simd;
use crate::symbol::{normalize_name, AtomicSymbolAllocator, SymbolId, SymbolKind, SymbolMeta};
use crate::vsa::ops::VsaOps;
use crate::vsa::{Dimension, HyperVec};

/// Result type for ontology operations.
pub type OntologyResult<T> = std::result::Result<T, OntologyError>;

/// Well-known symbol names used by the encoder and detector.
pub mod names {
    /// Marker bound onto negated structures.
    pub const NEGATION: &str = "marker:not";

    pub const ATTR_NAME: &str = "attr:name";
    pub const ATTR_ENTITY_TYPE: &str = "attr:entity-type";
    pub const ATTR_ROLE: &str = "attr:role";
    pub const ATTR_HOLDER: &str = "attr:holder";
    pub const ATTR_SUBJECT: &str = "attr:subject";
    pub const ATTR_ATTRIBUTE: &str = "attr:attribute";
    pub const ATTR_VALUE: &str = "attr:value";
    pub const ATTR_AGENT: &str = "attr:agent";
    pub const ATTR_VERB: &str = "attr:verb";
    pub const ATTR_PATIENT: &str = "attr:patient";

    /// Default relation of a temporal link.
    pub const PRECEDES: &str = "precedes";
}

#[derive(Debug, Clone)]
struct SymbolEntry {
    meta: SymbolMeta,
    vector: HyperVec,
}

/// A nearest-neighbour hit.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolMatch {
    pub name: String,
    pub id: SymbolId,
    pub kind: SymbolKind,
    /// Bipolar cosine similarity to the query.
    pub similarity: f32,
}

/// The ontology: concept, role and marker symbols with their hypervectors.
pub struct Ontology {
    ops: VsaOps,
    seed: u64,
    entries: DashMap<String, SymbolEntry>,
    allocator: AtomicSymbolAllocator,
}

impl Ontology {
    /// Create an empty ontology.
    ///
    /// `seed` fixes the vector every symbol name maps to; two ontologies with
    /// the same dimension and seed agree on every symbol.
    pub fn new(dim: Dimension, seed: u64) -> OntologyResult<Self> {
        if dim.0 == 0 {
            return Err(VsaError::InvalidDimension { dim: dim.0 }.into());
        }
        let kernel = simd::best_kernel();
        tracing::debug!(isa = %kernel.isa_level(), dim = dim.0, seed, "creating ontology");
        Ok(Self {
            ops: VsaOps::new(kernel, dim),
            seed,
            entries: DashMap::new(),
            allocator: AtomicSymbolAllocator::new(),
        })
    }

    /// Create an ontology bootstrapped with the bundled legal vocabulary.
    pub fn legal(dim: Dimension, seed: u64) -> OntologyResult<Self> {
        let ontology = Self::new(dim, seed)?;
        let report = seed::apply(&ontology, &seed::Vocabulary::legal()?)?;
        tracing::info!(
            vocabulary = %report.id,
            symbols = report.created,
            dim = dim.0,
            "legal ontology ready"
        );
        Ok(ontology)
    }

    /// VSA operations at this ontology's dimension.
    pub fn ops(&self) -> &VsaOps {
        &self.ops
    }

    /// Hypervector dimension.
    pub fn dim(&self) -> Dimension {
        self.ops.dim()
    }

    /// Seed the symbol vectors are derived from.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Get the vector for `name`, creating the symbol if it does not exist.
    ///
    /// Idempotent: every call with the same name returns the same vector.
    /// Asking for an existing name under a different kind is an error.
    pub fn get_or_create(&self, name: &str, kind: SymbolKind) -> OntologyResult<HyperVec> {
        let key = normalize_name(name).ok_or(OntologyError::EmptyName)?;

        if let Some(entry) = self.entries.get(&key) {
            return check_kind(&entry, kind).map(|()| entry.vector.clone());
        }

        match self.entries.entry(key) {
            Entry::Occupied(occupied) => {
                let entry = occupied.get();
                check_kind(entry, kind).map(|()| entry.vector.clone())
            }
            Entry::Vacant(vacant) => {
                let id = self
                    .allocator
                    .next_id()
                    .ok_or(OntologyError::AllocatorExhausted)?;
                let vector = self.derive_vector(vacant.key());
                let meta = SymbolMeta {
                    id,
                    kind,
                    name: vacant.key().clone(),
                };
                tracing::trace!(symbol = %meta.name, %id, %kind, "created symbol");
                let inserted = vacant.insert(SymbolEntry { meta, vector });
                Ok(inserted.vector.clone())
            }
        }
    }

    /// Get the vector for `name` if it exists.
    pub fn get(&self, name: &str) -> Option<HyperVec> {
        let key = normalize_name(name)?;
        self.entries.get(&key).map(|e| e.vector.clone())
    }

    /// Get the metadata for `name` if it exists.
    pub fn meta(&self, name: &str) -> Option<SymbolMeta> {
        let key = normalize_name(name)?;
        self.entries.get(&key).map(|e| e.meta.clone())
    }

    /// Whether `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        normalize_name(name).is_some_and(|key| self.entries.contains_key(&key))
    }

    /// Number of registered symbols.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the ontology is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All symbol metadata, ordered by ID.
    pub fn symbols(&self) -> Vec<SymbolMeta> {
        let mut all: Vec<SymbolMeta> = self.entries.iter().map(|e| e.meta.clone()).collect();
        all.sort_by_key(|m| m.id);
        all
    }

    /// The `k` registered symbols most similar to `query`.
    ///
    /// `kind` restricts the search to one symbol kind. Results are sorted by
    /// descending similarity, ties by name, so the ranking is deterministic.
    pub fn nearest(
        &self,
        query: &HyperVec,
        kind: Option<SymbolKind>,
        k: usize,
    ) -> OntologyResult<Vec<SymbolMatch>> {
        if query.dim() != self.dim() {
            return Err(VsaError::DimensionMismatch {
                expected: self.dim().0,
                actual: query.dim().0,
            }
            .into());
        }

        let mut matches: Vec<SymbolMatch> = self
            .entries
            .par_iter()
            .filter(|e| kind.is_none_or(|wanted| e.meta.kind == wanted))
            .filter_map(|e| {
                let similarity = self.ops.similarity(query, &e.vector).ok()?;
                Some(SymbolMatch {
                    name: e.meta.name.clone(),
                    id: e.meta.id,
                    kind: e.meta.kind,
                    similarity,
                })
            })
            .collect();

        matches.sort_by(|a, b| {
            b.similarity
                .total_cmp(&a.similarity)
                .then_with(|| a.name.cmp(&b.name))
        });
        matches.truncate(k);
        Ok(matches)
    }

    /// Proportional analogy over concepts: `a : b :: c : ?`.
    ///
    /// The relation `bind(a, b)` is applied to `c` and the result is matched
    /// against the concept symbols, excluding the three inputs.
    pub fn proportional(
        &self,
        a: &str,
        b: &str,
        c: &str,
        top_k: usize,
    ) -> OntologyResult<Vec<SymbolMatch>> {
        let keys: Vec<String> = [a, b, c]
            .iter()
            .map(|n| normalize_name(n).ok_or(OntologyError::EmptyName))
            .collect::<OntologyResult<_>>()?;
        let mut distinct = keys.clone();
        distinct.sort();
        distinct.dedup();
        if distinct.len() != 3 {
            return Err(OntologyError::InvalidAnalogy {
                count: distinct.len(),
            });
        }

        let lookup = |key: &String| {
            self.get(key)
                .ok_or_else(|| OntologyError::UnknownSymbol { name: key.clone() })
        };
        let a_vec = lookup(&keys[0])?;
        let b_vec = lookup(&keys[1])?;
        let c_vec = lookup(&keys[2])?;

        let relation = self.ops.bind(&a_vec, &b_vec)?;
        let recovered = self.ops.unbind(&relation, &c_vec)?;

        let mut results = self.nearest(&recovered, Some(SymbolKind::Concept), top_k + 3)?;
        results.retain(|m| !keys.contains(&m.name));
        results.truncate(top_k);
        Ok(results)
    }

    /// Export every symbol and vector for persistence.
    pub fn snapshot(&self) -> SymbolTable {
        let mut symbols: Vec<SymbolRecord> = self
            .entries
            .iter()
            .map(|e| SymbolRecord {
                meta: e.meta.clone(),
                vector: e.vector.clone(),
            })
            .collect();
        symbols.sort_by_key(|r| r.meta.id);
        SymbolTable {
            dimension: self.dim(),
            seed: self.seed,
            symbols,
        }
    }

    /// Rebuild an ontology from a snapshot, keeping IDs and vectors as stored.
    pub fn from_table(table: SymbolTable) -> OntologyResult<Self> {
        let ontology = Self::new(table.dimension, table.seed)?;
        let mut max_id = 0;
        for record in table.symbols {
            if record.vector.dim() != table.dimension
                || record.vector.words().len() != table.dimension.word_len()
            {
                return Err(OntologyError::Snapshot {
                    message: format!(
                        "symbol \"{}\" has dimension {}, table declares {}",
                        record.meta.name,
                        record.vector.dim(),
                        table.dimension
                    ),
                });
            }
            let key = normalize_name(&record.meta.name).ok_or(OntologyError::EmptyName)?;
            if ontology.entries.contains_key(&key) {
                return Err(OntologyError::Snapshot {
                    message: format!("duplicate symbol \"{key}\""),
                });
            }
            max_id = max_id.max(record.meta.id.get());
            ontology.entries.insert(
                key,
                SymbolEntry {
                    meta: record.meta,
                    vector: record.vector,
                },
            );
        }
        let ontology = Self {
            allocator: AtomicSymbolAllocator::starting_from(max_id + 1),
            ..ontology
        };
        tracing::debug!(symbols = ontology.len(), "restored ontology from snapshot");
        Ok(ontology)
    }

    /// `StdRng` seeded with `SHA-256(seed_le ‖ name)`. Fixed across builds, so
    /// symbols created after a restore match the ones a fresh ontology makes.
    fn derive_vector(&self, key: &str) -> HyperVec {
        let mut hasher = Sha256::new();
        hasher.update(self.seed.to_le_bytes());
        hasher.update(key.as_bytes());
        let mut rng = rand::rngs::StdRng::from_seed(hasher.finalize().into());
        self.ops.random(&mut rng)
    }
}

fn check_kind(entry: &SymbolEntry, requested: SymbolKind) -> OntologyResult<()> {
    if entry.meta.kind == requested {
        Ok(())
    } else {
        Err(OntologyError::KindConflict {
            name: entry.meta.name.clone(),
            existing: entry.meta.kind.to_string(),
            requested: requested.to_string(),
        })
    }
}

impl std::fmt::Debug for Ontology {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ontology")
            .field("dim", &self.dim())
            .field("seed", &self.seed)
            .field("len", &self.entries.len())
            .finish()
    }
}

/// Serializable name → vector table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolTable {
    pub dimension: Dimension,
    pub seed: u64,
    pub symbols: Vec<SymbolRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolRecord {
    pub meta: SymbolMeta,
    pub vector: HyperVec,
}

impl SymbolTable {
    /// Encode with bincode.
    pub fn to_bytes(&self) -> OntologyResult<Vec<u8>> {
        bincode::serialize(self).map_err(|e| OntologyError::Snapshot {
            message: format!("failed to serialize symbol table: {e}"),
        })
    }

    /// Decode from bincode.
    pub fn from_bytes(bytes: &[u8]) -> OntologyResult<Self> {
        bincode::deserialize(bytes).map_err(|e| OntologyError::Snapshot {
            message: format!("failed to deserialize symbol table: {e}"),
        })
    }
}
