//! Analogical completion of partially described situations.
//!
//! A target is given as role/filler pairs that are known plus roles whose
//! fillers are wanted. The known pairs are bundled into a pattern, the source
//! structure best aligned with that pattern becomes the anchor, and each
//! wanted role is unbound from the anchor and cleaned up against the concept
//! symbols of the ontology. Negated structures are compared with their
//! negation marker unbound, so a denied fact still answers who did what.

use serde::{Deserialize, Serialize};

use crate::error::{AuslexResult, OntologyError};
use crate::ontology::{names, Ontology};
use crate::symbol::{normalize_name, SymbolKind};
use crate::vsa::encode::EncodedSituation;
use crate::vsa::HyperVec;

/// Key reported as the anchor when the whole situation vector is used.
pub const SITUATION_ANCHOR: &str = "situation";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalogyConfig {
    /// Candidates below this cosine similarity are dropped.
    pub min_similarity: f32,
    /// Maximum candidates per unbound role.
    pub top_k: usize,
}

impl Default for AnalogyConfig {
    fn default() -> Self {
        Self {
            min_similarity: 0.2,
            top_k: 5,
        }
    }
}

/// A target situation with some roles filled and some open.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialSituation {
    pub bound: Vec<(String, String)>,
    pub unbound: Vec<String>,
}

impl PartialSituation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a known role/filler pair.
    pub fn bind(mut self, role: impl Into<String>, filler: impl Into<String>) -> Self {
        self.bound.push((role.into(), filler.into()));
        self
    }

    /// Add a role whose filler is wanted.
    pub fn ask(mut self, role: impl Into<String>) -> Self {
        self.unbound.push(role.into());
        self
    }
}

/// A proposed filler for an unbound role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalogyCandidate {
    /// The role as it was asked.
    pub role: String,
    pub filler: String,
    pub similarity: f32,
    /// Key of the source structure the filler was recovered from.
    pub anchor: String,
}

/// Completes partial situations by analogy with a source situation.
#[derive(Debug)]
pub struct AnalogyEngine<'o> {
    ontology: &'o Ontology,
    config: AnalogyConfig,
}

impl<'o> AnalogyEngine<'o> {
    pub fn new(ontology: &'o Ontology, config: AnalogyConfig) -> Self {
        Self { ontology, config }
    }

    pub fn config(&self) -> &AnalogyConfig {
        &self.config
    }

    /// Propose fillers for every unbound role of `target`.
    ///
    /// Candidates are grouped by role in the order the roles were asked, and
    /// ranked by similarity then name within a role. An empty source, or
    /// nothing above the similarity floor, yields no candidates.
    pub fn complete(
        &self,
        source: &EncodedSituation,
        target: &PartialSituation,
    ) -> AuslexResult<Vec<AnalogyCandidate>> {
        if source.is_empty() || target.unbound.is_empty() {
            return Ok(Vec::new());
        }
        let ops = self.ontology.ops();

        let mut excluded = Vec::with_capacity(target.bound.len());
        let mut pairs = Vec::with_capacity(target.bound.len());
        for (role, filler) in &target.bound {
            let role_vec = self.role_vector(role)?;
            let filler_vec = self.ontology.get_or_create(filler, SymbolKind::Concept)?;
            pairs.push(ops.bind(&role_vec, &filler_vec)?);
            excluded.extend(normalize_name(filler));
        }

        let (anchor_key, anchor) = if pairs.is_empty() {
            (SITUATION_ANCHOR.to_string(), source.vector.clone())
        } else {
            let refs: Vec<&HyperVec> = pairs.iter().collect();
            let pattern = ops.bundle(&refs)?;
            let not = if source.structures.iter().any(|s| s.negated) {
                Some(self.ontology.get_or_create(names::NEGATION, SymbolKind::Marker)?)
            } else {
                None
            };
            let mut best: Option<(usize, HyperVec, f32)> = None;
            for (index, structure) in source.structures.iter().enumerate() {
                let plain = match (&not, structure.negated) {
                    (Some(not), true) => ops.unbind(&structure.vector, not)?,
                    _ => structure.vector.clone(),
                };
                let alignment = ops.similarity(&pattern, &plain)?;
                if best.as_ref().is_none_or(|(_, _, b)| alignment > *b) {
                    best = Some((index, plain, alignment));
                }
            }
            // Non-empty source guarantees a structure.
            let Some((index, plain, alignment)) = best else {
                return Ok(Vec::new());
            };
            let structure = &source.structures[index];
            tracing::debug!(
                anchor = %structure.key,
                negated = structure.negated,
                alignment,
                "selected analogy anchor"
            );
            (structure.key.clone(), plain)
        };

        let mut candidates = Vec::new();
        for role in &target.unbound {
            let role_vec = self.role_vector(role)?;
            let query = ops.unbind(&anchor, &role_vec)?;
            let hits = self.ontology.nearest(
                &query,
                Some(SymbolKind::Concept),
                self.config.top_k + excluded.len(),
            )?;
            candidates.extend(
                hits.into_iter()
                    .filter(|m| !excluded.contains(&m.name))
                    .filter(|m| m.similarity >= self.config.min_similarity)
                    .take(self.config.top_k)
                    .map(|m| AnalogyCandidate {
                        role: role.clone(),
                        filler: m.name,
                        similarity: m.similarity,
                        anchor: anchor_key.clone(),
                    }),
            );
        }
        tracing::debug!(
            source = %source.chunk_id,
            asked = target.unbound.len(),
            candidates = candidates.len(),
            "analogy completion"
        );
        Ok(candidates)
    }

    /// Resolve a role name, accepting the bare form (`role`) for `attr:role`.
    fn role_vector(&self, role: &str) -> AuslexResult<HyperVec> {
        let key = normalize_name(role).ok_or(OntologyError::EmptyName)?;
        let prefixed = format!("attr:{key}");
        for name in [key.as_str(), prefixed.as_str()] {
            if let Some(meta) = self.ontology.meta(name) {
                if meta.kind == SymbolKind::Role {
                    if let Some(v) = self.ontology.get(name) {
                        return Ok(v);
                    }
                }
            }
        }
        Err(OntologyError::UnknownSymbol { name: key }.into())
    }
}
