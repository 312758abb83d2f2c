//! Situation encoding: structured extraction → hypervector.
//!
//! Each record becomes a *structure*: the bundle of its role-filler pairs
//! (`bind(attr:role, plaintiff)` and so on). Negated records are additionally
//! bound with the negation marker. The situation vector bundles all
//! structures of the chunk.
//!
//! Temporal links are order-sensitive: `bind(relation, bind(ρ(earlier), later))`
//! with ρ a one-step permutation, so "A precedes B" and "B precedes A" encode
//! differently.
//!
//! Encoding never fails. Empty fields, symbol conflicts and records with no
//! usable field are reported as [`EncodingWarning`]s and skipped.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::AuslexError;
use crate::extract::{EncodingWarning, Extraction, ExtractionRecord, RecordTag};
use crate::ontology::{names, Ontology};
use crate::symbol::{normalize_name, SymbolKind};

use super::HyperVec;

/// One encoded record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Structure {
    /// `tag#index:primary-filler`, e.g. `actor#0:smith`.
    pub key: String,
    pub tag: RecordTag,
    pub negated: bool,
    pub vector: HyperVec,
}

/// The encoding of one chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodedSituation {
    /// Source chunk. Provenance only; never used for comparison.
    pub chunk_id: String,
    /// Bundle of all structure vectors (the all -1 vector when empty).
    pub vector: HyperVec,
    pub structures: Vec<Structure>,
    /// Every symbol used, by normalised name, with its base vector.
    pub symbols: BTreeMap<String, HyperVec>,
    pub warnings: Vec<EncodingWarning>,
}

impl EncodedSituation {
    /// Whether no record could be encoded.
    pub fn is_empty(&self) -> bool {
        self.structures.is_empty()
    }

    /// Look up a structure by key.
    pub fn structure(&self, key: &str) -> Option<&Structure> {
        self.structures.iter().find(|s| s.key == key)
    }
}

/// A role slot of a record: attribute role, field name, value, whether the
/// field is required.
type Slot<'r> = (&'static str, &'static str, Option<&'r str>, bool);

/// Encodes extractions against an ontology.
#[derive(Debug, Clone, Copy)]
pub struct SituationEncoder<'o> {
    ontology: &'o Ontology,
}

struct EncodeContext {
    symbols: BTreeMap<String, HyperVec>,
    warnings: Vec<EncodingWarning>,
}

impl<'o> SituationEncoder<'o> {
    pub fn new(ontology: &'o Ontology) -> Self {
        Self { ontology }
    }

    /// Parse extractor JSON and encode it.
    pub fn encode_json(&self, json: &str) -> EncodedSituation {
        self.encode(&Extraction::from_json(json))
    }

    /// Encode an extraction into one situation vector.
    ///
    /// Deterministic: the same extraction against the same ontology state
    /// always yields bit-identical output.
    pub fn encode(&self, extraction: &Extraction) -> EncodedSituation {
        let mut ctx = EncodeContext {
            symbols: BTreeMap::new(),
            warnings: extraction.warnings.clone(),
        };

        let mut structures = Vec::with_capacity(extraction.records.len());
        for (index, record) in extraction.records.iter().enumerate() {
            match self.encode_record(index, record, &mut ctx) {
                Ok(Some(structure)) => structures.push(structure),
                Ok(None) => {}
                Err(e) => ctx.warnings.push(EncodingWarning::record(
                    index,
                    Some(record.tag()),
                    format!("skipped: {e}"),
                )),
            }
        }

        let dim = self.ontology.dim();
        let vector = if structures.is_empty() {
            HyperVec::zero(dim)
        } else {
            let refs: Vec<&HyperVec> = structures.iter().map(|s| &s.vector).collect();
            match self.ontology.ops().bundle(&refs) {
                Ok(v) => v,
                Err(e) => {
                    ctx.warnings
                        .push(EncodingWarning::document(format!("bundle failed: {e}")));
                    HyperVec::zero(dim)
                }
            }
        };

        for warning in &ctx.warnings[extraction.warnings.len()..] {
            tracing::warn!(chunk = %extraction.chunk_id, %warning, "encoding warning");
        }
        tracing::debug!(
            chunk = %extraction.chunk_id,
            structures = structures.len(),
            symbols = ctx.symbols.len(),
            warnings = ctx.warnings.len(),
            "encoded situation"
        );

        EncodedSituation {
            chunk_id: extraction.chunk_id.clone(),
            vector,
            structures,
            symbols: ctx.symbols,
            warnings: ctx.warnings,
        }
    }

    /// Dispatch on the record tag.
    fn encode_record(
        &self,
        index: usize,
        record: &ExtractionRecord,
        ctx: &mut EncodeContext,
    ) -> Result<Option<Structure>, AuslexError> {
        let tag = record.tag();
        match record {
            ExtractionRecord::Actor(actor) => {
                let entity_type = Some(actor.entity_type.as_str()).filter(|t| !t.trim().is_empty());
                let slots = [
                    (names::ATTR_NAME, "name", Some(actor.name.as_str()), true),
                    (names::ATTR_ENTITY_TYPE, "entity_type", entity_type, false),
                    (names::ATTR_ROLE, "role", actor.role.as_deref(), false),
                ];
                self.encode_slots(index, tag, &actor.name, &slots, false, ctx)
            }
            ExtractionRecord::Role(role) => {
                let slots = [
                    (names::ATTR_HOLDER, "holder", Some(role.holder.as_str()), true),
                    (names::ATTR_ROLE, "role", Some(role.role.as_str()), true),
                ];
                self.encode_slots(index, tag, &role.holder, &slots, false, ctx)
            }
            ExtractionRecord::State(state) => {
                let slots = [
                    (names::ATTR_SUBJECT, "subject", Some(state.subject.as_str()), true),
                    (names::ATTR_ATTRIBUTE, "attribute", Some(state.attribute.as_str()), true),
                    (names::ATTR_VALUE, "value", Some(state.value.as_str()), true),
                ];
                self.encode_slots(index, tag, &state.subject, &slots, state.negated, ctx)
            }
            ExtractionRecord::VerbPhrase(vp) => {
                let slots = [
                    (names::ATTR_AGENT, "agent", Some(vp.agent.as_str()), true),
                    (names::ATTR_VERB, "verb", Some(vp.verb.as_str()), true),
                    (names::ATTR_PATIENT, "patient", vp.patient.as_deref(), false),
                ];
                self.encode_slots(index, tag, &vp.verb, &slots, vp.negated, ctx)
            }
            ExtractionRecord::TemporalLink(link) => self.encode_temporal(
                index,
                &link.earlier,
                &link.later,
                link.relation.as_deref(),
                ctx,
            ),
        }
    }

    fn encode_slots(
        &self,
        index: usize,
        tag: RecordTag,
        primary: &str,
        slots: &[Slot<'_>],
        negated: bool,
        ctx: &mut EncodeContext,
    ) -> Result<Option<Structure>, AuslexError> {
        let ops = self.ontology.ops();
        let mut pairs = Vec::with_capacity(slots.len());

        for &(role, field, value, required) in slots {
            let Some(filler) = value.and_then(normalize_name) else {
                if required {
                    ctx.warnings
                        .push(EncodingWarning::field(index, tag, field, "empty value"));
                }
                continue;
            };
            let role_vec = self.symbol(role, SymbolKind::Role, ctx)?;
            let filler_vec = match self.symbol(&filler, SymbolKind::Concept, ctx) {
                Ok(v) => v,
                Err(e) => {
                    ctx.warnings
                        .push(EncodingWarning::field(index, tag, field, e.to_string()));
                    continue;
                }
            };
            pairs.push(ops.bind(&role_vec, &filler_vec)?);
        }

        if pairs.is_empty() {
            ctx.warnings
                .push(EncodingWarning::record(index, Some(tag), "no usable field, record skipped"));
            return Ok(None);
        }

        let refs: Vec<&HyperVec> = pairs.iter().collect();
        let mut vector = ops.bundle(&refs)?;
        if negated {
            let not = self.symbol(names::NEGATION, SymbolKind::Marker, ctx)?;
            vector = ops.bind(&vector, &not)?;
        }

        Ok(Some(Structure {
            key: structure_key(tag, index, primary),
            tag,
            negated,
            vector,
        }))
    }

    fn encode_temporal(
        &self,
        index: usize,
        earlier: &str,
        later: &str,
        relation: Option<&str>,
        ctx: &mut EncodeContext,
    ) -> Result<Option<Structure>, AuslexError> {
        let tag = RecordTag::TemporalLink;
        let ops = self.ontology.ops();

        let mut ends = Vec::with_capacity(2);
        for (field, value) in [("earlier", earlier), ("later", later)] {
            match normalize_name(value) {
                Some(name) => ends.push(name),
                None => ctx
                    .warnings
                    .push(EncodingWarning::field(index, tag, field, "empty value")),
            }
        }
        let [earlier, later] = ends.as_slice() else {
            ctx.warnings.push(EncodingWarning::record(
                index,
                Some(tag),
                "temporal link needs both ends, record skipped",
            ));
            return Ok(None);
        };

        let relation = relation
            .and_then(normalize_name)
            .unwrap_or_else(|| names::PRECEDES.to_string());
        let relation_vec = self.symbol(&relation, SymbolKind::Concept, ctx)?;
        let earlier_vec = self.symbol(earlier, SymbolKind::Concept, ctx)?;
        let later_vec = self.symbol(later, SymbolKind::Concept, ctx)?;

        let ordered = ops.bind(&ops.permute(&earlier_vec, 1), &later_vec)?;
        let vector = ops.bind(&relation_vec, &ordered)?;

        Ok(Some(Structure {
            key: structure_key(tag, index, &format!("{earlier} {relation} {later}")),
            tag,
            negated: false,
            vector,
        }))
    }

    fn symbol(
        &self,
        name: &str,
        kind: SymbolKind,
        ctx: &mut EncodeContext,
    ) -> Result<HyperVec, AuslexError> {
        let vector = self.ontology.get_or_create(name, kind)?;
        if let Some(key) = normalize_name(name) {
            ctx.symbols.entry(key).or_insert_with(|| vector.clone());
        }
        Ok(vector)
    }
}

fn structure_key(tag: RecordTag, index: usize, primary: &str) -> String {
    let primary = normalize_name(primary).unwrap_or_default();
    format!("{tag}#{index}:{primary}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{Actor, TemporalLink, VerbPhrase};
    use crate::vsa::Dimension;

    fn ontology() -> Ontology {
        Ontology::legal(Dimension::DEFAULT, 11).unwrap()
    }

    fn actor(name: &str, entity_type: &str, role: &str) -> ExtractionRecord {
        ExtractionRecord::Actor(Actor {
            name: name.into(),
            entity_type: entity_type.into(),
            role: Some(role.into()),
        })
    }

    fn verb(agent: &str, verb: &str, patient: &str, negated: bool) -> ExtractionRecord {
        ExtractionRecord::VerbPhrase(VerbPhrase {
            agent: agent.into(),
            verb: verb.into(),
            patient: Some(patient.into()),
            negated,
        })
    }

    fn link(earlier: &str, later: &str) -> ExtractionRecord {
        ExtractionRecord::TemporalLink(TemporalLink {
            earlier: earlier.into(),
            later: later.into(),
            relation: None,
        })
    }

    #[test]
    fn encoding_is_deterministic() {
        let ontology = ontology();
        let encoder = SituationEncoder::new(&ontology);
        let extraction = Extraction::new(
            "c1",
            vec![
                actor("Smith", "person", "plaintiff"),
                verb("Acme Pty Ltd", "breached", "contract", false),
            ],
        );
        let first = encoder.encode(&extraction);
        let second = encoder.encode(&extraction);
        assert_eq!(first.vector, second.vector);
        assert_eq!(first, second);
        assert_eq!(first.structures.len(), 2);
        assert_eq!(first.structures[0].key, "actor#0:smith");
        assert!(first.warnings.is_empty());
    }

    #[test]
    fn symbol_index_lists_constituents() {
        let ontology = ontology();
        let encoder = SituationEncoder::new(&ontology);
        let encoded = encoder.encode(&Extraction::new(
            "c1",
            vec![actor("Smith", "person", "plaintiff")],
        ));
        for name in ["smith", "person", "plaintiff", names::ATTR_NAME, names::ATTR_ROLE] {
            assert_eq!(encoded.symbols.get(name), ontology.get(name).as_ref(), "{name}");
        }
    }

    #[test]
    fn structure_is_recoverable_by_unbinding() {
        let ontology = ontology();
        let ops = ontology.ops();
        let encoder = SituationEncoder::new(&ontology);
        let encoded = encoder.encode(&Extraction::new(
            "c1",
            vec![actor("Smith", "person", "plaintiff")],
        ));
        let role = ontology.get(names::ATTR_ROLE).unwrap();
        let recovered = ops.unbind(&encoded.vector, &role).unwrap();
        let best = ontology
            .nearest(&recovered, Some(SymbolKind::Concept), 1)
            .unwrap();
        assert_eq!(best[0].name, "plaintiff");
    }

    #[test]
    fn negation_changes_the_structure() {
        let ontology = ontology();
        let ops = ontology.ops();
        let encoder = SituationEncoder::new(&ontology);
        let plain = encoder.encode(&Extraction::new("a", vec![verb("Acme", "breached", "contract", false)]));
        let negated = encoder.encode(&Extraction::new("b", vec![verb("Acme", "breached", "contract", true)]));
        assert!(negated.structures[0].negated);
        let not = ontology.get(names::NEGATION).unwrap();
        assert_eq!(ops.bind(&plain.vector, &not).unwrap(), negated.vector);
    }

    #[test]
    fn temporal_order_is_distinguishable() {
        let ontology = ontology();
        let ops = ontology.ops();
        let encoder = SituationEncoder::new(&ontology);
        let forward = encoder.encode(&Extraction::new("a", vec![link("notice", "termination")]));
        let backward = encoder.encode(&Extraction::new("b", vec![link("termination", "notice")]));
        let sim = ops.similarity(&forward.vector, &backward.vector).unwrap();
        assert!(sim.abs() < 0.1, "sim={sim}");
    }

    #[test]
    fn empty_fields_warn_but_do_not_abort() {
        let ontology = ontology();
        let encoder = SituationEncoder::new(&ontology);
        let encoded = encoder.encode(&Extraction::new(
            "c1",
            vec![
                actor("  ", "person", "plaintiff"),
                verb("", "", "", false),
                link("notice", " "),
            ],
        ));
        // The actor keeps its type and role; the verb phrase and link are dropped.
        assert_eq!(encoded.structures.len(), 1);
        assert!(encoded.warnings.iter().any(|w| w.field.as_deref() == Some("name")));
        assert!(encoded.warnings.iter().any(|w| w.record == Some(1) && w.field.is_none()));
        assert!(encoded.warnings.iter().any(|w| w.record == Some(2) && w.field.is_none()));
    }

    #[test]
    fn role_name_used_as_filler_is_skipped() {
        let ontology = ontology();
        let encoder = SituationEncoder::new(&ontology);
        let encoded = encoder.encode(&Extraction::new(
            "c1",
            vec![actor("attr:agent", "person", "plaintiff")],
        ));
        assert_eq!(encoded.structures.len(), 1);
        assert!(encoded
            .warnings
            .iter()
            .any(|w| w.field.as_deref() == Some("name") && w.message.contains("registered as")));
    }

    #[test]
    fn empty_extraction_yields_empty_situation() {
        let ontology = ontology();
        let encoder = SituationEncoder::new(&ontology);
        let encoded = encoder.encode_json("not json at all");
        assert!(encoded.is_empty());
        assert_eq!(encoded.vector, HyperVec::zero(ontology.dim()));
        assert_eq!(encoded.warnings.len(), 1);
    }
}
