//! Contradiction detection between encoded claims.
//!
//! Negation is modelled with a marker symbol: a negated structure is the
//! plain structure bound with `marker:not`. Two vectors are therefore
//! compared twice, directly and with the second one negated:
//!
//! - `direct = cos(a, b)`
//! - `negated = cos(a, b ⊗ NOT)`
//!
//! A high `negated` similarity means `a` states what `b` denies. Because
//! binding is XOR and preserves Hamming distance, negating either side gives
//! the same score, so the classification is symmetric.
//!
//! Contradictions are *reported*, not blocked. The caller decides how to
//! proceed.

use serde::{Deserialize, Serialize};

use crate::ontology::{names, Ontology, OntologyResult};
use crate::symbol::SymbolKind;
use crate::vsa::encode::EncodedSituation;
use crate::vsa::ops::VsaResult;
use crate::vsa::HyperVec;

/// Minimum direct similarity for two claims to count as consistent.
pub const DEFAULT_CONSISTENCY_THRESHOLD: f32 = 0.8;

/// Minimum negated similarity for two claims to count as contradictory.
pub const DEFAULT_CONTRADICTION_THRESHOLD: f32 = 0.8;

/// Thresholds of the detector. Both boundaries are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContradictionConfig {
    pub consistency_threshold: f32,
    pub contradiction_threshold: f32,
}

impl Default for ContradictionConfig {
    fn default() -> Self {
        Self {
            consistency_threshold: DEFAULT_CONSISTENCY_THRESHOLD,
            contradiction_threshold: DEFAULT_CONTRADICTION_THRESHOLD,
        }
    }
}

/// Outcome of comparing two claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Consistent,
    Contradictory,
    Unrelated,
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Label::Consistent => "consistent",
            Label::Contradictory => "contradictory",
            Label::Unrelated => "unrelated",
        };
        f.write_str(s)
    }
}

/// A classified comparison.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub label: Label,
    /// Confidence in `label`, in `[0, 1]` for consistent and contradictory.
    pub score: f32,
    /// `cos(a, b)`.
    pub direct: f32,
    /// `cos(a, b ⊗ NOT)`.
    pub negated: f32,
}

/// Classifies pairs of hypervectors as consistent, contradictory or unrelated.
#[derive(Debug)]
pub struct ContradictionDetector<'o> {
    ontology: &'o Ontology,
    not: HyperVec,
    config: ContradictionConfig,
}

impl<'o> ContradictionDetector<'o> {
    /// Create a detector. Registers the negation marker if it is missing.
    pub fn new(ontology: &'o Ontology, config: ContradictionConfig) -> OntologyResult<Self> {
        let not = ontology.get_or_create(names::NEGATION, SymbolKind::Marker)?;
        Ok(Self {
            ontology,
            not,
            config,
        })
    }

    pub fn config(&self) -> &ContradictionConfig {
        &self.config
    }

    /// Bind `v` with the negation marker. Applying it twice is the identity.
    pub fn negate(&self, v: &HyperVec) -> VsaResult<HyperVec> {
        self.ontology.ops().bind(v, &self.not)
    }

    /// `cos(a, b ⊗ NOT)`: how strongly `a` asserts the negation of `b`.
    pub fn contradiction_score(&self, a: &HyperVec, b: &HyperVec) -> VsaResult<f32> {
        let ops = self.ontology.ops();
        ops.similarity(a, &self.negate(b)?)
    }

    /// Classify two vectors.
    pub fn compare(&self, a: &HyperVec, b: &HyperVec) -> VsaResult<Comparison> {
        let direct = self.ontology.ops().similarity(a, b)?;
        let negated = self.contradiction_score(a, b)?;
        Ok(self.classify(direct, negated))
    }

    /// Classify a claim situation `a` against a situation `b`, usually an
    /// evidence chunk.
    ///
    /// The situation vectors are compared first. When either side holds more
    /// than one structure, one fact is diluted in the bundle, so structures
    /// are also compared pairwise:
    ///
    /// - any contradictory pair makes the situations contradictory
    /// - otherwise, when every structure of `a` is consistent with some
    ///   structure of `b`, they are consistent, scored by the weakest match
    ///
    /// The returned similarities are those of the vectors the label rests on.
    /// A situation with no encoded structure says nothing, so it is unrelated
    /// to everything.
    pub fn compare_situations(
        &self,
        a: &EncodedSituation,
        b: &EncodedSituation,
    ) -> VsaResult<Comparison> {
        if a.is_empty() || b.is_empty() {
            return Ok(Comparison {
                label: Label::Unrelated,
                score: 1.0,
                direct: 0.0,
                negated: 0.0,
            });
        }
        let whole = self.compare(&a.vector, &b.vector)?;
        if whole.label == Label::Contradictory
            || (a.structures.len() <= 1 && b.structures.len() <= 1)
        {
            return Ok(whole);
        }

        let mut contradiction: Option<Comparison> = None;
        let mut weakest: Option<Comparison> = None;
        let mut covered = true;
        for left in &a.structures {
            let mut best: Option<Comparison> = None;
            for right in &b.structures {
                let cmp = self.compare(&left.vector, &right.vector)?;
                match cmp.label {
                    Label::Contradictory
                        if contradiction.is_none_or(|c| cmp.score > c.score) =>
                    {
                        contradiction = Some(cmp);
                    }
                    Label::Consistent if best.is_none_or(|c| cmp.score > c.score) => {
                        best = Some(cmp);
                    }
                    _ => {}
                }
            }
            match best {
                Some(found) if weakest.is_none_or(|w| found.score < w.score) => {
                    weakest = Some(found);
                }
                Some(_) => {}
                None => covered = false,
            }
        }

        let (label, decided) = match (contradiction, weakest) {
            (Some(cmp), _) => (Label::Contradictory, cmp),
            _ if whole.label == Label::Consistent => (Label::Consistent, whole),
            (None, Some(cmp)) if covered => (Label::Consistent, cmp),
            _ => (whole.label, whole),
        };
        tracing::trace!(
            %label,
            claim = %a.chunk_id,
            evidence = %b.chunk_id,
            "compared situations structure by structure"
        );
        Ok(decided)
    }

    fn classify(&self, direct: f32, negated: f32) -> Comparison {
        let (label, score) =
            if negated >= self.config.contradiction_threshold && negated > direct {
                (Label::Contradictory, negated)
            } else if direct >= self.config.consistency_threshold {
                (Label::Consistent, direct)
            } else {
                (Label::Unrelated, 1.0 - direct.abs().max(negated.abs()))
            };
        tracing::trace!(%label, score, direct, negated, "compared claims");
        Comparison {
            label,
            score,
            direct,
            negated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{Actor, Extraction, ExtractionRecord, StateRecord, VerbPhrase};
    use crate::vsa::encode::SituationEncoder;
    use crate::vsa::Dimension;

    fn ontology() -> Ontology {
        Ontology::legal(Dimension::DEFAULT, 5).unwrap()
    }

    fn breach(negated: bool) -> ExtractionRecord {
        ExtractionRecord::VerbPhrase(VerbPhrase {
            agent: "Acme Pty Ltd".into(),
            verb: "breached".into(),
            patient: Some("contract".into()),
            negated,
        })
    }

    fn case(plaintiff: &str) -> Extraction {
        Extraction::new(
            plaintiff,
            vec![
                ExtractionRecord::Actor(Actor {
                    name: plaintiff.into(),
                    entity_type: "person".into(),
                    role: Some("plaintiff".into()),
                }),
                breach(false),
                ExtractionRecord::State(StateRecord {
                    subject: "contract".into(),
                    attribute: "status".into(),
                    value: "terminated".into(),
                    negated: false,
                }),
            ],
        )
    }

    #[test]
    fn identical_claims_are_consistent() {
        let ontology = ontology();
        let detector = ContradictionDetector::new(&ontology, ContradictionConfig::default()).unwrap();
        let encoded = SituationEncoder::new(&ontology).encode(&case("Smith"));
        let cmp = detector.compare_situations(&encoded, &encoded).unwrap();
        assert_eq!(cmp.label, Label::Consistent);
        assert!((cmp.score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn negated_claim_is_contradictory() {
        let ontology = ontology();
        let detector = ContradictionDetector::new(&ontology, ContradictionConfig::default()).unwrap();
        let encoder = SituationEncoder::new(&ontology);
        let claim = encoder.encode(&Extraction::new("claim", vec![breach(false)]));
        let denial = encoder.encode(&Extraction::new("denial", vec![breach(true)]));
        let cmp = detector.compare_situations(&claim, &denial).unwrap();
        assert_eq!(cmp.label, Label::Contradictory);
        assert!(cmp.score > 0.99);
        assert!(cmp.direct.abs() < 0.1);
    }

    #[test]
    fn different_plaintiff_is_unrelated_not_contradictory() {
        let ontology = ontology();
        let detector = ContradictionDetector::new(&ontology, ContradictionConfig::default()).unwrap();
        let encoder = SituationEncoder::new(&ontology);
        let smith = encoder.encode(&case("Smith"));
        let jones = encoder.encode(&case("Jones"));
        let cmp = detector.compare_situations(&smith, &jones).unwrap();
        assert_eq!(cmp.label, Label::Unrelated, "{cmp:?}");
        // Two of three structures agree and the actor shares two of three pairs.
        assert!(cmp.direct > 0.6 && cmp.direct < 0.8, "direct={}", cmp.direct);
        assert!(cmp.negated.abs() < 0.1);
    }

    #[test]
    fn contradiction_score_is_symmetric_under_negation() {
        let ontology = ontology();
        let detector = ContradictionDetector::new(&ontology, ContradictionConfig::default()).unwrap();
        let encoder = SituationEncoder::new(&ontology);
        let a = encoder.encode(&case("Smith")).vector;
        let b = encoder.encode(&case("Jones")).vector;
        let not_a = detector.negate(&a).unwrap();
        let not_b = detector.negate(&b).unwrap();
        assert_eq!(
            detector.contradiction_score(&a, &not_b).unwrap(),
            detector.contradiction_score(&not_a, &b).unwrap()
        );
        assert_eq!(detector.negate(&not_a).unwrap(), a);
    }

    #[test]
    fn thresholds_are_inclusive() {
        let ontology = Ontology::new(Dimension::TEST, 1).unwrap();
        let detector = ContradictionDetector::new(
            &ontology,
            ContradictionConfig {
                consistency_threshold: 0.5,
                contradiction_threshold: 0.5,
            },
        )
        .unwrap();
        assert_eq!(detector.classify(0.5, 0.0).label, Label::Consistent);
        assert_eq!(detector.classify(0.0, 0.5).label, Label::Contradictory);
        assert_eq!(detector.classify(0.49, 0.1).label, Label::Unrelated);
        assert!((detector.classify(0.49, 0.1).score - 0.51).abs() < 1e-6);
        // Negated must beat direct to win.
        assert_eq!(detector.classify(0.9, 0.9).label, Label::Consistent);
    }

    #[test]
    fn empty_situation_is_unrelated() {
        let ontology = ontology();
        let detector = ContradictionDetector::new(&ontology, ContradictionConfig::default()).unwrap();
        let encoder = SituationEncoder::new(&ontology);
        let empty = encoder.encode(&Extraction::default());
        let full = encoder.encode(&case("Smith"));
        assert_eq!(
            detector.compare_situations(&empty, &full).unwrap().label,
            Label::Unrelated
        );
    }

    #[test]
    fn single_fact_claim_found_in_evidence_chunk() {
        let ontology = ontology();
        let detector = ContradictionDetector::new(&ontology, ContradictionConfig::default()).unwrap();
        let encoder = SituationEncoder::new(&ontology);
        let evidence = encoder.encode(&case("Smith"));
        let claim = encoder.encode(&Extraction::new("claim", vec![breach(false)]));

        let whole = detector.compare(&claim.vector, &evidence.vector).unwrap();
        assert!(whole.direct < 0.8, "direct={}", whole.direct);

        let cmp = detector.compare_situations(&claim, &evidence).unwrap();
        assert_eq!(cmp.label, Label::Consistent, "{cmp:?}");
        assert!(cmp.score > 0.99);
    }

    #[test]
    fn single_fact_denial_contradicts_evidence_chunk() {
        let ontology = ontology();
        let detector = ContradictionDetector::new(&ontology, ContradictionConfig::default()).unwrap();
        let encoder = SituationEncoder::new(&ontology);
        let evidence = encoder.encode(&case("Smith"));
        let denial = encoder.encode(&Extraction::new("denial", vec![breach(true)]));

        let cmp = detector.compare_situations(&denial, &evidence).unwrap();
        assert_eq!(cmp.label, Label::Contradictory, "{cmp:?}");
        assert!(cmp.negated > 0.99);
        assert_eq!(
            detector.compare_situations(&evidence, &denial).unwrap().label,
            Label::Contradictory
        );
    }

    #[test]
    fn partially_covered_claim_stays_unrelated() {
        let ontology = ontology();
        let detector = ContradictionDetector::new(&ontology, ContradictionConfig::default()).unwrap();
        let encoder = SituationEncoder::new(&ontology);
        let evidence = encoder.encode(&Extraction::new("evidence", vec![breach(false)]));
        let claim = encoder.encode(&case("Smith"));
        let cmp = detector.compare_situations(&claim, &evidence).unwrap();
        assert_eq!(cmp.label, Label::Unrelated, "{cmp:?}");
    }
}
