//! Anti-hallucination validation of generated claims against evidence.
//!
//! Every claim is checked against every evidence situation and every
//! evidence structure. A contradiction anywhere wins; otherwise a claim is
//! supported when its whole vector matches some target, or when each of its
//! structures is matched by some evidence structure. Structure-level coverage
//! keeps a multi-fact claim from being diluted below the consistency
//! threshold when its facts are spread over several chunks.

use serde::{Deserialize, Serialize};

use crate::vsa::encode::EncodedSituation;
use crate::vsa::ops::VsaResult;
use crate::vsa::HyperVec;

use super::contradiction::{ContradictionDetector, Label};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidatorConfig {
    /// Fraction of claims that must be supported for the report to pass.
    pub min_support_ratio: f64,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            min_support_ratio: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClaimStatus {
    Supported,
    Unsupported,
    Contradicted,
}

impl std::fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ClaimStatus::Supported => "supported",
            ClaimStatus::Unsupported => "unsupported",
            ClaimStatus::Contradicted => "contradicted",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimVerdict {
    pub claim_id: String,
    pub status: ClaimStatus,
    /// Contradiction score, support score, or best direct similarity for
    /// unsupported claims.
    pub score: f32,
    /// Evidence chunk the verdict rests on.
    pub evidence_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub passed: bool,
    pub verdicts: Vec<ClaimVerdict>,
    pub supported: usize,
    pub unsupported: usize,
    pub contradicted: usize,
    pub supported_ratio: f64,
}

/// A comparison target: an evidence situation or one of its structures.
struct Target<'e> {
    evidence_id: &'e str,
    vector: &'e HyperVec,
    is_structure: bool,
}

/// Checks claims against evidence. Holds no mutable state.
#[derive(Debug)]
pub struct Validator<'d, 'o> {
    detector: &'d ContradictionDetector<'o>,
    config: ValidatorConfig,
}

impl<'d, 'o> Validator<'d, 'o> {
    pub fn new(detector: &'d ContradictionDetector<'o>, config: ValidatorConfig) -> Self {
        Self { detector, config }
    }

    /// Validate each claim against all evidence.
    pub fn validate(
        &self,
        claims: &[EncodedSituation],
        evidence: &[EncodedSituation],
    ) -> VsaResult<ValidationReport> {
        let targets: Vec<Target<'_>> = evidence
            .iter()
            .filter(|e| !e.is_empty())
            .flat_map(|e| {
                std::iter::once(Target {
                    evidence_id: &e.chunk_id,
                    vector: &e.vector,
                    is_structure: false,
                })
                .chain(e.structures.iter().map(move |s| Target {
                    evidence_id: &e.chunk_id,
                    vector: &s.vector,
                    is_structure: true,
                }))
            })
            .collect();

        let verdicts = claims
            .iter()
            .map(|claim| self.judge(claim, &targets))
            .collect::<VsaResult<Vec<_>>>()?;

        let count = |status: ClaimStatus| verdicts.iter().filter(|v| v.status == status).count();
        let supported = count(ClaimStatus::Supported);
        let unsupported = count(ClaimStatus::Unsupported);
        let contradicted = count(ClaimStatus::Contradicted);
        let supported_ratio = if verdicts.is_empty() {
            1.0
        } else {
            supported as f64 / verdicts.len() as f64
        };
        let passed = contradicted == 0 && supported_ratio >= self.config.min_support_ratio;

        tracing::debug!(
            claims = verdicts.len(),
            evidence = evidence.len(),
            supported,
            unsupported,
            contradicted,
            passed,
            "validated claims"
        );

        Ok(ValidationReport {
            passed,
            verdicts,
            supported,
            unsupported,
            contradicted,
            supported_ratio,
        })
    }

    fn judge(&self, claim: &EncodedSituation, targets: &[Target<'_>]) -> VsaResult<ClaimVerdict> {
        let verdict = |status, score, evidence_id: Option<&str>| ClaimVerdict {
            claim_id: claim.chunk_id.clone(),
            status,
            score,
            evidence_id: evidence_id.map(str::to_string),
        };

        if claim.is_empty() || targets.is_empty() {
            return Ok(verdict(ClaimStatus::Unsupported, 0.0, None));
        }

        // Contradiction: whole claim or any claim structure against any target.
        let mut contradiction: Option<(f32, &str)> = None;
        let claim_vectors =
            std::iter::once(&claim.vector).chain(claim.structures.iter().map(|s| &s.vector));
        for vector in claim_vectors {
            for target in targets {
                let cmp = self.detector.compare(vector, target.vector)?;
                if cmp.label == Label::Contradictory
                    && contradiction.is_none_or(|(best, _)| cmp.score > best)
                {
                    contradiction = Some((cmp.score, target.evidence_id));
                }
            }
        }
        if let Some((score, evidence_id)) = contradiction {
            return Ok(verdict(ClaimStatus::Contradicted, score, Some(evidence_id)));
        }

        // Support by the whole claim vector.
        let mut best_direct: Option<(f32, &str)> = None;
        let mut support: Option<(f32, &str)> = None;
        for target in targets {
            let cmp = self.detector.compare(&claim.vector, target.vector)?;
            if best_direct.is_none_or(|(best, _)| cmp.direct > best) {
                best_direct = Some((cmp.direct, target.evidence_id));
            }
            if cmp.label == Label::Consistent && support.is_none_or(|(best, _)| cmp.score > best) {
                support = Some((cmp.score, target.evidence_id));
            }
        }
        if let Some((score, evidence_id)) = support {
            return Ok(verdict(ClaimStatus::Supported, score, Some(evidence_id)));
        }

        // Support by structure coverage; the weakest structure sets the score.
        if let Some((score, evidence_id)) = self.coverage(claim, targets)? {
            return Ok(verdict(ClaimStatus::Supported, score, Some(evidence_id)));
        }

        let (score, evidence_id) = best_direct.map_or((0.0, None), |(s, id)| (s, Some(id)));
        Ok(verdict(ClaimStatus::Unsupported, score, evidence_id))
    }

    fn coverage<'e>(
        &self,
        claim: &EncodedSituation,
        targets: &[Target<'e>],
    ) -> VsaResult<Option<(f32, &'e str)>> {
        let mut weakest: Option<(f32, &'e str)> = None;
        for structure in &claim.structures {
            let mut best: Option<(f32, &'e str)> = None;
            for target in targets.iter().filter(|t| t.is_structure) {
                let cmp = self.detector.compare(&structure.vector, target.vector)?;
                if cmp.label == Label::Consistent && best.is_none_or(|(b, _)| cmp.score > b) {
                    best = Some((cmp.score, target.evidence_id));
                }
            }
            let Some(found) = best else {
                return Ok(None);
            };
            if weakest.is_none_or(|(w, _)| found.0 < w) {
                weakest = Some(found);
            }
        }
        Ok(weakest)
    }
}
