//! Reasoning over encoded situations.
//!
//! - [`contradiction`]: consistent / contradictory / unrelated classification
//!   of two hypervectors using the negation marker
//! - [`analogy`]: completion of partially bound target situations from a
//!   source situation
//! - [`validate`]: the anti-hallucination check of generated claims against
//!   retrieved evidence

pub mod analogy;
pub mod contradiction;
pub mod validate;

pub use analogy::{AnalogyCandidate, AnalogyConfig, AnalogyEngine, PartialSituation};
pub use contradiction::{
    Comparison, ContradictionConfig, ContradictionDetector, Label,
    DEFAULT_CONSISTENCY_THRESHOLD, DEFAULT_CONTRADICTION_THRESHOLD,
};
pub use validate::{ClaimStatus, ClaimVerdict, ValidationReport, Validator, ValidatorConfig};
