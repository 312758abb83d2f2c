// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # auslex
//!
//! Neuro-symbolic reasoning core for Australian legal text: structured
//! extractions are encoded as hypervectors, checked for contradictions and
//! analogies against an ontology, validated against evidence, and an active
//! inference agent plans over a discrete POMDP.
//!
//! ## Architecture
//!
//! - **VSA core** (`vsa`): bit-packed bipolar hypervectors, 10,000 dimensions by default
//! - **SIMD acceleration** (`simd`): runtime-dispatched AVX2/generic kernels
//! - **Ontology** (`ontology`): concept, role and marker symbols with lazily derived vectors
//! - **Extraction** (`extract`): the closed set of records an extractor produces
//! - **Reasoning** (`reason`): contradiction detection, analogy, claim validation
//! - **Agent** (`agent`): generative model, belief updating, expected free energy planning
//!
//! ## Library usage
//!
//! ```no_run
//! use auslex::extract::Extraction;
//! use auslex::ontology::Ontology;
//! use auslex::reason::{ContradictionConfig, ContradictionDetector};
//! use auslex::vsa::encode::SituationEncoder;
//! use auslex::vsa::Dimension;
//!
//! let ontology = Ontology::legal(Dimension::DEFAULT, 0).unwrap();
//! let encoder = SituationEncoder::new(&ontology);
//! let a = encoder.encode(&Extraction::from_json(
//!     r#"[{"type": "verb_phrase", "agent": "Acme", "verb": "breached", "patient": "contract"}]"#,
//! ));
//! let b = encoder.encode(&Extraction::from_json(
//!     r#"[{"type": "verb_phrase", "agent": "Acme", "verb": "breached", "patient": "contract", "negated": true}]"#,
//! ));
//! let detector = ContradictionDetector::new(&ontology, ContradictionConfig::default()).unwrap();
//! println!("{}", detector.compare_situations(&a, &b).unwrap().label);
//! ```

pub mod agent;
pub mod config;
pub mod error;
pub mod extract;
pub mod ontology;
pub mod reason;
pub mod simd;
pub mod symbol;
pub mod vsa;
