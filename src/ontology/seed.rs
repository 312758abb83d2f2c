//! Seed vocabularies: TOML-defined symbol lists that bootstrap an ontology.
//!
//! The Australian legal vocabulary is bundled into the binary; callers may
//! parse and apply their own vocabularies the same way.

use serde::Deserialize;

use crate::error::OntologyError;
use crate::symbol::SymbolKind;

use super::{Ontology, OntologyResult};

const LEGAL_TOML: &str = include_str!("../../data/ontology/legal.toml");

/// A parsed seed vocabulary.
#[derive(Debug, Clone, Deserialize)]
pub struct Vocabulary {
    #[serde(rename = "vocabulary")]
    pub meta: VocabularyMeta,
    #[serde(default)]
    pub symbols: VocabularySymbols,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VocabularyMeta {
    pub id: String,
    pub version: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VocabularySymbols {
    #[serde(default)]
    pub markers: Vec<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub concepts: Vec<String>,
}

impl Vocabulary {
    /// Parse a vocabulary from TOML.
    pub fn parse(toml_str: &str) -> OntologyResult<Self> {
        toml::from_str(toml_str).map_err(|e| OntologyError::SeedParse {
            message: e.to_string(),
        })
    }

    /// The bundled Australian legal vocabulary.
    pub fn legal() -> OntologyResult<Self> {
        Self::parse(LEGAL_TOML)
    }

    /// All entries paired with their kind, markers first.
    pub fn entries(&self) -> impl Iterator<Item = (&str, SymbolKind)> {
        let markers = self.symbols.markers.iter().map(|n| (n.as_str(), SymbolKind::Marker));
        let roles = self.symbols.roles.iter().map(|n| (n.as_str(), SymbolKind::Role));
        let concepts = self
            .symbols
            .concepts
            .iter()
            .map(|n| (n.as_str(), SymbolKind::Concept));
        markers.chain(roles).chain(concepts)
    }
}

/// Report after applying a vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedReport {
    pub id: String,
    pub created: usize,
    pub already_present: usize,
}

/// Create every symbol of `vocab` in `ontology`.
///
/// Symbols that already exist with the same kind are counted, not
/// recreated; a kind conflict aborts with an error.
pub fn apply(ontology: &Ontology, vocab: &Vocabulary) -> OntologyResult<SeedReport> {
    let mut created = 0;
    let mut already_present = 0;
    for (name, kind) in vocab.entries() {
        let existed = ontology.contains(name);
        ontology.get_or_create(name, kind)?;
        if existed {
            already_present += 1;
        } else {
            created += 1;
        }
    }
    tracing::debug!(
        vocabulary = %vocab.meta.id,
        created,
        already_present,
        "applied seed vocabulary"
    );
    Ok(SeedReport {
        id: vocab.meta.id.clone(),
        created,
        already_present,
    })
}
