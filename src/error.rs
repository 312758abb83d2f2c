//! Rich diagnostic error types for the auslex core.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes and help text so callers know what went wrong and how
//! to fix it. Recoverable conditions (encoding warnings, belief collapse,
//! malformed extractor output) are not errors; they are reported on the
//! result values instead.

use miette::Diagnostic;
use thiserror::Error;

pub use crate::agent::error::{AgentError, ModelError};

/// Top-level error type for the auslex core.
///
/// Each variant wraps a subsystem-specific error, preserving the full
/// diagnostic chain through to the user.
#[derive(Debug, Error, Diagnostic)]
pub enum AuslexError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Vsa(#[from] VsaError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Ontology(#[from] OntologyError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Agent(#[from] AgentError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}

/// Convenience result alias for the top-level error.
pub type AuslexResult<T> = std::result::Result<T, AuslexError>;

// ---------------------------------------------------------------------------
// VSA errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum VsaError {
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    #[diagnostic(
        code(auslex::vsa::dim_mismatch),
        help(
            "All hypervectors in an operation must share the same dimension. \
             Encode both operands with the same ontology, or rebuild the \
             ontology with the dimension the stored vectors were created with."
        )
    )]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("empty bundle: cannot bundle zero hypervectors")]
    #[diagnostic(
        code(auslex::vsa::empty_bundle),
        help("Provide at least one hypervector to the bundle operation.")
    )]
    EmptyBundle,

    #[error("invalid dimension: {dim}")]
    #[diagnostic(
        code(auslex::vsa::invalid_dimension),
        help("Hypervector dimension must be greater than zero; 10,000 is the usual choice.")
    )]
    InvalidDimension { dim: usize },
}

// ---------------------------------------------------------------------------
// Ontology errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum OntologyError {
    #[error("empty symbol name")]
    #[diagnostic(
        code(auslex::ontology::empty_name),
        help("Symbol names must contain at least one non-whitespace character.")
    )]
    EmptyName,

    #[error("symbol \"{name}\" is registered as {existing}, not {requested}")]
    #[diagnostic(
        code(auslex::ontology::kind_conflict),
        help(
            "A symbol name maps to exactly one kind. Use a prefixed name \
             (for example `attr:role` for a role) to keep vocabularies apart."
        )
    )]
    KindConflict {
        name: String,
        existing: String,
        requested: String,
    },

    #[error("unknown symbol: \"{name}\"")]
    #[diagnostic(
        code(auslex::ontology::unknown_symbol),
        help("The symbol has not been created in this ontology. Encode it first.")
    )]
    UnknownSymbol { name: String },

    #[error("failed to parse seed vocabulary: {message}")]
    #[diagnostic(
        code(auslex::ontology::seed_parse),
        help("Check the seed vocabulary TOML syntax.")
    )]
    SeedParse { message: String },

    #[error("analogy requires three distinct symbols, got {count}")]
    #[diagnostic(
        code(auslex::ontology::invalid_analogy),
        help("Proportional analogy computes a : b :: c : ? and needs three different symbols.")
    )]
    InvalidAnalogy { count: usize },

    #[error("symbol allocator exhausted")]
    #[diagnostic(
        code(auslex::ontology::exhausted),
        help("The symbol ID space is exhausted. Check for symbol creation loops.")
    )]
    AllocatorExhausted,

    #[error("symbol table snapshot error: {message}")]
    #[diagnostic(
        code(auslex::ontology::snapshot),
        help(
            "The snapshot could not be encoded or decoded, or its vectors do not \
             match the declared dimension. Re-export it from a live ontology."
        )
    )]
    Snapshot { message: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Vsa(#[from] VsaError),
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read {path}")]
    #[diagnostic(code(auslex::config::read), help("Ensure the file exists and is readable."))]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}")]
    #[diagnostic(
        code(auslex::config::write),
        help("Check that the parent directory exists and is writable.")
    )]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {message}")]
    #[diagnostic(
        code(auslex::config::parse),
        help("Check the TOML syntax. Every key is optional; unknown keys are rejected.")
    )]
    Parse { path: String, message: String },

    #[error("invalid configuration: {message}")]
    #[diagnostic(code(auslex::config::invalid), help("{message}"))]
    Invalid { message: String },
}
