//! Agent-specific error types with rich miette diagnostics.

use miette::Diagnostic;
use thiserror::Error;

/// Errors from building or querying a generative model.
///
/// Every malformed model is rejected here at construction, so inference
/// never sees one.
#[derive(Debug, Error, Diagnostic)]
pub enum ModelError {
    #[error("{what} must be greater than zero")]
    #[diagnostic(
        code(auslex::model::zero_cardinality),
        help("A model needs at least one state, one action and one observation.")
    )]
    ZeroCardinality { what: &'static str },

    #[error("matrix {matrix} has the wrong shape at {index}: expected {expected}, found {actual}")]
    #[diagnostic(
        code(auslex::model::shape),
        help(
            "A is [state][observation], B is [action][from-state][to-state], \
             C is [observation] and D is [state]."
        )
    )]
    Shape {
        matrix: &'static str,
        index: String,
        expected: usize,
        actual: usize,
    },

    #[error("matrix {matrix} has invalid entry {value} at {index}")]
    #[diagnostic(
        code(auslex::model::invalid_entry),
        help(
            "Probabilities must be finite and non-negative. Preferences (C) are \
             log-probabilities and may be -inf, but never NaN or +inf."
        )
    )]
    InvalidEntry {
        matrix: &'static str,
        index: String,
        value: f64,
    },

    #[error("distribution {matrix}{index} sums to {sum}, not 1")]
    #[diagnostic(
        code(auslex::model::not_normalized),
        help("Every row of A and B, and D itself, must sum to 1 within 1e-6.")
    )]
    NotNormalized {
        matrix: &'static str,
        index: String,
        sum: f64,
    },

    #[error("{what} {index} is out of range (model has {len})")]
    #[diagnostic(
        code(auslex::model::out_of_range),
        help("Indices are zero-based and must be below the model's cardinality.")
    )]
    OutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },

    #[error("failed to parse model: {message}")]
    #[diagnostic(
        code(auslex::model::parse),
        help("Model files are TOML or JSON with num_states, num_actions, num_observations, a, b, c and d.")
    )]
    Parse { message: String },

    #[error("sampling failed: {message}")]
    #[diagnostic(code(auslex::model::sampling))]
    Sampling { message: String },
}

/// Errors from running the active inference agent.
#[derive(Debug, Error, Diagnostic)]
pub enum AgentError {
    #[error("episode has terminated")]
    #[diagnostic(
        code(auslex::agent::terminated),
        help("Call `reset()` to start a new episode.")
    )]
    EpisodeTerminated,

    #[error("environment has no observation left after {responded} responses")]
    #[diagnostic(
        code(auslex::agent::environment_exhausted),
        help("A scripted environment answers only as many actions as it has observations.")
    )]
    EnvironmentExhausted { responded: usize },

    #[error("cannot {operation} while {phase}")]
    #[diagnostic(
        code(auslex::agent::invalid_phase),
        help("Phases run perceive → plan → act. Use `step()` to run a full cycle.")
    )]
    InvalidPhase {
        operation: &'static str,
        phase: String,
    },

    #[error("observation {observation} is out of range (model has {num_observations})")]
    #[diagnostic(code(auslex::agent::observation_range))]
    ObservationOutOfRange {
        observation: usize,
        num_observations: usize,
    },

    #[error("action {action} is out of range (model has {num_actions})")]
    #[diagnostic(code(auslex::agent::action_range))]
    ActionOutOfRange { action: usize, num_actions: usize },

    #[error("no policy has a finite expected free energy ({policies} evaluated)")]
    #[diagnostic(
        code(auslex::agent::planning_failure),
        help(
            "Every policy reaches an observation with preference -inf. Relax the \
             preferences in C or extend the action set."
        )
    )]
    PlanningFailure { policies: usize },

    #[error("policy space too large: {count} policies exceed the limit of {max}")]
    #[diagnostic(
        code(auslex::agent::policy_space),
        help("Lower the planning horizon or raise `max_policies`.")
    )]
    PolicySpaceTooLarge { count: String, max: usize },

    #[error("invalid agent configuration: {message}")]
    #[diagnostic(code(auslex::agent::config), help("{message}"))]
    InvalidConfig { message: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Model(#[from] ModelError),
}

/// Convenience alias for agent operations.
pub type AgentResult<T> = std::result::Result<T, AgentError>;

/// Convenience alias for model operations.
pub type ModelResult<T> = std::result::Result<T, ModelError>;
