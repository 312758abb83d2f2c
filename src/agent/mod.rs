//! Agent layer: active inference over a discrete POMDP.
//!
//! - **Generative model** (`A`, `B`, `C`, `D`), validated at construction
//! - **Belief updating** by Bayes' rule with a collapse fallback
//! - **Planning** by exhaustive policy enumeration and expected free energy
//! - **Agent** cycling Perceiving → Planning → Acting until terminal
//! - **Environments** the agent can be run against

pub mod agent;
pub mod belief;
pub mod environment;
pub mod error;
pub mod model;
pub mod policy;

pub use agent::{
    ActiveInferenceAgent, AgentConfig, EpisodeSummary, Perception, Phase, Plan, StepOutcome,
    Termination,
};
pub use environment::{Environment, ScriptedEnvironment, SimulatedEnvironment};
pub use error::{AgentError, AgentResult, ModelError, ModelResult};
pub use model::{GenerativeModel, ModelSpec};
pub use policy::{Evaluation, Policy};
