//! Environments the agent can act in.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;

use super::error::{AgentError, AgentResult};
use super::model::GenerativeModel;

/// Something that answers actions with observations.
pub trait Environment {
    /// Apply `action` and return the next observation.
    fn respond(&mut self, action: usize) -> AgentResult<usize>;
}

/// Replays a fixed observation sequence, ignoring the actions. Once the
/// sequence runs out it fails with [`AgentError::EnvironmentExhausted`]; the
/// agent's own episode is unaffected.
#[derive(Debug, Clone)]
pub struct ScriptedEnvironment {
    observations: std::vec::IntoIter<usize>,
    /// Actions received, in order.
    pub actions: Vec<usize>,
}

impl ScriptedEnvironment {
    pub fn new(observations: Vec<usize>) -> Self {
        Self {
            observations: observations.into_iter(),
            actions: Vec::new(),
        }
    }
}

impl Environment for ScriptedEnvironment {
    fn respond(&mut self, action: usize) -> AgentResult<usize> {
        self.actions.push(action);
        self.observations
            .next()
            .ok_or(AgentError::EnvironmentExhausted {
                responded: self.actions.len() - 1,
            })
    }
}

/// Samples hidden dynamics and observations from a generative model.
#[derive(Debug, Clone)]
pub struct SimulatedEnvironment {
    model: Arc<GenerativeModel>,
    state: usize,
    rng: StdRng,
}

impl SimulatedEnvironment {
    /// Start in a state drawn from the model's `D`.
    pub fn new(model: Arc<GenerativeModel>, seed: u64) -> AgentResult<Self> {
        let mut rng = StdRng::seed_from_u64(seed);
        let state = model.sample_initial_state(&mut rng)?;
        Ok(Self { model, state, rng })
    }

    /// Start in a given state.
    pub fn with_state(model: Arc<GenerativeModel>, state: usize, seed: u64) -> AgentResult<Self> {
        if state >= model.num_states() {
            return Err(crate::error::ModelError::OutOfRange {
                what: "state",
                index: state,
                len: model.num_states(),
            }
            .into());
        }
        Ok(Self {
            model,
            state,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    /// Hidden state.
    pub fn state(&self) -> usize {
        self.state
    }

    /// Sample an observation of the current state without moving.
    pub fn observe(&mut self) -> AgentResult<usize> {
        Ok(self.model.sample_observation(self.state, &mut self.rng)?)
    }
}

impl Environment for SimulatedEnvironment {
    fn respond(&mut self, action: usize) -> AgentResult<usize> {
        if action >= self.model.num_actions() {
            return Err(AgentError::ActionOutOfRange {
                action,
                num_actions: self.model.num_actions(),
            });
        }
        self.state = self
            .model
            .sample_transition(self.state, action, &mut self.rng)?;
        let observation = self.observe()?;
        tracing::trace!(action, state = self.state, observation, "environment step");
        Ok(observation)
    }
}
