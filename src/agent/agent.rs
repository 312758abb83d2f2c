//! The active inference agent: perceive → plan → act.
//!
//! The agent holds a belief over hidden states and, each cycle, updates it
//! from an observation, scores every policy by expected free energy and
//! emits the first action of the best one.
//!
//! ```text
//! Idle ─perceive─▶ Planning ─plan─▶ Acting ─act─▶ Perceiving ─perceive─▶ …
//!         │                                  │
//!         └── terminal observation ──────────┴── max_steps ──▶ Terminal
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::belief::{self, softmax};
use super::environment::Environment;
use super::error::{AgentError, AgentResult};
use super::model::GenerativeModel;
use super::policy::{self, Evaluation, Policy};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AgentConfig {
    /// Longest policy considered (default: 2).
    pub horizon: usize,
    /// Actions per episode before termination (default: 16).
    pub max_steps: usize,
    /// Inverse temperature γ of the policy posterior (default: 16).
    pub policy_precision: f64,
    /// Observations that end the episode when perceived.
    pub terminal_observations: Vec<usize>,
    /// Upper bound on enumerated policies (default: 4096).
    pub max_policies: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            horizon: 2,
            max_steps: 16,
            policy_precision: 16.0,
            terminal_observations: Vec::new(),
            max_policies: 4096,
        }
    }
}

// ---------------------------------------------------------------------------
// Cycle types
// ---------------------------------------------------------------------------

/// Where the agent is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Perceiving,
    Planning,
    Acting,
    Terminal,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Phase::Idle => "idle",
            Phase::Perceiving => "perceiving",
            Phase::Planning => "planning",
            Phase::Acting => "acting",
            Phase::Terminal => "terminal",
        };
        f.write_str(s)
    }
}

/// Result of the perceiving phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Perception {
    pub observation: usize,
    pub belief: Vec<f64>,
    /// The observation was impossible under the prior.
    pub belief_collapse: bool,
    /// The observation ended the episode.
    pub terminal: bool,
}

/// Result of the planning phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    /// Every policy with its expected free energy, in enumeration order.
    pub evaluations: Vec<Evaluation>,
    /// `softmax(−γ·G)` over `evaluations`.
    pub posterior: Vec<f64>,
    /// Index of the chosen policy in `evaluations`.
    pub selected: usize,
}

impl Plan {
    pub fn selected(&self) -> &Evaluation {
        &self.evaluations[self.selected]
    }

    pub fn policy(&self) -> &Policy {
        &self.selected().policy
    }

    pub fn action(&self) -> Option<usize> {
        self.policy().first()
    }
}

/// Result of one full cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepOutcome {
    pub observation: usize,
    pub belief: Vec<f64>,
    pub belief_collapse: bool,
    /// `None` when the observation ended the episode.
    pub action: Option<usize>,
    pub policy: Option<Policy>,
    pub expected_free_energy: Option<f64>,
    pub phase: Phase,
}

/// Why an episode ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    Observation(usize),
    MaxSteps,
}

/// Trace of a full episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeSummary {
    pub observations: Vec<usize>,
    pub actions: Vec<usize>,
    pub belief_collapses: usize,
    pub termination: Termination,
    pub final_belief: Vec<f64>,
}

// ---------------------------------------------------------------------------
// Agent
// ---------------------------------------------------------------------------

/// An active inference agent over a discrete generative model.
#[derive(Debug, Clone)]
pub struct ActiveInferenceAgent {
    model: Arc<GenerativeModel>,
    config: AgentConfig,
    policies: Vec<Policy>,
    phase: Phase,
    belief: Vec<f64>,
    last_action: Option<usize>,
    last_plan: Option<Plan>,
    steps: usize,
}

impl ActiveInferenceAgent {
    /// Create an agent. The policy space is enumerated once here and
    /// rejected if it exceeds `config.max_policies`.
    pub fn new(model: Arc<GenerativeModel>, config: AgentConfig) -> AgentResult<Self> {
        if config.horizon == 0 {
            return Err(AgentError::InvalidConfig {
                message: "horizon must be at least 1".into(),
            });
        }
        if !config.policy_precision.is_finite() || config.policy_precision < 0.0 {
            return Err(AgentError::InvalidConfig {
                message: format!(
                    "policy_precision must be finite and non-negative, got {}",
                    config.policy_precision
                ),
            });
        }
        if let Some(&obs) = config
            .terminal_observations
            .iter()
            .find(|&&o| o >= model.num_observations())
        {
            return Err(AgentError::ObservationOutOfRange {
                observation: obs,
                num_observations: model.num_observations(),
            });
        }

        let policies = policy::enumerate(model.num_actions(), config.horizon, config.max_policies)?;
        tracing::info!(
            states = model.num_states(),
            actions = model.num_actions(),
            horizon = config.horizon,
            policies = policies.len(),
            "active inference agent ready"
        );

        let belief = model.initial_belief().to_vec();
        Ok(Self {
            model,
            config,
            policies,
            phase: Phase::Idle,
            belief,
            last_action: None,
            last_plan: None,
            steps: 0,
        })
    }

    pub fn model(&self) -> &Arc<GenerativeModel> {
        &self.model
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Current belief over hidden states.
    pub fn belief(&self) -> &[f64] {
        &self.belief
    }

    /// Actions taken this episode.
    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn last_action(&self) -> Option<usize> {
        self.last_action
    }

    pub fn last_plan(&self) -> Option<&Plan> {
        self.last_plan.as_ref()
    }

    pub fn policies(&self) -> &[Policy] {
        &self.policies
    }

    /// Start a new episode from the prior `D`.
    pub fn reset(&mut self) {
        self.phase = Phase::Idle;
        self.belief = self.model.initial_belief().to_vec();
        self.last_action = None;
        self.last_plan = None;
        self.steps = 0;
    }

    /// Update the belief with `observation`.
    pub fn perceive(&mut self, observation: usize) -> AgentResult<Perception> {
        match self.phase {
            Phase::Idle | Phase::Perceiving => {}
            Phase::Terminal => return Err(AgentError::EpisodeTerminated),
            phase => return Err(self.invalid("perceive", phase)),
        }
        if observation >= self.model.num_observations() {
            return Err(AgentError::ObservationOutOfRange {
                observation,
                num_observations: self.model.num_observations(),
            });
        }
        self.phase = Phase::Perceiving;

        let prior = match self.last_action {
            None => self.model.initial_belief().to_vec(),
            Some(action) => self.model.predict_states(&self.belief, action)?,
        };
        let likelihood = self.model.likelihood(observation)?;
        let update = belief::update(&likelihood, &prior);
        if update.collapsed {
            tracing::warn!(
                observation,
                step = self.steps,
                "observation impossible under prior, belief reset to its support"
            );
        }
        self.belief = update.belief;

        let terminal = self.config.terminal_observations.contains(&observation);
        self.phase = if terminal {
            tracing::debug!(observation, "terminal observation");
            Phase::Terminal
        } else {
            Phase::Planning
        };

        Ok(Perception {
            observation,
            belief: self.belief.clone(),
            belief_collapse: update.collapsed,
            terminal,
        })
    }

    /// Score every policy against the current belief and choose one.
    pub fn plan(&mut self) -> AgentResult<&Plan> {
        match self.phase {
            Phase::Planning => {}
            Phase::Terminal => return Err(AgentError::EpisodeTerminated),
            phase => return Err(self.invalid("plan", phase)),
        }

        let evaluations = self
            .policies
            .iter()
            .map(|p| policy::evaluate(&self.model, &self.belief, p))
            .collect::<Result<Vec<_>, _>>()?;

        let Some(selected) = policy::select(&evaluations) else {
            self.phase = Phase::Terminal;
            return Err(AgentError::PlanningFailure {
                policies: evaluations.len(),
            });
        };

        let neg_g: Vec<f64> = evaluations.iter().map(|e| -e.expected_free_energy).collect();
        let posterior = softmax(&neg_g, self.config.policy_precision);
        tracing::debug!(
            step = self.steps,
            policy = %evaluations[selected].policy,
            g = evaluations[selected].expected_free_energy,
            "selected policy"
        );

        self.phase = Phase::Acting;
        Ok(&*self.last_plan.insert(Plan {
            evaluations,
            posterior,
            selected,
        }))
    }

    /// Emit the first action of the chosen policy.
    pub fn act(&mut self) -> AgentResult<usize> {
        match self.phase {
            Phase::Acting => {}
            Phase::Terminal => return Err(AgentError::EpisodeTerminated),
            phase => return Err(self.invalid("act", phase)),
        }
        let action = self
            .last_plan
            .as_ref()
            .and_then(Plan::action)
            .ok_or_else(|| self.invalid("act", Phase::Acting))?;

        self.last_action = Some(action);
        self.steps += 1;
        self.phase = if self.steps >= self.config.max_steps {
            tracing::debug!(steps = self.steps, "step limit reached");
            Phase::Terminal
        } else {
            Phase::Perceiving
        };
        Ok(action)
    }

    /// Run one full cycle on `observation`.
    pub fn step(&mut self, observation: usize) -> AgentResult<StepOutcome> {
        let perception = self.perceive(observation)?;
        if perception.terminal {
            return Ok(StepOutcome {
                observation,
                belief: perception.belief,
                belief_collapse: perception.belief_collapse,
                action: None,
                policy: None,
                expected_free_energy: None,
                phase: self.phase,
            });
        }

        let plan = self.plan()?;
        let policy = plan.policy().clone();
        let g = plan.selected().expected_free_energy;
        let action = self.act()?;

        Ok(StepOutcome {
            observation,
            belief: perception.belief,
            belief_collapse: perception.belief_collapse,
            action: Some(action),
            policy: Some(policy),
            expected_free_energy: Some(g),
            phase: self.phase,
        })
    }

    /// Drive `env` from `first_observation` until the episode ends.
    pub fn run_episode<E: Environment + ?Sized>(
        &mut self,
        env: &mut E,
        first_observation: usize,
    ) -> AgentResult<EpisodeSummary> {
        let mut observations = Vec::new();
        let mut actions = Vec::new();
        let mut belief_collapses = 0;
        let mut observation = first_observation;

        let termination = loop {
            let outcome = self.step(observation)?;
            observations.push(observation);
            belief_collapses += usize::from(outcome.belief_collapse);

            let Some(action) = outcome.action else {
                break Termination::Observation(observation);
            };
            actions.push(action);
            if outcome.phase == Phase::Terminal {
                break Termination::MaxSteps;
            }
            observation = env.respond(action)?;
        };

        tracing::info!(
            steps = actions.len(),
            belief_collapses,
            ?termination,
            "episode finished"
        );
        Ok(EpisodeSummary {
            observations,
            actions,
            belief_collapses,
            termination,
            final_belief: self.belief.clone(),
        })
    }

    fn invalid(&self, operation: &'static str, phase: Phase) -> AgentError {
        AgentError::InvalidPhase {
            operation,
            phase: phase.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::model::ModelSpec;

    /// Identity likelihood; action `a` moves to state `a` from anywhere.
    fn goto_model(c: Vec<f64>) -> Arc<GenerativeModel> {
        Arc::new(
            GenerativeModel::new(ModelSpec {
                num_states: 2,
                num_actions: 2,
                num_observations: 2,
                a: vec![vec![1.0, 0.0], vec![0.0, 1.0]],
                b: vec![
                    vec![vec![1.0, 0.0], vec![1.0, 0.0]],
                    vec![vec![0.0, 1.0], vec![0.0, 1.0]],
                ],
                c,
                d: vec![0.5, 0.5],
            })
            .unwrap(),
        )
    }

    #[test]
    fn moves_toward_preferred_observation() {
        let mut agent = ActiveInferenceAgent::new(goto_model(vec![0.0, 2.0]), AgentConfig::default()).unwrap();
        let outcome = agent.step(0).unwrap();
        assert_eq!(outcome.action, Some(1));
        assert_eq!(outcome.policy, Some(Policy(vec![1])));
        assert_eq!(agent.phase(), Phase::Perceiving);
        assert_eq!(agent.steps(), 1);
    }

    #[test]
    fn phases_must_run_in_order() {
        let mut agent = ActiveInferenceAgent::new(goto_model(vec![0.0, 2.0]), AgentConfig::default()).unwrap();
        assert_eq!(agent.phase(), Phase::Idle);
        assert!(matches!(agent.plan(), Err(AgentError::InvalidPhase { operation: "plan", .. })));
        assert!(matches!(agent.act(), Err(AgentError::InvalidPhase { .. })));
        agent.perceive(0).unwrap();
        assert_eq!(agent.phase(), Phase::Planning);
        assert!(matches!(agent.perceive(0), Err(AgentError::InvalidPhase { .. })));
        agent.plan().unwrap();
        assert_eq!(agent.act().unwrap(), 1);
    }

    #[test]
    fn belief_stays_normalised() {
        let spec = ModelSpec {
            num_states: 3,
            num_actions: 2,
            num_observations: 2,
            a: vec![vec![0.7, 0.3], vec![0.4, 0.6], vec![0.1, 0.9]],
            b: vec![
                vec![vec![0.8, 0.2, 0.0], vec![0.1, 0.8, 0.1], vec![0.0, 0.2, 0.8]],
                vec![vec![0.2, 0.8, 0.0], vec![0.0, 0.2, 0.8], vec![0.8, 0.0, 0.2]],
            ],
            c: vec![0.0, 1.0],
            d: vec![0.2, 0.3, 0.5],
        };
        let model = Arc::new(GenerativeModel::new(spec).unwrap());
        let mut agent = ActiveInferenceAgent::new(model, AgentConfig::default()).unwrap();
        for obs in [0, 1, 1, 0, 1, 0, 0, 1] {
            let outcome = agent.step(obs).unwrap();
            let sum: f64 = outcome.belief.iter().sum();
            assert!((sum - 1.0).abs() < 1e-6, "sum={sum}");
            assert!(outcome.belief.iter().all(|&p| p >= 0.0));
        }
    }

    #[test]
    fn planning_is_deterministic() {
        let model = goto_model(vec![0.0, 1.0]);
        let mut a = ActiveInferenceAgent::new(model.clone(), AgentConfig::default()).unwrap();
        let mut b = ActiveInferenceAgent::new(model, AgentConfig::default()).unwrap();
        for obs in [0, 1, 1] {
            assert_eq!(a.step(obs).unwrap(), b.step(obs).unwrap());
        }
        assert_eq!(a.last_plan(), b.last_plan());
    }

    #[test]
    fn impossible_observation_collapses_to_support() {
        // Both actions lead to state 0, which never emits observation 1.
        let spec = ModelSpec {
            num_states: 2,
            num_actions: 1,
            num_observations: 2,
            a: vec![vec![1.0, 0.0], vec![0.0, 1.0]],
            b: vec![vec![vec![1.0, 0.0], vec![1.0, 0.0]]],
            c: vec![0.0, 0.0],
            d: vec![0.5, 0.5],
        };
        let mut agent =
            ActiveInferenceAgent::new(Arc::new(GenerativeModel::new(spec).unwrap()), AgentConfig::default())
                .unwrap();
        assert!(!agent.step(0).unwrap().belief_collapse);
        let outcome = agent.step(1).unwrap();
        assert!(outcome.belief_collapse);
        assert_eq!(outcome.belief, vec![0.0, 1.0]);
    }

    #[test]
    fn terminal_observation_ends_episode() {
        let config = AgentConfig {
            terminal_observations: vec![1],
            ..AgentConfig::default()
        };
        let mut agent = ActiveInferenceAgent::new(goto_model(vec![0.0, 2.0]), config).unwrap();
        let outcome = agent.step(1).unwrap();
        assert_eq!(outcome.action, None);
        assert_eq!(outcome.phase, Phase::Terminal);
        assert!(matches!(agent.step(0), Err(AgentError::EpisodeTerminated)));

        agent.reset();
        assert_eq!(agent.phase(), Phase::Idle);
        assert_eq!(agent.step(0).unwrap().action, Some(1));
    }

    #[test]
    fn max_steps_ends_episode() {
        let config = AgentConfig {
            max_steps: 2,
            ..AgentConfig::default()
        };
        let mut agent = ActiveInferenceAgent::new(goto_model(vec![0.0, 2.0]), config).unwrap();
        agent.step(0).unwrap();
        let outcome = agent.step(1).unwrap();
        assert_eq!(outcome.phase, Phase::Terminal);
        assert!(matches!(agent.step(1), Err(AgentError::EpisodeTerminated)));
    }

    #[test]
    fn rejects_bad_configuration() {
        let model = goto_model(vec![0.0, 2.0]);
        let horizon = AgentConfig {
            horizon: 0,
            ..AgentConfig::default()
        };
        assert!(matches!(
            ActiveInferenceAgent::new(model.clone(), horizon),
            Err(AgentError::InvalidConfig { .. })
        ));
        let terminal = AgentConfig {
            terminal_observations: vec![5],
            ..AgentConfig::default()
        };
        assert!(matches!(
            ActiveInferenceAgent::new(model.clone(), terminal),
            Err(AgentError::ObservationOutOfRange { observation: 5, .. })
        ));
        let huge = AgentConfig {
            horizon: 13,
            ..AgentConfig::default()
        };
        assert!(matches!(
            ActiveInferenceAgent::new(model, huge),
            Err(AgentError::PolicySpaceTooLarge { .. })
        ));
    }

    #[test]
    fn out_of_range_observation_is_error() {
        let mut agent = ActiveInferenceAgent::new(goto_model(vec![0.0, 2.0]), AgentConfig::default()).unwrap();
        assert!(matches!(
            agent.step(2),
            Err(AgentError::ObservationOutOfRange { observation: 2, .. })
        ));
        assert_eq!(agent.phase(), Phase::Idle);
    }

    /// Four states in a row; action 0 stays, action 1 moves one to the right.
    fn chain_model(c: Vec<f64>) -> Arc<GenerativeModel> {
        let identity: Vec<Vec<f64>> = (0..4)
            .map(|s| (0..4).map(|o| if o == s { 1.0 } else { 0.0 }).collect())
            .collect();
        let advance = (0..4)
            .map(|s| (0..4).map(|o| if o == (s + 1).min(3) { 1.0 } else { 0.0 }).collect())
            .collect();
        Arc::new(
            GenerativeModel::new(ModelSpec {
                num_states: 4,
                num_actions: 2,
                num_observations: 4,
                a: identity.clone(),
                b: vec![identity, advance],
                c,
                d: vec![1.0, 0.0, 0.0, 0.0],
            })
            .unwrap(),
        )
    }

    #[test]
    fn shifted_preferences_select_same_policy() {
        let plan_for = |c: Vec<f64>| {
            let mut agent = ActiveInferenceAgent::new(chain_model(c), AgentConfig::default()).unwrap();
            agent.perceive(0).unwrap();
            agent.plan().unwrap().clone()
        };
        let base = plan_for(vec![0.0, 1.0, 3.0, 0.0]);
        let shifted = plan_for(vec![-3.0, -2.0, 0.0, -3.0]);
        let raised = plan_for(vec![10.0, 11.0, 13.0, 10.0]);

        assert_eq!(base.policy(), &Policy(vec![1]));
        for other in [&shifted, &raised] {
            assert_eq!(other.policy(), base.policy());
            for (a, b) in base.evaluations.iter().zip(&other.evaluations) {
                assert!((a.expected_free_energy - b.expected_free_energy).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn equal_free_energy_prefers_shorter_policy() {
        // Observation 1 is forbidden and observation 0 carries all preference
        // mass, so staying scores G = 0 at every length.
        let mut agent =
            ActiveInferenceAgent::new(goto_model(vec![0.0, f64::NEG_INFINITY]), AgentConfig::default()).unwrap();
        agent.perceive(0).unwrap();
        let plan = agent.plan().unwrap();

        let stay_once = &plan.evaluations[0];
        let stay_twice = &plan.evaluations[2];
        assert_eq!(stay_twice.policy, Policy(vec![0, 0]));
        assert!((stay_once.expected_free_energy - stay_twice.expected_free_energy).abs() <= 1e-9);
        assert_eq!(plan.policy(), &Policy(vec![0]));
        assert_eq!(plan.action(), Some(0));
    }
}
