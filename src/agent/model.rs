//! Discrete POMDP generative model.
//!
//! - `A[s][o]`: probability of observation `o` in hidden state `s`
//! - `B[a][s][s']`: probability of moving from `s` to `s'` under action `a`
//! - `C[o]`: log-preference over observations (`-inf` forbids), defined up
//!   to an additive constant; inference uses `C − logsumexp(C)`
//! - `D[s]`: prior over the initial state
//!
//! [`GenerativeModel::new`] validates everything up front. A model that
//! exists is well formed; inference code relies on that.

use std::path::Path;

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::belief::{entropy, log_softmax};
use super::error::{ModelError, ModelResult};

const SUM_TOLERANCE: f64 = 1e-6;

/// Raw model description, as read from TOML or JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelSpec {
    pub num_states: usize,
    pub num_actions: usize,
    pub num_observations: usize,
    /// `[state][observation]`
    pub a: Vec<Vec<f64>>,
    /// `[action][from][to]`
    pub b: Vec<Vec<Vec<f64>>>,
    /// `[observation]`
    pub c: Vec<f64>,
    /// `[state]`
    pub d: Vec<f64>,
}

impl ModelSpec {
    /// A model where every distribution is uniform and every preference zero.
    pub fn uniform(num_states: usize, num_actions: usize, num_observations: usize) -> Self {
        let row = |n: usize| vec![1.0 / n.max(1) as f64; n];
        Self {
            num_states,
            num_actions,
            num_observations,
            a: vec![row(num_observations); num_states],
            b: vec![vec![row(num_states); num_states]; num_actions],
            c: vec![0.0; num_observations],
            d: row(num_states),
        }
    }

    /// Parse a TOML model description.
    pub fn from_toml(s: &str) -> ModelResult<Self> {
        toml::from_str(s).map_err(|e| ModelError::Parse {
            message: e.to_string(),
        })
    }

    /// Parse a JSON model description.
    pub fn from_json(s: &str) -> ModelResult<Self> {
        serde_json::from_str(s).map_err(|e| ModelError::Parse {
            message: e.to_string(),
        })
    }

    /// Read a model file; `.json` is parsed as JSON, anything else as TOML.
    pub fn load(path: &Path) -> ModelResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ModelError::Parse {
            message: format!("{}: {e}", path.display()),
        })?;
        if path.extension().is_some_and(|ext| ext == "json") {
            Self::from_json(&content)
        } else {
            Self::from_toml(&content)
        }
    }
}

/// A validated generative model. Immutable; share it with `Arc`.
#[derive(Debug, Clone)]
pub struct GenerativeModel {
    spec: ModelSpec,
    /// `H(A[s])` for every state.
    ambiguity: Vec<f64>,
    /// `C − logsumexp(C)`.
    log_preferences: Vec<f64>,
}

impl GenerativeModel {
    /// Validate `spec` and build the model.
    pub fn new(spec: ModelSpec) -> ModelResult<Self> {
        validate(&spec)?;
        let ambiguity = spec.a.iter().map(|row| entropy(row)).collect();
        let log_preferences = log_softmax(&spec.c);
        tracing::debug!(
            states = spec.num_states,
            actions = spec.num_actions,
            observations = spec.num_observations,
            "generative model validated"
        );
        Ok(Self {
            spec,
            ambiguity,
            log_preferences,
        })
    }

    pub fn spec(&self) -> &ModelSpec {
        &self.spec
    }

    pub fn num_states(&self) -> usize {
        self.spec.num_states
    }

    pub fn num_actions(&self) -> usize {
        self.spec.num_actions
    }

    pub fn num_observations(&self) -> usize {
        self.spec.num_observations
    }

    /// Normalised log-preferences. Shifting every entry of `C` by the same
    /// amount yields the same vector.
    pub fn preferences(&self) -> &[f64] {
        &self.log_preferences
    }

    pub fn initial_belief(&self) -> &[f64] {
        &self.spec.d
    }

    /// Entropy of the observation distribution of each state.
    pub fn ambiguity(&self) -> &[f64] {
        &self.ambiguity
    }

    /// `A[·][obs]`: likelihood of `obs` under each state.
    pub fn likelihood(&self, obs: usize) -> ModelResult<Vec<f64>> {
        self.check_observation(obs)?;
        Ok(self.spec.a.iter().map(|row| row[obs]).collect())
    }

    /// `B[action] · belief`.
    pub fn predict_states(&self, belief: &[f64], action: usize) -> ModelResult<Vec<f64>> {
        self.check_action(action)?;
        self.check_belief(belief)?;
        let mut next = vec![0.0; self.spec.num_states];
        for (from, row) in self.spec.b[action].iter().enumerate() {
            let p = belief[from];
            if p == 0.0 {
                continue;
            }
            for (to, t) in row.iter().enumerate() {
                next[to] += p * t;
            }
        }
        Ok(next)
    }

    /// `A · states`: predicted observation distribution.
    pub fn predict_observations(&self, states: &[f64]) -> ModelResult<Vec<f64>> {
        self.check_belief(states)?;
        let mut obs = vec![0.0; self.spec.num_observations];
        for (row, p) in self.spec.a.iter().zip(states) {
            for (o, l) in row.iter().enumerate() {
                obs[o] += p * l;
            }
        }
        Ok(obs)
    }

    /// Draw an initial state from `D`.
    pub fn sample_initial_state(&self, rng: &mut impl Rng) -> ModelResult<usize> {
        sample(&self.spec.d, rng)
    }

    /// Draw an observation from `A[state]`.
    pub fn sample_observation(&self, state: usize, rng: &mut impl Rng) -> ModelResult<usize> {
        self.check_state(state)?;
        sample(&self.spec.a[state], rng)
    }

    /// Draw a successor state from `B[action][state]`.
    pub fn sample_transition(
        &self,
        state: usize,
        action: usize,
        rng: &mut impl Rng,
    ) -> ModelResult<usize> {
        self.check_state(state)?;
        self.check_action(action)?;
        sample(&self.spec.b[action][state], rng)
    }

    fn check_state(&self, state: usize) -> ModelResult<()> {
        check_index("state", state, self.spec.num_states)
    }

    fn check_action(&self, action: usize) -> ModelResult<()> {
        check_index("action", action, self.spec.num_actions)
    }

    fn check_observation(&self, obs: usize) -> ModelResult<()> {
        check_index("observation", obs, self.spec.num_observations)
    }

    fn check_belief(&self, belief: &[f64]) -> ModelResult<()> {
        if belief.len() == self.spec.num_states {
            Ok(())
        } else {
            Err(ModelError::Shape {
                matrix: "belief",
                index: String::new(),
                expected: self.spec.num_states,
                actual: belief.len(),
            })
        }
    }
}

fn check_index(what: &'static str, index: usize, len: usize) -> ModelResult<()> {
    if index < len {
        Ok(())
    } else {
        Err(ModelError::OutOfRange { what, index, len })
    }
}

fn sample(weights: &[f64], rng: &mut impl Rng) -> ModelResult<usize> {
    let dist = WeightedIndex::new(weights).map_err(|e| ModelError::Sampling {
        message: e.to_string(),
    })?;
    Ok(dist.sample(rng))
}

fn validate(spec: &ModelSpec) -> ModelResult<()> {
    for (what, n) in [
        ("num_states", spec.num_states),
        ("num_actions", spec.num_actions),
        ("num_observations", spec.num_observations),
    ] {
        if n == 0 {
            return Err(ModelError::ZeroCardinality { what });
        }
    }

    check_len("A", String::new(), spec.num_states, spec.a.len())?;
    for (s, row) in spec.a.iter().enumerate() {
        check_distribution("A", format!("[{s}]"), spec.num_observations, row)?;
    }

    check_len("B", String::new(), spec.num_actions, spec.b.len())?;
    for (a, matrix) in spec.b.iter().enumerate() {
        check_len("B", format!("[{a}]"), spec.num_states, matrix.len())?;
        for (from, row) in matrix.iter().enumerate() {
            check_distribution("B", format!("[{a}][{from}]"), spec.num_states, row)?;
        }
    }

    check_len("C", String::new(), spec.num_observations, spec.c.len())?;
    for (o, &value) in spec.c.iter().enumerate() {
        if value.is_nan() || value == f64::INFINITY {
            return Err(ModelError::InvalidEntry {
                matrix: "C",
                index: format!("[{o}]"),
                value,
            });
        }
    }

    check_distribution("D", String::new(), spec.num_states, &spec.d)
}

fn check_len(matrix: &'static str, index: String, expected: usize, actual: usize) -> ModelResult<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(ModelError::Shape {
            matrix,
            index,
            expected,
            actual,
        })
    }
}

fn check_distribution(
    matrix: &'static str,
    index: String,
    expected: usize,
    row: &[f64],
) -> ModelResult<()> {
    check_len(matrix, index.clone(), expected, row.len())?;
    for (i, &value) in row.iter().enumerate() {
        if !value.is_finite() || value < 0.0 {
            return Err(ModelError::InvalidEntry {
                matrix,
                index: format!("{index}[{i}]"),
                value,
            });
        }
    }
    let sum: f64 = row.iter().sum();
    if (sum - 1.0).abs() > SUM_TOLERANCE {
        return Err(ModelError::NotNormalized { matrix, index, sum });
    }
    Ok(())
}
