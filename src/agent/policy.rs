//! Policy enumeration and expected free energy.
//!
//! A policy is a fixed action sequence. Its expected free energy sums, over
//! the predicted future, the negated pragmatic value (expected log-preference
//! of observations) and the negated epistemic value (expected information
//! gain about the hidden state):
//!
//! ```text
//! q_s ← B_a · q_s
//! q_o = A · q_s
//! pragmatic = Σ_o q_o · C̃[o]
//! epistemic = H(q_o) − Σ_s q_s · H(A[s])
//! G = −Σ_t (pragmatic + epistemic)
//! ```
//!
//! `C̃ = C − logsumexp(C)` is the model's normalised preference vector, so
//! every pragmatic term is a log-probability and policies of different
//! lengths compare the same way whatever constant `C` was written with.
//! Lower is better. A policy that reaches a forbidden observation (`C = −∞`)
//! with non-zero probability has `G = +∞`.

use serde::{Deserialize, Serialize};

use super::belief::entropy;
use super::error::{AgentError, AgentResult, ModelResult};
use super::model::GenerativeModel;

/// Expected free energies closer than this are ties.
pub const TIE_TOLERANCE: f64 = 1e-9;

/// A sequence of actions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Policy(pub Vec<usize>);

impl Policy {
    pub fn actions(&self) -> &[usize] {
        &self.0
    }

    pub fn first(&self) -> Option<usize> {
        self.0.first().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for Policy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|a| a.to_string()).collect();
        write!(f, "[{}]", parts.join(", "))
    }
}

/// Number of policies of length `1..=horizon` over `num_actions` actions, or
/// `None` on overflow.
pub fn policy_count(num_actions: usize, horizon: usize) -> Option<usize> {
    let mut total: usize = 0;
    let mut level: usize = 1;
    for _ in 0..horizon {
        level = level.checked_mul(num_actions)?;
        total = total.checked_add(level)?;
    }
    Some(total)
}

/// Every action sequence of length `1..=horizon`: shorter first, then
/// lexicographic.
pub fn enumerate(num_actions: usize, horizon: usize, max: usize) -> AgentResult<Vec<Policy>> {
    let count = policy_count(num_actions, horizon);
    match count {
        Some(n) if n <= max => {}
        _ => {
            return Err(AgentError::PolicySpaceTooLarge {
                count: count.map_or_else(
                    || format!("more than {}", usize::MAX),
                    |n| n.to_string(),
                ),
                max,
            });
        }
    }

    let mut policies = Vec::with_capacity(count.unwrap_or(0));
    let mut frontier: Vec<Vec<usize>> = vec![Vec::new()];
    for _ in 0..horizon {
        let mut next = Vec::with_capacity(frontier.len() * num_actions);
        for prefix in &frontier {
            for action in 0..num_actions {
                let mut seq = prefix.clone();
                seq.push(action);
                next.push(seq);
            }
        }
        policies.extend(next.iter().cloned().map(Policy));
        frontier = next;
    }
    Ok(policies)
}

/// The expected free energy of one policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub policy: Policy,
    pub expected_free_energy: f64,
    /// Summed over the horizon.
    pub pragmatic: f64,
    /// Summed over the horizon.
    pub epistemic: f64,
    /// Predicted observation distribution after the first action.
    pub first_observations: Vec<f64>,
}

/// Roll `belief` forward through `policy` and score it.
pub fn evaluate(model: &GenerativeModel, belief: &[f64], policy: &Policy) -> ModelResult<Evaluation> {
    let preferences = model.preferences();
    let ambiguity = model.ambiguity();

    let mut qs = belief.to_vec();
    let mut pragmatic = 0.0;
    let mut epistemic = 0.0;
    let mut first_observations = Vec::new();

    for (t, &action) in policy.actions().iter().enumerate() {
        qs = model.predict_states(&qs, action)?;
        let qo = model.predict_observations(&qs)?;

        pragmatic += qo
            .iter()
            .zip(preferences)
            .filter(|&(&p, _)| p > 0.0)
            .map(|(p, c)| p * c)
            .sum::<f64>();
        let expected_ambiguity: f64 = qs.iter().zip(ambiguity).map(|(p, h)| p * h).sum();
        epistemic += entropy(&qo) - expected_ambiguity;

        if t == 0 {
            first_observations = qo;
        }
    }

    let expected_free_energy = -(pragmatic + epistemic);
    Ok(Evaluation {
        policy: policy.clone(),
        expected_free_energy: if expected_free_energy.is_nan() {
            f64::INFINITY
        } else {
            expected_free_energy
        },
        pragmatic,
        epistemic,
        first_observations,
    })
}

/// Index of the best evaluation: minimal finite G, ties within
/// [`TIE_TOLERANCE`] broken by shorter policy, then lexicographically smaller
/// action sequence. `None` when no G is finite.
pub fn select(evaluations: &[Evaluation]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, candidate) in evaluations.iter().enumerate() {
        let g = candidate.expected_free_energy;
        if !g.is_finite() {
            continue;
        }
        let Some(b) = best else {
            best = Some(i);
            continue;
        };
        let incumbent = &evaluations[b];
        let bg = incumbent.expected_free_energy;
        let better = if (g - bg).abs() <= TIE_TOLERANCE {
            (candidate.policy.len(), &candidate.policy.0) < (incumbent.policy.len(), &incumbent.policy.0)
        } else {
            g < bg
        };
        if better {
            best = Some(i);
        }
    }
    best
}
