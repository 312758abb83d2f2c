//! Belief arithmetic over discrete state distributions.

/// Shannon entropy in nats. Zero-probability entries contribute nothing.
pub fn entropy(p: &[f64]) -> f64 {
    -p.iter().filter(|&&x| x > 0.0).map(|&x| x * x.ln()).sum::<f64>()
}

/// Result of a Bayesian belief update.
#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    pub belief: Vec<f64>,
    /// The observation had zero probability under the prior; `belief` is a
    /// fallback rather than a posterior.
    pub collapsed: bool,
}

/// Posterior ∝ likelihood · prior.
///
/// When the product has no mass, falls back to a uniform distribution over
/// the states that can produce the observation at all (all states if none
/// can).
pub fn update(likelihood: &[f64], prior: &[f64]) -> Update {
    let mut belief: Vec<f64> = likelihood.iter().zip(prior).map(|(l, p)| l * p).collect();
    let mass: f64 = belief.iter().sum();
    if mass > 0.0 && mass.is_finite() {
        belief.iter_mut().for_each(|b| *b /= mass);
        return Update {
            belief,
            collapsed: false,
        };
    }

    let support = likelihood.iter().filter(|&&l| l > 0.0).count();
    let belief = if support == 0 {
        uniform(likelihood.len())
    } else {
        likelihood
            .iter()
            .map(|&l| if l > 0.0 { 1.0 / support as f64 } else { 0.0 })
            .collect()
    };
    Update {
        belief,
        collapsed: true,
    }
}

pub fn uniform(n: usize) -> Vec<f64> {
    vec![1.0 / n.max(1) as f64; n]
}

/// `softmax(precision · values)`, with non-finite values mapped to zero
/// probability. All non-finite yields all zeros.
pub fn softmax(values: &[f64], precision: f64) -> Vec<f64> {
    let scaled: Vec<f64> = values.iter().map(|v| precision * v).collect();
    let max = scaled
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return vec![0.0; values.len()];
    }
    let exp: Vec<f64> = scaled
        .iter()
        .map(|&v| if v.is_finite() { (v - max).exp() } else { 0.0 })
        .collect();
    let total: f64 = exp.iter().sum();
    exp.into_iter().map(|e| e / total).collect()
}

/// `values − logsumexp(values)`: the log of a normalised distribution, so
/// shifting every entry by a constant leaves the result unchanged. `−inf`
/// entries stay `−inf`; all `−inf` is returned as is.
pub fn log_softmax(values: &[f64]) -> Vec<f64> {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return values.to_vec();
    }
    let log_total = max + values.iter().map(|&v| (v - max).exp()).sum::<f64>().ln();
    values.iter().map(|&v| v - log_total).collect()
}
