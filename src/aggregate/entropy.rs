//! Shannon entropy of per-frame policy distributions, in nats.

/// Entropy of one distribution, clamped to `[0, ln(A)]`.
///
/// Non-positive and non-finite probabilities contribute nothing, so a one-hot
/// distribution yields exactly `0`.
#[must_use]
pub fn entropy(distribution: &[f64]) -> f64 {
    if distribution.len() < 2 {
        return 0.0;
    }
    let h: f64 = distribution
        .iter()
        .filter(|p| p.is_finite() && **p > 0.0)
        .map(|&p| -p * p.ln())
        .sum();
    #[allow(clippy::cast_precision_loss)]
    let upper = (distribution.len() as f64).ln();
    h.clamp(0.0, upper)
}

/// Entropy of every frame of a `[L, A]` policy.
#[must_use]
pub fn entropy_series(policy: &[Vec<f64>]) -> Vec<f64> {
    policy.iter().map(|row| entropy(row)).collect()
}
