//! Random Sampling Helpers
//!
//! Distribution draws shared by population setup and the daily systems. All
//! helpers take the caller's RNG so a run stays reproducible under one seed.

use rand::distributions::WeightedIndex;
use rand::Rng;
use rand_distr::{Binomial, Distribution, Gamma, LogNormal, Normal, Poisson};

use crate::config::DiseaseParams;

/// Shortest stage duration, in days
pub const MIN_DURATION_DAYS: u32 = 1;

/// Clamps a value into [0, 1]; NaN maps to 0.
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Protection from two independent sources: `1 - (1 - a)(1 - b)`.
pub fn combine_protection(a: f64, b: f64) -> f64 {
    clamp_unit(1.0 - (1.0 - clamp_unit(a)) * (1.0 - clamp_unit(b)))
}

/// Normalizes weights to sum to 1.
///
/// Returns `None` when the weights sum to zero (or are not finite); callers
/// decide on their fallback.
pub fn normalize(weights: &[f64]) -> Option<Vec<f64>> {
    let total: f64 = weights.iter().sum();
    if !total.is_finite() || total <= 0.0 {
        return None;
    }
    Some(weights.iter().map(|w| w / total).collect())
}

/// Uniform weights over `len` entries.
pub fn uniform(len: usize) -> Vec<f64> {
    if len == 0 {
        return Vec::new();
    }
    vec![1.0 / len as f64; len]
}

/// Draws an index proportionally to `weights`; `None` if no weight is positive.
pub fn weighted_choice<R: Rng + ?Sized>(rng: &mut R, weights: &[f64]) -> Option<usize> {
    WeightedIndex::new(weights).ok().map(|index| index.sample(rng))
}

/// Splits `n` trials over categories via sequential conditional binomials.
///
/// `probs` must already be normalized. The counts always sum to `n` when at
/// least one probability is positive.
pub fn multinomial<R: Rng + ?Sized>(rng: &mut R, n: usize, probs: &[f64]) -> Vec<usize> {
    let mut counts = vec![0usize; probs.len()];
    let Some(last_positive) = probs.iter().rposition(|&p| p > 0.0) else {
        return counts;
    };

    let mut remaining = n as u64;
    let mut mass = 1.0f64;
    for (band, &p) in probs.iter().enumerate().take(last_positive + 1) {
        if remaining == 0 {
            break;
        }
        if band == last_positive {
            counts[band] = remaining as usize;
            break;
        }
        let conditional = if mass > 0.0 { clamp_unit(p / mass) } else { 0.0 };
        let drawn = Binomial::new(remaining, conditional)
            .map(|binomial| binomial.sample(rng))
            .unwrap_or(0);
        counts[band] = drawn as usize;
        remaining -= drawn;
        mass -= p;
    }
    counts
}

/// Integer stage duration from a gamma with the given mean and sd.
///
/// Uses `shape = (mean/sd)^2`, `scale = sd^2/mean`, truncates, and never
/// returns less than [`MIN_DURATION_DAYS`].
pub fn sample_duration<R: Rng + ?Sized>(rng: &mut R, mean: f64, sd: f64) -> u32 {
    let mean = mean.max(0.1);
    let sd = sd.max(0.1);
    let shape = (mean / sd).powi(2);
    let scale = sd * sd / mean;
    match Gamma::new(shape, scale) {
        Ok(gamma) => {
            let draw: f64 = gamma.sample(rng);
            (draw as u32).max(MIN_DURATION_DAYS)
        }
        Err(_) => (mean.round() as u32).max(MIN_DURATION_DAYS),
    }
}

/// Negative-binomial count with the given mean and dispersion `k`,
/// drawn as a gamma-Poisson mixture.
pub fn negative_binomial<R: Rng + ?Sized>(rng: &mut R, mean: f64, dispersion: f64) -> u64 {
    if mean.is_nan() || mean <= 0.0 {
        return 0;
    }
    let k = dispersion.max(1e-3);
    let Ok(gamma) = Gamma::new(k, mean / k) else {
        return 0;
    };
    let rate: f64 = gamma.sample(rng);
    if rate.is_nan() || rate <= 0.0 {
        return 0;
    }
    match Poisson::new(rate) {
        Ok(poisson) => {
            let draw: f64 = poisson.sample(rng);
            draw as u64
        }
        Err(_) => 0,
    }
}

/// Rounded normal draw, falling back to the rounded mean for a bad sd.
pub fn rounded_normal<R: Rng + ?Sized>(rng: &mut R, mean: f64, sd: f64) -> i64 {
    match Normal::new(mean, sd) {
        Ok(normal) => {
            let draw: f64 = normal.sample(rng);
            draw.round() as i64
        }
        Err(_) => mean.round() as i64,
    }
}

/// Lognormal multiplier with median 1.
pub fn lognormal_factor<R: Rng + ?Sized>(rng: &mut R, sigma: f64) -> f64 {
    match LogNormal::new(0.0, sigma.max(1e-3)) {
        Ok(lognormal) => lognormal.sample(rng),
        Err(_) => 1.0,
    }
}

/// Infectiousness by day since infection: a gamma density over
/// `ceil(mean + 3 sd)` days, scaled so the peak is 1.
pub fn infectiousness_curve(params: &DiseaseParams) -> Vec<f64> {
    let horizon = (params.mean_infectious_period + 3.0 * params.sd_infectious_period).ceil();
    let max_days = if horizon.is_finite() && horizon >= 1.0 {
        horizon as usize
    } else {
        1
    };
    let shape = params.infectiousness_shape.max(1e-3);
    let scale = params.infectiousness_scale.max(1e-3);

    let mut curve: Vec<f64> = (0..max_days)
        .map(|day| {
            let t = day as f64 + 1e-3;
            t.powf(shape - 1.0) * (-t / scale).exp()
        })
        .collect();

    let peak = curve.iter().cloned().fold(0.0f64, f64::max);
    if peak > 0.0 && peak.is_finite() {
        for value in &mut curve {
            *value /= peak;
        }
    } else {
        curve.iter_mut().for_each(|value| *value = 1.0);
    }
    curve
}
