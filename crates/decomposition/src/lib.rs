use std::collections::HashSet;

use common::metrics::std_dev;
use common::{GridcastError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Seasonal pattern of one periodicity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalComponent {
    pub periodicity: usize,
    /// One value per phase, summing to zero. All zero when not estimated.
    pub profile: Vec<f64>,
    /// `profile` laid over the series, `values[i] == profile[i % periodicity]`.
    pub values: Vec<f64>,
    /// False when the series held fewer than two full cycles.
    pub estimated: bool,
}

impl SeasonalComponent {
    fn skipped(periodicity: usize, n: usize) -> Self {
        Self {
            periodicity,
            profile: vec![0.0; periodicity],
            values: vec![0.0; n],
            estimated: false,
        }
    }

    /// Seasonal effect at any position, including ones past the series end.
    pub fn at(&self, position: usize) -> f64 {
        self.profile[position % self.periodicity]
    }
}

/// Additive decomposition: `level + sum(seasonal) + residual == series`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decomposition {
    pub level: Vec<f64>,
    /// In the order the periodicities were requested.
    pub seasonal: Vec<SeasonalComponent>,
    pub residual: Vec<f64>,
}

impl Decomposition {
    pub fn len(&self) -> usize {
        self.level.len()
    }

    pub fn is_empty(&self) -> bool {
        self.level.is_empty()
    }

    pub fn reconstruct(&self) -> Vec<f64> {
        (0..self.len())
            .map(|i| {
                self.level[i]
                    + self.seasonal.iter().map(|s| s.values[i]).sum::<f64>()
                    + self.residual[i]
            })
            .collect()
    }

    /// Sum of all seasonal effects at `position`.
    pub fn seasonal_at(&self, position: usize) -> f64 {
        self.seasonal.iter().map(|s| s.at(position)).sum()
    }

    /// Level plus residual, the series with all seasonality removed.
    pub fn seasonally_adjusted(&self) -> Vec<f64> {
        self.level
            .iter()
            .zip(&self.residual)
            .map(|(l, r)| l + r)
            .collect()
    }

    pub fn residual_std(&self) -> f64 {
        std_dev(&self.residual)
    }

    /// Level at the last bucket, averaged over the trailing window of the
    /// longest estimated periodicity.
    pub fn last_level(&self) -> Option<f64> {
        self.level.last().copied()
    }

    /// True when every periodicity could be estimated.
    pub fn is_complete(&self) -> bool {
        self.seasonal.iter().all(|s| s.estimated)
    }

    pub fn component(&self, periodicity: usize) -> Option<&SeasonalComponent> {
        self.seasonal.iter().find(|s| s.periodicity == periodicity)
    }
}

/// Decompose `values` into level, one seasonal component per periodicity and
/// residual, by classical moving averages.
///
/// Periodicities are removed from the shortest to the longest. Each profile
/// is the phase-wise mean of the detrended remainder over positions where the
/// centered moving average exists, shifted to zero mean. A periodicity with
/// fewer than two full cycles in the data is not estimated.
pub fn decompose(values: &[f64], periodicities: &[usize]) -> Result<Decomposition> {
    let mut seen = HashSet::new();
    for &p in periodicities {
        if p < 2 {
            return Err(GridcastError::Configuration(format!(
                "periodicity must be at least 2, got {p}"
            )));
        }
        if !seen.insert(p) {
            return Err(GridcastError::Configuration(format!(
                "periodicity {p} requested more than once"
            )));
        }
    }

    let n = values.len();
    let mut order: Vec<usize> = (0..periodicities.len()).collect();
    order.sort_by_key(|&i| periodicities[i]);

    let mut remainder = values.to_vec();
    let mut seasonal: Vec<Option<SeasonalComponent>> = vec![None; periodicities.len()];
    let mut longest_estimated = None;

    for i in order {
        let p = periodicities[i];
        if n < 2 * p {
            debug!(periodicity = p, length = n, "Periodicity skipped, fewer than two cycles");
            seasonal[i] = Some(SeasonalComponent::skipped(p, n));
            continue;
        }

        let profile = seasonal_profile(&remainder, p);
        let component_values: Vec<f64> = (0..n).map(|t| profile[t % p]).collect();
        for (r, s) in remainder.iter_mut().zip(&component_values) {
            *r -= s;
        }

        debug!(
            periodicity = p,
            amplitude = profile.iter().cloned().fold(0.0_f64, |a, v| a.max(v.abs())),
            "Seasonal profile estimated"
        );

        longest_estimated = Some(p);
        seasonal[i] = Some(SeasonalComponent {
            periodicity: p,
            profile,
            values: component_values,
            estimated: true,
        });
    }

    let level = match longest_estimated {
        Some(p) => clamped_moving_average(&remainder, p),
        None => {
            let mean = if n == 0 {
                0.0
            } else {
                remainder.iter().sum::<f64>() / n as f64
            };
            vec![mean; n]
        }
    };

    let seasonal: Vec<SeasonalComponent> = seasonal.into_iter().flatten().collect();
    let residual = (0..n)
        .map(|t| values[t] - level[t] - seasonal.iter().map(|s| s.values[t]).sum::<f64>())
        .collect();

    Ok(Decomposition {
        level,
        seasonal,
        residual,
    })
}

// -----------------------------------------------------------------------
// Moving averages
// -----------------------------------------------------------------------

/// Zero-mean phase profile of `values` for period `p`. Requires `values.len() >= 2p`.
fn seasonal_profile(values: &[f64], p: usize) -> Vec<f64> {
    let trend = centered_moving_average(values, p);
    let mut sums = vec![0.0; p];
    let mut counts = vec![0usize; p];
    for (t, trend) in trend.iter().enumerate() {
        if let Some(trend) = trend {
            sums[t % p] += values[t] - trend;
            counts[t % p] += 1;
        }
    }
    let mut profile: Vec<f64> = sums
        .iter()
        .zip(&counts)
        .map(|(s, &c)| if c > 0 { s / c as f64 } else { 0.0 })
        .collect();
    let mean = profile.iter().sum::<f64>() / p as f64;
    for v in profile.iter_mut() {
        *v -= mean;
    }
    profile
}

/// Centered moving average over one full period: a 2xp average for even `p`
/// (half weight on both ends), a plain p average for odd `p`. `None` where
/// the window does not fit.
fn centered_moving_average(values: &[f64], p: usize) -> Vec<Option<f64>> {
    let n = values.len();
    let half = p / 2;
    (0..n)
        .map(|t| {
            if t < half || t + half >= n {
                return None;
            }
            let window = &values[t - half..=t + half];
            if p % 2 == 0 {
                let inner: f64 = window[1..p].iter().sum();
                Some((inner + 0.5 * (window[0] + window[p])) / p as f64)
            } else {
                Some(window.iter().sum::<f64>() / p as f64)
            }
        })
        .collect()
}

/// Moving average over `p + 1` (even `p`) or `p` (odd `p`) entries, centered
/// where it fits and slid inside the series near the ends. Every level,
/// including the last one, averages a full window.
fn clamped_moving_average(values: &[f64], p: usize) -> Vec<f64> {
    let n = values.len();
    let width = (2 * (p / 2) + 1).min(n);
    (0..n)
        .map(|t| {
            let start = t.saturating_sub(width / 2).min(n - width);
            let window = &values[start..start + width];
            window.iter().sum::<f64>() / width as f64
        })
        .collect()
}

#[cfg(test)]
mod tests;
