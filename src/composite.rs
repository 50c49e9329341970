//! Composite engine
//!
//! Combines the pillar scores into the AIBPS index via a weighted average,
//! renormalizing weights over whichever pillars are present each month, and
//! derives the smoothed AIBPS_RA variant via a strict trailing average.

use std::collections::BTreeMap;

use crate::config::CompositeConfig;
use crate::error::IndexError;
use crate::types::{CompositeSeries, MonthlySeries, Pillar, Timeline};

/// Combine pillar scores into the composite index and its smoothed variant.
///
/// Per month, pillars without a present value drop out and the remaining
/// weights are renormalized to sum to 1, so one stale pillar degrades the
/// composite gracefully instead of nulling it. A month where no pillar is
/// present (or every present pillar carries weight 0) is missing.
pub fn compose(
    pillars: &BTreeMap<Pillar, MonthlySeries>,
    config: &CompositeConfig,
    timeline: Timeline,
) -> Result<CompositeSeries, IndexError> {
    for (pillar, series) in pillars {
        if series.timeline() != &timeline {
            return Err(IndexError::TimelineMismatch(format!(
                "pillar {pillar} is not on the composite timeline"
            )));
        }
    }

    let mut aibps = MonthlySeries::missing(timeline);
    for index in 0..timeline.len() {
        let mut weight_sum = 0.0;
        let mut weighted = 0.0;
        for (pillar, series) in pillars {
            let weight = config.weights.get(pillar).copied().unwrap_or(0.0);
            if let Some(value) = series.value(index) {
                weight_sum += weight;
                weighted += weight * value;
            }
        }
        if weight_sum > 0.0 {
            aibps.set(index, Some(weighted / weight_sum));
        }
    }

    let aibps_ra = rolling_average(&aibps, config.smoothing_window);

    Ok(CompositeSeries { aibps, aibps_ra })
}

/// Strict-missing trailing simple moving average: the value at month t is
/// missing unless all `window` trailing values, t included, are present.
pub fn rolling_average(series: &MonthlySeries, window: usize) -> MonthlySeries {
    let mut smoothed = MonthlySeries::missing(*series.timeline());
    for index in 0..series.len() {
        if index + 1 < window {
            continue;
        }
        let trailing: Vec<f64> = (index + 1 - window..=index)
            .map(|i| series.value(i))
            .collect::<Option<Vec<f64>>>()
            .unwrap_or_default();
        if trailing.len() == window {
            smoothed.set(index, Some(trailing.iter().sum::<f64>() / window as f64));
        }
    }
    smoothed
}
