//! Pillar building
//!
//! Combines a pillar's sub-series into one normalized 0-100 score, using the
//! blend strategy chosen for that pillar:
//! - `normalize-then-blend`: score each sub-series, then average the scores
//! - `blend-then-normalize`: average the raw sub-series, then score once
//!
//! Months where only some sub-series are present degrade to the mean of the
//! present subset; a pillar goes missing only when everything is missing.

use crate::config::{BlendStrategy, PillarConfig};
use crate::error::IndexError;
use crate::normalize::normalize;
use crate::types::{MonthlySeries, Pillar, Timeline};

/// Build one pillar score from its aligned sub-series.
///
/// All sub-series must share a timeline; the pipeline guarantees this by
/// aligning everything onto one grid before calling in.
pub fn build_pillar(
    pillar: Pillar,
    subseries: &[MonthlySeries],
    config: &PillarConfig,
) -> Result<MonthlySeries, IndexError> {
    let first = subseries.first().ok_or_else(|| IndexError::InvalidPillarConfig {
        pillar,
        field: "series",
        message: "pillar has no sub-series".to_string(),
    })?;
    let timeline = *first.timeline();
    for series in subseries {
        if series.timeline() != &timeline {
            return Err(IndexError::TimelineMismatch(format!(
                "sub-series of pillar {pillar} are not aligned to a single timeline"
            )));
        }
    }

    match config.blend {
        BlendStrategy::NormalizeThenBlend => {
            let normalized: Vec<MonthlySeries> = subseries
                .iter()
                .map(|series| normalize(series, config.window, config.z_clip))
                .collect();
            Ok(mean_across(&normalized, timeline))
        }
        BlendStrategy::BlendThenNormalize => {
            let blended = mean_across(subseries, timeline);
            Ok(normalize(&blended, config.window, config.z_clip))
        }
    }
}

/// Per-month arithmetic mean over whichever series are present; a month with
/// no present series stays missing.
fn mean_across(series: &[MonthlySeries], timeline: Timeline) -> MonthlySeries {
    let mut blended = MonthlySeries::missing(timeline);
    for index in 0..timeline.len() {
        let present: Vec<f64> = series.iter().filter_map(|s| s.value(index)).collect();
        if !present.is_empty() {
            let mean = present.iter().sum::<f64>() / present.len() as f64;
            blended.set(index, Some(mean));
        }
    }
    blended
}
