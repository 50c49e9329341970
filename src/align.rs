//! Series alignment
//!
//! Reindexes an arbitrary-frequency raw series onto the canonical monthly
//! timeline:
//! - one slot per calendar month, latest present observation wins
//! - interior gaps stay missing unless a forward-fill policy is configured
//! - months before the first observation are never extrapolated

use chrono::NaiveDate;

use crate::config::FillPolicy;
use crate::types::{MonthlySeries, RawSeries, Timeline};

/// Reindex `raw` onto `timeline`, applying the configured fill policy.
///
/// An empty raw series produces an entirely-missing aligned series; absence
/// of data is a valid state, not a fault.
pub fn align(raw: &RawSeries, timeline: Timeline, fill: FillPolicy) -> MonthlySeries {
    let mut aligned = MonthlySeries::missing(timeline);
    // Date of the observation currently occupying each slot, for the
    // latest-wins tie-break.
    let mut winners: Vec<Option<NaiveDate>> = vec![None; timeline.len()];

    for obs in &raw.observations {
        // Missing markers never shadow a present value in the same month.
        let Some(value) = obs.value else { continue };
        if !value.is_finite() {
            continue;
        }
        let Some(slot) = timeline.index_of(obs.date) else {
            continue;
        };
        let replace = match winners[slot] {
            None => true,
            Some(current) => obs.date >= current,
        };
        if replace {
            winners[slot] = Some(obs.date);
            aligned.set(slot, Some(value));
        }
    }

    if let FillPolicy::Forward { max_gap } = fill {
        forward_fill(&mut aligned, max_gap);
    }

    aligned
}

/// Propagate the last present value forward, at most `max_gap` consecutive
/// months. A longer gap keeps its tail missing. Months before the first
/// present value are untouched.
fn forward_fill(series: &mut MonthlySeries, max_gap: usize) {
    let mut last_value: Option<f64> = None;
    let mut gap = 0usize;

    for index in 0..series.len() {
        match series.value(index) {
            Some(value) => {
                last_value = Some(value);
                gap = 0;
            }
            None => {
                gap += 1;
                if gap <= max_gap {
                    if let Some(value) = last_value {
                        series.set(index, Some(value));
                    }
                }
            }
        }
    }
}
