//! Core types for the AIBPS pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: raw observations, monthly-aligned series, pillar scores, and the
//! final composite table.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// One of the six sub-indices that feed the composite.
///
/// The declaration order is the column order of the output table.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Pillar {
    Market,
    Credit,
    #[serde(rename = "Capex_Supply")]
    CapexSupply,
    Infra,
    Adoption,
    Sentiment,
}

impl Pillar {
    /// All pillars in output column order.
    pub const ALL: [Pillar; 6] = [
        Pillar::Market,
        Pillar::Credit,
        Pillar::CapexSupply,
        Pillar::Infra,
        Pillar::Adoption,
        Pillar::Sentiment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Pillar::Market => "Market",
            Pillar::Credit => "Credit",
            Pillar::CapexSupply => "Capex_Supply",
            Pillar::Infra => "Infra",
            Pillar::Adoption => "Adoption",
            Pillar::Sentiment => "Sentiment",
        }
    }

    /// Parse a pillar name, case-insensitively.
    pub fn parse(name: &str) -> Option<Pillar> {
        Pillar::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Pillar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single raw observation as handed over by a fetch collaborator.
///
/// `value: None` is the explicit missing-data marker; it is distinct from the
/// observation not existing at all.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawObservation {
    pub date: NaiveDate,
    pub value: Option<f64>,
}

impl RawObservation {
    pub fn new(date: NaiveDate, value: Option<f64>) -> Self {
        Self { date, value }
    }
}

/// A named raw time series of arbitrary frequency and ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSeries {
    /// Source label (e.g. "MKT_SOXX_1y", "HY_OAS"), used in error context.
    pub name: String,
    pub observations: Vec<RawObservation>,
}

impl RawSeries {
    pub fn new(name: impl Into<String>, observations: Vec<RawObservation>) -> Self {
        Self {
            name: name.into(),
            observations,
        }
    }

    /// Latest month that carries a present value, if any.
    pub fn last_observed_month(&self) -> Option<NaiveDate> {
        self.observations
            .iter()
            .filter(|obs| obs.value.is_some())
            .map(|obs| month_floor(obs.date))
            .max()
    }
}

/// The canonical monthly grid: a start month plus a number of consecutive
/// calendar months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeline {
    start: NaiveDate,
    months: usize,
}

impl Timeline {
    /// Create a timeline of `months` slots beginning at the month of `start`.
    pub fn new(start: NaiveDate, months: usize) -> Self {
        Self {
            start: month_floor(start),
            months,
        }
    }

    /// Timeline spanning `start ..= last` inclusive, or `None` when `last`
    /// falls before `start`.
    pub fn spanning(start: NaiveDate, last: NaiveDate) -> Option<Self> {
        let span = month_ordinal(last) - month_ordinal(start);
        if span < 0 {
            return None;
        }
        Some(Self::new(start, span as usize + 1))
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn len(&self) -> usize {
        self.months
    }

    pub fn is_empty(&self) -> bool {
        self.months == 0
    }

    /// First day of the month at slot `index`.
    pub fn month(&self, index: usize) -> NaiveDate {
        month_from_ordinal(month_ordinal(self.start) + index as i32)
    }

    /// Slot for the month containing `date`, if inside the timeline.
    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        let offset = month_ordinal(date) - month_ordinal(self.start);
        if offset < 0 || offset as usize >= self.months {
            return None;
        }
        Some(offset as usize)
    }

    pub fn months(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        (0..self.months).map(|i| self.month(i))
    }
}

/// A series reindexed to a [`Timeline`]: exactly one value or missing marker
/// per calendar month.
///
/// Aligned series carry raw-scale values; after normalization every present
/// value lies in `[0, 100]`. Both stages share this container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySeries {
    timeline: Timeline,
    values: Vec<Option<f64>>,
}

impl MonthlySeries {
    /// An entirely-missing series over `timeline`.
    pub fn missing(timeline: Timeline) -> Self {
        Self {
            values: vec![None; timeline.len()],
            timeline,
        }
    }

    /// Build from per-slot values; the vector is padded or truncated to the
    /// timeline length.
    pub fn from_values(timeline: Timeline, mut values: Vec<Option<f64>>) -> Self {
        values.resize(timeline.len(), None);
        Self { timeline, values }
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn value(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied().flatten()
    }

    pub fn set(&mut self, index: usize, value: Option<f64>) {
        if let Some(slot) = self.values.get_mut(index) {
            *slot = value;
        }
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    pub fn month(&self, index: usize) -> NaiveDate {
        self.timeline.month(index)
    }
}

/// The composite index and its smoothed variant, on the pillar timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeSeries {
    pub aibps: MonthlySeries,
    pub aibps_ra: MonthlySeries,
}

/// Final output table: six pillar score columns plus the composite columns,
/// keyed by month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexTable {
    timeline: Timeline,
    pillars: Vec<(Pillar, MonthlySeries)>,
    aibps: MonthlySeries,
    aibps_ra: MonthlySeries,
}

impl IndexTable {
    pub(crate) fn new(
        timeline: Timeline,
        pillars: Vec<(Pillar, MonthlySeries)>,
        composite: CompositeSeries,
    ) -> Self {
        Self {
            timeline,
            pillars,
            aibps: composite.aibps,
            aibps_ra: composite.aibps_ra,
        }
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn pillar(&self, pillar: Pillar) -> Option<&MonthlySeries> {
        self.pillars
            .iter()
            .find(|(p, _)| *p == pillar)
            .map(|(_, s)| s)
    }

    pub fn aibps(&self) -> &MonthlySeries {
        &self.aibps
    }

    pub fn aibps_ra(&self) -> &MonthlySeries {
        &self.aibps_ra
    }

    /// Iterate the table row by row, in ascending month order.
    pub fn rows(&self) -> impl Iterator<Item = IndexRow> + '_ {
        (0..self.timeline.len()).map(move |i| IndexRow {
            month: self.timeline.month(i),
            market: self.column(Pillar::Market, i),
            credit: self.column(Pillar::Credit, i),
            capex_supply: self.column(Pillar::CapexSupply, i),
            infra: self.column(Pillar::Infra, i),
            adoption: self.column(Pillar::Adoption, i),
            sentiment: self.column(Pillar::Sentiment, i),
            aibps: self.aibps.value(i),
            aibps_ra: self.aibps_ra.value(i),
        })
    }

    fn column(&self, pillar: Pillar, index: usize) -> Option<f64> {
        self.pillar(pillar).and_then(|s| s.value(index))
    }
}

/// One output row, with the fixed column naming of the tabular artifact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndexRow {
    pub month: NaiveDate,
    #[serde(rename = "Market")]
    pub market: Option<f64>,
    #[serde(rename = "Credit")]
    pub credit: Option<f64>,
    #[serde(rename = "Capex_Supply")]
    pub capex_supply: Option<f64>,
    #[serde(rename = "Infra")]
    pub infra: Option<f64>,
    #[serde(rename = "Adoption")]
    pub adoption: Option<f64>,
    #[serde(rename = "Sentiment")]
    pub sentiment: Option<f64>,
    #[serde(rename = "AIBPS")]
    pub aibps: Option<f64>,
    #[serde(rename = "AIBPS_RA")]
    pub aibps_ra: Option<f64>,
}

/// Producer metadata embedded in the JSON payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Provenance of a single run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexProvenance {
    pub start_month: Option<NaiveDate>,
    pub last_month: Option<NaiveDate>,
    pub months: usize,
    pub computed_at_utc: String,
}

/// Complete JSON output payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexPayload {
    pub aibps_version: String,
    pub producer: IndexProducer,
    pub provenance: IndexProvenance,
    pub rows: Vec<IndexRow>,
}

/// First day of the month containing `date`.
pub fn month_floor(date: NaiveDate) -> NaiveDate {
    month_from_ordinal(month_ordinal(date))
}

fn month_ordinal(date: NaiveDate) -> i32 {
    date.year() * 12 + date.month0() as i32
}

fn month_from_ordinal(ordinal: i32) -> NaiveDate {
    let year = ordinal.div_euclid(12);
    let month0 = ordinal.rem_euclid(12) as u32;
    NaiveDate::from_ymd_opt(year, month0 + 1, 1).expect("month ordinal maps to a valid date")
}
