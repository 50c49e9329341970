//! Pipeline orchestration
//!
//! The public entry point of the engine. One deterministic pass:
//! raw series -> align -> normalize -> pillar blend -> composite -> table.
//! Everything is a pure function of the inputs and the configuration; running
//! twice on identical inputs yields identical output.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::align::align;
use crate::composite::compose;
use crate::config::IndexConfig;
use crate::encoder::TableEncoder;
use crate::error::IndexError;
use crate::pillar::build_pillar;
use crate::types::{IndexPayload, IndexTable, MonthlySeries, Pillar, RawSeries, Timeline};

/// Raw sub-series per pillar, as handed over by the fetch collaborators.
pub type PillarInputs = BTreeMap<Pillar, Vec<RawSeries>>;

/// Run the full computation: validate the configuration, build the canonical
/// timeline, and produce the output table.
///
/// The timeline spans `config.start_month` through the latest observed month
/// across all inputs. With no observations in range the result is an empty
/// table, not an error. A pillar without configuration or input data becomes
/// an entirely-missing column.
pub fn compute_index(inputs: &PillarInputs, config: &IndexConfig) -> Result<IndexTable, IndexError> {
    config.validate()?;

    let timeline = match last_available_month(inputs, config.start_month) {
        Some(last) => Timeline::spanning(config.start_month, last)
            .unwrap_or_else(|| Timeline::new(config.start_month, 0)),
        None => Timeline::new(config.start_month, 0),
    };

    let mut scores: Vec<(Pillar, MonthlySeries)> = Vec::with_capacity(Pillar::ALL.len());
    for pillar in Pillar::ALL {
        let score = match (config.pillars.get(&pillar), inputs.get(&pillar)) {
            (Some(pillar_config), Some(raws)) if !raws.is_empty() => {
                let aligned: Vec<MonthlySeries> = raws
                    .iter()
                    .map(|raw| align(raw, timeline, pillar_config.fill))
                    .collect();
                build_pillar(pillar, &aligned, pillar_config)?
            }
            _ => MonthlySeries::missing(timeline),
        };
        scores.push((pillar, score));
    }

    let score_map: BTreeMap<Pillar, MonthlySeries> = scores.iter().cloned().collect();
    let composite = compose(&score_map, &config.composite(), timeline)?;

    Ok(IndexTable::new(timeline, scores, composite))
}

/// Latest month carrying a present observation across all inputs, ignoring
/// anything before the configured start month.
fn last_available_month(inputs: &PillarInputs, start_month: NaiveDate) -> Option<NaiveDate> {
    let floor = crate::types::month_floor(start_month);
    inputs
        .values()
        .flatten()
        .filter_map(|series| series.last_observed_month())
        .filter(|month| *month >= floor)
        .max()
}

/// Convenience wrapper binding a validated configuration to an encoder with a
/// stable run instance id.
pub struct IndexEngine {
    config: IndexConfig,
    encoder: TableEncoder,
}

impl IndexEngine {
    /// Create an engine, validating the configuration up front.
    pub fn new(config: IndexConfig) -> Result<Self, IndexError> {
        config.validate()?;
        Ok(Self {
            config,
            encoder: TableEncoder::new(),
        })
    }

    /// Create an engine with a specific encoder instance id (useful for
    /// reproducible payload metadata in tests).
    pub fn with_instance_id(config: IndexConfig, instance_id: String) -> Result<Self, IndexError> {
        config.validate()?;
        Ok(Self {
            config,
            encoder: TableEncoder::with_instance_id(instance_id),
        })
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Compute the output table for one batch of inputs.
    pub fn compute(&self, inputs: &PillarInputs) -> Result<IndexTable, IndexError> {
        compute_index(inputs, &self.config)
    }

    /// Compute and encode as the tabular CSV artifact.
    pub fn compute_csv(&self, inputs: &PillarInputs) -> Result<String, IndexError> {
        let table = self.compute(inputs)?;
        self.encoder.encode_csv(&table)
    }

    /// Compute and encode as the JSON payload with producer/provenance.
    pub fn compute_payload(&self, inputs: &PillarInputs) -> Result<IndexPayload, IndexError> {
        let table = self.compute(inputs)?;
        Ok(self.encoder.encode_payload(&table))
    }
}
