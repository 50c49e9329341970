//! Declarative run configuration
//!
//! Configuration is an explicit immutable value passed into each component
//! call, never ambient state. Validation fails fast, before any computation,
//! and names the offending pillar and field.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::IndexError;
use crate::types::Pillar;

/// How a pillar's sub-series are combined into one score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlendStrategy {
    /// Normalize each sub-series independently, then average the scores.
    /// The safe default for sub-series on different native scales.
    #[serde(rename = "normalize-then-blend")]
    NormalizeThenBlend,
    /// Average the raw aligned sub-series first, then normalize once.
    #[serde(rename = "blend-then-normalize")]
    BlendThenNormalize,
}

/// Gap-filling policy applied during monthly alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillPolicy {
    /// Leave interior gaps as missing.
    #[default]
    None,
    /// Propagate the last present value forward, at most `max_gap`
    /// consecutive months.
    Forward { max_gap: usize },
}

/// Per-pillar parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PillarConfig {
    /// Rolling window length in months (>= 2).
    pub window: usize,
    /// Symmetric z-score clip bound (> 0).
    pub z_clip: f64,
    /// Sub-series blend strategy.
    pub blend: BlendStrategy,
    /// Composite weight (>= 0; 0 excludes the pillar).
    pub weight: f64,
    /// Alignment fill policy.
    #[serde(default)]
    pub fill: FillPolicy,
}

impl Default for PillarConfig {
    fn default() -> Self {
        Self {
            window: 36,
            z_clip: 3.0,
            blend: BlendStrategy::NormalizeThenBlend,
            weight: 1.0,
            fill: FillPolicy::None,
        }
    }
}

impl PillarConfig {
    fn validate(&self, pillar: Pillar) -> Result<(), IndexError> {
        if self.window < 2 {
            return Err(IndexError::InvalidPillarConfig {
                pillar,
                field: "window",
                message: format!("rolling window must be at least 2 months, got {}", self.window),
            });
        }
        if !self.z_clip.is_finite() || self.z_clip <= 0.0 {
            return Err(IndexError::InvalidPillarConfig {
                pillar,
                field: "z_clip",
                message: format!("clip bound must be a positive number, got {}", self.z_clip),
            });
        }
        if !self.weight.is_finite() || self.weight < 0.0 {
            return Err(IndexError::InvalidPillarConfig {
                pillar,
                field: "weight",
                message: format!("weight must be non-negative, got {}", self.weight),
            });
        }
        if let FillPolicy::Forward { max_gap } = self.fill {
            if max_gap == 0 {
                return Err(IndexError::InvalidPillarConfig {
                    pillar,
                    field: "fill",
                    message: "forward fill requires max_gap of at least 1 month".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Weights and smoothing window as consumed by the Composite Engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeConfig {
    pub weights: BTreeMap<Pillar, f64>,
    pub smoothing_window: usize,
}

/// Full run configuration: timeline start, smoothing, and one
/// [`PillarConfig`] per pillar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexConfig {
    /// First month of the canonical timeline.
    pub start_month: NaiveDate,
    /// Trailing window of the smoothed composite (months, >= 1).
    pub smoothing_window: usize,
    pub pillars: BTreeMap<Pillar, PillarConfig>,
}

impl Default for IndexConfig {
    /// The v0.1 defaults of the original index: 2015 start, 3-month
    /// smoothing, 36-month windows with a 3-sigma clip, and weights
    /// skewed toward the market and capex pillars.
    fn default() -> Self {
        let weights = [
            (Pillar::Market, 0.25),
            (Pillar::Credit, 0.15),
            (Pillar::CapexSupply, 0.20),
            (Pillar::Infra, 0.15),
            (Pillar::Adoption, 0.15),
            (Pillar::Sentiment, 0.10),
        ];
        let pillars = weights
            .into_iter()
            .map(|(pillar, weight)| {
                (
                    pillar,
                    PillarConfig {
                        weight,
                        ..PillarConfig::default()
                    },
                )
            })
            .collect();
        Self {
            start_month: NaiveDate::from_ymd_opt(2015, 1, 1)
                .expect("2015-01-01 is a valid date"),
            smoothing_window: 3,
            pillars,
        }
    }
}

impl IndexConfig {
    /// Validate every field, failing on the first offender with its pillar
    /// name and field. A hard stop: nothing downstream guesses around a bad
    /// configuration.
    pub fn validate(&self) -> Result<(), IndexError> {
        if self.smoothing_window == 0 {
            return Err(IndexError::InvalidConfig {
                field: "smoothing_window",
                message: "smoothing window must be at least 1 month".to_string(),
            });
        }
        if self.pillars.is_empty() {
            return Err(IndexError::InvalidConfig {
                field: "pillars",
                message: "at least one pillar must be configured".to_string(),
            });
        }
        for (pillar, config) in &self.pillars {
            config.validate(*pillar)?;
        }
        let weight_sum: f64 = self.pillars.values().map(|c| c.weight).sum();
        if weight_sum <= 0.0 {
            return Err(IndexError::InvalidConfig {
                field: "pillars",
                message: "pillar weights must not all be zero".to_string(),
            });
        }
        Ok(())
    }

    /// The composite-stage view of this configuration.
    pub fn composite(&self) -> CompositeConfig {
        CompositeConfig {
            weights: self
                .pillars
                .iter()
                .map(|(pillar, config)| (*pillar, config.weight))
                .collect(),
            smoothing_window: self.smoothing_window,
        }
    }

    /// Load a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, IndexError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize this configuration to pretty JSON.
    pub fn to_json(&self) -> Result<String, IndexError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config_is_valid() {
        let config = IndexConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.pillars.len(), 6);

        let weight_sum: f64 = config.pillars.values().map(|c| c.weight).sum();
        assert!((weight_sum - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_window_too_small_names_pillar_and_field() {
        let mut config = IndexConfig::default();
        config
            .pillars
            .get_mut(&Pillar::Credit)
            .unwrap()
            .window = 1;

        match config.validate() {
            Err(IndexError::InvalidPillarConfig { pillar, field, .. }) => {
                assert_eq!(pillar, Pillar::Credit);
                assert_eq!(field, "window");
            }
            other => panic!("expected InvalidPillarConfig, got {other:?}"),
        }
    }

    #[test]
    fn test_negative_weight_rejected() {
        let mut config = IndexConfig::default();
        config
            .pillars
            .get_mut(&Pillar::Sentiment)
            .unwrap()
            .weight = -0.1;

        match config.validate() {
            Err(IndexError::InvalidPillarConfig { pillar, field, .. }) => {
                assert_eq!(pillar, Pillar::Sentiment);
                assert_eq!(field, "weight");
            }
            other => panic!("expected InvalidPillarConfig, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_weight_permitted_but_not_all_zero() {
        let mut config = IndexConfig::default();
        config.pillars.get_mut(&Pillar::Infra).unwrap().weight = 0.0;
        assert!(config.validate().is_ok());

        for pillar_config in config.pillars.values_mut() {
            pillar_config.weight = 0.0;
        }
        match config.validate() {
            Err(IndexError::InvalidConfig { field, .. }) => assert_eq!(field, "pillars"),
            other => panic!("expected InvalidConfig, got {other:?}"),
        }
    }

    #[test]
    fn test_non_positive_clip_rejected() {
        let mut config = IndexConfig::default();
        config.pillars.get_mut(&Pillar::Market).unwrap().z_clip = 0.0;

        match config.validate() {
            Err(IndexError::InvalidPillarConfig { pillar, field, .. }) => {
                assert_eq!(pillar, Pillar::Market);
                assert_eq!(field, "z_clip");
            }
            other => panic!("expected InvalidPillarConfig, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_smoothing_window_rejected() {
        let config = IndexConfig {
            smoothing_window: 0,
            ..IndexConfig::default()
        };
        match config.validate() {
            Err(IndexError::InvalidConfig { field, .. }) => {
                assert_eq!(field, "smoothing_window");
            }
            other => panic!("expected InvalidConfig, got {other:?}"),
        }
    }

    #[test]
    fn test_blend_tag_round_trip() {
        let json = serde_json::to_string(&BlendStrategy::BlendThenNormalize).unwrap();
        assert_eq!(json, "\"blend-then-normalize\"");

        let back: BlendStrategy = serde_json::from_str("\"normalize-then-blend\"").unwrap();
        assert_eq!(back, BlendStrategy::NormalizeThenBlend);

        // Unknown tags are a construction-time error, not a silent fallback.
        assert!(serde_json::from_str::<BlendStrategy>("\"blend-sometimes\"").is_err());
    }

    #[test]
    fn test_config_json_round_trip() {
        let config = IndexConfig::default();
        let json = config.to_json().unwrap();
        let back = IndexConfig::from_json(&json).unwrap();
        assert_eq!(back, config);
    }
}
