//! AIBPS - deterministic compute engine for the AI Bubble Pressure Score
//!
//! The engine turns six heterogeneous raw economic series into comparable
//! 0-100 pressure scores and one composite index, through a deterministic
//! pipeline: monthly alignment -> rolling normalization -> pillar blending ->
//! composite weighting -> smoothed variant.
//!
//! ## Modules
//!
//! - **align**: reindex arbitrary-frequency raw series onto the monthly grid
//! - **normalize**: rolling z-score + sigmoid squash onto (0, 100)
//! - **pillar**: combine sub-series into one score per pillar
//! - **composite**: weighted composite (AIBPS) and smoothed variant (AIBPS_RA)
//! - **pipeline**: the batch entry point tying the stages together
//! - **ingest** / **encoder**: the flat-file input and output surfaces

pub mod align;
pub mod composite;
pub mod config;
pub mod encoder;
pub mod error;
pub mod ingest;
pub mod normalize;
pub mod pillar;
pub mod pipeline;
pub mod types;

pub use config::{BlendStrategy, CompositeConfig, FillPolicy, IndexConfig, PillarConfig};
pub use error::IndexError;
pub use pipeline::{compute_index, IndexEngine, PillarInputs};
pub use types::{
    IndexPayload, IndexRow, IndexTable, MonthlySeries, Pillar, RawObservation, RawSeries,
    Timeline,
};

/// Engine version embedded in all output payloads
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for output payloads
pub const PRODUCER_NAME: &str = "aibps";
