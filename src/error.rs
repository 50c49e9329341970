//! Error types for the AIBPS engine

use thiserror::Error;

use crate::types::Pillar;

/// Errors that can occur while configuring or running the index computation.
///
/// Missing data is never an error; it flows through every stage as an
/// explicit missing marker. Everything here is either a configuration
/// problem (a hard stop before any computation) or an I/O surface failure.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("invalid configuration for pillar {pillar}, field `{field}`: {message}")]
    InvalidPillarConfig {
        pillar: Pillar,
        field: &'static str,
        message: String,
    },

    #[error("invalid configuration, field `{field}`: {message}")]
    InvalidConfig {
        field: &'static str,
        message: String,
    },

    #[error("timeline mismatch: {0}")]
    TimelineMismatch(String),

    #[error("failed to parse {context}: {message}")]
    Parse { context: String, message: String },

    #[error("encoding error: {0}")]
    Encode(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
