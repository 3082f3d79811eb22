// src/error.rs
//! Error type shared by the lattice, sampler and analysis layers.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LatticeError {
    #[error("invalid coordinate: {0}")]
    InvalidCoordinate(String),

    #[error("invalid direction {0}: expected 0..4")]
    InvalidDirection(usize),

    #[error("shape mismatch: coordinate grid {coordinate:?} vs configuration grid {configuration:?}")]
    ShapeMismatch {
        coordinate: [usize; 4],
        configuration: [usize; 4],
    },

    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("candidate set is empty; randomize candidates before sweeping")]
    EmptyCandidateSet,

    #[error("configuration index {index} out of range for ensemble of {len}")]
    EnsembleIndex { index: usize, len: usize },

    #[error("parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("settings error: {0}")]
    Settings(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LatticeError>;
