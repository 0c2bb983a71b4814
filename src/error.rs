//! Error types
//!
//! Only construction and configuration can fail. Runtime collision and
//! terrain outcomes ("no overlap", "block already empty") are plain values.

use std::path::PathBuf;

use thiserror::Error;

/// Malformed geometry or grid input, rejected at construction time.
#[derive(Debug, Error, PartialEq)]
pub enum SimError {
    /// A width, height, radius or half-extent that is NaN, infinite or negative.
    #[error("invalid extent for {what}: {value}")]
    InvalidExtent { what: &'static str, value: f32 },

    /// A coefficient outside its allowed range (drag, hitbox scalars, bounciness).
    #[error("invalid {what}: {value}")]
    InvalidScalar { what: &'static str, value: f32 },

    /// A position or velocity component that is not finite.
    #[error("non-finite {what}: ({x}, {y})")]
    NonFinite { what: &'static str, x: f32, y: f32 },

    #[error("terrain grid has no cells")]
    EmptyGrid,

    #[error("terrain row {row} has {len} cells, expected {expected}")]
    RaggedGrid {
        row: usize,
        len: usize,
        expected: usize,
    },
}

/// Settings could not be read or written.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed settings: {0}")]
    Parse(#[from] serde_json::Error),
}
