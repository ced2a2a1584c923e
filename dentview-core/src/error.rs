//! Error types for the dentview core

use thiserror::Error;

/// Failure to turn a raw buffer into a triangle mesh
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("buffer of {len} bytes is too small to hold an STL header")]
    MalformedHeader { len: usize },

    #[error("buffer is neither a binary STL nor an ASCII STL with complete facets")]
    UnrecognizedFormat,
}

/// Alpha raster construction failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RasterError {
    #[error("raster expects {expected} samples, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },
}

/// Viewer configuration could not be read
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Background mesh load could not be started
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to spawn decode thread: {0}")]
    Spawn(#[source] std::io::Error),
}
