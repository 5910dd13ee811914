//! Error types for locviz.
//!
//! This module defines all error types used throughout the locviz crate,
//! providing enough context to tell which stage of the pipeline failed.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for locviz operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Input Errors ===
    /// The location history file could not be opened or read.
    #[error("failed to read location history {path}: {source}")]
    InputOpen {
        /// Path to the input file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The location history file is not a valid export.
    #[error("failed to parse location history {path}: {source}")]
    InputParse {
        /// Path to the input file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// A record carries a timestamp that cannot be turned into a date-time.
    #[error("record {index} has an invalid timestamp: {value}")]
    Timestamp {
        /// Position of the record in the input.
        index: usize,
        /// The raw timestamp as found in the input.
        value: String,
    },

    // === Map Errors ===
    /// The projection centre or map extent is unusable.
    #[error("invalid map projection: {message}")]
    Projection {
        /// Description of the problem.
        message: String,
    },

    /// A background layer file could not be loaded.
    #[error("failed to load map layer {path}: {message}")]
    LayerLoad {
        /// Path to the layer file.
        path: PathBuf,
        /// Description of what went wrong.
        message: String,
    },

    // === Output Errors ===
    /// Drawing the figure failed.
    #[error("render error: {0}")]
    Render(String),

    /// The output image could not be written.
    #[error("failed to write image {path}: {message}")]
    OutputWrite {
        /// Path to the output file.
        path: PathBuf,
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Generic Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for locviz operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new projection error.
    #[must_use]
    pub fn projection(message: impl Into<String>) -> Self {
        Self::Projection {
            message: message.into(),
        }
    }

    /// Create a new render error.
    #[must_use]
    pub fn render(message: impl Into<String>) -> Self {
        Self::Render(message.into())
    }

    /// Create a layer load error for the given file.
    #[must_use]
    pub fn layer_load(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::LayerLoad {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an output write error for the given file.
    #[must_use]
    pub fn output_write(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::OutputWrite {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Check if this error was caused by the input file.
    #[must_use]
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::InputOpen { .. } | Self::InputParse { .. } | Self::Timestamp { .. }
        )
    }
}
