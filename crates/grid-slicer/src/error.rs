//! Error types for grid slicing.
//!
//! Only programmer-error class problems are errors here. Recoverable
//! conditions (unit mismatch, degenerate geometry, missing data) are carried
//! as values, see [`crate::types::Condition`].

use thiserror::Error;

/// Errors that can occur while slicing or transforming a grid.
#[derive(Error, Debug)]
pub enum SliceError {
    /// A grid or level index is outside the axis. Never clamped.
    #[error("index {index} out of bounds for {axis} axis of length {len}")]
    InvalidIndex {
        axis: &'static str,
        index: usize,
        len: usize,
    },

    /// The domain description is inconsistent with the data.
    #[error("malformed domain: {0}")]
    MalformedDomain(String),

    /// A field or level set could not be obtained from the data layer.
    #[error("resource unavailable: {0}")]
    ResourceUnavailable(String),

    /// A unit could not be parsed or used where one was required.
    #[error("incompatible unit: {0}")]
    IncompatibleUnit(String),

    /// An operation parameter is out of range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// A background job was cancelled before completion.
    #[error("operation cancelled")]
    Cancelled,

    /// Internal failure, e.g. a worker task panicked.
    #[error("internal error: {0}")]
    Internal(String),
}

impl SliceError {
    /// Create an InvalidIndex error.
    pub fn invalid_index(axis: &'static str, index: usize, len: usize) -> Self {
        Self::InvalidIndex { axis, index, len }
    }

    /// Create a MalformedDomain error.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedDomain(msg.into())
    }

    /// Create a ResourceUnavailable error.
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::ResourceUnavailable(msg.into())
    }

    /// Create an InvalidParameter error.
    pub fn invalid_parameter(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }

    /// Create a Config error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

impl From<std::io::Error> for SliceError {
    fn from(err: std::io::Error) -> Self {
        Self::ResourceUnavailable(err.to_string())
    }
}

impl From<serde_json::Error> for SliceError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedDomain(err.to_string())
    }
}

impl From<serde_yaml::Error> for SliceError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<projection::ProjectionError> for SliceError {
    fn from(err: projection::ProjectionError) -> Self {
        Self::MalformedDomain(err.to_string())
    }
}

impl From<geo_common::UnitParseError> for SliceError {
    fn from(err: geo_common::UnitParseError) -> Self {
        Self::IncompatibleUnit(err.to_string())
    }
}

/// Result type for slicing operations.
pub type Result<T> = std::result::Result<T, SliceError>;
