//! Parse errors for the common value types.

use thiserror::Error;

/// A unit specifier string that the unit system does not recognise.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnitParseError {
    #[error("Unknown unit '{0}'")]
    Unknown(String),

    #[error("Empty unit specifier")]
    Empty,
}

/// A malformed bounding box string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BboxParseError {
    #[error("Invalid bounding box format: {0}. Expected 'min_lon,min_lat,max_lon,max_lat'")]
    InvalidFormat(String),

    #[error("Invalid number in bounding box: {0}")]
    InvalidNumber(String),
}
