//! Core value types shared across the kernel.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SliceError;

/// Sampling policy used when a requested point does not fall on a grid node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplingMode {
    /// Value of the nearest grid node.
    NearestNeighbor,
    /// Bilinear weighting of the surrounding nodes.
    #[default]
    WeightedAverage,
}

impl SamplingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NearestNeighbor => "nearest",
            Self::WeightedAverage => "weighted",
        }
    }
}

impl FromStr for SamplingMode {
    type Err = SliceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "nearest" | "nearest_neighbor" | "nearestneighbor" => Ok(Self::NearestNeighbor),
            "weighted" | "weighted_average" | "weightedaverage" | "bilinear" => {
                Ok(Self::WeightedAverage)
            }
            other => Err(SliceError::invalid_parameter(format!(
                "unknown sampling mode '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for SamplingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Smoothing kernels applied to a slice after extraction.
///
/// The meaning of the accompanying factor depends on the kind: a pass count
/// for the 5- and 9-point smoothers, the kernel half-width in cells for
/// Gaussian, and the radius in cells for the aperture averages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmoothingKind {
    #[default]
    None,
    FivePoint,
    NinePoint,
    Gaussian,
    RectangularAperture,
    CircularAperture,
}

impl SmoothingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::FivePoint => "five_point",
            Self::NinePoint => "nine_point",
            Self::Gaussian => "gaussian",
            Self::RectangularAperture => "rectangular_aperture",
            Self::CircularAperture => "circular_aperture",
        }
    }
}

impl FromStr for SmoothingKind {
    type Err = SliceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "none" | "" => Ok(Self::None),
            "five_point" | "5_point" | "sm5s" => Ok(Self::FivePoint),
            "nine_point" | "9_point" | "sm9s" => Ok(Self::NinePoint),
            "gaussian" | "gwfs" => Ok(Self::Gaussian),
            "rectangular_aperture" | "rectangular" | "rects" => Ok(Self::RectangularAperture),
            "circular_aperture" | "circular" | "circs" => Ok(Self::CircularAperture),
            other => Err(SliceError::invalid_parameter(format!(
                "unknown smoothing kind '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for SmoothingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A recoverable condition raised while computing a result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "condition", rename_all = "snake_case")]
pub enum Condition {
    /// A value could not be converted and was passed through unchanged.
    UnitConversion { from: String, to: String },
    /// Zero-length line, empty polygon or similar; treated as a no-op.
    DegenerateGeometry { reason: String },
    /// The requested region holds no data.
    MissingData,
}

impl Condition {
    pub fn unit_conversion(from: impl fmt::Display, to: impl fmt::Display) -> Self {
        Self::UnitConversion {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    pub fn degenerate(reason: impl Into<String>) -> Self {
        Self::DegenerateGeometry {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnitConversion { from, to } => {
                write!(f, "cannot convert {} to {}; value passed through", from, to)
            }
            Self::DegenerateGeometry { reason } => write!(f, "degenerate geometry: {}", reason),
            Self::MissingData => write!(f, "no data in requested region"),
        }
    }
}

/// A value together with the recoverable conditions raised computing it.
#[derive(Debug, Clone, PartialEq)]
pub struct Checked<T> {
    pub value: T,
    pub conditions: Vec<Condition>,
}

impl<T> Checked<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            conditions: Vec::new(),
        }
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn push(&mut self, condition: Condition) {
        if !self.conditions.contains(&condition) {
            self.conditions.push(condition);
        }
    }

    /// Merge the conditions of `other` into this one and return its value.
    pub fn absorb<U>(&mut self, other: Checked<U>) -> U {
        for c in other.conditions {
            self.push(c);
        }
        other.value
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Checked<U> {
        Checked {
            value: f(self.value),
            conditions: self.conditions,
        }
    }

    /// True when no condition was raised.
    pub fn is_clean(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn has_degenerate_geometry(&self) -> bool {
        self.conditions
            .iter()
            .any(|c| matches!(c, Condition::DegenerateGeometry { .. }))
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}

/// Statistics about the slice cache.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
    pub memory_bytes: u64,
    pub evictions: u64,
}

impl CacheStats {
    /// Calculate the cache hit rate (0.0 - 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sampling_mode_from_str() {
        assert_eq!(
            "nearest".parse::<SamplingMode>().unwrap(),
            SamplingMode::NearestNeighbor
        );
        assert_eq!(
            "WEIGHTED_AVERAGE".parse::<SamplingMode>().unwrap(),
            SamplingMode::WeightedAverage
        );
        assert!("cubic".parse::<SamplingMode>().is_err());
        assert_eq!(SamplingMode::default(), SamplingMode::WeightedAverage);
    }

    #[test]
    fn test_smoothing_kind_from_str() {
        assert_eq!(
            "5-point".parse::<SmoothingKind>().unwrap(),
            SmoothingKind::FivePoint
        );
        assert_eq!(
            "circular".parse::<SmoothingKind>().unwrap(),
            SmoothingKind::CircularAperture
        );
        assert_eq!(
            SmoothingKind::Gaussian.to_string().parse::<SmoothingKind>().unwrap(),
            SmoothingKind::Gaussian
        );
        assert!("median".parse::<SmoothingKind>().is_err());
    }

    #[test]
    fn test_checked_dedups_conditions() {
        let mut checked = Checked::new(1);
        checked.push(Condition::MissingData);
        checked.push(Condition::MissingData);
        assert_eq!(checked.conditions.len(), 1);

        let inner = checked.absorb(Checked::new("x").with_condition(Condition::degenerate("p == q")));
        assert_eq!(inner, "x");
        assert!(checked.has_degenerate_geometry());
    }

    #[test]
    fn test_condition_serializes_tagged() {
        let json = serde_json::to_value(Condition::unit_conversion("hPa", "m")).unwrap();
        assert_eq!(json["condition"], "unit_conversion");
        assert_eq!(json["from"], "hPa");
    }

    #[test]
    fn test_cache_stats_hit_rate() {
        let mut stats = CacheStats::default();
        assert!((stats.hit_rate() - 0.0).abs() < f64::EPSILON);

        stats.hits = 80;
        stats.misses = 20;
        assert!((stats.hit_rate() - 0.8).abs() < f64::EPSILON);
    }
}
