//! Earth locations.

use serde::{Deserialize, Serialize};

/// A point on (or above) the earth.
///
/// Latitude and longitude are in degrees, altitude in meters above mean sea
/// level. A NaN altitude means "no altitude given".
///
/// Longitude is stored exactly as given. Callers that compare against a grid
/// whose longitudes run 0..360 (or -180..180) must normalize explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EarthLocation {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default = "missing_altitude", skip_serializing_if = "is_missing_altitude")]
    pub altitude: f64,
}

fn missing_altitude() -> f64 {
    f64::NAN
}

fn is_missing_altitude(altitude: &f64) -> bool {
    altitude.is_nan()
}

impl EarthLocation {
    pub fn new(latitude: f64, longitude: f64, altitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude,
        }
    }

    /// A location with no altitude.
    pub fn surface(latitude: f64, longitude: f64) -> Self {
        Self::new(latitude, longitude, f64::NAN)
    }

    /// Whether an altitude was supplied.
    pub fn has_altitude(&self) -> bool {
        !self.altitude.is_nan()
    }

    pub fn with_altitude(self, altitude: f64) -> Self {
        Self { altitude, ..self }
    }

    pub fn with_longitude(self, longitude: f64) -> Self {
        Self { longitude, ..self }
    }

    /// True if latitude or longitude is missing.
    pub fn is_missing(&self) -> bool {
        self.latitude.is_nan() || self.longitude.is_nan()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_has_no_altitude() {
        let loc = EarthLocation::surface(45.0, -100.0);
        assert!(!loc.has_altitude());
        assert!(loc.with_altitude(1500.0).has_altitude());
    }

    #[test]
    fn test_longitude_not_normalized() {
        let loc = EarthLocation::surface(10.0, 350.0);
        assert_eq!(loc.longitude, 350.0);
    }

    #[test]
    fn test_missing() {
        assert!(EarthLocation::surface(f64::NAN, 0.0).is_missing());
        assert!(!EarthLocation::surface(0.0, 0.0).is_missing());
    }
}
