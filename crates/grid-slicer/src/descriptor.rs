//! JSON/YAML interchange format for gridded fields.
//!
//! A descriptor is the serialized form of a [`GriddedField`]: domain
//! definition, level axis, valid times and a flat sample buffer where `null`
//! marks a missing sample.
//!
//! ```json
//! {
//!   "id": "gfs_tmp",
//!   "parameter": "TMP",
//!   "unit": "K",
//!   "domain": {
//!     "type": "lat_lon",
//!     "lon": { "first": 0.0, "step": 1.0, "len": 4 },
//!     "lat": { "first": 40.0, "step": 1.0, "len": 2 }
//!   },
//!   "vertical": { "values": [1000.0, 500.0], "unit": "hPa" },
//!   "times": ["2024-01-15T12:00:00Z"],
//!   "values": [280.0, 281.0, null, ...]
//! }
//! ```

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use geo_common::{AxisOrder, LinearAxis, Unit};
use projection::lambert::LambertParams;
use projection::LambertConformal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{HorizontalDomain, SpatialDomain, VerticalAxis};
use crate::error::{Result, SliceError};
use crate::field::GriddedField;

/// Horizontal domain definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainDescriptor {
    LatLon {
        lon: LinearAxis,
        lat: LinearAxis,
        #[serde(default)]
        order: AxisOrder,
        #[serde(default = "degrees")]
        unit: Unit,
    },
    LambertConformal {
        first_lat: f64,
        first_lon: f64,
        lov: f64,
        latin1: f64,
        latin2: f64,
        dx: f64,
        dy: f64,
        nx: usize,
        ny: usize,
    },
    Curvilinear {
        nx: usize,
        ny: usize,
        lats: Vec<f64>,
        lons: Vec<f64>,
    },
}

fn degrees() -> Unit {
    Unit::Degree
}

/// Vertical level axis definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerticalDescriptor {
    pub values: Vec<f64>,
    pub unit: Unit,
}

/// Serialized form of a [`GriddedField`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub id: String,
    #[serde(default)]
    pub parameter: String,
    pub unit: String,
    pub domain: DomainDescriptor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertical: Option<VerticalDescriptor>,
    #[serde(default)]
    pub times: Vec<DateTime<Utc>>,
    pub values: Vec<Option<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terrain: Option<Vec<Option<f32>>>,
}

impl DomainDescriptor {
    fn into_horizontal(self) -> Result<HorizontalDomain> {
        Ok(match self {
            Self::LatLon {
                lon,
                lat,
                order,
                unit,
            } => HorizontalDomain::LatLon {
                lon,
                lat,
                order,
                unit,
            },
            Self::LambertConformal {
                first_lat,
                first_lon,
                lov,
                latin1,
                latin2,
                dx,
                dy,
                nx,
                ny,
            } => {
                let lambert = LambertConformal::new(LambertParams {
                    first_lat,
                    first_lon,
                    lov,
                    latin1,
                    latin2,
                    dx,
                    dy,
                    nx,
                    ny,
                })?;
                HorizontalDomain::Projected {
                    transform: Arc::new(lambert),
                }
            }
            Self::Curvilinear { nx, ny, lats, lons } => HorizontalDomain::Curvilinear { nx, ny, lats, lons },
        })
    }
}

fn missing_as_nan(values: Vec<Option<f32>>) -> Vec<f32> {
    values.into_iter().map(|v| v.unwrap_or(f32::NAN)).collect()
}

impl FieldDescriptor {
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Read a descriptor, choosing the format by file extension
    /// (`.yaml`/`.yml`, anything else is JSON).
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let is_yaml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));
        debug!(path = %path.display(), yaml = is_yaml, "Reading field descriptor");
        if is_yaml {
            Self::from_yaml_str(&text)
        } else {
            Self::from_json_str(&text)
        }
    }

    /// Build the field, checking the sample count against the domain.
    pub fn into_field(self) -> Result<GriddedField> {
        let horizontal = self.domain.into_horizontal()?;
        let vertical = self.vertical.map(|v| VerticalAxis::new(v.values, v.unit));
        let domain = SpatialDomain::new(horizontal, vertical)?;

        let field = GriddedField::new(
            self.id,
            self.parameter,
            self.unit,
            domain,
            self.times,
            missing_as_nan(self.values),
        )?;

        match self.terrain {
            Some(terrain) => field.with_terrain(missing_as_nan(terrain)),
            None => Ok(field),
        }
    }
}

impl GriddedField {
    /// Build a field from its serialized form.
    pub fn from_descriptor(descriptor: FieldDescriptor) -> Result<Self> {
        descriptor.into_field()
    }

    /// Serialized form of a lat/lon or curvilinear field.
    ///
    /// Projected domains carry an opaque transform and cannot be described;
    /// they return [`SliceError::InvalidParameter`].
    pub fn to_descriptor(&self) -> Result<FieldDescriptor> {
        let domain = match &self.domain.horizontal {
            HorizontalDomain::LatLon {
                lon,
                lat,
                order,
                unit,
            } => DomainDescriptor::LatLon {
                lon: *lon,
                lat: *lat,
                order: *order,
                unit: *unit,
            },
            HorizontalDomain::Curvilinear { nx, ny, lats, lons } => DomainDescriptor::Curvilinear {
                nx: *nx,
                ny: *ny,
                lats: lats.clone(),
                lons: lons.clone(),
            },
            HorizontalDomain::Projected { transform } => {
                return Err(SliceError::invalid_parameter(format!(
                    "projected domain '{}' has no descriptor form",
                    transform.name()
                )))
            }
        };

        let present = |v: &f32| (!v.is_nan()).then_some(*v);
        Ok(FieldDescriptor {
            id: self.id.clone(),
            parameter: self.parameter.clone(),
            unit: self.unit.clone(),
            domain,
            vertical: self.vertical().map(|v| VerticalDescriptor {
                values: v.values.clone(),
                unit: v.unit,
            }),
            times: self.times.clone(),
            values: self.values().iter().map(present).collect(),
            terrain: self.terrain().map(|t| t.iter().map(present).collect()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const LATLON_JSON: &str = r#"{
        "id": "tmp",
        "parameter": "TMP",
        "unit": "K",
        "domain": {
            "type": "lat_lon",
            "lon": { "first": 0.0, "step": 1.0, "len": 3 },
            "lat": { "first": 40.0, "step": 1.0, "len": 2 }
        },
        "vertical": { "values": [1000.0, 500.0], "unit": "hPa" },
        "times": ["2024-01-15T12:00:00Z"],
        "values": [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, null]
    }"#;

    #[test]
    fn test_lat_lon_descriptor() {
        let field = FieldDescriptor::from_json_str(LATLON_JSON).unwrap().into_field().unwrap();
        assert_eq!(field.shape(), (3, 2, 2));
        assert_eq!(field.vertical().unwrap().unit, Unit::Hectopascal);
        assert_eq!(field.get(1, 0, 0, 0), Some(2.0));
        assert!(field.get(2, 1, 1, 0).unwrap().is_nan());
        assert_eq!(field.times.len(), 1);
    }

    #[test]
    fn test_wrong_sample_count_rejected() {
        let text = LATLON_JSON.replace(", 11, null]", "]");
        let result = GriddedField::from_descriptor(FieldDescriptor::from_json_str(&text).unwrap());
        assert!(matches!(result, Err(SliceError::MalformedDomain(_))));
    }

    #[test]
    fn test_lambert_descriptor() {
        let yaml = r#"
id: hrrr_sub
unit: K
domain:
  type: lambert_conformal
  first_lat: 21.138123
  first_lon: -122.719528
  lov: -97.5
  latin1: 38.5
  latin2: 38.5
  dx: 3000.0
  dy: 3000.0
  nx: 2
  ny: 2
values: [1.0, 2.0, 3.0, 4.0]
"#;
        let field = FieldDescriptor::from_yaml_str(yaml).unwrap().into_field().unwrap();
        assert!(field.domain.has_transform());
        assert!(field.to_descriptor().is_err());
    }

    #[test]
    fn test_descriptor_from_yaml_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "id: c\nunit: m\ndomain:\n  type: curvilinear\n  nx: 2\n  ny: 1\n  lats: [10.0, 10.5]\n  lons: [20.0, 21.0]\nvalues: [5.0, null]"
        )
        .unwrap();
        let field = FieldDescriptor::from_file(file.path()).unwrap().into_field().unwrap();
        assert_eq!(field.shape(), (2, 1, 1));
    }

    #[test]
    fn test_to_descriptor_marks_missing() {
        let field = FieldDescriptor::from_json_str(LATLON_JSON).unwrap().into_field().unwrap();
        let back = field.to_descriptor().unwrap();
        assert_eq!(back.values[11], None);
        assert_eq!(back.values[0], Some(1.0));
        assert_eq!(back.domain, FieldDescriptor::from_json_str(LATLON_JSON).unwrap().domain);
    }
}
