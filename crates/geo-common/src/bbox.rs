//! Geographic bounding boxes.

use serde::{Deserialize, Serialize};

use crate::error::BboxParseError;

/// A lat/lon bounding box in degrees.
///
/// `min_lon` may be greater than 180 for grids stored in 0..360.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        }
    }

    /// Parse "min_lon,min_lat,max_lon,max_lat".
    pub fn parse(s: &str) -> Result<Self, BboxParseError> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(BboxParseError::InvalidFormat(s.to_string()));
        }

        let mut values = [0.0f64; 4];
        for (slot, part) in values.iter_mut().zip(&parts) {
            *slot = part
                .parse()
                .map_err(|_| BboxParseError::InvalidNumber(part.to_string()))?;
        }

        Ok(Self::new(values[0], values[1], values[2], values[3]))
    }

    /// Width in degrees of longitude.
    pub fn width(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    /// Height in degrees of latitude.
    pub fn height(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_lon + self.max_lon) / 2.0,
            (self.min_lat + self.max_lat) / 2.0,
        )
    }

    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        lon >= self.min_lon && lon <= self.max_lon && lat >= self.min_lat && lat <= self.max_lat
    }

    /// Smallest box enclosing all `(lon, lat)` points.
    pub fn enclosing<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let mut iter = points.into_iter().filter(|(x, y)| !x.is_nan() && !y.is_nan());
        let (x0, y0) = iter.next()?;
        let mut bbox = Self::new(x0, y0, x0, y0);
        for (x, y) in iter {
            bbox.min_lon = bbox.min_lon.min(x);
            bbox.max_lon = bbox.max_lon.max(x);
            bbox.min_lat = bbox.min_lat.min(y);
            bbox.max_lat = bbox.max_lat.max(y);
        }
        Some(bbox)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bbox() {
        let bbox = BoundingBox::parse("-125.0, 24.0,-66.0,50.0").unwrap();
        assert_eq!(bbox.min_lon, -125.0);
        assert_eq!(bbox.min_lat, 24.0);
        assert_eq!(bbox.max_lon, -66.0);
        assert_eq!(bbox.max_lat, 50.0);

        assert!(matches!(
            BoundingBox::parse("1,2,3"),
            Err(BboxParseError::InvalidFormat(_))
        ));
        assert!(matches!(
            BoundingBox::parse("1,2,x,4"),
            Err(BboxParseError::InvalidNumber(_))
        ));
    }

    #[test]
    fn test_enclosing_skips_missing() {
        let bbox = BoundingBox::enclosing(vec![
            (10.0, 5.0),
            (f64::NAN, 0.0),
            (-3.0, 8.0),
        ])
        .unwrap();
        assert_eq!(bbox, BoundingBox::new(-3.0, 5.0, 10.0, 8.0));
        assert!(BoundingBox::enclosing(Vec::new()).is_none());
    }
}
