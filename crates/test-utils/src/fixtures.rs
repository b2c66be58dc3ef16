//! Common test fixtures: level sets, reference points and grid extents.

/// Vertical level sets as they appear in model output.
pub mod levels {
    /// Mandatory pressure levels, surface first (hPa)
    pub const PRESSURE_SURFACE_FIRST_HPA: [f64; 5] = [1000.0, 850.0, 700.0, 500.0, 300.0];

    /// Same levels, top first (hPa)
    pub const PRESSURE_TOP_FIRST_HPA: [f64; 5] = [300.0, 500.0, 700.0, 850.0, 1000.0];

    /// Height levels above MSL (m)
    pub const HEIGHT_M: [f64; 4] = [0.0, 1000.0, 3000.0, 6000.0];
}

/// Reference points as `(lat, lon)` in degrees.
pub mod points {
    pub const KANSAS_CITY: (f64, f64) = (39.0, -94.5);
    pub const CHICAGO: (f64, f64) = (41.9, -87.6);

    /// Just west of the antimeridian
    pub const SEAM_WEST: (f64, f64) = (0.0, 179.0);
    /// Just east of the antimeridian
    pub const SEAM_EAST: (f64, f64) = (0.0, -179.0);
}

/// Regular lat/lon grid extents.
pub mod grid {
    /// Regular lat/lon grid definition for tests.
    #[derive(Debug, Clone, Copy)]
    pub struct LatLonExtent {
        pub width: usize,
        pub height: usize,
        pub first_lon: f64,
        pub first_lat: f64,
        pub dlon: f64,
        pub dlat: f64,
    }

    impl LatLonExtent {
        pub fn size(&self) -> usize {
            self.width * self.height
        }

        pub fn last_lon(&self) -> f64 {
            self.first_lon + self.dlon * (self.width as f64 - 1.0)
        }

        pub fn last_lat(&self) -> f64 {
            self.first_lat + self.dlat * (self.height as f64 - 1.0)
        }
    }

    /// One row of ten points along 45°N, lon 0..9
    pub const ROW_10X1: LatLonExtent = LatLonExtent {
        width: 10,
        height: 1,
        first_lon: 0.0,
        first_lat: 45.0,
        dlon: 1.0,
        dlat: 1.0,
    };

    /// 1° CONUS window stored in 0..360 longitudes, north to south
    pub const CONUS_1DEG_360: LatLonExtent = LatLonExtent {
        width: 71,
        height: 36,
        first_lon: 230.0,
        first_lat: 55.0,
        dlon: 1.0,
        dlat: -1.0,
    };

    /// 1° band spanning the antimeridian, 170E..190E
    pub const DATELINE_BAND: LatLonExtent = LatLonExtent {
        width: 21,
        height: 11,
        first_lon: 170.0,
        first_lat: -5.0,
        dlon: 1.0,
        dlat: 1.0,
    };
}

/// Common time values for testing.
pub mod time {
    /// Three hourly steps
    pub const HOURLY_STEPS: [&str; 3] = [
        "2024-01-15T12:00:00Z",
        "2024-01-15T13:00:00Z",
        "2024-01-15T14:00:00Z",
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extent_size() {
        assert_eq!(grid::CONUS_1DEG_360.size(), 71 * 36);
        assert_eq!(grid::ROW_10X1.size(), 10);
    }

    #[test]
    fn test_extent_last() {
        assert_eq!(grid::ROW_10X1.last_lon(), 9.0);
        assert_eq!(grid::CONUS_1DEG_360.last_lon(), 300.0);
        assert_eq!(grid::CONUS_1DEG_360.last_lat(), 20.0);
        assert_eq!(grid::DATELINE_BAND.last_lon(), 190.0);
    }
}
