//! 1976 US standard atmosphere.
//!
//! Used to place pressure levels on a height axis. The troposphere has a
//! constant lapse rate; above the tropopause (11 km) the layer is taken as
//! isothermal. Pressures are hPa, heights meters above mean sea level.

/// Sea level pressure (hPa)
pub const SEA_LEVEL_PRESSURE_HPA: f64 = 1013.25;
/// Sea level temperature (K)
pub const SEA_LEVEL_TEMPERATURE_K: f64 = 288.15;
/// Tropospheric lapse rate (K/m)
pub const LAPSE_RATE: f64 = 0.0065;
/// Tropopause height (m)
pub const TROPOPAUSE_HEIGHT_M: f64 = 11_000.0;

const GRAVITY: f64 = 9.80665;
const GAS_CONSTANT_DRY_AIR: f64 = 287.053;

fn exponent() -> f64 {
    GRAVITY / (GAS_CONSTANT_DRY_AIR * LAPSE_RATE)
}

fn tropopause_temperature() -> f64 {
    SEA_LEVEL_TEMPERATURE_K - LAPSE_RATE * TROPOPAUSE_HEIGHT_M
}

fn tropopause_pressure() -> f64 {
    SEA_LEVEL_PRESSURE_HPA
        * (tropopause_temperature() / SEA_LEVEL_TEMPERATURE_K).powf(exponent())
}

fn scale_height() -> f64 {
    GAS_CONSTANT_DRY_AIR * tropopause_temperature() / GRAVITY
}

/// Height (m) of a pressure surface (hPa). Non-positive pressure gives NaN.
pub fn pressure_to_height(pressure_hpa: f64) -> f64 {
    if pressure_hpa.is_nan() || pressure_hpa <= 0.0 {
        return f64::NAN;
    }

    let p11 = tropopause_pressure();
    if pressure_hpa >= p11 {
        let ratio = pressure_hpa / SEA_LEVEL_PRESSURE_HPA;
        SEA_LEVEL_TEMPERATURE_K / LAPSE_RATE * (1.0 - ratio.powf(1.0 / exponent()))
    } else {
        TROPOPAUSE_HEIGHT_M + scale_height() * (p11 / pressure_hpa).ln()
    }
}

/// Pressure (hPa) at a height (m).
pub fn height_to_pressure(height_m: f64) -> f64 {
    if height_m.is_nan() {
        return f64::NAN;
    }

    if height_m <= TROPOPAUSE_HEIGHT_M {
        let t = SEA_LEVEL_TEMPERATURE_K - LAPSE_RATE * height_m;
        if t <= 0.0 {
            return f64::NAN;
        }
        SEA_LEVEL_PRESSURE_HPA * (t / SEA_LEVEL_TEMPERATURE_K).powf(exponent())
    } else {
        tropopause_pressure() * (-(height_m - TROPOPAUSE_HEIGHT_M) / scale_height()).exp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sea_level() {
        assert!(pressure_to_height(SEA_LEVEL_PRESSURE_HPA).abs() < 1e-9);
        assert!((height_to_pressure(0.0) - SEA_LEVEL_PRESSURE_HPA).abs() < 1e-9);
    }

    #[test]
    fn test_standard_levels() {
        let h500 = pressure_to_height(500.0);
        assert!((h500 - 5574.0).abs() < 5.0, "500 hPa at {}", h500);

        let h850 = pressure_to_height(850.0);
        assert!((h850 - 1457.0).abs() < 5.0, "850 hPa at {}", h850);

        let h200 = pressure_to_height(200.0);
        assert!(h200 > TROPOPAUSE_HEIGHT_M, "200 hPa at {}", h200);
        assert!((h200 - 11784.0).abs() < 10.0, "200 hPa at {}", h200);
    }

    #[test]
    fn test_tropopause_pressure() {
        assert!((tropopause_pressure() - 226.32).abs() < 0.05);
    }

    #[test]
    fn test_roundtrip_through_tropopause() {
        for p in [1000.0, 700.0, 300.0, 226.0, 100.0, 50.0] {
            let back = height_to_pressure(pressure_to_height(p));
            assert!((back - p).abs() < 1e-6, "{} -> {}", p, back);
        }
    }

    #[test]
    fn test_invalid_pressure() {
        assert!(pressure_to_height(0.0).is_nan());
        assert!(pressure_to_height(-5.0).is_nan());
        assert!(height_to_pressure(f64::NAN).is_nan());
    }
}
