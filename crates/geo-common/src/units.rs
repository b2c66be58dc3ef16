//! A small physical unit system.
//!
//! Covers the quantities that show up on grid axes and in level selections:
//! lengths, pressures, angles, temperatures, speeds and times. Conversion
//! goes through the SI base unit of each dimension, so two units convert
//! only when they share a [`Dimension`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::UnitParseError;

/// The physical dimension of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    Length,
    Pressure,
    Angle,
    Temperature,
    Speed,
    Time,
    Dimensionless,
}

/// A physical unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unit {
    Meter,
    Kilometer,
    Decameter,
    Foot,
    Mile,
    NauticalMile,
    Pascal,
    Hectopascal,
    Kilopascal,
    Millibar,
    Degree,
    Radian,
    Kelvin,
    Celsius,
    Fahrenheit,
    MeterPerSecond,
    Knot,
    KilometerPerHour,
    Second,
    Hour,
    Dimensionless,
}

impl Unit {
    /// Parse a unit specifier string.
    ///
    /// Accepts the usual symbols and a few CF-convention spellings, e.g.
    /// "km", "hPa", "mb", "degrees_east", "m s-1", "knots".
    pub fn parse(s: &str) -> Result<Self, UnitParseError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(UnitParseError::Empty);
        }

        let unit = match trimmed.to_lowercase().as_str() {
            "m" | "meter" | "meters" | "metre" | "metres" | "gpm" => Unit::Meter,
            "km" | "kilometer" | "kilometers" | "kilometre" | "kilometres" => Unit::Kilometer,
            "dam" | "decameter" | "decameters" => Unit::Decameter,
            "ft" | "foot" | "feet" => Unit::Foot,
            "mi" | "mile" | "miles" => Unit::Mile,
            "nm" | "nmi" | "nautical_miles" | "nautical miles" => Unit::NauticalMile,
            "pa" | "pascal" | "pascals" => Unit::Pascal,
            "hpa" | "hectopascal" | "hectopascals" => Unit::Hectopascal,
            "kpa" | "kilopascal" | "kilopascals" => Unit::Kilopascal,
            "mb" | "mbar" | "millibar" | "millibars" => Unit::Millibar,
            "deg" | "degree" | "degrees" | "degrees_east" | "degrees_north" | "degree_east"
            | "degree_north" | "°" => Unit::Degree,
            "rad" | "radian" | "radians" => Unit::Radian,
            "k" | "kelvin" => Unit::Kelvin,
            "c" | "degc" | "celsius" | "°c" => Unit::Celsius,
            "f" | "degf" | "fahrenheit" | "°f" => Unit::Fahrenheit,
            "m/s" | "m s-1" | "m.s-1" | "mps" => Unit::MeterPerSecond,
            "kt" | "kts" | "knot" | "knots" => Unit::Knot,
            "km/h" | "kph" | "km h-1" => Unit::KilometerPerHour,
            "s" | "sec" | "second" | "seconds" => Unit::Second,
            "h" | "hr" | "hour" | "hours" => Unit::Hour,
            "1" | "dimensionless" | "none" => Unit::Dimensionless,
            _ => return Err(UnitParseError::Unknown(trimmed.to_string())),
        };

        Ok(unit)
    }

    /// Canonical symbol for this unit.
    pub fn symbol(&self) -> &'static str {
        match self {
            Unit::Meter => "m",
            Unit::Kilometer => "km",
            Unit::Decameter => "dam",
            Unit::Foot => "ft",
            Unit::Mile => "mi",
            Unit::NauticalMile => "nm",
            Unit::Pascal => "Pa",
            Unit::Hectopascal => "hPa",
            Unit::Kilopascal => "kPa",
            Unit::Millibar => "mb",
            Unit::Degree => "deg",
            Unit::Radian => "rad",
            Unit::Kelvin => "K",
            Unit::Celsius => "C",
            Unit::Fahrenheit => "F",
            Unit::MeterPerSecond => "m/s",
            Unit::Knot => "kt",
            Unit::KilometerPerHour => "km/h",
            Unit::Second => "s",
            Unit::Hour => "h",
            Unit::Dimensionless => "1",
        }
    }

    pub fn dimension(&self) -> Dimension {
        match self {
            Unit::Meter
            | Unit::Kilometer
            | Unit::Decameter
            | Unit::Foot
            | Unit::Mile
            | Unit::NauticalMile => Dimension::Length,
            Unit::Pascal | Unit::Hectopascal | Unit::Kilopascal | Unit::Millibar => {
                Dimension::Pressure
            }
            Unit::Degree | Unit::Radian => Dimension::Angle,
            Unit::Kelvin | Unit::Celsius | Unit::Fahrenheit => Dimension::Temperature,
            Unit::MeterPerSecond | Unit::Knot | Unit::KilometerPerHour => Dimension::Speed,
            Unit::Second | Unit::Hour => Dimension::Time,
            Unit::Dimensionless => Dimension::Dimensionless,
        }
    }

    /// Whether values in this unit can be expressed in `other`.
    pub fn can_convert(&self, other: Unit) -> bool {
        self.dimension() == other.dimension()
    }

    /// Convert a value in this unit to the SI base unit of its dimension
    /// (m, Pa, rad, K, m/s, s).
    pub fn to_base(&self, value: f64) -> f64 {
        match self {
            Unit::Celsius => value + 273.15,
            Unit::Fahrenheit => (value - 32.0) * 5.0 / 9.0 + 273.15,
            _ => value * self.scale(),
        }
    }

    /// Convert a value in the SI base unit of this unit's dimension into this unit.
    pub fn from_base(&self, value: f64) -> f64 {
        match self {
            Unit::Celsius => value - 273.15,
            Unit::Fahrenheit => (value - 273.15) * 9.0 / 5.0 + 32.0,
            _ => value / self.scale(),
        }
    }

    /// Convert `value` from this unit to `to`.
    ///
    /// Returns `None` when the dimensions differ.
    pub fn convert(&self, value: f64, to: Unit) -> Option<f64> {
        if *self == to {
            return Some(value);
        }
        if !self.can_convert(to) {
            return None;
        }
        Some(to.from_base(self.to_base(value)))
    }

    fn scale(&self) -> f64 {
        match self {
            Unit::Meter => 1.0,
            Unit::Kilometer => 1000.0,
            Unit::Decameter => 10.0,
            Unit::Foot => 0.3048,
            Unit::Mile => 1609.344,
            Unit::NauticalMile => 1852.0,
            Unit::Pascal => 1.0,
            Unit::Hectopascal | Unit::Millibar => 100.0,
            Unit::Kilopascal => 1000.0,
            Unit::Degree => std::f64::consts::PI / 180.0,
            Unit::Radian => 1.0,
            Unit::Kelvin => 1.0,
            Unit::MeterPerSecond => 1.0,
            Unit::Knot => 1852.0 / 3600.0,
            Unit::KilometerPerHour => 1000.0 / 3600.0,
            Unit::Second => 1.0,
            Unit::Hour => 3600.0,
            Unit::Dimensionless => 1.0,
            // Affine units are handled in to_base/from_base.
            Unit::Celsius | Unit::Fahrenheit => 1.0,
        }
    }
}

impl FromStr for Unit {
    type Err = UnitParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Unit::parse(s)
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl Serialize for Unit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.symbol())
    }
}

impl<'de> Deserialize<'de> for Unit {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Unit::parse(&s).map_err(serde::de::Error::custom)
    }
}
