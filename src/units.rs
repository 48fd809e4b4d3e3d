//! Unit-bearing values for analyzer settings.
//!
//! Every analyzer property carries a unit (Hz for frequencies, seconds for
//! sweep time, dBm for the reference level). Values handed to setters are
//! converted to the property's unit before they are sent, so a caller may
//! write `Quantity::mhz(2.5)` to a property expressed in Hz.

use crate::error::{Result, SpectrumError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Physical dimension of a [`Unit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    /// Frequency (base unit Hz)
    Frequency,
    /// Time (base unit s)
    Time,
    /// Logarithmic power (dBm only)
    LogPower,
    /// Plain number
    None,
}

/// Units understood by the drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Unit {
    /// Hertz
    #[serde(rename = "Hz")]
    Hertz,
    /// Kilohertz
    #[serde(rename = "kHz")]
    Kilohertz,
    /// Megahertz
    #[serde(rename = "MHz")]
    Megahertz,
    /// Gigahertz
    #[serde(rename = "GHz")]
    Gigahertz,
    /// Seconds
    #[serde(rename = "s")]
    Second,
    /// Milliseconds
    #[serde(rename = "ms")]
    Millisecond,
    /// Microseconds
    #[serde(rename = "us")]
    Microsecond,
    /// Decibel-milliwatts
    #[serde(rename = "dBm")]
    Dbm,
    /// No unit
    #[serde(rename = "")]
    Dimensionless,
}

impl Unit {
    /// Dimension this unit measures.
    pub fn dimension(self) -> Dimension {
        match self {
            Unit::Hertz | Unit::Kilohertz | Unit::Megahertz | Unit::Gigahertz => {
                Dimension::Frequency
            }
            Unit::Second | Unit::Millisecond | Unit::Microsecond => Dimension::Time,
            Unit::Dbm => Dimension::LogPower,
            Unit::Dimensionless => Dimension::None,
        }
    }

    /// Factor that converts a magnitude in this unit to the base unit.
    fn scale(self) -> f64 {
        match self {
            Unit::Hertz | Unit::Second | Unit::Dbm | Unit::Dimensionless => 1.0,
            Unit::Kilohertz => 1e3,
            Unit::Megahertz => 1e6,
            Unit::Gigahertz => 1e9,
            Unit::Millisecond => 1e-3,
            Unit::Microsecond => 1e-6,
        }
    }

    /// Conventional symbol, e.g. `"MHz"`.
    pub fn symbol(self) -> &'static str {
        match self {
            Unit::Hertz => "Hz",
            Unit::Kilohertz => "kHz",
            Unit::Megahertz => "MHz",
            Unit::Gigahertz => "GHz",
            Unit::Second => "s",
            Unit::Millisecond => "ms",
            Unit::Microsecond => "us",
            Unit::Dbm => "dBm",
            Unit::Dimensionless => "",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unit::Dimensionless => write!(f, "dimensionless"),
            other => write!(f, "{}", other.symbol()),
        }
    }
}

/// A magnitude paired with its unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quantity {
    /// Numeric value expressed in `unit`
    pub magnitude: f64,
    /// Unit of `magnitude`
    pub unit: Unit,
}

impl Quantity {
    /// Create a quantity.
    pub fn new(magnitude: f64, unit: Unit) -> Self {
        Self { magnitude, unit }
    }

    /// Frequency in Hz.
    pub fn hz(magnitude: f64) -> Self {
        Self::new(magnitude, Unit::Hertz)
    }

    /// Frequency in kHz.
    pub fn khz(magnitude: f64) -> Self {
        Self::new(magnitude, Unit::Kilohertz)
    }

    /// Frequency in MHz.
    pub fn mhz(magnitude: f64) -> Self {
        Self::new(magnitude, Unit::Megahertz)
    }

    /// Frequency in GHz.
    pub fn ghz(magnitude: f64) -> Self {
        Self::new(magnitude, Unit::Gigahertz)
    }

    /// Time in seconds.
    pub fn seconds(magnitude: f64) -> Self {
        Self::new(magnitude, Unit::Second)
    }

    /// Level in dBm.
    pub fn dbm(magnitude: f64) -> Self {
        Self::new(magnitude, Unit::Dbm)
    }

    /// Plain number.
    pub fn dimensionless(magnitude: f64) -> Self {
        Self::new(magnitude, Unit::Dimensionless)
    }

    /// Convert to `unit`, failing if the dimensions differ.
    pub fn to(self, unit: Unit) -> Result<Quantity> {
        if self.unit.dimension() != unit.dimension() {
            return Err(SpectrumError::UnitMismatch {
                from: self.unit,
                to: unit,
            });
        }
        if self.unit == unit {
            return Ok(self);
        }
        Ok(Quantity::new(
            self.magnitude * self.unit.scale() / unit.scale(),
            unit,
        ))
    }

    /// Magnitude expressed in `unit`.
    pub fn magnitude_in(self, unit: Unit) -> Result<f64> {
        Ok(self.to(unit)?.magnitude)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.unit {
            Unit::Dimensionless => write!(f, "{}", self.magnitude),
            unit => write!(f, "{} {}", self.magnitude, unit.symbol()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_within_frequency() {
        let q = Quantity::mhz(2.5).to(Unit::Hertz).unwrap();
        assert_eq!(q, Quantity::hz(2_500_000.0));

        let ghz = Quantity::hz(1.5e9).magnitude_in(Unit::Gigahertz).unwrap();
        assert!((ghz - 1.5).abs() < 1e-12);
    }

    #[test]
    fn converts_within_time() {
        let s = Quantity::new(250.0, Unit::Millisecond)
            .magnitude_in(Unit::Second)
            .unwrap();
        assert!((s - 0.25).abs() < 1e-12);
    }

    #[test]
    fn rejects_cross_dimension() {
        let err = Quantity::seconds(1.0).to(Unit::Hertz).unwrap_err();
        assert!(matches!(
            err,
            SpectrumError::UnitMismatch {
                from: Unit::Second,
                to: Unit::Hertz
            }
        ));
        assert!(Quantity::dbm(-10.0).to(Unit::Dimensionless).is_err());
    }

    #[test]
    fn display() {
        assert_eq!(Quantity::hz(1000.0).to_string(), "1000 Hz");
        assert_eq!(Quantity::dimensionless(4.0).to_string(), "4");
        assert_eq!(Unit::Dimensionless.to_string(), "dimensionless");
    }
}
