//! Named analyzer settings and their SCPI bindings.
//!
//! Each family publishes a table mapping a [`Property`] to the SCPI header
//! that reads and writes it, the unit the instrument uses, and whether the
//! value is a float or an integer. Getters send `"{header}?"`; setters send
//! `"{header} {value}"`.

use crate::error::{Result, SpectrumError};
use crate::units::{Quantity, Unit};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Settings exposed by the analyzer drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Property {
    /// Center frequency
    Center,
    /// Frequency span
    Span,
    /// Start frequency
    Start,
    /// Stop frequency
    Stop,
    /// Reference level
    Reference,
    /// Sweep time
    SweepTime,
    /// Video bandwidth
    Vbw,
    /// Resolution bandwidth
    Rbw,
    /// Number of video averages
    Averages,
}

impl Property {
    /// All properties, in the order initial settings are applied.
    pub const ALL: [Property; 9] = [
        Property::Center,
        Property::Span,
        Property::Start,
        Property::Stop,
        Property::Reference,
        Property::SweepTime,
        Property::Vbw,
        Property::Rbw,
        Property::Averages,
    ];

    /// Snake-case name, e.g. `"sweep_time"`.
    pub fn as_str(self) -> &'static str {
        match self {
            Property::Center => "center",
            Property::Span => "span",
            Property::Start => "start",
            Property::Stop => "stop",
            Property::Reference => "reference",
            Property::SweepTime => "sweep_time",
            Property::Vbw => "vbw",
            Property::Rbw => "rbw",
            Property::Averages => "averages",
        }
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Property {
    type Err = SpectrumError;

    fn from_str(s: &str) -> Result<Self> {
        Property::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| SpectrumError::Config(format!("unknown property '{}'", s)))
    }
}

/// How a property's value is encoded on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Floating-point number
    Float,
    /// Integer
    Integer,
}

/// SCPI binding of one property for one family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertySpec {
    /// Property this entry binds
    pub property: Property,
    /// SCPI header, without the query suffix
    pub header: &'static str,
    /// Unit the instrument reports and accepts
    pub unit: Unit,
    /// Wire encoding of the value
    pub kind: ValueKind,
}

impl PropertySpec {
    pub(crate) const fn float(property: Property, header: &'static str, unit: Unit) -> Self {
        Self {
            property,
            header,
            unit,
            kind: ValueKind::Float,
        }
    }

    pub(crate) const fn integer(property: Property, header: &'static str) -> Self {
        Self {
            property,
            header,
            unit: Unit::Dimensionless,
            kind: ValueKind::Integer,
        }
    }

    /// Query command that reads this property.
    pub fn query_command(&self) -> String {
        format!("{}?", self.header)
    }

    /// Write command that sets this property to `value`.
    ///
    /// `value` is converted to the property's unit first. Integer properties
    /// reject values with a fractional part.
    pub fn write_command(&self, value: Quantity) -> Result<String> {
        let magnitude = value.magnitude_in(self.unit)?;
        if !magnitude.is_finite() {
            return Err(SpectrumError::InvalidValue {
                property: self.property,
                reason: format!("{} is not finite", magnitude),
            });
        }
        match self.kind {
            ValueKind::Float => Ok(format!("{} {}", self.header, magnitude)),
            ValueKind::Integer => {
                if magnitude.fract() != 0.0 {
                    return Err(SpectrumError::InvalidValue {
                        property: self.property,
                        reason: format!("{} is not an integer", magnitude),
                    });
                }
                Ok(format!("{} {}", self.header, magnitude as i64))
            }
        }
    }

    /// Parse the instrument's reply to [`query_command`](Self::query_command).
    pub fn parse_reply(&self, reply: &str) -> Result<Quantity> {
        let trimmed = reply.trim();
        let magnitude = match self.kind {
            ValueKind::Float => trimmed.parse::<f64>().ok(),
            ValueKind::Integer => trimmed.parse::<i64>().ok().map(|v| v as f64),
        };
        magnitude
            .map(|m| Quantity::new(m, self.unit))
            .ok_or_else(|| SpectrumError::MalformedResponse {
                command: self.query_command(),
                response: trimmed.to_string(),
            })
    }
}
