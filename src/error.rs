//! Error types for the spectrum analyzer drivers.
//!
//! [`SpectrumError`] is the single error type returned by every driver
//! operation. Using `thiserror`, lower-level failures are folded into it with
//! `#[from]` so the `?` operator works across module boundaries.
//!
//! ## Error Categories
//!
//! 1. **Caller errors** - `InvalidSelector`, `UnsupportedProperty`,
//!    `UnitMismatch`, `InvalidValue`
//!    - Raised before any I/O takes place
//!    - Recovery: fix the argument
//!
//! 2. **Instrument errors** - `MalformedTrace`, `MalformedResponse`,
//!    `UnsupportedInstrument`, `Transport`
//!    - Raised while talking to the device
//!    - Recovery: none inside this crate; no call is ever retried
//!
//! 3. **Configuration errors** - `Config`, `ConfigLoad`
//!    - Raised while loading or validating settings
//!    - Recovery: fix the configuration file or environment

use crate::family::InstrumentFamily;
use crate::properties::Property;
use crate::trace::TraceSelector;
use crate::units::Unit;
use thiserror::Error;

/// Convenience alias for results using [`SpectrumError`].
pub type Result<T> = std::result::Result<T, SpectrumError>;

/// Opaque communication failure reported by a transport.
///
/// Timeouts, disconnects and I/O errors all end up here. The driver never
/// inspects or recovers from them; they are handed to the caller unchanged.
#[derive(Error, Debug)]
#[error(transparent)]
pub struct TransportError(#[from] anyhow::Error);

impl TransportError {
    /// Create a transport error from a message.
    pub fn msg(message: impl std::fmt::Display + std::fmt::Debug + Send + Sync + 'static) -> Self {
        Self(anyhow::Error::msg(message))
    }
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        Self(anyhow::Error::new(err))
    }
}

/// Primary error type for spectrum analyzer operations.
#[derive(Error, Debug)]
pub enum SpectrumError {
    /// Trace selector is not in the family's allowed set.
    ///
    /// Raised before any command is sent to the instrument.
    #[error("invalid trace selector '{selector}' for {family} (allowed: {allowed})")]
    InvalidSelector {
        /// Family the selector was checked against
        family: InstrumentFamily,
        /// Rejected selector
        selector: TraceSelector,
        /// Human-readable list of accepted selectors
        allowed: String,
    },

    /// Trace reply contained a token that is not a number.
    #[error("malformed trace: token {index} ('{token}') is not a number")]
    MalformedTrace {
        /// Zero-based position of the offending token
        index: usize,
        /// Offending token, trimmed
        token: String,
    },

    /// Reply to a property query could not be parsed.
    #[error("malformed response to '{command}': '{response}'")]
    MalformedResponse {
        /// Query that was sent
        command: String,
        /// Reply that was received
        response: String,
    },

    /// The family has no command for this property.
    #[error("{family} does not support property '{property}'")]
    UnsupportedProperty {
        /// Instrument family
        family: InstrumentFamily,
        /// Requested property
        property: Property,
    },

    /// A quantity was supplied in a unit of a different dimension.
    #[error("cannot convert {from} to {to}")]
    UnitMismatch {
        /// Unit the value was given in
        from: Unit,
        /// Unit the property expects
        to: Unit,
    },

    /// A value has the right unit but is not acceptable for the property.
    #[error("invalid value for '{property}': {reason}")]
    InvalidValue {
        /// Property being written
        property: Property,
        /// Why the value was rejected
        reason: String,
    },

    /// Identity probing found no supported driver family.
    #[error("unsupported instrument: {0}")]
    UnsupportedInstrument(String),

    /// Configuration values parsed but failed validation.
    #[error("Configuration validation error: {0}")]
    Config(String),

    /// Configuration could not be loaded or deserialized.
    #[error("Configuration error: {0}")]
    ConfigLoad(#[from] Box<figment::Error>),

    /// Trace export failed.
    #[cfg(feature = "storage_csv")]
    #[error("Export error: {0}")]
    Export(#[from] csv::Error),

    /// Communication failure, surfaced unchanged from the transport.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl From<figment::Error> for SpectrumError {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_error_is_transparent() {
        let err: SpectrumError = TransportError::msg("VISA timeout").into();
        assert_eq!(err.to_string(), "VISA timeout");
    }

    #[test]
    fn io_errors_become_transport_errors() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "device unplugged");
        let err = SpectrumError::from(TransportError::from(io));
        assert!(matches!(err, SpectrumError::Transport(_)));
        assert!(err.to_string().contains("device unplugged"));
    }

    #[test]
    fn malformed_trace_message_names_token() {
        let err = SpectrumError::MalformedTrace {
            index: 1,
            token: "bad".into(),
        };
        assert_eq!(
            err.to_string(),
            "malformed trace: token 1 ('bad') is not a number"
        );
    }
}
