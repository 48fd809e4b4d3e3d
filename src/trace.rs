//! Trace retrieval and frequency-axis reconstruction.
//!
//! A trace fetch is a single exchange: the selector is mapped to the
//! family's trace query, the comma-separated reply is parsed into power
//! values, and the frequency axis is rebuilt by linear interpolation between
//! the instrument's start and stop frequencies.
//!
//! # Example
//!
//! ```rust,ignore
//! use spectrum_daq::trace::{get_trace, TraceSelector};
//!
//! let trace = get_trace(&analyzer, 'A').await?;
//! for (freq, power) in trace.iter() {
//!     println!("{freq} Hz: {power}");
//! }
//! ```

use crate::error::{Result, SpectrumError, TransportError};
use crate::family::InstrumentFamily;
use crate::units::{Quantity, Unit};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::instrument;

/// Identifies one hardware trace buffer.
///
/// HP 856x instruments name traces by letter (`A`, `B`); N932xC instruments
/// number them (`1`..=`4`). Which values are valid depends on the family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TraceSelector {
    /// Lettered trace buffer
    Letter(char),
    /// Numbered trace buffer
    Number(i32),
}

impl From<char> for TraceSelector {
    fn from(letter: char) -> Self {
        TraceSelector::Letter(letter)
    }
}

impl From<u8> for TraceSelector {
    fn from(number: u8) -> Self {
        TraceSelector::Number(i32::from(number))
    }
}

impl From<i32> for TraceSelector {
    fn from(number: i32) -> Self {
        TraceSelector::Number(number)
    }
}

impl fmt::Display for TraceSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceSelector::Letter(c) => write!(f, "{}", c),
            TraceSelector::Number(n) => write!(f, "{}", n),
        }
    }
}

/// Error returned when a string is neither a single letter nor a number.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot parse trace selector from '{0}'")]
pub struct ParseSelectorError(String);

impl FromStr for TraceSelector {
    type Err = ParseSelectorError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(n) = s.parse::<i32>() {
            return Ok(TraceSelector::Number(n));
        }
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_alphabetic() => Ok(TraceSelector::Letter(c)),
            _ => Err(ParseSelectorError(s.to_string())),
        }
    }
}

/// One sweep of frequency/power pairs.
///
/// `frequencies[i]` is the frequency (Hz) at which `power[i]` was measured.
/// Both sequences always have the same length. A trace is built fresh for
/// every fetch and never changes afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trace {
    frequencies: Vec<f64>,
    power: Vec<f64>,
}

impl Trace {
    /// Pair `power` with an axis running from `start_hz` to `stop_hz`.
    pub(crate) fn from_power(start_hz: f64, stop_hz: f64, power: Vec<f64>) -> Self {
        let frequencies = frequency_axis(start_hz, stop_hz, power.len());
        Self { frequencies, power }
    }

    /// Frequencies in Hz.
    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    /// Power readings, in the instrument's current amplitude unit.
    pub fn power(&self) -> &[f64] {
        &self.power
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.power.len()
    }

    /// `true` if the trace has no points.
    pub fn is_empty(&self) -> bool {
        self.power.is_empty()
    }

    /// Iterate over `(frequency_hz, power)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.frequencies
            .iter()
            .copied()
            .zip(self.power.iter().copied())
    }

    /// Split into `(frequencies, power)`.
    pub fn into_parts(self) -> (Vec<f64>, Vec<f64>) {
        (self.frequencies, self.power)
    }
}

/// Parse a comma-separated trace reply into numbers, preserving order.
///
/// Tokens are trimmed before parsing. An empty reply is a single empty
/// token and therefore malformed.
pub fn parse_trace(reply: &str) -> Result<Vec<f64>> {
    reply
        .split(',')
        .enumerate()
        .map(|(index, token)| {
            let token = token.trim();
            token
                .parse::<f64>()
                .map_err(|_| SpectrumError::MalformedTrace {
                    index,
                    token: token.to_string(),
                })
        })
        .collect()
}

/// `n` evenly spaced values from `start` to `stop` inclusive.
///
/// `n == 1` yields `[start]`; `n == 0` yields an empty axis. The last point
/// is exactly `stop`.
pub fn frequency_axis(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { stop } else { start + i as f64 * step })
                .collect()
        }
    }
}

/// Connected instrument as seen by the trace reader.
///
/// The handle owns the transport; `start_frequency`/`stop_frequency` return
/// the sweep limits configured upstream.
#[async_trait]
pub trait InstrumentHandle: Send + Sync {
    /// Family whose command vocabulary applies.
    fn family(&self) -> InstrumentFamily;

    /// Send `command` and return the reply.
    async fn query(&self, command: &str) -> std::result::Result<String, TransportError>;

    /// Configured start frequency.
    async fn start_frequency(&self) -> Result<Quantity>;

    /// Configured stop frequency.
    async fn stop_frequency(&self) -> Result<Quantity>;
}

/// Fetch one trace from `handle`.
///
/// The selector is validated against the family's trace table before any
/// communication. Exactly one trace query is sent; transport errors are
/// returned unchanged and no partial trace is ever produced.
#[instrument(skip(handle, selector), fields(family = %handle.family()), err)]
pub async fn get_trace<H>(handle: &H, selector: impl Into<TraceSelector>) -> Result<Trace>
where
    H: InstrumentHandle + ?Sized,
{
    let selector = selector.into();
    let family = handle.family();
    let command = family
        .trace_command(selector)
        .ok_or_else(|| SpectrumError::InvalidSelector {
            family,
            selector,
            allowed: family.allowed_selectors(),
        })?;

    let reply = handle.query(command).await?;
    let power = parse_trace(&reply)?;

    let start = handle.start_frequency().await?.magnitude_in(Unit::Hertz)?;
    let stop = handle.stop_frequency().await?.magnitude_in(Unit::Hertz)?;

    tracing::debug!(
        %selector,
        points = power.len(),
        start_hz = start,
        stop_hz = stop,
        "trace fetched"
    );
    Ok(Trace::from_power(start, stop, power))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_trace_preserves_order() {
        assert_eq!(parse_trace("0.1,0.2,0.3").unwrap(), vec![0.1, 0.2, 0.3]);
        assert_eq!(
            parse_trace(" -80.5, -79.25 ,1E-3\n").unwrap(),
            vec![-80.5, -79.25, 1e-3]
        );
    }

    #[test]
    fn parse_trace_reports_bad_token() {
        let err = parse_trace("1.0,bad,3.0").unwrap_err();
        assert!(matches!(
            err,
            SpectrumError::MalformedTrace { index: 1, ref token } if token == "bad"
        ));
    }

    #[test]
    fn parse_trace_rejects_empty_and_trailing_comma() {
        assert!(matches!(
            parse_trace("").unwrap_err(),
            SpectrumError::MalformedTrace { index: 0, .. }
        ));
        assert!(matches!(
            parse_trace("1,2,").unwrap_err(),
            SpectrumError::MalformedTrace { index: 2, .. }
        ));
    }

    #[test]
    fn frequency_axis_endpoints() {
        assert_eq!(frequency_axis(1000.0, 2000.0, 3), vec![1000.0, 1500.0, 2000.0]);
        assert_eq!(frequency_axis(5.0, 9.0, 1), vec![5.0]);
        assert!(frequency_axis(5.0, 9.0, 0).is_empty());

        let axis = frequency_axis(9e3, 3.2e9, 601);
        assert_eq!(axis.len(), 601);
        assert_eq!(axis[0], 9e3);
        assert_eq!(axis[600], 3.2e9);
        assert!(axis.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn selector_parsing() {
        assert_eq!("A".parse::<TraceSelector>().unwrap(), TraceSelector::Letter('A'));
        assert_eq!(" 3 ".parse::<TraceSelector>().unwrap(), TraceSelector::Number(3));
        assert!("AB".parse::<TraceSelector>().is_err());
        assert!("".parse::<TraceSelector>().is_err());
        assert_eq!("-1".parse::<TraceSelector>().unwrap(), TraceSelector::Number(-1));
        assert!("1A".parse::<TraceSelector>().is_err());
    }

    #[test]
    fn selector_deserializes_from_letter_or_number() {
        let letter: TraceSelector = serde_json::from_str("\"B\"").unwrap();
        assert_eq!(letter, TraceSelector::Letter('B'));
        let number: TraceSelector = serde_json::from_str("2").unwrap();
        assert_eq!(number, TraceSelector::Number(2));
    }

    #[test]
    fn trace_pairs() {
        let trace = Trace::from_power(1000.0, 2000.0, vec![0.1, 0.2, 0.3]);
        let pairs: Vec<_> = trace.iter().collect();
        assert_eq!(pairs, vec![(1000.0, 0.1), (1500.0, 0.2), (2000.0, 0.3)]);
        assert_eq!(trace.len(), 3);
        assert!(!trace.is_empty());
    }
}
