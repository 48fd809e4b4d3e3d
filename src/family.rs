//! Supported analyzer families and their command vocabularies.
//!
//! Everything family-specific is data: which query identifies the
//! instrument, which command fetches each trace buffer, and which SCPI
//! header backs each property. Driver code looks entries up here instead of
//! branching on the family.

use crate::properties::{Property, PropertySpec};
use crate::trace::TraceSelector;
use crate::units::Unit;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Command that fetches one trace buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceCommand {
    /// Selector the command belongs to
    pub selector: TraceSelector,
    /// Query sent to the instrument
    pub command: &'static str,
}

/// Instrument families with a driver in this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstrumentFamily {
    /// HP/Agilent 8561E..8565EC portable spectrum analyzers
    #[serde(rename = "HP856x", alias = "hp856x")]
    Hp856x,
    /// Keysight N9321C..N9324C basic spectrum analyzers
    #[serde(rename = "N932xC", alias = "n932xc")]
    N932xC,
}

static HP856X_TRACES: &[TraceCommand] = &[
    TraceCommand {
        selector: TraceSelector::Letter('A'),
        command: "TRA?",
    },
    TraceCommand {
        selector: TraceSelector::Letter('B'),
        command: "TRB?",
    },
];

static N932XC_TRACES: &[TraceCommand] = &[
    TraceCommand {
        selector: TraceSelector::Number(1),
        command: ":TRAC? TRACE1",
    },
    TraceCommand {
        selector: TraceSelector::Number(2),
        command: ":TRAC? TRACE2",
    },
    TraceCommand {
        selector: TraceSelector::Number(3),
        command: ":TRAC? TRACE3",
    },
    TraceCommand {
        selector: TraceSelector::Number(4),
        command: ":TRAC? TRACE4",
    },
];

static HP856X_PROPERTIES: &[PropertySpec] = &[
    PropertySpec::float(Property::Center, "CF", Unit::Hertz),
    PropertySpec::float(Property::Span, "SP", Unit::Hertz),
    PropertySpec::float(Property::Start, "FA", Unit::Hertz),
    PropertySpec::float(Property::Stop, "FB", Unit::Hertz),
    PropertySpec::float(Property::Reference, "RL", Unit::Dimensionless),
    PropertySpec::float(Property::SweepTime, "ST", Unit::Second),
    PropertySpec::float(Property::Vbw, "VB", Unit::Hertz),
    PropertySpec::float(Property::Rbw, "RB", Unit::Hertz),
    PropertySpec::integer(Property::Averages, "VAVG"),
];

static N932XC_PROPERTIES: &[PropertySpec] = &[
    PropertySpec::float(Property::Center, ":SENS:FREQ:CENT", Unit::Hertz),
    PropertySpec::float(Property::Span, ":SENS:FREQ:SPAN", Unit::Hertz),
    PropertySpec::float(Property::Start, ":SENS:FREQ:START", Unit::Hertz),
    PropertySpec::float(Property::Stop, ":SENS:FREQ:STOP", Unit::Hertz),
    PropertySpec::float(Property::Reference, ":DISP:WIND:TRAC:Y:RLEV", Unit::Dbm),
    PropertySpec::float(Property::SweepTime, ":SWE:TIME", Unit::Second),
    PropertySpec::float(Property::Vbw, ":BAND:VID", Unit::Hertz),
    PropertySpec::float(Property::Rbw, ":BAND", Unit::Hertz),
];

impl InstrumentFamily {
    /// All families, in the order identity probes are tried.
    pub const ALL: [InstrumentFamily; 2] = [InstrumentFamily::Hp856x, InstrumentFamily::N932xC];

    /// Driver tag returned by a successful identity probe.
    pub fn driver_tag(self) -> &'static str {
        match self {
            InstrumentFamily::Hp856x => "HP856x",
            InstrumentFamily::N932xC => "N932xC",
        }
    }

    /// Human-readable family name.
    pub fn name(self) -> &'static str {
        match self {
            InstrumentFamily::Hp856x => "HP 856x Spectrum Analyzer",
            InstrumentFamily::N932xC => "Keysight N932xC Spectrum Analyzer",
        }
    }

    /// Query used to identify the instrument.
    pub fn identity_query(self) -> &'static str {
        match self {
            InstrumentFamily::Hp856x => "ID?",
            InstrumentFamily::N932xC => "*IDN?",
        }
    }

    /// Trace-command table.
    pub fn trace_commands(self) -> &'static [TraceCommand] {
        match self {
            InstrumentFamily::Hp856x => HP856X_TRACES,
            InstrumentFamily::N932xC => N932XC_TRACES,
        }
    }

    /// Property table.
    pub fn properties(self) -> &'static [PropertySpec] {
        match self {
            InstrumentFamily::Hp856x => HP856X_PROPERTIES,
            InstrumentFamily::N932xC => N932XC_PROPERTIES,
        }
    }

    /// Look up the trace command for `selector`.
    pub fn trace_command(self, selector: TraceSelector) -> Option<&'static str> {
        self.trace_commands()
            .iter()
            .find(|entry| entry.selector == selector)
            .map(|entry| entry.command)
    }

    /// Look up the binding for `property`.
    pub fn property(self, property: Property) -> Option<&'static PropertySpec> {
        self.properties()
            .iter()
            .find(|spec| spec.property == property)
    }

    /// Comma-separated list of accepted trace selectors.
    pub fn allowed_selectors(self) -> String {
        self.trace_commands()
            .iter()
            .map(|entry| entry.selector.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Selector used when the caller does not name one.
    pub fn default_selector(self) -> TraceSelector {
        match self {
            InstrumentFamily::Hp856x => TraceSelector::Letter('A'),
            InstrumentFamily::N932xC => TraceSelector::Number(1),
        }
    }
}

impl fmt::Display for InstrumentFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.driver_tag())
    }
}
