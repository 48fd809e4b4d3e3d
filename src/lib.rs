//! # Spectrum DAQ
//!
//! SCPI drivers for swept spectrum analyzers. The crate identifies a
//! connected instrument, exposes its frequency, bandwidth and level settings
//! as unit-aware getters and setters, and fetches traces as
//! frequency/power pairs.
//!
//! ## Crate Structure
//!
//! - **`analyzer`**: [`SpectrumAnalyzer`], the driver bound to a transport.
//! - **`trace`**: trace fetching and frequency-axis reconstruction
//!   ([`get_trace`], [`Trace`], [`TraceSelector`]).
//! - **`family`**: per-family command tables (HP 856x, Keysight N932xC).
//! - **`properties`**: named settings and their SCPI bindings.
//! - **`probe`**: identity probing and family auto-detection.
//! - **`transport`**: the [`ScpiTransport`] trait and a line-terminated
//!   adapter for tokio streams. Opening VISA sessions or sockets is left to
//!   the caller.
//! - **`units`**: [`Quantity`] and [`Unit`] for unit conversion.
//! - **`factory`**: building drivers from TOML configuration.
//! - **`config`**: Figment-based settings loading.
//! - **`logging`**: `tracing-subscriber` setup.
//! - **`export`**: CSV export of traces (feature `storage_csv`).
//! - **`mock`**: an in-memory transport for tests.
//! - **`error`**: [`SpectrumError`] and [`TransportError`].

pub mod analyzer;
pub mod config;
pub mod error;
#[cfg(feature = "storage_csv")]
pub mod export;
pub mod factory;
pub mod family;
pub mod logging;
pub mod mock;
pub mod probe;
pub mod properties;
pub mod trace;
pub mod transport;
pub mod units;

pub use analyzer::SpectrumAnalyzer;
pub use error::{Result, SpectrumError, TransportError};
pub use factory::{AnalyzerConfig, SpectrumAnalyzerFactory};
pub use family::InstrumentFamily;
pub use probe::detect_family;
pub use properties::Property;
pub use trace::{get_trace, InstrumentHandle, Trace, TraceSelector};
pub use transport::{LineTransport, ScpiTransport};
pub use units::{Quantity, Unit};
