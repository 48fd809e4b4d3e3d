//! Spectrum analyzer driver.
//!
//! [`SpectrumAnalyzer`] binds a transport to an [`InstrumentFamily`] and
//! exposes the family's settings as unit-aware getters and setters, plus
//! trace retrieval.
//!
//! # Usage
//!
//! ```rust,ignore
//! use spectrum_daq::{Quantity, SpectrumAnalyzer};
//!
//! let analyzer = SpectrumAnalyzer::connect(transport).await?;
//! analyzer.set_start(Quantity::mhz(100.0)).await?;
//! analyzer.set_stop(Quantity::mhz(200.0)).await?;
//! let trace = analyzer.get_trace('A').await?;
//! ```

use crate::error::{Result, SpectrumError, TransportError};
use crate::family::InstrumentFamily;
use crate::probe::detect_family;
use crate::properties::{Property, PropertySpec};
use crate::trace::{self, InstrumentHandle, Trace, TraceSelector};
use crate::transport::ScpiTransport;
use crate::units::Quantity;
use async_trait::async_trait;
use tracing::instrument;

/// Driver for one connected spectrum analyzer.
pub struct SpectrumAnalyzer<T> {
    transport: T,
    family: InstrumentFamily,
}

impl<T: ScpiTransport> SpectrumAnalyzer<T> {
    /// Bind `transport` to a known family without probing.
    pub fn new(transport: T, family: InstrumentFamily) -> Self {
        Self { transport, family }
    }

    /// Identify the instrument on `transport` and bind the matching family.
    ///
    /// # Errors
    /// Returns [`SpectrumError::UnsupportedInstrument`] if no family
    /// recognises the instrument (or every probe hit a transport error).
    pub async fn connect(transport: T) -> Result<Self> {
        match detect_family(&transport).await {
            Some(family) => Ok(Self::new(transport, family)),
            None => Err(SpectrumError::UnsupportedInstrument(
                "no driver family recognised the instrument identity".to_string(),
            )),
        }
    }

    /// Family this driver speaks.
    pub fn family(&self) -> InstrumentFamily {
        self.family
    }

    /// Underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Release the transport.
    pub fn into_transport(self) -> T {
        self.transport
    }

    fn spec(&self, property: Property) -> Result<&'static PropertySpec> {
        self.family
            .property(property)
            .ok_or(SpectrumError::UnsupportedProperty {
                family: self.family,
                property,
            })
    }

    /// Read `property` from the instrument.
    #[instrument(skip(self), fields(family = %self.family), err)]
    pub async fn get(&self, property: Property) -> Result<Quantity> {
        let spec = self.spec(property)?;
        let reply = self.transport.query(&spec.query_command()).await?;
        spec.parse_reply(&reply)
    }

    /// Write `value` to `property`, converting it to the property's unit.
    #[instrument(skip(self), fields(family = %self.family), err)]
    pub async fn set(&self, property: Property, value: Quantity) -> Result<()> {
        let spec = self.spec(property)?;
        let command = spec.write_command(value)?;
        self.transport.write(&command).await?;
        Ok(())
    }

    /// Center frequency.
    pub async fn center(&self) -> Result<Quantity> {
        self.get(Property::Center).await
    }

    /// Set the center frequency.
    pub async fn set_center(&self, value: Quantity) -> Result<()> {
        self.set(Property::Center, value).await
    }

    /// Frequency span.
    pub async fn span(&self) -> Result<Quantity> {
        self.get(Property::Span).await
    }

    /// Set the frequency span.
    pub async fn set_span(&self, value: Quantity) -> Result<()> {
        self.set(Property::Span, value).await
    }

    /// Start frequency.
    pub async fn start(&self) -> Result<Quantity> {
        self.get(Property::Start).await
    }

    /// Set the start frequency.
    pub async fn set_start(&self, value: Quantity) -> Result<()> {
        self.set(Property::Start, value).await
    }

    /// Stop frequency.
    pub async fn stop(&self) -> Result<Quantity> {
        self.get(Property::Stop).await
    }

    /// Set the stop frequency.
    pub async fn set_stop(&self, value: Quantity) -> Result<()> {
        self.set(Property::Stop, value).await
    }

    /// Reference level.
    pub async fn reference(&self) -> Result<Quantity> {
        self.get(Property::Reference).await
    }

    /// Set the reference level.
    pub async fn set_reference(&self, value: Quantity) -> Result<()> {
        self.set(Property::Reference, value).await
    }

    /// Sweep time.
    pub async fn sweep_time(&self) -> Result<Quantity> {
        self.get(Property::SweepTime).await
    }

    /// Set the sweep time.
    pub async fn set_sweep_time(&self, value: Quantity) -> Result<()> {
        self.set(Property::SweepTime, value).await
    }

    /// Video bandwidth.
    pub async fn vbw(&self) -> Result<Quantity> {
        self.get(Property::Vbw).await
    }

    /// Set the video bandwidth.
    pub async fn set_vbw(&self, value: Quantity) -> Result<()> {
        self.set(Property::Vbw, value).await
    }

    /// Resolution bandwidth.
    pub async fn rbw(&self) -> Result<Quantity> {
        self.get(Property::Rbw).await
    }

    /// Set the resolution bandwidth.
    pub async fn set_rbw(&self, value: Quantity) -> Result<()> {
        self.set(Property::Rbw, value).await
    }

    /// Number of video averages (HP 856x only).
    pub async fn averages(&self) -> Result<u32> {
        let value = self.get(Property::Averages).await?;
        let command = self.spec(Property::Averages)?.query_command();
        u32::try_from(value.magnitude as i64).map_err(|_| SpectrumError::MalformedResponse {
            command,
            response: value.magnitude.to_string(),
        })
    }

    /// Set the number of video averages (HP 856x only).
    pub async fn set_averages(&self, count: u32) -> Result<()> {
        self.set(Property::Averages, Quantity::dimensionless(f64::from(count)))
            .await
    }

    /// Fetch one trace.
    ///
    /// `selector` is a letter (`'A'`) or a trace number (`3`). See
    /// [`trace::get_trace`] for the exact semantics.
    pub async fn get_trace(&self, selector: impl Into<TraceSelector>) -> Result<Trace> {
        trace::get_trace(self, selector).await
    }
}

#[async_trait]
impl<T: ScpiTransport> InstrumentHandle for SpectrumAnalyzer<T> {
    fn family(&self) -> InstrumentFamily {
        self.family
    }

    async fn query(&self, command: &str) -> std::result::Result<String, TransportError> {
        self.transport.query(command).await
    }

    async fn start_frequency(&self) -> Result<Quantity> {
        self.start().await
    }

    async fn stop_frequency(&self) -> Result<Quantity> {
        self.stop().await
    }
}
