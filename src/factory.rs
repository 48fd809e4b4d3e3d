//! Config-driven construction of analyzer drivers.
//!
//! [`SpectrumAnalyzerFactory`] turns a per-instrument TOML table into a
//! ready-to-use [`SpectrumAnalyzer`]: it picks the family (explicitly or by
//! probing), then applies any initial settings.
//!
//! ```toml
//! family = "HP856x"        # omit to auto-detect
//! start_hz = 1.0e9
//! stop_hz = 2.0e9
//! rbw_hz = 1.0e6
//! averages = 4             # HP856x only
//! default_trace = "A"
//! ```

use crate::analyzer::SpectrumAnalyzer;
use crate::error::{Result, SpectrumError};
use crate::family::InstrumentFamily;
use crate::properties::Property;
use crate::trace::TraceSelector;
use crate::transport::ScpiTransport;
use crate::units::Quantity;
use serde::{Deserialize, Serialize};

/// Configuration for one spectrum analyzer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalyzerConfig {
    /// Driver family; `None` probes the instrument
    #[serde(default)]
    pub family: Option<InstrumentFamily>,
    /// Initial center frequency (Hz)
    #[serde(default)]
    pub center_hz: Option<f64>,
    /// Initial span (Hz)
    #[serde(default)]
    pub span_hz: Option<f64>,
    /// Initial start frequency (Hz)
    #[serde(default)]
    pub start_hz: Option<f64>,
    /// Initial stop frequency (Hz)
    #[serde(default)]
    pub stop_hz: Option<f64>,
    /// Initial reference level (instrument units)
    #[serde(default)]
    pub reference: Option<f64>,
    /// Initial sweep time (s)
    #[serde(default)]
    pub sweep_time_s: Option<f64>,
    /// Initial video bandwidth (Hz)
    #[serde(default)]
    pub vbw_hz: Option<f64>,
    /// Initial resolution bandwidth (Hz)
    #[serde(default)]
    pub rbw_hz: Option<f64>,
    /// Initial number of video averages (HP856x only)
    #[serde(default)]
    pub averages: Option<u32>,
    /// Trace fetched when the caller names none
    #[serde(default)]
    pub default_trace: Option<TraceSelector>,
}

impl AnalyzerConfig {
    /// Initial settings as `(property, value)` pairs, in table order.
    ///
    /// Values are expressed in the unit `family` uses for each property.
    pub fn initial_settings(&self, family: InstrumentFamily) -> Vec<(Property, Quantity)> {
        let raw = [
            (Property::Center, self.center_hz),
            (Property::Span, self.span_hz),
            (Property::Start, self.start_hz),
            (Property::Stop, self.stop_hz),
            (Property::Reference, self.reference),
            (Property::SweepTime, self.sweep_time_s),
            (Property::Vbw, self.vbw_hz),
            (Property::Rbw, self.rbw_hz),
            (Property::Averages, self.averages.map(f64::from)),
        ];
        raw.into_iter()
            .filter_map(|(property, value)| {
                let value = value?;
                let unit = family.property(property)?.unit;
                Some((property, Quantity::new(value, unit)))
            })
            .collect()
    }

    /// Check values that do not depend on the connected instrument, plus
    /// family-specific checks when the family is known.
    pub fn validate(&self) -> Result<()> {
        let frequencies = [
            ("center_hz", self.center_hz),
            ("span_hz", self.span_hz),
            ("start_hz", self.start_hz),
            ("stop_hz", self.stop_hz),
            ("vbw_hz", self.vbw_hz),
            ("rbw_hz", self.rbw_hz),
        ];
        for (name, value) in frequencies {
            if let Some(v) = value {
                if !v.is_finite() || v < 0.0 {
                    return Err(SpectrumError::Config(format!(
                        "{} must be a non-negative frequency, got {}",
                        name, v
                    )));
                }
            }
        }
        if let (Some(start), Some(stop)) = (self.start_hz, self.stop_hz) {
            if start > stop {
                return Err(SpectrumError::Config(format!(
                    "start_hz ({}) exceeds stop_hz ({})",
                    start, stop
                )));
            }
        }
        if let Some(t) = self.sweep_time_s {
            if !t.is_finite() || t <= 0.0 {
                return Err(SpectrumError::Config(format!(
                    "sweep_time_s must be positive, got {}",
                    t
                )));
            }
        }
        if let Some(family) = self.family {
            self.validate_for(family)?;
        }
        Ok(())
    }

    /// Check settings against a specific family.
    pub fn validate_for(&self, family: InstrumentFamily) -> Result<()> {
        if self.averages.is_some() && family.property(Property::Averages).is_none() {
            return Err(SpectrumError::Config(format!(
                "averages is not supported by {}",
                family
            )));
        }
        if let Some(selector) = self.default_trace {
            if family.trace_command(selector).is_none() {
                return Err(SpectrumError::Config(format!(
                    "default_trace '{}' is not valid for {} (allowed: {})",
                    selector,
                    family,
                    family.allowed_selectors()
                )));
            }
        }
        Ok(())
    }

    /// Trace to fetch when the caller names none.
    pub fn trace_selector(&self, family: InstrumentFamily) -> TraceSelector {
        self.default_trace
            .unwrap_or_else(|| family.default_selector())
    }
}

/// Factory for creating spectrum analyzer drivers from configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpectrumAnalyzerFactory;

impl SpectrumAnalyzerFactory {
    /// Driver type used in configuration files.
    pub fn driver_type(&self) -> &'static str {
        "spectrum_analyzer"
    }

    /// Human-readable driver name.
    pub fn name(&self) -> &'static str {
        "SCPI Spectrum Analyzer (HP 856x, Keysight N932xC)"
    }

    /// Families this factory can build.
    pub fn families(&self) -> &'static [InstrumentFamily] {
        &InstrumentFamily::ALL
    }

    /// Parse and validate a configuration table without touching hardware.
    pub fn validate(&self, config: &toml::Value) -> Result<AnalyzerConfig> {
        let cfg: AnalyzerConfig = config
            .clone()
            .try_into()
            .map_err(|e| SpectrumError::Config(format!("invalid analyzer config: {}", e)))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Build a driver on `transport` from `config`.
    ///
    /// Probes the instrument when no family is configured, re-checks the
    /// family-specific settings, then writes the initial settings.
    pub async fn build<T: ScpiTransport>(
        &self,
        config: toml::Value,
        transport: T,
    ) -> Result<SpectrumAnalyzer<T>> {
        let cfg = self.validate(&config)?;

        let analyzer = match cfg.family {
            Some(family) => SpectrumAnalyzer::new(transport, family),
            None => SpectrumAnalyzer::connect(transport).await?,
        };
        let family = analyzer.family();
        cfg.validate_for(family)?;

        for (property, value) in cfg.initial_settings(family) {
            analyzer.set(property, value).await?;
        }

        tracing::info!(%family, "spectrum analyzer ready");
        Ok(analyzer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockTransport;

    fn table(value: toml::Table) -> toml::Value {
        toml::Value::Table(value)
    }

    #[test]
    fn factory_metadata() {
        let factory = SpectrumAnalyzerFactory;
        assert_eq!(factory.driver_type(), "spectrum_analyzer");
        assert_eq!(factory.families().len(), 2);
    }

    #[test]
    fn validate_accepts_minimal_config() {
        let factory = SpectrumAnalyzerFactory;
        let cfg = factory.validate(&table(toml::Table::new())).unwrap();
        assert_eq!(cfg, AnalyzerConfig::default());
    }

    #[test]
    fn validate_rejects_bad_values() {
        let factory = SpectrumAnalyzerFactory;

        let inverted = table(toml::toml! {
            start_hz = 2.0e9
            stop_hz = 1.0e9
        });
        assert!(factory.validate(&inverted).is_err());

        let negative = AnalyzerConfig {
            rbw_hz: Some(-1.0),
            ..Default::default()
        };
        assert!(negative.validate().is_err());

        let averages_on_keysight = table(toml::toml! {
            family = "N932xC"
            averages = 4
        });
        assert!(factory.validate(&averages_on_keysight).is_err());

        let bad_trace = table(toml::toml! {
            family = "HP856x"
            default_trace = "C"
        });
        assert!(factory.validate(&bad_trace).is_err());

        let unknown_key = table(toml::toml! {
            port = "/dev/ttyS0"
        });
        assert!(factory.validate(&unknown_key).is_err());
    }

    #[test]
    fn default_trace_from_number() {
        let factory = SpectrumAnalyzerFactory;
        let cfg = factory
            .validate(&table(toml::toml! {
                family = "N932xC"
                default_trace = 3
            }))
            .unwrap();
        assert_eq!(
            cfg.trace_selector(InstrumentFamily::N932xC),
            TraceSelector::Number(3)
        );
    }

    #[test]
    fn initial_settings_skip_unsupported() {
        let cfg = AnalyzerConfig {
            start_hz: Some(1.0),
            averages: Some(2),
            ..Default::default()
        };
        let hp = cfg.initial_settings(InstrumentFamily::Hp856x);
        assert_eq!(hp.len(), 2);
        let ks = cfg.initial_settings(InstrumentFamily::N932xC);
        assert_eq!(ks, vec![(Property::Start, Quantity::hz(1.0))]);
    }

    #[tokio::test]
    async fn build_probes_and_applies_settings() {
        let mock = MockTransport::hp856x();
        let factory = SpectrumAnalyzerFactory;
        let config = table(toml::toml! {
            start_hz = 100.0e6
            stop_hz = 200.0e6
            averages = 4
        });

        let analyzer = factory.build(config, mock.clone()).await.unwrap();
        assert_eq!(analyzer.family(), InstrumentFamily::Hp856x);
        assert_eq!(
            mock.commands(),
            vec!["ID?", "FA 100000000", "FB 200000000", "VAVG 4"]
        );
    }

    #[tokio::test]
    async fn build_rejects_family_specific_settings_after_probe() {
        let mock = MockTransport::n932xc();
        let factory = SpectrumAnalyzerFactory;
        let config = table(toml::toml! {
            averages = 4
        });

        let err = factory.build(config, mock.clone()).await.err().unwrap();
        assert!(matches!(err, SpectrumError::Config(_)));
        assert!(!mock.commands().iter().any(|c| c.starts_with("VAVG")));
    }
}
