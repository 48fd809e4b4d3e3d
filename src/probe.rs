//! Identity probing.
//!
//! Before a driver is bound to a transport, each family gets one chance to
//! recognise the instrument from its identity reply. A probe never retries
//! and never fails: any transport error simply means "not this family".
//!
//! Because of that, a transient fault during probing is indistinguishable
//! from an unsupported instrument. The error is logged at debug level so it
//! can still be found.

use crate::family::InstrumentFamily;
use crate::transport::ScpiTransport;
use regex::Regex;
use std::sync::LazyLock;

/// Model strings reported by supported HP 856x units in reply to `ID?`.
pub const HP856X_MODELS: &[&str] = &[
    "HP8561E", "HP8561EC", "HP8562E", "HP8562EC", "HP8563E", "HP8563EC", "HP8564E", "HP8564EC",
    "HP8565E", "HP8565EC",
];

/// Model field pattern for supported Keysight N932xC units.
static N932XC_MODEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^N932[1234]C$").expect("Invalid N932xC model regex"));

/// Decide whether `reply` to the family's identity query names a supported
/// model.
pub fn matches_identity(family: InstrumentFamily, reply: &str) -> bool {
    match family {
        InstrumentFamily::Hp856x => HP856X_MODELS.contains(&reply.trim_end()),
        InstrumentFamily::N932xC => reply
            .trim_end()
            .split(',')
            .nth(1)
            .is_some_and(|model| N932XC_MODEL.is_match(model)),
    }
}

/// Probe `transport` for one family.
///
/// Sends the family's identity query once and returns the family if the
/// reply matches, `None` otherwise (including on transport errors).
pub async fn probe<T>(family: InstrumentFamily, transport: &T) -> Option<InstrumentFamily>
where
    T: ScpiTransport + ?Sized,
{
    let query = family.identity_query();
    match transport.query(query).await {
        Ok(reply) if matches_identity(family, &reply) => {
            tracing::info!(%family, identity = %reply.trim_end(), "instrument identified");
            Some(family)
        }
        Ok(reply) => {
            tracing::debug!(%family, identity = %reply.trim_end(), "identity not recognised");
            None
        }
        Err(e) => {
            tracing::debug!(%family, cmd = %query, error = %e, "identity probe failed");
            None
        }
    }
}

/// Probe every family in [`InstrumentFamily::ALL`] order and return the
/// first that recognises the instrument.
pub async fn detect_family<T>(transport: &T) -> Option<InstrumentFamily>
where
    T: ScpiTransport + ?Sized,
{
    for family in InstrumentFamily::ALL {
        if let Some(found) = probe(family, transport).await {
            return Some(found);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockTransport;
    use tracing_test::traced_test;

    #[test]
    fn hp_models() {
        let hp = InstrumentFamily::Hp856x;
        assert!(matches_identity(hp, "HP8563E"));
        assert!(matches_identity(hp, "HP8565EC\r\n"));
        assert!(!matches_identity(hp, "HP8560E"));
        assert!(!matches_identity(hp, " HP8563E"));
        assert!(!matches_identity(hp, ""));
    }

    #[test]
    fn keysight_models() {
        let ks = InstrumentFamily::N932xC;
        assert!(matches_identity(ks, "Keysight Technologies,N9322C,CN12345678,A.02.14"));
        assert!(matches_identity(ks, "Agilent Technologies,N9324C,MY001,B.01"));
        assert!(!matches_identity(ks, "Keysight Technologies,N9320B,CN1,A.01"));
        assert!(!matches_identity(ks, "Keysight Technologies,N9322CX,CN1,A.01"));
        assert!(!matches_identity(ks, "HP8563E"));
    }

    #[tokio::test]
    #[traced_test]
    async fn transport_error_means_no_match() {
        let mock = MockTransport::new().with_failure("ID?");
        assert_eq!(probe(InstrumentFamily::Hp856x, &mock).await, None);
        assert_eq!(mock.commands(), vec!["ID?"]);
        assert!(logs_contain("identity probe failed"));
    }

    #[tokio::test]
    async fn probe_sends_one_query() {
        let mock = MockTransport::n932xc();
        assert_eq!(
            probe(InstrumentFamily::N932xC, &mock).await,
            Some(InstrumentFamily::N932xC)
        );
        assert_eq!(mock.commands(), vec!["*IDN?"]);
    }

    #[tokio::test]
    async fn detect_family_tries_hp_first() {
        let hp = MockTransport::hp856x();
        assert_eq!(detect_family(&hp).await, Some(InstrumentFamily::Hp856x));
        assert_eq!(hp.commands(), vec!["ID?"]);

        let unknown = MockTransport::new();
        assert_eq!(detect_family(&unknown).await, None);
        assert_eq!(unknown.commands(), vec!["ID?", "*IDN?"]);
    }
}
