//! In-memory SCPI transport for testing.
//!
//! [`MockTransport`] answers queries from a table of scripted replies and
//! behaves like a simple settings store: writing `"FA 1000"` makes a later
//! `"FA?"` return `"1000"`. Every command is recorded so tests can assert
//! on exactly what was sent.
//!
//! Clones share state, so a test can keep one clone for inspection while the
//! driver owns another.

use crate::error::TransportError;
use crate::transport::ScpiTransport;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

#[derive(Debug, Default)]
struct MockState {
    responses: HashMap<String, String>,
    failing: HashSet<String>,
    log: Vec<String>,
}

/// Scripted transport for tests and offline development.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    /// Empty transport: every query fails until a reply is scripted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulated HP 8563E with a 1-2 GHz sweep and two five-point traces.
    pub fn hp856x() -> Self {
        Self::new()
            .with_response("ID?", "HP8563E")
            .with_response("FA?", "1.0E+09")
            .with_response("FB?", "2.0E+09")
            .with_response("CF?", "1.5E+09")
            .with_response("SP?", "1.0E+09")
            .with_response("RL?", "0")
            .with_response("ST?", "0.05")
            .with_response("VB?", "1.0E+06")
            .with_response("RB?", "1.0E+06")
            .with_response("VAVG?", "1")
            .with_response("TRA?", "-80.0,-75.5,-20.25,-76.0,-81.0")
            .with_response("TRB?", "-90.0,-90.0,-90.0,-90.0,-90.0")
    }

    /// Simulated Keysight N9322C with a 9 kHz-3 GHz sweep and four traces.
    pub fn n932xc() -> Self {
        let mut mock = Self::new()
            .with_response("*IDN?", "Keysight Technologies,N9322C,CN0000001,A.02.14")
            .with_response(":SENS:FREQ:START?", "9000")
            .with_response(":SENS:FREQ:STOP?", "3000000000")
            .with_response(":SENS:FREQ:CENT?", "1500004500")
            .with_response(":SENS:FREQ:SPAN?", "2999991000")
            .with_response(":DISP:WIND:TRAC:Y:RLEV?", "-10")
            .with_response(":SWE:TIME?", "0.2")
            .with_response(":BAND:VID?", "3000000")
            .with_response(":BAND?", "3000000");
        for n in 1..=4 {
            mock = mock.with_response(
                &format!(":TRAC? TRACE{}", n),
                "-85.1,-84.9,-60.0,-85.3",
            );
        }
        mock
    }

    /// Script the reply to `command`.
    pub fn with_response(self, command: &str, reply: &str) -> Self {
        self.set_response(command, reply);
        self
    }

    /// Make `command` fail with a transport error.
    pub fn with_failure(self, command: &str) -> Self {
        self.state.lock().failing.insert(command.to_string());
        self
    }

    /// Script the reply to `command` on a shared handle.
    pub fn set_response(&self, command: &str, reply: &str) {
        self.state
            .lock()
            .responses
            .insert(command.to_string(), reply.to_string());
    }

    /// Every command sent so far, queries and writes, in order.
    pub fn commands(&self) -> Vec<String> {
        self.state.lock().log.clone()
    }

    /// Number of commands sent so far.
    pub fn command_count(&self) -> usize {
        self.state.lock().log.len()
    }

    /// Forget recorded commands.
    pub fn clear_log(&self) {
        self.state.lock().log.clear();
    }
}

#[async_trait]
impl ScpiTransport for MockTransport {
    async fn query(&self, command: &str) -> Result<String, TransportError> {
        let mut state = self.state.lock();
        state.log.push(command.to_string());
        if state.failing.contains(command) {
            return Err(TransportError::msg(format!("simulated timeout on '{}'", command)));
        }
        state
            .responses
            .get(command)
            .cloned()
            .ok_or_else(|| TransportError::msg(format!("no reply scripted for '{}'", command)))
    }

    async fn write(&self, command: &str) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        state.log.push(command.to_string());
        if state.failing.contains(command) {
            return Err(TransportError::msg(format!("simulated timeout on '{}'", command)));
        }
        // "HEADER value" updates what "HEADER?" reports
        if let Some((header, value)) = command.split_once(' ') {
            state
                .responses
                .insert(format!("{}?", header), value.trim().to_string());
        }
        Ok(())
    }
}
