//! CSV export of traces.
//!
//! Writes one `frequency_hz,power` row per point, preceded by a header.

use crate::error::Result;
use crate::trace::Trace;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Column names written as the first row.
pub const CSV_HEADER: [&str; 2] = ["frequency_hz", "power"];

impl Trace {
    /// Write the trace as CSV to `writer`.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(CSV_HEADER)?;
        for (frequency, power) in self.iter() {
            csv.write_record(&[frequency.to_string(), power.to_string()])?;
        }
        csv.flush().map_err(csv::Error::from)?;
        Ok(())
    }

    /// Write the trace as CSV to a new file at `path`.
    pub fn save_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path.as_ref()).map_err(csv::Error::from)?;
        self.write_csv(file)?;
        tracing::info!(path = %path.as_ref().display(), points = self.len(), "trace saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_header_and_rows() {
        let trace = Trace::from_power(1000.0, 2000.0, vec![-80.5, -20.0, -79.0]);
        let mut out = Vec::new();
        trace.write_csv(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "frequency_hz,power\n1000,-80.5\n1500,-20\n2000,-79\n"
        );
    }
}
