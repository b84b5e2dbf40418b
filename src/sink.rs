//! # Record Sink
//!
//! Durable, ordered append of accepted samples to a CSV log.
//!
//! This module handles:
//! - Creating the session log file
//! - Writing the header row exactly once, before any data row
//! - Appending one row per accepted sample, flushed row-by-row so a
//!   mid-session crash loses at most the in-flight row
//! - Idempotent close, backed by a `Drop` guard for early-return paths

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::frame::Sample;

/// Column header, written once at session start.
///
/// `time` is the sample sequence number; the gain columns hold the values
/// after gain scaling, so the default-scale log is plain decimal integers.
pub const CSV_HEADER: &str = "time,set rpm,read rpm,error,Kp,Ki,Kd";

/// Append-only CSV writer for the session log.
pub struct CsvSink {
    writer: Option<BufWriter<File>>,
    path: PathBuf,
    header_written: bool,
    rows_written: u64,
}

impl CsvSink {
    /// Create (truncate) the log file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::PidScopeError::Io`] if the path is not
    /// creatable or writable.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path)?;

        Ok(Self {
            writer: Some(BufWriter::new(file)),
            path,
            header_written: false,
            rows_written: 0,
        })
    }

    /// Write the header row. Must be called exactly once, before any data row.
    pub fn write_header(&mut self) -> Result<()> {
        if self.header_written {
            return Err(already("header already written").into());
        }

        let writer = self.writer_mut()?;
        writeln!(writer, "{}", CSV_HEADER)?;
        writer.flush()?;
        self.header_written = true;
        Ok(())
    }

    /// Append one sample as a data row and flush it to the OS.
    ///
    /// Row layout is fixed: `sequence,setpoint,actual,error,kp,ki,kd`.
    /// A failure here is fatal to the session; the collector loop closes the
    /// sink and terminates.
    pub fn append(&mut self, sample: &Sample) -> Result<()> {
        if !self.header_written {
            return Err(already("data row before header").into());
        }

        let writer = self.writer_mut()?;
        writeln!(
            writer,
            "{},{},{},{},{},{},{}",
            sample.sequence,
            sample.setpoint,
            sample.actual,
            sample.error,
            sample.kp,
            sample.ki,
            sample.kd
        )?;
        writer.flush()?;
        self.rows_written += 1;
        Ok(())
    }

    /// Flush and close the log. Safe to call more than once.
    pub fn close(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        Ok(())
    }

    /// True once [`CsvSink::close`] has run.
    pub fn is_closed(&self) -> bool {
        self.writer.is_none()
    }

    /// Number of data rows written so far (header excluded).
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Path of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn writer_mut(&mut self) -> io::Result<&mut BufWriter<File>> {
        self.writer
            .as_mut()
            .ok_or_else(|| already("sink is closed"))
    }
}

fn already(msg: &str) -> io::Error {
    io::Error::new(io::ErrorKind::Other, msg.to_string())
}

impl Drop for CsvSink {
    fn drop(&mut self) {
        // Best effort; explicit close() reports errors, this cannot.
        let _ = self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Reading;
    use tempfile::tempdir;

    fn sample(sequence: u64, setpoint: i64, actual: i64) -> Sample {
        Sample::from_reading(sequence, Reading::new(setpoint, actual, 50.0, 10.0, 5.0))
    }

    #[test]
    fn test_header_and_rows_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pid_data.csv");

        let mut sink = CsvSink::create(&path).unwrap();
        sink.write_header().unwrap();
        sink.append(&sample(1, 40, 38)).unwrap();
        sink.append(&sample(2, 40, 39)).unwrap();
        sink.close().unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            contents,
            "time,set rpm,read rpm,error,Kp,Ki,Kd\n\
             1,40,38,2,50,10,5\n\
             2,40,39,1,50,10,5\n"
        );
        assert_eq!(sink.rows_written(), 2);
    }

    #[test]
    fn test_scaled_gains_keep_fractions() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scaled.csv");

        let mut sink = CsvSink::create(&path).unwrap();
        sink.write_header().unwrap();
        let s = Sample::from_reading(1, Reading::new(40, 38, 5.0, 1.0, 0.5));
        sink.append(&s).unwrap();
        sink.close().unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let row = contents.lines().nth(1).unwrap();
        assert_eq!(row, "1,40,38,2,5,1,0.5");
    }

    #[test]
    fn test_close_is_idempotent() {
        let dir = tempdir().unwrap();
        let mut sink = CsvSink::create(dir.path().join("log.csv")).unwrap();
        sink.write_header().unwrap();

        sink.close().unwrap();
        sink.close().unwrap();
        assert!(sink.is_closed());
    }

    #[test]
    fn test_append_after_close_is_an_error() {
        let dir = tempdir().unwrap();
        let mut sink = CsvSink::create(dir.path().join("log.csv")).unwrap();
        sink.write_header().unwrap();
        sink.close().unwrap();

        let result = sink.append(&sample(1, 40, 38));
        assert!(result.is_err());
        assert_eq!(sink.rows_written(), 0);
    }

    #[test]
    fn test_header_is_written_exactly_once() {
        let dir = tempdir().unwrap();
        let mut sink = CsvSink::create(dir.path().join("log.csv")).unwrap();

        sink.write_header().unwrap();
        assert!(sink.write_header().is_err());
    }

    #[test]
    fn test_row_before_header_is_an_error() {
        let dir = tempdir().unwrap();
        let mut sink = CsvSink::create(dir.path().join("log.csv")).unwrap();

        assert!(sink.append(&sample(1, 40, 38)).is_err());
    }

    #[test]
    fn test_drop_flushes_pending_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log.csv");

        {
            let mut sink = CsvSink::create(&path).unwrap();
            sink.write_header().unwrap();
            sink.append(&sample(1, 40, 38)).unwrap();
            // Dropped without an explicit close
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);
    }

    #[test]
    fn test_create_fails_for_missing_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("no/such/dir/log.csv");
        assert!(CsvSink::create(path).is_err());
    }
}
