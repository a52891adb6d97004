//! NDJSON (newline-delimited JSON) stream sink.
//!
//! Each audit record is serialized directly to the writer without an
//! intermediate `String` allocation.
//!
//! ```ignore
//! let mut sink = JsonStreamSink::stdout();
//! sink.write_record(&record)?;
//! let rows = sink.finish()?;
//! ```

use crate::audit::AuditRecord;
use crate::sink::AuditSink;
use async_trait::async_trait;
use std::io::{self, BufWriter, Write};

/// NDJSON writer over any `Write` (stdout, file, `Vec<u8>`), buffered for
/// batch I/O.
pub struct JsonStreamSink<W: Write> {
    writer: BufWriter<W>,
    rows_written: usize,
}

impl JsonStreamSink<io::Stdout> {
    /// Write NDJSON to stdout.
    pub fn stdout() -> Self {
        Self {
            writer: BufWriter::with_capacity(64 * 1024, io::stdout()),
            rows_written: 0,
        }
    }
}

impl<W: Write> JsonStreamSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::with_capacity(64 * 1024, writer),
            rows_written: 0,
        }
    }

    /// Write one audit record as a single line.
    pub fn write_record(&mut self, record: &AuditRecord) -> io::Result<()> {
        serde_json::to_writer(&mut self.writer, record)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        self.writer.write_all(b"\n")?;
        self.rows_written += 1;
        Ok(())
    }

    /// Flush and return how many rows were written.
    pub fn finish(mut self) -> io::Result<usize> {
        self.writer.flush()?;
        Ok(self.rows_written)
    }

    /// Number of rows written so far.
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }
}

#[async_trait]
impl<W: Write + Send> AuditSink for JsonStreamSink<W> {
    async fn write(&mut self, record: &AuditRecord) -> io::Result<()> {
        self.write_record(record)
    }

    async fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}
