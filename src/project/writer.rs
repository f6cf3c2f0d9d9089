use crate::types::{FlatRecord, RecordHandle};
use anyhow::{Context, Result};
use std::io::Write;

/// Destination that persists flat records
pub trait RecordSink {
    /// Hand a record over, returning the handle the sink assigned it
    fn create_record_with_fields(&mut self, record: &FlatRecord) -> Result<RecordHandle>;
}

/// Writes each record as one JSON line
pub struct RecordWriter<W: Write> {
    writer: W,
    pretty: bool,
    written: u64,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(writer: W) -> Self {
        RecordWriter {
            writer,
            pretty: false,
            written: 0,
        }
    }

    /// Pretty-print records (one record per block instead of per line)
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush().context("Failed to flush writer")
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RecordSink for RecordWriter<W> {
    fn create_record_with_fields(&mut self, record: &FlatRecord) -> Result<RecordHandle> {
        let serialized = if self.pretty {
            serde_json::to_string_pretty(record)
        } else {
            serde_json::to_string(record)
        };
        let json = serialized.context("Failed to serialize record")?;

        writeln!(self.writer, "{}", json).context("Failed to write record")?;

        self.written += 1;
        Ok(RecordHandle::new(format!("record-{}", self.written)))
    }
}
