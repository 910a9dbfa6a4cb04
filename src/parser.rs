//! Parser front-end.
//!
//! The front-end drives an external [`TraceReader`], converts raw
//! timestamps to system time, decodes each payload through the kernel
//! registry and hands the assembled [`Event`] to the user callback,
//! synchronously and in reader order. Records whose
//! `(provider, opcode, version)` is unknown or whose payload is truncated
//! are dropped and counted; the stream continues with the next record.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::event::{header, Event};
use crate::guid::Guid;
use crate::kernel;
use crate::value::{StructValue, Value};

/// Converts the performance-counter frequency into a period in units of
/// 100ns.
const PERF_PERIOD_MULTIPLIER: f64 = 10_000_000.0;

#[derive(Error, Debug)]
pub enum ReaderError {
    #[error("could not open trace: {0}")]
    Open(String),

    #[error("could not advance trace: {0}")]
    Read(String),

    #[error("the trace consumer backend is not available on this platform")]
    BackendUnavailable,
}

#[derive(Error, Debug)]
pub enum ParserError {
    #[error("the parser accepts a single trace source per run")]
    DuplicateSource,

    #[error("not a trace file: {0}")]
    UnsupportedExtension(PathBuf),

    #[error(transparent)]
    Reader(#[from] ReaderError),
}

/// One record as surfaced by the external reader.
#[derive(Debug, Clone, Copy)]
pub struct RawRecord<'a> {
    pub provider: Guid,
    pub opcode: u8,
    pub version: u8,
    /// Set when the record was produced with a 64-bit header; controls
    /// pointer-width fields in the payload.
    pub is_64_bit: bool,
    pub raw_timestamp: u64,
    pub process_id: u32,
    pub thread_id: u32,
    pub processor_number: u8,
    pub payload: &'a [u8],
}

/// Session information the reader reports when a trace is opened.
#[derive(Debug, Clone, Copy)]
pub struct TraceInfo {
    /// System timestamp at which the session started.
    pub start_time: u64,

    /// Performance-counter ticks per second.
    pub perf_freq: u64,
}

/// Contract of the file-level trace reader.
///
/// The reader owns the trace file format; the core only sees the session
/// information and a stream of raw records. Both calls may block on file
/// I/O. The reader must release every handle it opened by the time
/// `for_each_record` returns, on success and on failure alike.
pub trait TraceReader {
    fn open(&mut self, path: &Path) -> Result<TraceInfo, ReaderError>;

    fn for_each_record(
        &mut self,
        callback: &mut dyn FnMut(RawRecord<'_>),
    ) -> Result<(), ReaderError>;
}

pub struct Parser<R> {
    reader: R,
    source: Option<PathBuf>,

    /// Raw timestamp of the first record, latched during `parse` and
    /// cleared on exit.
    first_raw_timestamp: Option<u64>,

    dropped_events: u64,
}

impl<R: TraceReader> Parser<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            source: None,
            first_raw_timestamp: None,
            dropped_events: 0,
        }
    }

    /// Adds the trace file to parse. At most one source is accepted per
    /// run, and its suffix must be `.etl`.
    pub fn add_trace_source(&mut self, path: impl AsRef<Path>) -> Result<(), ParserError> {
        let path = path.as_ref();
        if self.source.is_some() {
            return Err(ParserError::DuplicateSource);
        }
        if path.extension() != Some(OsStr::new("etl")) {
            return Err(ParserError::UnsupportedExtension(path.to_path_buf()));
        }
        self.source = Some(path.to_path_buf());
        Ok(())
    }

    /// Consumes the trace and invokes `callback` for every decoded event.
    ///
    /// System timestamps are recovered as `start_time + (raw - first_raw)
    /// * period` where `period = 10^7 / perf_freq` and `first_raw` is the
    /// raw timestamp of the first record; the float product truncates to
    /// an integer count.
    pub fn parse(&mut self, mut callback: impl FnMut(&Event)) -> Result<(), ParserError> {
        let Some(source) = self.source.clone() else {
            return Ok(());
        };

        self.dropped_events = 0;
        let info = self.reader.open(&source)?;
        let perf_period = PERF_PERIOD_MULTIPLIER / info.perf_freq as f64;

        let Self {
            reader,
            first_raw_timestamp,
            dropped_events,
            ..
        } = self;

        let result = reader.for_each_record(&mut |record| {
            let first_raw = *first_raw_timestamp.get_or_insert(record.raw_timestamp);

            let decoded = match kernel::decode_payload(
                &record.provider,
                record.opcode,
                record.version,
                record.is_64_bit,
                record.payload,
            ) {
                Ok(decoded) => decoded,
                Err(_) => {
                    // Unknown or truncated events are expected in real
                    // traces; drop without logging each one.
                    *dropped_events += 1;
                    return;
                }
            };

            let mut event_header = StructValue::new();
            event_header.add_field(header::OPERATION, Value::Str(decoded.operation.into()));
            event_header.add_field(header::CATEGORY, Value::Str(decoded.category.into()));
            event_header.add_field(
                header::PROCESS_ID,
                Value::ULong(u64::from(record.process_id)),
            );
            event_header.add_field(header::THREAD_ID, Value::ULong(u64::from(record.thread_id)));
            event_header.add_field(
                header::PROCESSOR_NUMBER,
                Value::UChar(record.processor_number),
            );

            let elapsed = record.raw_timestamp.wrapping_sub(first_raw) as f64 * perf_period;
            let timestamp = info.start_time + elapsed as u64;

            let event = Event::new(timestamp, event_header, decoded.fields);
            callback(&event);
        });

        if self.dropped_events > 0 {
            log::debug!("dropped {} events", self.dropped_events);
        }

        // One-shot conversion state does not survive the run.
        self.first_raw_timestamp = None;

        result?;
        Ok(())
    }

    /// Number of records dropped by the last `parse` run.
    pub fn dropped_events(&self) -> u64 {
        self.dropped_events
    }
}
