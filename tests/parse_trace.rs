//! End-to-end pipeline coverage: canned raw records flow through the
//! parser into the state sink, which recovers the image map and resolves
//! captured stacks against a programmable symbol source.

use std::path::Path;

use etltrace::guid::Guid;
use etltrace::kernel::{IMAGE_PROVIDER, PERF_INFO_PROVIDER, STACK_WALK_PROVIDER};
use etltrace::parser::{RawRecord, ReaderError, TraceInfo, TraceReader};
use etltrace::state::CurrentState;
use etltrace::symbols::{Image, Symbol, SymbolEnumerator};
use etltrace::Parser;

const IMAGE_LOAD_OPCODE: u8 = 10;
const IMAGE_UNLOAD_OPCODE: u8 = 2;
const STACK_WALK_STACK_OPCODE: u8 = 32;
const PERF_INFO_SAMPLE_PROF_OPCODE: u8 = 46;

#[derive(Default)]
struct Payload {
    bytes: Vec<u8>,
}

impl Payload {
    fn u32(mut self, value: u32) -> Self {
        self.bytes.extend_from_slice(&value.to_le_bytes());
        self
    }

    fn u64(mut self, value: u64) -> Self {
        self.bytes.extend_from_slice(&value.to_le_bytes());
        self
    }

    fn wstr(mut self, value: &str) -> Self {
        for unit in value.encode_utf16() {
            self.bytes.extend_from_slice(&unit.to_le_bytes());
        }
        self.bytes.extend_from_slice(&0u16.to_le_bytes());
        self
    }
}

/// A 64-bit `Image` v2 load/unload payload.
fn image_payload(base: u64, size: u64, filename: &str) -> Vec<u8> {
    Payload::default()
        .u64(base)
        .u64(size)
        .u32(0) // ProcessId (the sink uses the header pid)
        .u32(0x1234)
        .u32(0x5678)
        .u32(0)
        .u64(base)
        .u32(0)
        .u32(0)
        .u32(0)
        .u32(0)
        .wstr(filename)
        .bytes
}

fn stack_payload(pid: u32, tid: u32, frames: &[u64]) -> Vec<u8> {
    let mut payload = Payload::default().u64(99_000).u32(pid).u32(tid);
    for &frame in frames {
        payload = payload.u64(frame);
    }
    payload.bytes
}

struct CannedRecord {
    provider: Guid,
    opcode: u8,
    version: u8,
    raw_timestamp: u64,
    process_id: u32,
    payload: Vec<u8>,
}

struct ReplayReader {
    info: TraceInfo,
    records: Vec<CannedRecord>,
}

impl TraceReader for ReplayReader {
    fn open(&mut self, _path: &Path) -> Result<TraceInfo, ReaderError> {
        Ok(self.info)
    }

    fn for_each_record(
        &mut self,
        callback: &mut dyn FnMut(RawRecord<'_>),
    ) -> Result<(), ReaderError> {
        for record in &self.records {
            callback(RawRecord {
                provider: record.provider,
                opcode: record.opcode,
                version: record.version,
                is_64_bit: true,
                raw_timestamp: record.raw_timestamp,
                process_id: record.process_id,
                thread_id: 1,
                processor_number: 0,
                payload: &record.payload,
            });
        }
        Ok(())
    }
}

struct FakeEnumerator;

impl SymbolEnumerator for FakeEnumerator {
    /// Symbols for `app.exe` only; other images have no debug
    /// information.
    fn enumerate(&mut self, image: &Image) -> Vec<Symbol> {
        if image.filename != "app.exe" {
            return Vec::new();
        }
        vec![
            Symbol {
                name: "entry".into(),
                offset: 0x100,
                size: 0x80,
            },
            Symbol {
                name: "worker".into(),
                offset: 0x400,
                size: 0x100,
            },
        ]
    }
}

#[test]
fn pipeline_recovers_images_and_resolves_stacks() {
    let records = vec![
        CannedRecord {
            provider: IMAGE_PROVIDER,
            opcode: IMAGE_LOAD_OPCODE,
            version: 2,
            raw_timestamp: 1_000,
            process_id: 42,
            payload: image_payload(0x40_0000, 0x2000, "app.exe"),
        },
        CannedRecord {
            provider: IMAGE_PROVIDER,
            opcode: IMAGE_LOAD_OPCODE,
            version: 2,
            raw_timestamp: 1_001,
            process_id: 42,
            payload: image_payload(0x50_0000, 0x1000, "other.dll"),
        },
        // Two frames inside app.exe symbols, one in other.dll (no debug
        // info), one unmapped.
        CannedRecord {
            provider: STACK_WALK_PROVIDER,
            opcode: STACK_WALK_STACK_OPCODE,
            version: 2,
            raw_timestamp: 1_002,
            process_id: 42,
            payload: stack_payload(42, 7, &[0x40_0120, 0x50_0800, 0x40_0480, 0x90_0000]),
        },
        // An undecodable version: dropped, parsing continues.
        CannedRecord {
            provider: IMAGE_PROVIDER,
            opcode: IMAGE_LOAD_OPCODE,
            version: 9,
            raw_timestamp: 1_003,
            process_id: 42,
            payload: image_payload(0x60_0000, 0x1000, "late.dll"),
        },
        CannedRecord {
            provider: IMAGE_PROVIDER,
            opcode: IMAGE_UNLOAD_OPCODE,
            version: 2,
            raw_timestamp: 1_004,
            process_id: 42,
            payload: image_payload(0x50_0000, 0x1000, "other.dll"),
        },
        // A stack raised after the unload: the other.dll frame no longer
        // resolves to an image.
        CannedRecord {
            provider: STACK_WALK_PROVIDER,
            opcode: STACK_WALK_STACK_OPCODE,
            version: 2,
            raw_timestamp: 1_005,
            process_id: 42,
            payload: stack_payload(42, 7, &[0x40_0440, 0x50_0800]),
        },
    ];

    let reader = ReplayReader {
        info: TraceInfo {
            start_time: 130_000_000_000_000_000,
            perf_freq: 10_000_000,
        },
        records,
    };

    let mut parser = Parser::new(reader);
    parser.add_trace_source("scenario.etl").unwrap();

    let mut state = CurrentState::new(FakeEnumerator);
    let mut timestamps = Vec::new();
    parser
        .parse(|event| {
            timestamps.push(event.timestamp());
            state.on_event(event);
        })
        .unwrap();

    // perf_freq of 10MHz means one raw tick per 100ns unit.
    assert_eq!(timestamps.first(), Some(&130_000_000_000_000_000));
    assert_eq!(timestamps.last(), Some(&130_000_000_000_000_005));
    assert_eq!(timestamps.len(), 5);
    assert_eq!(parser.dropped_events(), 1);

    // The dropped v9 load never reached the sink.
    assert!(state.symbols().find_image(42, 0x60_0000).is_none());
    // other.dll was unloaded after the first stack.
    assert!(state.symbols().find_image(42, 0x50_0800).is_none());
    assert!(state.symbols().find_image(42, 0x40_0000).is_some());

    assert_eq!(state.stacks().len(), 2);

    let first = &state.stacks()[0];
    assert_eq!(first.event_timestamp, 99_000);
    assert_eq!(first.process_id, 42);
    assert_eq!(first.thread_id, 7);
    let names: Vec<_> = first
        .frames
        .iter()
        .map(|&frame| state.frame_name(frame).unwrap())
        .collect();
    assert_eq!(names, vec!["entry", "worker"]);

    let second = &state.stacks()[1];
    let names: Vec<_> = second
        .frames
        .iter()
        .map(|&frame| state.frame_name(frame).unwrap())
        .collect();
    assert_eq!(names, vec!["worker"]);

    let counts = state.event_counts();
    assert_eq!(counts.get(&("Image".into(), "Load".into())), Some(&2));
    assert_eq!(counts.get(&("Image".into(), "Unload".into())), Some(&1));
    assert_eq!(counts.get(&("StackWalk".into(), "Stack".into())), Some(&2));
}

#[test]
fn sink_ignores_unrelated_categories() {
    // A SampleProf payload: instruction pointer, thread id, count,
    // reserved.
    let mut payload = Payload::default().u64(0x1000).u32(2);
    payload.bytes.extend_from_slice(&1u16.to_le_bytes());
    payload.bytes.extend_from_slice(&0u16.to_le_bytes());

    let records = vec![CannedRecord {
        provider: PERF_INFO_PROVIDER,
        opcode: PERF_INFO_SAMPLE_PROF_OPCODE,
        version: 2,
        raw_timestamp: 5,
        process_id: 1,
        payload: payload.bytes,
    }];

    let reader = ReplayReader {
        info: TraceInfo {
            start_time: 0,
            perf_freq: 10_000_000,
        },
        records,
    };

    let mut parser = Parser::new(reader);
    parser.add_trace_source("scenario.etl").unwrap();
    let mut state = CurrentState::new(FakeEnumerator);
    parser.parse(|event| state.on_event(event)).unwrap();

    assert_eq!(parser.dropped_events(), 0);
    assert!(state.stacks().is_empty());
    assert_eq!(
        state
            .event_counts()
            .get(&("PerfInfo".into(), "SampleProf".into())),
        Some(&1)
    );
}
