// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! End-to-end dispatch over the portable pipeline: a handler wired to a stub
//! snapshot writer, driven with synthetic fault events, observed through the
//! filesystem and a recording diagnostic sink.

use libdd_crashdump::{
    CrashDumpConfiguration, CrashDumpHandler, DiagnosticSink, FaultClass, FaultEvent,
    SnapshotWriter, BENIGN_SIGNAL_CODES, DUMP_DIRECTORY, SIGNALING_CODE_THRESHOLD,
};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering::SeqCst};
use std::sync::{Arc, Mutex};

struct StubSnapshotWriter {
    calls: Arc<AtomicUsize>,
}

impl SnapshotWriter for StubSnapshotWriter {
    fn write(&self, file: &File, _fault: &FaultEvent) -> io::Result<()> {
        self.calls.fetch_add(1, SeqCst);
        let mut file = file;
        file.write_all(b"MDMP stub snapshot")
    }
}

struct RecordingSink {
    messages: Arc<Mutex<Vec<String>>>,
}

impl DiagnosticSink for RecordingSink {
    fn fatal(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}

struct Fixture {
    handler: CrashDumpHandler,
    calls: Arc<AtomicUsize>,
    messages: Arc<Mutex<Vec<String>>>,
}

fn fixture(root: &Path, extra_benign_codes: Vec<u32>) -> Fixture {
    let calls = Arc::new(AtomicUsize::new(0));
    let messages = Arc::new(Mutex::new(Vec::new()));
    let config =
        CrashDumpConfiguration::new(Some(root.to_path_buf()), extra_benign_codes, false).unwrap();
    let handler = CrashDumpHandler::new(
        config,
        Box::new(StubSnapshotWriter {
            calls: calls.clone(),
        }),
        Box::new(RecordingSink {
            messages: messages.clone(),
        }),
    );
    Fixture {
        handler,
        calls,
        messages,
    }
}

fn dump_files(root: &Path) -> Vec<String> {
    let dir = root.join(DUMP_DIRECTORY);
    if !dir.exists() {
        return Vec::new();
    }
    fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().into_string().unwrap())
        .collect()
}

// dump-DDMMYYYY_HHMMSSmmmm.dmp
fn is_dump_name(name: &str) -> bool {
    let Some(rest) = name.strip_prefix("dump-") else {
        return false;
    };
    let Some(rest) = rest.strip_suffix(".dmp") else {
        return false;
    };
    let Some((date, time)) = rest.split_once('_') else {
        return false;
    };
    date.len() == 8
        && time.len() == 10
        && date.chars().all(|c| c.is_ascii_digit())
        && time.chars().all(|c| c.is_ascii_digit())
}

#[test]
fn test_fatal_fault_produces_exactly_one_artifact() {
    let tmp = tempfile::tempdir().unwrap();
    let fixture = fixture(tmp.path(), vec![]);

    // A C++ exception that reached the top of the stack.
    let class = fixture.handler.handle_fault(&FaultEvent::synthetic(0xE06D_7363));

    assert_eq!(class, FaultClass::Fatal);
    assert_eq!(fixture.calls.load(SeqCst), 1);
    assert!(fixture.messages.lock().unwrap().is_empty());

    let files = dump_files(tmp.path());
    assert_eq!(files.len(), 1);
    assert!(is_dump_name(&files[0]), "unexpected name {}", files[0]);
    let content = fs::read(tmp.path().join(DUMP_DIRECTORY).join(&files[0])).unwrap();
    assert!(!content.is_empty());
}

#[test]
fn test_debug_string_signal_leaves_no_artifact() {
    let tmp = tempfile::tempdir().unwrap();
    let fixture = fixture(tmp.path(), vec![]);

    for code in BENIGN_SIGNAL_CODES {
        let class = fixture.handler.handle_fault(&FaultEvent::synthetic(code));
        assert_eq!(class, FaultClass::BenignSignal, "{code:#x}");
    }

    assert_eq!(fixture.calls.load(SeqCst), 0);
    assert!(dump_files(tmp.path()).is_empty());
    assert!(fixture.messages.lock().unwrap().is_empty());
}

#[test]
fn test_signaling_traffic_below_threshold_is_never_captured() {
    let tmp = tempfile::tempdir().unwrap();
    let fixture = fixture(tmp.path(), vec![]);

    for code in (0..=SIGNALING_CODE_THRESHOLD).step_by(0x40) {
        assert_eq!(
            fixture.handler.handle_fault(&FaultEvent::synthetic(code)),
            FaultClass::RpcChatter,
            "{code:#x}"
        );
    }
    // The exact boundary, and the first code past it.
    assert_eq!(
        fixture
            .handler
            .handle_fault(&FaultEvent::synthetic(SIGNALING_CODE_THRESHOLD)),
        FaultClass::RpcChatter
    );
    assert_eq!(
        fixture
            .handler
            .handle_fault(&FaultEvent::synthetic(SIGNALING_CODE_THRESHOLD + 1)),
        FaultClass::Fatal
    );

    assert_eq!(fixture.calls.load(SeqCst), 1);
}

#[test]
fn test_configured_benign_codes_extend_the_denylist() {
    let tmp = tempfile::tempdir().unwrap();
    let fixture = fixture(tmp.path(), vec![0x4001_1000]);

    assert_eq!(
        fixture.handler.handle_fault(&FaultEvent::synthetic(0x4001_1000)),
        FaultClass::BenignSignal
    );
    assert_eq!(fixture.calls.load(SeqCst), 0);
}

#[test]
fn test_each_fatal_delivery_captures_once() {
    let tmp = tempfile::tempdir().unwrap();
    let fixture = fixture(tmp.path(), vec![]);

    for _ in 0..3 {
        fixture.handler.handle_fault(&FaultEvent::synthetic(0xC000_0005));
    }
    assert_eq!(fixture.calls.load(SeqCst), 3);
    // Deliveries inside the same millisecond reuse the artifact name, so the
    // file count may be lower than the capture count.
    assert!(!dump_files(tmp.path()).is_empty());
}

#[test]
fn test_blocked_dump_directory_is_reported_not_fatal_to_the_handler() {
    let tmp = tempfile::tempdir().unwrap();
    fs::write(tmp.path().join(DUMP_DIRECTORY), b"a file in the way").unwrap();
    let fixture = fixture(tmp.path(), vec![]);

    let class = fixture.handler.handle_fault(&FaultEvent::synthetic(0xC000_0005));

    assert_eq!(class, FaultClass::Fatal);
    assert_eq!(fixture.calls.load(SeqCst), 0);
    let messages = fixture.messages.lock().unwrap();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains(DUMP_DIRECTORY));
}

#[test]
fn test_writer_failure_surfaces_the_platform_error_code() {
    struct FailingWriter;
    impl SnapshotWriter for FailingWriter {
        fn write(&self, _file: &File, _fault: &FaultEvent) -> io::Result<()> {
            Err(io::Error::from_raw_os_error(31))
        }
    }

    let tmp = tempfile::tempdir().unwrap();
    let messages = Arc::new(Mutex::new(Vec::new()));
    let config = CrashDumpConfiguration::new(Some(tmp.path().to_path_buf()), vec![], false).unwrap();
    let handler = CrashDumpHandler::new(
        config,
        Box::new(FailingWriter),
        Box::new(RecordingSink {
            messages: messages.clone(),
        }),
    );

    handler.handle_fault(&FaultEvent::synthetic(0xC000_0005));

    let messages = messages.lock().unwrap();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("minidump writer failed"));
}
