// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

pub(crate) mod capabilities;
pub mod classify;
pub(crate) mod crt_hooks;
pub mod diagnostics;
pub mod dump;
pub(crate) mod exception_filter;
pub mod snapshot;

use crate::handler::classify::{classify, FaultClass};
use crate::handler::diagnostics::DiagnosticSink;
use crate::handler::dump::capture;
use crate::handler::snapshot::SnapshotWriter;
use crate::shared::configuration::CrashDumpConfiguration;
use std::ffi::c_void;
use std::ptr;

/// The platform-delivered description of a fault: its numeric exception code,
/// the faulting thread, and an opaque reference to the machine-state block.
///
/// The event is only borrowed for the duration of one handler invocation; the
/// machine-state block is owned by the platform and is never copied.
pub struct FaultEvent {
    pub code: u32,
    pub thread_id: u32,
    /// Points at the platform `EXCEPTION_POINTERS` block, or null for events
    /// that carry no machine state (runtime-contract hooks, tests).
    pub exception_pointers: *mut c_void,
}

impl FaultEvent {
    /// An event with a code but no machine-state reference.
    pub fn synthetic(code: u32) -> Self {
        Self {
            code,
            thread_id: 0,
            exception_pointers: ptr::null_mut(),
        }
    }
}

/// The immutable fault-handling pipeline: classification, capture, and the
/// diagnostic channel for the capture path's own failures.
///
/// Built once at initialization and published process-wide; every field is
/// read-only afterwards, so concurrent handler invocations on different
/// threads share it without locking.
pub struct CrashDumpHandler {
    config: CrashDumpConfiguration,
    writer: Box<dyn SnapshotWriter>,
    diagnostics: Box<dyn DiagnosticSink>,
}

impl CrashDumpHandler {
    pub fn new(
        config: CrashDumpConfiguration,
        writer: Box<dyn SnapshotWriter>,
        diagnostics: Box<dyn DiagnosticSink>,
    ) -> Self {
        Self {
            config,
            writer,
            diagnostics,
        }
    }

    /// Runs one fault through classification and, for fatal faults, capture.
    ///
    /// Never claims the fault: whatever happened here, the caller must let
    /// the search continue so outer handlers and the platform's default
    /// termination still run. Capture failures are reported once through the
    /// diagnostic sink and otherwise swallowed; a process in a fatal-fault
    /// state must not loop or retry.
    pub fn handle_fault(&self, fault: &FaultEvent) -> FaultClass {
        let class = classify(fault.code, self.config.extra_benign_codes());
        if class.is_fatal() {
            if let Err(error) = capture(&self.config, self.writer.as_ref(), fault) {
                self.diagnostics.fatal(&error.to_string());
            }
        }
        class
    }

    #[cfg_attr(not(windows), allow(dead_code))]
    pub(crate) fn diagnostics(&self) -> &dyn DiagnosticSink {
        self.diagnostics.as_ref()
    }
}
