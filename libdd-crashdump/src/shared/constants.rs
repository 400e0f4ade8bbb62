// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Constants shared between fault classification, dump capture and the
//! platform hook layers.
//!
//! The exception-code values are standard Windows constants. They are defined
//! here rather than imported from the `windows` crate so that classification
//! stays buildable (and testable) on every platform, and so the benign-signal
//! list can be treated as plain numbers by the configuration layer.

/// Structured-exception codes at or below this value are RPC-layer signaling
/// traffic rather than faults, and are never captured.
pub const SIGNALING_CODE_THRESHOLD: u32 = 0x0000_1000;

/// `DBG_PRINTEXCEPTION_C`, raised by `OutputDebugStringA`.
pub const DBG_PRINTEXCEPTION_C: u32 = 0x4001_0006;

/// `DBG_PRINTEXCEPTION_WIDE_C`, raised by `OutputDebugStringW`.
pub const DBG_PRINTEXCEPTION_WIDE_C: u32 = 0x4001_000A;

/// `STATUS_INVALID_HANDLE`. Instrumentation frameworks probe handle validity
/// under a debugger by provoking exactly this status; with a handler installed
/// process-wide it must not be treated as a fault.
pub const STATUS_INVALID_HANDLE: u32 = 0xC000_0008;

/// The MSVC thread-naming protocol: a `RaiseException` with this code carries
/// a thread name to any attached debugger.
pub const THREAD_NAME_EXCEPTION: u32 = 0x406D_1388;

/// Exception codes which are signaling conventions of the platform or of
/// attached tooling, not fatal conditions. Capturing on these would flood the
/// disk with spurious dumps.
pub const BENIGN_SIGNAL_CODES: [u32; 4] = [
    DBG_PRINTEXCEPTION_C,
    DBG_PRINTEXCEPTION_WIDE_C,
    STATUS_INVALID_HANDLE,
    THREAD_NAME_EXCEPTION,
];

/// `STATUS_INVALID_PARAMETER`, raised by the invalid-parameter hook to route a
/// CRT contract violation into the capture path.
pub const STATUS_INVALID_PARAMETER: u32 = 0xC000_000D;

/// `STATUS_FATAL_APP_EXIT`, raised by the terminate hook to route an uncaught
/// termination request into the capture path.
pub const STATUS_FATAL_APP_EXIT: u32 = 0x4000_0015;

/// `PROCESS_CALLBACK_FILTER_ENABLED`: while this process policy bit is set,
/// faults raised inside kernel-to-user callback dispatch are silently
/// swallowed on some Windows versions (KB976038).
pub const PROCESS_CALLBACK_FILTER_ENABLED: u32 = 0x1;

/// Subdirectory of the dump root that receives the dump artifacts.
pub const DUMP_DIRECTORY: &str = "minidump";

/// Upper bound, in bytes, on any user-visible diagnostic message.
pub const MAX_DIAGNOSTIC_BYTES: usize = 1024;
