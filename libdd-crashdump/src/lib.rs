// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! A process-wide last-resort fault handler: converts otherwise-fatal faults
//! into a minidump on disk, then lets the process terminate normally.
//!
//! Architecturally, it consists of four parts:
//! 1. A capability probe, run once at initialization, which resolves the
//!    optional platform entry points (the minidump writer, the user-mode
//!    exception-policy pair, the CRT hook installers). Not every Windows
//!    version or CRT flavour exports them, so everything downstream is
//!    conditioned on what actually resolved; with no minidump writer the
//!    subsystem installs nothing and fatal faults follow default platform
//!    behavior.
//! 2. Fault interception: the top-level unhandled-exception filter, plus (in
//!    release builds) the CRT invalid-parameter and terminate hooks, which
//!    funnel runtime contract violations into the same path by raising a
//!    noncontinuable structured exception after notifying the user.
//! 3. Classification: structured exceptions double as a signaling mechanism
//!    for the platform and for attached tooling (debug-string output, thread
//!    naming, handle probes, RPC chatter), so each delivered code is either
//!    discarded as benign or accepted as a genuine fault. Capturing on every
//!    signal would flood the disk and could itself destabilize a process
//!    that is already dying.
//! 4. Dump capture: a timestamp-named file under `minidump/` in the working
//!    directory (or a configured root), written by `MiniDumpWriteDump` at
//!    the small "normal" detail level. Failures inside the capture path are
//!    reported once through a modal dialog; by that point, interactive
//!    diagnosis is the only recourse left.
//!
//! The handler never claims a fault: after capturing (or discarding) it
//! always defers to outer handlers and the platform's default termination.
//! Nothing is ever recovered into continued execution.
//!
//! The classification and capture pipeline is portable and unit-tested on
//! every platform through the [`SnapshotWriter`] and [`DiagnosticSink`]
//! seams; only the probe, the hooks and the dialog are Windows-specific.

mod api;
mod handler;
mod shared;

pub use api::{init, init_with_config};
pub use handler::classify::{classify, FaultClass};
pub use handler::diagnostics::{DiagnosticSink, StderrSink};
pub use handler::dump::{dump_file_name, CaptureError};
pub use handler::snapshot::SnapshotWriter;
pub use handler::{CrashDumpHandler, FaultEvent};
pub use shared::configuration::CrashDumpConfiguration;
pub use shared::constants::*;
