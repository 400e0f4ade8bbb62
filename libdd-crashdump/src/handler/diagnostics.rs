// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! The user-visible channel for failures of the fault-handling machinery
//! itself. By the time anything here runs, interactive diagnosis is the only
//! recourse left, so messages block until acknowledged where the platform
//! supports it.

use crate::shared::constants::MAX_DIAGNOSTIC_BYTES;

/// Where fault-path failures are reported.
///
/// Exactly one sink is selected at initialization and lives for the process
/// lifetime. Implementations must not panic: a sink failure inside a fault
/// handler would mask the fault being reported.
pub trait DiagnosticSink: Send + Sync {
    /// Present `message` to the user and return once it has been delivered.
    fn fatal(&self, message: &str);
}

/// Caps a message at [`MAX_DIAGNOSTIC_BYTES`], cutting at a char boundary.
pub(crate) fn truncated(message: &str) -> &str {
    if message.len() < MAX_DIAGNOSTIC_BYTES {
        return message;
    }
    let mut end = MAX_DIAGNOSTIC_BYTES - 1;
    while !message.is_char_boundary(end) {
        end -= 1;
    }
    &message[..end]
}

/// Fallback sink for platforms without a native modal dialog.
pub struct StderrSink;

impl DiagnosticSink for StderrSink {
    fn fatal(&self, message: &str) {
        eprintln!("{}", truncated(message));
    }
}

/// Modal `MessageBoxA` titled "Error", matching the historical surface.
#[cfg(windows)]
pub struct MessageBoxSink;

#[cfg(windows)]
impl DiagnosticSink for MessageBoxSink {
    fn fatal(&self, message: &str) {
        use windows::core::{s, PCSTR};
        use windows::Win32::UI::WindowsAndMessaging::{MessageBoxA, MB_ICONERROR};

        let text = truncated(message);
        let mut buffer = Vec::with_capacity(text.len() + 1);
        buffer.extend_from_slice(text.as_bytes());
        buffer.push(0);
        // SAFETY: `buffer` is NUL-terminated and outlives the call, which
        // blocks until the dialog is dismissed.
        unsafe {
            MessageBoxA(None, PCSTR(buffer.as_ptr()), s!("Error"), MB_ICONERROR);
        }
    }
}
