// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg(windows)]

//! Interception of C-runtime contract violations: invalid parameters passed
//! to CRT functions, and `terminate()` reached without a handler. Both hooks
//! notify the user, then force the condition down the unhandled-exception
//! path so it is captured like any other fatal fault. Neither ever resumes
//! normal execution.

use crate::handler::capabilities::Capabilities;
use crate::shared::constants::{STATUS_FATAL_APP_EXIT, STATUS_INVALID_PARAMETER};
use windows::Win32::System::Diagnostics::Debug::RaiseException;

pub(crate) fn install(capabilities: &Capabilities) {
    match capabilities.set_invalid_parameter_handler {
        // SAFETY: the installer only stores the pointer; the handler itself
        // is called by the CRT with the documented argument layout.
        Some(set_handler) => unsafe {
            set_handler(Some(invalid_parameter_handler));
        },
        None => log::debug!(
            "_set_invalid_parameter_handler did not resolve; CRT parameter faults keep default handling"
        ),
    }
    match capabilities.set_terminate {
        // SAFETY: as above.
        Some(set_handler) => unsafe {
            set_handler(Some(terminate_handler));
        },
        None => log::debug!(
            "set_terminate did not resolve; uncaught termination keeps default handling"
        ),
    }
}

unsafe extern "C" fn invalid_parameter_handler(
    expression: *const u16,
    function: *const u16,
    file: *const u16,
    _line: u32,
    _reserved: usize,
) {
    if let Some(handler) = crate::api::installed_handler() {
        // Release CRTs pass null for every argument; the placeholders keep
        // the dialog readable.
        let message = format!(
            "Invalid parameter passed to CRT function! Program will now crash.\n\n\
             File: {}\nFunction: {}\nExpression: {}",
            wide_or_placeholder(file),
            wide_or_placeholder(function),
            wide_or_placeholder(expression),
        );
        handler.diagnostics().fatal(&message);
    }
    raise_noncontinuable(STATUS_INVALID_PARAMETER);
}

unsafe extern "C" fn terminate_handler() {
    if let Some(handler) = crate::api::installed_handler() {
        handler
            .diagnostics()
            .fatal("Process termination was requested in an unusual way. Program will now crash.");
    }
    raise_noncontinuable(STATUS_FATAL_APP_EXIT);
}

/// Hands control to the fault path: raises `code` as a noncontinuable
/// structured exception, which flows through the unhandled-exception filter
/// (capturing a dump) and on into the platform's default termination.
fn raise_noncontinuable(code: u32) {
    // Defined locally: the windows crate gates this constant behind a
    // feature pulled in for nothing else. Value per winnt.h.
    const EXCEPTION_NONCONTINUABLE: u32 = 0x1;
    // SAFETY: no preconditions; the exception machinery takes over from here.
    unsafe { RaiseException(code, EXCEPTION_NONCONTINUABLE, None) };
}

unsafe fn wide_or_placeholder(text: *const u16) -> String {
    if text.is_null() {
        return "???".to_string();
    }
    let mut len = 0usize;
    while *text.add(len) != 0 {
        len += 1;
    }
    String::from_utf16_lossy(std::slice::from_raw_parts(text, len))
}
