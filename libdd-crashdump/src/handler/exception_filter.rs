// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg(windows)]

use crate::handler::capabilities::Capabilities;
use crate::handler::FaultEvent;
use crate::shared::constants::PROCESS_CALLBACK_FILTER_ENABLED;
use std::ffi::c_void;
use windows::Win32::System::Diagnostics::Debug::{
    EXCEPTION_CONTINUE_SEARCH, EXCEPTION_POINTERS,
};
use windows::Win32::System::Threading::GetCurrentThreadId;

/// The process's top-level unhandled-exception filter.
///
/// Runs on whichever thread the platform delivers the fault to, in whatever
/// state that thread is in. Everything it needs is either on its own stack or
/// in the write-once handler slot; it takes no locks and holds no allocation
/// beyond what one capture requires.
///
/// Always returns `EXCEPTION_CONTINUE_SEARCH`: the fault is never claimed, so
/// outer handlers and the platform's default termination still run after the
/// capture.
pub(crate) unsafe extern "system" fn unhandled_exception_filter(
    exception_info: *const EXCEPTION_POINTERS,
) -> i32 {
    if let Some(handler) = crate::api::installed_handler() {
        if !exception_info.is_null() {
            let record = (*exception_info).ExceptionRecord;
            if !record.is_null() {
                let fault = FaultEvent {
                    code: (*record).ExceptionCode.0 as u32,
                    thread_id: GetCurrentThreadId(),
                    exception_pointers: exception_info as *mut c_void,
                };
                handler.handle_fault(&fault);
            }
        }
    }
    EXCEPTION_CONTINUE_SEARCH
}

/// Clears `PROCESS_CALLBACK_FILTER_ENABLED` from the process exception
/// policy, so faults raised inside kernel-to-user callback dispatch reach
/// this filter instead of being swallowed (KB976038). A no-op unless both
/// policy entry points resolved.
pub(crate) fn relax_callback_exception_policy(capabilities: &Capabilities) {
    let (Some(get_policy), Some(set_policy)) = (
        capabilities.get_exception_policy,
        capabilities.set_exception_policy,
    ) else {
        return;
    };

    let mut flags = 0u32;
    // SAFETY: both entry points take/return plain flag words; `flags` lives
    // across the call.
    unsafe {
        if get_policy(&mut flags).as_bool() {
            let _ = set_policy(flags & !PROCESS_CALLBACK_FILTER_ENABLED);
        }
    }
}
