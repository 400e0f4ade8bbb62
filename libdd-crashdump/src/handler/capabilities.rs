// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg(windows)]

//! Resolution of the optional platform entry points the subsystem depends
//! on. Not every Windows version (nor every CRT flavour) exports all of
//! them, so each one is probed exactly once at initialization and every call
//! site is conditioned on its presence.

use libloading::Library;
use std::ffi::c_void;
use windows::Win32::Foundation::{BOOL, HANDLE};
use windows::Win32::System::Diagnostics::Debug::{
    MINIDUMP_EXCEPTION_INFORMATION, MINIDUMP_TYPE,
};

pub(crate) type MiniDumpWriteDumpFn = unsafe extern "system" fn(
    process: HANDLE,
    process_id: u32,
    file: HANDLE,
    dump_type: MINIDUMP_TYPE,
    exception_param: *const MINIDUMP_EXCEPTION_INFORMATION,
    user_stream_param: *const c_void,
    callback_param: *const c_void,
) -> BOOL;

pub(crate) type GetExceptionPolicyFn = unsafe extern "system" fn(flags: *mut u32) -> BOOL;
pub(crate) type SetExceptionPolicyFn = unsafe extern "system" fn(flags: u32) -> BOOL;

pub(crate) type InvalidParameterHandlerFn = unsafe extern "C" fn(
    expression: *const u16,
    function: *const u16,
    file: *const u16,
    line: u32,
    reserved: usize,
);
pub(crate) type SetInvalidParameterHandlerFn =
    unsafe extern "C" fn(Option<InvalidParameterHandlerFn>) -> Option<InvalidParameterHandlerFn>;

pub(crate) type TerminateHandlerFn = unsafe extern "C" fn();
pub(crate) type SetTerminateFn =
    unsafe extern "C" fn(Option<TerminateHandlerFn>) -> Option<TerminateHandlerFn>;

/// The optional platform entry points, each either resolved or absent.
///
/// Resolved once during single-threaded initialization and then passed by
/// reference into the installation path; nothing here is mutated afterwards.
pub(crate) struct Capabilities {
    /// `dbghelp!MiniDumpWriteDump`, the process-snapshot writer. Without it
    /// the whole subsystem stays inert.
    pub write_dump: Option<MiniDumpWriteDumpFn>,
    /// `kernel32!GetProcessUserModeExceptionPolicy`; undocumented, absent on
    /// most modern versions.
    pub get_exception_policy: Option<GetExceptionPolicyFn>,
    /// `kernel32!SetProcessUserModeExceptionPolicy`.
    pub set_exception_policy: Option<SetExceptionPolicyFn>,
    /// `ucrtbase!_set_invalid_parameter_handler`; absent with a static or
    /// non-MSVC CRT.
    pub set_invalid_parameter_handler: Option<SetInvalidParameterHandlerFn>,
    /// `vcruntime140!set_terminate`; absent unless the C++ runtime is loaded.
    pub set_terminate: Option<SetTerminateFn>,
}

impl Capabilities {
    pub(crate) fn probe() -> Self {
        let dbghelp = load_leaked("dbghelp.dll");
        let kernel32 = load_leaked("kernel32.dll");
        let ucrtbase = load_leaked("ucrtbase.dll");
        let vcruntime = load_leaked("vcruntime140.dll");

        // SAFETY: each symbol is only transmuted to the signature the
        // exporting DLL documents for it, and the leaked libraries keep the
        // addresses valid for the process lifetime.
        unsafe {
            Self {
                write_dump: resolve(dbghelp, b"MiniDumpWriteDump\0"),
                get_exception_policy: resolve(kernel32, b"GetProcessUserModeExceptionPolicy\0"),
                set_exception_policy: resolve(kernel32, b"SetProcessUserModeExceptionPolicy\0"),
                set_invalid_parameter_handler: resolve(
                    ucrtbase,
                    b"_set_invalid_parameter_handler\0",
                ),
                set_terminate: resolve(vcruntime, b"set_terminate\0"),
            }
        }
    }
}

/// Loads `name` and leaks the handle: resolved symbols are installed into
/// process-wide hooks and must stay valid until the process dies.
fn load_leaked(name: &str) -> Option<&'static Library> {
    // SAFETY: the named modules are plain system DLLs whose initializers are
    // safe to run (dbghelp may not yet be loaded; the others already are).
    match unsafe { Library::new(name) } {
        Ok(library) => Some(Box::leak(Box::new(library))),
        Err(error) => {
            log::debug!("{name} did not load: {error}");
            None
        }
    }
}

unsafe fn resolve<T: Copy>(library: Option<&'static Library>, symbol: &[u8]) -> Option<T> {
    let library = library?;
    library.get::<T>(symbol).ok().map(|symbol| *symbol)
}
