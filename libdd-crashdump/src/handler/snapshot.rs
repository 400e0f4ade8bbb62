// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::handler::FaultEvent;
use std::fs::File;
use std::io;

/// The seam between the portable capture pipeline and the platform's
/// process-snapshot facility.
///
/// The writer is handed an already-open file and the fault being reported; it
/// must not close the file (the caller does, whatever the outcome) and must
/// report failure through the returned [`io::Error`], which carries the
/// platform's last-error code.
pub trait SnapshotWriter: Send + Sync {
    fn write(&self, file: &File, fault: &FaultEvent) -> io::Result<()>;
}

#[cfg(windows)]
pub(crate) use self::windows::MiniDumpSnapshotWriter;

#[cfg(windows)]
mod windows {
    use super::SnapshotWriter;
    use crate::handler::capabilities::MiniDumpWriteDumpFn;
    use crate::handler::FaultEvent;
    use std::ffi::c_void;
    use std::fs::File;
    use std::io;
    use std::os::windows::io::AsRawHandle;
    use std::ptr;
    use windows::Win32::Foundation::{HANDLE, TRUE};
    use windows::Win32::System::Diagnostics::Debug::{
        EXCEPTION_POINTERS, MINIDUMP_EXCEPTION_INFORMATION, MINIDUMP_TYPE,
    };
    use windows::Win32::System::Threading::{GetCurrentProcess, GetCurrentProcessId};

    /// Binds the dynamically resolved `MiniDumpWriteDump` entry point.
    pub(crate) struct MiniDumpSnapshotWriter {
        write_dump: MiniDumpWriteDumpFn,
        dump_type: MINIDUMP_TYPE,
    }

    impl MiniDumpSnapshotWriter {
        pub(crate) fn new(write_dump: MiniDumpWriteDumpFn, dump_type: MINIDUMP_TYPE) -> Self {
            Self {
                write_dump,
                dump_type,
            }
        }
    }

    impl SnapshotWriter for MiniDumpSnapshotWriter {
        fn write(&self, file: &File, fault: &FaultEvent) -> io::Result<()> {
            // ClientPointers tells the writer that the exception block lives
            // in this process's own address space.
            let exception_information = MINIDUMP_EXCEPTION_INFORMATION {
                ThreadId: fault.thread_id,
                ExceptionPointers: fault.exception_pointers as *mut EXCEPTION_POINTERS,
                ClientPointers: TRUE,
            };
            let exception_param: *const MINIDUMP_EXCEPTION_INFORMATION =
                if fault.exception_pointers.is_null() {
                    ptr::null()
                } else {
                    &exception_information
                };

            // SAFETY: the handle is owned by `file` for the whole call, and
            // `exception_param` either is null or points at a block that
            // outlives the call.
            let ok = unsafe {
                (self.write_dump)(
                    GetCurrentProcess(),
                    GetCurrentProcessId(),
                    HANDLE(file.as_raw_handle()),
                    self.dump_type,
                    exception_param,
                    ptr::null::<c_void>(),
                    ptr::null::<c_void>(),
                )
            };
            if ok.as_bool() {
                Ok(())
            } else {
                Err(io::Error::last_os_error())
            }
        }
    }
}
