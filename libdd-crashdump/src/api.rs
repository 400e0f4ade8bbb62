// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::shared::configuration::CrashDumpConfiguration;

/// Arms crash dump capture for this process with the default configuration.
///
/// The single host-facing lifecycle call: invoke once, early, before
/// fault-prone code and before other threads spawn. Every failure degrades to
/// "capture unavailable" rather than aborting startup, so it is always safe
/// to call, including on platforms and Windows versions without a snapshot
/// facility.
///
/// # Preconditions
///   None.
/// # Safety
///   Not reentrant; the host provides the called-once-early ordering.
/// # Atomicity
///   Handler state is published through a write-once slot; a second call is
///   a logged no-op.
pub fn init() {
    init_with_config(CrashDumpConfiguration::default());
}

/// [`init`] with host-supplied settings (dump-root override, extra benign
/// codes, snapshot detail level).
pub fn init_with_config(config: CrashDumpConfiguration) {
    #[cfg(windows)]
    self::windows::install(config);

    #[cfg(not(windows))]
    {
        let _ = config;
        log::debug!("no process snapshot facility on this platform; crash dump capture disabled");
    }
}

#[cfg(windows)]
pub(crate) use self::windows::installed_handler;

#[cfg(windows)]
mod windows {
    use crate::handler::capabilities::Capabilities;
    use crate::handler::crt_hooks;
    use crate::handler::diagnostics::MessageBoxSink;
    use crate::handler::exception_filter::{
        relax_callback_exception_policy, unhandled_exception_filter,
    };
    use crate::handler::snapshot::MiniDumpSnapshotWriter;
    use crate::handler::CrashDumpHandler;
    use crate::shared::configuration::CrashDumpConfiguration;
    use std::sync::OnceLock;
    use windows::Win32::System::Diagnostics::Debug::{
        SetUnhandledExceptionFilter, MiniDumpNormal, MiniDumpWithFullMemory,
    };

    // Written once below, before any hook that reads it is installed;
    // read-only for the rest of the process lifetime.
    static HANDLER: OnceLock<CrashDumpHandler> = OnceLock::new();

    pub(crate) fn installed_handler() -> Option<&'static CrashDumpHandler> {
        HANDLER.get()
    }

    pub(super) fn install(config: CrashDumpConfiguration) {
        let capabilities = Capabilities::probe();

        // No writer, no hooks: a handler that cannot produce output would
        // only displace the platform's default fault behavior.
        let Some(write_dump) = capabilities.write_dump else {
            log::warn!("MiniDumpWriteDump did not resolve; crash dump capture disabled");
            return;
        };

        let dump_type = if config.full_memory() {
            MiniDumpWithFullMemory
        } else {
            MiniDumpNormal
        };
        let handler = CrashDumpHandler::new(
            config,
            Box::new(MiniDumpSnapshotWriter::new(write_dump, dump_type)),
            Box::new(MessageBoxSink),
        );
        if HANDLER.set(handler).is_err() {
            log::warn!("crash dump capture already initialized; ignoring repeated call");
            return;
        }

        relax_callback_exception_policy(&capabilities);

        // SAFETY: the filter only reads the handler slot published above and
        // per-fault state handed to it by the platform.
        unsafe {
            SetUnhandledExceptionFilter(Some(unhandled_exception_filter));
        }

        // Debug builds keep the CRT's default behavior so contract
        // violations stop in the debugger instead of producing a dump.
        if cfg!(debug_assertions) {
            return;
        }
        crt_hooks::install(&capabilities);
    }
}
