// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::shared::constants::SIGNALING_CODE_THRESHOLD;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Process-wide crash dump settings.
///
/// Constructed once, before the handler is published, and immutable
/// afterwards. The defaults reproduce the historical behavior: dumps land
/// under the working directory at fault time, only the built-in benign codes
/// are filtered, and the snapshot is the small "normal" detail level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrashDumpConfiguration {
    // When unset, the dump root is the current working directory at fault
    // time, not at initialization time.
    dump_root: Option<PathBuf>,
    // Additional exception codes to discard as benign signaling. The set of
    // codes raised by tooling for non-fault purposes is discovered
    // empirically and varies with the instrumentation attached to the host.
    extra_benign_codes: Vec<u32>,
    full_memory: bool,
}

impl CrashDumpConfiguration {
    pub fn new(
        dump_root: Option<PathBuf>,
        mut extra_benign_codes: Vec<u32>,
        full_memory: bool,
    ) -> anyhow::Result<Self> {
        extra_benign_codes
            .iter()
            .try_for_each(|code| {
                anyhow::ensure!(
                    *code > SIGNALING_CODE_THRESHOLD,
                    "benign code {code:#x} is below the signaling threshold and already discarded"
                );
                Ok(())
            })?;
        let before_len = extra_benign_codes.len();
        extra_benign_codes.sort_unstable();
        extra_benign_codes.dedup();
        anyhow::ensure!(
            before_len == extra_benign_codes.len(),
            "benign code list contained duplicate elements"
        );
        Ok(Self {
            dump_root,
            extra_benign_codes,
            full_memory,
        })
    }

    pub fn dump_root(&self) -> Option<&Path> {
        self.dump_root.as_deref()
    }

    pub fn extra_benign_codes(&self) -> &[u32] {
        &self.extra_benign_codes
    }

    /// Whether to request an exhaustive memory snapshot instead of the
    /// default small one. Full dumps are dramatically larger and slower to
    /// write from a faulting process.
    pub fn full_memory(&self) -> bool {
        self.full_memory
    }
}

impl Default for CrashDumpConfiguration {
    fn default() -> Self {
        Self {
            dump_root: None,
            extra_benign_codes: Vec::new(),
            full_memory: false,
        }
    }
}
