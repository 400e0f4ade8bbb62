// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::handler::snapshot::SnapshotWriter;
use crate::handler::FaultEvent;
use crate::shared::configuration::CrashDumpConfiguration;
use crate::shared::constants::DUMP_DIRECTORY;
use chrono::{DateTime, Datelike, Local, Timelike};
use std::fs::{self, File};
use std::io;
use std::path::PathBuf;

/// A capture either produces a dump file or fails exactly once with one of
/// these; nothing propagates past the handler boundary.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("Unable to obtain the current directory during crash dump: {0}")]
    CurrentDir(io::Error),
    #[error("Unable to create crash dump directory '{}': {source}", path.display())]
    CreateDir { path: PathBuf, source: io::Error },
    #[error("Failed to open file path '{}' while generating crash dump: {source}", path.display())]
    CreateFile { path: PathBuf, source: io::Error },
    #[error("The minidump writer failed. Error: {0}")]
    Snapshot(io::Error),
}

/// Formats the artifact name for a capture at `at`:
/// `dump-DDMMYYYY_HHMMSSmmmm.dmp`, with a four-digit millisecond field.
///
/// Names are unique across faults more than a millisecond apart. Two faults
/// inside the same millisecond produce the same name and the later one wins;
/// a process faulting twice that fast is beyond saving anyway, so the
/// collision is accepted rather than disambiguated.
pub fn dump_file_name(at: DateTime<Local>) -> String {
    format!(
        "dump-{:02}{:02}{:04}_{:02}{:02}{:02}{:04}.dmp",
        at.day(),
        at.month(),
        at.year(),
        at.hour(),
        at.minute(),
        at.second(),
        at.timestamp_subsec_millis(),
    )
}

/// Best-effort write of a process snapshot for `fault` to a fresh file under
/// the dump directory. Returns the path of the artifact on success.
pub(crate) fn capture(
    config: &CrashDumpConfiguration,
    writer: &dyn SnapshotWriter,
    fault: &FaultEvent,
) -> Result<PathBuf, CaptureError> {
    let root = match config.dump_root() {
        Some(root) => root.to_path_buf(),
        None => std::env::current_dir().map_err(CaptureError::CurrentDir)?,
    };

    let dump_dir = root.join(DUMP_DIRECTORY);
    if let Err(source) = fs::create_dir(&dump_dir) {
        if source.kind() != io::ErrorKind::AlreadyExists {
            return Err(CaptureError::CreateDir {
                path: dump_dir,
                source,
            });
        }
    }
    // `create_dir` also reports AlreadyExists when the path is occupied by a
    // plain file, which leaves nowhere to write.
    if !dump_dir.is_dir() {
        return Err(CaptureError::CreateDir {
            path: dump_dir,
            source: io::Error::new(io::ErrorKind::AlreadyExists, "path exists and is not a directory"),
        });
    }

    let path = dump_dir.join(dump_file_name(Local::now()));
    let file = File::create(&path).map_err(|source| CaptureError::CreateFile {
        path: path.clone(),
        source,
    })?;

    // The file closes when it drops, whatever the writer reported.
    writer
        .write(&file, fault)
        .map_err(CaptureError::Snapshot)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io::Write;

    struct StubWriter;

    impl SnapshotWriter for StubWriter {
        fn write(&self, file: &File, _fault: &FaultEvent) -> io::Result<()> {
            let mut file = file;
            file.write_all(b"MDMP")
        }
    }

    fn local_time(ms: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 3, 7, 4, 5, 6).unwrap() + chrono::Duration::milliseconds(ms as i64)
    }

    #[test]
    fn test_dump_file_name_layout() {
        assert_eq!(dump_file_name(local_time(7)), "dump-07032025_0405060007.dmp");
    }

    #[test]
    fn test_dump_file_names_distinct_across_milliseconds() {
        assert_ne!(dump_file_name(local_time(1)), dump_file_name(local_time(3)));
    }

    #[test]
    fn test_dump_file_names_collide_within_a_millisecond() {
        // Documented behavior: the later capture overwrites the earlier one.
        assert_eq!(dump_file_name(local_time(42)), dump_file_name(local_time(42)));
    }

    #[test]
    fn test_capture_creates_directory_and_artifact() -> anyhow::Result<()> {
        let tmp = tempfile::tempdir()?;
        let config =
            CrashDumpConfiguration::new(Some(tmp.path().to_path_buf()), vec![], false)?;
        let path = capture(&config, &StubWriter, &FaultEvent::synthetic(0xC000_0005))?;
        assert!(path.starts_with(tmp.path().join(DUMP_DIRECTORY)));
        assert_eq!(fs::read(&path)?, b"MDMP");
        Ok(())
    }

    #[test]
    fn test_capture_accepts_preexisting_directory() -> anyhow::Result<()> {
        let tmp = tempfile::tempdir()?;
        fs::create_dir(tmp.path().join(DUMP_DIRECTORY))?;
        let config =
            CrashDumpConfiguration::new(Some(tmp.path().to_path_buf()), vec![], false)?;
        capture(&config, &StubWriter, &FaultEvent::synthetic(0xC000_0005))?;
        Ok(())
    }

    #[test]
    fn test_capture_reports_blocked_directory() -> anyhow::Result<()> {
        let tmp = tempfile::tempdir()?;
        fs::write(tmp.path().join(DUMP_DIRECTORY), b"in the way")?;
        let config =
            CrashDumpConfiguration::new(Some(tmp.path().to_path_buf()), vec![], false)?;
        let error = capture(&config, &StubWriter, &FaultEvent::synthetic(0xC000_0005))
            .unwrap_err();
        assert!(matches!(error, CaptureError::CreateDir { .. }));
        Ok(())
    }

    #[test]
    fn test_capture_surfaces_writer_failure() -> anyhow::Result<()> {
        struct FailingWriter;
        impl SnapshotWriter for FailingWriter {
            fn write(&self, _file: &File, _fault: &FaultEvent) -> io::Result<()> {
                Err(io::Error::from_raw_os_error(31))
            }
        }

        let tmp = tempfile::tempdir()?;
        let config =
            CrashDumpConfiguration::new(Some(tmp.path().to_path_buf()), vec![], false)?;
        let error = capture(&config, &FailingWriter, &FaultEvent::synthetic(0xC000_0005))
            .unwrap_err();
        assert!(matches!(error, CaptureError::Snapshot(_)));
        // The file was opened before the writer ran and stays behind, closed.
        let entries = fs::read_dir(tmp.path().join(DUMP_DIRECTORY))?.count();
        assert_eq!(entries, 1);
        Ok(())
    }
}
