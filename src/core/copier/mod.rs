//! # Copier Module
//!
//! Copies orphan and ambiguous files out of the scan directory.
//!
//! Each copy keeps the source's access and modification times. The
//! destination directory is created on first use. Failures are collected
//! per file; nothing already copied is rolled back.

use crate::error::CopyError;
use crate::events::{CopyEvent, Event, EventSender};
use filetime::FileTime;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// What to do when the destination file already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExistingFilePolicy {
    /// Replace it
    #[default]
    Overwrite,
    /// Leave it and report the file as skipped
    Skip,
}

/// Result of copying one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyOutcome {
    Copied { to: PathBuf },
    /// Dry run: the copy that would have been made
    Planned { to: PathBuf },
    /// Destination existed and the policy said to keep it
    Kept { to: PathBuf },
}

/// Aggregate result of a batch of copies
#[derive(Debug, Default)]
pub struct CopyReport {
    /// (source, destination) pairs written or planned
    pub copied: Vec<(PathBuf, PathBuf)>,
    /// Sources whose destination already existed
    pub kept: Vec<PathBuf>,
    pub errors: Vec<CopyError>,
}

impl CopyReport {
    pub fn merge(&mut self, other: CopyReport) {
        self.copied.extend(other.copied);
        self.kept.extend(other.kept);
        self.errors.extend(other.errors);
    }
}

/// Copies files into a destination directory
#[derive(Debug, Clone, Default)]
pub struct FileCopier {
    policy: ExistingFilePolicy,
    dry_run: bool,
}

impl FileCopier {
    pub fn new(policy: ExistingFilePolicy, dry_run: bool) -> Self {
        Self { policy, dry_run }
    }

    /// Copy `source` into `destination_dir`, keeping its file name and timestamps
    pub fn copy(&self, source: &Path, destination_dir: &Path) -> Result<CopyOutcome, CopyError> {
        let file_name = source.file_name().ok_or_else(|| CopyError::NoFileName {
            path: source.to_path_buf(),
        })?;
        let destination = destination_dir.join(file_name);

        if self.dry_run {
            return Ok(CopyOutcome::Planned { to: destination });
        }

        if destination.exists() {
            if self.policy == ExistingFilePolicy::Skip {
                return Ok(CopyOutcome::Kept { to: destination });
            }
            if same_file(source, &destination) {
                return Err(CopyError::Write {
                    from: source.to_path_buf(),
                    to: destination,
                    source: std::io::Error::other("source and destination are the same file"),
                });
            }
        }

        fs::create_dir_all(destination_dir).map_err(|source| CopyError::CreateDirectory {
            path: destination_dir.to_path_buf(),
            source,
        })?;

        fs::copy(source, &destination).map_err(|e| CopyError::Write {
            from: source.to_path_buf(),
            to: destination.clone(),
            source: e,
        })?;

        copy_times(source, &destination).map_err(|source| CopyError::Timestamps {
            path: destination.clone(),
            source,
        })?;

        Ok(CopyOutcome::Copied { to: destination })
    }

    /// Copy every source into `destination_dir`, continuing past failures
    pub fn copy_all<'a, I>(&self, sources: I, destination_dir: &Path, events: &EventSender) -> CopyReport
    where
        I: IntoIterator<Item = &'a Path>,
    {
        let mut report = CopyReport::default();
        let mut seen_names: HashSet<PathBuf> = HashSet::new();

        for source in sources {
            if let Some(name) = source.file_name() {
                if !seen_names.insert(PathBuf::from(name)) {
                    tracing::warn!(
                        path = %source.display(),
                        "another file with this name was already copied to {}",
                        destination_dir.display()
                    );
                }
            }

            match self.copy(source, destination_dir) {
                Ok(CopyOutcome::Copied { to }) | Ok(CopyOutcome::Planned { to }) => {
                    events.send(Event::Copy(CopyEvent::Copied {
                        from: source.to_path_buf(),
                        to: to.clone(),
                    }));
                    report.copied.push((source.to_path_buf(), to));
                }
                Ok(CopyOutcome::Kept { to }) => {
                    tracing::debug!(path = %to.display(), "destination exists, skipping");
                    events.send(Event::Copy(CopyEvent::Skipped { path: to }));
                    report.kept.push(source.to_path_buf());
                }
                Err(e) => {
                    tracing::warn!(path = %source.display(), error = %e, "copy failed");
                    events.send(Event::Copy(CopyEvent::Error {
                        path: source.to_path_buf(),
                        message: e.to_string(),
                    }));
                    report.errors.push(e);
                }
            }
        }

        report
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Give `destination` the access and modification times of `source`
fn copy_times(source: &Path, destination: &Path) -> std::io::Result<()> {
    let metadata = fs::metadata(source)?;
    let accessed = FileTime::from_last_access_time(&metadata);
    let modified = FileTime::from_last_modification_time(&metadata);
    filetime::set_file_times(destination, accessed, modified)
}
