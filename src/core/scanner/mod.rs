//! # Scanner Module
//!
//! Enumerates files under album roots and the scan directory.
//!
//! Album roots are walked recursively; the scan directory is walked flat
//! (`ScanConfig::flat`). Every entry passes through an [`IgnoreFilter`]
//! before it becomes a [`FileRecord`]. Results are sorted by path so that
//! every later stage sees files in the same order on every run.
//!
//! ## Example
//! ```rust,ignore
//! use orphan_finder::core::scanner::{FileScanner, IgnoreFilter, ScanConfig, WalkDirScanner};
//!
//! let scanner = WalkDirScanner::new(ScanConfig::default(), IgnoreFilter::new());
//! let result = scanner.scan(&["/albums".into()])?;
//! ```

mod filter;
mod walker;

pub use filter::{IgnoreFilter, DEFAULT_IGNORED_EXTENSIONS, DEFAULT_IGNORED_NAMES};
pub use walker::{ScanConfig, WalkDirScanner};

use crate::error::ScanError;
use crate::events::EventSender;
use serde::{Deserialize, Serialize};
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// A file discovered during enumeration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Case-folded file name, used for same-name lookups
    pub name: String,
    /// Path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Last modified time
    pub modified: SystemTime,
}

impl FileRecord {
    /// Build a record from a path and its already-fetched metadata
    pub fn new(path: &Path, metadata: &Metadata) -> Self {
        Self {
            name: normalize_name(path),
            path: path.to_path_buf(),
            size: metadata.len(),
            modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
        }
    }

    /// Stat a path and build a record for it
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let metadata = std::fs::metadata(path)?;
        Ok(Self::new(path, &metadata))
    }

    /// The file name as it appears on disk
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Case-fold a path's file name (full Unicode folding, so "ß" matches "SS")
pub fn normalize_name(path: &Path) -> String {
    path.file_name()
        .map(|n| caseless::default_case_fold_str(&n.to_string_lossy()))
        .unwrap_or_default()
}

/// Result of a scan operation
#[derive(Debug, Default)]
pub struct ScanResult {
    /// Discovered files, sorted by path
    pub files: Vec<FileRecord>,
    /// Errors that occurred during scanning (non-fatal)
    pub errors: Vec<ScanError>,
}

/// Trait for directory scanners
///
/// Implement this trait to create custom scanners (e.g., for testing).
pub trait FileScanner: Send + Sync {
    /// Scan directories and return discovered files
    fn scan(&self, paths: &[PathBuf]) -> ScanResult;

    /// Scan with progress reporting via events
    fn scan_with_events(&self, paths: &[PathBuf], events: &EventSender) -> ScanResult;
}
