//! # Metadata Module
//!
//! Creation-time lookup used by the similarity heuristic.
//!
//! ## Providers
//! - [`ExifTimeProvider`] - the primary image's EXIF `DateTime` tag only
//! - [`ModifiedTimeProvider`] - filesystem modification time, in local time
//! - [`MediaTimeProvider`] - picks a provider from the file extension and
//!   falls back to the modification time
//!
//! Missing or corrupt metadata is never an error: providers return `None`.

use chrono::{DateTime, Local, NaiveDateTime};
use exif::{In, Reader, Tag, Value};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

/// Source of a file's creation instant
pub trait CreationTimeProvider: Send + Sync {
    /// The creation time, if this provider can determine one
    fn creation_time(&self, path: &Path) -> Option<NaiveDateTime>;
}

/// Media categories that differ in where their creation time lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaCategory {
    /// Photographic formats carrying EXIF capture tags
    ExifPhoto,
    /// Everything else
    Other,
}

impl MediaCategory {
    /// Detect category from file extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" | "cr2" => MediaCategory::ExifPhoto,
            _ => MediaCategory::Other,
        }
    }

    /// Detect category from a path
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .map(MediaCategory::from_extension)
            .unwrap_or(MediaCategory::Other)
    }
}

/// Reads the capture time embedded in EXIF data
#[derive(Debug, Clone, Copy, Default)]
pub struct ExifTimeProvider;

impl CreationTimeProvider for ExifTimeProvider {
    fn creation_time(&self, path: &Path) -> Option<NaiveDateTime> {
        let file = File::open(path).ok()?;
        let mut bufreader = BufReader::new(&file);
        let exif = Reader::new().read_from_container(&mut bufreader).ok()?;

        // IFD0 DateTime only; DateTimeOriginal is not a creation time here
        match exif.get_field(Tag::DateTime, In::PRIMARY)?.value {
            Value::Ascii(ref values) => values.first().and_then(|b| parse_exif_datetime(b)),
            _ => None,
        }
    }
}

/// Uses the filesystem modification time
#[derive(Debug, Clone, Copy, Default)]
pub struct ModifiedTimeProvider;

impl CreationTimeProvider for ModifiedTimeProvider {
    fn creation_time(&self, path: &Path) -> Option<NaiveDateTime> {
        let modified = fs::metadata(path).ok()?.modified().ok()?;
        Some(DateTime::<Local>::from(modified).naive_local())
    }
}

/// Chooses a provider per media category
#[derive(Debug, Clone, Copy, Default)]
pub struct MediaTimeProvider {
    exif: ExifTimeProvider,
    modified: ModifiedTimeProvider,
}

impl MediaTimeProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CreationTimeProvider for MediaTimeProvider {
    fn creation_time(&self, path: &Path) -> Option<NaiveDateTime> {
        let embedded = match MediaCategory::from_path(path) {
            MediaCategory::ExifPhoto => self.exif.creation_time(path),
            MediaCategory::Other => None,
        };

        embedded.or_else(|| {
            tracing::trace!(path = %path.display(), "no embedded creation time, using mtime");
            self.modified.creation_time(path)
        })
    }
}

/// Parse an EXIF date, format "YYYY:MM:DD HH:MM:SS"
pub fn parse_exif_datetime(bytes: &[u8]) -> Option<NaiveDateTime> {
    let text = std::str::from_utf8(bytes).ok()?;
    NaiveDateTime::parse_from_str(text.trim_end_matches('\0').trim(), "%Y:%m:%d %H:%M:%S").ok()
}
