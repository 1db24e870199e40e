//! Event type definitions for progress reporting.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All events emitted by the orphan finder pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Directory enumeration events
    Scan(ScanEvent),
    /// Identity computation events
    Identify(IdentifyEvent),
    /// Classification events
    Classify(ClassifyEvent),
    /// Copy events
    Copy(CopyEvent),
    /// Run-level events
    Run(RunEvent),
}

/// Events during directory enumeration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScanEvent {
    /// Scanning has started
    Started { paths: Vec<PathBuf> },
    /// Progress update during scanning
    Progress(ScanProgress),
    /// A file passed the ignore filter
    FileFound { path: PathBuf },
    /// An error occurred but scanning continues
    Error { path: PathBuf, message: String },
    /// Scanning completed
    Completed { total_files: usize },
}

/// Progress information during scanning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanProgress {
    /// Number of directories scanned so far
    pub directories_scanned: usize,
    /// Number of files found so far
    pub files_found: usize,
    /// Current directory being scanned
    pub current_path: PathBuf,
}

/// Events while computing identity tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum IdentifyEvent {
    /// Identification has started
    Started { total_files: usize },
    /// Progress update
    Progress(IdentifyProgress),
    /// A file could not be identified and was skipped
    Error { path: PathBuf, message: String },
    /// Identification completed
    Completed { identified: usize, skipped: usize },
}

/// Progress information while identifying files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentifyProgress {
    /// Number of files processed so far
    pub completed: usize,
    /// Total number of files to process
    pub total: usize,
    /// File just processed
    pub current_path: PathBuf,
}

/// Events during classification of scan files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ClassifyEvent {
    /// An album hash collision was found while indexing
    Collision { kept: PathBuf, skipped: PathBuf },
    /// Classification completed
    Completed {
        duplicates: usize,
        orphans: usize,
        ambiguous: usize,
        skipped: usize,
    },
}

/// Events while copying files out
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CopyEvent {
    /// Copying has started
    Started { total_files: usize },
    /// A file was copied (or planned, in a dry run)
    Copied { from: PathBuf, to: PathBuf },
    /// An existing destination was left in place
    Skipped { path: PathBuf },
    /// A copy failed; remaining files are still processed
    Error { path: PathBuf, message: String },
    /// Copying completed
    Completed { copied: usize, failed: usize },
}

/// Run-level events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RunEvent {
    /// Run has started
    Started,
    /// Moving to a new phase
    PhaseChanged { phase: RunPhase },
    /// Run completed successfully
    Completed { summary: RunSummary },
    /// Run was cancelled
    Cancelled,
}

/// Phases of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunPhase {
    IndexingAlbums,
    ScanningSource,
    Classifying,
    Copying,
}

/// Summary of run results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Files considered under all album roots
    pub album_files: usize,
    /// Distinct identity tokens in the album index
    pub unique_album_files: usize,
    /// Album files dropped from the index because their token was taken
    pub collisions: usize,
    /// Files considered in the scan directory
    pub scan_files: usize,
    pub duplicates: usize,
    pub orphans: usize,
    pub ambiguous: usize,
    /// Files skipped because they could not be identified
    pub skipped: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl std::fmt::Display for RunPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunPhase::IndexingAlbums => write!(f, "Indexing albums"),
            RunPhase::ScanningSource => write!(f, "Scanning source"),
            RunPhase::Classifying => write!(f, "Classifying"),
            RunPhase::Copying => write!(f, "Copying"),
        }
    }
}
