//! # Error Module
//!
//! Error types for the orphan finder.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Include context** - paths, file names, what went wrong
//! - **Only configuration is fatal** - per-file problems are recorded and the run continues

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum OrphanFinderError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Scanning error: {0}")]
    Scan(#[from] ScanError),

    #[error("Identification error: {0}")]
    Identify(#[from] IdentifyError),

    #[error("Copy error: {0}")]
    Copy(#[from] CopyError),

    #[error("Failed to start worker pool: {0}")]
    WorkerPool(String),

    #[error("Run was cancelled")]
    Cancelled,
}

/// Invalid run configuration. Always raised before any file is touched.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Source directory not found: {path}")]
    SourceNotFound { path: PathBuf },

    #[error("Album root not found: {path}")]
    AlbumNotFound { path: PathBuf },

    #[error("At least one album root is required")]
    NoAlbums,

    #[error("Output directory must differ from the source directory: {path}")]
    OutputIsSource { path: PathBuf },

    #[error("Output directory is missing")]
    NoOutput,

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("Failed to read config file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed config file {path}: {reason}")]
    Parse { path: PathBuf, reason: String },
}

/// Errors that occur while enumerating directories (non-fatal, per subtree)
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("Permission denied accessing: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("Failed to read {path}: {source}")]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that occur while computing a file's identity token (non-fatal, per file)
#[derive(Error, Debug)]
pub enum IdentifyError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Hashing {path} exceeded {limit:?}")]
    TimedOut { path: PathBuf, limit: Duration },

    #[error("Hashing {path} was cancelled")]
    Cancelled { path: PathBuf },
}

impl IdentifyError {
    /// Path of the file that could not be identified
    pub fn path(&self) -> &PathBuf {
        match self {
            IdentifyError::Io { path, .. }
            | IdentifyError::TimedOut { path, .. }
            | IdentifyError::Cancelled { path } => path,
        }
    }
}

/// Errors that occur while copying a file out (non-fatal, per file)
#[derive(Error, Debug)]
pub enum CopyError {
    #[error("Failed to create {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to copy {from} to {to}: {source}")]
    Write {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Copied {path} but could not restore its timestamps: {source}")]
    Timestamps {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Source has no file name: {path}")]
    NoFileName { path: PathBuf },
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, OrphanFinderError>;
