//! # Core Module
//!
//! The orphan finding engine, independent of any front end.
//!
//! ## Modules
//! - `scanner` - Enumerates files and applies the ignore rules
//! - `identity` - Computes identity tokens (MD5 or name)
//! - `album` - Indexes album files by token
//! - `metadata` - Looks up creation times (EXIF or mtime)
//! - `similarity` - Timestamp/size heuristic for same-name files
//! - `classifier` - Partitions source files
//! - `copier` - Copies results out, keeping timestamps
//! - `config` - Run configuration
//! - `pipeline` - Orchestrates the full workflow

pub mod album;
pub mod classifier;
pub mod config;
pub mod copier;
pub mod identity;
pub mod metadata;
pub mod pipeline;
pub mod scanner;
pub mod similarity;

// Re-export commonly used types
pub use classifier::{Classification, ClassificationResult, DuplicateReason};
pub use config::RunConfig;
pub use identity::{IdentityMode, IdentityToken};
pub use pipeline::{CancellationToken, Pipeline, RunReport};
pub use scanner::FileRecord;
