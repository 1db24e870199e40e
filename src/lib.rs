//! # Orphan Finder
//!
//! Finds files in an incoming directory that are not yet part of a curated
//! album tree, and copies them out for review.
//!
//! ## Core Philosophy
//! - **Read-only inputs** - album roots and the source directory are never modified
//! - **Explain every decision** - each duplicate names the album file it matches and why
//! - **Hand doubt to a person** - same-name files that cannot be settled go to their own folder
//!
//! ## Architecture
//! - `core` - The classification engine
//! - `events` - Event-driven progress reporting
//! - `error` - Error types
//! - `cli` - Command-line interface (binary only)

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use error::{OrphanFinderError, Result};

use tracing_subscriber::EnvFilter;

/// Initialize tracing for the library
///
/// Called by the binary. `RUST_LOG` wins when set; otherwise only warnings
/// are shown, or debug output for this crate when `verbose` is on. Calling
/// it twice is harmless.
pub fn init_tracing(verbose: bool) {
    let fallback = if verbose {
        "warn,orphan_finder=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
