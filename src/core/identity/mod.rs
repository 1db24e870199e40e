//! # Identity Module
//!
//! Computes the identity token that decides whether two files are "the same".
//!
//! ## Modes
//! - **Full** - MD5 over every byte, read in 64 KiB blocks
//! - **Bounded** - the same stream, stopped once the byte ceiling is consumed
//! - **Name** - the case-folded file name, no content read
//!
//! Bounded hashing is a deliberate precision trade-off. Two different files
//! whose first `ceiling` bytes match get the same token, so a real orphan can
//! be reported as a duplicate. Use `Full` when that matters more than speed.
//!
//! ## Example
//! ```rust,ignore
//! use orphan_finder::core::identity::{IdentifierConfig, IdentityMode};
//!
//! let identifier = IdentifierConfig::new()
//!     .mode(IdentityMode::Bounded)
//!     .ceiling(640 * 1024)
//!     .build();
//!
//! let token = identifier.identify(&path)?;
//! ```

mod token;

pub use token::{IdentityMode, IdentityToken};

use crate::core::pipeline::CancellationToken;
use crate::core::scanner::normalize_name;
use crate::error::IdentifyError;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;
use std::time::{Duration, Instant};

/// Size of each read fed to the hasher
pub const BLOCK_SIZE: usize = 64 * 1024;

/// Default byte ceiling for bounded hashing (640 KiB)
pub const DEFAULT_HASH_CEILING: u64 = 655_360;

/// Configuration builder for identifiers
#[derive(Debug, Clone)]
pub struct IdentifierConfig {
    mode: IdentityMode,
    ceiling: u64,
    timeout: Option<Duration>,
    cancel: CancellationToken,
}

impl IdentifierConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self {
            mode: IdentityMode::default(),
            ceiling: DEFAULT_HASH_CEILING,
            timeout: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Set the identity mode
    pub fn mode(mut self, mode: IdentityMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the byte ceiling used in bounded mode
    pub fn ceiling(mut self, ceiling: u64) -> Self {
        self.ceiling = ceiling;
        self
    }

    /// Give up on a single file after this long
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Share a cancellation flag with the caller
    pub fn cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Build the identifier
    pub fn build(self) -> ContentIdentifier {
        ContentIdentifier {
            mode: self.mode,
            ceiling: self.ceiling,
            timeout: self.timeout,
            cancel: self.cancel,
        }
    }
}

impl Default for IdentifierConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Computes identity tokens. Reads file bytes and nothing else.
#[derive(Debug, Clone)]
pub struct ContentIdentifier {
    mode: IdentityMode,
    ceiling: u64,
    timeout: Option<Duration>,
    cancel: CancellationToken,
}

impl ContentIdentifier {
    /// The mode this identifier runs in
    pub fn mode(&self) -> IdentityMode {
        self.mode
    }

    /// Compute the identity token for a file
    pub fn identify(&self, path: &Path) -> Result<IdentityToken, IdentifyError> {
        match self.mode {
            IdentityMode::Name => Ok(IdentityToken::Name(normalize_name(path))),
            IdentityMode::Full => self.digest(path, u64::MAX).map(IdentityToken::Digest),
            IdentityMode::Bounded => self.digest(path, self.ceiling).map(IdentityToken::Digest),
        }
    }

    fn digest(&self, path: &Path, limit: u64) -> Result<[u8; 16], IdentifyError> {
        let io_error = |source| IdentifyError::Io {
            path: path.to_path_buf(),
            source,
        };

        let file = File::open(path).map_err(io_error)?;
        let mut reader = file.take(limit);
        let mut context = md5::Context::new();
        let mut buffer = vec![0u8; BLOCK_SIZE];
        let started = Instant::now();

        loop {
            if self.cancel.is_cancelled() {
                return Err(IdentifyError::Cancelled {
                    path: path.to_path_buf(),
                });
            }
            if let Some(limit) = self.timeout {
                if started.elapsed() >= limit {
                    return Err(IdentifyError::TimedOut {
                        path: path.to_path_buf(),
                        limit,
                    });
                }
            }

            let read = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(io_error(e)),
            };
            context.consume(&buffer[..read]);
        }

        Ok(context.compute().0)
    }
}
