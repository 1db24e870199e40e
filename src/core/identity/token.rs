//! Identity tokens and the modes that produce them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How a file's identity is derived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityMode {
    /// MD5 over the whole file
    Full,
    /// MD5 over at most the configured byte ceiling
    #[default]
    Bounded,
    /// The case-folded file name; no content is read
    Name,
}

impl IdentityMode {
    /// Get a human-readable description of the mode
    pub fn description(&self) -> &'static str {
        match self {
            IdentityMode::Full => "Full hash - every byte is read, slowest and strictest",
            IdentityMode::Bounded => {
                "Bounded hash - only a prefix is read; files sharing that prefix look identical"
            }
            IdentityMode::Name => "Name only - files with the same name are treated as identical",
        }
    }
}

impl fmt::Display for IdentityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityMode::Full => write!(f, "full"),
            IdentityMode::Bounded => write!(f, "bounded"),
            IdentityMode::Name => write!(f, "name"),
        }
    }
}

/// Opaque value deciding content equality for the current mode.
///
/// Two files with equal tokens are treated as the same file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IdentityToken {
    /// MD5 digest of the hashed bytes
    Digest([u8; 16]),
    /// Case-folded file name
    Name(String),
}

impl IdentityToken {
    /// Get the token as a hexadecimal string (digest) or the name itself
    pub fn to_hex(&self) -> String {
        match self {
            IdentityToken::Digest(bytes) => bytes.iter().map(|b| format!("{:02x}", b)).collect(),
            IdentityToken::Name(name) => name.clone(),
        }
    }
}

impl fmt::Display for IdentityToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityToken::Digest(_) => write!(f, "md5:{}", self.to_hex()),
            IdentityToken::Name(name) => write!(f, "name:{}", name),
        }
    }
}
