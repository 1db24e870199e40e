//! # Similarity Module
//!
//! Settles same-name pairs that hashing says are different.
//!
//! ## Policy (first match wins)
//! 1. Both files have a creation time and the times are exactly equal
//! 2. The size difference is strictly below the tolerance
//! 3. Otherwise not similar
//!
//! This is a heuristic. It will sometimes call two distinct files similar
//! (hiding a real orphan) and sometimes call a re-encoded copy different
//! (sending it to review). Both outcomes are accepted: the ambiguous bucket
//! exists so a person can decide.

use crate::core::metadata::{CreationTimeProvider, MediaTimeProvider};
use crate::core::scanner::FileRecord;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Default maximum size difference, in bytes, for two files to count as similar
pub const DEFAULT_SIZE_TOLERANCE: u64 = 500_000;

/// Which rule declared two files similar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityRule {
    /// Identical creation instants
    Timestamp,
    /// Sizes within the tolerance
    Size,
}

impl fmt::Display for SimilarityRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimilarityRule::Timestamp => write!(f, "same creation time"),
            SimilarityRule::Size => write!(f, "similar size"),
        }
    }
}

/// Timestamp-then-size heuristic for same-name files
#[derive(Clone)]
pub struct SimilarityClassifier {
    size_tolerance: u64,
    provider: Arc<dyn CreationTimeProvider>,
}

impl SimilarityClassifier {
    /// Create a classifier using EXIF/mtime creation times
    pub fn new(size_tolerance: u64) -> Self {
        Self {
            size_tolerance,
            provider: Arc::new(MediaTimeProvider::new()),
        }
    }

    /// Replace the creation time provider
    pub fn with_provider(mut self, provider: Arc<dyn CreationTimeProvider>) -> Self {
        self.provider = provider;
        self
    }

    /// The rule under which `candidate` and `reference` are similar, if any
    pub fn matching_rule(
        &self,
        candidate: &FileRecord,
        reference: &FileRecord,
    ) -> Option<SimilarityRule> {
        let candidate_time = self.provider.creation_time(&candidate.path);
        self.rule_for(candidate, candidate_time, reference)
    }

    /// First reference, in the order given, that `candidate` is similar to.
    ///
    /// The candidate's creation time is looked up once for all references.
    pub fn first_match<'a>(
        &self,
        candidate: &FileRecord,
        references: &'a [FileRecord],
    ) -> Option<(&'a FileRecord, SimilarityRule)> {
        let candidate_time = self.provider.creation_time(&candidate.path);
        references.iter().find_map(|reference| {
            self.rule_for(candidate, candidate_time, reference)
                .map(|rule| (reference, rule))
        })
    }

    fn rule_for(
        &self,
        candidate: &FileRecord,
        candidate_time: Option<NaiveDateTime>,
        reference: &FileRecord,
    ) -> Option<SimilarityRule> {
        if let Some(a) = candidate_time {
            if self.provider.creation_time(&reference.path) == Some(a) {
                return Some(SimilarityRule::Timestamp);
            }
        }

        if candidate.size.abs_diff(reference.size) < self.size_tolerance {
            return Some(SimilarityRule::Size);
        }

        None
    }

    /// Whether the two files should be treated as the same asset
    pub fn is_similar(&self, candidate: &FileRecord, reference: &FileRecord) -> bool {
        self.matching_rule(candidate, reference).is_some()
    }
}

impl Default for SimilarityClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_SIZE_TOLERANCE)
    }
}

impl fmt::Debug for SimilarityClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimilarityClassifier")
            .field("size_tolerance", &self.size_tolerance)
            .finish_non_exhaustive()
    }
}
