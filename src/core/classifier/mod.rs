//! # Classifier Module
//!
//! Splits scan files into duplicates, orphans and ambiguous same-name files.
//!
//! ## Decision, per scan file
//! 1. Token found in the album index: **Duplicate** (direct match)
//! 2. No album file with the same case-folded name: **Orphan**
//! 3. A same-name album file passes the similarity heuristic: **Duplicate**
//!    (similar match). Candidates are tried in path order, first pass wins.
//! 4. Otherwise: **AmbiguousSameName**
//!
//! Pure token equality misses re-encoded copies; pure name equality hides
//! real orphans that happen to share camera-generated names. The two tiers
//! sit between those extremes.
//!
//! Files that cannot be identified are reported in `skipped` and are in no
//! bucket. Copying is the caller's job.

use crate::core::album::AlbumIndex;
use crate::core::identity::{ContentIdentifier, IdentityToken};
use crate::core::pipeline::{Identified, WorkerPool};
use crate::core::scanner::FileRecord;
use crate::core::similarity::{SimilarityClassifier, SimilarityRule};
use crate::error::IdentifyError;
use crate::events::{ClassifyEvent, Event, EventSender};
use rayon::prelude::*;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Why a scan file counts as already present in the albums
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DuplicateReason {
    /// Same identity token as an album file
    TokenMatch { album: PathBuf },
    /// Same name as an album file and judged similar
    Similar { album: PathBuf, rule: SimilarityRule },
}

impl DuplicateReason {
    /// The album file this scan file duplicates
    pub fn album_path(&self) -> &PathBuf {
        match self {
            DuplicateReason::TokenMatch { album } | DuplicateReason::Similar { album, .. } => album,
        }
    }
}

impl fmt::Display for DuplicateReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DuplicateReason::TokenMatch { album } => {
                write!(f, "identical to {}", album.display())
            }
            DuplicateReason::Similar { album, rule } => {
                write!(f, "{} as {}", rule, album.display())
            }
        }
    }
}

/// Outcome for a single scan file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassificationResult {
    Duplicate(DuplicateReason),
    Orphan,
    /// Shares a name with these album files but matched none of them
    AmbiguousSameName { same_name: Vec<PathBuf> },
}

/// A scan file judged to be a duplicate
#[derive(Debug, Clone, Serialize)]
pub struct Duplicate {
    pub record: FileRecord,
    pub reason: DuplicateReason,
}

/// A scan file sharing a name with album files it does not match
#[derive(Debug, Clone, Serialize)]
pub struct Ambiguous {
    pub record: FileRecord,
    pub same_name: Vec<PathBuf>,
}

/// The partition of scan files, each bucket in path order
#[derive(Debug, Default)]
pub struct Classification {
    pub duplicates: Vec<Duplicate>,
    pub orphans: Vec<FileRecord>,
    pub ambiguous: Vec<Ambiguous>,
    /// Files that could not be identified
    pub skipped: Vec<IdentifyError>,
}

impl Classification {
    /// Files that landed in one of the three buckets
    pub fn classified(&self) -> usize {
        self.duplicates.len() + self.orphans.len() + self.ambiguous.len()
    }
}

/// Classifies scan files against an album index
pub struct OrphanClassifier {
    identifier: ContentIdentifier,
    similarity: Option<SimilarityClassifier>,
    pool: Arc<WorkerPool>,
}

impl OrphanClassifier {
    /// `similarity: None` disables the heuristic: every same-name miss is ambiguous
    pub fn new(
        identifier: ContentIdentifier,
        similarity: Option<SimilarityClassifier>,
        pool: Arc<WorkerPool>,
    ) -> Self {
        Self {
            identifier,
            similarity,
            pool,
        }
    }

    /// Classify without progress reporting
    pub fn classify(&self, scan_files: Vec<FileRecord>, index: &AlbumIndex) -> Classification {
        self.classify_with_events(scan_files, index, &crate::events::null_sender())
    }

    /// Identify scan files on the worker pool and partition them
    pub fn classify_with_events(
        &self,
        scan_files: Vec<FileRecord>,
        index: &AlbumIndex,
        events: &EventSender,
    ) -> Classification {
        let identified = self.pool.identify_all(&self.identifier, scan_files, events);

        // Similarity lookups open files too, so decide on the pool; collect keeps input order
        let decided: Vec<(FileRecord, Result<ClassificationResult, IdentifyError>)> =
            self.pool.install(|| {
                identified
                    .into_par_iter()
                    .map(|Identified { record, token }| {
                        let result = token.map(|token| self.classify_one(&record, &token, index));
                        (record, result)
                    })
                    .collect()
            });

        let mut classification = Classification::default();

        for (record, result) in decided {
            let result = match result {
                Ok(result) => result,
                Err(e) => {
                    classification.skipped.push(e);
                    continue;
                }
            };

            match result {
                ClassificationResult::Duplicate(reason) => {
                    tracing::debug!(path = %record.path.display(), %reason, "duplicate");
                    classification.duplicates.push(Duplicate { record, reason });
                }
                ClassificationResult::Orphan => {
                    tracing::debug!(path = %record.path.display(), "orphan");
                    classification.orphans.push(record);
                }
                ClassificationResult::AmbiguousSameName { same_name } => {
                    tracing::debug!(path = %record.path.display(), "same name, not similar");
                    classification.ambiguous.push(Ambiguous { record, same_name });
                }
            }
        }

        events.send(Event::Classify(ClassifyEvent::Completed {
            duplicates: classification.duplicates.len(),
            orphans: classification.orphans.len(),
            ambiguous: classification.ambiguous.len(),
            skipped: classification.skipped.len(),
        }));

        classification
    }

    /// Decide the bucket for one already-identified scan file
    pub fn classify_one(
        &self,
        record: &FileRecord,
        token: &IdentityToken,
        index: &AlbumIndex,
    ) -> ClassificationResult {
        if let Some(album) = index.get(token) {
            return ClassificationResult::Duplicate(DuplicateReason::TokenMatch {
                album: album.path.clone(),
            });
        }

        let same_name = index.records_named(&record.name);
        if same_name.is_empty() {
            return ClassificationResult::Orphan;
        }

        if let Some((album, rule)) = self
            .similarity
            .as_ref()
            .and_then(|similarity| similarity.first_match(record, same_name))
        {
            return ClassificationResult::Duplicate(DuplicateReason::Similar {
                album: album.path.clone(),
                rule,
            });
        }

        ClassificationResult::AmbiguousSameName {
            same_name: same_name.iter().map(|r| r.path.clone()).collect(),
        }
    }
}
