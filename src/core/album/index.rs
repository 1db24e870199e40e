//! Token-keyed index of album files.

use crate::core::identity::{ContentIdentifier, IdentityToken};
use crate::core::pipeline::{Identified, WorkerPool};
use crate::core::scanner::{FileRecord, FileScanner, IgnoreFilter, ScanConfig, WalkDirScanner};
use crate::error::{IdentifyError, ScanError};
use crate::events::{ClassifyEvent, Event, EventSender};
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// An album file left out of the index because its token was already taken
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Collision {
    pub token: IdentityToken,
    /// The file that holds the token (first in path order)
    pub kept: PathBuf,
    /// The file that was dropped
    pub skipped: PathBuf,
}

/// In-memory index of every album file, keyed by identity token.
///
/// At most one record is kept per token. When several files share a token,
/// the one with the lexicographically smallest path wins and the rest are
/// reported as collisions. This is a policy, not deduplication: a dropped
/// file is still on disk, it is just not separately represented here.
#[derive(Debug, Default)]
pub struct AlbumIndex {
    entries: HashMap<IdentityToken, FileRecord>,
    by_name: HashMap<String, Vec<FileRecord>>,
    total_scanned: usize,
    collisions: Vec<Collision>,
    skipped: Vec<IdentifyError>,
    scan_errors: Vec<ScanError>,
}

impl AlbumIndex {
    /// Build the index from identified files.
    ///
    /// Files are inserted in path order regardless of the order given, so
    /// the kept/skipped choice is the same on every run.
    pub fn from_identified(mut identified: Vec<Identified>) -> Self {
        identified.sort_by(|a, b| a.record.path.cmp(&b.record.path));

        let mut index = AlbumIndex::default();

        for Identified { record, token } in identified {
            let token = match token {
                Ok(token) => token,
                Err(e) => {
                    index.skipped.push(e);
                    continue;
                }
            };

            index.total_scanned += 1;

            if let Some(existing) = index.entries.get(&token) {
                tracing::warn!(
                    kept = %existing.path.display(),
                    skipped = %record.path.display(),
                    %token,
                    "album files share an identity, keeping the first"
                );
                index.collisions.push(Collision {
                    token,
                    kept: existing.path.clone(),
                    skipped: record.path,
                });
                continue;
            }

            index
                .by_name
                .entry(record.name.clone())
                .or_default()
                .push(record.clone());
            index.entries.insert(token, record);
        }

        index
    }

    /// Number of distinct tokens
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Files considered after filtering, including those that collided
    pub fn total_scanned(&self) -> usize {
        self.total_scanned
    }

    pub fn collisions(&self) -> &[Collision] {
        &self.collisions
    }

    /// Album files that could not be identified
    pub fn skipped(&self) -> &[IdentifyError] {
        &self.skipped
    }

    /// Enumeration errors from the album roots
    pub fn scan_errors(&self) -> &[ScanError] {
        &self.scan_errors
    }

    /// Move out the per-file failures, leaving the lookups intact
    pub fn take_errors(&mut self) -> (Vec<IdentifyError>, Vec<ScanError>) {
        (
            std::mem::take(&mut self.skipped),
            std::mem::take(&mut self.scan_errors),
        )
    }

    pub fn contains(&self, token: &IdentityToken) -> bool {
        self.entries.contains_key(token)
    }

    pub fn get(&self, token: &IdentityToken) -> Option<&FileRecord> {
        self.entries.get(token)
    }

    /// Indexed records with this case-folded name, in path order
    pub fn records_named(&self, name: &str) -> &[FileRecord] {
        self.by_name.get(name).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Walks album roots and builds an [`AlbumIndex`]
pub struct AlbumIndexer {
    filter: IgnoreFilter,
    identifier: ContentIdentifier,
    pool: Arc<WorkerPool>,
    follow_symlinks: bool,
}

impl AlbumIndexer {
    pub fn new(filter: IgnoreFilter, identifier: ContentIdentifier, pool: Arc<WorkerPool>) -> Self {
        Self {
            filter,
            identifier,
            pool,
            follow_symlinks: false,
        }
    }

    /// Follow symbolic links inside album roots
    pub fn follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Build without progress reporting
    pub fn build(&self, roots: &[PathBuf]) -> AlbumIndex {
        self.build_with_events(roots, &crate::events::null_sender())
    }

    /// Recursively enumerate every root, identify each file, and index the results
    pub fn build_with_events(&self, roots: &[PathBuf], events: &EventSender) -> AlbumIndex {
        let config = ScanConfig {
            follow_symlinks: self.follow_symlinks,
            max_depth: None,
        };
        let scanner = WalkDirScanner::new(config, self.filter.clone());
        let scan = scanner.scan_with_events(roots, events);

        tracing::info!(files = scan.files.len(), roots = roots.len(), "indexing albums");

        let identified = self.pool.identify_all(&self.identifier, scan.files, events);
        let mut index = AlbumIndex::from_identified(identified);
        index.scan_errors = scan.errors;

        for collision in &index.collisions {
            events.send(Event::Classify(ClassifyEvent::Collision {
                kept: collision.kept.clone(),
                skipped: collision.skipped.clone(),
            }));
        }

        tracing::info!(
            unique = index.len(),
            total = index.total_scanned(),
            collisions = index.collisions.len(),
            "album index built"
        );

        index
    }
}
