//! Pipeline execution implementation.

use super::{CancellationToken, WorkerPool};
use crate::core::album::{AlbumIndex, AlbumIndexer, Collision};
use crate::core::classifier::{Classification, OrphanClassifier};
use crate::core::config::RunConfig;
use crate::core::copier::{CopyReport, FileCopier};
use crate::core::identity::{ContentIdentifier, IdentifierConfig};
use crate::core::metadata::CreationTimeProvider;
use crate::core::scanner::{FileScanner, ScanConfig, WalkDirScanner};
use crate::core::similarity::SimilarityClassifier;
use crate::error::{IdentifyError, OrphanFinderError, ScanError};
use crate::events::{
    null_sender, CopyEvent, Event, EventSender, RunEvent, RunPhase, RunSummary,
};
use std::sync::Arc;
use std::time::Instant;

/// Everything a finished run found and did
#[derive(Debug)]
pub struct RunReport {
    /// Album files considered, including collisions
    pub album_files: usize,
    /// Distinct tokens in the album index
    pub unique_album_files: usize,
    pub collisions: Vec<Collision>,
    /// Album files that could not be identified
    pub album_skipped: Vec<IdentifyError>,
    /// Enumeration errors from album roots and the source directory
    pub scan_errors: Vec<ScanError>,
    /// Source files considered after filtering
    pub scan_files: usize,
    pub classification: Classification,
    pub copies: CopyReport,
    /// No files were written
    pub dry_run: bool,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl RunReport {
    /// Counts for display and events
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            album_files: self.album_files,
            unique_album_files: self.unique_album_files,
            collisions: self.collisions.len(),
            scan_files: self.scan_files,
            duplicates: self.classification.duplicates.len(),
            orphans: self.classification.orphans.len(),
            ambiguous: self.classification.ambiguous.len(),
            skipped: self.album_skipped.len() + self.classification.skipped.len(),
            duration_ms: self.duration_ms,
        }
    }
}

/// Builder for a [`Pipeline`]
pub struct PipelineBuilder {
    config: RunConfig,
    cancel: CancellationToken,
    provider: Option<Arc<dyn CreationTimeProvider>>,
}

impl PipelineBuilder {
    /// Start from a run configuration
    pub fn new(config: RunConfig) -> Self {
        Self {
            config,
            cancel: CancellationToken::new(),
            provider: None,
        }
    }

    /// Share a cancellation flag with the caller
    pub fn cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Replace the creation time provider used by the similarity check
    pub fn time_provider(mut self, provider: Arc<dyn CreationTimeProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Validate the configuration for a full run and build the pipeline
    pub fn build(self) -> Result<Pipeline, OrphanFinderError> {
        self.config.validate()?;
        self.assemble()
    }

    /// Validate only what album indexing needs
    pub fn build_for_index(self) -> Result<Pipeline, OrphanFinderError> {
        self.config.validate_albums()?;
        self.assemble()
    }

    fn assemble(self) -> Result<Pipeline, OrphanFinderError> {
        let pool = Arc::new(WorkerPool::new(self.config.workers)?);

        let identifier = IdentifierConfig::new()
            .mode(self.config.mode)
            .ceiling(self.config.hash_ceiling)
            .timeout(self.config.timeout())
            .cancellation(self.cancel.clone())
            .build();

        let similarity = self.config.check_similar.then(|| {
            let classifier = SimilarityClassifier::new(self.config.size_tolerance);
            match self.provider {
                Some(provider) => classifier.with_provider(provider),
                None => classifier,
            }
        });

        Ok(Pipeline {
            config: self.config,
            cancel: self.cancel,
            pool,
            identifier,
            similarity,
        })
    }
}

/// The orphan finding pipeline: index albums, scan source, classify, copy
pub struct Pipeline {
    config: RunConfig,
    cancel: CancellationToken,
    pool: Arc<WorkerPool>,
    identifier: ContentIdentifier,
    similarity: Option<SimilarityClassifier>,
}

impl Pipeline {
    /// Create a new pipeline builder
    pub fn builder(config: RunConfig) -> PipelineBuilder {
        PipelineBuilder::new(config)
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Handle for cancelling a run from another thread
    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run the pipeline without events
    pub fn run(&self) -> Result<RunReport, OrphanFinderError> {
        self.run_with_events(&null_sender())
    }

    /// Build the album index only
    pub fn index_albums(&self, events: &EventSender) -> Result<AlbumIndex, OrphanFinderError> {
        let index = AlbumIndexer::new(
            self.config.ignore_filter(),
            self.identifier.clone(),
            Arc::clone(&self.pool),
        )
        .follow_symlinks(self.config.follow_symlinks)
        .build_with_events(&self.config.albums, events);

        self.check_cancelled(events)?;
        Ok(index)
    }

    /// Run the pipeline with event reporting
    pub fn run_with_events(&self, events: &EventSender) -> Result<RunReport, OrphanFinderError> {
        let start_time = Instant::now();

        events.send(Event::Run(RunEvent::Started));

        // Phase 1: album index
        self.phase(events, RunPhase::IndexingAlbums);
        let mut index = self.index_albums(events)?;

        // Phase 2: flat scan of the source directory
        self.phase(events, RunPhase::ScanningSource);
        let scanner = WalkDirScanner::new(ScanConfig::flat(), self.config.ignore_filter());
        let scan = scanner.scan_with_events(std::slice::from_ref(&self.config.source), events);
        self.check_cancelled(events)?;
        let scan_files = scan.files.len();
        tracing::info!(files = scan_files, source = %self.config.source.display(), "source scanned");

        // Phase 3: classification
        self.phase(events, RunPhase::Classifying);
        let classifier = OrphanClassifier::new(
            self.identifier.clone(),
            self.similarity.clone(),
            Arc::clone(&self.pool),
        );
        let classification = classifier.classify_with_events(scan.files, &index, events);
        self.check_cancelled(events)?;
        tracing::info!(
            duplicates = classification.duplicates.len(),
            orphans = classification.orphans.len(),
            ambiguous = classification.ambiguous.len(),
            skipped = classification.skipped.len(),
            "classification complete"
        );

        // Phase 4: copy orphans and ambiguous files out
        self.phase(events, RunPhase::Copying);
        let copies = self.copy_results(&classification, events);

        let (album_skipped, mut scan_errors) = index.take_errors();
        scan_errors.extend(scan.errors);

        let report = RunReport {
            album_files: index.total_scanned(),
            unique_album_files: index.len(),
            collisions: index.collisions().to_vec(),
            album_skipped,
            scan_errors,
            scan_files,
            classification,
            copies,
            dry_run: self.config.dry_run,
            duration_ms: start_time.elapsed().as_millis() as u64,
        };

        events.send(Event::Run(RunEvent::Completed {
            summary: report.summary(),
        }));

        Ok(report)
    }

    fn copy_results(&self, classification: &Classification, events: &EventSender) -> CopyReport {
        let copier = FileCopier::new(self.config.existing, self.config.dry_run);
        let total = classification.orphans.len() + classification.ambiguous.len();
        events.send(Event::Copy(CopyEvent::Started { total_files: total }));

        let mut report = copier.copy_all(
            classification.orphans.iter().map(|r| r.path.as_path()),
            &self.config.output,
            events,
        );
        report.merge(copier.copy_all(
            classification.ambiguous.iter().map(|a| a.record.path.as_path()),
            &self.config.same_filename_dir(),
            events,
        ));

        events.send(Event::Copy(CopyEvent::Completed {
            copied: report.copied.len(),
            failed: report.errors.len(),
        }));
        tracing::info!(
            copied = report.copied.len(),
            kept = report.kept.len(),
            failed = report.errors.len(),
            dry_run = self.config.dry_run,
            "copy phase complete"
        );

        report
    }

    fn phase(&self, events: &EventSender, phase: RunPhase) {
        tracing::info!(%phase, "phase started");
        events.send(Event::Run(RunEvent::PhaseChanged { phase }));
    }

    fn check_cancelled(&self, events: &EventSender) -> Result<(), OrphanFinderError> {
        if self.cancel.is_cancelled() {
            tracing::warn!("run cancelled");
            events.send(Event::Run(RunEvent::Cancelled));
            return Err(OrphanFinderError::Cancelled);
        }
        Ok(())
    }
}
