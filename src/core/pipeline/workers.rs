//! Bounded worker pool for per-file identification.

use crate::core::identity::{ContentIdentifier, IdentityToken};
use crate::core::scanner::FileRecord;
use crate::error::{IdentifyError, OrphanFinderError};
use crate::events::{Event, EventSender, IdentifyEvent, IdentifyProgress};
use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A file paired with the outcome of identifying it
#[derive(Debug)]
pub struct Identified {
    pub record: FileRecord,
    pub token: Result<IdentityToken, IdentifyError>,
}

/// A rayon pool sized to avoid saturating disk I/O
pub struct WorkerPool {
    pool: rayon::ThreadPool,
}

impl WorkerPool {
    /// Create a pool with `workers` threads
    pub fn new(workers: usize) -> Result<Self, OrphanFinderError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .thread_name(|i| format!("identify-{}", i))
            .build()
            .map_err(|e| OrphanFinderError::WorkerPool(e.to_string()))?;
        Ok(Self { pool })
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Run `op` inside the pool so its parallel iterators use these threads
    pub fn install<OP, R>(&self, op: OP) -> R
    where
        OP: FnOnce() -> R + Send,
        R: Send,
    {
        self.pool.install(op)
    }

    /// Identify every file on the pool.
    ///
    /// The output is in the same order as `files`, whatever order the
    /// workers finish in.
    pub fn identify_all(
        &self,
        identifier: &ContentIdentifier,
        files: Vec<FileRecord>,
        events: &EventSender,
    ) -> Vec<Identified> {
        let total = files.len();
        let completed = AtomicUsize::new(0);

        events.send(Event::Identify(IdentifyEvent::Started { total_files: total }));

        let identified: Vec<Identified> = self.pool.install(|| {
            files
                .into_par_iter()
                .map(|record| {
                    let token = identifier.identify(&record.path);
                    let current = completed.fetch_add(1, Ordering::SeqCst) + 1;

                    match &token {
                        Ok(token) => {
                            tracing::debug!(path = %record.path.display(), %token, "identified");
                        }
                        Err(e) => {
                            tracing::warn!(path = %record.path.display(), error = %e, "skipping file");
                            events.send(Event::Identify(IdentifyEvent::Error {
                                path: record.path.clone(),
                                message: e.to_string(),
                            }));
                        }
                    }

                    events.send(Event::Identify(IdentifyEvent::Progress(IdentifyProgress {
                        completed: current,
                        total,
                        current_path: record.path.clone(),
                    })));

                    Identified { record, token }
                })
                .collect()
        });

        let skipped = identified.iter().filter(|i| i.token.is_err()).count();
        events.send(Event::Identify(IdentifyEvent::Completed {
            identified: total - skipped,
            skipped,
        }));

        identified
    }
}
