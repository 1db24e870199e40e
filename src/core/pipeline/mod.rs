//! # Pipeline Module
//!
//! Orchestrates a complete orphan finding run.
//!
//! ## Pipeline Stages
//! 1. **Index** - Walk every album root and identify each file
//! 2. **Scan** - List the source directory (flat)
//! 3. **Classify** - Split source files into duplicates, orphans and ambiguous
//! 4. **Copy** - Orphans to the output, ambiguous files to `same filename/`
//!
//! ## Parallelism
//! Identification runs on a bounded rayon pool. Index insertion and
//! classification run on the calling thread, in path order.

mod cancel;
mod executor;
mod workers;

pub use cancel::CancellationToken;
pub use executor::{Pipeline, PipelineBuilder, RunReport};
pub use workers::{Identified, WorkerPool};
