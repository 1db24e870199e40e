//! # Album Module
//!
//! Indexes the curated album tree so every scan file can be checked against
//! it with a single lookup.
//!
//! Building the index only reads album files. It never moves, renames or
//! deletes anything.

mod index;

pub use index::{AlbumIndex, AlbumIndexer, Collision};
