//! # Config Module
//!
//! Run-level configuration, read once at startup and never mutated.
//!
//! Values come from an optional TOML file; the CLI overrides individual
//! fields before calling [`RunConfig::validate`].
//!
//! ```toml
//! source = "/photos/incoming"
//! albums = ["/photos/albums", "/mnt/backup/albums"]
//! output = "/photos/orphans"
//! mode = "bounded"
//! hash_ceiling = 655360
//! check_similar = true
//! size_tolerance = 500000
//! ignored_names = ["Thumbs.db", "desktop.ini", "Folder.jpg", "feed.rss"]
//! ignored_extensions = ["ini", "url"]
//! ```

use crate::core::copier::ExistingFilePolicy;
use crate::core::identity::{IdentityMode, DEFAULT_HASH_CEILING};
use crate::core::scanner::{IgnoreFilter, DEFAULT_IGNORED_EXTENSIONS, DEFAULT_IGNORED_NAMES};
use crate::core::similarity::DEFAULT_SIZE_TOLERANCE;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Name of the sub-directory of the output that receives ambiguous files
pub const SAME_FILENAME_FOLDER: &str = "same filename";

/// Everything a run needs to know
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Flat directory holding candidate files
    pub source: PathBuf,
    /// Roots of the curated album tree
    pub albums: Vec<PathBuf>,
    /// Where orphans are copied
    pub output: PathBuf,
    pub mode: IdentityMode,
    /// Bytes hashed per file in bounded mode
    pub hash_ceiling: u64,
    /// Run the timestamp/size heuristic on same-name files
    pub check_similar: bool,
    /// Size difference, in bytes, below which same-name files are similar
    pub size_tolerance: u64,
    pub ignored_names: Vec<String>,
    pub ignored_extensions: Vec<String>,
    pub include_hidden: bool,
    pub follow_symlinks: bool,
    /// Threads used for hashing
    pub workers: usize,
    /// Per-file hashing limit in seconds
    pub timeout_secs: Option<u64>,
    pub existing: ExistingFilePolicy,
    /// Classify and report, but copy nothing
    pub dry_run: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::new(),
            albums: Vec::new(),
            output: PathBuf::new(),
            mode: IdentityMode::default(),
            hash_ceiling: DEFAULT_HASH_CEILING,
            check_similar: true,
            size_tolerance: DEFAULT_SIZE_TOLERANCE,
            ignored_names: DEFAULT_IGNORED_NAMES.iter().map(|s| s.to_string()).collect(),
            ignored_extensions: DEFAULT_IGNORED_EXTENSIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            include_hidden: true,
            follow_symlinks: false,
            workers: default_workers(),
            timeout_secs: Some(300),
            existing: ExistingFilePolicy::default(),
            dry_run: false,
        }
    }
}

/// Available parallelism, capped so hashing does not swamp the disk
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
        .clamp(1, 8)
}

impl RunConfig {
    /// Parse a TOML document
    pub fn from_toml_str(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Parse {
            path: origin.to_path_buf(),
            reason: e.message().to_string(),
        })
    }

    /// Load a TOML config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text, path)
    }

    /// Per-file timeout as a duration
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Ignore rules shared by the album walk and the source scan
    pub fn ignore_filter(&self) -> IgnoreFilter {
        IgnoreFilter::new()
            .with_names(self.ignored_names.iter().cloned())
            .with_extensions(&self.ignored_extensions)
            .with_hidden(self.include_hidden)
    }

    /// Destination for ambiguous same-name files
    pub fn same_filename_dir(&self) -> PathBuf {
        self.output.join(SAME_FILENAME_FOLDER)
    }

    /// Check the settings needed to index albums
    pub fn validate_albums(&self) -> Result<(), ConfigError> {
        if self.albums.is_empty() {
            return Err(ConfigError::NoAlbums);
        }
        if let Some(missing) = self.albums.iter().find(|a| !a.is_dir()) {
            return Err(ConfigError::AlbumNotFound {
                path: missing.clone(),
            });
        }
        if self.mode == IdentityMode::Bounded && self.hash_ceiling == 0 {
            return Err(ConfigError::InvalidValue {
                field: "hash_ceiling",
                reason: "must be greater than 0 in bounded mode".to_string(),
            });
        }
        if self.workers == 0 {
            return Err(ConfigError::InvalidValue {
                field: "workers",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.timeout_secs == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "timeout_secs",
                reason: "must be at least 1 second when set".to_string(),
            });
        }
        Ok(())
    }

    /// Check every setting needed for a full run
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source.as_os_str().is_empty() || !self.source.is_dir() {
            return Err(ConfigError::SourceNotFound {
                path: self.source.clone(),
            });
        }
        if self.output.as_os_str().is_empty() {
            return Err(ConfigError::NoOutput);
        }
        if same_directory(&self.source, &self.output) {
            return Err(ConfigError::OutputIsSource {
                path: self.output.clone(),
            });
        }
        self.validate_albums()
    }
}

fn same_directory(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn valid_config(dir: &TempDir) -> RunConfig {
        let source = dir.path().join("incoming");
        let albums = dir.path().join("albums");
        fs::create_dir_all(&source).unwrap();
        fs::create_dir_all(&albums).unwrap();
        RunConfig {
            source,
            albums: vec![albums],
            output: dir.path().join("out"),
            ..Default::default()
        }
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = RunConfig::default();
        assert_eq!(config.hash_ceiling, 655_360);
        assert_eq!(config.size_tolerance, 500_000);
        assert_eq!(config.mode, IdentityMode::Bounded);
        assert!(config.check_similar);
        assert!(config.ignored_names.contains(&"Thumbs.db".to_string()));
        assert!(config.workers >= 1);
    }

    #[test]
    fn toml_overrides_defaults() {
        let config = RunConfig::from_toml_str(
            r#"
            source = "/in"
            albums = ["/a", "/b"]
            output = "/out"
            mode = "full"
            size_tolerance = 1000
            "#,
            Path::new("test.toml"),
        )
        .unwrap();

        assert_eq!(config.albums.len(), 2);
        assert_eq!(config.mode, IdentityMode::Full);
        assert_eq!(config.size_tolerance, 1000);
        assert_eq!(config.hash_ceiling, DEFAULT_HASH_CEILING);
    }

    #[test]
    fn album_path_that_is_not_a_list_is_rejected() {
        let error = RunConfig::from_toml_str(
            r#"albums = "/photos/albums""#,
            Path::new("bad.toml"),
        )
        .unwrap_err();

        assert!(matches!(error, ConfigError::Parse { .. }));
        assert!(error.to_string().contains("bad.toml"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result = RunConfig::from_toml_str("album = [\"/a\"]", Path::new("typo.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn load_missing_file_fails() {
        let error = RunConfig::load(Path::new("/nonexistent/orphans.toml")).unwrap_err();
        assert!(matches!(error, ConfigError::ReadFile { .. }));
    }

    #[test]
    fn valid_config_passes() {
        let dir = TempDir::new().unwrap();
        assert!(valid_config(&dir).validate().is_ok());
    }

    #[test]
    fn missing_albums_fail() {
        let dir = TempDir::new().unwrap();
        let mut config = valid_config(&dir);
        config.albums.clear();
        assert!(matches!(config.validate(), Err(ConfigError::NoAlbums)));

        config.albums.push(dir.path().join("nope"));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::AlbumNotFound { .. })
        ));
    }

    #[test]
    fn output_equal_to_source_fails() {
        let dir = TempDir::new().unwrap();
        let mut config = valid_config(&dir);
        config.output = config.source.clone();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutputIsSource { .. })
        ));
    }

    #[test]
    fn zero_ceiling_only_matters_in_bounded_mode() {
        let dir = TempDir::new().unwrap();
        let mut config = valid_config(&dir);
        config.hash_ceiling = 0;
        assert!(config.validate().is_err());

        config.mode = IdentityMode::Full;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_workers_fail() {
        let dir = TempDir::new().unwrap();
        let mut config = valid_config(&dir);
        config.workers = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field: "workers", .. })
        ));
    }

    #[test]
    fn ignore_filter_uses_configured_lists() {
        let config = RunConfig {
            ignored_names: vec!["skip.me".to_string()],
            ignored_extensions: vec![".TMP".to_string()],
            include_hidden: false,
            ..Default::default()
        };
        let filter = config.ignore_filter();

        assert!(!filter.should_include(Path::new("/a/skip.me")));
        assert!(!filter.should_include(Path::new("/a/x.tmp")));
        assert!(!filter.should_include(Path::new("/a/.hidden.jpg")));
        assert!(filter.should_include(Path::new("/a/Thumbs.db")));
    }

    #[test]
    fn same_filename_dir_is_under_output() {
        let config = RunConfig {
            output: PathBuf::from("/out"),
            ..Default::default()
        };
        assert_eq!(config.same_filename_dir(), PathBuf::from("/out/same filename"));
    }
}
