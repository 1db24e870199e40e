//! Directory walking implementation using walkdir.

use super::{filter::IgnoreFilter, FileRecord, FileScanner, ScanResult};
use crate::error::ScanError;
use crate::events::{Event, EventSender, ScanEvent, ScanProgress};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Configuration for the directory scanner
#[derive(Debug, Clone, Default)]
pub struct ScanConfig {
    /// Whether to follow symbolic links
    pub follow_symlinks: bool,
    /// Maximum directory depth (None = unlimited)
    pub max_depth: Option<usize>,
}

impl ScanConfig {
    /// Only the first level of the root: the scan directory is never walked recursively
    pub fn flat() -> Self {
        Self {
            follow_symlinks: false,
            max_depth: Some(1),
        }
    }
}

/// Scanner implementation using the walkdir crate
pub struct WalkDirScanner {
    config: ScanConfig,
    filter: IgnoreFilter,
}

impl WalkDirScanner {
    /// Create a new scanner with the given configuration and ignore rules
    pub fn new(config: ScanConfig, filter: IgnoreFilter) -> Self {
        Self { config, filter }
    }

    /// Scan a single root
    fn scan_directory(
        &self,
        root: &Path,
        events: &EventSender,
        files: &mut Vec<FileRecord>,
        errors: &mut Vec<ScanError>,
    ) {
        if !root.is_dir() {
            let error = ScanError::DirectoryNotFound {
                path: root.to_path_buf(),
            };
            events.send(Event::Scan(ScanEvent::Error {
                path: root.to_path_buf(),
                message: error.to_string(),
            }));
            errors.push(error);
            return;
        }

        let mut directories_scanned = 0;

        let mut walker = WalkDir::new(root).follow_links(self.config.follow_symlinks);
        if let Some(depth) = self.config.max_depth {
            walker = walker.max_depth(depth);
        }

        let include_hidden = self.filter.includes_hidden();
        let entries = walker
            .into_iter()
            .filter_entry(|entry| include_hidden || entry.depth() == 0 || !is_hidden(entry));

        for entry_result in entries {
            let entry = match entry_result {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_default();
                    let error = if e.io_error().map(|io| io.kind())
                        == Some(std::io::ErrorKind::PermissionDenied)
                    {
                        ScanError::PermissionDenied { path: path.clone() }
                    } else {
                        ScanError::ReadDirectory {
                            path: path.clone(),
                            source: std::io::Error::other(e.to_string()),
                        }
                    };

                    tracing::warn!(path = %path.display(), "skipping unreadable entry");
                    events.send(Event::Scan(ScanEvent::Error {
                        path,
                        message: error.to_string(),
                    }));
                    errors.push(error);
                    continue;
                }
            };

            let path = entry.path();

            if entry.file_type().is_dir() {
                directories_scanned += 1;
                events.send(Event::Scan(ScanEvent::Progress(ScanProgress {
                    directories_scanned,
                    files_found: files.len(),
                    current_path: path.to_path_buf(),
                })));
                continue;
            }

            if !entry.file_type().is_file() || !self.filter.should_include(path) {
                continue;
            }

            match fs::metadata(path) {
                Ok(metadata) => {
                    events.send(Event::Scan(ScanEvent::FileFound {
                        path: path.to_path_buf(),
                    }));
                    files.push(FileRecord::new(path, &metadata));
                }
                Err(source) => {
                    let error = ScanError::ReadDirectory {
                        path: path.to_path_buf(),
                        source,
                    };
                    events.send(Event::Scan(ScanEvent::Error {
                        path: path.to_path_buf(),
                        message: error.to_string(),
                    }));
                    errors.push(error);
                }
            }
        }
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

impl FileScanner for WalkDirScanner {
    fn scan(&self, paths: &[PathBuf]) -> ScanResult {
        self.scan_with_events(paths, &crate::events::null_sender())
    }

    fn scan_with_events(&self, paths: &[PathBuf], events: &EventSender) -> ScanResult {
        events.send(Event::Scan(ScanEvent::Started {
            paths: paths.to_vec(),
        }));

        let mut files = Vec::new();
        let mut errors = Vec::new();

        for path in paths {
            self.scan_directory(path, events, &mut files, &mut errors);
        }

        // Enumeration order is filesystem dependent; everything downstream relies on path order.
        files.sort_by(|a, b| a.path.cmp(&b.path));
        files.dedup_by(|a, b| a.path == b.path);

        events.send(Event::Scan(ScanEvent::Completed {
            total_files: files.len(),
        }));

        ScanResult { files, errors }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    fn create_file(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(content).unwrap();
        path
    }

    fn default_scanner() -> WalkDirScanner {
        WalkDirScanner::new(ScanConfig::default(), IgnoreFilter::new())
    }

    #[test]
    fn scan_empty_directory_returns_empty_vec() {
        let temp_dir = TempDir::new().unwrap();
        let result = default_scanner().scan(&[temp_dir.path().to_path_buf()]);

        assert!(result.files.is_empty());
        assert!(result.errors.is_empty());
    }

    #[test]
    fn scan_records_size_and_folded_name() {
        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), "IMG_0001.JPG", b"12345");

        let result = default_scanner().scan(&[temp_dir.path().to_path_buf()]);

        assert_eq!(result.files.len(), 1);
        assert_eq!(result.files[0].name, "img_0001.jpg");
        assert_eq!(result.files[0].size, 5);
    }

    #[test]
    fn scan_traverses_nested_directories() {
        let temp_dir = TempDir::new().unwrap();
        let subdir = temp_dir.path().join("2019 Holiday");
        fs::create_dir(&subdir).unwrap();
        create_file(temp_dir.path(), "root.jpg", b"a");
        create_file(&subdir, "nested.jpg", b"b");

        let result = default_scanner().scan(&[temp_dir.path().to_path_buf()]);

        assert_eq!(result.files.len(), 2);
    }

    #[test]
    fn flat_scan_ignores_subdirectories() {
        let temp_dir = TempDir::new().unwrap();
        let subdir = temp_dir.path().join("same filename");
        fs::create_dir(&subdir).unwrap();
        create_file(temp_dir.path(), "top.jpg", b"a");
        create_file(&subdir, "deep.jpg", b"b");

        let scanner = WalkDirScanner::new(ScanConfig::flat(), IgnoreFilter::new());
        let result = scanner.scan(&[temp_dir.path().to_path_buf()]);

        assert_eq!(result.files.len(), 1);
        assert!(result.files[0].path.ends_with("top.jpg"));
    }

    #[test]
    fn scan_applies_ignore_filter() {
        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), "photo.jpg", b"a");
        create_file(temp_dir.path(), "Thumbs.db", b"b");
        create_file(temp_dir.path(), "desktop.ini", b"c");
        create_file(temp_dir.path(), "shortcut.url", b"d");

        let result = default_scanner().scan(&[temp_dir.path().to_path_buf()]);

        assert_eq!(result.files.len(), 1);
        assert!(result.files[0].path.ends_with("photo.jpg"));
    }

    #[test]
    fn hidden_directories_skipped_when_excluded() {
        let temp_dir = TempDir::new().unwrap();
        let hidden = temp_dir.path().join(".thumbnails");
        fs::create_dir(&hidden).unwrap();
        create_file(&hidden, "cached.jpg", b"a");
        create_file(temp_dir.path(), "visible.jpg", b"b");

        let scanner =
            WalkDirScanner::new(ScanConfig::default(), IgnoreFilter::new().with_hidden(false));
        let result = scanner.scan(&[temp_dir.path().to_path_buf()]);

        assert_eq!(result.files.len(), 1);
        assert!(result.files[0].path.ends_with("visible.jpg"));
    }

    #[test]
    fn scan_results_are_sorted_by_path() {
        let temp_dir = TempDir::new().unwrap();
        for name in ["c.jpg", "a.jpg", "b.jpg"] {
            create_file(temp_dir.path(), name, name.as_bytes());
        }

        let result = default_scanner().scan(&[temp_dir.path().to_path_buf()]);
        let names: Vec<_> = result.files.iter().map(|f| f.name.as_str()).collect();

        assert_eq!(names, vec!["a.jpg", "b.jpg", "c.jpg"]);
    }

    #[test]
    fn scan_nonexistent_directory_records_error() {
        let result = default_scanner().scan(&[PathBuf::from("/nonexistent/path/12345")]);

        assert!(result.files.is_empty());
        assert_eq!(result.errors.len(), 1);
        assert!(matches!(
            result.errors[0],
            ScanError::DirectoryNotFound { .. }
        ));
    }

    #[test]
    fn missing_root_does_not_stop_other_roots() {
        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), "kept.jpg", b"a");

        let result = default_scanner().scan(&[
            PathBuf::from("/nonexistent/path/12345"),
            temp_dir.path().to_path_buf(),
        ]);

        assert_eq!(result.files.len(), 1);
        assert_eq!(result.errors.len(), 1);
    }
}
