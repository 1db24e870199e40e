//! Ignore rules applied to every enumerated file.

use std::collections::HashSet;
use std::path::Path;

/// File names skipped by default: thumbnail caches and folder metadata
pub const DEFAULT_IGNORED_NAMES: &[&str] = &["Thumbs.db", "desktop.ini", "Folder.jpg", "feed.rss"];

/// Extensions skipped by default: shortcuts and config files
pub const DEFAULT_IGNORED_EXTENSIONS: &[&str] = &["ini", "url"];

/// Decides which files take part in a run.
///
/// Names are matched exactly (case-sensitive). Extensions are matched
/// case-insensitively and stored without the leading dot.
#[derive(Debug, Clone)]
pub struct IgnoreFilter {
    names: HashSet<String>,
    extensions: HashSet<String>,
    include_hidden: bool,
}

impl IgnoreFilter {
    /// Create a filter with the default ignore sets
    pub fn new() -> Self {
        Self {
            names: DEFAULT_IGNORED_NAMES.iter().map(|n| n.to_string()).collect(),
            extensions: DEFAULT_IGNORED_EXTENSIONS
                .iter()
                .map(|e| e.to_string())
                .collect(),
            include_hidden: true,
        }
    }

    /// Replace the set of ignored file names
    pub fn with_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the set of ignored extensions (".URL" and "url" are equivalent)
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extensions = extensions
            .into_iter()
            .map(|e| normalize_extension(e.as_ref()))
            .collect();
        self
    }

    /// Include hidden files (starting with .)
    pub fn with_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    /// Whether hidden files and directories are walked
    pub fn includes_hidden(&self) -> bool {
        self.include_hidden
    }

    /// Check if a file should be included
    pub fn should_include(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().map(|n| n.to_string_lossy()) else {
            return false;
        };

        if self.names.contains(name.as_ref()) {
            return false;
        }

        if !self.include_hidden && name.starts_with('.') {
            return false;
        }

        match path.extension() {
            Some(ext) => !self
                .extensions
                .contains(&ext.to_string_lossy().to_lowercase()),
            None => true,
        }
    }
}

impl Default for IgnoreFilter {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize_extension(ext: &str) -> String {
    ext.trim_start_matches('.').to_lowercase()
}
