//! Legacy MODS file scanner
//!
//! Walks the root directory for `{pid}.xml` files. A single placeholder file
//! name (default `.keep`) is skipped, as are hidden/system entries and
//! symlink loops. A symlink to a regular file counts as that file under the
//! link's own name; symlinked directories are not descended. The walk is
//! synchronous; the pipeline runs it on a
//! blocking thread and streams entries into its work queue.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

/// Scanner errors
///
/// Both are fatal: without an enumerable root there is nothing to audit.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Specified path does not exist
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// Path exists but is not a directory
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// One legacy object file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectFile {
    /// Object identifier derived from the file name
    pub pid: String,
    pub path: PathBuf,
}

impl ObjectFile {
    /// Build from a path named `{pid}.xml`
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        let pid = name.strip_suffix(".xml")?;
        if pid.is_empty() {
            return None;
        }
        Some(Self {
            pid: pid.to_string(),
            path: path.to_path_buf(),
        })
    }
}

/// MODS file scanner
pub struct FileScanner {
    placeholder: String,
    ignore_patterns: Vec<String>,
    max_depth: Option<usize>,
}

impl FileScanner {
    /// Scanner skipping `placeholder` plus common system files
    pub fn new(placeholder: impl Into<String>) -> Self {
        Self {
            placeholder: placeholder.into(),
            ignore_patterns: vec![
                ".DS_Store".to_string(),
                "Thumbs.db".to_string(),
                ".git".to_string(),
                ".svn".to_string(),
            ],
            max_depth: None,
        }
    }

    /// Limit recursion depth (1 = root directory only)
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Walk `root`, calling `visit` for every object file
    ///
    /// `visit` returns `false` to stop the walk early (the receiving side of
    /// the work queue has gone away). Returns the number of files visited.
    pub fn walk<F>(&self, root: &Path, mut visit: F) -> Result<usize, ScanError>
    where
        F: FnMut(ObjectFile) -> bool,
    {
        if !root.exists() {
            return Err(ScanError::PathNotFound(root.to_path_buf()));
        }
        if !root.is_dir() {
            return Err(ScanError::NotADirectory(root.to_path_buf()));
        }

        let mut symlink_visited = HashSet::new();
        let mut visited = 0usize;

        let walker = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .max_depth(self.max_depth.unwrap_or(usize::MAX))
            .into_iter()
            .filter_entry(|e| self.should_process_entry(e, &mut symlink_visited));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Error accessing entry: {}", e);
                    continue;
                }
            };
            if !is_regular_file(&entry) {
                if !entry.file_type().is_dir() {
                    tracing::debug!(path = %entry.path().display(), "Skipping non-file entry");
                }
                continue;
            }
            if entry.file_name().to_str() == Some(self.placeholder.as_str()) {
                tracing::debug!(path = %entry.path().display(), "Skipping placeholder");
                continue;
            }

            match ObjectFile::from_path(entry.path()) {
                Some(object) => {
                    visited += 1;
                    if !visit(object) {
                        tracing::debug!(visited, "Scan stopped by consumer");
                        break;
                    }
                }
                None => {
                    tracing::debug!(path = %entry.path().display(), "Skipping non-MODS file");
                }
            }
        }

        tracing::debug!(root = %root.display(), visited, "Scan complete");
        Ok(visited)
    }

    /// Collect every object file under `root`
    pub fn scan(&self, root: &Path) -> Result<Vec<ObjectFile>, ScanError> {
        let mut files = Vec::new();
        self.walk(root, |file| {
            files.push(file);
            true
        })?;
        Ok(files)
    }

    fn should_process_entry(&self, entry: &DirEntry, symlink_visited: &mut HashSet<PathBuf>) -> bool {
        // The root itself may be hidden (e.g. a tempdir); only filter below it
        if entry.depth() == 0 {
            return true;
        }

        let file_name = entry.file_name().to_string_lossy();
        if self.ignore_patterns.iter().any(|p| file_name == p.as_str()) {
            return false;
        }

        if entry.file_type().is_symlink() {
            if let Ok(canonical) = entry.path().canonicalize() {
                if !symlink_visited.insert(canonical) {
                    tracing::warn!("Symlink loop detected: {}", entry.path().display());
                    return false;
                }
            }
        }

        true
    }
}

/// Regular file, or a symlink resolving to one
fn is_regular_file(entry: &DirEntry) -> bool {
    let file_type = entry.file_type();
    if file_type.is_symlink() {
        return std::fs::metadata(entry.path())
            .map(|m| m.is_file())
            .unwrap_or(false);
    }
    file_type.is_file()
}

impl Default for FileScanner {
    fn default() -> Self {
        Self::new(modsrecon_common::config::DEFAULT_PLACEHOLDER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), "<mods/>").unwrap();
    }

    #[test]
    fn test_object_file_from_path() {
        let file = ObjectFile::from_path(Path::new("/data/islandora:1234.xml")).unwrap();
        assert_eq!(file.pid, "islandora:1234");
        assert!(ObjectFile::from_path(Path::new("/data/.xml")).is_none());
        assert!(ObjectFile::from_path(Path::new("/data/notes.txt")).is_none());
    }

    #[test]
    fn test_scan_nonexistent_path() {
        let scanner = FileScanner::default();
        match scanner.scan(Path::new("/nonexistent/path")) {
            Err(ScanError::PathNotFound(_)) => {}
            other => panic!("Expected PathNotFound error, got {:?}", other),
        }
    }

    #[test]
    fn test_scan_file_as_directory() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "a.xml");
        match FileScanner::default().scan(&dir.path().join("a.xml")) {
            Err(ScanError::NotADirectory(_)) => {}
            other => panic!("Expected NotADirectory error, got {:?}", other),
        }
    }

    #[test]
    fn test_scan_skips_placeholder_and_other_files() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "lehigh:1.xml");
        touch(dir.path(), "lehigh:2.xml");
        touch(dir.path(), ".keep");
        touch(dir.path(), "README.md");
        touch(dir.path(), ".DS_Store");

        let files = FileScanner::default().scan(dir.path()).unwrap();
        let pids: Vec<_> = files.iter().map(|f| f.pid.as_str()).collect();
        assert_eq!(pids, vec!["lehigh:1", "lehigh:2"]);
    }

    #[test]
    fn test_custom_placeholder() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "skip.xml");
        touch(dir.path(), "keep.xml");

        let files = FileScanner::new("skip.xml").scan(dir.path()).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].pid, "keep");
    }

    #[test]
    fn test_walk_recurses_and_respects_depth() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "top.xml");
        fs::create_dir(dir.path().join("batch")).unwrap();
        touch(&dir.path().join("batch"), "nested.xml");

        assert_eq!(FileScanner::default().scan(dir.path()).unwrap().len(), 2);
        assert_eq!(
            FileScanner::default()
                .with_max_depth(1)
                .scan(dir.path())
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn test_walk_stops_when_consumer_declines() {
        let dir = TempDir::new().unwrap();
        for i in 0..5 {
            touch(dir.path(), &format!("{}.xml", i));
        }
        let mut seen = 0;
        let visited = FileScanner::default()
            .walk(dir.path(), |_| {
                seen += 1;
                seen < 2
            })
            .unwrap();
        assert_eq!(visited, 2);
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_follows_symlinked_files() {
        use std::os::unix::fs::symlink;

        let store = TempDir::new().unwrap();
        touch(store.path(), "stored.xml");
        fs::create_dir(store.path().join("batch")).unwrap();
        touch(&store.path().join("batch"), "inner.xml");

        let dir = TempDir::new().unwrap();
        touch(dir.path(), "lehigh:1.xml");
        symlink(store.path().join("stored.xml"), dir.path().join("lehigh:2.xml")).unwrap();
        symlink(store.path().join("missing.xml"), dir.path().join("lehigh:3.xml")).unwrap();
        symlink(store.path().join("batch"), dir.path().join("linked")).unwrap();

        let files = FileScanner::default().scan(dir.path()).unwrap();
        let pids: Vec<_> = files.iter().map(|f| f.pid.as_str()).collect();
        // Dangling links and linked directories are skipped
        assert_eq!(pids, vec!["lehigh:1", "lehigh:2"]);
        assert_eq!(files[1].path, dir.path().join("lehigh:2.xml"));
        assert_eq!(fs::read_to_string(&files[1].path).unwrap(), "<mods/>");
    }

    #[test]
    fn test_scan_empty_directory() {
        let dir = TempDir::new().unwrap();
        assert!(FileScanner::default().scan(dir.path()).unwrap().is_empty());
    }
}
