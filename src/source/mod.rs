// Read-only file sources: plain directories and zip archives
//
// Paths inside a source are relative and '/' separated whatever the
// platform, so catalogs built from a folder and from an archive look alike.

pub mod dir;
pub mod zip;

use std::fmt;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use chrono::{DateTime, Utc};

use crate::error::{Result, TakeoutError};

pub use self::dir::DirSource;
pub use self::zip::ZipSource;

/// A file found while walking a source
#[derive(Debug, Clone)]
pub struct SourceEntry {
    /// Relative, '/' separated
    pub path: String,
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
}

impl SourceEntry {
    /// Directory part of the path, without trailing '/' ("" at the root)
    pub fn dir(&self) -> &str {
        split_path(&self.path).0
    }

    pub fn base(&self) -> &str {
        split_path(&self.path).1
    }
}

/// Split "a/b/c.jpg" into ("a/b", "c.jpg")
pub fn split_path(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(p) => (&path[..p], &path[p + 1..]),
        None => ("", path),
    }
}

/// Join a catalog directory and a base name
pub fn join_path(dir: &str, base: &str) -> String {
    if dir.is_empty() {
        base.to_string()
    } else {
        format!("{}/{}", dir, base)
    }
}

/// Hierarchical read-only file provider
pub trait MediaSource: Send + Sync {
    /// Human readable name (folder path or archive path)
    fn name(&self) -> &str;

    /// All file entries, sorted by path. Directories are not listed.
    fn walk(&self) -> Result<Vec<SourceEntry>>;

    /// Open a file previously returned by `walk`
    fn open(&self, path: &str) -> Result<Box<dyn Read + Send>>;

    /// Location on disk when the file can be handed to external tools directly
    fn local_path(&self, _path: &str) -> Option<std::path::PathBuf> {
        None
    }
}

/// Reference to a file inside a source
#[derive(Clone)]
pub struct FileRef {
    pub source: Arc<dyn MediaSource>,
    pub path: String,
}

impl FileRef {
    pub fn new(source: Arc<dyn MediaSource>, path: impl Into<String>) -> Self {
        Self { source, path: path.into() }
    }

    pub fn base(&self) -> &str {
        split_path(&self.path).1
    }

    pub fn open(&self) -> Result<Box<dyn Read + Send>> {
        self.source.open(&self.path)
    }
}

impl fmt::Debug for FileRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source.name(), self.path)
    }
}

impl fmt::Display for FileRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source.name(), self.path)
    }
}

/// Open a list of paths as sources: directories are walked, `.zip` files read
/// as archives.
pub fn open_sources<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<Arc<dyn MediaSource>>> {
    let mut sources: Vec<Arc<dyn MediaSource>> = Vec::new();
    for path in paths {
        let path = path.as_ref();
        if path.is_dir() {
            sources.push(Arc::new(DirSource::new(path)?));
        } else if path.is_file() && path.extension().map(|e| e.eq_ignore_ascii_case("zip")).unwrap_or(false) {
            sources.push(Arc::new(ZipSource::open(path)?));
        } else if path.exists() {
            return Err(TakeoutError::InvalidPath(format!("not a folder or zip archive: {}", path.display())));
        } else {
            return Err(TakeoutError::FileNotFound(path.display().to_string()));
        }
    }
    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_and_join() {
        assert_eq!(split_path("Takeout/Photos/IMG_1.JPG"), ("Takeout/Photos", "IMG_1.JPG"));
        assert_eq!(split_path("IMG_1.JPG"), ("", "IMG_1.JPG"));
        assert_eq!(join_path("", "IMG_1.JPG"), "IMG_1.JPG");
        assert_eq!(join_path("a/b", "IMG_1.JPG"), "a/b/IMG_1.JPG");
    }

    #[test]
    fn test_open_sources_rejects_missing_path() {
        let err = open_sources(&["/definitely/not/here"]).err().unwrap();
        assert!(matches!(err, TakeoutError::FileNotFound(_)));
    }
}
