// Folder source backed by walkdir

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use chrono::{DateTime, Utc};
use walkdir::WalkDir;

use crate::error::{Result, TakeoutError};
use super::{MediaSource, SourceEntry};

#[derive(Debug)]
pub struct DirSource {
    root: PathBuf,
    name: String,
}

impl DirSource {
    pub fn new(root: &Path) -> Result<Self> {
        if !root.is_dir() {
            return Err(TakeoutError::InvalidPath(format!("not a folder: {}", root.display())));
        }
        Ok(Self {
            root: root.to_path_buf(),
            name: root.display().to_string(),
        })
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let mut full = self.root.clone();
        for part in path.split('/').filter(|p| !p.is_empty()) {
            full.push(part);
        }
        full
    }
}

impl MediaSource for DirSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn walk(&self) -> Result<Vec<SourceEntry>> {
        let mut entries = Vec::new();

        for entry in WalkDir::new(&self.root).follow_links(true).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let rel = entry.path().strip_prefix(&self.root).map_err(|_| {
                TakeoutError::InvalidPath(entry.path().display().to_string())
            })?;
            let path = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");

            let meta = entry.metadata()?;
            let modified = meta.modified().ok().map(DateTime::<Utc>::from);

            entries.push(SourceEntry {
                path,
                size: meta.len(),
                modified,
            });
        }

        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }

    fn open(&self, path: &str) -> Result<Box<dyn Read + Send>> {
        let full = self.resolve(path);
        let file = File::open(&full).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => TakeoutError::FileNotFound(full.display().to_string()),
            _ => TakeoutError::Io(e),
        })?;
        Ok(Box::new(file))
    }

    fn local_path(&self, path: &str) -> Option<PathBuf> {
        Some(self.resolve(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_walk_lists_files_with_relative_paths() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("Takeout/Photos from 2023")).unwrap();
        fs::write(temp.path().join("Takeout/Photos from 2023/IMG_1.JPG"), b"12345").unwrap();
        fs::write(temp.path().join("Takeout/Photos from 2023/IMG_1.JPG.json"), b"{}").unwrap();
        fs::write(temp.path().join("top.txt"), b"x").unwrap();

        let source = DirSource::new(temp.path()).unwrap();
        let entries = source.walk().unwrap();
        let paths: Vec<&str> = entries.iter().map(|e| e.path.as_str()).collect();

        assert_eq!(paths, vec![
            "Takeout/Photos from 2023/IMG_1.JPG",
            "Takeout/Photos from 2023/IMG_1.JPG.json",
            "top.txt",
        ]);
        assert_eq!(entries[0].size, 5);
        assert_eq!(entries[0].dir(), "Takeout/Photos from 2023");
        assert!(entries[0].modified.is_some());
    }

    #[test]
    fn test_open_reads_content() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("a")).unwrap();
        fs::write(temp.path().join("a/b.json"), b"{\"title\":\"b\"}").unwrap();

        let source = DirSource::new(temp.path()).unwrap();
        let mut content = String::new();
        source.open("a/b.json").unwrap().read_to_string(&mut content).unwrap();
        assert_eq!(content, "{\"title\":\"b\"}");

        assert!(matches!(source.open("a/missing.json"), Err(TakeoutError::FileNotFound(_))));
    }
}
