// Zip archive source (takeout-*.zip)
//
// The archive is reopened for each read so the source stays Sync and entries
// can be read from any task.

use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use std::path::{Path, PathBuf};
use chrono::{DateTime, NaiveDate, Utc};
use zip::ZipArchive;

use crate::error::{Result, TakeoutError};
use super::{MediaSource, SourceEntry};

#[derive(Debug)]
pub struct ZipSource {
    archive: PathBuf,
    name: String,
}

impl ZipSource {
    /// Check the archive is readable and remember its location
    pub fn open(archive: &Path) -> Result<Self> {
        let file = File::open(archive)?;
        ZipArchive::new(BufReader::new(file))?;
        Ok(Self {
            archive: archive.to_path_buf(),
            name: archive.display().to_string(),
        })
    }

    fn reader(&self) -> Result<ZipArchive<BufReader<File>>> {
        let file = File::open(&self.archive)?;
        Ok(ZipArchive::new(BufReader::new(file))?)
    }
}

fn zip_time(dt: zip::DateTime) -> Option<DateTime<Utc>> {
    NaiveDate::from_ymd_opt(dt.year() as i32, dt.month() as u32, dt.day() as u32)?
        .and_hms_opt(dt.hour() as u32, dt.minute() as u32, dt.second() as u32)
        .map(|naive| naive.and_utc())
}

impl MediaSource for ZipSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn walk(&self) -> Result<Vec<SourceEntry>> {
        let mut archive = self.reader()?;
        let mut entries = Vec::with_capacity(archive.len());

        for i in 0..archive.len() {
            let file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let path = file.name().trim_start_matches('/').replace('\\', "/");
            entries.push(SourceEntry {
                path,
                size: file.size(),
                modified: file.last_modified().and_then(zip_time),
            });
        }

        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }

    fn open(&self, path: &str) -> Result<Box<dyn Read + Send>> {
        let mut archive = self.reader()?;
        let mut file = match archive.by_name(path) {
            Ok(f) => f,
            Err(zip::result::ZipError::FileNotFound) => {
                return Err(TakeoutError::FileNotFound(format!("{}:{}", self.name, path)));
            }
            Err(e) => return Err(e.into()),
        };
        let mut buf = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut buf)?;
        Ok(Box::new(Cursor::new(buf)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;

    fn build_archive(dir: &Path) -> PathBuf {
        let path = dir.join("takeout-001.zip");
        let mut writer = zip::ZipWriter::new(File::create(&path).unwrap());
        let options = SimpleFileOptions::default();
        writer.add_directory("Takeout/Album/", options).unwrap();
        writer.start_file("Takeout/Album/IMG_2.JPG", options).unwrap();
        writer.write_all(b"jpeg!").unwrap();
        writer.start_file("Takeout/Album/IMG_2.JPG.json", options).unwrap();
        writer.write_all(b"{\"title\":\"IMG_2.JPG\"}").unwrap();
        writer.finish().unwrap();
        path
    }

    #[test]
    fn test_walk_skips_directories() {
        let temp = TempDir::new().unwrap();
        let source = ZipSource::open(&build_archive(temp.path())).unwrap();
        let entries = source.walk().unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].path, "Takeout/Album/IMG_2.JPG");
        assert_eq!(entries[0].size, 5);
        assert_eq!(entries[1].base(), "IMG_2.JPG.json");
    }

    #[test]
    fn test_open_entry() {
        let temp = TempDir::new().unwrap();
        let source = ZipSource::open(&build_archive(temp.path())).unwrap();
        let mut content = Vec::new();
        source.open("Takeout/Album/IMG_2.JPG").unwrap().read_to_end(&mut content).unwrap();
        assert_eq!(content, b"jpeg!");
        assert!(matches!(source.open("nope.jpg"), Err(TakeoutError::FileNotFound(_))));
    }

    #[test]
    fn test_rejects_non_archive() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("fake.zip");
        std::fs::write(&path, b"not a zip").unwrap();
        assert!(ZipSource::open(&path).is_err());
    }
}
