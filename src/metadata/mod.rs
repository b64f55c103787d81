// Metadata attached to a media file
//
// Sidecars provide most of it. Files without a sidecar go through a
// MetadataReader that looks at the file name and, optionally, exiftool.

pub mod exiftool;

use std::io;
use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use crate::config::DateMethod;
use crate::error::Result;
use crate::filenames::InfoCollector;
use crate::filetypes::split_ext;
use crate::source::FileRef;

/// Metadata of one asset, from a sidecar or read from the file itself
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Metadata {
    /// Original file name as known by the photo service
    pub file_name: String,
    pub description: String,
    pub date_taken: Option<DateTime<FixedOffset>>,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    pub trashed: bool,
    pub archived: bool,
    pub favorited: bool,
    pub from_partner: bool,
    pub stars: u8,
}

impl Metadata {
    pub fn has_location(&self) -> bool {
        self.latitude != 0.0 || self.longitude != 0.0
    }
}

/// Source of metadata for files that came without a sidecar
pub trait MetadataReader: Send + Sync {
    fn read(&self, file: &FileRef, method: DateMethod) -> Result<Metadata>;
}

/// Reader combining file name analysis and exiftool
#[derive(Debug, Clone)]
pub struct LocalMetadataReader {
    ic: InfoCollector,
    use_exif_tool: bool,
}

impl LocalMetadataReader {
    pub fn new(ic: InfoCollector, use_exif_tool: bool) -> Self {
        Self { ic, use_exif_tool }
    }

    fn from_name(&self, file: &FileRef) -> Option<DateTime<FixedOffset>> {
        self.ic.classify(file.base()).and_then(|info| info.taken)
    }

    fn from_exif(&self, file: &FileRef) -> Result<Option<exiftool::ExifMetadata>> {
        if !self.use_exif_tool {
            return Ok(None);
        }
        if let Some(path) = file.source.local_path(&file.path) {
            return exiftool::extract(&path, self.ic.tz).map(Some);
        }

        // Archive entries are copied out so exiftool can read them
        let ext = split_ext(file.base()).1;
        let mut temp = tempfile::Builder::new()
            .prefix("takeout_")
            .suffix(ext)
            .tempfile()?;
        let mut reader = file.open()?;
        io::copy(&mut reader, temp.as_file_mut())?;
        let meta = exiftool::extract(temp.path(), self.ic.tz)?;
        log::debug!("exiftool read {} through {}", file, temp.path().display());
        Ok(Some(meta))
    }
}

impl MetadataReader for LocalMetadataReader {
    fn read(&self, file: &FileRef, method: DateMethod) -> Result<Metadata> {
        let mut md = Metadata {
            file_name: file.base().to_string(),
            ..Metadata::default()
        };

        let exif = match method {
            DateMethod::Exif | DateMethod::ExifFilename | DateMethod::FilenameExif => self.from_exif(file)?,
            DateMethod::None | DateMethod::Filename => None,
        };
        let exif_date = exif.as_ref().and_then(|e| e.date_taken);

        md.date_taken = match method {
            DateMethod::None => None,
            DateMethod::Filename => self.from_name(file),
            DateMethod::Exif => exif_date,
            DateMethod::ExifFilename => exif_date.or_else(|| self.from_name(file)),
            DateMethod::FilenameExif => self.from_name(file).or(exif_date),
        };

        if let Some(exif) = exif {
            md.latitude = exif.gps_latitude.unwrap_or_default();
            md.longitude = exif.gps_longitude.unwrap_or_default();
            md.altitude = exif.gps_altitude.unwrap_or_default();
        }
        Ok(md)
    }
}
