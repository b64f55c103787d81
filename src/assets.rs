// Assets and asset groups produced by the import

use std::fmt;
use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;

use crate::error::{Result, TakeoutError};
use crate::filenames::NameInfo;
use crate::source::FileRef;

/// An album as described by the takeout
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Album {
    pub title: String,
    /// Directory of the album in the takeout, empty for forced albums
    pub path: String,
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Album {
    pub fn named(title: impl Into<String>) -> Self {
        Self { title: title.into(), ..Self::default() }
    }

    pub fn has_location(&self) -> bool {
        self.latitude != 0.0 || self.longitude != 0.0
    }
}

/// One media file with everything known about it
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogicalAsset {
    #[serde(serialize_with = "serialize_file")]
    pub file: FileRef,
    pub size: u64,
    pub file_date: Option<DateTime<Utc>>,
    pub title: String,
    pub description: String,
    pub capture_date: Option<DateTime<FixedOffset>>,
    pub latitude: f64,
    pub longitude: f64,
    pub trashed: bool,
    pub archived: bool,
    pub favorite: bool,
    pub from_partner: bool,
    pub stars: u8,
    pub albums: Vec<Album>,
    #[serde(flatten)]
    pub name: NameInfo,
}

fn serialize_file<S: serde::Serializer>(file: &FileRef, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_str(&file.to_string())
}

impl LogicalAsset {
    pub fn radical(&self) -> &str {
        &self.name.radical
    }

    /// Capture date, else the date found in the name
    pub fn date(&self) -> Option<DateTime<FixedOffset>> {
        self.capture_date.or(self.name.taken)
    }
}

impl fmt::Display for LogicalAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.file)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
pub enum GroupKind {
    /// Plain asset, or assets that only share a folder
    #[default]
    None,
    /// Video and still of one live capture; the video comes first
    MotionPhoto,
    Burst,
    RawJpeg,
    HeicJpeg,
}

impl fmt::Display for GroupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GroupKind::None => "none",
            GroupKind::MotionPhoto => "motion-photo",
            GroupKind::Burst => "burst",
            GroupKind::RawJpeg => "raw-jpeg",
            GroupKind::HeicJpeg => "heic-jpeg",
        };
        f.write_str(s)
    }
}

/// Assets that belong together, with the one to show first
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetGroup {
    pub kind: GroupKind,
    pub cover_index: usize,
    pub assets: Vec<LogicalAsset>,
}

impl AssetGroup {
    pub fn new(kind: GroupKind, assets: Vec<LogicalAsset>) -> Self {
        Self { kind, cover_index: 0, assets }
    }

    /// A bare asset
    pub fn single(asset: LogicalAsset) -> Self {
        Self::new(GroupKind::None, vec![asset])
    }

    pub fn with_cover(mut self, cover_index: usize) -> Self {
        self.cover_index = cover_index;
        self
    }

    pub fn is_single(&self) -> bool {
        self.kind == GroupKind::None && self.assets.len() == 1
    }

    pub fn cover(&self) -> Option<&LogicalAsset> {
        self.assets.get(self.cover_index)
    }

    pub fn validate(&self) -> Result<()> {
        if self.assets.is_empty() {
            return Err(TakeoutError::InvalidGroup("group has no assets".to_string()));
        }
        if self.kind != GroupKind::None && self.assets.len() < 2 {
            return Err(TakeoutError::InvalidGroup(format!("{} group needs at least 2 assets", self.kind)));
        }
        if self.cover_index >= self.assets.len() {
            return Err(TakeoutError::InvalidGroup(format!(
                "cover index {} out of {} assets",
                self.cover_index,
                self.assets.len()
            )));
        }
        Ok(())
    }
}

impl fmt::Display for AssetGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.assets.iter().map(|a| a.file.base()).collect();
        write!(f, "{} [{}] cover={}", self.kind, names.join(", "), self.cover_index)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::io::{Cursor, Read};
    use std::sync::Arc;
    use chrono::{DateTime, FixedOffset};

    use crate::error::Result;
    use crate::filenames::test_collector;
    use crate::source::{FileRef, MediaSource, SourceEntry};
    use super::LogicalAsset;

    /// Source with no content, for building assets in memory
    pub struct NullSource;

    impl MediaSource for NullSource {
        fn name(&self) -> &str {
            "memory"
        }

        fn walk(&self) -> Result<Vec<SourceEntry>> {
            Ok(Vec::new())
        }

        fn open(&self, _path: &str) -> Result<Box<dyn Read + Send>> {
            Ok(Box::new(Cursor::new(Vec::new())))
        }
    }

    /// Asset named `name`, captured at `date` (or at the time in its name)
    pub fn asset(name: &str, date: Option<DateTime<FixedOffset>>) -> LogicalAsset {
        let info = test_collector().get_info(name);
        LogicalAsset {
            file: FileRef::new(Arc::new(NullSource), name),
            size: 0,
            file_date: None,
            title: name.to_string(),
            description: String::new(),
            capture_date: date.or(info.taken),
            latitude: 0.0,
            longitude: 0.0,
            trashed: false,
            archived: false,
            favorite: false,
            from_partner: false,
            stars: 0,
            albums: Vec::new(),
            name: info,
        }
    }
}
