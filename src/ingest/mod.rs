// Takeout ingest: catalogs, metadata association and asset emission
//
// Pass one walks every source and builds a catalog per directory: sidecars,
// media files still waiting for metadata, and media files already matched.
// The puzzle then associates sidecars with media files. Pass two links
// motion photos, applies the import policies and streams asset groups.

pub mod discover;
pub mod emit;
pub mod linking;
pub mod matching;
pub mod pipeline;
pub mod sidecar;


use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use crate::assets::Album;
use crate::config::{BannedFiles, ImportOptions};
use crate::error::{Result, TakeoutError};
use crate::events::Recorder;
use crate::filenames::InfoCollector;
use crate::filetypes::SupportedMedia;
use crate::metadata::{LocalMetadataReader, Metadata, MetadataReader};
use crate::source::{MediaSource, FileRef};

/// A media file seen during pass one
#[derive(Debug, Clone)]
pub struct AssetFile {
    pub file: FileRef,
    pub base: String,
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
    /// Set once a sidecar is associated
    pub metadata: Option<Metadata>,
}

impl AssetFile {
    pub fn key(&self) -> FileKey {
        FileKey::new(&self.base, self.size)
    }
}

/// Files of one directory, all keyed by base name.
/// A media file moves from `unmatched` to `matched` once and never back.
#[derive(Debug, Default)]
pub struct DirectoryCatalog {
    pub sidecars: BTreeMap<String, Metadata>,
    pub unmatched: BTreeMap<String, AssetFile>,
    pub matched: BTreeMap<String, AssetFile>,
}

/// Identity of a file across directories: same name, same size
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileKey {
    pub base: String,
    pub size: u64,
}

impl FileKey {
    pub fn new(base: &str, size: u64) -> Self {
        Self { base: base.to_string(), size }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackStatus {
    #[default]
    Pending,
    Emitted,
    Discarded,
    Error,
}

/// Everything known about one file identity
#[derive(Debug, Clone, Default)]
pub struct TrackedFile {
    /// Directories where a copy was seen, in discovery order
    pub paths: Vec<String>,
    pub count: usize,
    pub metadata: Option<Metadata>,
    pub status: TrackStatus,
}

/// A whole takeout, possibly split over several folders and archives
pub struct Takeout {
    sources: Vec<Arc<dyn MediaSource>>,
    catalogs: BTreeMap<String, DirectoryCatalog>,
    albums: BTreeMap<String, Album>,
    tracker: HashMap<FileKey, TrackedFile>,
    recorder: Arc<Recorder>,
    options: ImportOptions,
    banned: BannedFiles,
    ic: InfoCollector,
    reader: Arc<dyn MetadataReader>,
}

impl Takeout {
    pub fn new(sources: Vec<Arc<dyn MediaSource>>, options: ImportOptions, recorder: Arc<Recorder>) -> Result<Self> {
        options.validate()?;
        let ic = InfoCollector::new(options.time_zone()?, SupportedMedia::default());
        let reader: Arc<dyn MetadataReader> = Arc::new(LocalMetadataReader::new(ic.clone(), options.use_exif_tool));
        Ok(Self {
            sources,
            catalogs: BTreeMap::new(),
            albums: BTreeMap::new(),
            tracker: HashMap::new(),
            recorder,
            banned: options.banned()?,
            options,
            ic,
            reader,
        })
    }

    /// Replace the reader used for files without sidecar
    pub fn with_reader(mut self, reader: Arc<dyn MetadataReader>) -> Self {
        self.reader = reader;
        self
    }

    /// Walk every source and solve the sidecar puzzle
    pub fn prepare(&mut self, cancel: &CancellationToken) -> Result<()> {
        let sources = self.sources.clone();
        for source in &sources {
            log::info!("Scanning {}", source.name());
            self.pass_one(source, cancel)?;
        }
        self.solve_puzzle(cancel)?;
        log::info!(
            "Catalogued {} directories, {} albums, {} distinct files",
            self.catalogs.len(),
            self.albums.len(),
            self.tracker.len()
        );
        Ok(())
    }

    pub fn catalog(&self, dir: &str) -> Option<&DirectoryCatalog> {
        self.catalogs.get(dir)
    }

    pub fn directories(&self) -> impl Iterator<Item = &str> {
        self.catalogs.keys().map(|k| k.as_str())
    }

    pub fn albums(&self) -> &BTreeMap<String, Album> {
        &self.albums
    }

    pub fn tracked(&self, base: &str, size: u64) -> Option<&TrackedFile> {
        self.tracker.get(&FileKey::new(base, size))
    }

    pub fn recorder(&self) -> &Arc<Recorder> {
        &self.recorder
    }

    pub fn options(&self) -> &ImportOptions {
        &self.options
    }

    fn check_cancel(cancel: &CancellationToken) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(TakeoutError::Cancelled);
        }
        Ok(())
    }
}
