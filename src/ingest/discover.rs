// Pass one: walk a source and catalog its files

use std::io::Read;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::assets::Album;
use crate::constants::FAILED_VIDEOS_FOLDER;
use crate::error::Result;
use crate::events::EventCode;
use crate::filetypes::{ext_of, MediaType};
use crate::source::{split_path, FileRef, MediaSource, SourceEntry};
use super::sidecar::GoogleMetaData;
use super::{AssetFile, FileKey, Takeout};

impl Takeout {
    /// Catalog every file of a source. I/O errors abort the walk;
    /// unreadable sidecars and unwanted files are only recorded.
    pub fn pass_one(&mut self, source: &Arc<dyn MediaSource>, cancel: &CancellationToken) -> Result<()> {
        for entry in source.walk()? {
            Self::check_cancel(cancel)?;
            let file = FileRef::new(Arc::clone(source), entry.path.clone());
            let (dir, _) = split_path(&entry.path);
            self.catalogs.entry(dir.to_string()).or_default();

            if ext_of(&entry.path) == ".json" {
                self.discover_sidecar(&entry, &file)?;
            } else {
                self.discover_media(&entry, file);
            }
        }
        Ok(())
    }

    fn discover_sidecar(&mut self, entry: &SourceEntry, file: &FileRef) -> Result<()> {
        let (dir, base) = split_path(&entry.path);

        let mut data = Vec::with_capacity(entry.size as usize);
        file.open()?.read_to_end(&mut data)?;

        let md = match GoogleMetaData::from_slice(&data) {
            Ok(md) => md,
            Err(e) => {
                let reason = format!("unknown JSON file: {}", e);
                self.recorder.record(EventCode::DiscoveredUnsupported, file, &[("reason", reason.as_str())]);
                return Ok(());
            }
        };

        if md.is_asset() {
            let metadata = md.as_metadata(self.ic.tz);
            self.recorder.record(
                EventCode::DiscoveredSidecar,
                file,
                &[("type", "asset metadata"), ("title", md.title.as_str())],
            );
            if let Some(cat) = self.catalogs.get_mut(dir) {
                cat.sidecars.insert(base.to_string(), metadata);
            }
        } else if md.is_album() {
            if md.title.is_empty() && !self.options.keep_untitled {
                self.recorder.record(EventCode::DiscoveredUnsupported, file, &[("reason", "discard untitled album")]);
                return Ok(());
            }
            let folder = split_path(dir).1;
            let (latitude, longitude) = md.album_location();
            let album = Album {
                title: if md.title.is_empty() { folder.to_string() } else { md.title.clone() },
                path: dir.to_string(),
                description: md.album_description(),
                latitude,
                longitude,
            };
            self.recorder.record(
                EventCode::DiscoveredSidecar,
                file,
                &[("type", "album metadata"), ("title", album.title.as_str())],
            );
            self.albums.insert(dir.to_string(), album);
        } else {
            self.recorder.record(EventCode::DiscoveredUnsupported, file, &[("reason", "unknown JSON file")]);
        }
        Ok(())
    }

    fn discover_media(&mut self, entry: &SourceEntry, file: FileRef) {
        let (dir, base) = split_path(&entry.path);
        let ext = ext_of(base);

        if self.banned.is_match(&entry.path) {
            self.recorder.record(EventCode::DiscoveredDiscarded, &file, &[("reason", "banned file")]);
            return;
        }
        if !self.options.includes(&ext) {
            self.recorder.record(EventCode::DiscoveredDiscarded, &file, &[("reason", "file extension not selected")]);
            return;
        }
        if self.options.excludes(&ext) {
            self.recorder.record(EventCode::DiscoveredDiscarded, &file, &[("reason", "file extension not allowed")]);
            return;
        }

        match self.ic.sm.type_from_ext(&ext) {
            MediaType::Video => {
                self.recorder.record(EventCode::DiscoveredVideo, &file, &[]);
                if entry.path.contains(FAILED_VIDEOS_FOLDER) {
                    self.recorder.record(EventCode::DiscoveredDiscarded, &file, &[("reason", "can't import failed videos")]);
                    return;
                }
            }
            MediaType::Image => self.recorder.record(EventCode::DiscoveredImage, &file, &[]),
            MediaType::Sidecar | MediaType::Unknown => {
                self.recorder.record(EventCode::DiscoveredUnsupported, &file, &[("reason", "unsupported file type")]);
                return;
            }
        }

        let tracked = self.tracker.entry(FileKey::new(base, entry.size)).or_default();
        tracked.paths.push(dir.to_string());
        tracked.count += 1;

        let Some(cat) = self.catalogs.get_mut(dir) else {
            return;
        };
        if cat.unmatched.contains_key(base) {
            self.recorder.record(EventCode::AnalysisLocalDuplicate, &file, &[("reason", "duplicated in the directory")]);
            return;
        }
        cat.unmatched.insert(
            base.to_string(),
            AssetFile {
                file,
                base: base.to_string(),
                size: entry.size,
                modified: entry.modified,
                metadata: None,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;
    use crate::config::ImportOptions;
    use crate::events::Recorder;
    use crate::source::DirSource;

    fn write(root: &std::path::Path, rel: &str, content: &[u8]) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn scan(root: &std::path::Path, options: ImportOptions) -> Takeout {
        let source: Arc<dyn MediaSource> = Arc::new(DirSource::new(root).unwrap());
        let mut to = Takeout::new(vec![source.clone()], options, Arc::new(Recorder::new())).unwrap();
        to.pass_one(&source, &CancellationToken::new()).unwrap();
        to
    }

    #[test]
    fn test_catalog_content() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write(root, "Takeout/Photos/IMG_1.JPG", b"1111");
        write(root, "Takeout/Photos/IMG_1.JPG.json", br#"{"title":"IMG_1.JPG","url":"u"}"#);
        write(root, "Takeout/Photos/notes.txt", b"x");
        write(root, "Takeout/Photos/broken.json", b"{");
        write(root, "Takeout/Photos/@eaDir/IMG_1.JPG/SYNOFILE_THUMB_M.jpg", b"t");
        write(root, "Takeout/Failed Videos/VID_1.mp4", b"v");
        write(root, "Takeout/Trip/metadata.json", br#"{"title":"Trip","date":{"timestamp":"0"}}"#);
        write(root, "Takeout/Unnamed/metadata.json", br#"{"title":"","date":{}}"#);

        let to = scan(root, ImportOptions::default());
        let rec = to.recorder();

        let cat = to.catalog("Takeout/Photos").unwrap();
        assert!(cat.sidecars.contains_key("IMG_1.JPG.json"));
        assert_eq!(cat.unmatched.keys().collect::<Vec<_>>(), vec!["IMG_1.JPG"]);
        assert!(cat.matched.is_empty());

        assert_eq!(to.albums().get("Takeout/Trip").unwrap().title, "Trip");
        assert!(to.albums().get("Takeout/Unnamed").is_none());

        assert_eq!(rec.count(EventCode::DiscoveredImage), 1);
        assert_eq!(rec.count(EventCode::DiscoveredVideo), 1);
        assert_eq!(rec.count(EventCode::DiscoveredSidecar), 2);
        // notes.txt, broken.json, untitled album
        assert_eq!(rec.count(EventCode::DiscoveredUnsupported), 3);
        // banned thumbnail, failed video
        assert_eq!(rec.count(EventCode::DiscoveredDiscarded), 2);
        assert!(to.tracked("VID_1.mp4", 1).is_none());
    }

    #[test]
    fn test_untitled_album_kept_under_folder_name() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "Takeout/Unnamed/metadata.json", br#"{"title":"","date":{}}"#);
        let options = ImportOptions { keep_untitled: true, ..ImportOptions::default() };
        let to = scan(temp.path(), options);
        assert_eq!(to.albums().get("Takeout/Unnamed").unwrap().title, "Unnamed");
    }

    #[test]
    fn test_extension_filters() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "a/IMG_1.JPG", b"1");
        write(temp.path(), "a/IMG_1.HEIC", b"1");
        write(temp.path(), "a/VID_1.MP4", b"1");
        let options = ImportOptions {
            included_extensions: vec![".jpg".into(), ".mp4".into()],
            excluded_extensions: vec![".mp4".into()],
            ..ImportOptions::default()
        };
        let to = scan(temp.path(), options);
        let cat = to.catalog("a").unwrap();
        assert_eq!(cat.unmatched.keys().collect::<Vec<_>>(), vec!["IMG_1.JPG"]);
        assert_eq!(to.recorder().count(EventCode::DiscoveredDiscarded), 2);
    }

    #[test]
    fn test_cancelled_walk() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "a/IMG_1.JPG", b"1");
        let source: Arc<dyn MediaSource> = Arc::new(DirSource::new(temp.path()).unwrap());
        let mut to = Takeout::new(vec![source.clone()], ImportOptions::default(), Arc::new(Recorder::new())).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(matches!(to.pass_one(&source, &cancel), Err(crate::error::TakeoutError::Cancelled)));
    }
}
