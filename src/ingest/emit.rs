// Pass two: turn matched files into assets, applying the import policies

use crate::assets::{Album, AssetGroup, GroupKind, LogicalAsset};
use crate::events::EventCode;
use crate::filetypes::split_ext;
use crate::metadata::Metadata;
use crate::source::split_path;
use super::linking::LinkedPair;
use super::{AssetFile, Takeout, TrackStatus};

/// Reconcile the sidecar title with the extension of the file on disk.
/// At most two extensions are trimmed from the title.
///
///   IMG_1.HEIC for IMG_1.JPG      -> IMG_1.JPG
///   PXL_1.MP.jpg for PXL_1.mp4    -> PXL_1.mp4
pub fn reconcile_title(title: &str, file: &str) -> String {
    let file_ext = split_ext(file).1;
    let (stem, title_ext) = split_ext(title);
    if title_ext == file_ext {
        return title.to_string();
    }
    let (inner, inner_ext) = split_ext(stem);
    if inner_ext == file_ext {
        return stem.to_string();
    }
    format!("{}{}", inner, file_ext)
}

impl Takeout {
    /// Emit the pairs of a directory in key order. A pair whose assets
    /// all fall to the policies produces nothing.
    pub fn emit_directory(&mut self, dir: &str) -> Vec<AssetGroup> {
        let pairs = self.link_motion(dir);
        pairs
            .into_values()
            .filter_map(|pair| self.emit_pair(dir, pair))
            .collect()
    }

    fn matched_file(&self, dir: &str, name: Option<&String>) -> Option<AssetFile> {
        let name = name?;
        self.catalogs.get(dir)?.matched.get(name).cloned()
    }

    /// The video of a motion photo comes first
    pub fn emit_pair(&mut self, dir: &str, pair: LinkedPair) -> Option<AssetGroup> {
        let video = self.matched_file(dir, pair.video.as_ref());
        let image = self.matched_file(dir, pair.image.as_ref());

        let group = match (video, image) {
            (Some(video), Some(image)) => {
                let video = self.make_asset(dir, &video);
                let image = self.make_asset(dir, &image);
                match (video, image) {
                    (Some(v), Some(i)) => AssetGroup::new(GroupKind::MotionPhoto, vec![v, i]),
                    (Some(a), None) | (None, Some(a)) => AssetGroup::single(a),
                    (None, None) => return None,
                }
            }
            (Some(file), None) | (None, Some(file)) => AssetGroup::single(self.make_asset(dir, &file)?),
            (None, None) => return None,
        };

        if let Err(e) = group.validate() {
            log::warn!("Dropping group in {}: {}", dir, e);
            return None;
        }
        Some(group)
    }

    /// Build the asset of a matched file, or None when a policy drops it
    pub fn make_asset(&mut self, dir: &str, file: &AssetFile) -> Option<LogicalAsset> {
        let key = file.key();
        let md = match self.filter_on_metadata(file) {
            Ok(md) => md,
            Err(status) => {
                self.tracker.entry(key).or_default().status = status;
                return None;
            }
        };

        if let Some(from_album) = &self.options.from_album {
            let in_album = self.albums.get(dir).map(|a| &a.title == from_album).unwrap_or(false);
            if !in_album {
                self.recorder.record(
                    EventCode::DiscoveredDiscarded,
                    &file.file,
                    &[("reason", "discarding files not in the specified album")],
                );
                self.tracker.entry(key).or_default().status = TrackStatus::Discarded;
                return None;
            }
        }

        let albums = self.albums_of(file, &md);

        let title = if md.file_name.is_empty() {
            file.base.clone()
        } else {
            reconcile_title(&md.file_name, &file.base)
        };

        let (mut latitude, mut longitude) = (md.latitude, md.longitude);
        if !md.has_location() {
            if let Some(album) = albums.iter().find(|a| a.has_location()) {
                latitude = album.latitude;
                longitude = album.longitude;
            }
        }

        let asset = LogicalAsset {
            file: file.file.clone(),
            size: file.size,
            file_date: file.modified,
            title,
            description: md.description.clone(),
            capture_date: md.date_taken,
            latitude,
            longitude,
            trashed: md.trashed,
            archived: md.archived,
            favorite: md.favorited,
            from_partner: md.from_partner,
            stars: md.stars,
            albums,
            name: self.ic.get_info(&file.base),
        };

        let tracked = self.tracker.entry(key).or_default();
        tracked.metadata = Some(md);
        tracked.status = TrackStatus::Emitted;
        self.recorder.record(EventCode::Emitted, &file.file, &[("title", asset.title.as_str())]);
        Some(asset)
    }

    /// Sidecar flags first, then the metadata reader for files without
    /// sidecar, then the date range
    fn filter_on_metadata(&self, file: &AssetFile) -> std::result::Result<Metadata, TrackStatus> {
        let md = match &file.metadata {
            Some(md) => {
                let reason = if md.archived && !self.options.keep_archived {
                    Some("discarding archived file")
                } else if md.from_partner && !self.options.keep_partner {
                    Some("discarding partner file")
                } else if md.trashed && !self.options.keep_trashed {
                    Some("discarding trashed file")
                } else {
                    None
                };
                if let Some(reason) = reason {
                    self.recorder.record(EventCode::DiscoveredDiscarded, &file.file, &[("reason", reason)]);
                    return Err(TrackStatus::Discarded);
                }
                md.clone()
            }
            None => match self.reader.read(&file.file, self.options.date_method) {
                Ok(md) => md,
                Err(e) => {
                    let msg = e.to_string();
                    self.recorder.record(EventCode::Error, &file.file, &[("error", msg.as_str())]);
                    return Err(TrackStatus::Error);
                }
            },
        };

        if !self.options.date_range.in_range(md.date_taken) {
            self.recorder.record(
                EventCode::DiscoveredDiscarded,
                &file.file,
                &[("reason", "discarding files out of date range")],
            );
            return Err(TrackStatus::Discarded);
        }
        Ok(md)
    }

    /// Albums an asset goes to: the forced album, or every album folder
    /// holding a copy of the file, plus the partner album
    fn albums_of(&self, file: &AssetFile, md: &Metadata) -> Vec<Album> {
        let mut albums = Vec::new();
        if !self.options.create_albums {
            return albums;
        }

        if let Some(into) = &self.options.into_album {
            albums.push(Album::named(into.clone()));
        } else if let Some(tracked) = self.tracker.get(&file.key()) {
            for path in &tracked.paths {
                let Some(album) = self.albums.get(path) else {
                    continue;
                };
                if albums.iter().any(|a: &Album| a.path == *path) {
                    continue;
                }
                let mut album = album.clone();
                if album.title.is_empty() {
                    if !self.options.keep_untitled {
                        continue;
                    }
                    album.title = split_path(path).1.to_string();
                }
                albums.push(album);
            }
        }

        if let Some(partner) = &self.options.partner_shared_album {
            if md.from_partner {
                albums.push(Album::named(partner.clone()));
            }
        }
        albums
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reconcile_title() {
        assert_eq!(reconcile_title("IMG_1.JPG", "IMG_1.JPG"), "IMG_1.JPG");
        assert_eq!(reconcile_title("IMG_1.HEIC", "IMG_1.JPG"), "IMG_1.JPG");
        assert_eq!(reconcile_title("PXL_1.MP.jpg", "PXL_1.mp4"), "PXL_1.mp4");
        assert_eq!(reconcile_title("Holiday.jpg.jpg", "IMG_1.jpg"), "Holiday.jpg.jpg");
        assert_eq!(reconcile_title("Holiday.jpg.json", "IMG_1.jpg"), "Holiday.jpg");
        assert_eq!(reconcile_title("Beach sunset", "IMG_1.jpg"), "Beach sunset.jpg");
    }
}
