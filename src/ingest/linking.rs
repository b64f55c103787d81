// Motion photo linking
//
// A still and a video sharing the same stem are two halves of one live
// capture. Pixel motion photos name the still PXL_x.MP.jpg (or .MP~2.jpg)
// and the video PXL_x.MP.

use std::collections::BTreeMap;

use crate::constants::MOTION_PHOTO_MARKER;
use crate::events::EventCode;
use crate::filetypes::{split_ext, MediaType, SupportedMedia};
use crate::source::join_path;
use super::{FileKey, Takeout, TrackStatus};

/// Matched files of a directory that belong together, by base name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkedPair {
    pub image: Option<String>,
    pub video: Option<String>,
}

fn is_motion_marker(ext: &str) -> bool {
    let upper = ext.to_uppercase();
    upper == MOTION_PHOTO_MARKER || upper.starts_with(&format!("{}~", MOTION_PHOTO_MARKER))
}

/// Pair images with videos. Every image opens a pair keyed by its name; a
/// video joins the first open pair (in key order) with the same stem, or
/// gets a pair of its own. Other names are ignored.
pub fn link_files<'a, I>(names: I, sm: &SupportedMedia) -> BTreeMap<String, LinkedPair>
where
    I: IntoIterator<Item = &'a str>,
{
    let names: Vec<&str> = names.into_iter().collect();
    let mut pairs: BTreeMap<String, LinkedPair> = BTreeMap::new();

    for name in &names {
        if sm.type_from_ext(split_ext(name).1) == MediaType::Image {
            pairs.entry(name.to_string()).or_default().image = Some(name.to_string());
        }
    }

    'videos: for name in &names {
        let (video_stem, video_ext) = split_ext(name);
        if sm.type_from_ext(video_ext) != MediaType::Video {
            continue;
        }
        for pair in pairs.values_mut() {
            let Some(image) = &pair.image else {
                continue;
            };
            if pair.video.is_some() {
                continue;
            }
            let mut stem = split_ext(image).0;
            let (inner, marker) = split_ext(stem);
            if is_motion_marker(marker) {
                if marker != video_ext {
                    continue;
                }
                stem = inner;
            }
            if stem == video_stem {
                pair.video = Some(name.to_string());
                continue 'videos;
            }
        }
        pairs.entry(name.to_string()).or_default().video = Some(name.to_string());
    }
    pairs
}

impl Takeout {
    /// Link the matched files of a directory, leaving out files already
    /// emitted from another directory.
    pub fn link_motion(&self, dir: &str) -> BTreeMap<String, LinkedPair> {
        let Some(cat) = self.catalogs.get(dir) else {
            return BTreeMap::new();
        };

        let mut names = Vec::with_capacity(cat.matched.len());
        for (name, file) in &cat.matched {
            let key = FileKey::new(&file.base, file.size);
            let emitted = self.tracker.get(&key).map(|t| t.status == TrackStatus::Emitted).unwrap_or(false);
            if emitted {
                self.recorder.record(
                    EventCode::AnalysisLocalDuplicate,
                    join_path(dir, name),
                    &[("reason", "local duplicate")],
                );
                continue;
            }
            names.push(name.as_str());
        }
        link_files(names, &self.ic.sm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(names: &[&str]) -> BTreeMap<String, LinkedPair> {
        link_files(names.iter().copied(), &SupportedMedia::default())
    }

    fn pair(image: Option<&str>, video: Option<&str>) -> LinkedPair {
        LinkedPair {
            image: image.map(String::from),
            video: video.map(String::from),
        }
    }

    #[test]
    fn test_live_photo() {
        let pairs = link(&["IMG_1.HEIC", "IMG_1.MOV", "IMG_2.JPG"]);
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs["IMG_1.HEIC"], pair(Some("IMG_1.HEIC"), Some("IMG_1.MOV")));
        assert_eq!(pairs["IMG_2.JPG"], pair(Some("IMG_2.JPG"), None));
    }

    #[test]
    fn test_pixel_motion_photo() {
        let pairs = link(&["PXL_20220405_090123740.MP.jpg", "PXL_20220405_090123740.MP"]);
        assert_eq!(pairs.len(), 1);
        assert_eq!(
            pairs["PXL_20220405_090123740.MP.jpg"],
            pair(Some("PXL_20220405_090123740.MP.jpg"), Some("PXL_20220405_090123740.MP"))
        );

        let pairs = link(&["PXL_20220405_090123740.MP~2.jpg", "PXL_20220405_090123740.mp4"]);
        assert_eq!(pairs.len(), 2);
    }

    #[test]
    fn test_standalone_video() {
        let pairs = link(&["VID_1.MP4", "IMG_1.JPG"]);
        assert_eq!(pairs["VID_1.MP4"], pair(None, Some("VID_1.MP4")));
        assert_eq!(pairs["IMG_1.JPG"], pair(Some("IMG_1.JPG"), None));
    }

    #[test]
    fn test_one_video_per_image() {
        // both stills share the stem; the first in key order gets the video
        let pairs = link(&["IMG_1.HEIC", "IMG_1.JPG", "IMG_1.MP4"]);
        assert_eq!(pairs["IMG_1.HEIC"].video.as_deref(), Some("IMG_1.MP4"));
        assert_eq!(pairs["IMG_1.JPG"].video, None);
    }
}
