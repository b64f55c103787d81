// Sidecar / media file association rules
//
// The export renames files in several ways: long names are truncated (one
// character may be lost), duplicates get a "(n)" counter placed differently
// on the sidecar and on the media file, edited copies get a localized
// suffix, live photo companions share the sidecar of the still image.
// Each rule is a predicate on (sidecar name, media name). Rules are applied
// from the most common to the least common.

use tokio_util::sync::CancellationToken;

use crate::constants::{EDITED_SUFFIXES, FORGOTTEN_DUPLICATE_MAX_EXTRA_CHARS};
use crate::error::Result;
use crate::events::EventCode;
use crate::filetypes::{split_ext, strip_ext, SupportedMedia};
use crate::source::join_path;
use super::sidecar::{json_base, split_counter};
use super::Takeout;

pub type MatchFn = fn(json: &str, file: &str, sm: &SupportedMedia) -> bool;

pub struct Matcher {
    pub name: &'static str,
    pub matches: MatchFn,
}

/// Rules from the most likely to the least likely
pub const MATCHERS: [Matcher; 7] = [
    Matcher { name: "normal", matches: normal_match },
    Matcher { name: "live-photo", matches: live_photo_match },
    Matcher { name: "one-char-omitted", matches: match_with_one_char_omitted },
    Matcher { name: "very-long-name-with-number", matches: match_very_long_name_with_number },
    Matcher { name: "duplicate-in-year", matches: match_duplicate_in_year },
    Matcher { name: "edited-name", matches: match_edited_name },
    Matcher { name: "forgotten-duplicates", matches: match_forgotten_duplicates },
];

/// IMG_1.JPG.json <-> IMG_1.JPG
pub fn normal_match(json: &str, file: &str, _sm: &SupportedMedia) -> bool {
    json_base(json) == file
}

/// IMG_1.HEIC.json <-> IMG_1.MP4, PXL_1.MP.jpg.json <-> PXL_1.mp4
pub fn live_photo_match(json: &str, file: &str, _sm: &SupportedMedia) -> bool {
    let stem = strip_ext(file);
    let base = json_base(json);
    let base = strip_ext(&base);
    if base == stem {
        return true;
    }
    let base = strip_ext(base);
    !base.is_empty() && base == stem
}

/// Truncated names: 1234567890123456789012345678901234567890123456.json <->
/// 12345678901234567890123456789012345678901234567.jpg, or a truncated
/// extension (PXL_20221230_17383.jp.json)
pub fn match_with_one_char_omitted(json: &str, file: &str, sm: &SupportedMedia) -> bool {
    let base = json_base(json);
    let (stem, ext) = split_ext(&base);
    let base = if sm.is_extension_prefix(ext) { stem } else { base.as_str() };
    if base.is_empty() {
        return false;
    }

    let file_stem = strip_ext(file);
    if file_stem == base {
        return true;
    }
    file_stem.starts_with(base) && file_stem.chars().count() - base.chars().count() <= 1
}

/// Truncated name followed by a counter on both sides:
/// Backyard_Sunset_Wide_Angle_Lens_Test_2021_Fi(1).json <->
/// Backyard_Sunset_Wide_Angle_Lens_Test_2021_Fi(1).jpg
pub fn match_very_long_name_with_number(json: &str, file: &str, _sm: &SupportedMedia) -> bool {
    let base = json_base(json);
    let (prefix, Some(n)) = split_counter(&base) else {
        return false;
    };
    if file.find('(') != Some(prefix.len()) || !file.starts_with(prefix) {
        return false;
    }
    file[prefix.len() + 1..]
        .split_once(')')
        .map(|(file_n, _)| file_n == n)
        .unwrap_or(false)
}

/// Duplicate names inside a year folder:
/// IMG_3479.JPG(2).json <-> IMG_3479(2).JPG
pub fn match_duplicate_in_year(json: &str, file: &str, _sm: &SupportedMedia) -> bool {
    let base = json_base(json);
    let (named, Some(n)) = split_counter(&base) else {
        return false;
    };
    let (json_stem, json_ext) = split_ext(named);
    if json_stem.is_empty() {
        return false;
    }
    let (file_stem, file_ext) = split_ext(file);
    if file_ext != json_ext {
        return false;
    }
    matches!(split_counter(file_stem), (s, Some(fn_)) if s == json_stem && fn_ == n)
}

/// Edited copies: IMG_1.JPG.json <-> IMG_1-edited.JPG
pub fn match_edited_name(json: &str, file: &str, sm: &SupportedMedia) -> bool {
    let base = json_base(json);
    let (json_stem, json_ext) = split_ext(&base);
    if json_stem.is_empty() || !sm.is_media(json_ext) {
        return false;
    }
    let (file_stem, file_ext) = split_ext(file);
    if !file_ext.eq_ignore_ascii_case(json_ext) {
        return false;
    }
    file_stem
        .strip_prefix(json_stem)
        .map(|suffix| EDITED_SUFFIXES.iter().any(|s| suffix.eq_ignore_ascii_case(s)))
        .unwrap_or(false)
}

/// Duplicates the export forgot to number consistently:
/// original_1d4caa6f-16c6-4c3d-901b-9387de10e528_.json <->
/// original_1d4caa6f-16c6-4c3d-901b-9387de10e528_P(1).jpg
pub fn match_forgotten_duplicates(json: &str, file: &str, _sm: &SupportedMedia) -> bool {
    let base = json_base(json);
    if base.is_empty() {
        return false;
    }
    let file_stem = strip_ext(file);
    file_stem.starts_with(&base)
        && file_stem.chars().count() - base.chars().count() <= FORGOTTEN_DUPLICATE_MAX_EXTRA_CHARS
}

impl Takeout {
    /// Associate sidecars with media files, directory by directory.
    ///
    /// Each file is bound to at most one sidecar; a sidecar may describe
    /// several files (live photo companions, edited copies). Running it
    /// again does not change any association.
    pub fn solve_puzzle(&mut self, cancel: &CancellationToken) -> Result<()> {
        let sm = self.ic.sm.clone();
        for (dir, cat) in self.catalogs.iter_mut() {
            for matcher in &MATCHERS {
                for (json, md) in &cat.sidecars {
                    let mut found = Vec::new();
                    for name in cat.unmatched.keys() {
                        Self::check_cancel(cancel)?;
                        if (matcher.matches)(json, name, &sm) {
                            found.push(name.clone());
                        }
                    }
                    for name in found {
                        if let Some(mut file) = cat.unmatched.remove(&name) {
                            file.metadata = Some(md.clone());
                            self.recorder.record(
                                EventCode::AnalysisAssociatedMetadata,
                                &file.file,
                                &[("json", json.as_str()), ("matcher", matcher.name)],
                            );
                            cat.matched.insert(name, file);
                        }
                    }
                }
            }

            let leftovers: Vec<String> = cat.unmatched.keys().cloned().collect();
            for name in leftovers {
                self.recorder.record(
                    EventCode::AnalysisMissingAssociatedMetadata,
                    join_path(dir, &name),
                    &[],
                );
                if self.options.keep_json_less {
                    if let Some(file) = cat.unmatched.remove(&name) {
                        cat.matched.insert(name, file);
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sm() -> SupportedMedia {
        SupportedMedia::default()
    }

    /// Name of the first rule that binds the pair
    fn first_match(json: &str, file: &str) -> Option<&'static str> {
        MATCHERS.iter().find(|m| (m.matches)(json, file, &sm())).map(|m| m.name)
    }

    #[test]
    fn test_rule_order() {
        assert_eq!(first_match("IMG_1.JPG.json", "IMG_1.JPG"), Some("normal"));
        assert_eq!(first_match("IMG_1.JPG.supplemental-metadata.json", "IMG_1.JPG"), Some("normal"));
        assert_eq!(first_match("IMG_1.HEIC.json", "IMG_1.MP4"), Some("live-photo"));
        assert_eq!(first_match("PXL_20220405_090123740.MP.jpg.json", "PXL_20220405_090123740.mp4"), Some("live-photo"));
        assert_eq!(
            first_match("original_0c9ac4bd-3cfe-4f9b-bc6a-bf1a7f3e2b5_P.jpg.json", "original_0c9ac4bd-3cfe-4f9b-bc6a-bf1a7f3e2b5_P.jpg"),
            Some("normal")
        );
        assert_eq!(first_match("PXL_20221230_17381234.jp.json", "PXL_20221230_173812345.jpg"), Some("one-char-omitted"));
        assert_eq!(first_match("Backyard_Sunset_Wide_Angle_Lens_Test_2021_Fin.json", "Backyard_Sunset_Wide_Angle_Lens_Test_2021_Fina.jpg"), Some("one-char-omitted"));
        assert_eq!(first_match("Backyard_Sunset_Wide_Angle_Lens_Test_2021_Fi(1).json", "Backyard_Sunset_Wide_Angle_Lens_Test_2021_Fi(1).MP.jpg"), Some("very-long-name-with-number"));
        // same counter on both sides and nothing after it: the companion rule binds first
        assert_eq!(first_match("Backyard_Sunset_Wide_Angle_Lens_Test_2021_Fi(1).json", "Backyard_Sunset_Wide_Angle_Lens_Test_2021_Fi(1).jpg"), Some("live-photo"));
        assert_eq!(first_match("IMG_3479.JPG(2).json", "IMG_3479(2).JPG"), Some("duplicate-in-year"));
        assert_eq!(first_match("IMG_3479.JPG.supplemental-metadata(2).json", "IMG_3479(2).JPG"), Some("duplicate-in-year"));
        assert_eq!(first_match("IMG_1.JPG.json", "IMG_1-edited.JPG"), Some("edited-name"));
        assert_eq!(first_match("IMG_1.JPG.json", "IMG_1-bearbeitet.jpg"), Some("edited-name"));
        assert_eq!(
            first_match("original_1d4caa6f-16c6-4c3d-901b-9387de10e528_.json", "original_1d4caa6f-16c6-4c3d-901b-9387de10e528_P(1).jpg"),
            Some("forgotten-duplicates")
        );
    }

    #[test]
    fn test_no_false_friends() {
        assert_eq!(first_match("IMG_1.JPG.json", "IMG_2.JPG"), None);
        assert_eq!(first_match("IMG_3479.JPG(2).json", "IMG_3479(3).JPG"), None);
        assert_eq!(first_match("IMG_3479.JPG(2).json", "IMG_3479(2).PNG"), None);
        assert!(!match_edited_name("IMG_1.JPG.json", "IMG_1-edited.PNG", &sm()));
        assert!(!match_edited_name("IMG_1.JPG.json", "IMG_1-copy.JPG", &sm()));
        assert!(!match_with_one_char_omitted("IMG_1.JPG.json", "IMG_1X.JPG", &sm()));
        assert!(!match_very_long_name_with_number("abc(1).json", "abd(1).jpg", &sm()));
        assert!(!match_forgotten_duplicates("IMG.json", "IMG_with_a_very_long_tail.jpg", &sm()));
    }
}
