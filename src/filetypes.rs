// Media type detection by extension

use std::collections::HashMap;
use serde::{Deserialize, Serialize};
use crate::constants::{IMAGE_EXTENSIONS, RAW_EXTENSIONS, SIDECAR_EXTENSION, VIDEO_EXTENSIONS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
    Sidecar,
    #[default]
    Unknown,
}

/// Table of extensions the importer accepts.
/// Keys are lower case with the leading dot.
#[derive(Debug, Clone)]
pub struct SupportedMedia {
    types: HashMap<String, MediaType>,
}

impl Default for SupportedMedia {
    fn default() -> Self {
        let mut types = HashMap::new();
        for ext in IMAGE_EXTENSIONS.iter().chain(RAW_EXTENSIONS.iter()) {
            types.insert(ext.to_string(), MediaType::Image);
        }
        for ext in VIDEO_EXTENSIONS {
            types.insert(ext.to_string(), MediaType::Video);
        }
        types.insert(SIDECAR_EXTENSION.to_string(), MediaType::Sidecar);
        Self { types }
    }
}

impl SupportedMedia {
    pub fn type_from_ext(&self, ext: &str) -> MediaType {
        self.types
            .get(&ext.to_lowercase())
            .copied()
            .unwrap_or(MediaType::Unknown)
    }

    pub fn is_media(&self, ext: &str) -> bool {
        matches!(self.type_from_ext(ext), MediaType::Image | MediaType::Video)
    }

    /// True when `ext` is a strict prefix of a known media extension
    /// (".jp" for ".jpg"), which happens when the export truncates a name.
    pub fn is_extension_prefix(&self, ext: &str) -> bool {
        if ext.len() < 2 {
            return false;
        }
        let ext = ext.to_lowercase();
        self.types.iter().any(|(known, t)| {
            *t != MediaType::Sidecar && known.len() > ext.len() && known.starts_with(&ext)
        })
    }
}

/// Check whether the extension is a camera RAW format
pub fn is_raw_file(ext: &str) -> bool {
    RAW_EXTENSIONS.contains(&ext.to_lowercase().as_str())
}

/// Lower-cased extension of a slash separated name, with its leading dot.
/// Empty when the name has no extension.
pub fn ext_of(name: &str) -> String {
    split_ext(name).1.to_lowercase()
}

/// Split a file name into (stem, extension) where extension keeps its dot.
/// Only the last segment after '/' is considered.
pub fn split_ext(name: &str) -> (&str, &str) {
    let base_start = name.rfind('/').map(|p| p + 1).unwrap_or(0);
    match name[base_start..].rfind('.') {
        Some(0) | None => (name, ""),
        Some(p) => name.split_at(base_start + p),
    }
}

/// Name without its last extension
pub fn strip_ext(name: &str) -> &str {
    split_ext(name).0
}
