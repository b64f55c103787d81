// Google Photos JSON sidecars
//
// Asset sidecars carry a `url` key, album descriptors a `date` key. Only the
// presence of those keys matters.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer};

use crate::config::Zone;
use crate::constants::{SIDECAR_EXTENSION, SUPPLEMENTAL_METADATA};
use crate::filetypes::split_ext;
use crate::metadata::Metadata;

/// Deserialize to true whenever the key is present, whatever its value
fn present<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<bool, D::Error> {
    serde::de::IgnoredAny::deserialize(d)?;
    Ok(true)
}

/// Epoch seconds, written as a string by the export
fn timestamp<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<i64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StrOrNum {
        Str(String),
        Num(i64),
    }
    match StrOrNum::deserialize(d)? {
        StrOrNum::Num(n) => Ok(n),
        StrOrNum::Str(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GoogleTime {
    #[serde(deserialize_with = "timestamp")]
    pub timestamp: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GoogleGeoData {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GoogleOrigin {
    #[serde(deserialize_with = "present")]
    pub from_partner_sharing: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Enrichment {
    pub text: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// The fields of a sidecar the importer uses
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GoogleMetaData {
    pub title: String,
    pub description: String,
    #[serde(rename = "url", deserialize_with = "present")]
    pub url_present: bool,
    #[serde(rename = "date", deserialize_with = "present")]
    pub date_present: bool,
    pub photo_taken_time: GoogleTime,
    pub geo_data_exif: GoogleGeoData,
    pub trashed: bool,
    pub archived: bool,
    pub favorited: bool,
    pub google_photos_origin: GoogleOrigin,
    pub enrichments: Vec<Enrichment>,
}

impl GoogleMetaData {
    pub fn from_slice(data: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(data)
    }

    pub fn is_asset(&self) -> bool {
        self.url_present
    }

    pub fn is_album(&self) -> bool {
        self.date_present
    }

    pub fn is_partner(&self) -> bool {
        self.google_photos_origin.from_partner_sharing
    }

    /// Capture date in `tz`; a zero timestamp means unknown
    pub fn taken(&self, tz: Zone) -> Option<DateTime<FixedOffset>> {
        match self.photo_taken_time.timestamp {
            0 => None,
            ts => DateTime::from_timestamp(ts, 0).map(|t| tz.from_utc(t)),
        }
    }

    pub fn album_description(&self) -> String {
        self.enrichments
            .iter()
            .find(|e| !e.text.is_empty())
            .map(|e| e.text.clone())
            .unwrap_or_default()
    }

    pub fn album_location(&self) -> (f64, f64) {
        self.enrichments
            .iter()
            .find(|e| e.latitude != 0.0 || e.longitude != 0.0)
            .map(|e| (e.latitude, e.longitude))
            .unwrap_or((0.0, 0.0))
    }

    pub fn as_metadata(&self, tz: Zone) -> Metadata {
        Metadata {
            file_name: self.title.clone(),
            description: self.description.clone(),
            date_taken: self.taken(tz),
            latitude: self.geo_data_exif.latitude,
            longitude: self.geo_data_exif.longitude,
            altitude: self.geo_data_exif.altitude,
            trashed: self.trashed,
            archived: self.archived,
            favorited: self.favorited,
            from_partner: self.is_partner(),
            stars: 0,
        }
    }
}

/// Split a trailing "(n)" off a name
pub fn split_counter(name: &str) -> (&str, Option<&str>) {
    if let Some(stripped) = name.strip_suffix(')') {
        if let Some(p) = stripped.rfind('(') {
            let n = &stripped[p + 1..];
            if !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()) {
                return (&name[..p], Some(n));
            }
        }
    }
    (name, None)
}

/// Sidecar name reduced to the media name it describes:
/// the `.json` extension and the `.supplemental-metadata` infix (possibly
/// truncated) are removed, a duplicate counter is kept at the end.
///
///   IMG_1.JPG.json                           -> IMG_1.JPG
///   IMG_1.JPG(1).json                        -> IMG_1.JPG(1)
///   IMG_1.JPG.supplemental-metadata.json     -> IMG_1.JPG
///   IMG_1.JPG.supplemental-me.json           -> IMG_1.JPG
///   IMG_1.JPG.supplemental-metadata(2).json  -> IMG_1.JPG(2)
pub fn json_base(json: &str) -> String {
    let name = match json.len().checked_sub(SIDECAR_EXTENSION.len()) {
        Some(p) if json.is_char_boundary(p) && json[p..].eq_ignore_ascii_case(SIDECAR_EXTENSION) => &json[..p],
        _ => json,
    };

    let (body, counter) = split_counter(name);
    let (stem, ext) = split_ext(body);
    let infix = ext.trim_start_matches('.');
    let body = if !infix.is_empty() && !stem.is_empty() && SUPPLEMENTAL_METADATA.starts_with(&infix.to_lowercase()) {
        stem
    } else {
        body
    };

    match counter {
        Some(n) => format!("{}({})", body, n),
        None => body.to_string(),
    }
}
