// File name classifier
//
// Vendors encode the capture time, and for bursts a shared identifier and a
// sequence number, in the file name. The classifier recognises those schemes
// so that related files can be grouped without reading their content.

mod nexus;
mod pixel;
mod samsung;

use std::sync::LazyLock;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use serde::Serialize;

use crate::config::Zone;
use crate::filetypes::{split_ext, MediaType, SupportedMedia};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NameKind {
    #[default]
    Plain,
    Burst,
}

/// Naming information derived from a file base name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameInfo {
    /// Part of the name shared by all files of one capture event
    pub radical: String,
    pub base: String,
    /// Lower case, with the leading dot
    pub ext: String,
    pub media_type: MediaType,
    pub kind: NameKind,
    pub is_cover: bool,
    pub index: u32,
    pub taken: Option<DateTime<FixedOffset>>,
}

impl NameInfo {
    /// Naming information for a name no scheme recognises.
    /// The stem still serves as radical so same-named files group together.
    pub fn fallback(name: &str, sm: &SupportedMedia) -> Self {
        let (stem, ext) = split_ext(name);
        NameInfo {
            radical: stem.to_string(),
            base: name.to_string(),
            ext: ext.to_lowercase(),
            media_type: sm.type_from_ext(ext),
            kind: NameKind::Plain,
            is_cover: false,
            index: 0,
            taken: None,
        }
    }
}

/// Result of trying one naming scheme
#[derive(Debug)]
pub(crate) enum Recognition {
    /// The pattern does not apply, try the next scheme
    NoMatch,
    /// The pattern applies but its fields are invalid; classification fails
    Rejected,
    Recognized(NameInfo),
}

type Scheme = fn(&InfoCollector, &str) -> Recognition;

/// Schemes from the most specific to the loosest
const SCHEMES: [(&str, Scheme); 4] = [
    ("nexus-burst", nexus::recognize),
    ("samsung-burst", samsung::recognize),
    ("pixel", pixel::recognize),
    ("plain", recognize_plain),
];

/// Classifies file names in a reference time zone
#[derive(Debug, Clone)]
pub struct InfoCollector {
    pub tz: Zone,
    pub sm: SupportedMedia,
}

impl InfoCollector {
    pub fn new(tz: Zone, sm: SupportedMedia) -> Self {
        Self { tz, sm }
    }

    /// Recognise the first matching naming scheme.
    /// Returns None when no scheme applies or when the matching scheme
    /// carries an impossible date.
    pub fn classify(&self, name: &str) -> Option<NameInfo> {
        for (scheme, recognize) in SCHEMES {
            match recognize(self, name) {
                Recognition::NoMatch => continue,
                Recognition::Rejected => {
                    log::debug!("{} matched {} but its fields are invalid", scheme, name);
                    return None;
                }
                Recognition::Recognized(info) => return Some(info),
            }
        }
        None
    }

    /// Classify, falling back to stem-only information
    pub fn get_info(&self, name: &str) -> NameInfo {
        self.classify(name)
            .unwrap_or_else(|| NameInfo::fallback(name, &self.sm))
    }

    pub(crate) fn info(
        &self,
        name: &str,
        radical: String,
        kind: NameKind,
        index: u32,
        is_cover: bool,
        taken: DateTime<FixedOffset>,
    ) -> NameInfo {
        let ext = split_ext(name).1;
        NameInfo {
            radical,
            base: name.to_string(),
            ext: ext.to_lowercase(),
            media_type: self.sm.type_from_ext(ext),
            kind,
            is_cover,
            index,
            taken: Some(taken),
        }
    }

    /// Decode YYYYMMDD and HHMMSS digits as wall-clock time in the collector's zone
    pub(crate) fn local_time(&self, date: &str, time: &str) -> Option<DateTime<FixedOffset>> {
        let naive = parse_digits(date, time)?;
        self.tz.from_local(&naive)
    }

    /// Decode YYYYMMDD and HHMMSS digits as UTC, expressed in the collector's zone
    pub(crate) fn utc_time(&self, date: &str, time: &str) -> Option<DateTime<FixedOffset>> {
        let naive = parse_digits(date, time)?;
        Some(self.tz.from_utc(naive.and_utc()))
    }
}

fn parse_digits(date: &str, time: &str) -> Option<NaiveDateTime> {
    if date.len() != 8 || time.len() != 6 {
        return None;
    }
    let year = date[0..4].parse().ok()?;
    let month = date[4..6].parse().ok()?;
    let day = date[6..8].parse().ok()?;
    let hour = time[0..2].parse().ok()?;
    let minute = time[2..4].parse().ok()?;
    let second = time[4..6].parse().ok()?;
    let d = NaiveDate::from_ymd_opt(year, month, day)?;
    let t = NaiveTime::from_hms_opt(hour, minute, second)?;
    Some(NaiveDateTime::new(d, t))
}

// IMG_20171111_030128.jpg, VID_20190101_101010.mp4, 20231207_101605.jpg
static PLAIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:.*?[_-])?(\d{8})[_-](\d{6})(?:\D.*)?$").unwrap()
});

fn recognize_plain(ic: &InfoCollector, name: &str) -> Recognition {
    let stem = split_ext(name).0;
    let Some(caps) = PLAIN_RE.captures(stem) else {
        return Recognition::NoMatch;
    };
    match ic.local_time(&caps[1], &caps[2]) {
        Some(taken) => Recognition::Recognized(ic.info(name, stem.to_string(), NameKind::Plain, 0, false, taken)),
        None => Recognition::Rejected,
    }
}

#[cfg(test)]
pub(crate) fn test_offset() -> FixedOffset {
    FixedOffset::east_opt(3600).unwrap()
}

#[cfg(test)]
pub(crate) fn test_collector() -> InfoCollector {
    InfoCollector::new(Zone::Fixed(test_offset()), SupportedMedia::default())
}
