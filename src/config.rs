// Import options
//
// Options are read from an optional JSON file (camelCase keys, every key
// optional) and then overridden from the command line.

use std::path::{Path, PathBuf};
use chrono::{DateTime, FixedOffset, Local, Months, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::constants::{CONFIG_FILENAME, DEFAULT_BANNED_FILES, DEFAULT_CHANNEL_CAPACITY};
use crate::error::{Result, TakeoutError};

/// Where capture dates come from for files without a sidecar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum DateMethod {
    None,
    Filename,
    Exif,
    ExifFilename,
    #[default]
    FilenameExif,
}

impl std::str::FromStr for DateMethod {
    type Err = TakeoutError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "none" => Ok(DateMethod::None),
            "filename" => Ok(DateMethod::Filename),
            "exif" => Ok(DateMethod::Exif),
            "exif-filename" => Ok(DateMethod::ExifFilename),
            "filename-exif" => Ok(DateMethod::FilenameExif),
            other => Err(TakeoutError::InvalidConfig(format!("unknown date method: {}", other))),
        }
    }
}

/// Range of capture days: start inclusive, end exclusive.
/// An unset range accepts everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DateRange {
    text: String,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
}

impl DateRange {
    /// Parse `YYYY`, `YYYY-MM`, `YYYY-MM-DD` or `start,end` with either form
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(Self::default());
        }
        let (start, end) = match s.split_once(',') {
            Some((a, b)) => (parse_period(a.trim())?.0, parse_period(b.trim())?.1),
            None => parse_period(s)?,
        };
        if end <= start {
            return Err(TakeoutError::InvalidConfig(format!("empty date range: {}", s)));
        }
        Ok(Self {
            text: s.to_string(),
            start: Some(start),
            end: Some(end),
        })
    }

    pub fn is_set(&self) -> bool {
        self.start.is_some() || self.end.is_some()
    }

    /// Check a capture date, compared on its own calendar day
    pub fn in_range(&self, date: Option<DateTime<FixedOffset>>) -> bool {
        if !self.is_set() {
            return true;
        }
        let Some(date) = date else {
            return false;
        };
        let day = date.date_naive();
        self.start.map(|s| day >= s).unwrap_or(true) && self.end.map(|e| day < e).unwrap_or(true)
    }
}

/// First day of the period and first day after it
fn parse_period(s: &str) -> Result<(NaiveDate, NaiveDate)> {
    let invalid = || TakeoutError::InvalidConfig(format!("invalid date: {}", s));
    let parts: Vec<&str> = s.split('-').collect();
    let nums = parts
        .iter()
        .map(|p| p.parse::<u32>().map_err(|_| invalid()))
        .collect::<Result<Vec<u32>>>()?;

    match nums.as_slice() {
        [y] => {
            let start = NaiveDate::from_ymd_opt(*y as i32, 1, 1).ok_or_else(invalid)?;
            Ok((start, start.checked_add_months(Months::new(12)).ok_or_else(invalid)?))
        }
        [y, m] => {
            let start = NaiveDate::from_ymd_opt(*y as i32, *m, 1).ok_or_else(invalid)?;
            Ok((start, start.checked_add_months(Months::new(1)).ok_or_else(invalid)?))
        }
        [y, m, d] => {
            let start = NaiveDate::from_ymd_opt(*y as i32, *m, *d).ok_or_else(invalid)?;
            Ok((start, start.succ_opt().ok_or_else(invalid)?))
        }
        _ => Err(invalid()),
    }
}

impl TryFrom<String> for DateRange {
    type Error = TakeoutError;

    fn try_from(s: String) -> Result<Self> {
        DateRange::parse(&s)
    }
}

impl From<DateRange> for String {
    fn from(r: DateRange) -> String {
        r.text
    }
}

/// Zone of the wall-clock times found in names and EXIF data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    /// System zone, with the offset in force on each date
    Local,
    Fixed(FixedOffset),
}

impl Zone {
    /// Place a wall-clock time in the zone. An ambiguous time takes its
    /// earliest reading; a time skipped by a clock change has none.
    pub fn from_local(&self, naive: &NaiveDateTime) -> Option<DateTime<FixedOffset>> {
        match self {
            Zone::Local => Local.from_local_datetime(naive).earliest().map(|t| t.fixed_offset()),
            Zone::Fixed(tz) => tz.from_local_datetime(naive).single(),
        }
    }

    pub fn from_utc(&self, utc: DateTime<Utc>) -> DateTime<FixedOffset> {
        match self {
            Zone::Local => utc.with_timezone(&Local).fixed_offset(),
            Zone::Fixed(tz) => utc.with_timezone(tz),
        }
    }
}

/// Parse `local`, `UTC` or a `±HH:MM` offset
pub fn parse_time_zone(s: &str) -> Result<Zone> {
    let s = s.trim();
    match s.to_lowercase().as_str() {
        "" | "local" => return Ok(Zone::Local),
        "utc" | "z" => return Ok(Zone::Fixed(Utc.fix())),
        _ => {}
    }
    let invalid = || TakeoutError::InvalidConfig(format!("invalid time zone: {}", s));
    let (sign, rest) = match s.as_bytes()[0] {
        b'+' => (1, &s[1..]),
        b'-' => (-1, &s[1..]),
        _ => return Err(invalid()),
    };
    let (h, m) = rest.split_once(':').unwrap_or((rest, "0"));
    let h: i32 = h.parse().map_err(|_| invalid())?;
    let m: i32 = m.parse().map_err(|_| invalid())?;
    if h > 14 || m > 59 {
        return Err(invalid());
    }
    FixedOffset::east_opt(sign * (h * 3600 + m * 60))
        .map(Zone::Fixed)
        .ok_or_else(invalid)
}

/// Compiled banned-name patterns, matched against slash separated paths
#[derive(Debug, Clone)]
pub struct BannedFiles {
    patterns: Vec<Regex>,
}

impl BannedFiles {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|p| {
                Regex::new(p.as_ref())
                    .map_err(|e| TakeoutError::InvalidConfig(format!("banned file pattern {}: {}", p.as_ref(), e)))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    pub fn is_match(&self, path: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(path))
    }
}

/// All knobs of an import run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImportOptions {
    /// Keep albums without a title (named after their folder)
    pub keep_untitled: bool,
    pub keep_archived: bool,
    pub keep_partner: bool,
    pub keep_trashed: bool,
    /// Keep media files for which no sidecar was found
    pub keep_json_less: bool,

    pub create_albums: bool,
    /// Only import files found in this album
    pub from_album: Option<String>,
    /// Put every asset into this album instead of the takeout albums
    pub into_album: Option<String>,
    /// Album receiving assets shared by a partner
    pub partner_shared_album: Option<String>,

    /// Empty means every supported extension
    pub included_extensions: Vec<String>,
    pub excluded_extensions: Vec<String>,
    pub banned_files: Vec<String>,
    pub date_range: DateRange,

    pub date_method: DateMethod,
    pub time_zone: String,
    pub use_exif_tool: bool,
    pub channel_capacity: usize,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            keep_untitled: false,
            keep_archived: true,
            keep_partner: true,
            keep_trashed: false,
            keep_json_less: false,
            create_albums: true,
            from_album: None,
            into_album: None,
            partner_shared_album: None,
            included_extensions: Vec::new(),
            excluded_extensions: Vec::new(),
            banned_files: DEFAULT_BANNED_FILES.iter().map(|s| s.to_string()).collect(),
            date_range: DateRange::default(),
            date_method: DateMethod::default(),
            time_zone: "local".to_string(),
            use_exif_tool: false,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

fn normalize_ext(ext: &str) -> String {
    let ext = ext.trim().to_lowercase();
    if ext.starts_with('.') {
        ext
    } else {
        format!(".{}", ext)
    }
}

impl ImportOptions {
    /// Default location of the options file
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "takeout-puzzle")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILENAME))
    }

    /// Read options from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => TakeoutError::FileNotFound(path.display().to_string()),
            _ => TakeoutError::Io(e),
        })?;
        let options: ImportOptions = serde_json::from_str(&content)?;
        options.validate()?;
        log::debug!("Loaded options from {}", path.display());
        Ok(options)
    }

    /// Read the given file, else the default file when present, else defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(p) if p.is_file() => Self::load(&p),
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.time_zone()?;
        self.banned()?;
        if self.channel_capacity == 0 {
            return Err(TakeoutError::InvalidConfig("channelCapacity must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn time_zone(&self) -> Result<Zone> {
        parse_time_zone(&self.time_zone)
    }

    pub fn banned(&self) -> Result<BannedFiles> {
        BannedFiles::new(&self.banned_files)
    }

    /// True when the extension passes the include list
    pub fn includes(&self, ext: &str) -> bool {
        if self.included_extensions.is_empty() {
            return true;
        }
        let ext = normalize_ext(ext);
        self.included_extensions.iter().any(|e| normalize_ext(e) == ext)
    }

    /// True when the extension is on the exclude list
    pub fn excludes(&self, ext: &str) -> bool {
        let ext = normalize_ext(ext);
        self.excluded_extensions.iter().any(|e| normalize_ext(e) == ext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    #[test]
    fn test_date_range_forms() {
        let tz = FixedOffset::east_opt(0).unwrap();
        let at = |y, m, d| Some(tz.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap());

        let year = DateRange::parse("2023").unwrap();
        assert!(year.in_range(at(2023, 1, 1)));
        assert!(year.in_range(at(2023, 12, 31)));
        assert!(!year.in_range(at(2024, 1, 1)));

        let month = DateRange::parse("2023-02").unwrap();
        assert!(month.in_range(at(2023, 2, 28)));
        assert!(!month.in_range(at(2023, 3, 1)));

        let span = DateRange::parse("2022-12-30,2023-01-02").unwrap();
        assert!(span.in_range(at(2022, 12, 30)));
        assert!(span.in_range(at(2023, 1, 2)));
        assert!(!span.in_range(at(2023, 1, 3)));
        assert!(!span.in_range(None));

        assert!(DateRange::default().in_range(None));
        assert!(DateRange::parse("2023-13").is_err());
        assert!(DateRange::parse("2024,2023").is_err());
    }

    fn fixed(secs: i32) -> Zone {
        Zone::Fixed(FixedOffset::east_opt(secs).unwrap())
    }

    #[test]
    fn test_time_zone() {
        assert_eq!(parse_time_zone("UTC").unwrap(), fixed(0));
        assert_eq!(parse_time_zone("+02:00").unwrap(), fixed(7200));
        assert_eq!(parse_time_zone("-05:30").unwrap(), fixed(-19800));
        assert!(parse_time_zone("Europe/Paris").is_err());
        assert_eq!(parse_time_zone("local").unwrap(), Zone::Local);
    }

    #[test]
    fn test_fixed_zone_conversions() {
        let zone = fixed(3600);
        let naive = NaiveDate::from_ymd_opt(2023, 7, 15).unwrap().and_hms_opt(10, 16, 5).unwrap();
        let t = zone.from_local(&naive).unwrap();
        assert_eq!(t.naive_local(), naive);
        assert_eq!(t.offset().local_minus_utc(), 3600);

        let utc = Utc.with_ymd_and_hms(2023, 1, 15, 9, 16, 5).unwrap();
        assert_eq!(zone.from_utc(utc).naive_local(), NaiveDate::from_ymd_opt(2023, 1, 15).unwrap().and_hms_opt(10, 16, 5).unwrap());
    }

    #[test]
    fn test_extension_lists() {
        let mut opts = ImportOptions::default();
        assert!(opts.includes(".jpg"));
        opts.included_extensions = vec!["JPG".to_string(), ".heic".to_string()];
        opts.excluded_extensions = vec!["mp4".to_string()];
        assert!(opts.includes(".jpg"));
        assert!(opts.includes(".HEIC"));
        assert!(!opts.includes(".png"));
        assert!(opts.excludes(".MP4"));
        assert!(!opts.excludes(".jpg"));
    }

    #[test]
    fn test_default_banned_files() {
        let banned = ImportOptions::default().banned().unwrap();
        assert!(banned.is_match("Takeout/@eaDir/IMG_1.JPG/SYNOFILE_THUMB_M.jpg"));
        assert!(banned.is_match("Takeout/Photos/.DS_Store"));
        assert!(banned.is_match("Takeout/Photos/._IMG_1.JPG"));
        assert!(!banned.is_match("Takeout/Photos/IMG_1.JPG"));
    }

    #[test]
    fn test_load_partial_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILENAME);
        std::fs::write(&path, r#"{"keepJsonLess": true, "dateRange": "2023", "dateMethod": "exif-filename", "timeZone": "+01:00"}"#).unwrap();

        let opts = ImportOptions::load(&path).unwrap();
        assert!(opts.keep_json_less);
        assert!(opts.date_range.is_set());
        assert_eq!(opts.date_method, DateMethod::ExifFilename);
        assert_eq!(opts.time_zone().unwrap(), fixed(3600));
        assert!(opts.create_albums);
        assert_eq!(opts.channel_capacity, DEFAULT_CHANNEL_CAPACITY);
    }

    #[test]
    fn test_load_rejects_bad_values() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILENAME);
        std::fs::write(&path, r#"{"bannedFiles": ["("]}"#).unwrap();
        assert!(matches!(ImportOptions::load(&path), Err(TakeoutError::InvalidConfig(_))));

        std::fs::write(&path, r#"{"dateRange": "yesterday"}"#).unwrap();
        assert!(matches!(ImportOptions::load(&path), Err(TakeoutError::Json(_))));

        assert!(matches!(
            ImportOptions::load(&temp.path().join("missing.json")),
            Err(TakeoutError::FileNotFound(_))
        ));
    }
}
