// ExifTool wrapper for capture date and GPS extraction

use std::path::Path;
use std::process::Command;
use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone};
use serde::Serialize;

use crate::config::Zone;
use crate::error::{Result, TakeoutError};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExifMetadata {
    pub date_taken: Option<DateTime<FixedOffset>>,
    pub gps_latitude: Option<f64>,
    pub gps_longitude: Option<f64>,
    pub gps_altitude: Option<f64>,
}

/// Run exiftool (-j -G -n) on a file. Dates without an offset are read in `tz`.
pub fn extract(path: &Path, tz: Zone) -> Result<ExifMetadata> {
    let output = Command::new(crate::tools::exiftool_path())
        .args(["-j", "-G", "-n"])
        .arg(path)
        .output()
        .map_err(|e| TakeoutError::ExifTool(format!("Failed to run exiftool: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(TakeoutError::ExifTool(format!(
            "exiftool exited with {} on {}: {}",
            output.status.code().unwrap_or(-1),
            path.display(),
            stderr
        )));
    }

    let raw: serde_json::Value = serde_json::from_slice(&output.stdout)
        .map_err(|e| TakeoutError::ExifTool(format!("Failed to parse exiftool JSON: {}", e)))?;

    // exiftool returns an array; take the first element
    let dump = raw.as_array()
        .and_then(|a| a.first())
        .cloned()
        .unwrap_or(serde_json::Value::Object(serde_json::Map::new()));

    Ok(parse_fields(&dump, tz))
}

/// Parse the fields we need from a grouped -n dump
fn parse_fields(dump: &serde_json::Value, tz: Zone) -> ExifMetadata {
    let date = get_grouped_string(dump, "DateTimeOriginal")
        .or_else(|| get_grouped_string(dump, "CreateDate"))
        .or_else(|| get_grouped_string(dump, "MediaCreateDate"));

    ExifMetadata {
        date_taken: date.and_then(|d| parse_exif_date(&d, tz)),
        gps_latitude: get_grouped_number(dump, "GPSLatitude"),
        gps_longitude: get_grouped_number(dump, "GPSLongitude"),
        gps_altitude: get_grouped_number(dump, "GPSAltitude"),
    }
}

/// Get a string value from a grouped exiftool dump.
/// With -G, keys are "Group:TagName"; the EXIF group wins over the others.
fn get_grouped_string(dump: &serde_json::Value, tag: &str) -> Option<String> {
    let obj = dump.as_object()?;
    let exif_key = format!("EXIF:{}", tag);
    if let Some(val) = obj.get(&exif_key).and_then(value_to_string) {
        return Some(val);
    }
    let suffix = format!(":{}", tag);
    obj.iter()
        .filter(|(key, _)| key.ends_with(&suffix) || key.as_str() == tag)
        .find_map(|(_, val)| value_to_string(val))
}

fn get_grouped_number(dump: &serde_json::Value, tag: &str) -> Option<f64> {
    let obj = dump.as_object()?;
    let exif_key = format!("EXIF:{}", tag);
    if let Some(val) = obj.get(&exif_key).and_then(|v| v.as_f64()) {
        return Some(val);
    }
    let suffix = format!(":{}", tag);
    obj.iter()
        .filter(|(key, _)| key.ends_with(&suffix) || key.as_str() == tag)
        .find_map(|(_, val)| val.as_f64())
}

fn value_to_string(val: &serde_json::Value) -> Option<String> {
    match val {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Parse "YYYY:MM:DD HH:MM:SS[.sss][±HH:MM|Z]"
fn parse_exif_date(s: &str, tz: Zone) -> Option<DateTime<FixedOffset>> {
    let s = s.trim();
    if s.starts_with("0000") {
        return None;
    }
    for fmt in ["%Y:%m:%d %H:%M:%S%.f%:z", "%Y:%m:%d %H:%M:%S%:z"] {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    let local = s.trim_end_matches('Z');
    let naive = NaiveDateTime::parse_from_str(local, "%Y:%m:%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(local, "%Y:%m:%d %H:%M:%S"))
        .ok()?;
    if local.len() != s.len() {
        return Some(chrono::Utc.from_utc_datetime(&naive).fixed_offset());
    }
    tz.from_local(&naive)
}
