// Takeout Puzzle Constants
// Changing the matcher or grouping values changes which files end up together.

// Pipeline
pub const DEFAULT_CHANNEL_CAPACITY: usize = 16;

// Grouping
pub const SERIES_TIME_THRESHOLD_MS: i64 = 1_000;

// Sidecars
pub const SIDECAR_EXTENSION: &str = ".json";
pub const SUPPLEMENTAL_METADATA: &str = "supplemental-metadata";
pub const FAILED_VIDEOS_FOLDER: &str = "Failed Videos";

// Matching
pub const FORGOTTEN_DUPLICATE_MAX_EXTRA_CHARS: usize = 9;

// Suffixes appended by the export to edited copies, per export locale
pub const EDITED_SUFFIXES: [&str; 8] = [
    "-edited", "-modifié", "-bearbeitet", "-editado", "-modificato",
    "-bewerkt", "-muokattu", "-redigeret",
];

// Motion photo wrapper extension (PXL_..MP.jpg, PXL_..MP~2.jpg)
pub const MOTION_PHOTO_MARKER: &str = ".MP";

// Files produced by NAS indexers, photo managers and macOS
pub const DEFAULT_BANNED_FILES: [&str; 7] = [
    r"(^|/)@eaDir/",
    r"(^|/)@__thumb/",
    r"(^|/)SYNOFILE_THUMB_[^/]*$",
    r"(^|/)Lightroom Catalog/",
    r"(^|/)thumbnails/",
    r"(^|/)\.DS_Store$",
    r"(^|/)\._[^/]*$",
];

// Config
pub const CONFIG_FILENAME: &str = "config.json";
pub const EXIFTOOL_ENV: &str = "TAKEOUT_EXIFTOOL_PATH";

// Video extensions
pub const VIDEO_EXTENSIONS: [&str; 16] = [
    ".mp4", ".mov", ".avi", ".mkv", ".mts", ".m2ts", ".mpg", ".mpeg",
    ".wmv", ".flv", ".webm", ".3gp", ".m4v", ".ts", ".vob", ".mp",
];

// Image extensions (RAW formats are listed separately and are images too)
pub const IMAGE_EXTENSIONS: [&str; 12] = [
    ".jpg", ".jpeg", ".png", ".gif", ".bmp", ".tif", ".tiff",
    ".heic", ".heif", ".webp", ".avif", ".jxl",
];

// RAW image extensions
pub const RAW_EXTENSIONS: [&str; 15] = [
    ".dng", ".cr2", ".cr3", ".crw", ".nef", ".nrw", ".arw", ".srf",
    ".sr2", ".orf", ".raf", ".rw2", ".pef", ".raw", ".3fr",
];
