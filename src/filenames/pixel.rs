// Pixel camera names, which encode UTC time with milliseconds
//
//   PXL_20231026_210642603.dng
//   PXL_20230809_203449253.LONG_EXPOSURE-02.ORIGINAL.jpg
//   PXL_20220405_090123740.MP.jpg

use std::sync::LazyLock;
use regex::Regex;

use crate::filetypes::split_ext;
use super::{InfoCollector, NameKind, Recognition};

static PIXEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^PXL_(\d{8})_(\d{6})\d{3}(?:[.~_-].*)?$").unwrap()
});

pub(super) fn recognize(ic: &InfoCollector, name: &str) -> Recognition {
    let stem = split_ext(name).0;
    let Some(caps) = PIXEL_RE.captures(stem) else {
        return Recognition::NoMatch;
    };
    match ic.utc_time(&caps[1], &caps[2]) {
        Some(taken) => Recognition::Recognized(ic.info(name, stem.to_string(), NameKind::Plain, 0, false, taken)),
        None => Recognition::Rejected,
    }
}
