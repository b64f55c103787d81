// Nexus / Pixel camera burst names
//
//   00001IMG_00001_BURST20171111030039.jpg
//   00015IMG_00015_BURST20171111030039_COVER.jpg
//   00100lPORTRAIT_00100_BURST20181229213517346_COVER.jpg

use std::sync::LazyLock;
use regex::Regex;

use super::{InfoCollector, NameKind, Recognition};

static NEXUS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)[^_]*_\d+_(BURST(\d{8})(\d{6})\d*)(_COVER)?\.[^.]+$").unwrap()
});

pub(super) fn recognize(ic: &InfoCollector, name: &str) -> Recognition {
    let Some(caps) = NEXUS_RE.captures(name) else {
        return Recognition::NoMatch;
    };
    let Ok(index) = caps[1].parse::<u32>() else {
        return Recognition::Rejected;
    };
    let Some(taken) = ic.local_time(&caps[3], &caps[4]) else {
        return Recognition::Rejected;
    };
    let is_cover = caps.get(5).is_some();
    Recognition::Recognized(ic.info(name, caps[2].to_string(), NameKind::Burst, index, is_cover, taken))
}
