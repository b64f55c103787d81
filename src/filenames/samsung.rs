// Samsung sequential burst names: 20231207_101605_031.jpg

use std::sync::LazyLock;
use regex::Regex;

use super::{InfoCollector, NameKind, Recognition};

static SAMSUNG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^((\d{8})_(\d{6}))_(\d{3})\.[^.]+$").unwrap()
});

pub(super) fn recognize(ic: &InfoCollector, name: &str) -> Recognition {
    let Some(caps) = SAMSUNG_RE.captures(name) else {
        return Recognition::NoMatch;
    };
    let Some(taken) = ic.local_time(&caps[2], &caps[3]) else {
        return Recognition::Rejected;
    };
    let index = caps[4].parse::<u32>().unwrap_or_default();
    Recognition::Recognized(ic.info(name, caps[1].to_string(), NameKind::Burst, index, false, taken))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use super::super::{test_collector, test_offset};
    use super::*;

    #[test]
    fn test_samsung_burst() {
        let ic = test_collector();
        let Recognition::Recognized(info) = recognize(&ic, "20231207_101605_031.jpg") else {
            panic!("expected a samsung burst");
        };
        assert_eq!(info.radical, "20231207_101605");
        assert_eq!(info.index, 31);
        assert_eq!(info.taken, Some(test_offset().with_ymd_and_hms(2023, 12, 7, 10, 16, 5).unwrap()));
    }

    #[test]
    fn test_single_shot_is_not_a_burst() {
        let ic = test_collector();
        assert!(matches!(recognize(&ic, "20231207_101605.jpg"), Recognition::NoMatch));
        assert!(matches!(recognize(&ic, "20231207_101605_31.jpg"), Recognition::NoMatch));
    }
}
