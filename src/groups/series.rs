// Series detection: bursts, RAW+JPEG and HEIC+JPEG pairs
//
// A series is a run of assets sharing the same radical. Within a series,
// members taken more than a second apart are split into separate groups.

use chrono::{DateTime, FixedOffset};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::assets::{AssetGroup, GroupKind, LogicalAsset};
use crate::constants::SERIES_TIME_THRESHOLD_MS;
use crate::filenames::NameKind;
use crate::filetypes::is_raw_file;

/// Consume assets sorted by radical then capture date and produce groups.
/// Returns when the input closes, the output is dropped or on cancellation;
/// a partially collected series is discarded on cancellation.
pub async fn group(
    cancel: CancellationToken,
    mut rx: mpsc::Receiver<LogicalAsset>,
    tx: mpsc::Sender<AssetGroup>,
) {
    let mut radical = String::new();
    let mut current: Vec<LogicalAsset> = Vec::new();

    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => return,
            next = rx.recv() => next,
        };

        let Some(asset) = next else {
            if !current.is_empty() {
                send_all(&cancel, &tx, split_series(current)).await;
            }
            return;
        };

        if asset.radical() != radical {
            if !current.is_empty() {
                let series = std::mem::take(&mut current);
                if !send_all(&cancel, &tx, split_series(series)).await {
                    return;
                }
            }
            radical = asset.radical().to_string();
        }
        current.push(asset);
    }
}

/// Send groups in order; false once cancelled or the receiver is gone
async fn send_all(cancel: &CancellationToken, tx: &mpsc::Sender<AssetGroup>, groups: Vec<AssetGroup>) -> bool {
    for g in groups {
        tokio::select! {
            _ = cancel.cancelled() => return false,
            sent = tx.send(g) => {
                if sent.is_err() {
                    return false;
                }
            }
        }
    }
    true
}

fn singles(assets: Vec<LogicalAsset>) -> Vec<AssetGroup> {
    assets.into_iter().map(AssetGroup::single).collect()
}

fn too_far(a: Option<DateTime<FixedOffset>>, b: Option<DateTime<FixedOffset>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => (a - b).num_milliseconds().abs() > SERIES_TIME_THRESHOLD_MS,
        (None, None) => false,
        _ => true,
    }
}

/// Turn the members of one series into groups and bare assets.
///
/// Two members pair up as RAW+JPEG or HEIC+JPEG, burst names make a burst.
/// A series of two or more whose kind stays undetermined goes out as bare
/// assets; there is no catch-all group kind for it.
pub fn split_series(assets: Vec<LogicalAsset>) -> Vec<AssetGroup> {
    if assets.len() < 2 {
        return singles(assets);
    }

    let mut kind = GroupKind::None;
    let mut cover = 0;
    let (mut jpg, mut raw, mut heic, mut mp4, mut mov) = (false, false, false, false, false);

    for (i, a) in assets.iter().enumerate() {
        let ext = a.name.ext.as_str();
        jpg |= ext == ".jpg" || ext == ".jpeg";
        raw |= is_raw_file(ext);
        heic |= ext == ".heic" || ext == ".heif";
        mp4 |= ext == ".mp4";
        mov |= ext == ".mov";

        if a.name.kind == NameKind::Burst {
            kind = GroupKind::Burst;
        }
        if a.name.is_cover {
            cover = i;
        }
    }

    if assets.len() == 2 && kind == GroupKind::None {
        if jpg && raw && !heic {
            kind = GroupKind::RawJpeg;
        } else if jpg && heic && !raw {
            kind = GroupKind::HeicJpeg;
        } else if (mp4 || mov) && (jpg || heic) {
            // A video next to a still with the same name is not a series
            return singles(assets);
        }
    }

    let mut out = Vec::new();
    let mut sub: Vec<LogicalAsset> = Vec::new();
    let mut offset = 0;

    for a in assets {
        if let Some(last) = sub.last() {
            if too_far(last.date(), a.date()) {
                let len = sub.len();
                // Each sub-group gets its own cover index so that every
                // emitted group passes AssetGroup::validate
                out.extend(close_sub_group(std::mem::take(&mut sub), kind, cover, offset));
                offset += len;
            }
        }
        sub.push(a);
    }
    out.extend(close_sub_group(sub, kind, cover, offset));
    out
}

/// Emit one time-contiguous part of a series. `offset` is the position of
/// its first member in the whole series.
fn close_sub_group(sub: Vec<LogicalAsset>, kind: GroupKind, cover: usize, offset: usize) -> Vec<AssetGroup> {
    if sub.len() < 2 || kind == GroupKind::None {
        return singles(sub);
    }
    let cover = if cover >= offset && cover < offset + sub.len() {
        cover - offset
    } else {
        0
    };
    vec![AssetGroup::new(kind, sub).with_cover(cover)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use crate::assets::test_support::asset;

    fn at(secs: u32, millis: i64) -> Option<DateTime<FixedOffset>> {
        let tz = FixedOffset::east_opt(3600).unwrap();
        Some(tz.with_ymd_and_hms(2023, 12, 7, 10, 16, secs).unwrap() + chrono::Duration::milliseconds(millis))
    }

    fn names(g: &AssetGroup) -> Vec<&str> {
        g.assets.iter().map(|a| a.file.base()).collect()
    }

    #[test]
    fn test_single_asset_is_bare() {
        let groups = split_series(vec![asset("IMG_1.JPG", None)]);
        assert_eq!(groups.len(), 1);
        assert!(groups[0].is_single());
    }

    #[test]
    fn test_heic_jpeg_pair() {
        let groups = split_series(vec![asset("IMG_1.HEIC", at(5, 0)), asset("IMG_1.JPG", at(5, 0))]);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].kind, GroupKind::HeicJpeg);
        assert_eq!(groups[0].cover_index, 0);
    }

    #[test]
    fn test_raw_jpeg_pair() {
        let groups = split_series(vec![asset("DSC_1.NEF", at(5, 0)), asset("DSC_1.jpg", at(5, 200))]);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].kind, GroupKind::RawJpeg);
    }

    #[test]
    fn test_video_and_still_stay_apart() {
        let groups = split_series(vec![asset("IMG_1.JPG", at(5, 0)), asset("IMG_1.MP4", at(5, 0))]);
        assert_eq!(groups.len(), 2);
        assert!(groups.iter().all(|g| g.is_single()));
    }

    #[test]
    fn test_burst_cover() {
        let groups = split_series(vec![
            asset("00001IMG_00001_BURST20231207101605.jpg", None),
            asset("00002IMG_00002_BURST20231207101605_COVER.jpg", None),
            asset("00003IMG_00003_BURST20231207101605.jpg", None),
        ]);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].kind, GroupKind::Burst);
        assert_eq!(groups[0].cover_index, 1);
        assert_eq!(groups[0].assets.len(), 3);
    }

    #[test]
    fn test_time_gap_splits_series() {
        let groups = split_series(vec![
            asset("20231207_101605_001.jpg", at(5, 0)),
            asset("20231207_101605_002.jpg", at(5, 400)),
            asset("20231207_101605_003.jpg", at(5, 900)),
            asset("20231207_101605_004.jpg", at(9, 0)),
            asset("20231207_101605_005.jpg", at(20, 0)),
            asset("20231207_101605_006.jpg", at(20, 500)),
        ]);
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].kind, GroupKind::Burst);
        assert_eq!(names(&groups[0]), vec![
            "20231207_101605_001.jpg",
            "20231207_101605_002.jpg",
            "20231207_101605_003.jpg",
        ]);
        assert!(groups[1].is_single());
        assert_eq!(names(&groups[1]), vec!["20231207_101605_004.jpg"]);
        assert_eq!(groups[2].kind, GroupKind::Burst);
        assert_eq!(groups[2].assets.len(), 2);
        for g in &groups {
            assert!(g.validate().is_ok());
        }
    }

    #[test]
    fn test_cover_rebased_into_its_sub_group() {
        let groups = split_series(vec![
            asset("00001IMG_00001_BURST20231207101605.jpg", at(5, 0)),
            asset("00002IMG_00002_BURST20231207101605.jpg", at(5, 300)),
            asset("00003IMG_00003_BURST20231207101605.jpg", at(12, 0)),
            asset("00004IMG_00004_BURST20231207101605_COVER.jpg", at(12, 200)),
        ]);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].cover_index, 0);
        assert_eq!(groups[1].cover_index, 1);
        assert!(groups[1].assets[1].name.is_cover);
        for g in &groups {
            assert!(g.validate().is_ok());
        }
    }

    #[test]
    fn test_undetermined_series_goes_out_bare() {
        let groups = split_series(vec![
            asset("IMG_1.png", at(5, 0)),
            asset("IMG_1.gif", at(5, 0)),
            asset("IMG_1.webp", at(5, 0)),
        ]);
        assert_eq!(groups.len(), 3);
        assert!(groups.iter().all(|g| g.is_single()));
    }

    #[tokio::test]
    async fn test_group_flushes_on_radical_change_and_end() {
        let (in_tx, in_rx) = mpsc::channel(8);
        let (out_tx, mut out_rx) = mpsc::channel(8);
        let cancel = CancellationToken::new();
        let task = tokio::spawn(group(cancel.clone(), in_rx, out_tx));

        in_tx.send(asset("IMG_1.HEIC", at(5, 0))).await.unwrap();
        in_tx.send(asset("IMG_1.JPG", at(5, 0))).await.unwrap();
        in_tx.send(asset("IMG_2.JPG", at(7, 0))).await.unwrap();
        drop(in_tx);

        let mut groups = Vec::new();
        while let Some(g) = out_rx.recv().await {
            groups.push(g);
        }
        task.await.unwrap();

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].kind, GroupKind::HeicJpeg);
        assert!(groups[1].is_single());
        assert_eq!(groups[1].assets[0].file.base(), "IMG_2.JPG");
    }

    #[tokio::test]
    async fn test_group_stops_on_cancel() {
        let (in_tx, in_rx) = mpsc::channel(8);
        let (out_tx, mut out_rx) = mpsc::channel(8);
        let cancel = CancellationToken::new();
        let task = tokio::spawn(group(cancel.clone(), in_rx, out_tx));

        in_tx.send(asset("IMG_1.JPG", at(5, 0))).await.unwrap();
        cancel.cancel();
        task.await.unwrap();

        // the buffered series is discarded
        assert!(out_rx.recv().await.is_none());
        drop(in_tx);
    }
}
