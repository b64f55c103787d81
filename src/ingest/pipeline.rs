// Pass two as a stream of asset groups

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::assets::{AssetGroup, LogicalAsset};
use crate::error::{Result, TakeoutError};
use crate::groups;
use super::Takeout;

/// Order expected by series detection: radical, then capture date, then name
fn series_order(a: &LogicalAsset, b: &LogicalAsset) -> std::cmp::Ordering {
    a.radical()
        .cmp(b.radical())
        .then_with(|| a.date().cmp(&b.date()))
        .then_with(|| a.file.base().cmp(b.file.base()))
}

impl Takeout {
    /// Emit every directory in path order. Returns the motion photo groups
    /// and the bare assets, sorted for series detection.
    pub fn pass_two(&mut self, cancel: &CancellationToken) -> Result<(Vec<AssetGroup>, Vec<LogicalAsset>)> {
        let dirs: Vec<String> = self.catalogs.keys().cloned().collect();
        let mut linked = Vec::new();
        let mut singles = Vec::new();

        for dir in dirs {
            Self::check_cancel(cancel)?;
            for group in self.emit_directory(&dir) {
                if group.is_single() {
                    singles.extend(group.assets);
                } else {
                    linked.push(group);
                }
            }
        }

        singles.sort_by(series_order);
        log::info!("Pass two: {} linked groups, {} assets", linked.len(), singles.len());
        Ok((linked, singles))
    }

    /// Run pass two in the background and stream the resulting groups.
    ///
    /// Linked groups come first, then the output of series detection. The
    /// channel closes when everything was sent; the handle gives the takeout
    /// back so the tracker and the recorder can be inspected.
    pub fn into_stream(mut self, cancel: CancellationToken) -> (mpsc::Receiver<AssetGroup>, JoinHandle<Result<Takeout>>) {
        let capacity = self.options.channel_capacity.max(1);
        let (tx, rx) = mpsc::channel(capacity);

        let handle = tokio::spawn(async move {
            let worker_cancel = cancel.clone();
            let (takeout, linked, singles) = tokio::task::spawn_blocking(move || {
                let (linked, singles) = self.pass_two(&worker_cancel)?;
                Ok::<_, TakeoutError>((self, linked, singles))
            })
            .await
            .map_err(|e| TakeoutError::Other(format!("Pass two task failed: {}", e)))??;

            for group in linked {
                tokio::select! {
                    _ = cancel.cancelled() => return Err(TakeoutError::Cancelled),
                    sent = tx.send(group) => {
                        if sent.is_err() {
                            log::debug!("Group receiver dropped");
                            return Ok(takeout);
                        }
                    }
                }
            }

            let (asset_tx, asset_rx) = mpsc::channel(capacity);
            let grouper = tokio::spawn(groups::group(cancel.clone(), asset_rx, tx));
            for asset in singles {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    sent = asset_tx.send(asset) => {
                        if sent.is_err() {
                            break;
                        }
                    }
                }
            }
            drop(asset_tx);

            grouper
                .await
                .map_err(|e| TakeoutError::Other(format!("Grouping task failed: {}", e)))?;
            if cancel.is_cancelled() {
                return Err(TakeoutError::Cancelled);
            }
            Ok(takeout)
        });

        (rx, handle)
    }
}
