// File event recorder
//
// Every decision taken on a file (discovered, discarded, associated...) is
// recorded with a reason. Counts are kept per code for the final report.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Mutex;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCode {
    DiscoveredImage,
    DiscoveredVideo,
    DiscoveredSidecar,
    DiscoveredUnsupported,
    DiscoveredDiscarded,
    AnalysisAssociatedMetadata,
    AnalysisMissingAssociatedMetadata,
    AnalysisLocalDuplicate,
    Emitted,
    Error,
}

impl EventCode {
    pub const ALL: [EventCode; 10] = [
        EventCode::DiscoveredImage,
        EventCode::DiscoveredVideo,
        EventCode::DiscoveredSidecar,
        EventCode::DiscoveredUnsupported,
        EventCode::DiscoveredDiscarded,
        EventCode::AnalysisAssociatedMetadata,
        EventCode::AnalysisMissingAssociatedMetadata,
        EventCode::AnalysisLocalDuplicate,
        EventCode::Emitted,
        EventCode::Error,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            EventCode::DiscoveredImage => "scanned image file",
            EventCode::DiscoveredVideo => "scanned video file",
            EventCode::DiscoveredSidecar => "scanned sidecar file",
            EventCode::DiscoveredUnsupported => "unsupported file",
            EventCode::DiscoveredDiscarded => "discarded file",
            EventCode::AnalysisAssociatedMetadata => "associated with metadata",
            EventCode::AnalysisMissingAssociatedMetadata => "missing associated metadata",
            EventCode::AnalysisLocalDuplicate => "local duplicate",
            EventCode::Emitted => "emitted asset",
            EventCode::Error => "error",
        }
    }

    fn is_problem(&self) -> bool {
        matches!(self, EventCode::Error | EventCode::AnalysisMissingAssociatedMetadata)
    }
}

impl fmt::Display for EventCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Thread-safe event sink. Recording never fails and is never read back
/// to drive processing.
#[derive(Debug, Default)]
pub struct Recorder {
    counts: Mutex<BTreeMap<EventCode, u64>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an event on a file with key/value attributes
    pub fn record(&self, code: EventCode, file: impl fmt::Display, attrs: &[(&str, &str)]) {
        *self.counts.lock().unwrap().entry(code).or_insert(0) += 1;

        let mut line = format!("{}: {}", code, file);
        for (k, v) in attrs {
            line.push_str(&format!(" {}={:?}", k, v));
        }
        match code {
            EventCode::Error => log::error!("{}", line),
            c if c.is_problem() => log::warn!("{}", line),
            EventCode::DiscoveredDiscarded | EventCode::DiscoveredUnsupported => log::info!("{}", line),
            _ => log::debug!("{}", line),
        }
    }

    pub fn count(&self, code: EventCode) -> u64 {
        self.counts.lock().unwrap().get(&code).copied().unwrap_or(0)
    }

    /// Counts for every code, including zeros
    pub fn counts(&self) -> Vec<(EventCode, u64)> {
        let counts = self.counts.lock().unwrap();
        EventCode::ALL
            .iter()
            .map(|c| (*c, counts.get(c).copied().unwrap_or(0)))
            .collect()
    }

    /// Summary table of all counts
    pub fn report(&self) -> String {
        let mut out = String::from("Input analysis:\n----------------------\n");
        for (code, n) in self.counts() {
            out.push_str(&format!("{:<32}: {:>7}\n", code.label(), n));
        }
        out
    }
}
