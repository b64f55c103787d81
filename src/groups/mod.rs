// Grouping of related assets
//
// Assets arrive sorted by radical and capture date; series are detected on
// that ordered stream.

pub mod series;

pub use self::series::{group, split_series};
