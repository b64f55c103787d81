// Takeout Puzzle - Library Entry Point
//
// Rebuilds a photo library export into groups of assets: sidecars are
// associated with their media files, motion photos are linked, import
// policies are applied and related captures are grouped.

pub mod assets;
pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod filenames;
pub mod filetypes;
pub mod groups;
pub mod ingest;
pub mod metadata;
pub mod source;
pub mod tools;

pub use assets::{Album, AssetGroup, GroupKind, LogicalAsset};
pub use config::ImportOptions;
pub use error::{Result, TakeoutError};
pub use events::{EventCode, Recorder};
pub use ingest::Takeout;
