//! Result Store (C10): run directory layout, atomic `latest` marker
//! replacement, and trial metadata read/write.

mod layout;
mod meta;

pub use layout::{RunLayout, install_latest_marker};
pub use meta::{read_trial_meta, write_trial_meta};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize trial metadata: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to install latest marker: {source}")]
    LatestMarker {
        #[source]
        source: std::io::Error,
    },
}
