//! Plugin discovery from the host's own distribution archive.
//!
//! A host packaged as a single web archive carries a set of plugins inside
//! it. Those plugins only exist for the exact host build that is running, so
//! this source answers for the running version and nothing else.

mod archive;
mod descriptions;
mod manifest;
mod source;

pub use archive::{read_manifest, ArchiveEntry, HostArchive, MANIFEST_PATH};
pub use descriptions::Descriptions;
pub use manifest::Manifest;
pub use source::{
    BundledArchiveSource, DEFAULT_NAME_ATTRIBUTE, DEFAULT_PLUGINS_DIR, DEFAULT_VERSION_ATTRIBUTE,
};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("Archive not found: {0}")]
    NotFound(PathBuf),
    #[error("Failed to read archive: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
