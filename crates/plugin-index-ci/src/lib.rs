//! Plugin discovery from continuous-integration build artifacts.
//!
//! Plugins are built by CI jobs grouped into one view per host release
//! branch. For a host version the matching view is resolved, every green job
//! is followed to its last successful build, and the plugin binary published
//! by that build is described from its sibling artifacts.

pub mod api;
pub mod naming;
mod source;

pub use naming::{is_maven_layout, plugin_name, plugin_name_from_path, ArtifactFamily};
pub use source::{CiBuildSource, DEFAULT_CONCURRENCY};

use plugin_index_fetch::FetchError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CiError {
    #[error("Invalid CI base URL '{url}': {message}")]
    InvalidBaseUrl { url: String, message: String },
    #[error(transparent)]
    Fetch(#[from] FetchError),
}
