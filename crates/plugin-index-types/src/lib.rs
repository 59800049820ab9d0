//! Core types for the plugin index.
//!
//! This crate defines the canonical plugin record produced by every source,
//! and the capability trait that sources implement.

mod encoding;

pub use encoding::encode_id;

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Number of hex characters kept from a source-control hash.
pub const SHORT_REVISION_LEN: usize = 8;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Task join error: {0}")]
    Join(String),
    #[error("{0}")]
    Other(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl SourceError {
    pub fn other(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Other(Box::new(err))
    }
}

/// A plugin available for download.
///
/// Records are immutable once built; the builder methods consume `self`.
/// The serialized form is the object handed to HTTP callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginRecord {
    /// URL-safe form of `name`
    id: String,
    /// Plugin short name, the merge key
    name: String,
    /// Free text, empty when unknown
    description: String,
    /// Free-form version, empty when unknown
    version: String,
    /// Abbreviated source revision, empty when unknown
    #[serde(rename = "sha1")]
    short_revision: String,
    /// Where the plugin artifact can be fetched from
    #[serde(rename = "url")]
    location: String,
}

impl PluginRecord {
    /// Create a record with empty description, version and revision.
    pub fn new(name: impl Into<String>, location: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: encode_id(&name),
            name,
            description: String::new(),
            version: String::new(),
            short_revision: String::new(),
            location: location.into(),
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Set the revision, truncated to [`SHORT_REVISION_LEN`] characters.
    pub fn with_revision(mut self, revision: &str) -> Self {
        self.short_revision = short_revision(revision);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn short_revision(&self) -> &str {
        &self.short_revision
    }

    pub fn location(&self) -> &str {
        &self.location
    }
}

impl fmt::Display for PluginRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.version.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}@{}", self.name, self.version)
        }
    }
}

/// Abbreviate a source-control hash.
pub fn short_revision(revision: &str) -> String {
    revision.chars().take(SHORT_REVISION_LEN).collect()
}

/// A place plugins can be discovered from.
///
/// Implementations return records sorted by name with no duplicate names.
/// A source that has nothing for `host_version` returns an empty list rather
/// than an error; errors are reserved for failures of the source as a whole.
#[async_trait]
pub trait PluginSource: Send + Sync {
    /// Short label used in logs.
    fn name(&self) -> &str;

    /// List the plugins compatible with `host_version`.
    async fn list(&self, host_version: &str) -> Result<Vec<PluginRecord>, SourceError>;
}
