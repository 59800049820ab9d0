//! Plugin catalog.
//!
//! Queries every registered source for a host version and merges the answers
//! into one list, keeping the latest version of each plugin name.

use futures::future::join_all;
use plugin_index_types::{PluginRecord, PluginSource};
use plugin_index_version::keep_latest;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Merged view over a set of plugin sources.
#[derive(Clone, Default)]
pub struct PluginCatalog {
    sources: Vec<Arc<dyn PluginSource>>,
}

impl PluginCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source. Earlier sources win ties between equal versions.
    pub fn with_source(mut self, source: Arc<dyn PluginSource>) -> Self {
        self.sources.push(source);
        self
    }

    pub fn add_source(&mut self, source: Arc<dyn PluginSource>) {
        self.sources.push(source);
    }

    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.sources.iter().map(|s| s.name())
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// List the plugins available for `host_version`, sorted by name.
    ///
    /// A source that fails contributes nothing; the others are still merged.
    pub async fn list(&self, host_version: &str) -> Vec<PluginRecord> {
        let answers = join_all(
            self.sources
                .iter()
                .map(|source| source.list(host_version)),
        )
        .await;

        let mut merged = Vec::new();
        for (source, answer) in self.sources.iter().zip(answers) {
            match answer {
                Ok(records) => {
                    debug!("{} listed {} plugins", source.name(), records.len());
                    merged.extend(records);
                }
                Err(e) => warn!("Plugin source {} failed: {}", source.name(), e),
            }
        }

        let plugins = keep_latest(merged);
        info!("{} plugins available for {}", plugins.len(), host_version);
        plugins
    }

    /// Warm the sources for `host_version` in the background.
    pub fn spawn_preload(self: Arc<Self>, host_version: impl Into<String>) -> JoinHandle<usize> {
        let host_version = host_version.into();
        tokio::spawn(async move {
            debug!("Preloading plugins for {}", host_version);
            let loaded = self.list(&host_version).await.len();
            info!("Preloaded {} plugins for {}", loaded, host_version);
            loaded
        })
    }
}
