use crate::archive::{read_manifest, HostArchive};
use crate::descriptions::Descriptions;
use crate::ArchiveError;
use async_trait::async_trait;
use plugin_index_types::{PluginRecord, PluginSource, SourceError};
use plugin_index_version::keep_latest;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Directory inside the host archive holding bundled plugins.
pub const DEFAULT_PLUGINS_DIR: &str = "WEB-INF/plugins/";
/// Manifest attribute carrying the plugin name.
pub const DEFAULT_NAME_ATTRIBUTE: &str = "Gerrit-PluginName";
/// Manifest attribute carrying the plugin version.
pub const DEFAULT_VERSION_ATTRIBUTE: &str = "Implementation-Version";

const PLUGIN_SUFFIX: &str = ".jar";

/// Lists the plugins packaged inside the running host's archive.
///
/// Only answers for the exact running version; any other version, or a host
/// that was not started from an archive, yields an empty list.
pub struct BundledArchiveSource {
    running_version: String,
    archive: Option<PathBuf>,
    scanner: Scanner,
}

/// Everything a blocking scan needs, detached from the source.
#[derive(Clone)]
struct Scanner {
    plugins_dir: String,
    name_attribute: String,
    version_attribute: String,
    descriptions: Arc<Descriptions>,
}

impl BundledArchiveSource {
    pub fn new(running_version: impl Into<String>, archive: Option<PathBuf>) -> Self {
        Self {
            running_version: running_version.into(),
            archive,
            scanner: Scanner {
                plugins_dir: DEFAULT_PLUGINS_DIR.to_string(),
                name_attribute: DEFAULT_NAME_ATTRIBUTE.to_string(),
                version_attribute: DEFAULT_VERSION_ATTRIBUTE.to_string(),
                descriptions: Arc::new(Descriptions::builtin()),
            },
        }
    }

    pub fn with_descriptions(mut self, descriptions: Descriptions) -> Self {
        self.scanner.descriptions = Arc::new(descriptions);
        self
    }

    pub fn with_plugins_dir(mut self, dir: impl Into<String>) -> Self {
        self.scanner.plugins_dir = dir.into();
        self
    }

    /// Override the manifest attributes read for name and version.
    pub fn with_attributes(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.scanner.name_attribute = name.into();
        self.scanner.version_attribute = version.into();
        self
    }

    pub fn running_version(&self) -> &str {
        &self.running_version
    }

    pub fn archive(&self) -> Option<&Path> {
        self.archive.as_deref()
    }
}

impl Scanner {
    fn scan(&self, path: &Path) -> Result<Vec<PluginRecord>, ArchiveError> {
        let mut archive = HostArchive::open(path)?;
        let archive_path = path.to_string_lossy();

        let candidates: Vec<String> = archive
            .entries()
            .into_iter()
            .filter(|entry| {
                !entry.is_dir
                    && entry.name.starts_with(&self.plugins_dir)
                    && entry.name.ends_with(PLUGIN_SUFFIX)
            })
            .map(|entry| entry.name)
            .collect();

        let mut records = Vec::with_capacity(candidates.len());
        for entry in candidates {
            match self.inspect(&mut archive, &entry) {
                Ok(Some((name, version))) => {
                    let description = self.descriptions.get(&name).unwrap_or_default();
                    records.push(
                        PluginRecord::new(name, jar_url(&archive_path, &entry))
                            .with_description(description)
                            .with_version(version),
                    );
                }
                Ok(None) => debug!("Skipping {}: no plugin name", entry),
                Err(e) => warn!("Unable to open plugin {}: {}", entry, e),
            }
        }

        Ok(keep_latest(records))
    }

    /// Name and version of the plugin stored at `entry`.
    fn inspect(
        &self,
        archive: &mut HostArchive,
        entry: &str,
    ) -> Result<Option<(String, String)>, ArchiveError> {
        let bytes = archive.read(entry)?;
        let fallback = file_stem(entry);

        let (name, version) = match read_manifest(&bytes)? {
            Some(manifest) => {
                let name = manifest
                    .get(&self.name_attribute)
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .unwrap_or(fallback);
                let version = manifest.get(&self.version_attribute).unwrap_or_default();
                (name.to_string(), version.trim().to_string())
            }
            None => (fallback.to_string(), String::new()),
        };

        if name.is_empty() {
            return Ok(None);
        }
        Ok(Some((name, version)))
    }
}

/// Location of `entry` inside the archive at `archive`, with `/` separators.
fn jar_url(archive: &str, entry: &str) -> String {
    format!("jar:file:{}!/{}", archive.replace('\\', "/"), entry)
}

/// File name of `entry` without the jar extension.
fn file_stem(entry: &str) -> &str {
    let file = entry.rsplit('/').next().unwrap_or(entry);
    file.strip_suffix(PLUGIN_SUFFIX).unwrap_or(file)
}

#[async_trait]
impl PluginSource for BundledArchiveSource {
    fn name(&self) -> &str {
        "bundled"
    }

    async fn list(&self, host_version: &str) -> Result<Vec<PluginRecord>, SourceError> {
        if host_version != self.running_version {
            info!(
                "Bundled plugins are only listed for the running version {} (requested {})",
                self.running_version, host_version
            );
            return Ok(Vec::new());
        }

        let Some(path) = self.archive.clone() else {
            info!("Host is not running from an archive; no bundled plugins");
            return Ok(Vec::new());
        };

        let scanner = self.scanner.clone();
        let records = tokio::task::spawn_blocking(move || scanner.scan(&path))
            .await
            .map_err(|e| SourceError::Join(e.to_string()))?
            .map_err(SourceError::other)?;

        info!("Found {} bundled plugins", records.len());
        Ok(records)
    }
}
