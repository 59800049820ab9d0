//! Turning configuration into a plugin catalog.

use crate::GlobalOptions;
use plugin_index_bundled::{BundledArchiveSource, Descriptions};
use plugin_index_ci::{CiBuildSource, CiError};
use plugin_index_config::{locate, Config, ConfigError};
use plugin_index_diagnostics::PluginIndexError;
use plugin_index_discovery::PluginCatalog;
use plugin_index_fetch::HttpFetcher;
use plugin_index_version::BranchResolver;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Load the config file (if any) and apply command-line overrides.
pub fn load(global: &GlobalOptions) -> Result<(Config, Option<PathBuf>), PluginIndexError> {
    let path = locate(global.config.as_deref());
    let mut config = match &path {
        Some(path) => Config::load(path).map_err(|e| config_error(e, path))?,
        None => Config::default(),
    };

    apply_overrides(&mut config, global);
    config
        .validate()
        .map_err(|e| PluginIndexError::invalid_config(e.to_string()))?;

    Ok((config, path))
}

fn apply_overrides(config: &mut Config, global: &GlobalOptions) {
    if let Some(version) = &global.host_version {
        config.host.version = version.clone();
    }
    if let Some(url) = &global.ci_url {
        config.ci.url = Some(url.clone());
    }
    if let Some(next) = &global.next_version {
        config.ci.next_version = Some(next.clone());
    }
}

fn config_error(err: ConfigError, path: &Path) -> PluginIndexError {
    match err {
        ConfigError::NotFound(path) => PluginIndexError::ConfigNotFound {
            path: path.display().to_string(),
        },
        ConfigError::TomlError(e) => {
            let src = std::fs::read_to_string(path).unwrap_or_default();
            PluginIndexError::config_parse(e.message(), path.display().to_string(), src, e.span())
        }
        ConfigError::ValidationError(message) => PluginIndexError::invalid_config(message),
        other => PluginIndexError::Generic(other.to_string()),
    }
}

/// Branch resolution rules from the `[ci]` section.
pub fn resolver(config: &Config) -> BranchResolver {
    BranchResolver::new(config.ci.next_version.clone().unwrap_or_default())
        .with_view_prefix(config.ci.view_prefix.clone())
}

/// Register the enabled sources; bundled plugins come first so they win version ties.
pub fn build_catalog(config: &Config) -> Result<PluginCatalog, PluginIndexError> {
    let mut catalog = PluginCatalog::new();

    if config.bundled.enabled {
        let mut descriptions = Descriptions::builtin();
        descriptions.extend(config.descriptions.clone());

        let bundled = BundledArchiveSource::new(&config.host.version, config.host.archive.clone())
            .with_plugins_dir(config.bundled.plugins_dir.clone())
            .with_attributes(
                config.bundled.name_attribute.clone(),
                config.bundled.version_attribute.clone(),
            )
            .with_descriptions(descriptions);
        catalog.add_source(Arc::new(bundled));
    }

    if config.ci.enabled {
        match &config.ci.url {
            Some(url) => {
                let fetcher = HttpFetcher::with_timeout(config.ci.timeout())
                    .map_err(|e| PluginIndexError::network(e.to_string()))?;
                let ci = CiBuildSource::new(url, resolver(config), Arc::new(fetcher))
                    .map_err(|e| match e {
                        CiError::InvalidBaseUrl { url, message } => {
                            PluginIndexError::invalid_ci_url(url, message)
                        }
                        other => PluginIndexError::Generic(other.to_string()),
                    })?
                    .with_cache_ttl(config.ci.cache_ttl());
                catalog.add_source(Arc::new(ci));
            }
            None => tracing::info!("No CI server configured; skipping CI plugins"),
        }
    }

    if catalog.is_empty() {
        return Err(PluginIndexError::NoSources);
    }
    Ok(catalog)
}
