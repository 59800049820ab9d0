//! CLI command implementations.

pub mod ui;

use crate::settings;
use crate::GlobalOptions;
use miette::{IntoDiagnostic, Result};
use plugin_index_ci::plugin_name_from_path;
use plugin_index_types::PluginRecord;
use std::collections::BTreeMap;
use std::sync::Arc;

/// List plugins for each version, or the configured host version.
pub async fn list(global: &GlobalOptions, versions: &[String], json: bool) -> Result<()> {
    let (config, _) = settings::load(global)?;
    let catalog = Arc::new(settings::build_catalog(&config)?);
    let host_version = config.host.version.clone();

    let versions = if versions.is_empty() {
        vec![host_version.clone()]
    } else {
        versions.to_vec()
    };

    // Warm the host version while the other versions are listed
    let mut preload = config
        .catalog
        .preload
        .then(|| catalog.clone().spawn_preload(host_version.clone()));

    let mut listings = BTreeMap::new();
    for version in &versions {
        if *version == host_version {
            if let Some(handle) = preload.take() {
                if let Err(e) = handle.await {
                    tracing::warn!("Preload for {} did not finish: {}", host_version, e);
                }
            }
        }
        listings.insert(version.clone(), catalog.list(version).await);
    }

    if json {
        let out = match listings.values().next() {
            Some(plugins) if listings.len() == 1 => serde_json::to_string_pretty(plugins),
            _ => serde_json::to_string_pretty(&listings),
        }
        .into_diagnostic()?;
        println!("{}", out);
        return Ok(());
    }

    for (version, plugins) in &listings {
        print_plugins(version, plugins);
    }
    Ok(())
}

fn print_plugins(version: &str, plugins: &[PluginRecord]) {
    let label = if version.is_empty() { "master" } else { version };
    ui::header(format!("Plugins for {}", label));

    if plugins.is_empty() {
        ui::warn("No plugins found");
        println!();
        return;
    }

    let name_width = plugins.iter().map(|p| p.name().len()).max().unwrap_or(0);
    let version_width = plugins.iter().map(|p| p.version().len()).max().unwrap_or(0);

    for plugin in plugins {
        println!(
            "  {:name_width$}  {:version_width$}  {:8}  {}",
            ui::name(plugin.name()),
            plugin.version(),
            plugin.short_revision(),
            ui::dim(plugin.description()),
            name_width = name_width,
            version_width = version_width,
        );
    }
    println!();
    ui::info(format!("{} plugins", ui::num(plugins.len())));
}

/// Show the CI view a host version maps to.
pub fn view(global: &GlobalOptions, version: Option<&str>) -> Result<()> {
    let (config, _) = settings::load(global)?;
    let resolver = settings::resolver(&config);
    let version = version.unwrap_or(&config.host.version);

    let branch = resolver.branch(version);
    let view = resolver.resolve_view(version);

    ui::info(format!("Branch: {}", ui::name(&branch)));
    ui::info(format!("View:   {}", ui::name(&view)));
    if let Some(url) = &config.ci.url {
        println!(
            "  {}",
            ui::dim(format!("{}/view/{}/api/json", url.trim_end_matches('/'), view))
        );
    }
    Ok(())
}

/// Print the plugin name inferred from an artifact path.
pub fn name(path: &str, job_url: &str) {
    let name = plugin_name_from_path(path, job_url);
    if name.is_empty() {
        ui::warn(format!("Cannot infer a plugin name from {}", path));
    } else {
        println!("{}", name);
    }
}

/// Print the effective configuration.
pub fn config(global: &GlobalOptions) -> Result<()> {
    let (config, path) = settings::load(global)?;
    match path {
        Some(path) => println!("# {}", path.display()),
        None => println!("# defaults (no config file)"),
    }
    print!("{}", config.to_toml().into_diagnostic()?);
    Ok(())
}
