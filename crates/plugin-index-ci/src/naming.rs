//! Plugin name inference from artifact paths.
//!
//! Two layouts are recognised. Bazel-style builds publish
//! `.../<name>/<name>[-extra].<ext>`, so the parent directory usually carries
//! the name. Maven builds publish `target/<name>-<version>.<ext>`, where a
//! name containing hyphens cannot be told apart from its version; the owning
//! job's URL (`.../plugin-<name>-mvn-<branch>/`) is used to disambiguate.

use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

/// Directory Maven writes its build outputs to.
pub const MAVEN_OUTPUT_DIR: &str = "target";

/// Packaged plugin formats, in the order they are searched for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactFamily {
    /// Java plugin archive
    Jar,
    /// Standalone JavaScript plugin
    Js,
}

impl ArtifactFamily {
    /// Families in lookup order; the first one with a match wins.
    pub const ALL: [ArtifactFamily; 2] = [ArtifactFamily::Jar, ArtifactFamily::Js];

    /// Suffix of the plugin binary.
    pub fn suffix(self) -> &'static str {
        match self {
            ArtifactFamily::Jar => ".jar",
            ArtifactFamily::Js => ".js",
        }
    }

    /// Suffix of the plain-text version file published next to the binary.
    pub fn version_suffix(self) -> &'static str {
        match self {
            ArtifactFamily::Jar => ".jar-version",
            ArtifactFamily::Js => ".js-version",
        }
    }

    /// Detect the family from a file name.
    pub fn of_path(path: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| path.ends_with(f.suffix()))
    }
}

/// Returns true if the artifact sits directly in a Maven `target` directory.
pub fn is_maven_layout(parts: &[&str]) -> bool {
    parts.len() >= 2 && parts[parts.len() - 2] == MAVEN_OUTPUT_DIR
}

/// Infer a plugin name from the segments of an artifact's relative path.
///
/// `job_url` is only consulted for ambiguous Maven file names.
pub fn plugin_name(parts: &[&str], job_url: &str, maven_layout: bool) -> String {
    if maven_layout {
        maven_plugin_name(parts, job_url)
    } else {
        directory_plugin_name(parts)
    }
}

/// Infer a plugin name from a `/`-separated relative path.
///
/// Maven disambiguation only applies to the `.jar` family.
pub fn plugin_name_from_path(relative_path: &str, job_url: &str) -> String {
    let parts: Vec<&str> = relative_path.split('/').collect();
    let maven = ArtifactFamily::of_path(relative_path) == Some(ArtifactFamily::Jar)
        && is_maven_layout(&parts);
    plugin_name(&parts, job_url, maven)
}

fn file_name<'a>(parts: &[&'a str]) -> &'a str {
    parts.last().copied().unwrap_or_default()
}

fn strip_extension(file: &str) -> &str {
    file.rsplit_once('.').map_or(file, |(stem, _)| stem)
}

/// `.../<name>/<name>[-extra].<ext>`, falling back to the file stem.
fn directory_plugin_name(parts: &[&str]) -> String {
    let file = file_name(parts);

    if parts.len() >= 2 {
        let dir = parts[parts.len() - 2];
        if !dir.is_empty() && file.starts_with(dir) {
            return dir.to_string();
        }
    }

    strip_extension(file).to_string()
}

/// `target/<name>-<version>.<ext>` or `target/<name>.<ext>`.
///
/// With a single hyphen the name is assumed to be `name-version`. With more,
/// the full name is read from the job URL and accepted only if it contains
/// the text before the first hyphen; otherwise that text is the name.
fn maven_plugin_name(parts: &[&str], job_url: &str) -> String {
    let stem = strip_extension(file_name(parts));
    let fallback = before_first_hyphen(stem);

    if stem.matches('-').count() < 2 {
        return fallback.to_string();
    }

    match name_from_job_url(job_url) {
        Some(candidate) if candidate.contains(fallback) => candidate.to_string(),
        Some(candidate) => {
            debug!(
                "Job URL name '{}' does not match artifact '{}', using '{}'",
                candidate, stem, fallback
            );
            fallback.to_string()
        }
        None => fallback.to_string(),
    }
}

fn before_first_hyphen(stem: &str) -> &str {
    match stem.find('-') {
        Some(pos) if pos > 0 => &stem[..pos],
        _ => stem,
    }
}

fn job_url_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"/plugin-([^/]+?)-mvn-").ok())
        .as_ref()
}

/// Extract `<name>` from `.../plugin-<name>-mvn-<branch>/`.
fn name_from_job_url(job_url: &str) -> Option<&str> {
    job_url_pattern()?
        .captures(job_url)?
        .get(1)
        .map(|m| m.as_str())
}
