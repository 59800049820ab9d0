//! Error reporting for the plugin-index command line.
//!
//! Uses miette so configuration mistakes point at the offending line.

// These fields are used by thiserror/miette derive macros
#![allow(unused_assignments)]

pub use miette::{Diagnostic, Report, Result};
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum PluginIndexError {
    #[error("Config file not found: {path}")]
    #[diagnostic(
        code(plugin_index::config::not_found),
        help("Pass an existing file with --config or unset PLUGIN_INDEX_CONFIG")
    )]
    ConfigNotFound { path: String },

    #[error("Failed to parse config: {message}")]
    #[diagnostic(code(plugin_index::config::parse_error))]
    ConfigParseError {
        message: String,
        #[source_code]
        src: Option<miette::NamedSource<String>>,
        #[label("error here")]
        span: Option<miette::SourceSpan>,
    },

    #[error("Invalid config: {message}")]
    #[diagnostic(
        code(plugin_index::config::invalid),
        help("Run `plugin-index config` to see the effective settings")
    )]
    InvalidConfig { message: String },

    #[error("Invalid CI server URL '{url}': {message}")]
    #[diagnostic(
        code(plugin_index::ci::invalid_url),
        help("Use an absolute http(s) URL such as https://ci.example.com")
    )]
    InvalidCiUrl { url: String, message: String },

    #[error("No plugin sources are enabled")]
    #[diagnostic(
        code(plugin_index::catalog::no_sources),
        help("Set [ci] url or [host] archive in plugin-index.toml")
    )]
    NoSources,

    #[error("Network error: {message}")]
    #[diagnostic(
        code(plugin_index::network::error),
        help("Check your connection to the CI server and try again")
    )]
    NetworkError { message: String },

    #[error("{0}")]
    #[diagnostic(code(plugin_index::generic))]
    Generic(String),
}

impl PluginIndexError {
    /// A parse failure in `src` (named `file`), optionally pointing at `span`.
    pub fn config_parse(
        message: impl Into<String>,
        file: impl AsRef<str>,
        src: impl Into<String>,
        span: Option<std::ops::Range<usize>>,
    ) -> Self {
        Self::ConfigParseError {
            message: message.into(),
            src: Some(miette::NamedSource::new(file, src.into())),
            span: span.map(Into::into),
        }
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    pub fn invalid_ci_url(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidCiUrl {
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::NetworkError {
            message: message.into(),
        }
    }
}

/// Setup miette for pretty error output.
pub fn setup() {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))
    .ok();
}
