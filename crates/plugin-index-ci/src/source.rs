use crate::api::{ArtifactMetadata, Build, Job, JobDetails, View};
use crate::naming::{is_maven_layout, plugin_name, ArtifactFamily};
use crate::CiError;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use plugin_index_cache::{Clock, VersionCache};
use plugin_index_fetch::{get_json, HttpFetch};
use plugin_index_types::{PluginRecord, PluginSource, SourceError};
use plugin_index_version::{keep_latest, BranchResolver};
use reqwest::Url;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Number of jobs inspected at once.
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Suffix of the metadata artifact carrying the plugin description.
const METADATA_SUFFIX: &str = ".json";

/// Outcome of walking a view.
enum Walk {
    /// The view was read (or does not exist); safe to cache.
    Complete(Vec<PluginRecord>),
    /// The view could not be read; worth retrying later.
    Unavailable,
}

/// Lists plugins built by CI jobs in the view matching a host version.
///
/// Results are cached per host version string. Individual jobs that cannot
/// be read are skipped; a missing view yields an empty list.
pub struct CiBuildSource {
    base_url: String,
    resolver: BranchResolver,
    fetcher: Arc<dyn HttpFetch>,
    cache: VersionCache<Vec<PluginRecord>>,
    concurrency: usize,
}

impl CiBuildSource {
    /// Create a source for the CI server at `base_url`.
    ///
    /// Fails if `base_url` is not an absolute http(s) URL.
    pub fn new(
        base_url: &str,
        resolver: BranchResolver,
        fetcher: Arc<dyn HttpFetch>,
    ) -> Result<Self, CiError> {
        let invalid = |message: String| CiError::InvalidBaseUrl {
            url: base_url.to_string(),
            message,
        };

        let parsed = Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme '{}'", parsed.scheme())));
        }
        if parsed.cannot_be_a_base() {
            return Err(invalid("cannot be used as a base URL".to_string()));
        }

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            resolver,
            fetcher,
            cache: VersionCache::new(),
            concurrency: DEFAULT_CONCURRENCY,
        })
    }

    /// Expire cached listings after `ttl`; `None` keeps them for the process lifetime.
    pub fn with_cache_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.cache = self.cache.with_optional_ttl(ttl);
        self
    }

    /// Use a different time source for cache expiry.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.cache = self.cache.with_clock(clock);
        self
    }

    /// Inspect up to `n` jobs at once.
    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = n.max(1);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn resolver(&self) -> &BranchResolver {
        &self.resolver
    }

    pub fn cache(&self) -> &VersionCache<Vec<PluginRecord>> {
        &self.cache
    }

    /// JSON endpoint of a view.
    pub fn view_url(&self, view: &str) -> String {
        format!("{}/view/{}/api/json", self.base_url, view)
    }

    async fn walk(&self, host_version: &str) -> Walk {
        let view_name = self.resolver.resolve_view(host_version);
        let url = self.view_url(&view_name);
        info!("Listing CI plugins for host version '{}' from {}", host_version, view_name);

        let view: View = match get_json(self.fetcher.as_ref(), &url).await {
            Ok(view) => view,
            Err(e) if e.is_not_found() => {
                warn!(
                    "No plugins available for host version '{}': view {} not found",
                    host_version, view_name
                );
                return Walk::Complete(Vec::new());
            }
            Err(e) => {
                error!("Unable to read CI view {}: {}", view_name, e);
                return Walk::Unavailable;
            }
        };

        let jobs: Vec<&Job> = view
            .jobs
            .iter()
            .filter(|job| {
                let ok = job.is_successful() && !job.url.is_empty();
                if !ok {
                    debug!("Skipping job '{}' ({:?})", job.name, job.color);
                }
                ok
            })
            .collect();

        let mut pending = Vec::with_capacity(jobs.len());
        for job in jobs {
            pending.push(self.inspect_job(job));
        }
        let results: Vec<_> = stream::iter(pending)
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut records = Vec::new();
        for (job, result) in results {
            match result {
                Ok(Some(record)) => records.push(record),
                Ok(None) => debug!("Job '{}' has no plugin artifact", job.name),
                Err(e) => warn!("Skipping job '{}': {}", job.name, e),
            }
        }

        Walk::Complete(keep_latest(records))
    }

    async fn inspect_job<'a>(
        &self,
        job: &'a Job,
    ) -> (&'a Job, Result<Option<PluginRecord>, CiError>) {
        (job, self.plugin_for_job(job).await)
    }

    async fn plugin_for_job(&self, job: &Job) -> Result<Option<PluginRecord>, CiError> {
        let details_url = format!("{}/api/json", job.url.trim_end_matches('/'));
        let details: JobDetails = get_json(self.fetcher.as_ref(), &details_url).await?;

        let Some(build_ref) = details.last_successful_build else {
            return Ok(None);
        };

        let build_url = format!("{}/api/json", build_ref.url.trim_end_matches('/'));
        let build: Build = get_json(self.fetcher.as_ref(), &build_url).await?;

        if build.artifacts.is_empty() {
            return Ok(None);
        }

        for family in ArtifactFamily::ALL {
            if build.find_artifact(family.suffix()).is_some() {
                return self.plugin_from_build(job, &build, family).await;
            }
        }

        Ok(None)
    }

    async fn plugin_from_build(
        &self,
        job: &Job,
        build: &Build,
        family: ArtifactFamily,
    ) -> Result<Option<PluginRecord>, CiError> {
        let Some(artifact) = build.find_artifact(family.suffix()) else {
            return Ok(None);
        };

        let parts: Vec<&str> = artifact.relative_path.split('/').collect();
        let maven = family == ArtifactFamily::Jar && is_maven_layout(&parts);
        let name = plugin_name(&parts, &job.url, maven);
        if name.is_empty() {
            debug!("Cannot infer a plugin name from {}", artifact.relative_path);
            return Ok(None);
        }

        let version = match build.find_artifact(family.version_suffix()) {
            Some(version_artifact) => {
                let url = build.artifact_url(version_artifact);
                let text = self.fetcher.get_text(&url).await?;
                text.lines().collect::<Vec<_>>().join("\n")
            }
            None => String::new(),
        };

        let description = self.description(build).await;

        let mut record = PluginRecord::new(name, build.artifact_url(artifact))
            .with_description(description)
            .with_version(version);
        if let Some(revision) = build.short_revision() {
            record = record.with_revision(&revision);
        }

        Ok(Some(record))
    }

    /// Description from the metadata artifact; empty when there is none or it cannot be read.
    async fn description(&self, build: &Build) -> String {
        let Some(artifact) = build.find_artifact(METADATA_SUFFIX) else {
            return String::new();
        };

        let url = build.artifact_url(artifact);
        match get_json::<ArtifactMetadata>(self.fetcher.as_ref(), &url).await {
            Ok(metadata) => metadata.description.unwrap_or_default(),
            Err(e) => {
                error!("Cannot get plugin metadata from {}: {}", url, e);
                String::new()
            }
        }
    }
}

#[async_trait]
impl PluginSource for CiBuildSource {
    fn name(&self) -> &str {
        "ci"
    }

    async fn list(&self, host_version: &str) -> Result<Vec<PluginRecord>, SourceError> {
        if let Some(cached) = self.cache.get(host_version) {
            return Ok(cached);
        }

        match self.walk(host_version).await {
            Walk::Complete(records) => {
                info!(
                    "Found {} CI plugins for host version '{}'",
                    records.len(),
                    host_version
                );
                self.cache.insert(host_version, records.clone());
                Ok(records)
            }
            Walk::Unavailable => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plugin_index_cache::ManualClock;
    use plugin_index_fetch::MemoryFetcher;
    use serde_json::json;

    const CI: &str = "https://ci.example.com";
    const VIEW: &str = "https://ci.example.com/view/Plugins-stable-3.9/api/json";
    const SHA: &str = "0123456789abcdef0123456789abcdef01234567";

    fn job(name: &str, color: &str) -> serde_json::Value {
        json!({"name": name, "url": format!("{CI}/job/{name}/"), "color": color})
    }

    fn add_view(fetcher: &mut MemoryFetcher, jobs: Vec<serde_json::Value>) {
        fetcher.add_json(VIEW, &json!({"name": "Plugins-stable-3.9", "jobs": jobs}));
    }

    /// Register a job whose last successful build publishes `artifacts`.
    /// Returns the build URL artifacts are served under.
    fn add_build(fetcher: &mut MemoryFetcher, name: &str, artifacts: &[&str]) -> String {
        let build = format!("{CI}/job/{name}/7");
        fetcher.add_json(
            format!("{CI}/job/{name}/api/json"),
            &json!({"lastSuccessfulBuild": {"number": 7, "url": format!("{build}/")}}),
        );
        let artifacts: Vec<_> = artifacts
            .iter()
            .map(|p| json!({"relativePath": p, "fileName": p.rsplit('/').next()}))
            .collect();
        fetcher.add_json(
            format!("{build}/api/json"),
            &json!({
                "url": format!("{build}/"),
                "artifacts": artifacts,
                "actions": [{}, null, {"lastBuiltRevision": {"SHA1": SHA}}],
            }),
        );
        build
    }

    fn source(fetcher: MemoryFetcher) -> (Arc<MemoryFetcher>, CiBuildSource) {
        let fetcher = Arc::new(fetcher);
        let source =
            CiBuildSource::new(CI, BranchResolver::new("3.10.0"), fetcher.clone()).unwrap();
        (fetcher, source)
    }

    #[tokio::test]
    async fn test_only_green_jobs_are_examined() {
        let mut fetcher = MemoryFetcher::new();
        add_view(
            &mut fetcher,
            vec![
                job("replication", "blue"),
                job("broken", "red"),
                job("empty", "blue"),
            ],
        );
        let build = add_build(
            &mut fetcher,
            "replication",
            &[
                "bazel-bin/plugins/replication/replication.jar",
                "bazel-bin/plugins/replication/replication.jar-version",
                "bazel-bin/plugins/replication/replication.json",
            ],
        );
        fetcher.add(
            format!("{build}/artifact/bazel-bin/plugins/replication/replication.jar-version"),
            "v3.9.1-5-gdeadbee\n",
        );
        fetcher.add_json(
            format!("{build}/artifact/bazel-bin/plugins/replication/replication.json"),
            &json!({"description": "Copies to other servers"}),
        );
        add_build(&mut fetcher, "broken", &["broken.jar"]);
        add_build(&mut fetcher, "empty", &[]);

        let (fetcher, source) = source(fetcher);
        let plugins = source.list("3.9.1").await.unwrap();

        assert_eq!(plugins.len(), 1);
        let plugin = &plugins[0];
        assert_eq!(plugin.name(), "replication");
        assert_eq!(plugin.version(), "v3.9.1-5-gdeadbee");
        assert_eq!(plugin.description(), "Copies to other servers");
        assert_eq!(plugin.short_revision(), "01234567");
        assert_eq!(
            plugin.location(),
            format!("{build}/artifact/bazel-bin/plugins/replication/replication.jar")
        );

        let requests = fetcher.requests();
        assert!(!requests.iter().any(|u| u.contains("/job/broken/")));
        assert!(requests.contains(&format!("{CI}/job/empty/7/api/json")));
    }

    #[tokio::test]
    async fn test_repeat_calls_are_served_from_cache() {
        let mut fetcher = MemoryFetcher::new();
        add_view(&mut fetcher, vec![job("gitiles", "blue")]);
        add_build(&mut fetcher, "gitiles", &["plugins/gitiles/gitiles.jar"]);

        let (fetcher, source) = source(fetcher);
        let first = source.list("3.9.1").await.unwrap();
        let issued = fetcher.request_count();
        let second = source.list("3.9.1").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(fetcher.request_count(), issued);

        // A different version string is a different key
        source.list("3.9.2").await.unwrap();
        assert!(fetcher.request_count() > issued);
    }

    #[tokio::test]
    async fn test_cache_ttl_expiry() {
        let mut fetcher = MemoryFetcher::new();
        add_view(&mut fetcher, vec![job("gitiles", "blue")]);
        add_build(&mut fetcher, "gitiles", &["plugins/gitiles/gitiles.jar"]);

        let clock = Arc::new(ManualClock::new());
        let (fetcher, source) = source(fetcher);
        let source = source
            .with_cache_ttl(Some(Duration::from_secs(600)))
            .with_clock(clock.clone());

        source.list("3.9.1").await.unwrap();
        let issued = fetcher.request_count();

        clock.advance(Duration::from_secs(599));
        source.list("3.9.1").await.unwrap();
        assert_eq!(fetcher.request_count(), issued);

        clock.advance(Duration::from_secs(1));
        source.list("3.9.1").await.unwrap();
        assert_eq!(fetcher.request_count(), issued * 2);
    }

    #[tokio::test]
    async fn test_missing_view_is_empty_and_cached() {
        let (fetcher, source) = source(MemoryFetcher::new());

        assert!(source.list("3.9.1").await.unwrap().is_empty());
        assert!(source.list("3.9.1").await.unwrap().is_empty());
        assert_eq!(fetcher.requests(), vec![VIEW.to_string()]);
    }

    #[tokio::test]
    async fn test_unreachable_view_is_not_cached() {
        let mut fetcher = MemoryFetcher::new();
        fetcher.add_status(VIEW, 503);
        let (fetcher, source) = source(fetcher);

        assert!(source.list("3.9.1").await.unwrap().is_empty());
        assert!(source.cache().is_empty());
        source.list("3.9.1").await.unwrap();
        assert_eq!(fetcher.request_count(), 2);
    }

    #[tokio::test]
    async fn test_failed_version_download_skips_only_that_plugin() {
        let mut fetcher = MemoryFetcher::new();
        add_view(&mut fetcher, vec![job("a", "blue"), job("b", "blue")]);
        let a = add_build(&mut fetcher, "a", &["plugins/a/a.jar", "plugins/a/a.jar-version"]);
        fetcher.add_status(format!("{a}/artifact/plugins/a/a.jar-version"), 500);
        let b = add_build(&mut fetcher, "b", &["plugins/b/b.jar", "plugins/b/b.jar-version"]);
        fetcher.add(format!("{b}/artifact/plugins/b/b.jar-version"), "1.0");

        let (_, source) = source(fetcher);
        let plugins = source.list("3.9.1").await.unwrap();

        assert_eq!(plugins.len(), 1);
        assert_eq!(plugins[0].name(), "b");
        assert_eq!(plugins[0].version(), "1.0");
    }

    #[tokio::test]
    async fn test_unreadable_job_is_skipped() {
        let mut fetcher = MemoryFetcher::new();
        add_view(&mut fetcher, vec![job("a", "blue"), job("b", "blue")]);
        fetcher.add(format!("{CI}/job/a/api/json"), "not json");
        add_build(&mut fetcher, "b", &["plugins/b/b.jar"]);

        let (_, source) = source(fetcher);
        let plugins = source.list("3.9.1").await.unwrap();
        assert_eq!(plugins.len(), 1);
        assert_eq!(plugins[0].name(), "b");
    }

    #[tokio::test]
    async fn test_missing_version_file_keeps_versionless_plugin() {
        let mut fetcher = MemoryFetcher::new();
        add_view(&mut fetcher, vec![job("hooks", "blue")]);
        add_build(&mut fetcher, "hooks", &["plugins/hooks/hooks.jar"]);

        let (_, source) = source(fetcher);
        let plugins = source.list("3.9.1").await.unwrap();
        assert_eq!(plugins.len(), 1);
        assert_eq!(plugins[0].version(), "");
        assert_eq!(plugins[0].description(), "");
    }

    #[tokio::test]
    async fn test_jar_is_preferred_over_js() {
        let mut fetcher = MemoryFetcher::new();
        add_view(&mut fetcher, vec![job("x", "blue")]);
        let build = add_build(
            &mut fetcher,
            "x",
            &["x/x.js", "x/x.js-version", "x/x.jar", "x/x.jar-version"],
        );
        fetcher.add(format!("{build}/artifact/x/x.jar-version"), "2.0");
        fetcher.add(format!("{build}/artifact/x/x.js-version"), "1.0");

        let (_, source) = source(fetcher);
        let plugins = source.list("3.9.1").await.unwrap();
        assert_eq!(plugins[0].version(), "2.0");
        assert!(plugins[0].location().ends_with("/x/x.jar"));
    }

    #[tokio::test]
    async fn test_js_plugin() {
        let mut fetcher = MemoryFetcher::new();
        add_view(&mut fetcher, vec![job("reviewers-ui", "blue")]);
        let build = add_build(
            &mut fetcher,
            "reviewers-ui",
            &[
                "plugins/reviewers-ui/reviewers-ui-static.js",
                "plugins/reviewers-ui/reviewers-ui.js",
                "plugins/reviewers-ui/reviewers-ui.js-version",
            ],
        );
        fetcher.add(
            format!("{build}/artifact/plugins/reviewers-ui/reviewers-ui.js-version"),
            "0.3\r\n",
        );

        let (_, source) = source(fetcher);
        let plugins = source.list("3.9.1").await.unwrap();
        assert_eq!(plugins[0].name(), "reviewers-ui");
        assert_eq!(plugins[0].version(), "0.3");
        assert!(plugins[0].location().ends_with("/reviewers-ui.js"));
    }

    #[tokio::test]
    async fn test_jar_failure_does_not_fall_back_to_js() {
        let mut fetcher = MemoryFetcher::new();
        add_view(&mut fetcher, vec![job("x", "blue")]);
        let build = add_build(
            &mut fetcher,
            "x",
            &["x/x.jar", "x/x.jar-version", "x/x.js", "x/x.js-version"],
        );
        fetcher.add_status(format!("{build}/artifact/x/x.jar-version"), 500);
        fetcher.add(format!("{build}/artifact/x/x.js-version"), "1.0");

        let (_, source) = source(fetcher);
        assert!(source.list("3.9.1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_maven_job_is_named_from_job_url() {
        let mut fetcher = MemoryFetcher::new();
        let name = "plugin-ai-code-review-mvn-stable-3.9";
        add_view(&mut fetcher, vec![job(name, "blue")]);
        add_build(&mut fetcher, name, &["target/ai-code-review-1.0.0.jar"]);

        let (_, source) = source(fetcher);
        let plugins = source.list("3.9.1").await.unwrap();
        assert_eq!(plugins[0].name(), "ai-code-review");
    }

    #[tokio::test]
    async fn test_unreadable_description_is_tolerated() {
        let mut fetcher = MemoryFetcher::new();
        add_view(&mut fetcher, vec![job("x", "blue")]);
        let build = add_build(&mut fetcher, "x", &["x/x.jar", "x/x.json"]);
        fetcher.add_status(format!("{build}/artifact/x/x.json"), 500);

        let (_, source) = source(fetcher);
        let plugins = source.list("3.9.1").await.unwrap();
        assert_eq!(plugins.len(), 1);
        assert_eq!(plugins[0].description(), "");
    }

    #[tokio::test]
    async fn test_job_without_successful_build() {
        let mut fetcher = MemoryFetcher::new();
        add_view(&mut fetcher, vec![job("x", "blue")]);
        fetcher.add_json(
            format!("{CI}/job/x/api/json"),
            &json!({"lastSuccessfulBuild": null}),
        );

        let (_, source) = source(fetcher);
        assert!(source.list("3.9.1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_build_without_revision() {
        let mut fetcher = MemoryFetcher::new();
        add_view(&mut fetcher, vec![job("x", "blue")]);
        fetcher.add_json(
            format!("{CI}/job/x/api/json"),
            &json!({"lastSuccessfulBuild": {"url": format!("{CI}/job/x/1/")}}),
        );
        fetcher.add_json(
            format!("{CI}/job/x/1/api/json"),
            &json!({"url": format!("{CI}/job/x/1/"), "artifacts": [{"relativePath": "x/x.jar"}]}),
        );

        let (_, source) = source(fetcher);
        let plugins = source.list("3.9.1").await.unwrap();
        assert_eq!(plugins[0].short_revision(), "");
    }

    #[tokio::test]
    async fn test_duplicate_names_keep_latest() {
        let mut fetcher = MemoryFetcher::new();
        add_view(&mut fetcher, vec![job("x-bazel", "blue"), job("x-mvn", "blue")]);
        let a = add_build(&mut fetcher, "x-bazel", &["plugins/x/x.jar", "plugins/x/x.jar-version"]);
        fetcher.add(format!("{a}/artifact/plugins/x/x.jar-version"), "1.0");
        let b = add_build(&mut fetcher, "x-mvn", &["plugins/x/x.jar", "plugins/x/x.jar-version"]);
        fetcher.add(format!("{b}/artifact/plugins/x/x.jar-version"), "1.1");

        let (_, source) = source(fetcher);
        let plugins = source.list("3.9.1").await.unwrap();
        assert_eq!(plugins.len(), 1);
        assert_eq!(plugins[0].version(), "1.1");
    }

    #[tokio::test]
    async fn test_unreleased_host_reads_master_view() {
        let (fetcher, source) = source(MemoryFetcher::new());
        source.list("3.10.0-SNAPSHOT").await.unwrap();
        assert_eq!(
            fetcher.requests(),
            vec![format!("{CI}/view/Plugins-master/api/json")]
        );
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        let fetcher: Arc<dyn HttpFetch> = Arc::new(MemoryFetcher::new());
        for url in ["not a url", "ftp://ci.example.com", "mailto:ci@example.com"] {
            let result = CiBuildSource::new(url, BranchResolver::new("3.10.0"), fetcher.clone());
            assert!(
                matches!(result, Err(CiError::InvalidBaseUrl { .. })),
                "{url}"
            );
        }
    }

    #[test]
    fn test_view_url_ignores_trailing_slash() {
        let fetcher: Arc<dyn HttpFetch> = Arc::new(MemoryFetcher::new());
        let source =
            CiBuildSource::new("https://ci.example.com/", BranchResolver::new("3.10.0"), fetcher)
                .unwrap();
        assert_eq!(source.view_url("Plugins-master"), "https://ci.example.com/view/Plugins-master/api/json");
    }
}
