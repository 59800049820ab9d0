//! JSON shapes exposed by the CI server's `api/json` endpoints.
//!
//! Only the fields the plugin index reads are modelled; everything else in
//! the payloads is ignored. Optional fields default so that a sparse payload
//! still decodes.

use plugin_index_types::short_revision;
use serde::Deserialize;

/// Job color reported for a job whose last build succeeded.
pub const SUCCESS_COLOR: &str = "blue";

/// A named bucket of jobs, one view per host release branch.
#[derive(Debug, Clone, Deserialize)]
pub struct View {
    #[serde(default)]
    pub jobs: Vec<Job>,
}

/// A job as listed in a view.
#[derive(Debug, Clone, Deserialize)]
pub struct Job {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
    /// Health of the last build; absent for folders and never-built jobs
    #[serde(default)]
    pub color: Option<String>,
}

impl Job {
    /// Returns true if the job's last build succeeded.
    pub fn is_successful(&self) -> bool {
        self.color.as_deref() == Some(SUCCESS_COLOR)
    }
}

/// Job details, of which only the last successful build matters.
#[derive(Debug, Clone, Deserialize)]
pub struct JobDetails {
    #[serde(rename = "lastSuccessfulBuild", default)]
    pub last_successful_build: Option<BuildRef>,
}

/// Pointer to a build.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildRef {
    pub url: String,
}

/// One executed run of a job.
#[derive(Debug, Clone, Deserialize)]
pub struct Build {
    pub url: String,
    #[serde(default)]
    pub artifacts: Vec<Artifact>,
    /// Heterogeneous action objects; empty objects and nulls are common
    #[serde(default)]
    pub actions: Vec<Option<BuildAction>>,
}

/// A file produced by a build.
#[derive(Debug, Clone, Deserialize)]
pub struct Artifact {
    #[serde(rename = "relativePath")]
    pub relative_path: String,
}

/// The subset of a build action that carries source-control information.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BuildAction {
    #[serde(rename = "lastBuiltRevision", default)]
    pub last_built_revision: Option<Revision>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Revision {
    #[serde(rename = "SHA1", default)]
    pub sha1: Option<String>,
}

/// Contents of the `.json` metadata artifact published next to a plugin.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArtifactMetadata {
    #[serde(default)]
    pub description: Option<String>,
}

impl Build {
    /// First artifact whose path ends in `suffix`, skipping `-static` variants.
    pub fn find_artifact(&self, suffix: &str) -> Option<&Artifact> {
        let static_suffix = format!("-static{}", suffix);
        self.artifacts.iter().find(|artifact| {
            let path = artifact.relative_path.as_str();
            path.ends_with(suffix) && !path.ends_with(&static_suffix)
        })
    }

    /// Download URL of an artifact of this build.
    pub fn artifact_url(&self, artifact: &Artifact) -> String {
        format!(
            "{}/artifact/{}",
            self.url.trim_end_matches('/'),
            artifact.relative_path
        )
    }

    /// Abbreviated revision of the first action that recorded one.
    pub fn short_revision(&self) -> Option<String> {
        self.actions
            .iter()
            .flatten()
            .filter_map(|action| action.last_built_revision.as_ref())
            .find_map(|revision| revision.sha1.as_deref())
            .map(short_revision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(paths: &[&str]) -> Build {
        Build {
            url: "https://ci.example.com/job/plugin-x/42/".to_string(),
            artifacts: paths
                .iter()
                .map(|p| Artifact {
                    relative_path: p.to_string(),
                })
                .collect(),
            actions: Vec::new(),
        }
    }

    #[test]
    fn test_view_decodes_sparse_jobs() {
        let view: View = serde_json::from_str(
            r#"{"_class":"hudson.model.ListView","name":"Plugins-master","jobs":[
                {"name":"plugin-a","url":"https://ci/job/plugin-a/","color":"blue"},
                {"name":"folder","url":"https://ci/job/folder/"}
            ]}"#,
        )
        .unwrap();

        assert_eq!(view.jobs.len(), 2);
        assert!(view.jobs[0].is_successful());
        assert!(!view.jobs[1].is_successful());
    }

    #[test]
    fn test_only_blue_is_successful() {
        for color in ["red", "blue_anime", "disabled", "notbuilt", "yellow"] {
            let job = Job {
                name: "x".to_string(),
                url: "u".to_string(),
                color: Some(color.to_string()),
            };
            assert!(!job.is_successful(), "{color}");
        }
    }

    #[test]
    fn test_find_artifact_skips_static() {
        let b = build(&[
            "bazel-bin/plugins/x/x-static.jar",
            "bazel-bin/plugins/x/x.jar",
            "bazel-bin/plugins/x/x.jar-version",
        ]);
        assert_eq!(
            b.find_artifact(".jar").unwrap().relative_path,
            "bazel-bin/plugins/x/x.jar"
        );
        assert_eq!(
            b.find_artifact(".jar-version").unwrap().relative_path,
            "bazel-bin/plugins/x/x.jar-version"
        );
        assert!(b.find_artifact(".js").is_none());
    }

    #[test]
    fn test_only_static_artifact_is_no_match() {
        let b = build(&["x-static.js"]);
        assert!(b.find_artifact(".js").is_none());
    }

    #[test]
    fn test_artifact_url() {
        let b = build(&["bazel-bin/plugins/x/x.jar"]);
        let artifact = b.find_artifact(".jar").unwrap();
        assert_eq!(
            b.artifact_url(artifact),
            "https://ci.example.com/job/plugin-x/42/artifact/bazel-bin/plugins/x/x.jar"
        );
    }

    #[test]
    fn test_short_revision_from_actions() {
        let b: Build = serde_json::from_str(
            r#"{"url":"u","artifacts":[],"actions":[
                {},
                null,
                {"_class":"hudson.model.CauseAction","causes":[]},
                {"_class":"hudson.plugins.git.util.BuildData",
                 "lastBuiltRevision":{"SHA1":"0123456789abcdef0123456789abcdef01234567"}}
            ]}"#,
        )
        .unwrap();
        assert_eq!(b.short_revision().as_deref(), Some("01234567"));
    }

    #[test]
    fn test_short_revision_missing() {
        let b: Build = serde_json::from_str(r#"{"url":"u"}"#).unwrap();
        assert_eq!(b.short_revision(), None);
        assert!(b.artifacts.is_empty());
    }
}
