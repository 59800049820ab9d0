use tracing::debug;

/// Branch used for hosts that are unreleased or unrecognised.
pub const MASTER_BRANCH: &str = "master";

/// Prefix the CI server puts in front of branch names to form view names.
pub const DEFAULT_VIEW_PREFIX: &str = "Plugins-";

/// Maps a host version to the CI view holding compatible plugin builds.
///
/// The resolver needs to know which version is currently unreleased (the
/// "next" marker); hosts running it, or a pre-release leading up to it, are
/// served from the master view.
#[derive(Debug, Clone)]
pub struct BranchResolver {
    next_version: String,
    view_prefix: String,
}

impl BranchResolver {
    /// Create a resolver for the given unreleased-version marker.
    pub fn new(next_version: impl Into<String>) -> Self {
        Self {
            next_version: next_version.into().trim().to_string(),
            view_prefix: DEFAULT_VIEW_PREFIX.to_string(),
        }
    }

    /// Use a different view name prefix.
    pub fn with_view_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.view_prefix = prefix.into();
        self
    }

    pub fn next_version(&self) -> &str {
        &self.next_version
    }

    /// Resolve the full CI view name, e.g. `Plugins-stable-3.9`.
    pub fn resolve_view(&self, host_version: &str) -> String {
        format!("{}{}", self.view_prefix, self.branch(host_version))
    }

    /// Resolve the branch name, e.g. `stable-3.9` or `master`.
    pub fn branch(&self, host_version: &str) -> String {
        let version = host_version.trim();

        if !version.chars().next().is_some_and(|c| c.is_ascii_digit()) {
            return MASTER_BRANCH.to_string();
        }

        if self.is_next(version) {
            debug!("{} is the unreleased version, using master", version);
            return MASTER_BRANCH.to_string();
        }

        let parts: Vec<&str> = version.split('.').collect();
        let major = parts[0];
        let Some(minor) = parts.get(1) else {
            debug!("{} has no minor version, using master", version);
            return MASTER_BRANCH.to_string();
        };
        let minor = minor.split('-').next().unwrap_or(minor);

        if let Some(patch) = parts.get(2) {
            if patch.contains('-') && self.is_pre_release_of_next(major, minor) {
                debug!("{} is a pre-release of {}, using master", version, self.next_version);
                return MASTER_BRANCH.to_string();
            }
        }

        format!("stable-{}.{}", major, minor)
    }

    fn is_next(&self, version: &str) -> bool {
        !self.next_version.is_empty() && version.starts_with(&self.next_version)
    }

    fn is_pre_release_of_next(&self, major: &str, minor: &str) -> bool {
        let Ok(minor) = minor.parse::<u64>() else {
            return false;
        };
        let Some(next_minor) = minor.checked_add(1) else {
            return false;
        };
        let candidate = format!("{}.{}", major, next_minor);
        self.marker_matches(&candidate)
    }

    /// `3.6` matches markers `3.6`, `3.6.0` and `3.6-SNAPSHOT`, not `3.60`.
    fn marker_matches(&self, candidate: &str) -> bool {
        match self.next_version.strip_prefix(candidate) {
            Some(rest) => rest.is_empty() || rest.starts_with('.') || rest.starts_with('-'),
            None => false,
        }
    }
}
