use std::collections::HashMap;

/// Human-readable descriptions for plugins shipped with the host.
#[derive(Debug, Clone, Default)]
pub struct Descriptions {
    entries: HashMap<String, String>,
}

const BUILTIN: &[(&str, &str)] = &[
    (
        "codemirror-editor",
        "CodeMirror plugin for polygerrit",
    ),
    (
        "commit-message-length-validator",
        "Plugin to validate that commit messages conform to length limits",
    ),
    ("delete-project", "Provides the ability to delete a project"),
    (
        "download-commands",
        "Adds the standard download schemes and commands",
    ),
    (
        "gitiles",
        "Plugin running Gitiles alongside a Gerrit server",
    ),
    ("hooks", "Old-style fork+exec hooks"),
    (
        "plugin-manager",
        "Adds support for discovering and installing other plugins",
    ),
    (
        "replication",
        "Copies to other servers using the Git protocol",
    ),
    (
        "reviewnotes",
        "Annotates merged commits using notes on refs/notes/review",
    ),
    (
        "singleusergroup",
        "GroupBackend enabling users to be directly added to access rules",
    ),
    (
        "webhooks",
        "Allows to propagate Gerrit events to remote http endpoints",
    ),
];

impl Descriptions {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The table of plugins every host distribution ships.
    pub fn builtin() -> Self {
        let mut table = Self::new();
        table.extend(
            BUILTIN
                .iter()
                .map(|(name, text)| (name.to_string(), text.to_string())),
        );
        table
    }

    pub fn with(mut self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.entries.insert(name.into(), description.into());
        self
    }

    /// Add or replace entries.
    pub fn extend(&mut self, entries: impl IntoIterator<Item = (String, String)>) {
        self.entries.extend(entries);
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
