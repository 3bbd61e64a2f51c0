//! Common types for manifests

/// Dependency group of a package.json, in processing order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DependencyGroup {
    /// `devDependencies`
    Development,
    /// `dependencies`
    Runtime,
}

impl DependencyGroup {
    /// All groups, in the order they are updated
    pub const ALL: [DependencyGroup; 2] = [DependencyGroup::Development, DependencyGroup::Runtime];

    /// Returns the package.json field name of the group
    pub fn as_str(&self) -> &'static str {
        match self {
            DependencyGroup::Development => "devDependencies",
            DependencyGroup::Runtime => "dependencies",
        }
    }
}

impl std::fmt::Display for DependencyGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A dependency declared in a manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyEntry {
    pub group: DependencyGroup,
    /// Package name (e.g., "lodash", "@types/node")
    pub name: String,
    /// Version constraint as written; `None` when the value is not a string
    pub version: Option<String>,
}

impl DependencyEntry {
    /// Git dependencies (`github:user/repo`) are not tracked by dist-tags
    pub fn is_git(&self) -> bool {
        self.version
            .as_deref()
            .is_some_and(|v| v.starts_with("github:"))
    }
}
