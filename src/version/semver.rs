use semver::Version;

/// Direction of a version change between the manifest and the resolved version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Upgrade,
    Downgrade,
    /// Different text, same version (e.g. `^1.2.3` -> `1.2.3`)
    Pin,
    /// Either side is not a semver version (tags, URLs, `*`)
    Unknown,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Upgrade => "upgrade",
            ChangeKind::Downgrade => "downgrade",
            ChangeKind::Pin => "pin",
            ChangeKind::Unknown => "change",
        }
    }
}

/// Parse a version string into a semver::Version, normalizing partial versions.
///
/// Handles partial versions like "1" or "1.2" by padding with zeros.
/// A single leading range operator (`^`, `~`, `=`, `>=`) or `v` is ignored.
///
/// Examples:
/// - "1" -> Version(1, 0, 0)
/// - "^1.2" -> Version(1, 2, 0)
/// - "~1.2.3" -> Version(1, 2, 3)
pub fn parse_version(version: &str) -> Option<Version> {
    let version = strip_operator(version.trim());
    let parts: Vec<&str> = version.split('.').collect();
    let normalized = match parts.len() {
        1 => format!("{}.0.0", parts[0]),
        2 => format!("{}.{}.0", parts[0], parts[1]),
        _ => version.to_string(),
    };
    Version::parse(&normalized).ok()
}

fn strip_operator(version: &str) -> &str {
    let version = [">=", "^", "~", "="]
        .iter()
        .find_map(|op| version.strip_prefix(op))
        .unwrap_or(version);
    version.strip_prefix('v').unwrap_or(version).trim_start()
}

/// Classify the change from the manifest's current version to the new one
pub fn classify_change(current: &str, new: &str) -> ChangeKind {
    let (Some(current), Some(new)) = (parse_version(current), parse_version(new)) else {
        return ChangeKind::Unknown;
    };

    match new.cmp(&current) {
        std::cmp::Ordering::Greater => ChangeKind::Upgrade,
        std::cmp::Ordering::Less => ChangeKind::Downgrade,
        std::cmp::Ordering::Equal => ChangeKind::Pin,
    }
}
