//! Dependency update policy
//!
//! For every dependency the dist-tag listing is fetched once and resolved
//! twice: against `latest` and against the dependency's wanted tag (its
//! override, or `latest`). The manifest is only touched after every query
//! has succeeded.

use thiserror::Error;
use tracing::{info, warn};

use crate::config::Overrides;
use crate::manifest::{DependencyEntry, DependencyGroup, Manifest, ManifestError};
use crate::version::error::RegistryError;
use crate::version::registry::TagRegistry;
use crate::version::resolver::{LATEST_TAG, find_version};
use crate::version::semver::{ChangeKind, classify_change};

#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("Failed to fetch dist-tags for `{package}`: {source}")]
    Registry {
        package: String,
        #[source]
        source: RegistryError,
    },

    #[error(transparent)]
    Manifest(#[from] ManifestError),
}

impl UpdateError {
    /// Exit code of the failed registry command, if any
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            UpdateError::Registry { source, .. } => source.exit_code(),
            UpdateError::Manifest(_) => None,
        }
    }
}

/// Why a dependency was left out of resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// `github:` dependency
    Git,
    /// Version is not a JSON string
    NotAString,
}

/// Result of resolving one dependency
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Skipped(SkipReason),
    /// Wanted version equals the manifest's version
    Unchanged { tag: String, version: String },
    Updated {
        tag: String,
        from: String,
        to: String,
        kind: ChangeKind,
    },
    /// The wanted tag is missing from the listing; entry left untouched
    Unresolvable { tag: String },
}

/// Per-dependency report of an update run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyReport {
    pub group: DependencyGroup,
    pub name: String,
    pub outcome: Outcome,
    /// `latest` version when it differs from the wanted one
    pub newer_latest: Option<String>,
}

impl DependencyReport {
    /// Version to write back, if the entry changes
    fn new_version(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Updated { to, .. } => Some(to),
            _ => None,
        }
    }

    fn log(&self) {
        let name = &self.name;
        match &self.outcome {
            Outcome::Skipped(SkipReason::Git) => {
                info!("- {name} is a git dependency, leaving it as is")
            }
            Outcome::Skipped(SkipReason::NotAString) => {
                warn!("- {name} has a non-string version, leaving it as is")
            }
            Outcome::Unchanged { tag, version } => {
                info!("- {name} already using the '{tag}' version {version}")
            }
            Outcome::Updated { from, to, kind, .. } => {
                info!("- updating {name} from {from} to {to} ({})", kind.as_str())
            }
            Outcome::Unresolvable { tag } => {
                warn!("- failed to find '{tag}' version for {name}")
            }
        }
        if let Some(latest) = &self.newer_latest {
            info!("  | the '{LATEST_TAG}' version is at {latest}");
        }
    }
}

/// Decide what happens to a dependency given its dist-tag listing.
///
/// `tag` is the wanted tag; `current` the version written in the manifest.
pub fn resolve_dependency(listing: &str, tag: &str, current: &str) -> (Outcome, Option<String>) {
    let latest = find_version(listing, LATEST_TAG);
    let Some(wanted) = find_version(listing, tag) else {
        return (
            Outcome::Unresolvable {
                tag: tag.to_string(),
            },
            None,
        );
    };

    let newer_latest = latest.filter(|latest| *latest != wanted);

    let outcome = if wanted == current {
        Outcome::Unchanged {
            tag: tag.to_string(),
            version: wanted,
        }
    } else {
        Outcome::Updated {
            tag: tag.to_string(),
            kind: classify_change(current, &wanted),
            from: current.to_string(),
            to: wanted,
        }
    };

    (outcome, newer_latest)
}

async fn check_dependency(
    entry: DependencyEntry,
    registry: &dyn TagRegistry,
    overrides: &Overrides,
) -> Result<DependencyReport, UpdateError> {
    let skip = |reason| DependencyReport {
        group: entry.group,
        name: entry.name.clone(),
        outcome: Outcome::Skipped(reason),
        newer_latest: None,
    };

    if entry.is_git() {
        return Ok(skip(SkipReason::Git));
    }
    let Some(current) = entry.version.as_deref() else {
        return Ok(skip(SkipReason::NotAString));
    };

    let listing = registry
        .fetch_dist_tags(&entry.name)
        .await
        .map_err(|source| UpdateError::Registry {
            package: entry.name.clone(),
            source,
        })?;

    let (outcome, newer_latest) =
        resolve_dependency(&listing, overrides.tag_for(&entry.name), current);

    Ok(DependencyReport {
        group: entry.group,
        name: entry.name.clone(),
        outcome,
        newer_latest,
    })
}

/// Resolve every dependency of `manifest` and apply the updates.
///
/// Dependencies are processed one at a time, `devDependencies` first. A failed
/// registry query aborts the run and leaves `manifest` unmodified.
pub async fn update_manifest(
    manifest: &mut Manifest,
    registry: &dyn TagRegistry,
    overrides: &Overrides,
) -> Result<Vec<DependencyReport>, UpdateError> {
    info!("Checking dependencies via {}", registry.name());

    let mut reports = Vec::new();
    for group in DependencyGroup::ALL {
        for entry in manifest.dependencies(group) {
            let report = check_dependency(entry, registry, overrides).await?;
            report.log();
            reports.push(report);
        }
    }

    for report in &reports {
        if let Some(version) = report.new_version() {
            manifest.set_version(report.group, &report.name, version)?;
        }
    }

    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::registry::MockTagRegistry;
    use rstest::rstest;

    const LISTING: &str = "latest: 2.3.1\nbeta: 2.4.0-rc1\n";

    #[rstest]
    #[case("latest", "^2.0.0", Outcome::Updated {
        tag: "latest".to_string(),
        from: "^2.0.0".to_string(),
        to: "2.3.1".to_string(),
        kind: ChangeKind::Upgrade,
    }, None)]
    #[case("latest", "2.3.1", Outcome::Unchanged {
        tag: "latest".to_string(),
        version: "2.3.1".to_string(),
    }, None)]
    #[case("beta", "2.3.1", Outcome::Updated {
        tag: "beta".to_string(),
        from: "2.3.1".to_string(),
        to: "2.4.0-rc1".to_string(),
        kind: ChangeKind::Upgrade,
    }, Some("2.3.1"))]
    #[case("beta", "2.4.0-rc1", Outcome::Unchanged {
        tag: "beta".to_string(),
        version: "2.4.0-rc1".to_string(),
    }, Some("2.3.1"))]
    #[case("canary", "2.3.1", Outcome::Unresolvable { tag: "canary".to_string() }, None)]
    fn resolve_dependency_returns_expected(
        #[case] tag: &str,
        #[case] current: &str,
        #[case] expected: Outcome,
        #[case] newer_latest: Option<&str>,
    ) {
        assert_eq!(
            resolve_dependency(LISTING, tag, current),
            (expected, newer_latest.map(String::from))
        );
    }

    #[test]
    fn resolve_dependency_updates_without_latest_tag() {
        let (outcome, newer) = resolve_dependency("next: 4.0.0\n", "next", "3.0.0");

        assert!(matches!(outcome, Outcome::Updated { ref to, .. } if to == "4.0.0"));
        assert_eq!(newer, None);
    }

    #[test]
    fn resolve_dependency_does_not_mistake_tag_name_for_version() {
        // Empty listing: the wanted tag must not be written as the version
        let (outcome, _) = resolve_dependency("", "latest", "1.0.0");
        assert_eq!(
            outcome,
            Outcome::Unresolvable {
                tag: "latest".to_string()
            }
        );
    }

    fn registry_with_listings(
        listings: &'static [(&'static str, &'static str)],
    ) -> MockTagRegistry {
        let mut registry = MockTagRegistry::new();
        registry.expect_name().returning(|| "mock");
        registry.expect_fetch_dist_tags().returning(move |name| {
            listings
                .iter()
                .find(|(pkg, _)| *pkg == name)
                .map(|(_, listing)| listing.to_string())
                .ok_or_else(|| RegistryError::NotFound(name.to_string()))
        });
        registry
    }

    #[tokio::test]
    async fn update_manifest_applies_wanted_versions() {
        let mut manifest = Manifest::parse(
            r#"{
                "devDependencies": { "typescript": "^5.4.0" },
                "dependencies": { "react": "18.3.1", "vite": "5.0.0" }
            }"#,
        )
        .unwrap();
        let registry = registry_with_listings(&[
            ("typescript", "beta: 5.7.0-beta\nlatest: 5.6.3\n"),
            ("react", "latest: 18.3.1\nnext: 19.0.0-rc\n"),
            ("vite", "latest: 5.4.9\nbeta: 6.0.0-beta.2\n"),
        ]);
        let overrides: Overrides = [("vite", "beta")].into_iter().collect();

        let reports = update_manifest(&mut manifest, &registry, &overrides)
            .await
            .unwrap();

        assert_eq!(
            manifest.version(DependencyGroup::Development, "typescript"),
            Some("5.6.3")
        );
        assert_eq!(
            manifest.version(DependencyGroup::Runtime, "react"),
            Some("18.3.1")
        );
        assert_eq!(
            manifest.version(DependencyGroup::Runtime, "vite"),
            Some("6.0.0-beta.2")
        );
        let names: Vec<_> = reports.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["typescript", "react", "vite"]);
        assert_eq!(reports[2].newer_latest.as_deref(), Some("5.4.9"));
    }

    #[tokio::test]
    async fn update_manifest_skips_git_dependencies_without_querying() {
        let mut manifest =
            Manifest::parse(r#"{"dependencies": {"lib": "github:user/lib"}}"#).unwrap();
        let mut registry = MockTagRegistry::new();
        registry.expect_name().returning(|| "mock");
        registry.expect_fetch_dist_tags().times(0);

        let reports = update_manifest(&mut manifest, &registry, &Overrides::default())
            .await
            .unwrap();

        assert_eq!(reports[0].outcome, Outcome::Skipped(SkipReason::Git));
        assert_eq!(
            manifest.version(DependencyGroup::Runtime, "lib"),
            Some("github:user/lib")
        );
    }

    #[tokio::test]
    async fn update_manifest_leaves_unresolvable_entries_untouched() {
        let mut manifest = Manifest::parse(r#"{"dependencies": {"left-pad": "1.0.0"}}"#).unwrap();
        let registry = registry_with_listings(&[("left-pad", "latest: 1.3.0\n")]);
        let overrides: Overrides = [("left-pad", "canary")].into_iter().collect();

        let reports = update_manifest(&mut manifest, &registry, &overrides)
            .await
            .unwrap();

        assert_eq!(
            reports[0].outcome,
            Outcome::Unresolvable {
                tag: "canary".to_string()
            }
        );
        assert_eq!(
            manifest.version(DependencyGroup::Runtime, "left-pad"),
            Some("1.0.0")
        );
    }

    #[tokio::test]
    async fn update_manifest_aborts_without_changes_on_query_failure() {
        let mut manifest = Manifest::parse(
            r#"{"dependencies": {"react": "18.0.0", "missing": "1.0.0"}}"#,
        )
        .unwrap();
        let original = manifest.clone();
        let registry = registry_with_listings(&[("react", "latest: 18.3.1\n")]);

        let err = update_manifest(&mut manifest, &registry, &Overrides::default())
            .await
            .unwrap_err();

        assert!(matches!(err, UpdateError::Registry { ref package, .. } if package == "missing"));
        assert_eq!(manifest, original);
    }
}
