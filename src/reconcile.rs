//! Per-project reconciliation and the cross-project rollup.
//!
//! [`Reconciler::reconcile_project`] runs the steps for one project in a fixed
//! order: exclusion filtering, license resolution, then diffing. Resolution
//! runs after filtering, so excluded packages never touch the metadata store.
//!
//! [`consolidate`] folds many [`ProjectResult`] values into a
//! [`ConsolidatedView`].

use indexmap::IndexMap;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::debug;

use crate::diff::{build_package_summaries, compute_diff};
use crate::exclude::{self, CompiledExclusions};
use crate::license::LicenseResolver;
use crate::model::{
    ConsolidatedPackage, ConsolidatedView, Dependency, Ecosystem, LicenseKey,
    PackageChangeSummary, ProjectDiffRow, ProjectResult,
};
use crate::version;

/// The dependencies of a project at one commit, with the tree they came from.
///
/// `root` is where npm metadata (`node_modules`) for this snapshot lives.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub root: PathBuf,
    pub dependencies: Vec<Dependency>,
}

impl Snapshot {
    pub fn new(root: impl Into<PathBuf>, dependencies: Vec<Dependency>) -> Self {
        Self {
            root: root.into(),
            dependencies,
        }
    }
}

pub struct Reconciler {
    resolver: LicenseResolver,
}

impl Reconciler {
    pub fn new(resolver: LicenseResolver) -> Self {
        Self { resolver }
    }

    /// Reconciles two snapshots of one project into an immutable result.
    pub fn reconcile_project(
        &self,
        project_name: &str,
        exclusions: &CompiledExclusions,
        from: Snapshot,
        to: Snapshot,
    ) -> ProjectResult {
        let from_dependencies = self.prepare(project_name, "from", exclusions, from);
        let to_dependencies = self.prepare(project_name, "to", exclusions, to);

        let diff_entries = compute_diff(&from_dependencies, &to_dependencies);
        let package_summaries = build_package_summaries(&from_dependencies, &to_dependencies);

        debug!(
            "Project '{}': {} diff entries, {} summary rows",
            project_name,
            diff_entries.len(),
            package_summaries.len()
        );

        ProjectResult {
            project_name: project_name.to_string(),
            from_dependencies,
            to_dependencies,
            diff_entries,
            package_summaries,
        }
    }

    fn prepare(
        &self,
        project_name: &str,
        side: &str,
        exclusions: &CompiledExclusions,
        snapshot: Snapshot,
    ) -> Vec<Dependency> {
        let total = snapshot.dependencies.len();
        let mut kept = exclude::filter(&snapshot.dependencies, exclusions);
        debug!(
            "Project '{}' ({}): {} of {} dependencies after excludes",
            project_name,
            side,
            kept.len(),
            total
        );

        self.resolver.resolve_all(&mut kept, &snapshot.root);
        kept
    }
}

/// Grouping key of the consolidated table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct GroupKey {
    ecosystem: Ecosystem,
    name: String,
    to_license: String,
}

/// Merges the results of several projects.
///
/// Summary rows are grouped by `(ecosystem, name, to_license)`. Each group
/// reports the first row with a non-empty `to_version` (else its first row),
/// the highest version seen on either side of any row, and the OR of the
/// change flags. The license URL is the first non-empty one found among the
/// `to` dependencies with the same `(ecosystem, name, license)`.
///
/// Packages are sorted by ecosystem, name, then license. Diff rows are
/// sorted by project name, then package name.
pub fn consolidate(results: &[ProjectResult]) -> ConsolidatedView {
    let mut groups: IndexMap<GroupKey, Vec<&PackageChangeSummary>> = IndexMap::new();
    for summary in results.iter().flat_map(|r| &r.package_summaries) {
        let key = GroupKey {
            ecosystem: summary.ecosystem,
            name: summary.name.clone(),
            to_license: summary.to_license.clone(),
        };
        groups.entry(key).or_default().push(summary);
    }

    let urls = license_urls(results);

    let mut packages: Vec<ConsolidatedPackage> = groups
        .into_iter()
        .filter_map(|(key, rows)| {
            let representative = rows
                .iter()
                .find(|r| !r.to_version.is_empty())
                .or_else(|| rows.first())?;

            let versions: Vec<&str> = rows
                .iter()
                .flat_map(|r| [r.from_version.as_str(), r.to_version.as_str()])
                .filter(|v| !v.is_empty())
                .collect();

            let license_key = LicenseKey {
                ecosystem: key.ecosystem,
                name: key.name.clone(),
                license: key.to_license.clone(),
            };

            Some(ConsolidatedPackage {
                ecosystem: key.ecosystem,
                name: key.name,
                from_version: representative.from_version.clone(),
                to_version: representative.to_version.clone(),
                from_license: representative.from_license.clone(),
                to_license: representative.to_license.clone(),
                highest_version: version::highest(&versions),
                license: key.to_license,
                license_url: urls.get(&license_key).map(|u| u.to_string()),
                has_version_change: rows.iter().any(|r| r.has_version_change),
                has_license_change: rows.iter().any(|r| r.has_license_change),
            })
        })
        .collect();

    packages.sort_by(|a, b| {
        a.ecosystem
            .as_str()
            .cmp(b.ecosystem.as_str())
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
            .then_with(|| a.license.to_lowercase().cmp(&b.license.to_lowercase()))
    });

    let mut diffs: Vec<ProjectDiffRow> = results
        .iter()
        .flat_map(|r| {
            r.diff_entries.iter().map(|entry| ProjectDiffRow {
                project_name: r.project_name.clone(),
                entry: entry.clone(),
            })
        })
        .collect();

    diffs.sort_by(|a, b| {
        a.project_name.cmp(&b.project_name).then_with(|| {
            a.entry
                .package_name()
                .to_lowercase()
                .cmp(&b.entry.package_name().to_lowercase())
        })
    });

    ConsolidatedView { packages, diffs }
}

fn license_urls(results: &[ProjectResult]) -> HashMap<LicenseKey, &str> {
    let mut urls = HashMap::new();
    for dep in results.iter().flat_map(|r| &r.to_dependencies) {
        if let Some(url) = dep.license_url.as_deref().filter(|u| !u.is_empty()) {
            urls.entry(dep.license_key()).or_insert(url);
        }
    }
    urls
}
