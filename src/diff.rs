//! Comparison of two dependency snapshots.
//!
//! Two views are derived from the same pair of snapshots:
//!
//! - [`compute_diff`] produces a sparse list of [`DiffEntry`] values
//!   (added, removed, license changed). Unchanged packages produce nothing.
//! - [`build_package_summaries`] produces one [`PackageChangeSummary`] per
//!   row, including unchanged packages and version-only changes.
//!
//! Rows are keyed by [`LicenseKey`] `(ecosystem, name, license)`, so two
//! entries of one package with different licenses stay distinct rows. Rows
//! are paired across snapshots in two passes: first by the full key, then
//! leftover rows by [`PackageIdentity`] `(ecosystem, name)`. The second pass
//! is what turns a changed license into one license-changed row instead of an
//! unrelated removal and addition.
//!
//! When a snapshot lists the same key more than once (the same package
//! reached through several transitive paths), the first occurrence is kept.
//! This is intended: listing order is the tie-breaker.

use indexmap::map::Entry;
use indexmap::IndexMap;
use std::collections::{HashMap, VecDeque};

use crate::model::{
    Dependency, DiffEntry, LicenseKey, PackageChangeSummary, PackageIdentity, PackageStatus,
    StatusRow,
};

type Pair<'a> = (Option<&'a Dependency>, Option<&'a Dependency>);

/// Indexes a snapshot by row key, keeping the first entry per key.
fn by_license_key(dependencies: &[Dependency]) -> IndexMap<LicenseKey, &Dependency> {
    let mut map = IndexMap::with_capacity(dependencies.len());
    for dependency in dependencies {
        if let Entry::Vacant(slot) = map.entry(dependency.license_key()) {
            slot.insert(dependency);
        }
    }
    map
}

fn differs(a: &str, b: &str) -> bool {
    a.to_lowercase() != b.to_lowercase()
}

/// Pairs up the rows of both snapshots.
///
/// Pairs come out in `from` order, followed by the unpaired `to` rows in
/// `to` order.
fn paired_rows<'a>(from: &'a [Dependency], to: &'a [Dependency]) -> Vec<Pair<'a>> {
    let from_map = by_license_key(from);
    let to_map = by_license_key(to);

    let to_only: Vec<&Dependency> = to_map
        .iter()
        .filter(|(key, _)| !from_map.contains_key(*key))
        .map(|(_, dep)| *dep)
        .collect();

    let mut waiting: HashMap<PackageIdentity, VecDeque<usize>> = HashMap::new();
    for (idx, dep) in to_only.iter().enumerate() {
        waiting.entry(dep.identity()).or_default().push_back(idx);
    }

    let mut consumed = vec![false; to_only.len()];
    let mut pairs = Vec::with_capacity(from_map.len() + to_only.len());

    for (key, from_dep) in &from_map {
        let to_dep = match to_map.get(key) {
            Some(exact) => Some(*exact),
            None => waiting
                .get_mut(&from_dep.identity())
                .and_then(|queue| queue.pop_front())
                .map(|idx| {
                    consumed[idx] = true;
                    to_only[idx]
                }),
        };
        pairs.push((Some(*from_dep), to_dep));
    }

    for (idx, to_dep) in to_only.iter().enumerate() {
        if !consumed[idx] {
            pairs.push((None, Some(*to_dep)));
        }
    }

    pairs
}

/// Computes added, removed, and license-changed entries.
///
/// Entries are ordered: added (in `to` order), removed (in `from` order),
/// then license changes (in `from` order).
pub fn compute_diff(from: &[Dependency], to: &[Dependency]) -> Vec<DiffEntry> {
    let mut added = Vec::new();
    let mut removed = Vec::new();
    let mut license_changed = Vec::new();

    for pair in paired_rows(from, to) {
        match pair {
            (None, Some(t)) => added.push(DiffEntry::added(t.clone())),
            (Some(f), None) => removed.push(DiffEntry::removed(f.clone())),
            (Some(f), Some(t)) if differs(&f.license, &t.license) => {
                license_changed.push(DiffEntry::license_changed(f.clone(), t.clone()))
            }
            _ => {}
        }
    }

    added.extend(removed);
    added.extend(license_changed);
    added
}

fn version_of(dep: Option<&Dependency>) -> String {
    dep.map(|d| d.version.clone()).unwrap_or_default()
}

fn license_of(dep: Option<&Dependency>) -> String {
    dep.map(|d| d.license.clone()).unwrap_or_default()
}

/// Builds one summary row per paired row.
///
/// A row present on only one side counts as a version change and never as
/// a license change.
pub fn build_package_summaries(
    from: &[Dependency],
    to: &[Dependency],
) -> Vec<PackageChangeSummary> {
    paired_rows(from, to)
        .into_iter()
        .filter_map(|(from_dep, to_dep)| {
            let base = to_dep.or(from_dep)?;

            let (has_version_change, has_license_change) = match (from_dep, to_dep) {
                (Some(f), Some(t)) => (
                    differs(&f.version, &t.version),
                    differs(&f.license, &t.license),
                ),
                _ => (true, false),
            };

            Some(PackageChangeSummary {
                ecosystem: base.ecosystem,
                name: base.name.clone(),
                from_version: version_of(from_dep),
                from_license: license_of(from_dep),
                to_version: version_of(to_dep),
                to_license: license_of(to_dep),
                has_version_change,
                has_license_change,
            })
        })
        .collect()
}

/// Builds the full per-package status view, sorted by name
/// (case-insensitive).
///
/// A license change takes precedence over a version change.
pub fn build_status_rows(from: &[Dependency], to: &[Dependency]) -> Vec<StatusRow> {
    let mut rows: Vec<StatusRow> = paired_rows(from, to)
        .into_iter()
        .filter_map(|(from_dep, to_dep)| {
            let base = to_dep.or(from_dep)?;

            let status = match (from_dep, to_dep) {
                (None, _) => PackageStatus::Added,
                (_, None) => PackageStatus::Removed,
                (Some(f), Some(t)) if differs(&f.license, &t.license) => {
                    PackageStatus::LicenseChanged
                }
                (Some(f), Some(t)) if differs(&f.version, &t.version) => {
                    PackageStatus::VersionChanged
                }
                _ => PackageStatus::Unchanged,
            };

            let license_url = to_dep
                .and_then(|d| d.license_url.clone())
                .or_else(|| from_dep.and_then(|d| d.license_url.clone()));

            Some(StatusRow {
                ecosystem: base.ecosystem,
                name: base.name.clone(),
                status,
                from_version: version_of(from_dep),
                from_license: license_of(from_dep),
                to_version: version_of(to_dep),
                to_license: license_of(to_dep),
                license_url,
            })
        })
        .collect();

    rows.sort_by_cached_key(|row| row.name.to_lowercase());
    rows
}
