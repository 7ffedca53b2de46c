use serde::{Deserialize, Serialize};

use super::{Dependency, Ecosystem};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeType {
    Added,
    Removed,
    LicenseChanged,
}

impl ChangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeType::Added => "Added",
            ChangeType::Removed => "Removed",
            ChangeType::LicenseChanged => "LicenseChanged",
        }
    }
}

impl std::fmt::Display for ChangeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One sparse delta between two snapshots.
///
/// `from` is absent for [`ChangeType::Added`], `to` is absent for
/// [`ChangeType::Removed`], and both are present for
/// [`ChangeType::LicenseChanged`]. The constructors enforce this.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffEntry {
    pub from: Option<Dependency>,
    pub to: Option<Dependency>,
    pub change_type: ChangeType,
}

impl DiffEntry {
    pub fn added(to: Dependency) -> Self {
        Self {
            from: None,
            to: Some(to),
            change_type: ChangeType::Added,
        }
    }

    pub fn removed(from: Dependency) -> Self {
        Self {
            from: Some(from),
            to: None,
            change_type: ChangeType::Removed,
        }
    }

    pub fn license_changed(from: Dependency, to: Dependency) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
            change_type: ChangeType::LicenseChanged,
        }
    }

    /// The side that names the package, preferring `from`.
    fn subject(&self) -> Option<&Dependency> {
        self.from.as_ref().or(self.to.as_ref())
    }

    pub fn package_name(&self) -> &str {
        self.subject().map(|d| d.name.as_str()).unwrap_or_default()
    }

    pub fn ecosystem(&self) -> Option<Ecosystem> {
        self.subject().map(|d| d.ecosystem)
    }

    pub fn license_url(&self) -> Option<&str> {
        self.subject().and_then(|d| d.license_url.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageChangeSummary {
    pub ecosystem: Ecosystem,
    pub name: String,
    pub from_version: String,
    pub from_license: String,
    pub to_version: String,
    pub to_license: String,
    pub has_version_change: bool,
    pub has_license_change: bool,
}

/// Status of a package in the per-project comparison view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PackageStatus {
    Added,
    Removed,
    LicenseChanged,
    VersionChanged,
    Unchanged,
}

impl PackageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PackageStatus::Added => "ADDED",
            PackageStatus::Removed => "REMOVED",
            PackageStatus::LicenseChanged => "LICENSE_CHANGED",
            PackageStatus::VersionChanged => "VERSION_CHANGED",
            PackageStatus::Unchanged => "UNCHANGED",
        }
    }
}

impl std::fmt::Display for PackageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRow {
    pub ecosystem: Ecosystem,
    pub name: String,
    pub status: PackageStatus,
    pub from_version: String,
    pub from_license: String,
    pub to_version: String,
    pub to_license: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_url: Option<String>,
}

/// Everything computed for one project in one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectResult {
    pub project_name: String,
    pub from_dependencies: Vec<Dependency>,
    pub to_dependencies: Vec<Dependency>,
    pub diff_entries: Vec<DiffEntry>,
    pub package_summaries: Vec<PackageChangeSummary>,
}

impl ProjectResult {
    /// Full per-package comparison, sorted by package name.
    pub fn status_rows(&self) -> Vec<StatusRow> {
        crate::diff::build_status_rows(&self.from_dependencies, &self.to_dependencies)
    }

    pub fn count(&self, change_type: ChangeType) -> usize {
        self.diff_entries
            .iter()
            .filter(|e| e.change_type == change_type)
            .count()
    }
}
