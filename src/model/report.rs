use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{DiffEntry, Ecosystem, ProjectResult};

/// One consolidated package row across all projects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsolidatedPackage {
    pub ecosystem: Ecosystem,
    pub name: String,
    pub from_version: String,
    pub to_version: String,
    pub from_license: String,
    pub to_license: String,
    pub highest_version: String,
    pub license: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_url: Option<String>,
    pub has_version_change: bool,
    pub has_license_change: bool,
}

/// A diff entry tagged with the project it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDiffRow {
    pub project_name: String,
    #[serde(flatten)]
    pub entry: DiffEntry,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConsolidatedView {
    pub packages: Vec<ConsolidatedPackage>,
    pub diffs: Vec<ProjectDiffRow>,
}

/// Complete output of one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub generated_at: DateTime<Utc>,
    pub projects: Vec<ProjectResult>,
    pub consolidated: ConsolidatedView,
}

impl RunReport {
    pub fn new(projects: Vec<ProjectResult>, consolidated: ConsolidatedView) -> Self {
        Self {
            generated_at: Utc::now(),
            projects,
            consolidated,
        }
    }

    pub fn has_license_changes(&self) -> bool {
        self.consolidated.packages.iter().any(|p| p.has_license_change)
    }
}
