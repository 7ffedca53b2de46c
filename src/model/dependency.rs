use serde::{Deserialize, Serialize};

/// License value used whenever no license could be determined.
pub const UNKNOWN_LICENSE: &str = "UNKNOWN";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ecosystem {
    Nuget,
    Npm,
}

impl Ecosystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            Ecosystem::Nuget => "nuget",
            Ecosystem::Npm => "npm",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Ecosystem::Nuget => "NuGet",
            Ecosystem::Npm => "npm",
        }
    }
}

impl std::fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Identity of a package across snapshots: one name within one ecosystem.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageIdentity {
    pub ecosystem: Ecosystem,
    pub name: String,
}

/// Row key for summaries and Added/Removed detection.
///
/// Embedding the license means a license change yields two distinct rows
/// instead of one row silently overwriting the other.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LicenseKey {
    pub ecosystem: Ecosystem,
    pub name: String,
    pub license: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub name: String,
    pub version: String,
    pub ecosystem: Ecosystem,
    pub license: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_url: Option<String>,
}

impl Dependency {
    pub fn new(name: impl Into<String>, version: impl Into<String>, ecosystem: Ecosystem) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            ecosystem,
            license: UNKNOWN_LICENSE.to_string(),
            license_url: None,
        }
    }

    pub fn with_license(mut self, license: impl Into<String>) -> Self {
        self.license = license.into();
        self
    }

    pub fn with_license_url(mut self, url: impl Into<String>) -> Self {
        self.license_url = Some(url.into());
        self
    }

    pub fn identity(&self) -> PackageIdentity {
        PackageIdentity {
            ecosystem: self.ecosystem,
            name: self.name.clone(),
        }
    }

    pub fn license_key(&self) -> LicenseKey {
        LicenseKey {
            ecosystem: self.ecosystem,
            name: self.name.clone(),
            license: self.license.clone(),
        }
    }

    pub fn has_known_license(&self) -> bool {
        !self.license.is_empty() && self.license != UNKNOWN_LICENSE
    }
}
