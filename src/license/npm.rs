use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::{LicenseInfo, LicenseSource};
use crate::error::ResolveError;
use crate::model::{Ecosystem, UNKNOWN_LICENSE};

/// Reads licenses from `package.json` files under a project's `node_modules`.
pub struct NpmLicenseSource;

#[derive(Deserialize)]
struct PackageJson {
    license: Option<String>,
    licenses: Option<serde_json::Value>,
    homepage: Option<String>,
    repository: Option<RepositoryField>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RepositoryField {
    String(String),
    Object { url: Option<String> },
}

impl RepositoryField {
    fn url(self) -> Option<String> {
        match self {
            RepositoryField::String(s) => Some(s),
            RepositoryField::Object { url } => url,
        }
    }
}

/// Joins the `type` of each entry of the deprecated `licenses` array.
fn join_legacy_licenses(licenses: &serde_json::Value) -> Option<String> {
    let entries = licenses.as_array()?;
    let types: Vec<&str> = entries
        .iter()
        .filter_map(|entry| entry.get("type").and_then(|t| t.as_str()))
        .filter(|t| !t.is_empty())
        .collect();

    if types.is_empty() {
        Some(UNKNOWN_LICENSE.to_string())
    } else {
        Some(types.join(" OR "))
    }
}

impl LicenseSource for NpmLicenseSource {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Npm
    }

    fn locate(
        &self,
        name: &str,
        _version: &str,
        project_root: &Path,
    ) -> Result<PathBuf, ResolveError> {
        let path = project_root
            .join("node_modules")
            .join(name)
            .join("package.json");

        if path.is_file() {
            Ok(path)
        } else {
            Err(ResolveError::NotFound { path })
        }
    }

    fn parse(&self, content: &str) -> Result<LicenseInfo, ResolveError> {
        let pkg: PackageJson = serde_json::from_str(content)?;

        let license = match pkg.license {
            Some(license) => Some(license),
            None => pkg.licenses.as_ref().and_then(join_legacy_licenses),
        }
        .filter(|l| !l.is_empty());

        if let Some(license) = license.filter(|l| l != UNKNOWN_LICENSE) {
            return Ok(LicenseInfo::known(license));
        }

        // No usable license: point at the homepage, else the repository.
        let url = match pkg.homepage {
            Some(homepage) => Some(homepage),
            None => pkg.repository.and_then(RepositoryField::url),
        };

        Ok(LicenseInfo::unknown(url))
    }

    fn fallback_url(&self, name: &str, _version: &str) -> String {
        format!("https://www.npmjs.com/package/{}", name)
    }
}
