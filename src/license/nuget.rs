use serde::Deserialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::{LicenseInfo, LicenseSource};
use crate::error::ResolveError;
use crate::model::Ecosystem;

/// Reads licenses from `.nuspec` files in the global NuGet packages folder.
pub struct NugetLicenseSource {
    cache_root: PathBuf,
}

impl NugetLicenseSource {
    pub fn new(cache_root: impl Into<PathBuf>) -> Self {
        Self {
            cache_root: cache_root.into(),
        }
    }

    /// `{cache}/{name lowercased}/{version}`, the layout NuGet restores into.
    pub fn package_dir(&self, name: &str, version: &str) -> PathBuf {
        self.cache_root.join(name.to_lowercase()).join(version)
    }
}

#[derive(Deserialize)]
struct Nuspec {
    metadata: Option<NuspecMetadata>,
}

#[derive(Deserialize)]
struct NuspecMetadata {
    license: Option<NuspecLicense>,
    #[serde(rename = "licenseUrl")]
    license_url: Option<String>,
}

#[derive(Deserialize)]
struct NuspecLicense {
    #[serde(rename = "@type", default)]
    kind: String,
    #[serde(rename = "$text", default)]
    value: String,
}

impl LicenseSource for NugetLicenseSource {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Nuget
    }

    fn locate(
        &self,
        name: &str,
        version: &str,
        _project_root: &Path,
    ) -> Result<PathBuf, ResolveError> {
        let dir = self.package_dir(name, version);
        if !dir.is_dir() {
            return Err(ResolveError::NotFound { path: dir });
        }

        WalkDir::new(&dir)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .flatten()
            .map(|entry| entry.into_path())
            .find(|path| {
                path.is_file()
                    && path
                        .extension()
                        .map(|e| e.eq_ignore_ascii_case("nuspec"))
                        .unwrap_or(false)
            })
            .ok_or(ResolveError::NotFound { path: dir })
    }

    fn parse(&self, content: &str) -> Result<LicenseInfo, ResolveError> {
        let nuspec: Nuspec = quick_xml::de::from_str(content)?;
        let Some(metadata) = nuspec.metadata else {
            return Ok(LicenseInfo::unknown(None));
        };

        // An SPDX expression wins over the deprecated licenseUrl element.
        if let Some(license) = metadata.license {
            let expression = license.value.trim();
            if license.kind.eq_ignore_ascii_case("expression") && !expression.is_empty() {
                return Ok(LicenseInfo::known(expression));
            }
        }

        let url = metadata
            .license_url
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());

        Ok(LicenseInfo::unknown(url))
    }

    fn fallback_url(&self, name: &str, version: &str) -> String {
        format!("https://www.nuget.org/packages/{}/{}", name, version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UNKNOWN_LICENSE;
    use std::fs;
    use tempfile::TempDir;

    fn source() -> NugetLicenseSource {
        NugetLicenseSource::new("/nonexistent")
    }

    #[test]
    fn test_parse_expression_is_trimmed() {
        let info = source()
            .parse(
                r#"<package><metadata>
                     <license type="expression">  MIT OR Apache-2.0 </license>
                   </metadata></package>"#,
            )
            .unwrap();

        assert_eq!(info, LicenseInfo::known("MIT OR Apache-2.0"));
    }

    #[test]
    fn test_parse_legacy_license_url() {
        let info = source()
            .parse(
                r#"<?xml version="1.0" encoding="utf-8"?>
<package xmlns="http://schemas.microsoft.com/packaging/2011/08/nuspec.xsd">
  <metadata>
    <id>Legacy.Package</id>
    <version>1.0.0</version>
    <licenseUrl> http://example.com/license.txt </licenseUrl>
    <dependencies><group targetFramework=".NETStandard2.0" /></dependencies>
  </metadata>
</package>"#,
            )
            .unwrap();

        assert_eq!(info.license, UNKNOWN_LICENSE);
        assert_eq!(info.license_url.as_deref(), Some("http://example.com/license.txt"));
    }

    #[test]
    fn test_parse_file_license_falls_through_to_url() {
        let info = source()
            .parse(
                r#"<package><metadata>
                     <license type="file">LICENSE.txt</license>
                     <licenseUrl>https://aka.ms/deprecateLicenseUrl</licenseUrl>
                   </metadata></package>"#,
            )
            .unwrap();

        assert_eq!(info.license, UNKNOWN_LICENSE);
        assert_eq!(
            info.license_url.as_deref(),
            Some("https://aka.ms/deprecateLicenseUrl")
        );
    }

    #[test]
    fn test_parse_no_license_information() {
        let info = source()
            .parse("<package><metadata><id>Bare</id></metadata></package>")
            .unwrap();

        assert_eq!(info, LicenseInfo::unknown(None));
    }

    #[test]
    fn test_locate_uses_lowercased_name() {
        let cache = TempDir::new().unwrap();
        let dir = cache.path().join("newtonsoft.json").join("13.0.3");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("newtonsoft.json.nuspec"), "<package/>").unwrap();
        fs::write(dir.join("newtonsoft.json.13.0.3.nupkg.sha512"), "x").unwrap();

        let source = NugetLicenseSource::new(cache.path());
        let path = source
            .locate("Newtonsoft.Json", "13.0.3", Path::new("."))
            .unwrap();

        assert_eq!(path, dir.join("newtonsoft.json.nuspec"));
    }

    #[test]
    fn test_locate_without_nuspec_is_not_found() {
        let cache = TempDir::new().unwrap();
        let dir = cache.path().join("empty.package").join("1.0.0");
        fs::create_dir_all(&dir).unwrap();

        let source = NugetLicenseSource::new(cache.path());
        let err = source
            .locate("Empty.Package", "1.0.0", Path::new("."))
            .unwrap_err();

        assert!(matches!(err, ResolveError::NotFound { .. }));
    }
}
