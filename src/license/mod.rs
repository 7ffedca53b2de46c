//! License resolution from local package metadata.
//!
//! Each ecosystem has a [`LicenseSource`] that knows where its metadata
//! lives on disk and how to read a license out of it. The
//! [`LicenseResolver`] drives them and absorbs every failure: a package
//! whose metadata is missing or unreadable ends up with an `UNKNOWN`
//! license and a registry URL, and a warning is logged.
//!
//! | Source | Metadata | Fallback URL |
//! |--------|----------|--------------|
//! | [`NugetLicenseSource`] | `{cache}/{name lowercased}/{version}/*.nuspec` | nuget.org package page |
//! | [`NpmLicenseSource`] | `{project}/node_modules/{name}/package.json` | npmjs.com package page |

mod npm;
mod nuget;

pub use npm::NpmLicenseSource;
pub use nuget::NugetLicenseSource;

use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::error::ResolveError;
use crate::model::{Dependency, Ecosystem, UNKNOWN_LICENSE};

/// What a metadata file says about a package's license.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LicenseInfo {
    pub license: String,
    pub license_url: Option<String>,
}

impl LicenseInfo {
    pub fn known(license: impl Into<String>) -> Self {
        Self {
            license: license.into(),
            license_url: None,
        }
    }

    pub fn unknown(license_url: Option<String>) -> Self {
        Self {
            license: UNKNOWN_LICENSE.to_string(),
            license_url,
        }
    }
}

/// Reads licenses for one ecosystem from local metadata.
pub trait LicenseSource: Send + Sync {
    /// The ecosystem whose packages this source reads.
    fn ecosystem(&self) -> Ecosystem;

    /// Finds the metadata file for a package.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::NotFound`] if there is no metadata on disk.
    fn locate(&self, name: &str, version: &str, project_root: &Path)
        -> Result<PathBuf, ResolveError>;

    /// Extracts license information from metadata file content.
    ///
    /// # Errors
    ///
    /// Returns an error if the content is malformed.
    fn parse(&self, content: &str) -> Result<LicenseInfo, ResolveError>;

    /// Registry page used when nothing could be read locally.
    fn fallback_url(&self, name: &str, version: &str) -> String;
}

/// Resolves licenses for dependencies of every supported ecosystem.
pub struct LicenseResolver {
    nuget: Box<dyn LicenseSource>,
    npm: Box<dyn LicenseSource>,
}

impl LicenseResolver {
    /// Creates a resolver reading NuGet metadata from `nuget_cache_root`.
    pub fn new(nuget_cache_root: impl Into<PathBuf>) -> Self {
        Self {
            nuget: Box::new(NugetLicenseSource::new(nuget_cache_root)),
            npm: Box::new(NpmLicenseSource),
        }
    }

    /// Replaces the source used for `source.ecosystem()`.
    pub fn with_source(mut self, source: Box<dyn LicenseSource>) -> Self {
        match source.ecosystem() {
            Ecosystem::Nuget => self.nuget = source,
            Ecosystem::Npm => self.npm = source,
        }
        self
    }

    pub fn source(&self, ecosystem: Ecosystem) -> &dyn LicenseSource {
        match ecosystem {
            Ecosystem::Nuget => self.nuget.as_ref(),
            Ecosystem::Npm => self.npm.as_ref(),
        }
    }

    /// Looks up license information for one package. Never fails.
    pub fn lookup(&self, dependency: &Dependency, project_root: &Path) -> LicenseInfo {
        let source = self.source(dependency.ecosystem);

        match read_license(source, dependency, project_root) {
            Ok(info) => info,
            Err(e) => {
                warn!(
                    "Could not determine {} license for '{}' ({}): {}",
                    dependency.ecosystem, dependency.name, dependency.version, e
                );
                LicenseInfo::unknown(Some(
                    source.fallback_url(&dependency.name, &dependency.version),
                ))
            }
        }
    }

    /// Sets `license` and `license_url` on a dependency.
    pub fn resolve(&self, dependency: &mut Dependency, project_root: &Path) {
        let info = self.lookup(dependency, project_root);
        dependency.license = info.license;
        dependency.license_url = info.license_url;
    }

    pub fn resolve_all(&self, dependencies: &mut [Dependency], project_root: &Path) {
        for dependency in dependencies.iter_mut() {
            self.resolve(dependency, project_root);
        }
    }
}

fn read_license(
    source: &dyn LicenseSource,
    dependency: &Dependency,
    project_root: &Path,
) -> Result<LicenseInfo, ResolveError> {
    let path = source.locate(&dependency.name, &dependency.version, project_root)?;
    let content = fs::read_to_string(&path).map_err(|e| ResolveError::Io {
        path: path.clone(),
        source: e,
    })?;
    source.parse(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_resolve_nuget_expression() {
        let cache = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        write(
            &cache.path().join("serilog/3.1.1/serilog.nuspec"),
            r#"<?xml version="1.0"?>
<package xmlns="http://schemas.microsoft.com/packaging/2013/05/nuspec.xsd">
  <metadata>
    <id>Serilog</id>
    <version>3.1.1</version>
    <license type="expression">Apache-2.0</license>
    <licenseUrl>https://licenses.nuget.org/Apache-2.0</licenseUrl>
  </metadata>
</package>"#,
        );

        let resolver = LicenseResolver::new(cache.path());
        let mut dep = Dependency::new("Serilog", "3.1.1", Ecosystem::Nuget);
        resolver.resolve(&mut dep, project.path());

        assert_eq!(dep.license, "Apache-2.0");
        assert!(dep.license_url.is_none());
    }

    #[test]
    fn test_resolve_nuget_missing_package_dir() {
        let cache = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();

        let resolver = LicenseResolver::new(cache.path());
        let mut dep = Dependency::new("Some.Package", "1.2.3", Ecosystem::Nuget);
        resolver.resolve(&mut dep, project.path());

        assert_eq!(dep.license, UNKNOWN_LICENSE);
        assert_eq!(
            dep.license_url.as_deref(),
            Some("https://www.nuget.org/packages/Some.Package/1.2.3")
        );
    }

    #[test]
    fn test_resolve_nuget_malformed_xml_downgrades() {
        let cache = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        write(
            &cache.path().join("broken/1.0.0/broken.nuspec"),
            r#"<package><metadata><license type="expression">MIT</metadata></package>"#,
        );

        let resolver = LicenseResolver::new(cache.path());
        let mut dep = Dependency::new("Broken", "1.0.0", Ecosystem::Nuget);
        resolver.resolve(&mut dep, project.path());

        assert_eq!(dep.license, UNKNOWN_LICENSE);
        assert_eq!(
            dep.license_url.as_deref(),
            Some("https://www.nuget.org/packages/Broken/1.0.0")
        );
    }

    #[test]
    fn test_resolve_npm_from_project_node_modules() {
        let cache = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        write(
            &project.path().join("node_modules/@scope/widget/package.json"),
            r#"{ "name": "@scope/widget", "version": "2.0.0", "license": "ISC" }"#,
        );

        let resolver = LicenseResolver::new(cache.path());
        let mut dep = Dependency::new("@scope/widget", "2.0.0", Ecosystem::Npm);
        resolver.resolve(&mut dep, project.path());

        assert_eq!(dep.license, "ISC");
        assert!(dep.license_url.is_none());
    }

    #[test]
    fn test_resolve_npm_missing_and_malformed() {
        let cache = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        write(
            &project.path().join("node_modules/bad/package.json"),
            "{ not json",
        );

        let resolver = LicenseResolver::new(cache.path());
        let mut missing = Dependency::new("absent", "1.0.0", Ecosystem::Npm);
        let mut bad = Dependency::new("bad", "1.0.0", Ecosystem::Npm);
        resolver.resolve(&mut missing, project.path());
        resolver.resolve(&mut bad, project.path());

        assert_eq!(missing.license, UNKNOWN_LICENSE);
        assert_eq!(
            missing.license_url.as_deref(),
            Some("https://www.npmjs.com/package/absent")
        );
        assert_eq!(bad.license, UNKNOWN_LICENSE);
        assert_eq!(
            bad.license_url.as_deref(),
            Some("https://www.npmjs.com/package/bad")
        );
    }

    struct FixedSource;

    impl LicenseSource for FixedSource {
        fn ecosystem(&self) -> Ecosystem {
            Ecosystem::Npm
        }

        fn locate(&self, name: &str, _: &str, root: &Path) -> Result<PathBuf, ResolveError> {
            Ok(root.join(format!("{}.txt", name)))
        }

        fn parse(&self, content: &str) -> Result<LicenseInfo, ResolveError> {
            Ok(LicenseInfo::known(content.trim()))
        }

        fn fallback_url(&self, name: &str, _: &str) -> String {
            format!("https://example.com/{}", name)
        }
    }

    #[test]
    fn test_with_source_replaces_matching_ecosystem() {
        let cache = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        write(&project.path().join("left-pad.txt"), "WTFPL\n");

        let resolver = LicenseResolver::new(cache.path()).with_source(Box::new(FixedSource));
        let mut npm = Dependency::new("left-pad", "1.3.0", Ecosystem::Npm);
        let mut other = Dependency::new("right-pad", "1.0.0", Ecosystem::Npm);
        let mut nuget = Dependency::new("Serilog", "3.1.1", Ecosystem::Nuget);
        resolver.resolve(&mut npm, project.path());
        resolver.resolve(&mut other, project.path());
        resolver.resolve(&mut nuget, project.path());

        assert_eq!(npm.license, "WTFPL");
        assert_eq!(other.license, UNKNOWN_LICENSE);
        assert_eq!(
            other.license_url.as_deref(),
            Some("https://example.com/right-pad")
        );
        // NuGet still goes through the package cache.
        assert_eq!(
            nuget.license_url.as_deref(),
            Some("https://www.nuget.org/packages/Serilog/3.1.1")
        );
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let cache = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        write(
            &project.path().join("node_modules/legacy/package.json"),
            r#"{ "licenses": [], "homepage": "https://example.com/legacy" }"#,
        );

        let resolver = LicenseResolver::new(cache.path());
        let mut deps = vec![
            Dependency::new("legacy", "0.1.0", Ecosystem::Npm),
            Dependency::new("Missing", "9.9.9", Ecosystem::Nuget),
        ];

        resolver.resolve_all(&mut deps, project.path());
        let first = deps.clone();
        resolver.resolve_all(&mut deps, project.path());

        assert_eq!(deps, first);
        assert_eq!(deps[0].license, UNKNOWN_LICENSE);
        assert_eq!(
            deps[0].license_url.as_deref(),
            Some("https://example.com/legacy")
        );
    }
}
