//! Dependency listing through the ecosystems' own tooling.
//!
//! This module provides the [`DependencyLister`] trait and implementations
//! that ask a package manager for the resolved (direct and transitive)
//! dependencies of a project.
//!
//! # Available Listers
//!
//! | Lister | Ecosystem | Manifest | Command |
//! |--------|-----------|----------|---------|
//! | [`DotnetLister`] | NuGet | `.csproj` file | `dotnet list package --include-transitive` |
//! | [`NpmLister`] | npm | project directory | `npm ls --all --production` |

mod dotnet;
mod npm;

pub use dotnet::{parse_dotnet_list, DotnetLister};
pub use npm::{parse_npm_ls, NpmLister};

use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;
use tracing::debug;

use crate::config::ProjectConfig;
use crate::model::{Dependency, Ecosystem};

/// Lists the resolved dependencies of one project manifest.
///
/// Results carry no license yet and keep the order reported by the tool.
#[async_trait]
pub trait DependencyLister: Send + Sync {
    /// Returns the human-readable name of this lister.
    fn name(&self) -> &'static str;

    /// Returns the ecosystem this lister handles.
    fn ecosystem(&self) -> Ecosystem;

    /// Lists dependencies for a manifest (a `.csproj` file for NuGet, a
    /// project directory for npm).
    ///
    /// # Errors
    ///
    /// Returns an error if the tool cannot be run or its output is unusable.
    async fn list(&self, manifest: &Path) -> Result<Vec<Dependency>>;
}

/// Returns the lister for an ecosystem.
///
/// # Example
///
/// ```
/// use license_diff::{Ecosystem, lister::get_lister};
///
/// let lister = get_lister(Ecosystem::Npm);
/// assert_eq!(lister.name(), "npm ls");
/// ```
pub fn get_lister(ecosystem: Ecosystem) -> Box<dyn DependencyLister> {
    match ecosystem {
        Ecosystem::Nuget => Box::new(DotnetLister),
        Ecosystem::Npm => Box::new(NpmLister),
    }
}

/// One lister per ecosystem.
pub struct Listers {
    pub nuget: Box<dyn DependencyLister>,
    pub npm: Box<dyn DependencyLister>,
}

impl Default for Listers {
    fn default() -> Self {
        Self {
            nuget: get_lister(Ecosystem::Nuget),
            npm: get_lister(Ecosystem::Npm),
        }
    }
}

impl Listers {
    /// Lists every configured manifest of a project checked out at `repo_dir`.
    ///
    /// NuGet results come first (in `csproj_paths` order), then npm results
    /// (in `npm_project_dirs` order). Manifests missing from the checkout are
    /// skipped.
    ///
    /// # Errors
    ///
    /// Returns the first lister failure.
    pub async fn collect_snapshot(
        &self,
        project: &ProjectConfig,
        repo_dir: &Path,
    ) -> Result<Vec<Dependency>> {
        let mut dependencies = Vec::new();

        for relative in &project.csproj_paths {
            let csproj = repo_dir.join(relative);
            if !csproj.is_file() {
                debug!("csproj not found: {}", csproj.display());
                continue;
            }

            debug!("Listing NuGet packages for {}", csproj.display());
            dependencies.extend(self.nuget.list(&csproj).await?);
        }

        for relative in &project.npm_project_dirs {
            let dir = repo_dir.join(relative);
            if !dir.is_dir() {
                debug!("npm directory not found: {}", dir.display());
                continue;
            }

            debug!("Listing npm packages for {}", dir.display());
            dependencies.extend(self.npm.list(&dir).await?);
        }

        debug!(
            "Found {} dependencies for '{}' in {}",
            dependencies.len(),
            project.name,
            repo_dir.display()
        );
        for dep in &dependencies {
            debug!("  - {} {} {}", dep.ecosystem.as_str(), dep.name, dep.version);
        }

        Ok(dependencies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    struct FixedLister {
        ecosystem: Ecosystem,
    }

    #[async_trait]
    impl DependencyLister for FixedLister {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn ecosystem(&self) -> Ecosystem {
            self.ecosystem
        }

        async fn list(&self, manifest: &Path) -> Result<Vec<Dependency>> {
            let label = manifest
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            Ok(vec![Dependency::new(label, "1.0.0", self.ecosystem)])
        }
    }

    #[tokio::test]
    async fn test_collect_snapshot_orders_and_skips_missing() {
        let repo = TempDir::new().unwrap();
        fs::write(repo.path().join("A.csproj"), "<Project />").unwrap();
        fs::create_dir_all(repo.path().join("web")).unwrap();

        let project = ProjectConfig {
            name: "demo".to_string(),
            csproj_paths: vec!["Missing.csproj".to_string(), "A.csproj".to_string()],
            npm_project_dirs: vec!["web".to_string(), "gone".to_string()],
            ..ProjectConfig::default()
        };

        let listers = Listers {
            nuget: Box::new(FixedLister {
                ecosystem: Ecosystem::Nuget,
            }),
            npm: Box::new(FixedLister {
                ecosystem: Ecosystem::Npm,
            }),
        };

        let deps = listers.collect_snapshot(&project, repo.path()).await.unwrap();
        let view: Vec<_> = deps
            .iter()
            .map(|d| (d.ecosystem, d.name.as_str()))
            .collect();

        assert_eq!(
            view,
            vec![(Ecosystem::Nuget, "A.csproj"), (Ecosystem::Npm, "web")]
        );
    }

    #[test]
    fn test_get_lister() {
        assert_eq!(get_lister(Ecosystem::Nuget).ecosystem(), Ecosystem::Nuget);
        assert_eq!(get_lister(Ecosystem::Npm).ecosystem(), Ecosystem::Npm);
    }
}
