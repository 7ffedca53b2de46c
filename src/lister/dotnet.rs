use crate::model::{Dependency, Ecosystem};
use crate::platform::dotnet_command;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use tokio::process::Command;

pub struct DotnetLister;

#[derive(Deserialize)]
struct DotnetListOutput {
    #[serde(default)]
    projects: Vec<DotnetProject>,
}

#[derive(Deserialize)]
struct DotnetProject {
    #[serde(default)]
    frameworks: Vec<DotnetFramework>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DotnetFramework {
    #[serde(default)]
    top_level_packages: Vec<DotnetPackage>,
    #[serde(default)]
    transitive_packages: Vec<DotnetPackage>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DotnetPackage {
    id: Option<String>,
    requested_version: Option<String>,
    resolved_version: Option<String>,
}

/// Parses `dotnet list package --format json` output.
///
/// Top-level packages precede transitive ones within each framework. The
/// requested version is preferred over the resolved one; packages without a
/// name or version are skipped.
pub fn parse_dotnet_list(json: &str) -> Result<Vec<Dependency>> {
    let output: DotnetListOutput =
        serde_json::from_str(json).context("Failed to parse dotnet list output")?;

    let mut packages = Vec::new();

    for project in output.projects {
        for framework in project.frameworks {
            let all = framework
                .top_level_packages
                .into_iter()
                .chain(framework.transitive_packages);

            for pkg in all {
                let Some(name) = pkg.id.filter(|n| !n.is_empty()) else {
                    continue;
                };
                let Some(version) = pkg
                    .requested_version
                    .or(pkg.resolved_version)
                    .filter(|v| !v.is_empty())
                else {
                    continue;
                };

                packages.push(Dependency::new(name, version, Ecosystem::Nuget));
            }
        }
    }

    Ok(packages)
}

#[async_trait]
impl super::DependencyLister for DotnetLister {
    fn name(&self) -> &'static str {
        "dotnet list package"
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Nuget
    }

    async fn list(&self, manifest: &Path) -> Result<Vec<Dependency>> {
        let output = Command::new(dotnet_command())
            .arg("list")
            .arg(manifest)
            .args(["package", "--include-transitive", "--format", "json"])
            .output()
            .await
            .context("Failed to execute dotnet. Is the .NET SDK installed?")?;

        if !output.status.success() {
            bail!(
                "dotnet list package failed for {}: {}",
                manifest.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        parse_dotnet_list(&String::from_utf8_lossy(&output.stdout))
    }
}
