use crate::model::{Dependency, Ecosystem};
use crate::platform::npm_command;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::Path;
use tokio::process::Command;

pub struct NpmLister;

#[derive(Deserialize)]
struct NpmNode {
    version: Option<String>,
    dependencies: Option<IndexMap<String, NpmNode>>,
}

/// Parses `npm ls --json --all` output into a depth-first list.
///
/// Each package precedes its own dependencies. Entries without a version
/// (unmet or deduped placeholders) are skipped together with their subtree.
pub fn parse_npm_ls(json: &str) -> Result<Vec<Dependency>> {
    let root: NpmNode = serde_json::from_str(json).context("Failed to parse npm ls output")?;

    let mut packages = Vec::new();
    walk(&root, &mut packages);
    Ok(packages)
}

fn walk(node: &NpmNode, out: &mut Vec<Dependency>) {
    let Some(deps) = &node.dependencies else {
        return;
    };

    for (name, child) in deps {
        let Some(version) = child.version.as_deref().filter(|v| !v.is_empty()) else {
            continue;
        };

        out.push(Dependency::new(name, version, Ecosystem::Npm));
        walk(child, out);
    }
}

#[async_trait]
impl super::DependencyLister for NpmLister {
    fn name(&self) -> &'static str {
        "npm ls"
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Npm
    }

    async fn list(&self, manifest: &Path) -> Result<Vec<Dependency>> {
        let output = Command::new(npm_command())
            .args(["ls", "--json", "--production", "--all"])
            .current_dir(manifest)
            .output()
            .await
            .context("Failed to execute npm. Is npm installed?")?;

        // npm ls exits non-zero on peer dependency problems but still prints
        // a usable tree, so only empty output is fatal.
        if output.stdout.iter().all(u8::is_ascii_whitespace) {
            bail!(
                "npm ls failed in {}: {}",
                manifest.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        parse_npm_ls(&String::from_utf8_lossy(&output.stdout))
    }
}
