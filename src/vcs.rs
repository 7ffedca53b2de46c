//! Working-tree checkouts of a repository at a given commit.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info};

use crate::platform::git_command;

/// Produces a working tree on disk for a commit of a repository.
#[async_trait]
pub trait RepositoryCheckout: Send + Sync {
    /// Materializes `commit` of `git_url` at `dest` and returns the tree root.
    ///
    /// An existing clone at `dest` is reused and force-checked-out.
    async fn checkout(&self, git_url: &str, commit: &str, dest: &Path) -> Result<PathBuf>;
}

/// [`RepositoryCheckout`] backed by the `git` command line.
#[derive(Debug, Default, Clone, Copy)]
pub struct GitCheckout;

impl GitCheckout {
    async fn git<I, S>(&self, cwd: Option<&Path>, args: I) -> Result<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut command = Command::new(git_command());
        command.args(args);
        if let Some(cwd) = cwd {
            command.current_dir(cwd);
        }

        let output = command
            .output()
            .await
            .context("Failed to execute git. Is git installed?")?;

        if !output.status.success() {
            bail!("{}", String::from_utf8_lossy(&output.stderr).trim());
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[async_trait]
impl RepositoryCheckout for GitCheckout {
    async fn checkout(&self, git_url: &str, commit: &str, dest: &Path) -> Result<PathBuf> {
        if !dest.join(".git").exists() {
            if let Some(parent) = dest.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }

            info!("Cloning {} into {}", git_url, dest.display());
            let args = [
                OsStr::new("clone"),
                OsStr::new("--"),
                OsStr::new(git_url),
                dest.as_os_str(),
            ];
            self.git(None, args)
                .await
                .with_context(|| format!("Failed to clone {}", git_url))?;
        }

        let spec = format!("{}^{{commit}}", commit);
        let sha = self
            .git(Some(dest), ["rev-parse", "--verify", spec.as_str()])
            .await
            .with_context(|| format!("Commit {} not found in {}", commit, dest.display()))?;
        debug!("Resolved {} to {}", commit, sha);

        self.git(Some(dest), ["checkout", "--force", "--detach", sha.as_str()])
            .await
            .with_context(|| format!("Failed to check out {} in {}", commit, dest.display()))?;

        Ok(dest.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::process::Command as StdCommand;
    use tempfile::TempDir;

    fn git_available() -> bool {
        StdCommand::new(git_command())
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn run_git(dir: &Path, args: &[&str]) -> String {
        let output = StdCommand::new(git_command())
            .args([
                "-c",
                "user.name=test",
                "-c",
                "user.email=test@example.com",
                "-c",
                "commit.gpgsign=false",
            ])
            .args(args)
            .current_dir(dir)
            .output()
            .unwrap();
        assert!(output.status.success(), "git {:?} failed", args);
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    }

    #[tokio::test]
    async fn test_checkout_two_commits() {
        if !git_available() {
            return;
        }

        let upstream = TempDir::new().unwrap();
        run_git(upstream.path(), &["init", "-q"]);
        fs::write(upstream.path().join("deps.txt"), "v1").unwrap();
        run_git(upstream.path(), &["add", "."]);
        run_git(upstream.path(), &["commit", "-q", "-m", "first"]);
        let first = run_git(upstream.path(), &["rev-parse", "HEAD"]);
        fs::write(upstream.path().join("deps.txt"), "v2").unwrap();
        run_git(upstream.path(), &["commit", "-q", "-am", "second"]);
        let second = run_git(upstream.path(), &["rev-parse", "HEAD"]);

        let work = TempDir::new().unwrap();
        let url = upstream.path().to_string_lossy().to_string();
        let dest = work.path().join("demo").join("from");

        let root = GitCheckout.checkout(&url, &first, &dest).await.unwrap();
        assert_eq!(fs::read_to_string(root.join("deps.txt")).unwrap(), "v1");

        // Reuses the existing clone.
        let root = GitCheckout.checkout(&url, &second, &dest).await.unwrap();
        assert_eq!(fs::read_to_string(root.join("deps.txt")).unwrap(), "v2");
    }

    #[tokio::test]
    async fn test_checkout_unknown_commit() {
        if !git_available() {
            return;
        }

        let upstream = TempDir::new().unwrap();
        run_git(upstream.path(), &["init", "-q"]);
        fs::write(upstream.path().join("a"), "a").unwrap();
        run_git(upstream.path(), &["add", "."]);
        run_git(upstream.path(), &["commit", "-q", "-m", "only"]);

        let work = TempDir::new().unwrap();
        let url = upstream.path().to_string_lossy().to_string();
        let err = GitCheckout
            .checkout(&url, "0000000000000000000000000000000000000000", &work.path().join("x"))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn test_option_like_url_is_not_an_option() {
        if !git_available() {
            return;
        }

        let work = TempDir::new().unwrap();
        let marker = work.path().join("marker");
        let url = format!("--upload-pack=touch {}", marker.display());
        let dest = work.path().join("demo").join("from");

        let result = GitCheckout.checkout(&url, "HEAD", &dest).await;

        assert!(result.is_err());
        assert!(!marker.exists());
    }
}
