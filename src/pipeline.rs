//! End-to-end processing of configured projects.
//!
//! For every project the pipeline checks out both commits into separate
//! trees under the working directory, lists each tree's dependencies, and
//! hands both snapshots to the [`Reconciler`]. Projects are independent and
//! run concurrently; a failing project is logged and left out of the results
//! without affecting the others.

use anyhow::{Context, Result};
use futures::future::join_all;
use indicatif::ProgressBar;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::config::ProjectConfig;
use crate::exclude::CompiledExclusions;
use crate::lister::Listers;
use crate::model::ProjectResult;
use crate::reconcile::{Reconciler, Snapshot};
use crate::vcs::{GitCheckout, RepositoryCheckout};

pub struct Pipeline {
    work_dir: PathBuf,
    reconciler: Reconciler,
    checkout: Box<dyn RepositoryCheckout>,
    listers: Listers,
    keep_work: bool,
    progress: Option<ProgressBar>,
}

impl Pipeline {
    /// Creates a pipeline using `git` and the ecosystems' command-line tools.
    pub fn new(work_dir: impl Into<PathBuf>, reconciler: Reconciler) -> Self {
        Self {
            work_dir: work_dir.into(),
            reconciler,
            checkout: Box::new(GitCheckout),
            listers: Listers::default(),
            keep_work: false,
            progress: None,
        }
    }

    pub fn with_checkout(mut self, checkout: Box<dyn RepositoryCheckout>) -> Self {
        self.checkout = checkout;
        self
    }

    pub fn with_listers(mut self, listers: Listers) -> Self {
        self.listers = listers;
        self
    }

    /// Keeps the working directory after the run instead of deleting it.
    pub fn keep_work(mut self, keep: bool) -> Self {
        self.keep_work = keep;
        self
    }

    /// Reports per-project progress on `progress`.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Processes all projects and returns the successful results in input
    /// order.
    pub async fn run(&self, projects: &[&ProjectConfig]) -> Vec<ProjectResult> {
        let exclusions: Vec<CompiledExclusions> =
            projects.iter().map(|p| p.compile_exclusions()).collect();

        let futures = projects
            .iter()
            .zip(&exclusions)
            .map(|(project, exclusions)| async move {
                let outcome = self.run_project(project, exclusions).await;
                if let Some(pb) = &self.progress {
                    pb.inc(1);
                }
                (project.name.as_str(), outcome)
            });

        let mut results = Vec::with_capacity(projects.len());
        for (name, outcome) in join_all(futures).await {
            match outcome {
                Ok(result) => {
                    info!("Project '{}' processed", name);
                    results.push(result);
                }
                Err(e) => error!("Project '{}' failed: {:#}", name, e),
            }
        }

        if !self.keep_work {
            self.cleanup().await;
        }

        results
    }

    /// Processes a single project.
    ///
    /// # Errors
    ///
    /// Returns an error if a checkout or a dependency listing fails.
    pub async fn run_project(
        &self,
        project: &ProjectConfig,
        exclusions: &CompiledExclusions,
    ) -> Result<ProjectResult> {
        info!(
            "Project '{}': {} -> {}",
            project.name, project.from_commit, project.to_commit
        );

        let project_dir = self.work_dir.join(&project.name);
        let from = self
            .snapshot(project, &project.from_commit, &project_dir.join("from"))
            .await?;
        let to = self
            .snapshot(project, &project.to_commit, &project_dir.join("to"))
            .await?;

        Ok(self
            .reconciler
            .reconcile_project(&project.name, exclusions, from, to))
    }

    async fn snapshot(
        &self,
        project: &ProjectConfig,
        commit: &str,
        dest: &Path,
    ) -> Result<Snapshot> {
        let root = self
            .checkout
            .checkout(&project.git_url, commit, dest)
            .await?;

        let dependencies = self
            .listers
            .collect_snapshot(project, &root)
            .await
            .with_context(|| format!("Failed to list dependencies at {}", commit))?;

        Ok(Snapshot::new(root, dependencies))
    }

    async fn cleanup(&self) {
        if !self.work_dir.exists() {
            return;
        }

        info!("Removing working directory {}", self.work_dir.display());
        if let Err(e) = tokio::fs::remove_dir_all(&self.work_dir).await {
            warn!(
                "Could not remove working directory {}: {}",
                self.work_dir.display(),
                e
            );
        }
    }
}
