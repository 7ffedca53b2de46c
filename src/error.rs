//! Error types for license resolution and configuration.
//!
//! Resolution errors never escape the resolver: they are logged and turned
//! into an `UNKNOWN` license. Configuration errors are fatal for a run.

use std::path::PathBuf;
use thiserror::Error;

/// Why a package's license could not be read from local metadata.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("metadata not found at {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed package.json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed nuspec: {0}")]
    Xml(#[from] quick_xml::DeError),
}

/// Invalid configuration, detected before any project is processed.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("config file not found: {}", .0.display())]
    Missing(PathBuf),

    #[error("'projects' must not be empty")]
    NoProjects,

    #[error("'working_directory' must not be empty")]
    EmptyWorkingDirectory,

    #[error("every project needs a 'name'")]
    MissingName,

    #[error("project name '{0}' is used more than once")]
    DuplicateName(String),

    #[error("project '{0}' needs a 'git_url'")]
    MissingGitUrl(String),

    #[error("project '{0}' needs both 'from_commit' and 'to_commit'")]
    MissingCommits(String),

    #[error("project '{0}' needs at least one entry in 'csproj_paths' or 'npm_project_dirs'")]
    NoManifests(String),
}
