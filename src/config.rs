//! Configuration file handling.
//!
//! This module provides loading and validation of license-diff
//! configuration from a TOML file.
//!
//! # Configuration Location
//!
//! Unless `--config` is given, the configuration file is read from:
//! - Linux: `~/.config/license-diff/config.toml`
//! - macOS: `~/Library/Application Support/license-diff/config.toml`
//! - Windows: `%APPDATA%\license-diff\config.toml`
//!
//! # Example Configuration
//!
//! ```toml
//! working_directory = "./work"
//! output_directory = "./results"
//! default_format = "table"
//!
//! [[projects]]
//! name = "billing"
//! git_url = "https://example.com/acme/billing.git"
//! from_commit = "4f2a9c1"
//! to_commit = "b81e0d7"
//! csproj_paths = ["src/Billing.Api/Billing.Api.csproj"]
//! npm_project_dirs = ["web"]
//!
//! [projects.excludes]
//! nuget = ["Acme.*"]
//! npm = ["@acme/*"]
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::exclude::CompiledExclusions;

/// Application configuration.
///
/// # Example
///
/// ```no_run
/// use license_diff::Config;
///
/// let config = Config::load().unwrap();
///
/// for project in &config.projects {
///     println!("{}: {}..{}", project.name, project.from_commit, project.to_commit);
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where repositories are cloned. Removed after a run.
    ///
    /// Default: `./work`
    pub working_directory: PathBuf,

    /// Where the JSON report is written.
    ///
    /// Default: `./results`
    pub output_directory: PathBuf,

    /// Global NuGet packages folder holding `.nuspec` metadata.
    ///
    /// Default: `$NUGET_PACKAGES`, else `~/.nuget/packages`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nuget_cache_root: Option<PathBuf>,

    /// Default output format when no `--format` flag is provided.
    ///
    /// Valid values: "table", "json"
    /// Default: "table"
    pub default_format: String,

    /// Projects to compare.
    pub projects: Vec<ProjectConfig>,
}

/// One project: a repository and the two commits to compare.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub name: String,
    pub git_url: String,
    pub from_commit: String,
    pub to_commit: String,

    /// `.csproj` files, relative to the repository root.
    #[serde(default)]
    pub csproj_paths: Vec<String>,

    /// Directories containing a `package.json`, relative to the repository root.
    #[serde(default)]
    pub npm_project_dirs: Vec<String>,

    #[serde(default)]
    pub excludes: ExcludeConfig,
}

impl ProjectConfig {
    pub fn compile_exclusions(&self) -> CompiledExclusions {
        CompiledExclusions::compile(&self.excludes)
    }
}

/// Package names to leave out of the comparison, per ecosystem.
///
/// Entries are exact names or `*` wildcards (e.g. `"Microsoft.*"`,
/// `"@types/*"`), matched case-insensitively against the whole name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExcludeConfig {
    pub nuget: Vec<String>,
    pub npm: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            working_directory: PathBuf::from("./work"),
            output_directory: PathBuf::from("./results"),
            nuget_cache_root: None,
            default_format: "table".to_string(),
            projects: Vec::new(),
        }
    }
}

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

impl Config {
    /// Loads and validates the configuration at the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, cannot be parsed, or fails
    /// validation.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Loads and validates the configuration at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, cannot be parsed, or fails
    /// validation.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::Missing(path.to_path_buf()).into());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Checks that every project can actually be processed.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.projects.is_empty() {
            return Err(ConfigError::NoProjects);
        }

        if is_blank(&self.working_directory.to_string_lossy()) {
            return Err(ConfigError::EmptyWorkingDirectory);
        }

        let mut seen = HashSet::new();
        for project in &self.projects {
            if is_blank(&project.name) {
                return Err(ConfigError::MissingName);
            }
            // Names key the work tree and the report file.
            if !seen.insert(project.name.trim().to_lowercase()) {
                return Err(ConfigError::DuplicateName(project.name.clone()));
            }
            if is_blank(&project.git_url) {
                return Err(ConfigError::MissingGitUrl(project.name.clone()));
            }
            if is_blank(&project.from_commit) || is_blank(&project.to_commit) {
                return Err(ConfigError::MissingCommits(project.name.clone()));
            }
            if project.csproj_paths.is_empty() && project.npm_project_dirs.is_empty() {
                return Err(ConfigError::NoManifests(project.name.clone()));
            }
        }

        Ok(())
    }

    /// Projects selected by an optional name filter (case-insensitive).
    pub fn select_projects(&self, filter: Option<&str>) -> Vec<&ProjectConfig> {
        self.projects
            .iter()
            .filter(|p| match filter {
                Some(name) if !is_blank(name) => p.name.eq_ignore_ascii_case(name.trim()),
                _ => true,
            })
            .collect()
    }

    pub fn nuget_cache_root(&self) -> PathBuf {
        self.nuget_cache_root
            .clone()
            .unwrap_or_else(crate::platform::nuget_packages_dir)
    }

    /// Returns the path to the default configuration file.
    ///
    /// # Example
    ///
    /// ```
    /// use license_diff::Config;
    ///
    /// let path = Config::config_path();
    /// println!("Config file: {}", path.display());
    /// ```
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("license-diff")
            .join("config.toml")
    }

    /// Generates a sample configuration with one example project.
    pub fn generate_default_config() -> String {
        let config = Config {
            projects: vec![ProjectConfig {
                name: "my-app".to_string(),
                git_url: "https://example.com/org/my-app.git".to_string(),
                from_commit: "<from-sha>".to_string(),
                to_commit: "<to-sha>".to_string(),
                excludes: ExcludeConfig {
                    nuget: vec!["Microsoft.*".to_string()],
                    npm: vec!["@types/*".to_string()],
                },
                csproj_paths: vec!["src/MyApp/MyApp.csproj".to_string()],
                npm_project_dirs: vec!["web".to_string()],
            }],
            ..Config::default()
        };
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn project(name: &str) -> ProjectConfig {
        ProjectConfig {
            name: name.to_string(),
            git_url: "https://example.com/repo.git".to_string(),
            from_commit: "abc".to_string(),
            to_commit: "def".to_string(),
            csproj_paths: vec!["App.csproj".to_string()],
            ..ProjectConfig::default()
        }
    }

    fn config_with(projects: Vec<ProjectConfig>) -> Config {
        Config {
            projects,
            ..Config::default()
        }
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();

        assert_eq!(config.working_directory, PathBuf::from("./work"));
        assert_eq!(config.output_directory, PathBuf::from("./results"));
        assert_eq!(config.default_format, "table");
        assert!(config.nuget_cache_root.is_none());
        assert!(config.projects.is_empty());
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
            working_directory = "/tmp/ld-work"

            [[projects]]
            name = "billing"
            git_url = "https://example.com/billing.git"
            from_commit = "1111111"
            to_commit = "2222222"
            npm_project_dirs = ["web"]

            [projects.excludes]
            npm = ["@acme/*"]
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.working_directory, PathBuf::from("/tmp/ld-work"));
        assert_eq!(config.default_format, "table");
        assert_eq!(config.projects.len(), 1);

        let billing = &config.projects[0];
        assert_eq!(billing.npm_project_dirs, vec!["web"]);
        assert!(billing.csproj_paths.is_empty());
        assert!(billing.excludes.nuget.is_empty());
        assert!(billing
            .compile_exclusions()
            .rule_set(crate::model::Ecosystem::Npm)
            .is_excluded("@acme/ui"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_errors() {
        assert_eq!(config_with(vec![]).validate(), Err(ConfigError::NoProjects));

        assert_eq!(
            config_with(vec![project("  ")]).validate(),
            Err(ConfigError::MissingName)
        );

        let mut no_url = project("a");
        no_url.git_url.clear();
        assert_eq!(
            config_with(vec![no_url]).validate(),
            Err(ConfigError::MissingGitUrl("a".to_string()))
        );

        let mut no_commit = project("b");
        no_commit.to_commit = " ".to_string();
        assert_eq!(
            config_with(vec![no_commit]).validate(),
            Err(ConfigError::MissingCommits("b".to_string()))
        );

        let mut no_manifest = project("c");
        no_manifest.csproj_paths.clear();
        assert_eq!(
            config_with(vec![no_manifest]).validate(),
            Err(ConfigError::NoManifests("c".to_string()))
        );

        let mut no_work = config_with(vec![project("d")]);
        no_work.working_directory = PathBuf::new();
        assert_eq!(no_work.validate(), Err(ConfigError::EmptyWorkingDirectory));
    }

    #[test]
    fn test_select_projects() {
        let config = config_with(vec![project("Billing"), project("Portal")]);

        assert_eq!(config.select_projects(None).len(), 2);
        assert_eq!(config.select_projects(Some("")).len(), 2);

        let selected = config.select_projects(Some("billing"));
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].name, "Billing");

        assert!(config.select_projects(Some("unknown")).is_empty());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = Config::load_from(&dir.path().join("nope.toml")).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::Missing(_))
        ));
    }

    #[test]
    fn test_generated_config_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, Config::generate_default_config()).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.projects.len(), 1);
        assert_eq!(loaded.projects[0].excludes.nuget, vec!["Microsoft.*"]);
    }

    #[test]
    fn test_validate_duplicate_names() {
        assert_eq!(
            config_with(vec![project("api"), project("web"), project("API")]).validate(),
            Err(ConfigError::DuplicateName("API".to_string()))
        );
        assert_eq!(
            config_with(vec![project("api"), project(" api ")]).validate(),
            Err(ConfigError::DuplicateName(" api ".to_string()))
        );
        assert!(config_with(vec![project("api"), project("api-v2")])
            .validate()
            .is_ok());
    }
}
