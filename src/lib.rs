//! Dependency license drift between two commits of a project.
//!
//! For every configured project, license-diff checks out two commits, lists
//! their NuGet and npm dependencies, resolves each package's license from
//! local package metadata, and reports what was added, removed, or changed
//! license. Results of several projects are folded into one consolidated view.
//!
//! # Example
//!
//! ```
//! use license_diff::diff::compute_diff;
//! use license_diff::{ChangeType, Dependency, Ecosystem};
//!
//! let from = vec![Dependency::new("PkgA", "1.0", Ecosystem::Nuget).with_license("MIT")];
//! let to = vec![Dependency::new("PkgA", "1.0", Ecosystem::Nuget).with_license("Apache-2.0")];
//!
//! let diff = compute_diff(&from, &to);
//! assert_eq!(diff.len(), 1);
//! assert_eq!(diff[0].change_type, ChangeType::LicenseChanged);
//! ```

pub mod config;
pub mod diff;
pub mod error;
pub mod exclude;
pub mod license;
pub mod lister;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod platform;
pub mod reconcile;
pub mod vcs;
pub mod version;

pub use config::{Config, ExcludeConfig, ProjectConfig};
pub use error::{ConfigError, ResolveError};
pub use lister::DependencyLister;
pub use model::{
    ChangeType, ConsolidatedView, Dependency, DiffEntry, Ecosystem, PackageChangeSummary,
    ProjectResult, RunReport,
};
pub use reconcile::{consolidate, Reconciler, Snapshot};
