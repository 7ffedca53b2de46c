//! Core data types for dependencies, diffs, and reconciliation results.
//!
//! This module contains the fundamental types used throughout license-diff:
//!
//! - [`Dependency`] - A third-party package found in a snapshot
//! - [`Ecosystem`] - The package manager a dependency belongs to
//! - [`DiffEntry`] - A sparse added/removed/license-changed delta
//! - [`PackageChangeSummary`] - A per-package comparison row
//! - [`ProjectResult`] - Everything computed for one project
//! - [`ConsolidatedView`] - The cross-project rollup
//!
//! # Example
//!
//! ```
//! use license_diff::{Dependency, Ecosystem};
//!
//! let dep = Dependency::new("Newtonsoft.Json", "13.0.1", Ecosystem::Nuget)
//!     .with_license("MIT");
//!
//! assert_eq!(dep.identity().name, "Newtonsoft.Json");
//! ```

mod change;
mod dependency;
mod report;

pub use change::*;
pub use dependency::*;
pub use report::*;
