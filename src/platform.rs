//! Cross-platform path and executable resolution.
//!
//! This module provides functions for finding the platform-specific
//! locations of package metadata and the tools that list dependencies.

use std::path::PathBuf;

/// Returns the global NuGet packages folder.
///
/// Resolution order:
/// - `NUGET_PACKAGES` environment variable, if set and non-empty
/// - `~/.nuget/packages/` on all platforms
///
/// Falls back to `./.nuget/packages` if no home directory can be determined.
pub fn nuget_packages_dir() -> PathBuf {
    if let Some(path) = std::env::var_os("NUGET_PACKAGES").filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }

    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".nuget")
        .join("packages")
}

/// Returns the npm executable name for the current platform.
pub fn npm_command() -> &'static str {
    if cfg!(target_os = "windows") {
        "npm.cmd"
    } else {
        "npm"
    }
}

/// Returns the dotnet executable name.
pub fn dotnet_command() -> &'static str {
    "dotnet"
}

/// Returns the git executable name.
pub fn git_command() -> &'static str {
    "git"
}
