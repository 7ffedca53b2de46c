//! Exclusion patterns for filtering dependency lists.
//!
//! A pattern is either an exact package name or contains `*`, which matches
//! any run of characters (including none). Patterns always match the whole
//! name, case-insensitively.
//!
//! Patterns are compiled once into a [`CompiledExclusions`] value and shared
//! read-only afterwards.
//!
//! # Example
//!
//! ```
//! use license_diff::exclude::compile;
//!
//! let rules = compile(&["Microsoft.*".to_string(), "xunit".to_string()]);
//!
//! assert!(rules.is_excluded("Microsoft.Extensions.Logging"));
//! assert!(rules.is_excluded("XUnit"));
//! assert!(!rules.is_excluded("xunit.runner"));
//! ```

use regex::{Regex, RegexBuilder};
use tracing::warn;

use crate::config::ExcludeConfig;
use crate::model::{Dependency, Ecosystem};

/// Compiled matchers for one ecosystem's exclusion list.
#[derive(Debug, Clone, Default)]
pub struct CompiledRuleSet {
    patterns: Vec<Regex>,
}

impl CompiledRuleSet {
    /// Returns true if any pattern matches the full name.
    pub fn is_excluded(&self, name: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(name))
    }
}

/// Compiled exclusion rules for every ecosystem of a project.
#[derive(Debug, Clone, Default)]
pub struct CompiledExclusions {
    nuget: CompiledRuleSet,
    npm: CompiledRuleSet,
}

impl CompiledExclusions {
    pub fn compile(config: &ExcludeConfig) -> Self {
        Self {
            nuget: compile(&config.nuget),
            npm: compile(&config.npm),
        }
    }

    pub fn rule_set(&self, ecosystem: Ecosystem) -> &CompiledRuleSet {
        match ecosystem {
            Ecosystem::Nuget => &self.nuget,
            Ecosystem::Npm => &self.npm,
        }
    }

    pub fn is_excluded(&self, dependency: &Dependency) -> bool {
        self.rule_set(dependency.ecosystem)
            .is_excluded(&dependency.name)
    }
}

/// Compiles raw patterns, skipping blank ones.
pub fn compile(patterns: &[String]) -> CompiledRuleSet {
    let patterns = patterns
        .iter()
        .filter(|p| !p.trim().is_empty())
        .filter_map(|p| match compile_pattern(p) {
            Ok(re) => Some(re),
            Err(e) => {
                warn!("Ignoring exclusion pattern '{}': {}", p, e);
                None
            }
        })
        .collect();

    CompiledRuleSet { patterns }
}

fn compile_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    let body = if pattern.contains('*') {
        regex::escape(pattern).replace(r"\*", ".*")
    } else {
        regex::escape(pattern)
    };

    RegexBuilder::new(&format!("^{body}$"))
        .case_insensitive(true)
        .build()
}

/// Returns the dependencies not matched by their ecosystem's rule set,
/// in their original order.
pub fn filter(dependencies: &[Dependency], exclusions: &CompiledExclusions) -> Vec<Dependency> {
    dependencies
        .iter()
        .filter(|d| !exclusions.is_excluded(d))
        .cloned()
        .collect()
}
