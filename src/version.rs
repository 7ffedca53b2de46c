//! Version normalization and ranking.
//!
//! Package versions in the wild are not reliably semver: NuGet uses up to
//! four numeric components, some tags carry a `v` prefix, and some strings
//! are not versions at all. Ranking therefore uses a lenient dotted-numeric
//! parse, while the original strings are what callers get back.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A dotted numeric version with two to four components.
///
/// Missing trailing components order below zero, so `1.2 < 1.2.0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DottedVersion {
    major: u32,
    minor: u32,
    build: Option<u32>,
    revision: Option<u32>,
}

impl DottedVersion {
    /// Rank given to strings that do not parse.
    pub const LOWEST: DottedVersion = DottedVersion {
        major: 0,
        minor: 0,
        build: Some(0),
        revision: None,
    };

    /// Parses `major.minor[.build[.revision]]` after normalization.
    pub fn parse(version: &str) -> Option<Self> {
        let cleaned = normalize(version);
        let parts: Vec<&str> = cleaned.split('.').collect();
        if !(2..=4).contains(&parts.len()) {
            return None;
        }

        let mut numbers = Vec::with_capacity(parts.len());
        for part in parts {
            let part = part.trim();
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            numbers.push(part.parse::<u32>().ok()?);
        }

        Some(Self {
            major: numbers[0],
            minor: numbers[1],
            build: numbers.get(2).copied(),
            revision: numbers.get(3).copied(),
        })
    }

    /// Like [`parse`](Self::parse), falling back to [`LOWEST`](Self::LOWEST).
    pub fn parse_lenient(version: &str) -> Self {
        Self::parse(version).unwrap_or(Self::LOWEST)
    }
}

/// Strips a leading `v` and everything from the first `-` or `+` on.
fn normalize(version: &str) -> &str {
    let version = version.strip_prefix('v').unwrap_or(version);
    match version.find(['-', '+']) {
        Some(idx) => &version[..idx],
        None => version,
    }
}

/// Returns the highest version among the candidates.
///
/// Empty input gives `""` and a single candidate is returned as is. The
/// returned string is the candidate's original literal; among equally ranked
/// candidates the first one wins.
///
/// # Example
///
/// ```
/// use license_diff::version::highest;
///
/// assert_eq!(highest(&["1.2.3", "2.0.0", "v1.9.0-beta"]), "2.0.0");
/// assert_eq!(highest(&["not-a-version"]), "not-a-version");
/// assert_eq!(highest::<&str>(&[]), "");
/// ```
pub fn highest<S: AsRef<str>>(versions: &[S]) -> String {
    match versions {
        [] => String::new(),
        [only] => only.as_ref().to_string(),
        [first, rest @ ..] => {
            let mut best = first.as_ref();
            let mut best_rank = DottedVersion::parse_lenient(best);

            for candidate in rest {
                let candidate = candidate.as_ref();
                let rank = DottedVersion::parse_lenient(candidate);
                if rank.cmp(&best_rank) == Ordering::Greater {
                    best = candidate;
                    best_rank = rank;
                }
            }

            best.to_string()
        }
    }
}

/// How large a version change is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateKind {
    Major,
    Minor,
    Patch,
    Other,
}

impl UpdateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateKind::Major => "MAJOR",
            UpdateKind::Minor => "minor",
            UpdateKind::Patch => "patch",
            UpdateKind::Other => "other",
        }
    }
}

/// Classifies the change between two versions of the same package.
///
/// Returns `None` when either side is missing or the strings are equal.
/// Semver is tried first; otherwise the dotted numeric parse is used, and
/// anything that parses neither way is [`UpdateKind::Other`].
pub fn classify_update(from: &str, to: &str) -> Option<UpdateKind> {
    if from.is_empty() || to.is_empty() || from.eq_ignore_ascii_case(to) {
        return None;
    }

    let from_clean = from.trim_start_matches('v');
    let to_clean = to.trim_start_matches('v');

    if let (Ok(a), Ok(b)) = (
        semver::Version::parse(from_clean),
        semver::Version::parse(to_clean),
    ) {
        let kind = if a.major != b.major {
            UpdateKind::Major
        } else if a.minor != b.minor {
            UpdateKind::Minor
        } else if a.patch != b.patch {
            UpdateKind::Patch
        } else {
            UpdateKind::Other
        };
        return Some(kind);
    }

    match (DottedVersion::parse(from), DottedVersion::parse(to)) {
        (Some(a), Some(b)) if a.major != b.major => Some(UpdateKind::Major),
        (Some(a), Some(b)) if a.minor != b.minor => Some(UpdateKind::Minor),
        (Some(_), Some(_)) => Some(UpdateKind::Patch),
        _ => Some(UpdateKind::Other),
    }
}
