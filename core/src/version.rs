use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use thiserror::Error;

/// Sentinel used for absent versions at the rendering boundary
pub const NOT_AVAILABLE: &str = "N/A";

/// Sentinel returned in cache-only mode when nothing is cached
pub const NOT_CACHED: &str = "N/A (cache)";

/// Patch distance still considered up to date within the same minor series
pub const PATCH_TOLERANCE: u64 = 5;

static TRIPLE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\.(\d+)\.(\d+)").expect("valid version pattern"));

#[derive(Error, Debug, PartialEq, Eq)]
pub enum VersionError {
    #[error("Invalid version string: {0}")]
    InvalidVersion(String),
}

/// A `major.minor.patch` triple parsed from the front of a version string
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VersionTriple {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl VersionTriple {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse leniently: `None` instead of an error for anything that does not
    /// start with three numeric components.
    pub fn parse(s: &str) -> Option<Self> {
        s.parse().ok()
    }
}

impl FromStr for VersionTriple {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let unprefixed = trimmed
            .strip_prefix('v')
            .or_else(|| trimmed.strip_prefix('V'))
            .unwrap_or(trimmed);

        let caps = TRIPLE_PATTERN
            .captures(unprefixed)
            .ok_or_else(|| VersionError::InvalidVersion(s.to_string()))?;

        // Capture groups are digit-only, so parsing fails only on overflow
        let component = |idx: usize| -> Result<u64, VersionError> {
            caps.get(idx)
                .and_then(|m| m.as_str().parse().ok())
                .ok_or_else(|| VersionError::InvalidVersion(s.to_string()))
        };

        Ok(Self {
            major: component(1)?,
            minor: component(2)?,
            patch: component(3)?,
        })
    }
}

impl fmt::Display for VersionTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// How far a declared version is behind the latest published one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Staleness {
    /// 🔴 the latest release is a new major version
    MajorBehind,
    /// 🟡 a newer minor exists, or the patch distance exceeds the tolerance
    MinorBehind,
    /// 🟢 current, close enough, or ahead of the recorded latest
    UpToDate,
    /// ⚫ one side is missing or unparsable
    Undetermined,
}

impl Staleness {
    /// Classify `current` against `latest`.
    ///
    /// Evaluation order:
    /// 1. either side absent → undetermined
    /// 2. either side unparsable → undetermined
    /// 3. newer major → major behind
    /// 4. same major: newer minor → minor behind; same minor → patch distance
    ///    decides between up to date (≤ 5) and minor behind
    /// 5. everything else, including a current version that is ahead of
    ///    latest, is up to date
    pub fn classify(current: Option<&str>, latest: Option<&str>) -> Self {
        let (Some(current), Some(latest)) = (current, latest) else {
            return Staleness::Undetermined;
        };

        let (Some(current), Some(latest)) =
            (VersionTriple::parse(current), VersionTriple::parse(latest))
        else {
            return Staleness::Undetermined;
        };

        if latest.major > current.major {
            return Staleness::MajorBehind;
        }

        if latest.major == current.major {
            if latest.minor > current.minor {
                return Staleness::MinorBehind;
            }
            if latest.minor == current.minor {
                return if latest.patch.abs_diff(current.patch) <= PATCH_TOLERANCE {
                    Staleness::UpToDate
                } else {
                    Staleness::MinorBehind
                };
            }
        }

        Staleness::UpToDate
    }

    /// Classify two boundary strings where `"N/A"` stands for absence
    pub fn classify_specs(current: &str, latest: &str) -> Self {
        fn present(s: &str) -> Option<&str> {
            (s != NOT_AVAILABLE).then_some(s)
        }
        Self::classify(present(current), present(latest))
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Staleness::MajorBehind => "🔴",
            Staleness::MinorBehind => "🟡",
            Staleness::UpToDate => "🟢",
            Staleness::Undetermined => "⚫",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Staleness::MajorBehind => "major",
            Staleness::MinorBehind => "minor",
            Staleness::UpToDate => "current",
            Staleness::Undetermined => "unknown",
        }
    }
}

impl fmt::Display for Staleness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
