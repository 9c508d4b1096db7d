//! Semantic version parsing and per-field comparison.
//!
//! Comparison is field-by-field rather than a lexicographic cascade: callers
//! gate on the `major` field alone.

use std::cmp::Ordering;
use std::ops::Neg;
use webeid_types::{WebEidError, WebEidResult};

/// A parsed SemVer 2.0 version string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Semver {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub pre_release: Option<String>,
    pub build: Option<String>,
    /// The input, unchanged.
    pub string: String,
}

/// Direction of one identifier relative to the other side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i8)]
pub enum IdentifierDiff {
    Newer = 1,
    Same = 0,
    Older = -1,
}

impl From<Ordering> for IdentifierDiff {
    fn from(ordering: Ordering) -> Self {
        match ordering {
            Ordering::Greater => IdentifierDiff::Newer,
            Ordering::Equal => IdentifierDiff::Same,
            Ordering::Less => IdentifierDiff::Older,
        }
    }
}

impl Neg for IdentifierDiff {
    type Output = IdentifierDiff;

    fn neg(self) -> Self::Output {
        match self {
            IdentifierDiff::Newer => IdentifierDiff::Older,
            IdentifierDiff::Same => IdentifierDiff::Same,
            IdentifierDiff::Older => IdentifierDiff::Newer,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SemverDiff {
    pub major: IdentifierDiff,
    pub minor: IdentifierDiff,
    pub patch: IdentifierDiff,
}

/// Parse a version string, failing with `VersionInvalid`.
pub fn parse_semver(string: &str) -> WebEidResult<Semver> {
    let parsed = ::semver::Version::parse(string)
        .map_err(|_| WebEidError::version_invalid(format!("Invalid SemVer string '{string}'")))?;

    Ok(Semver {
        major: parsed.major,
        minor: parsed.minor,
        patch: parsed.patch,
        pre_release: (!parsed.pre.is_empty()).then(|| parsed.pre.to_string()),
        build: (!parsed.build.is_empty()).then(|| parsed.build.to_string()),
        string: string.to_owned(),
    })
}

/// How `a` relates to `b`, one field at a time.
pub fn compare_semver(a: &Semver, b: &Semver) -> SemverDiff {
    SemverDiff {
        major: a.major.cmp(&b.major).into(),
        minor: a.minor.cmp(&b.minor).into(),
        patch: a.patch.cmp(&b.patch).into(),
    }
}
