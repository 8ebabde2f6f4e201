//! Composite mapping version strings
//!
//! A mapping version is a set of hyphen-separated segments built around a
//! mandatory date-like timestamp:
//!
//! | Shape | Example | map_mc | timestamp | mc |
//! |-------|---------|--------|-----------|----|
//! | `TIMESTAMP` | `2026.01.01` | - | `2026.01.01` | - |
//! | `TIMESTAMP-MC` | `2026.01.01-1.12-pre1` | - | `2026.01.01` | `1.12-pre1` |
//! | `MAPMC-TIMESTAMP-MC` | `1.12.2-2026.01.01-1.13` | `1.12.2` | `2026.01.01` | `1.13` |
//!
//! `map_mc` is the platform version the mapping was produced against, `mc`
//! the platform version it is currently applied to. A bare timestamp takes on
//! whatever platform it is later retargeted to; once a platform has been
//! recorded it stays the origin.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum VersionError {
    #[error("Invalid version format '{input}': {reason}")]
    InvalidFormat { input: String, reason: String },
}

/// How forbidden markers are matched against a platform-version token
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MarkerMatch {
    /// Marker anywhere inside the token
    #[default]
    Substring,
    /// Marker must equal one whole hyphen-separated segment
    Segment,
}

/// Validation policy for the platform-version positions of a version string
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct VersionPolicy {
    /// Markers that identify unstable builds (rejected as platform versions)
    pub forbidden_markers: Vec<String>,

    /// Matching mode for `forbidden_markers`
    pub marker_match: MarkerMatch,
}

impl Default for VersionPolicy {
    fn default() -> Self {
        Self {
            forbidden_markers: vec!["nightly".to_string(), "SNAPSHOT".to_string()],
            marker_match: MarkerMatch::Substring,
        }
    }
}

impl VersionPolicy {
    /// Returns the first forbidden marker found in `token`
    pub fn forbidden_marker(&self, token: &str) -> Option<&str> {
        self.forbidden_markers
            .iter()
            .map(String::as_str)
            .find(|marker| match self.marker_match {
                MarkerMatch::Substring => token.contains(marker),
                MarkerMatch::Segment => token.split('-').any(|seg| seg == *marker),
            })
    }

    /// Accepts `token` only as a platform version this policy allows
    pub fn check_platform(&self, token: &str) -> Result<(), VersionError> {
        check_platform(token, self).map_err(|reason| VersionError::InvalidFormat {
            input: token.to_string(),
            reason,
        })
    }
}

/// `YYYY.MM.DD` or `YYYYMMDD`, and a real calendar date
fn is_date_like(segment: &str) -> bool {
    let bytes = segment.as_bytes();
    let digits_at = |range: std::ops::Range<usize>| bytes[range].iter().all(u8::is_ascii_digit);

    match bytes.len() {
        10 if bytes[4] == b'.' && bytes[7] == b'.' => {
            digits_at(0..4)
                && digits_at(5..7)
                && digits_at(8..10)
                && NaiveDate::parse_from_str(segment, "%Y.%m.%d").is_ok()
        }
        8 if digits_at(0..8) => NaiveDate::parse_from_str(segment, "%Y%m%d").is_ok(),
        _ => false,
    }
}

/// Release (`1.12.2`), pre-release/candidate (`1.12-pre1`, `1.20.5-rc1`)
/// or weekly snapshot (`18w50a`)
fn is_platform_version(token: &str) -> bool {
    if is_weekly_snapshot(token) {
        return true;
    }

    let (base, suffix) = match token.split_once('-') {
        Some((base, suffix)) => (base, Some(suffix)),
        None => (token, None),
    };

    let parts: Vec<&str> = base.split('.').collect();
    let base_ok = parts.len() >= 2
        && parts
            .iter()
            .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()));

    let suffix_ok = match suffix {
        None => true,
        Some(s) => ["pre", "rc"].iter().any(|kind| {
            s.strip_prefix(kind)
                .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
        }),
    };

    base_ok && suffix_ok
}

fn is_weekly_snapshot(token: &str) -> bool {
    let bytes = token.as_bytes();
    bytes.len() == 6
        && bytes[0..2].iter().all(u8::is_ascii_digit)
        && bytes[2] == b'w'
        && bytes[3..5].iter().all(u8::is_ascii_digit)
        && bytes[5].is_ascii_lowercase()
}

/// Rejects `token` unless it is platform-version shaped and free of forbidden markers
fn check_platform(token: &str, policy: &VersionPolicy) -> Result<(), String> {
    if let Some(marker) = policy.forbidden_marker(token) {
        return Err(format!(
            "'{}' is a {} build, not a platform version",
            token, marker
        ));
    }
    if !is_platform_version(token) {
        return Err(format!("'{}' is not a platform version", token));
    }
    Ok(())
}

/// Decoded mapping version
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VersionTriple {
    map_mc_version: Option<String>,
    timestamp: String,
    mc_version: Option<String>,
}

impl VersionTriple {
    /// Parses a version string with the default policy
    pub fn parse(input: &str) -> Result<Self, VersionError> {
        Self::parse_with(input, &VersionPolicy::default())
    }

    /// Parses a version string, validating platform segments against `policy`
    pub fn parse_with(input: &str, policy: &VersionPolicy) -> Result<Self, VersionError> {
        let input = input.trim();
        let invalid = |reason: String| VersionError::InvalidFormat {
            input: input.to_string(),
            reason,
        };

        if input.is_empty() {
            return Err(invalid("version is empty".to_string()));
        }

        let segments: Vec<&str> = input.split('-').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(invalid("contains an empty segment".to_string()));
        }

        let ts_index = match segments.iter().position(|s| is_date_like(s)) {
            Some(index) => index,
            None => {
                let reason = match policy.forbidden_marker(input) {
                    Some(marker) => format!("'{}' builds are not supported", marker),
                    None => "no date-like timestamp segment".to_string(),
                };
                return Err(invalid(reason));
            }
        };

        let platform = |token: String| -> Result<String, VersionError> {
            check_platform(&token, policy).map_err(&invalid)?;
            Ok(token)
        };

        let timestamp = segments[ts_index].to_string();
        let before = segments[..ts_index].join("-");
        let after = segments[ts_index + 1..].join("-");

        match (before.is_empty(), after.is_empty()) {
            (true, true) => Ok(Self {
                map_mc_version: None,
                timestamp,
                mc_version: None,
            }),
            (true, false) => Ok(Self {
                map_mc_version: None,
                timestamp,
                mc_version: Some(platform(after)?),
            }),
            (false, false) => {
                let map_mc = platform(before)?;
                let mc = platform(after)?;
                Ok(Self {
                    map_mc_version: Some(map_mc),
                    timestamp,
                    mc_version: Some(mc),
                })
            }
            (false, true) => Err(invalid(format!(
                "platform prefix '{}' must be followed by a target platform version",
                before
            ))),
        }
    }

    /// Platform version the mapping was produced against, if recorded
    pub fn map_mc_version(&self) -> Option<&str> {
        self.map_mc_version.as_deref()
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// Platform version currently targeted
    pub fn mc_version(&self) -> Option<&str> {
        self.mc_version.as_deref()
    }

    /// `map_mc_version`, falling back to the targeted platform
    pub fn effective_map_mc(&self) -> Option<&str> {
        self.map_mc_version().or(self.mc_version())
    }

    /// Retargets the mapping to another platform version under the default policy
    pub fn with_minecraft(&self, mc_version: &str) -> Result<Self, VersionError> {
        self.with_minecraft_in(mc_version, &VersionPolicy::default())
    }

    /// Retargets the mapping to another platform version
    ///
    /// The origin is pinned to the first platform the string recorded: an
    /// explicit `map_mc`, else the previous target. Only a bare timestamp
    /// takes on the new platform as its origin. The target is validated the
    /// same way a parsed platform segment is.
    pub fn with_minecraft_in(
        &self,
        mc_version: &str,
        policy: &VersionPolicy,
    ) -> Result<Self, VersionError> {
        let mc_version = mc_version.trim();
        policy.check_platform(mc_version)?;

        Ok(Self {
            map_mc_version: Some(self.effective_map_mc().unwrap_or(mc_version).to_string()),
            timestamp: self.timestamp.clone(),
            mc_version: Some(mc_version.to_string()),
        })
    }

    /// Minimal canonical rendering
    ///
    /// `map_mc` is only written when it differs from the targeted platform.
    pub fn to_friendly(&self) -> String {
        match (&self.map_mc_version, &self.mc_version) {
            (Some(map_mc), Some(mc)) if map_mc != mc => {
                format!("{}-{}-{}", map_mc, self.timestamp, mc)
            }
            (_, Some(mc)) => format!("{}-{}", self.timestamp, mc),
            // map_mc is never set without mc
            (_, None) => self.timestamp.clone(),
        }
    }
}

impl fmt::Display for VersionTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_friendly())
    }
}

impl FromStr for VersionTriple {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for VersionTriple {
    type Error = VersionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<VersionTriple> for String {
    fn from(version: VersionTriple) -> Self {
        version.to_friendly()
    }
}
