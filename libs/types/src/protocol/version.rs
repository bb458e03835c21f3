//! GIOP protocol versions and body encodings

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A GIOP protocol version as carried in header bytes 4 and 5
///
/// Ordering is lexicographic on `(major, minor)`, which is what admission
/// control compares against the locally supported maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "String", into = "String")
)]
pub struct GiopVersion {
    pub major: u8,
    pub minor: u8,
}

impl GiopVersion {
    pub const V1_0: GiopVersion = GiopVersion::new(1, 0);
    pub const V1_1: GiopVersion = GiopVersion::new(1, 1);
    pub const V1_2: GiopVersion = GiopVersion::new(1, 2);

    pub const fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }

    /// The supported revision this version maps to, if any
    pub fn revision(self) -> Option<Revision> {
        match (self.major, self.minor) {
            (1, 0) => Some(Revision::V1_0),
            (1, 1) => Some(Revision::V1_1),
            (1, 2) => Some(Revision::V1_2),
            _ => None,
        }
    }

    /// True for 1.1 and later, where the more-fragments flag exists
    pub fn supports_fragmentation(self) -> bool {
        self >= Self::V1_1
    }
}

impl Default for GiopVersion {
    fn default() -> Self {
        Self::V1_2
    }
}

impl fmt::Display for GiopVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Failure to parse a `"major.minor"` version string
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Invalid GIOP version '{input}': expected \"major.minor\" such as \"1.2\"")]
pub struct VersionParseError {
    pub input: String,
}

impl FromStr for GiopVersion {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || VersionParseError {
            input: s.to_string(),
        };
        let (major, minor) = s.trim().split_once('.').ok_or_else(err)?;
        Ok(Self::new(
            major.parse().map_err(|_| err())?,
            minor.parse().map_err(|_| err())?,
        ))
    }
}

impl TryFrom<String> for GiopVersion {
    type Error = VersionParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<GiopVersion> for String {
    fn from(version: GiopVersion) -> Self {
        version.to_string()
    }
}

/// The closed set of GIOP revisions this workspace implements
///
/// Every per-version code path matches on this enum so that adding a
/// revision is a compile error at each consumption site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Revision {
    V1_0,
    V1_1,
    V1_2,
}

impl Revision {
    pub const ALL: [Revision; 3] = [Revision::V1_0, Revision::V1_1, Revision::V1_2];

    pub fn version(self) -> GiopVersion {
        match self {
            Revision::V1_0 => GiopVersion::V1_0,
            Revision::V1_1 => GiopVersion::V1_1,
            Revision::V1_2 => GiopVersion::V1_2,
        }
    }
}

impl From<Revision> for GiopVersion {
    fn from(revision: Revision) -> Self {
        revision.version()
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.version().fmt(f)
    }
}

/// How the message body is encoded
///
/// Detected from the header marker `0x0D, n` when Java serialization is
/// enabled; such messages are otherwise treated as GIOP 1.2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EncodingVersion {
    #[default]
    Cdr,
    JavaSerialization(u8),
}

impl EncodingVersion {
    pub fn is_cdr(self) -> bool {
        matches!(self, EncodingVersion::Cdr)
    }
}

impl fmt::Display for EncodingVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodingVersion::Cdr => write!(f, "CDR"),
            EncodingVersion::JavaSerialization(v) => write!(f, "Java serialization v{}", v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_ordering() {
        assert!(GiopVersion::V1_0 < GiopVersion::V1_1);
        assert!(GiopVersion::V1_1 < GiopVersion::V1_2);
        assert!(GiopVersion::new(1, 3) > GiopVersion::V1_2);
        assert!(GiopVersion::new(2, 0) > GiopVersion::new(1, 9));
    }

    #[test]
    fn test_revision_mapping() {
        for revision in Revision::ALL {
            assert_eq!(revision.version().revision(), Some(revision));
        }
        assert_eq!(GiopVersion::new(1, 3).revision(), None);
        assert_eq!(GiopVersion::new(0x0D, 1).revision(), None);
    }

    #[test]
    fn test_version_parse() {
        assert_eq!("1.2".parse::<GiopVersion>().unwrap(), GiopVersion::V1_2);
        assert_eq!(" 1.0 ".parse::<GiopVersion>().unwrap(), GiopVersion::V1_0);
        assert!("12".parse::<GiopVersion>().is_err());
        assert!("1.x".parse::<GiopVersion>().is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_version_serde_as_string() {
        let json = serde_json::to_string(&GiopVersion::V1_1).unwrap();
        assert_eq!(json, "\"1.1\"");
        let back: GiopVersion = serde_json::from_str(&json).unwrap();
        assert_eq!(back, GiopVersion::V1_1);
    }
}
