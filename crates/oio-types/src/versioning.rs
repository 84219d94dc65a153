// Path: crates/oio-types/src/versioning.rs
use serde::{Deserialize, Serialize};

/// Versioning policy for a container, stored as a signed integer in the
/// admin table:
/// `<0` unlimited, `0` disabled, `1` suspended (overwrite in place at v=0),
/// `>1` keep that many versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VersioningPolicy {
    Disabled,
    Suspended,
    Bounded(u32),
    Unlimited,
}

impl VersioningPolicy {
    pub fn from_raw(v: i64) -> Self {
        if v < 0 {
            Self::Unlimited
        } else if v == 0 {
            Self::Disabled
        } else if v == 1 {
            Self::Suspended
        } else {
            Self::Bounded(v as u32)
        }
    }

    pub fn to_raw(self) -> i64 {
        match self {
            Self::Unlimited => -1,
            Self::Disabled => 0,
            Self::Suspended => 1,
            Self::Bounded(n) => n as i64,
        }
    }

    /// `true` for policies where a second PUT on the same alias name
    /// overwrites rather than creating a new version row.
    pub fn overwrites_in_place(self) -> bool {
        matches!(self, Self::Suspended)
    }

    /// Maximum number of alias rows to retain, if bounded.
    pub fn max_versions(self) -> Option<u32> {
        match self {
            Self::Bounded(n) => Some(n),
            Self::Suspended => Some(1),
            Self::Disabled => Some(1),
            Self::Unlimited => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_is_unlimited() {
        assert_eq!(VersioningPolicy::from_raw(-5), VersioningPolicy::Unlimited);
        assert_eq!(VersioningPolicy::from_raw(-1).max_versions(), None);
    }

    #[test]
    fn zero_is_disabled_one_is_suspended() {
        assert_eq!(VersioningPolicy::from_raw(0), VersioningPolicy::Disabled);
        assert_eq!(VersioningPolicy::from_raw(1), VersioningPolicy::Suspended);
        assert!(VersioningPolicy::from_raw(1).overwrites_in_place());
    }

    #[test]
    fn raw_roundtrips() {
        for raw in [-1, 0, 1, 5, 100] {
            assert_eq!(VersioningPolicy::from_raw(raw).to_raw(), raw);
        }
    }
}
