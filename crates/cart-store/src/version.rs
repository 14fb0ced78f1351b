use serde::{Deserialize, Serialize};

/// Stored revision of a cart.
///
/// 0 means the cart was never written; every successful save advances it by
/// one. A save names the revision it was computed from and is rejected if
/// the store has moved on.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Version(i64);

impl Version {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Revision of a cart not yet stored.
    pub fn initial() -> Self {
        Self(0)
    }

    /// Revision after the first save.
    pub fn first() -> Self {
        Self(1)
    }

    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// True once the cart has been written at least once.
    pub fn is_stored(self) -> bool {
        self.0 > 0
    }

    pub fn as_i64(self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_progression() {
        assert_eq!(Version::initial().as_i64(), 0);
        assert_eq!(Version::initial().next(), Version::first());
        assert_eq!(Version::first().next(), Version::new(2));
    }

    #[test]
    fn test_stored_versions() {
        assert!(!Version::default().is_stored());
        assert!(Version::first().is_stored());
        assert_eq!(Version::new(3).to_string(), "v3");
    }
}
