//! Cache entry expiration policy.

use std::time::Duration;

/// Expiration policy attached to a cache entry at write time.
///
/// `AbsoluteTtl` expires at a fixed point after creation regardless of
/// access; `Sliding` restarts its countdown when the entry is read through
/// a policy-aware path; `Never` is reserved for permanent keys - the entry
/// lives until explicitly removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheExpiration {
    /// Expire a fixed duration after the write
    AbsoluteTtl(Duration),
    /// Expire after a period of no access
    Sliding(Duration),
    /// No expiry - removed only explicitly
    Never,
}

impl CacheExpiration {
    /// Absolute expiration relative to now
    pub fn absolute(ttl: Duration) -> Self {
        Self::AbsoluteTtl(ttl)
    }

    /// Sliding expiration window
    pub fn sliding(ttl: Duration) -> Self {
        Self::Sliding(ttl)
    }

    /// Build from a key-type TTL lookup (`None` means permanent)
    pub fn from_key_ttl(ttl: Option<Duration>) -> Self {
        match ttl {
            Some(d) => Self::AbsoluteTtl(d),
            None => Self::Never,
        }
    }

    /// The TTL to install at write time, if any
    pub fn ttl(&self) -> Option<Duration> {
        match self {
            Self::AbsoluteTtl(d) | Self::Sliding(d) => Some(*d),
            Self::Never => None,
        }
    }

    /// Whether reads through a policy-aware path should refresh the TTL
    pub fn is_sliding(&self) -> bool {
        matches!(self, Self::Sliding(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttl_accessor() {
        assert_eq!(
            CacheExpiration::absolute(Duration::from_secs(60)).ttl(),
            Some(Duration::from_secs(60))
        );
        assert_eq!(
            CacheExpiration::sliding(Duration::from_secs(30)).ttl(),
            Some(Duration::from_secs(30))
        );
        assert_eq!(CacheExpiration::Never.ttl(), None);
    }

    #[test]
    fn test_sliding_detection() {
        assert!(CacheExpiration::sliding(Duration::from_secs(1)).is_sliding());
        assert!(!CacheExpiration::absolute(Duration::from_secs(1)).is_sliding());
        assert!(!CacheExpiration::Never.is_sliding());
    }

    #[test]
    fn test_from_key_ttl() {
        assert_eq!(
            CacheExpiration::from_key_ttl(Some(Duration::from_secs(5))),
            CacheExpiration::AbsoluteTtl(Duration::from_secs(5))
        );
        assert_eq!(CacheExpiration::from_key_ttl(None), CacheExpiration::Never);
    }
}
