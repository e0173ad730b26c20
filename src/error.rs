//! Error types for evictkit.
//!
//! ## Key Components
//!
//! - [`ConfigError`]: Returned by every fallible constructor when a parameter
//!   is out of range (zero capacity, zero `k`, zero shards, zero threshold).
//! - [`InvariantError`]: Returned by `check_invariants` when a list, bucket
//!   chain or policy core is found in an inconsistent state.
//!
//! Runtime misuse (removing an absent key, a dangling index entry) is not an
//! error value: it is logged through `tracing` and the call becomes a no-op.
//!
//! ## Example Usage
//!
//! ```
//! use evictkit::error::ConfigError;
//! use evictkit::policy::lru::LruCache;
//!
//! let cache: Result<LruCache<u64, String>, ConfigError> = LruCache::try_new(64);
//! assert!(cache.is_ok());
//!
//! let bad = LruCache::<u64, String>::try_new(0);
//! assert!(bad.is_err());
//! ```

use std::fmt;

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Error returned when a cache is constructed with invalid parameters.
///
/// The instance is never built when this is returned.
///
/// # Example
///
/// ```
/// use evictkit::policy::lru_k::LruKCache;
///
/// let err = LruKCache::<u64, u64>::try_new(16, 32, 0).unwrap_err();
/// assert!(err.to_string().contains("k"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError(String);

impl ConfigError {
    /// Creates a new `ConfigError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }

    /// Fails with "`what` must be greater than zero" when `value` is zero.
    pub(crate) fn require_positive(what: &str, value: usize) -> Result<(), ConfigError> {
        if value == 0 {
            Err(Self::new(format!("{what} must be greater than zero")))
        } else {
            Ok(())
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// InvariantError
// ---------------------------------------------------------------------------

/// Error returned when an internal structure fails a consistency walk.
///
/// Produced by `check_invariants` on
/// [`IntrusiveList`](crate::ds::intrusive_list::IntrusiveList),
/// [`FrequencyBuckets`](crate::ds::frequency_buckets::FrequencyBuckets)
/// and the policy cores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantError(String);

impl InvariantError {
    /// Creates a new `InvariantError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for InvariantError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
