use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

/// Result type for rate limiting operations
pub type Result<T> = std::result::Result<T, RateLimitError>;

/// Errors that can occur during rate limiting operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RateLimitError {
    /// No permits left in the current window and the caller gave up waiting
    #[error("Rate limit quota exceeded for rule {rule}, next reset in {retry_after:?}")]
    QuotaExceeded { rule: Arc<str>, retry_after: Duration },

    /// Quota references a rule the cache was not built with
    #[error("Unknown rate limit rule: {0}")]
    UnknownRule(Arc<str>),

    /// Quota asks for more permits than the rule can ever grant in one window
    #[error("Quota of {requested} permits can never be granted by rule {rule} (max {max_permits})")]
    InvalidQuota { rule: Arc<str>, requested: u32, max_permits: u32 },

    /// Rule is scoped per account or per connection but no key was supplied
    #[error("Rule {0} requires a scope key that was not supplied")]
    MissingScopeKey(Arc<str>),

    /// Invalid rule configuration
    #[error("Invalid rate limit configuration: {0}")]
    InvalidConfig(&'static str),
}

impl RateLimitError {
    /// True when the failure is a plain quota timeout rather than a configuration problem
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, RateLimitError::QuotaExceeded { .. })
    }
}
