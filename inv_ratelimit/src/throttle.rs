use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::cache::Permit;
use crate::cache::RateLimitCache;
use crate::error::RateLimitError;
use crate::error::Result;
use crate::interceptor::QuotaEvent;
use crate::interceptor::QuotaOutcome;
use crate::interceptor::RateLimitQuotaInterceptor;
use crate::rule::RateLimitQuota;
use crate::scope::ScopeKeys;

/// Gate in front of a shared [`RateLimitCache`]
///
/// Cheap to clone; clones share the same cache and interceptor.
#[derive(Clone)]
pub struct RateLimitThrottle {
    cache: Arc<RateLimitCache>,
    interceptor: Option<Arc<dyn RateLimitQuotaInterceptor>>,
}

impl RateLimitThrottle {
    pub fn new(cache: Arc<RateLimitCache>) -> Self {
        Self { cache, interceptor: None }
    }

    /// Attach an interceptor that observes every attempt
    pub fn with_interceptor(mut self, interceptor: Arc<dyn RateLimitQuotaInterceptor>) -> Self {
        self.interceptor = Some(interceptor);
        self
    }

    pub fn cache(&self) -> &Arc<RateLimitCache> {
        &self.cache
    }

    /// Single non-blocking attempt
    pub fn try_acquire(&self, quotas: &[RateLimitQuota], scope: &ScopeKeys) -> Result<Permit> {
        let result = self.cache.try_acquire(quotas, scope);

        if let Some(interceptor) = &self.interceptor {
            let event = match &result {
                Ok(_) => QuotaEvent { outcome: QuotaOutcome::Granted, quotas, scope, error: None },
                Err(err) => QuotaEvent { outcome: QuotaOutcome::Denied, quotas, scope, error: Some(err) },
            };
            interceptor.observe(&event);
        }

        result
    }

    /// Wait until every quota can be granted at once
    ///
    /// While permits are exhausted the caller sleeps until the next window reset.
    /// With a `timeout` the wait is bounded and ends in
    /// [`RateLimitError::QuotaExceeded`]; `None` waits for as long as it takes.
    /// Configuration errors are returned immediately. Dropping the future while it
    /// waits consumes nothing.
    pub async fn acquire(&self, quotas: &[RateLimitQuota], scope: &ScopeKeys, timeout: Option<Duration>) -> Result<Permit> {
        let deadline = timeout.map(|timeout| Instant::now() + timeout);

        loop {
            let (rule, retry_after) = match self.try_acquire(quotas, scope) {
                Ok(permit) => return Ok(permit),
                Err(RateLimitError::QuotaExceeded { rule, retry_after }) => (rule, retry_after),
                Err(err) => return Err(err),
            };

            let now = Instant::now();
            let wake = now + retry_after;

            match deadline {
                Some(deadline) if deadline <= now => return Err(RateLimitError::QuotaExceeded { rule, retry_after }),
                Some(deadline) if deadline < wake => {
                    // The next reset falls after the deadline, nothing can free up before it
                    tokio::time::sleep_until(deadline).await;
                    return Err(RateLimitError::QuotaExceeded { rule, retry_after: wake.saturating_duration_since(deadline) });
                }
                _ => {
                    tracing::debug!("Quota for {rule} exhausted, waiting {retry_after:?} for reset");
                    tokio::time::sleep_until(wake).await;
                }
            }
        }
    }
}
