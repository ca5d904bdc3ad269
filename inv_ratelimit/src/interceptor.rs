use crate::error::RateLimitError;
use crate::rule::RateLimitQuota;
use crate::scope::ScopeKeys;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaOutcome {
    Granted,
    Denied,
}

/// One admission attempt as seen by an interceptor
#[derive(Debug)]
pub struct QuotaEvent<'a> {
    pub outcome: QuotaOutcome,
    pub quotas: &'a [RateLimitQuota],
    pub scope: &'a ScopeKeys,
    /// Set when the attempt was denied
    pub error: Option<&'a RateLimitError>,
}

/// Observer of every acquire attempt made through a throttle
///
/// Interceptors are for auditing only. They run after the admission decision
/// and cannot change it.
pub trait RateLimitQuotaInterceptor: Send + Sync {
    fn observe(&self, event: &QuotaEvent<'_>);
}

/// Interceptor that writes every attempt to the tracing log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingInterceptor;

impl RateLimitQuotaInterceptor for TracingInterceptor {
    fn observe(&self, event: &QuotaEvent<'_>) {
        let rules: Vec<&str> = event.quotas.iter().map(|quota| quota.rule().name().as_ref()).collect();
        match event.outcome {
            QuotaOutcome::Granted => tracing::trace!(?rules, "Quota granted"),
            QuotaOutcome::Denied => match event.error {
                Some(err) if err.is_quota_exceeded() => tracing::debug!(?rules, "Quota denied: {err}"),
                Some(err) => tracing::warn!(?rules, "Quota rejected: {err}"),
                None => tracing::debug!(?rules, "Quota denied"),
            },
        }
    }
}
