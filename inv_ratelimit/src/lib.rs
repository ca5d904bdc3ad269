pub mod cache;
pub mod error;
pub mod exchanges;
pub mod interceptor;
pub mod rule;
pub mod scope;
pub mod throttle;
mod time;
mod window;

pub use cache::Grant;
pub use cache::Permit;
pub use cache::RateLimitCache;
pub use cache::RateLimitCacheBuilder;
pub use error::RateLimitError;
pub use error::Result;
pub use interceptor::QuotaEvent;
pub use interceptor::QuotaOutcome;
pub use interceptor::RateLimitQuotaInterceptor;
pub use interceptor::TracingInterceptor;
pub use rule::RateLimitQuota;
pub use rule::RateLimitRule;
pub use rule::RateLimitRuleBuilder;
pub use rule::RateLimitScope;
pub use scope::ScopeKeys;
pub use throttle::RateLimitThrottle;
