//! Huobi DM (inverse and linear swaps) rate limit rules
//!
//! - Public market data: 800 requests per second per IP
//! - Private endpoints: 72 requests per 3 seconds per account

use std::time::Duration;

use crate::RateLimitCache;
use crate::RateLimitQuota;
use crate::RateLimitRule;
use crate::RateLimitScope;
use crate::Result;

pub const IP_REST_PUBLIC_REQUEST_RULE: &str = "ip_rest_public_request_rule";
pub const API_KEY_REST_PRIVATE_REQUEST_RULE: &str = "api_key_rest_private_request_rule";

pub fn ip_rest_public_request_rule() -> RateLimitRule {
    RateLimitRule::new(IP_REST_PUBLIC_REQUEST_RULE, RateLimitScope::Ip, 800, Duration::from_secs(1))
}

pub fn api_key_rest_private_request_rule() -> RateLimitRule {
    RateLimitRule::new(API_KEY_REST_PRIVATE_REQUEST_RULE, RateLimitScope::ApiKey, 72, Duration::from_secs(3))
}

pub fn one_rest_public_request() -> Vec<RateLimitQuota> {
    vec![ip_rest_public_request_rule().quota(1)]
}

pub fn one_rest_private_request() -> Vec<RateLimitQuota> {
    vec![api_key_rest_private_request_rule().quota(1)]
}

pub fn rules() -> Vec<RateLimitRule> {
    vec![ip_rest_public_request_rule(), api_key_rest_private_request_rule()]
}

pub fn cache() -> Result<RateLimitCache> {
    RateLimitCache::builder().add_rules(rules()).build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RateLimitError;
    use crate::ScopeKeys;

    #[test]
    fn test_private_limit_is_per_account() {
        let cache = cache().unwrap();
        let account = ScopeKeys::none().with_api_key("uid-1");

        for _ in 0..72 {
            cache.try_acquire(&one_rest_private_request(), &account).unwrap();
        }
        assert!(cache.try_acquire(&one_rest_private_request(), &account).is_err());
        assert!(cache.try_acquire(&one_rest_private_request(), &ScopeKeys::none().with_api_key("uid-2")).is_ok());
    }

    #[test]
    fn test_private_limit_needs_account() {
        let cache = cache().unwrap();
        let result = cache.try_acquire(&one_rest_private_request(), &ScopeKeys::none());
        assert!(matches!(result, Err(RateLimitError::MissingScopeKey(_))));
    }
}
