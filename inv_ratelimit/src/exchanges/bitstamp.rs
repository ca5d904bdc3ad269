//! Bitstamp rate limit rules
//!
//! REST requests are limited to 8000 per 10 minutes per client IP.

use std::time::Duration;

use crate::RateLimitCache;
use crate::RateLimitQuota;
use crate::RateLimitRule;
use crate::RateLimitScope;
use crate::Result;

pub const IP_REST_REQUEST_RULE: &str = "ip_rest_request_rule";

pub fn ip_rest_request_rule() -> RateLimitRule {
    RateLimitRule::new(IP_REST_REQUEST_RULE, RateLimitScope::Ip, 8000, Duration::from_secs(600))
}

pub fn one_rest_request() -> Vec<RateLimitQuota> {
    vec![ip_rest_request_rule().quota(1)]
}

pub fn rules() -> Vec<RateLimitRule> {
    vec![ip_rest_request_rule()]
}

pub fn cache() -> Result<RateLimitCache> {
    RateLimitCache::builder().add_rules(rules()).build()
}
