//! FTX rate limit rules
//!
//! Public REST endpoints allow 30 requests per second per IP. Push
//! subscriptions are capped at 10 per second on each connection.

use std::time::Duration;

use crate::RateLimitCache;
use crate::RateLimitQuota;
use crate::RateLimitRule;
use crate::RateLimitScope;
use crate::Result;

pub const IP_REST_PUBLIC_REQUEST_RULE: &str = "ip_rest_public_request_rule";
pub const CONNECTION_WS_SUBSCRIBE_RULE: &str = "connection_ws_subscribe_rule";

pub fn ip_rest_public_request_rule() -> RateLimitRule {
    RateLimitRule::new(IP_REST_PUBLIC_REQUEST_RULE, RateLimitScope::Ip, 30, Duration::from_secs(1))
}

/// Quota for one public REST request
pub fn one_rest_public_request() -> Vec<RateLimitQuota> {
    vec![ip_rest_public_request_rule().quota(1)]
}

pub fn connection_ws_subscribe_rule() -> RateLimitRule {
    RateLimitRule::new(CONNECTION_WS_SUBSCRIBE_RULE, RateLimitScope::Connection, 10, Duration::from_secs(1))
}

/// Quota for one subscribe or login frame on a push connection
pub fn one_ws_subscribe() -> Vec<RateLimitQuota> {
    vec![connection_ws_subscribe_rule().quota(1)]
}

pub fn rules() -> Vec<RateLimitRule> {
    vec![ip_rest_public_request_rule(), connection_ws_subscribe_rule()]
}

pub fn cache() -> Result<RateLimitCache> {
    RateLimitCache::builder().add_rules(rules()).build()
}
