use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use crate::error::RateLimitError;
use crate::error::Result;

/// What a rule's counter is shared across
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateLimitScope {
    /// One counter for every caller behind the same outbound IP
    Ip,
    /// One counter per API key / account id
    ApiKey,
    /// One counter per push connection
    Connection,
}

/// Fixed window throttling policy
///
/// A rule allows at most `max_permits` within every `reset_period`. Rules are
/// identified by name, so two rules with the same name are the same counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitRule {
    name: Arc<str>,
    scope: RateLimitScope,
    max_permits: u32,
    reset_period: Duration,
}

impl RateLimitRule {
    /// Create a new rule
    ///
    /// # Panics
    /// Panics if the name is empty, `max_permits` is zero or `reset_period` is zero.
    /// Use [`RateLimitRule::builder`] for rules coming from configuration.
    pub fn new(name: impl Into<Arc<str>>, scope: RateLimitScope, max_permits: u32, reset_period: Duration) -> Self {
        let name = name.into();
        assert!(!name.is_empty(), "Rule name must not be empty");
        assert!(max_permits > 0, "Max permits must be greater than 0");
        assert!(!reset_period.is_zero(), "Reset period must be greater than 0");

        Self { name, scope, max_permits, reset_period }
    }

    /// Create a builder for configuring a rule
    pub fn builder() -> RateLimitRuleBuilder {
        RateLimitRuleBuilder::new()
    }

    pub fn name(&self) -> &Arc<str> {
        &self.name
    }

    pub fn scope(&self) -> RateLimitScope {
        self.scope
    }

    pub fn max_permits(&self) -> u32 {
        self.max_permits
    }

    pub fn reset_period(&self) -> Duration {
        self.reset_period
    }

    /// Quota consuming `permits` of this rule
    pub fn quota(&self, permits: u32) -> RateLimitQuota {
        RateLimitQuota { rule: self.clone(), permits }
    }
}

/// Permits one logical call consumes against a rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitQuota {
    rule: RateLimitRule,
    permits: u32,
}

impl RateLimitQuota {
    pub fn rule(&self) -> &RateLimitRule {
        &self.rule
    }

    pub fn permits(&self) -> u32 {
        self.permits
    }
}

/// Builder for rules loaded from configuration
#[derive(Debug, Default)]
pub struct RateLimitRuleBuilder {
    name: Option<Arc<str>>,
    scope: Option<RateLimitScope>,
    max_permits: Option<u32>,
    reset_period: Option<Duration>,
}

impl RateLimitRuleBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the unique rule name
    pub fn name(mut self, name: impl Into<Arc<str>>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the counter scope (defaults to [`RateLimitScope::Ip`])
    pub fn scope(mut self, scope: RateLimitScope) -> Self {
        self.scope = Some(scope);
        self
    }

    /// Set the number of permits per window
    pub fn max_permits(mut self, max_permits: u32) -> Self {
        self.max_permits = Some(max_permits);
        self
    }

    /// Set the window duration
    pub fn reset_period(mut self, reset_period: Duration) -> Self {
        self.reset_period = Some(reset_period);
        self
    }

    /// Set `max_permits` per one second window
    pub fn per_second(self, max_permits: u32) -> Self {
        self.max_permits(max_permits).reset_period(Duration::from_secs(1))
    }

    /// Set `max_permits` per one minute window
    pub fn per_minute(self, max_permits: u32) -> Self {
        self.max_permits(max_permits).reset_period(Duration::from_secs(60))
    }

    /// Build the rule, validating every field
    pub fn build(self) -> Result<RateLimitRule> {
        let name = self.name.filter(|name| !name.is_empty()).ok_or(RateLimitError::InvalidConfig("rule name must be set"))?;
        let max_permits =
            self.max_permits.filter(|max| *max > 0).ok_or(RateLimitError::InvalidConfig("max permits must be greater than 0"))?;
        let reset_period = self
            .reset_period
            .filter(|period| !period.is_zero())
            .ok_or(RateLimitError::InvalidConfig("reset period must be greater than 0"))?;

        Ok(RateLimitRule { name, scope: self.scope.unwrap_or(RateLimitScope::Ip), max_permits, reset_period })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_from_rule() {
        let rule = RateLimitRule::new("ip_public", RateLimitScope::Ip, 30, Duration::from_secs(1));
        let quota = rule.quota(2);

        assert_eq!(quota.permits(), 2);
        assert_eq!(quota.rule().name().as_ref(), "ip_public");
        assert_eq!(quota.rule().max_permits(), 30);
    }

    #[test]
    #[should_panic(expected = "Max permits must be greater than 0")]
    fn test_new_rejects_zero_permits() {
        RateLimitRule::new("broken", RateLimitScope::Ip, 0, Duration::from_secs(1));
    }

    #[test]
    fn test_builder() {
        let rule = RateLimitRule::builder().name("uid_private").scope(RateLimitScope::ApiKey).per_minute(120).build().unwrap();

        assert_eq!(rule.scope(), RateLimitScope::ApiKey);
        assert_eq!(rule.max_permits(), 120);
        assert_eq!(rule.reset_period(), Duration::from_secs(60));
    }

    #[test]
    fn test_builder_defaults_to_ip_scope() {
        let rule = RateLimitRule::builder().name("ip").per_second(5).build().unwrap();
        assert_eq!(rule.scope(), RateLimitScope::Ip);
    }

    #[test]
    fn test_builder_validation() {
        assert!(matches!(RateLimitRule::builder().per_second(5).build(), Err(RateLimitError::InvalidConfig(_))));
        assert!(matches!(RateLimitRule::builder().name("").per_second(5).build(), Err(RateLimitError::InvalidConfig(_))));
        assert!(matches!(RateLimitRule::builder().name("x").per_second(0).build(), Err(RateLimitError::InvalidConfig(_))));
        assert!(matches!(
            RateLimitRule::builder().name("x").max_permits(1).reset_period(Duration::ZERO).build(),
            Err(RateLimitError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_scope_deserializes_snake_case() {
        #[derive(Deserialize)]
        struct Wrapper {
            scope: RateLimitScope,
        }

        let parsed: Wrapper = serde_json::from_str(r#"{"scope":"api_key"}"#).unwrap();
        assert_eq!(parsed.scope, RateLimitScope::ApiKey);
    }
}
