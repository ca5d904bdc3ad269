use std::collections::BTreeMap;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::time::Instant;

use crate::error::RateLimitError;
use crate::error::Result;
use crate::rule::RateLimitQuota;
use crate::rule::RateLimitRule;
use crate::scope::ScopeKeys;
use crate::time;
use crate::window::WindowCounter;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct CounterKey {
    rule: Arc<str>,
    scope_key: Arc<str>,
}

/// Permits granted to one call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grant {
    pub rule: Arc<str>,
    pub scope_key: Arc<str>,
    pub permits: u32,
}

/// Proof that every quota of a call was granted in one step
#[derive(Debug, Clone)]
pub struct Permit {
    grants: Vec<Grant>,
    granted_at: Instant,
}

impl Permit {
    pub fn grants(&self) -> &[Grant] {
        &self.grants
    }

    pub fn granted_at(&self) -> Instant {
        self.granted_at
    }

    /// Total permits taken from a rule across all its scope keys
    pub fn permits_for(&self, rule: &str) -> u32 {
        self.grants.iter().filter(|grant| grant.rule.as_ref() == rule).map(|grant| grant.permits).sum()
    }
}

/// Process wide rate limit counters
///
/// Holds the immutable rule table and one fixed window counter per
/// (rule, scope key). Counters are created lazily and each sits behind its own
/// lock, so callers charging unrelated rules never contend. A cache can be
/// shared by every actor that talks to the same upstream.
pub struct RateLimitCache {
    rules: HashMap<Arc<str>, RateLimitRule>,
    counters: DashMap<CounterKey, Arc<Mutex<WindowCounter>>>,
}

impl RateLimitCache {
    /// Create a builder for registering rules
    pub fn builder() -> RateLimitCacheBuilder {
        RateLimitCacheBuilder::new()
    }

    /// Registered rule by name
    pub fn rule(&self, name: &str) -> Option<&RateLimitRule> {
        self.rules.get(name)
    }

    /// All registered rules
    pub fn rules(&self) -> impl Iterator<Item = &RateLimitRule> {
        self.rules.values()
    }

    /// Permits left in the current window of a counter
    ///
    /// Returns `None` for unknown rules. Counters that were never charged report the
    /// rule's full allowance.
    pub fn available(&self, rule: &str, scope_key: &str) -> Option<u32> {
        let registered = self.rules.get(rule)?;
        let key = CounterKey { rule: Arc::clone(registered.name()), scope_key: Arc::from(scope_key) };

        let counter = match self.counters.get(&key) {
            Some(counter) => Arc::clone(counter.value()),
            None => return Some(registered.max_permits()),
        };

        let mut counter = counter.lock();
        counter.roll(time::now());
        Some(counter.remaining())
    }

    /// Number of live (rule, scope key) counters
    pub fn counter_count(&self) -> usize {
        self.counters.len()
    }

    /// Drop counters that are back at their full allowance
    ///
    /// Account and connection scoped rules create one counter per key, so a long
    /// running process should call this periodically. A counter currently held by
    /// an in-flight acquisition is kept. Returns the number of counters removed.
    pub fn purge_idle(&self) -> usize {
        let now = time::now();
        let before = self.counters.len();

        // The shard lock is held during retain, so a count of one means no caller
        // can be between looking the counter up and locking it
        self.counters.retain(|_, counter| Arc::strong_count(counter) > 1 || !counter.lock().is_idle(now));

        let removed = before.saturating_sub(self.counters.len());
        if removed > 0 {
            tracing::debug!("Purged {removed} idle rate limit counters");
        }
        removed
    }

    /// Take every quota in one step or none of them
    ///
    /// Quotas for the same counter are summed first. Counters are then locked in
    /// key order, so concurrent callers asking for overlapping rules cannot
    /// deadlock. On denial nothing is consumed and the error carries the longest
    /// wait among the exhausted counters.
    pub fn try_acquire(&self, quotas: &[RateLimitQuota], scope: &ScopeKeys) -> Result<Permit> {
        let demands = self.resolve(quotas, scope)?;
        let now = time::now();

        let counters: Vec<(CounterKey, u32, Arc<Mutex<WindowCounter>>)> = demands
            .into_iter()
            .map(|(key, (permits, rule))| {
                let counter = self
                    .counters
                    .entry(key.clone())
                    .or_insert_with(|| Arc::new(Mutex::new(WindowCounter::new(rule.max_permits(), rule.reset_period(), now))))
                    .clone();
                (key, permits, counter)
            })
            .collect();

        let mut guards: Vec<_> = counters.iter().map(|(_, _, counter)| counter.lock()).collect();

        let mut exhausted: Option<(Arc<str>, Duration)> = None;
        for ((key, permits, _), guard) in counters.iter().zip(guards.iter_mut()) {
            guard.roll(now);
            if guard.remaining() < *permits {
                let wait = guard.time_until_reset(now);
                if exhausted.as_ref().is_none_or(|(_, longest)| wait > *longest) {
                    exhausted = Some((Arc::clone(&key.rule), wait));
                }
            }
        }

        if let Some((rule, retry_after)) = exhausted {
            return Err(RateLimitError::QuotaExceeded { rule, retry_after });
        }

        let mut grants = Vec::with_capacity(counters.len());
        for ((key, permits, _), guard) in counters.iter().zip(guards.iter_mut()) {
            guard.take(*permits);
            grants.push(Grant { rule: Arc::clone(&key.rule), scope_key: Arc::clone(&key.scope_key), permits: *permits });
        }

        Ok(Permit { grants, granted_at: now })
    }

    /// Validate quotas against the rule table and merge them per counter
    fn resolve(&self, quotas: &[RateLimitQuota], scope: &ScopeKeys) -> Result<BTreeMap<CounterKey, (u32, &RateLimitRule)>> {
        let mut demands: BTreeMap<CounterKey, (u32, &RateLimitRule)> = BTreeMap::new();

        for quota in quotas {
            if quota.permits() == 0 {
                continue;
            }

            let name = quota.rule().name();
            let rule = self.rules.get(name).ok_or_else(|| RateLimitError::UnknownRule(Arc::clone(name)))?;
            let scope_key = scope.key_for(rule.scope()).ok_or_else(|| RateLimitError::MissingScopeKey(Arc::clone(name)))?;

            let entry = demands.entry(CounterKey { rule: Arc::clone(rule.name()), scope_key }).or_insert((0, rule));
            entry.0 = entry.0.saturating_add(quota.permits());
        }

        for (key, (permits, rule)) in &demands {
            if *permits > rule.max_permits() {
                return Err(RateLimitError::InvalidQuota {
                    rule: Arc::clone(&key.rule),
                    requested: *permits,
                    max_permits: rule.max_permits(),
                });
            }
        }

        Ok(demands)
    }
}

/// Builder for a rate limit cache
#[derive(Default)]
pub struct RateLimitCacheBuilder {
    rules: Vec<RateLimitRule>,
}

impl RateLimitCacheBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rule
    ///
    /// Rule names must be unique.
    pub fn add_rule(mut self, rule: RateLimitRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Register several rules
    pub fn add_rules(mut self, rules: impl IntoIterator<Item = RateLimitRule>) -> Self {
        self.rules.extend(rules);
        self
    }

    /// Build the cache
    pub fn build(self) -> Result<RateLimitCache> {
        let mut rules = HashMap::with_capacity(self.rules.len());
        for rule in self.rules {
            if rules.insert(Arc::clone(rule.name()), rule).is_some() {
                return Err(RateLimitError::InvalidConfig("duplicate rule name"));
            }
        }

        Ok(RateLimitCache { rules, counters: DashMap::new() })
    }
}
