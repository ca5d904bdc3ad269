use std::sync::Arc;
use std::time::Duration;

use inv_ratelimit::RateLimitThrottle;
use inv_security::ApiKey;
use inv_security::CredentialFactory;

use crate::actor::Actor;
use crate::context::EndpointContext;
use crate::transport::Transport;

/// Builds actors wired to one shared throttle and transport
///
/// Creating an actor has no side effects. Actors created from the same factory
/// charge the same rate limit counters.
#[derive(Clone)]
pub struct ActorFactory {
    credential_factory: CredentialFactory,
    throttle: RateLimitThrottle,
    transport: Arc<dyn Transport>,
    quota_timeout: Option<Duration>,
}

impl ActorFactory {
    pub fn new(throttle: RateLimitThrottle, transport: Arc<dyn Transport>) -> Self {
        Self { credential_factory: CredentialFactory::default(), throttle, transport, quota_timeout: None }
    }

    /// Signing scheme applied to every API key passed to [`ActorFactory::create`]
    pub fn with_credential_factory(mut self, credential_factory: CredentialFactory) -> Self {
        self.credential_factory = credential_factory;
        self
    }

    /// Default bound on how long actors wait for rate limit permits
    pub fn with_quota_timeout(mut self, timeout: Duration) -> Self {
        self.quota_timeout = Some(timeout);
        self
    }

    pub fn throttle(&self) -> &RateLimitThrottle {
        &self.throttle
    }

    /// Actor for `context`, signed when an API key is given and public otherwise
    pub fn create(&self, api_key: Option<ApiKey>, context: EndpointContext) -> Actor {
        let credential = api_key.map(|api_key| self.credential_factory.create(api_key));
        Actor::new(credential, context, self.throttle.clone(), Arc::clone(&self.transport), self.quota_timeout)
    }
}
