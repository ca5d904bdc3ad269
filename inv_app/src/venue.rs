//! Runtime components built from a [`VenueConfigFile`].

use std::sync::Arc;
use std::time::Duration;

use inv_http::ActorError;
use inv_http::ActorFactory;
use inv_http::AuthHeaders;
use inv_http::EndpointContext;
use inv_http::Transport;
use inv_ratelimit::RateLimitCache;
use inv_ratelimit::RateLimitError;
use inv_ratelimit::RateLimitQuota;
use inv_ratelimit::RateLimitRule;
use inv_ratelimit::RateLimitScope;
use inv_ratelimit::RateLimitThrottle;
use inv_ratelimit::TracingInterceptor;
use inv_security::CredentialFactory;
use inv_ws::ChannelDescriptor;
use inv_ws::Decoder;
use inv_ws::DescriptorTable;
use inv_ws::EventMatch;
use thiserror::Error;

use crate::config_loader::EventMatchKind;
use crate::config_loader::VenueConfigFile;

#[derive(Error, Debug)]
pub enum VenueError {
    #[error("Invalid rate limit rule: {0}")]
    RateLimit(#[from] RateLimitError),

    #[error("Invalid endpoint: {0}")]
    Endpoint(#[from] ActorError),

    #[error("Unknown message shape `{shape}` for `{route}`")]
    UnknownShape { route: String, shape: String },

    #[error("Venue {venue} has no {section} configured")]
    Missing { venue: String, section: &'static str },
}

pub type Result<T> = std::result::Result<T, VenueError>;

impl VenueConfigFile {
    pub fn rate_limit_rules(&self) -> Result<Vec<RateLimitRule>> {
        self.rules
            .iter()
            .map(|rule| {
                RateLimitRule::builder()
                    .name(rule.name.as_str())
                    .scope(rule.scope)
                    .max_permits(rule.max_permits)
                    .reset_period(Duration::from_millis(rule.reset_period_ms))
                    .build()
                    .map_err(VenueError::from)
            })
            .collect()
    }

    pub fn rate_limit_cache(&self) -> Result<RateLimitCache> {
        Ok(RateLimitCache::builder().add_rules(self.rate_limit_rules()?).build()?)
    }

    /// One permit from every IP-scoped rule, the cost of a plain public call
    pub fn public_quotas(&self) -> Result<Vec<RateLimitQuota>> {
        self.quotas_for(RateLimitScope::Ip)
    }

    /// One permit from every connection-scoped rule, the cost of one subscribe frame
    pub fn subscription_quotas(&self) -> Result<Vec<RateLimitQuota>> {
        self.quotas_for(RateLimitScope::Connection)
    }

    fn quotas_for(&self, scope: RateLimitScope) -> Result<Vec<RateLimitQuota>> {
        Ok(self.rate_limit_rules()?.into_iter().filter(|rule| rule.scope() == scope).map(|rule| rule.quota(1)).collect())
    }

    pub fn quota_timeout(&self) -> Option<Duration> {
        self.quota_timeout_ms.map(Duration::from_millis)
    }

    pub fn credential_factory(&self) -> CredentialFactory {
        self.signing.map(|signing| CredentialFactory::new(signing.algorithm, signing.encoding)).unwrap_or_default()
    }

    /// Actors built from it share one throttle over this venue's rules
    pub fn actor_factory(&self, transport: Arc<dyn Transport>) -> Result<ActorFactory> {
        let throttle = RateLimitThrottle::new(Arc::new(self.rate_limit_cache()?)).with_interceptor(Arc::new(TracingInterceptor));
        let factory = ActorFactory::new(throttle, transport).with_credential_factory(self.credential_factory());

        Ok(match self.quota_timeout() {
            Some(timeout) => factory.with_quota_timeout(timeout),
            None => factory,
        })
    }

    pub fn rest_context(&self) -> Result<EndpointContext> {
        Ok(self.with_auth_headers(EndpointContext::rest(&self.rest_url)?))
    }

    pub fn websocket_context(&self) -> Result<EndpointContext> {
        Ok(self.with_auth_headers(EndpointContext::websocket(self.websocket_url()?)?))
    }

    pub fn websocket_url(&self) -> Result<&str> {
        self.websocket_url.as_deref().ok_or_else(|| self.missing("websocket_url"))
    }

    fn with_auth_headers(&self, context: EndpointContext) -> EndpointContext {
        match &self.auth_headers {
            Some(headers) => context.with_auth_headers(AuthHeaders {
                key: headers.key.clone(),
                signature: headers.signature.clone(),
                timestamp: headers.timestamp.clone(),
            }),
            None => context,
        }
    }

    /// Descriptor table for the push section, resolving shape names with `decoder_for_shape`
    pub fn descriptor_table<M>(&self, decoder_for_shape: impl Fn(&str) -> Option<Decoder<M>>) -> Result<DescriptorTable<M>> {
        let push = self.push.as_ref().ok_or_else(|| self.missing("push"))?;
        let resolve = |route: &str, shape: &str| {
            decoder_for_shape(shape).ok_or_else(|| VenueError::UnknownShape { route: route.to_string(), shape: shape.to_string() })
        };

        let mut builder = DescriptorTable::builder().event_field(push.event_field.as_str()).channel_field(push.channel_field.as_str());

        if let Some(prefix) = &push.confirmation_prefix {
            builder = builder.confirmation(prefix.as_str(), resolve("confirmation", &push.confirmation_shape)?);
        }

        for channel in &push.channels {
            let event = match channel.event_match {
                EventMatchKind::Exact => EventMatch::exact(channel.event.as_str()),
                EventMatchKind::Prefix => EventMatch::prefix(channel.event.as_str()),
            };
            let decode = resolve(&channel.name, &channel.shape)?;
            builder = builder.channel(ChannelDescriptor::new(channel.name.as_str(), event, channel.prefix.as_str(), decode));
        }

        Ok(builder.build())
    }

    fn missing(&self, section: &'static str) -> VenueError {
        VenueError::Missing { venue: self.venue.clone(), section }
    }
}
