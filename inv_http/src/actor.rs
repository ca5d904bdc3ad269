use std::sync::Arc;
use std::time::Duration;

use inv_ratelimit::Permit;
use inv_ratelimit::RateLimitQuota;
use inv_ratelimit::RateLimitThrottle;
use inv_ratelimit::ScopeKeys;
use inv_security::AuthError;
use inv_security::Credential;
use serde::de::DeserializeOwned;
use time::OffsetDateTime;
use url::Url;

use crate::context::EndpointContext;
use crate::errors::ActorError;
use crate::errors::Result;
use crate::errors::TransportError;
use crate::request::HttpRequest;
use crate::request::RawResponse;
use crate::request::RequestDescriptor;
use crate::transport::Transport;

/// Execution unit bound to one credential (or none) and one endpoint
///
/// Every call goes through the same fixed sequence: take the request's quotas
/// from the shared throttle, sign when a credential is bound, dispatch, then map
/// the outcome to a typed error. Nothing is retried. Clones share all state and
/// may be used from many tasks at once.
#[derive(Clone)]
pub struct Actor {
    credential: Option<Arc<Credential>>,
    context: Arc<EndpointContext>,
    throttle: RateLimitThrottle,
    transport: Arc<dyn Transport>,
    scope: ScopeKeys,
    quota_timeout: Option<Duration>,
}

impl Actor {
    pub(crate) fn new(
        credential: Option<Credential>,
        context: EndpointContext,
        throttle: RateLimitThrottle,
        transport: Arc<dyn Transport>,
        quota_timeout: Option<Duration>,
    ) -> Self {
        let scope = match &credential {
            Some(credential) => ScopeKeys::none().with_api_key(Arc::clone(credential.api_key_id())),
            None => ScopeKeys::none(),
        };

        Self { credential: credential.map(Arc::new), context: Arc::new(context), throttle, transport, scope, quota_timeout }
    }

    /// Charge connection-scoped rules to `connection_id`
    pub fn with_connection_id(mut self, connection_id: impl Into<Arc<str>>) -> Self {
        self.scope = self.scope.with_connection(connection_id);
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.credential.is_some()
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_deref()
    }

    pub fn context(&self) -> &EndpointContext {
        &self.context
    }

    pub fn scope(&self) -> &ScopeKeys {
        &self.scope
    }

    /// Run one request and return the raw successful response
    pub async fn execute(&self, request: &RequestDescriptor) -> Result<RawResponse> {
        if request.requires_auth() && self.credential.is_none() {
            return Err(AuthError::MissingCredential.into());
        }

        // A path that cannot be resolved must not cost permits
        let url = self.context.url_for(&request.path_and_query())?;

        let timeout = request.timeout().or(self.quota_timeout);
        self.throttle.acquire(request.required_quotas(), &self.scope, timeout).await?;

        let http_request = self.prepare(request, url, now_millis())?;
        tracing::debug!(method = request.method().as_str(), url = %http_request.url, signed = self.is_authenticated(), "Dispatching request");

        let response = self.transport.send(http_request).await?;
        check_status(response)
    }

    /// Run one request and decode the response body as JSON
    pub async fn execute_json<T: DeserializeOwned>(&self, request: &RequestDescriptor) -> Result<T> {
        let response = self.execute(request).await?;
        Ok(serde_json::from_str(&response.body)?)
    }

    /// Charge quotas for a frame sent outside the transport, such as a push subscription
    ///
    /// Never waits: exhausted quotas fail at once with `QuotaExceeded`.
    pub fn try_charge(&self, quotas: &[RateLimitQuota]) -> Result<Permit> {
        Ok(self.throttle.try_acquire(quotas, &self.scope)?)
    }

    /// Attach auth headers to a resolved request when a credential is bound
    pub(crate) fn prepare(&self, request: &RequestDescriptor, url: Url, timestamp_ms: i64) -> Result<HttpRequest> {
        let mut headers = Vec::new();

        if let Some(credential) = &self.credential {
            let names = self.context.auth_headers();
            let signature = credential.sign(&request.canonical_payload(timestamp_ms, &url))?;

            headers.push((names.key.clone(), credential.api_key_id().to_string()));
            headers.push((names.timestamp.clone(), timestamp_ms.to_string()));
            headers.push((names.signature.clone(), signature));
        }

        Ok(HttpRequest { method: request.method(), url, headers, body: request.request_body().map(str::to_string) })
    }
}

fn check_status(response: RawResponse) -> Result<RawResponse> {
    if response.is_success() {
        return Ok(response);
    }

    match response.status {
        401 | 403 => {
            tracing::warn!("Venue rejected credential: HTTP {}", response.status);
            Err(AuthError::Rejected { status: response.status, message: response.body }.into())
        }
        status => Err(ActorError::Transport(TransportError::Status { status, body: response.body })),
    }
}

fn now_millis() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

#[cfg(test)]
mod tests {
    use inv_ratelimit::RateLimitCache;
    use inv_security::ApiKey;
    use inv_security::CredentialFactory;

    use super::*;
    use crate::context::AuthHeaders;
    use crate::transport::TransportFuture;

    struct NoopTransport;

    impl Transport for NoopTransport {
        fn send(&self, _request: HttpRequest) -> TransportFuture<'_> {
            Box::pin(async { Ok(RawResponse { status: 200, body: String::new() }) })
        }
    }

    fn actor(credential: Option<Credential>) -> Actor {
        let throttle = RateLimitThrottle::new(Arc::new(RateLimitCache::builder().build().unwrap()));
        let context = EndpointContext::rest("https://ftx.com")
            .unwrap()
            .with_auth_headers(AuthHeaders { key: "FTX-KEY".into(), signature: "FTX-SIGN".into(), timestamp: "FTX-TS".into() });
        Actor::new(credential, context, throttle, Arc::new(NoopTransport), None)
    }

    fn prepare(actor: &Actor, request: &RequestDescriptor, timestamp_ms: i64) -> HttpRequest {
        let url = actor.context().url_for(&request.path_and_query()).unwrap();
        actor.prepare(request, url, timestamp_ms).unwrap()
    }

    #[test]
    fn test_prepare_signed() {
        let credential = CredentialFactory::default()
            .create(ApiKey::new("LR0RQT6bKjrUNh38eCw9jYC89VDAbRkCogAc_XAm", "T4lPid48QtjNxjLUFOcUZghD7CUJ7sTVsfuvQZF2"));
        let request = prepare(&actor(Some(credential)), &RequestDescriptor::get("/api/markets"), 1588591511721);

        assert_eq!(request.url.as_str(), "https://ftx.com/api/markets");
        assert_eq!(request.header("FTX-KEY"), Some("LR0RQT6bKjrUNh38eCw9jYC89VDAbRkCogAc_XAm"));
        assert_eq!(request.header("FTX-TS"), Some("1588591511721"));
        assert_eq!(request.header("FTX-SIGN"), Some("dbc62ec300b2624c580611858d94f2332ac636bb86eccfa1167a7777c496ee6f"));
    }

    #[test]
    fn test_prepare_signs_path_as_sent() {
        let credential = CredentialFactory::default().create(ApiKey::new("key", "secret"));
        let actor = actor(Some(credential));
        let request = prepare(&actor, &RequestDescriptor::get("/api/markets/BTC PERP/orderbook"), 42);

        assert_eq!(request.url.path(), "/api/markets/BTC%20PERP/orderbook");
        let expected = actor.credential().unwrap().sign(b"42GET/api/markets/BTC%20PERP/orderbook").unwrap();
        assert_eq!(request.header("FTX-SIGN"), Some(expected.as_str()));
    }

    #[test]
    fn test_prepare_public() {
        let request = prepare(&actor(None), &RequestDescriptor::get("/api/markets").param("depth", 5), 1);

        assert_eq!(request.url.as_str(), "https://ftx.com/api/markets?depth=5");
        assert!(request.headers.is_empty());
    }

    #[test]
    fn test_scope_follows_credential() {
        let credential = CredentialFactory::default().create(ApiKey::new("acct-9", "secret"));
        assert_eq!(actor(Some(credential)).scope().api_key().map(|id| id.as_ref()), Some("acct-9"));
        assert!(actor(None).scope().api_key().is_none());
        assert_eq!(actor(None).with_connection_id("conn-1").scope().connection().map(|id| id.as_ref()), Some("conn-1"));
    }

    #[test]
    fn test_try_charge_uses_connection_scope() {
        let rule = inv_ratelimit::RateLimitRule::new("conn", inv_ratelimit::RateLimitScope::Connection, 1, Duration::from_secs(60));
        let throttle = RateLimitThrottle::new(Arc::new(RateLimitCache::builder().add_rule(rule.clone()).build().unwrap()));
        let context = EndpointContext::websocket("wss://ftx.com/ws").unwrap();
        let actor = Actor::new(None, context, throttle.clone(), Arc::new(NoopTransport), None);

        assert!(matches!(actor.try_charge(&[rule.quota(1)]), Err(ActorError::Quota(_))));

        let first = actor.clone().with_connection_id("push-1");
        assert!(first.try_charge(&[rule.quota(1)]).is_ok());
        assert!(first.try_charge(&[rule.quota(1)]).unwrap_err().is_quota_exceeded());
        assert!(actor.with_connection_id("push-2").try_charge(&[rule.quota(1)]).is_ok());
        assert_eq!(throttle.cache().available("conn", "push-1"), Some(0));
    }

    #[test]
    fn test_check_status() {
        assert!(check_status(RawResponse { status: 200, body: "{}".into() }).is_ok());
        assert!(matches!(
            check_status(RawResponse { status: 401, body: "Not logged in".into() }),
            Err(ActorError::Auth(AuthError::Rejected { status: 401, .. }))
        ));
        assert!(matches!(
            check_status(RawResponse { status: 502, body: String::new() }),
            Err(ActorError::Transport(TransportError::Status { status: 502, .. }))
        ));
    }

    #[test]
    fn test_now_millis_is_plausible() {
        // After 2020-01-01
        assert!(now_millis() > 1_577_836_800_000);
    }
}
