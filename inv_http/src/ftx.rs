//! FTX bindings: endpoints, signing scheme and rate limits wired into the generic core

use std::sync::Arc;

use inv_ratelimit::exchanges::ftx as limits;
use inv_ratelimit::RateLimitQuota;
use inv_ratelimit::RateLimitQuotaInterceptor;
use inv_ratelimit::RateLimitThrottle;
use inv_security::ApiKey;
use inv_security::AuthError;
use inv_security::CredentialFactory;
use inv_security::SecretKeyAlgorithm;
use inv_security::SignatureEncoding;
use serde_json::json;
use serde_json::Value;

use crate::actor::Actor;
use crate::context::ApiContext;
use crate::context::AuthHeaders;
use crate::context::EndpointContext;
use crate::errors::ActorError;
use crate::errors::Result;
use crate::factory::ActorFactory;
use crate::request::RequestDescriptor;
use crate::transport::Transport;

pub const MAIN_NET_REST_URL: &str = "https://ftx.com";
pub const MAIN_NET_WEBSOCKET_URL: &str = "wss://ftx.com/ws";

pub fn auth_headers() -> AuthHeaders {
    AuthHeaders { key: "FTX-KEY".to_string(), signature: "FTX-SIGN".to_string(), timestamp: "FTX-TS".to_string() }
}

pub fn credential_factory() -> CredentialFactory {
    CredentialFactory::new(SecretKeyAlgorithm::HmacSha256, SignatureEncoding::HexLower)
}

pub fn main_net_context() -> Result<ApiContext> {
    Ok(ApiContext::new(
        EndpointContext::rest(MAIN_NET_REST_URL)?.with_auth_headers(auth_headers()),
        Some(EndpointContext::websocket(MAIN_NET_WEBSOCKET_URL)?.with_auth_headers(auth_headers())),
    ))
}

/// Entry point selecting public and private FTX APIs
#[derive(Clone)]
pub struct FtxApi {
    context: ApiContext,
    actor_factory: ActorFactory,
}

impl FtxApi {
    pub fn main_net(transport: Arc<dyn Transport>) -> Result<Self> {
        Self::from_context(main_net_context()?, transport, None)
    }

    pub fn from_context(
        context: ApiContext,
        transport: Arc<dyn Transport>,
        interceptor: Option<Arc<dyn RateLimitQuotaInterceptor>>,
    ) -> Result<Self> {
        let mut throttle = RateLimitThrottle::new(Arc::new(limits::cache()?));
        if let Some(interceptor) = interceptor {
            throttle = throttle.with_interceptor(interceptor);
        }

        let actor_factory = ActorFactory::new(throttle, transport).with_credential_factory(credential_factory());
        Ok(Self { context, actor_factory })
    }

    pub fn market(&self) -> MarketRestApi {
        MarketRestApi { actor: self.actor_factory.create(None, self.context.rest().clone()) }
    }

    pub fn user(&self, api_key: ApiKey) -> UserRestApi {
        UserRestApi { actor: self.actor_factory.create(Some(api_key), self.context.rest().clone()) }
    }

    /// Push APIs; actors share the REST throttle
    pub fn ws(&self) -> Result<FtxWebSocketApi<'_>> {
        let context = self.context.websocket().ok_or_else(|| ActorError::InvalidRequest("no WebSocket endpoint configured".to_string()))?;
        Ok(FtxWebSocketApi { context, actor_factory: &self.actor_factory })
    }
}

/// Selects public and private push APIs on the WebSocket endpoint
pub struct FtxWebSocketApi<'a> {
    context: &'a EndpointContext,
    actor_factory: &'a ActorFactory,
}

impl FtxWebSocketApi<'_> {
    pub fn market(&self) -> MarketWebSocketApi {
        MarketWebSocketApi { actor: self.actor_factory.create(None, self.context.clone()) }
    }

    pub fn user(&self, api_key: ApiKey) -> UserWebSocketApi {
        UserWebSocketApi { actor: self.actor_factory.create(Some(api_key), self.context.clone()) }
    }
}

/// Public channels: `trades`, `ticker`, `orderbook`
#[derive(Clone)]
pub struct MarketWebSocketApi {
    actor: Actor,
}

impl MarketWebSocketApi {
    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    pub fn subscribe_quotas(&self) -> Vec<RateLimitQuota> {
        limits::one_ws_subscribe()
    }

    pub fn subscribe_frame(&self, channel: &str, market: &str) -> Value {
        json!({"op": "subscribe", "channel": channel, "market": market})
    }
}

/// Private channels: `fills`, `orders`; require a login frame first
#[derive(Clone)]
pub struct UserWebSocketApi {
    actor: Actor,
}

impl UserWebSocketApi {
    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    pub fn subscribe_quotas(&self) -> Vec<RateLimitQuota> {
        limits::one_ws_subscribe()
    }

    /// Login frame signed over `{time}websocket_login`
    pub fn login_frame(&self, timestamp_ms: i64) -> Result<Value> {
        let credential = self.actor.credential().ok_or(AuthError::MissingCredential)?;
        let signature = credential.sign(format!("{timestamp_ms}websocket_login").as_bytes())?;

        Ok(json!({
            "op": "login",
            "args": {"key": credential.api_key_id().to_string(), "sign": signature, "time": timestamp_ms},
        }))
    }

    pub fn subscribe_frame(&self, channel: &str) -> Value {
        json!({"op": "subscribe", "channel": channel})
    }
}

/// Public market data endpoints
#[derive(Clone)]
pub struct MarketRestApi {
    actor: Actor,
}

impl MarketRestApi {
    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    pub async fn markets(&self) -> Result<serde_json::Value> {
        self.actor.execute_json(&get_markets()).await
    }

    pub async fn orderbook(&self, market: &str, depth: u32) -> Result<serde_json::Value> {
        self.actor.execute_json(&get_orderbook(market, depth)).await
    }
}

/// Account endpoints, always signed
#[derive(Clone)]
pub struct UserRestApi {
    actor: Actor,
}

impl UserRestApi {
    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    pub async fn account(&self) -> Result<serde_json::Value> {
        self.actor.execute_json(&get_account()).await
    }
}

pub fn get_markets() -> RequestDescriptor {
    RequestDescriptor::get("/api/markets").quotas(limits::one_rest_public_request())
}

pub fn get_orderbook(market: &str, depth: u32) -> RequestDescriptor {
    RequestDescriptor::get(format!("/api/markets/{market}/orderbook")).param("depth", depth).quotas(limits::one_rest_public_request())
}

pub fn get_account() -> RequestDescriptor {
    RequestDescriptor::get("/api/account").signed().quotas(limits::one_rest_public_request())
}
