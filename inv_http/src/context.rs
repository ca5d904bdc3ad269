use url::Url;

use crate::errors::ActorError;
use crate::errors::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Rest,
    WebSocket,
}

/// Header names a venue reads its authentication fields from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthHeaders {
    pub key: String,
    pub signature: String,
    pub timestamp: String,
}

impl Default for AuthHeaders {
    fn default() -> Self {
        Self { key: "X-API-KEY".to_string(), signature: "X-API-SIGNATURE".to_string(), timestamp: "X-API-TIMESTAMP".to_string() }
    }
}

/// Where an actor sends its requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointContext {
    base_url: Url,
    protocol: Protocol,
    auth_headers: AuthHeaders,
}

impl EndpointContext {
    pub fn new(base_url: &str, protocol: Protocol) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|err| ActorError::InvalidRequest(format!("bad base URL {base_url}: {err}")))?;
        Ok(Self { base_url, protocol, auth_headers: AuthHeaders::default() })
    }

    pub fn rest(base_url: &str) -> Result<Self> {
        Self::new(base_url, Protocol::Rest)
    }

    pub fn websocket(base_url: &str) -> Result<Self> {
        Self::new(base_url, Protocol::WebSocket)
    }

    pub fn with_auth_headers(mut self, auth_headers: AuthHeaders) -> Self {
        self.auth_headers = auth_headers;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn auth_headers(&self) -> &AuthHeaders {
        &self.auth_headers
    }

    /// Absolute URL for a path (with optional query) relative to the base URL
    pub fn url_for(&self, path_and_query: &str) -> Result<Url> {
        self.base_url.join(path_and_query).map_err(|err| ActorError::InvalidRequest(format!("bad path {path_and_query}: {err}")))
    }
}

/// REST and push endpoints of one venue deployment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiContext {
    rest: EndpointContext,
    websocket: Option<EndpointContext>,
}

impl ApiContext {
    pub fn new(rest: EndpointContext, websocket: Option<EndpointContext>) -> Self {
        Self { rest, websocket }
    }

    pub fn rest(&self) -> &EndpointContext {
        &self.rest
    }

    pub fn websocket(&self) -> Option<&EndpointContext> {
        self.websocket.as_ref()
    }
}
