use std::time::Duration;

use inv_ratelimit::RateLimitQuota;
use serde::Serialize;
use url::Url;

use crate::errors::ActorError;
use crate::errors::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// One logical venue call: what to send and what it costs
///
/// Built once per endpoint by the venue bindings. Carries the rate limit
/// quotas the call consumes and whether it must be signed.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    method: Method,
    path: String,
    params: Vec<(String, String)>,
    body: Option<String>,
    quotas: Vec<RateLimitQuota>,
    requires_auth: bool,
    quota_timeout: Option<Duration>,
}

impl RequestDescriptor {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: Vec::new(),
            body: None,
            quotas: Vec::new(),
            requires_auth: false,
            quota_timeout: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    /// Append a query parameter; order is preserved in the query and the signature
    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serialize `payload` as the JSON request body
    pub fn json_body<T: Serialize>(self, payload: &T) -> Result<Self> {
        let body = serde_json::to_string(payload).map_err(|err| ActorError::InvalidRequest(format!("unserializable body: {err}")))?;
        Ok(self.body(body))
    }

    pub fn quotas(mut self, quotas: impl IntoIterator<Item = RateLimitQuota>) -> Self {
        self.quotas.extend(quotas);
        self
    }

    /// Mark the call as private; executing it on a public actor fails
    pub fn signed(mut self) -> Self {
        self.requires_auth = true;
        self
    }

    /// Bound the wait for rate limit permits, overriding the actor default
    pub fn quota_timeout(mut self, timeout: Duration) -> Self {
        self.quota_timeout = Some(timeout);
        self
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn required_quotas(&self) -> &[RateLimitQuota] {
        &self.quotas
    }

    pub fn requires_auth(&self) -> bool {
        self.requires_auth
    }

    pub fn request_body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.quota_timeout
    }

    /// Form-urlencoded query, `None` when there are no parameters
    pub fn query_string(&self) -> Option<String> {
        if self.params.is_empty() {
            return None;
        }

        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in &self.params {
            serializer.append_pair(key, value);
        }
        Some(serializer.finish())
    }

    pub fn path_and_query(&self) -> String {
        match self.query_string() {
            Some(query) => format!("{}?{}", self.path, query),
            None => self.path.clone(),
        }
    }

    /// Bytes covered by the signature: `{timestamp}{METHOD}{path}[?{query}]{body}`
    ///
    /// Path and query are taken from `url`, the resolved form actually sent, so
    /// percent-encoding applied during resolution is signed as well.
    pub fn canonical_payload(&self, timestamp_ms: i64, url: &Url) -> Vec<u8> {
        let mut payload = format!("{}{}{}", timestamp_ms, self.method.as_str(), url.path()).into_bytes();
        if let Some(query) = url.query() {
            payload.push(b'?');
            payload.extend_from_slice(query.as_bytes());
        }
        if let Some(body) = &self.body {
            payload.extend_from_slice(body.as_bytes());
        }
        payload
    }
}

/// Fully prepared request handed to a transport
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    /// First header with the given name, ignoring ASCII case
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter().find(|(key, _)| key.eq_ignore_ascii_case(name)).map(|(_, value)| value.as_str())
    }
}

/// Status and body as returned by the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
