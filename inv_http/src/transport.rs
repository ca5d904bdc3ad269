use std::future::Future;
use std::pin::Pin;

use reqwest::header::CONTENT_TYPE;

use crate::client::HttpClient;
use crate::client::HttpClientConfig;
use crate::errors::TransportError;
use crate::request::HttpRequest;
use crate::request::RawResponse;

pub type TransportFuture<'a> = Pin<Box<dyn Future<Output = Result<RawResponse, TransportError>> + Send + 'a>>;

/// Carrier that moves a prepared request to the venue and back
///
/// Implementations must not retry; any failure is reported as-is.
pub trait Transport: Send + Sync {
    fn send(&self, request: HttpRequest) -> TransportFuture<'_>;
}

/// REST transport over a pooled reqwest client
pub struct ReqwestTransport {
    client: HttpClient,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, TransportError> {
        Self::with_config(HttpClientConfig::default())
    }

    pub fn with_config(config: HttpClientConfig) -> Result<Self, TransportError> {
        Ok(Self { client: HttpClient::with_config(config)? })
    }

    pub fn client(&self) -> &HttpClient {
        &self.client
    }
}

impl Transport for ReqwestTransport {
    fn send(&self, request: HttpRequest) -> TransportFuture<'_> {
        Box::pin(async move {
            let HttpRequest { method, url, headers, body } = request;

            if !matches!(url.scheme(), "http" | "https") {
                return Err(TransportError::UnsupportedScheme(url.scheme().to_string()));
            }

            let mut builder = self.client.request(method.into(), url);
            for (name, value) in &headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            if let Some(body) = body {
                builder = builder.header(CONTENT_TYPE, "application/json").body(body);
            }

            let response = builder.send().await?;
            let status = response.status().as_u16();
            // Use bytes + lossy decode so a bad charset never hides the status
            let bytes = response.bytes().await?;

            Ok(RawResponse { status, body: String::from_utf8_lossy(&bytes).into_owned() })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Method;

    #[tokio::test]
    async fn test_rejects_websocket_scheme() {
        let transport = ReqwestTransport::new().unwrap();
        let request = HttpRequest {
            method: Method::Get,
            url: url::Url::parse("wss://ws.bitstamp.net").unwrap(),
            headers: Vec::new(),
            body: None,
        };

        let result = transport.send(request).await;
        assert!(matches!(result, Err(TransportError::UnsupportedScheme(ref scheme)) if scheme == "wss"));
    }
}
