//! Transport: the single network primitive every adapter goes through.
//!
//! [`Transport`] fetches a response body as text given a URL, method,
//! headers, and optional JSON body. [`HttpTransport`] is the production
//! implementation on a shared [`reqwest::Client`]; tests substitute
//! [`crate::test_utils::MockTransport`].

use crate::config::PipelineConfig;
use crate::error::DigestError;
use std::future::Future;
use std::time::Duration;

/// HTTP methods used by the adapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// One outbound request.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub url: String,
    pub method: Method,
    pub headers: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

impl FetchRequest {
    /// A GET request with no headers.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: Method::Get,
            headers: Vec::new(),
            body: None,
        }
    }

    /// A POST request carrying `body` as JSON.
    pub fn post_json(url: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            url: url.into(),
            method: Method::Post,
            headers: Vec::new(),
            body: Some(body),
        }
    }

    /// Adds a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Fetches raw response text.
///
/// Implementations must be `Send + Sync` so one transport can be shared by
/// every concurrent source task. Failures (connection errors, non-success
/// status, timeouts) are reported as [`DigestError::Network`].
pub trait Transport: Send + Sync {
    fn fetch(
        &self,
        request: &FetchRequest,
    ) -> impl Future<Output = Result<String, DigestError>> + Send;
}

/// Production transport backed by reqwest.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Builds a transport from the pipeline's timeout and User-Agent settings.
    ///
    /// # Errors
    ///
    /// Returns [`DigestError::Network`] if the client cannot be constructed.
    pub fn new(config: &PipelineConfig) -> Result<Self, DigestError> {
        Ok(Self {
            client: build_client(config)?,
        })
    }
}

/// Build a [`reqwest::Client`] configured for API and feed fetching.
///
/// The client has:
/// - Connect and total timeouts from config
/// - The configured User-Agent
/// - Up to 10 redirects followed
///
/// # Errors
///
/// Returns [`DigestError::Network`] if the client cannot be constructed.
pub fn build_client(config: &PipelineConfig) -> Result<reqwest::Client, DigestError> {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(config.connect_timeout_seconds))
        .timeout(Duration::from_secs(config.request_timeout_seconds))
        .user_agent(config.user_agent.clone())
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .map_err(|e| DigestError::Network(format!("failed to build HTTP client: {e}")))
}

impl Transport for HttpTransport {
    async fn fetch(&self, request: &FetchRequest) -> Result<String, DigestError> {
        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| DigestError::Network(format!("request failed: {e}")))?
            .error_for_status()
            .map_err(|e| DigestError::Network(format!("HTTP error: {e}")))?;

        let text = response
            .text()
            .await
            .map_err(|e| DigestError::Network(format!("response read failed: {e}")))?;

        tracing::trace!(bytes = text.len(), "response received");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_client_with_default_config() {
        let config = PipelineConfig::default();
        assert!(build_client(&config).is_ok());
    }

    #[test]
    fn http_transport_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<HttpTransport>();
    }

    #[test]
    fn request_builders() {
        let get = FetchRequest::get("https://example.com").header("Accept", "application/json");
        assert_eq!(get.method, Method::Get);
        assert_eq!(get.headers.len(), 1);
        assert!(get.body.is_none());

        let post = FetchRequest::post_json("https://example.com", serde_json::json!({"q": 1}));
        assert_eq!(post.method, Method::Post);
        assert!(post.body.is_some());
    }
}
