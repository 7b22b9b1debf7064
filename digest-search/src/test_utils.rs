//! Deterministic in-memory transport for tests.
//!
//! Compiled for this crate's own tests and, through the `test-utils`
//! feature, for downstream test suites.
//!
//! Routes are matched by URL substring in registration order, so a test
//! can stub `"/search.json"` or `"api.tavily.com"` without reproducing the
//! full query string.

use crate::error::DigestError;
use crate::http::{FetchRequest, Transport};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone)]
enum Reply {
    Body(String),
    Fail(String),
    Delayed(Duration, String),
}

#[derive(Debug, Clone)]
struct Route {
    pattern: String,
    reply: Reply,
}

/// A [`Transport`] that answers from canned responses.
#[derive(Debug, Default)]
pub struct MockTransport {
    routes: Vec<Route>,
    requests: Mutex<Vec<FetchRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Responds with `body` to any URL containing `pattern`.
    #[must_use]
    pub fn with_body(mut self, pattern: impl Into<String>, body: impl Into<String>) -> Self {
        self.routes.push(Route {
            pattern: pattern.into(),
            reply: Reply::Body(body.into()),
        });
        self
    }

    /// Fails with a network error for any URL containing `pattern`.
    #[must_use]
    pub fn with_failure(mut self, pattern: impl Into<String>, message: impl Into<String>) -> Self {
        self.routes.push(Route {
            pattern: pattern.into(),
            reply: Reply::Fail(message.into()),
        });
        self
    }

    /// Responds with `body` after sleeping for `delay`.
    #[must_use]
    pub fn with_delay(
        mut self,
        pattern: impl Into<String>,
        delay: Duration,
        body: impl Into<String>,
    ) -> Self {
        self.routes.push(Route {
            pattern: pattern.into(),
            reply: Reply::Delayed(delay, body.into()),
        });
        self
    }

    /// Every request seen so far, in arrival order.
    pub fn requests(&self) -> Vec<FetchRequest> {
        self.requests
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }

    fn route_for(&self, url: &str) -> Option<&Reply> {
        self.routes
            .iter()
            .find(|route| url.contains(&route.pattern))
            .map(|route| &route.reply)
    }
}

impl Transport for MockTransport {
    async fn fetch(&self, request: &FetchRequest) -> Result<String, DigestError> {
        if let Ok(mut log) = self.requests.lock() {
            log.push(request.clone());
        }

        match self.route_for(&request.url) {
            Some(Reply::Body(body)) => Ok(body.clone()),
            Some(Reply::Fail(message)) => Err(DigestError::Network(message.clone())),
            Some(Reply::Delayed(delay, body)) => {
                tokio::time::sleep(*delay).await;
                Ok(body.clone())
            }
            None => Err(DigestError::Network(format!(
                "no route for {}",
                request.url
            ))),
        }
    }
}
