//! Test utilities and mock implementations.
//!
//! An in-memory [`HttpTransport`] so the relay can be exercised without a network.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::relay::{HttpRequest, HttpResponse, HttpTransport, TransportError};

#[derive(Debug, Clone)]
enum Reply {
    Respond(HttpResponse),
    Fail(String),
    Hang,
}

/// Mock transport returning one scripted reply for every request and
/// recording what was sent.
#[derive(Debug)]
pub struct MockTransport {
    reply: Reply,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    fn new(reply: Reply) -> Self {
        Self {
            reply,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answer every request with `status` and `body`.
    pub fn responding(status: u16, body: impl Into<String>) -> Self {
        Self::new(Reply::Respond(HttpResponse::new(status, body.into())))
    }

    /// Answer every request with a 200 carrying `payload` as JSON.
    pub fn json(payload: &serde_json::Value) -> Self {
        Self::responding(200, payload.to_string())
    }

    /// Fail every request with a network error.
    pub fn failing(message: impl Into<String>) -> Self {
        Self::new(Reply::Fail(message.into()))
    }

    /// Never settle.
    pub fn hanging() -> Self {
        Self::new(Reply::Hang)
    }

    /// Requests received so far, in order.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }

        match &self.reply {
            Reply::Respond(response) => Ok(response.clone()),
            Reply::Fail(message) => Err(TransportError::Network(message.clone())),
            Reply::Hang => std::future::pending().await,
        }
    }
}
