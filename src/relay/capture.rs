//! Ambient capture: wraps the privileged context's request function and
//! relays past-orders responses it sees go by.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::{HttpRequest, HttpResponse, HttpTransport, MessageBus, RelayMessage, TransportError};
use crate::config::RelayConfig;

/// Transport wrapper that posts `PAST_ORDERS_CAPTURED` for every settled
/// response to the past-orders endpoint.
///
/// The caller always gets the inner transport's result untouched; the
/// capture parses its own copy of the body on a separate task and drops
/// anything that is not JSON.
pub struct CapturingTransport {
    inner: Arc<dyn HttpTransport>,
    bus: MessageBus,
    config: Arc<RelayConfig>,
}

impl CapturingTransport {
    pub fn new(inner: Arc<dyn HttpTransport>, bus: MessageBus, config: Arc<RelayConfig>) -> Self {
        Self { inner, bus, config }
    }
}

#[async_trait]
impl HttpTransport for CapturingTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let capture = self.config.is_capture_target(&request.url);
        let url = capture.then(|| request.url.clone());

        let response = self.inner.send(request).await?;

        if let Some(url) = url {
            let copy = response.clone();
            let bus = self.bus.clone();
            tokio::spawn(async move {
                match copy.json() {
                    Ok(payload) => {
                        debug!(url = %url, "Captured past orders response");
                        bus.post(RelayMessage::PastOrdersCaptured { payload });
                    }
                    Err(e) => debug!(url = %url, error = %e, "Ignoring unparseable captured response"),
                }
            });
        }

        Ok(response)
    }
}
