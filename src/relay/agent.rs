//! Privileged-context agent: answers `FETCH_PAST_ORDERS` by issuing the
//! past-orders request itself.

use std::sync::Arc;

use serde_json::{json, Value};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{
    error_payload, CapturingTransport, HttpRequest, HttpTransport, MessageBus, RelayMessage,
    SessionIds, TransportError,
};
use crate::config::RelayConfig;

const ACCEPT: &str = "application/json, text/plain, */*";

/// Runs in the privileged context. All outbound calls go through a
/// [`CapturingTransport`], so the agent's own fetch is captured as well.
#[derive(Clone)]
pub struct InpageAgent {
    transport: Arc<dyn HttpTransport>,
    bus: MessageBus,
    config: Arc<RelayConfig>,
}

impl InpageAgent {
    /// Wrap `network` with ambient capture and attach to `bus`.
    pub fn new(network: Arc<dyn HttpTransport>, bus: MessageBus, config: RelayConfig) -> Self {
        let config = Arc::new(config);
        let transport: Arc<dyn HttpTransport> =
            Arc::new(CapturingTransport::new(network, bus.clone(), config.clone()));
        Self {
            transport,
            bus,
            config,
        }
    }

    /// The wrapped request function. Host-page requests made through it are
    /// subject to ambient capture.
    pub fn transport(&self) -> Arc<dyn HttpTransport> {
        self.transport.clone()
    }

    /// Build the on-demand request from the ambient session.
    pub fn build_request(&self) -> HttpRequest {
        let ids = SessionIds::from_cookies(&self.config.cookies, &self.config);
        let body = json!({"user_id": &ids.user_id, "txn_token": &ids.txn_token}).to_string();

        let mut request = HttpRequest::post(&self.config.endpoint, body)
            .with_header("Accept", ACCEPT)
            .with_header("Content-Type", "application/json")
            .with_header("Cache-Control", "no-cache");
        if !ids.user_id.is_empty() {
            request = request.with_header("user_id", ids.user_id);
        }
        if !self.config.cookies.is_empty() {
            request = request.with_header("Cookie", self.config.cookies.clone());
        }
        request
    }

    /// Issue the past-orders request. Transport and JSON failures come back
    /// as the `{ code: 500, error, data: [] }` envelope.
    pub async fn fetch_past_orders(&self) -> Value {
        match self.try_fetch().await {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "Past orders fetch failed");
                error_payload(e)
            }
        }
    }

    async fn try_fetch(&self) -> Result<Value, TransportError> {
        let response = self.transport.send(self.build_request()).await?;
        debug!(status = response.status, "Past orders response received");
        response.json()
    }

    /// Listen for `FETCH_PAST_ORDERS` and answer each with `PAST_ORDERS`.
    ///
    /// Every request runs on its own task; nothing is deduplicated.
    pub fn spawn(self) -> JoinHandle<()> {
        let mut subscription = self.bus.subscribe();
        tokio::spawn(async move {
            info!(window = %self.bus.window(), "In-page agent listening");
            while let Some(envelope) = subscription.recv().await {
                if envelope.message != RelayMessage::FetchPastOrders {
                    continue;
                }

                let agent = self.clone();
                tokio::spawn(async move {
                    let payload = agent.fetch_past_orders().await;
                    agent.bus.post(RelayMessage::PastOrders { payload });
                });
            }
            debug!("Bus closed, in-page agent stopped");
        })
    }
}
