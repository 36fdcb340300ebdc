use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

/// Identifies the document (window) a message was posted from.
pub type WindowId = Uuid;

/// Messages exchanged between the privileged agent and the consumer.
///
/// Wire shape: `{ "type": "PAST_ORDERS", "payload": { ... } }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelayMessage {
    /// Consumer asks the agent to issue the past-orders request.
    FetchPastOrders,
    /// Result of an on-demand fetch (or its error envelope).
    PastOrders {
        #[serde(default)]
        payload: Value,
    },
    /// Payload captured from an ambient request made by the host page.
    PastOrdersCaptured {
        #[serde(default)]
        payload: Value,
    },
}

impl RelayMessage {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelayMessage::FetchPastOrders => "FETCH_PAST_ORDERS",
            RelayMessage::PastOrders { .. } => "PAST_ORDERS",
            RelayMessage::PastOrdersCaptured { .. } => "PAST_ORDERS_CAPTURED",
        }
    }

    /// Payload of either delivery type. Both mean "payload now available".
    pub fn delivered_payload(&self) -> Option<&Value> {
        match self {
            RelayMessage::PastOrders { payload } | RelayMessage::PastOrdersCaptured { payload } => {
                Some(payload)
            }
            RelayMessage::FetchPastOrders => None,
        }
    }
}

impl std::fmt::Display for RelayMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A message as seen on the bus, stamped with the posting window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub origin: WindowId,
    #[serde(flatten)]
    pub message: RelayMessage,
}

/// Payload delivered when the on-demand fetch fails, so the consumer always
/// receives a well-formed envelope.
pub fn error_payload(error: impl std::fmt::Display) -> Value {
    json!({
        "code": 500,
        "error": error.to_string(),
        "data": []
    })
}
