//! Consumer side of the relay.
//!
//! Keeps the most recent payload in a single slot and turns every accepted
//! delivery into an analysis. Deliveries are not deduplicated: capture and
//! on-demand fetch may both arrive, and the later one wins.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::{Envelope, MessageBus, RelayMessage, Subscription};
use crate::application::{analyze, AnalysisResult};

/// Source of the evaluation instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock stuck at one instant.
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    Fetching,
    Refetching,
    NoOrders,
}

impl Notice {
    pub fn text(&self) -> &'static str {
        match self {
            Notice::Fetching => "Fetching past orders… If nothing shows, refresh the page.",
            Notice::Refetching => "Refetching…",
            Notice::NoOrders => "No orders found or not logged in.",
        }
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text())
    }
}

/// What the consumer asks its UI to show.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsumerEvent {
    Notice(Notice),
    Render(Box<AnalysisResult>),
}

/// JavaScript-style truthiness of `payload.data`: arrays and objects count
/// even when empty.
fn has_data(payload: &Value) -> bool {
    match payload.get("data") {
        None | Some(Value::Null) | Some(Value::Bool(false)) => false,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

pub struct OrdersConsumer {
    bus: MessageBus,
    clock: Arc<dyn Clock>,
    cached: Option<Value>,
}

impl OrdersConsumer {
    pub fn new(bus: MessageBus, clock: Arc<dyn Clock>) -> Self {
        Self {
            bus,
            clock,
            cached: None,
        }
    }

    /// The current authoritative payload, if any.
    pub fn cached(&self) -> Option<&Value> {
        self.cached.as_ref()
    }

    /// Show the analysis: from the cache when present, otherwise ask the
    /// agent to fetch.
    pub fn request_analysis(&mut self) -> ConsumerEvent {
        match &self.cached {
            Some(payload) => self.render(payload),
            None => {
                self.bus.post(RelayMessage::FetchPastOrders);
                ConsumerEvent::Notice(Notice::Fetching)
            }
        }
    }

    /// Drop the cached payload, then ask for a fresh one.
    pub fn refetch(&mut self) -> ConsumerEvent {
        self.cached = None;
        self.bus.post(RelayMessage::FetchPastOrders);
        ConsumerEvent::Notice(Notice::Refetching)
    }

    /// React to one bus message. Only deliveries posted from our own window
    /// are accepted.
    pub fn handle(&mut self, envelope: &Envelope) -> Option<ConsumerEvent> {
        if envelope.origin != self.bus.window() {
            debug!(origin = %envelope.origin, "Ignoring message from foreign window");
            return None;
        }
        let payload = envelope.message.delivered_payload()?;

        if !has_data(payload) {
            info!(kind = envelope.message.as_str(), "Delivery without order data");
            return Some(ConsumerEvent::Notice(Notice::NoOrders));
        }

        info!(kind = envelope.message.as_str(), "Past orders delivered");
        let event = self.render(payload);
        self.cached = Some(payload.clone());
        Some(event)
    }

    fn render(&self, payload: &Value) -> ConsumerEvent {
        ConsumerEvent::Render(Box::new(analyze(payload, self.clock.now())))
    }

    /// Run the consumer on its own task. The slot is owned by that task;
    /// user actions reach it through the returned handle.
    pub fn spawn(self) -> (ConsumerHandle, mpsc::UnboundedReceiver<ConsumerEvent>, JoinHandle<()>) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let subscription = self.bus.subscribe();
        let task = tokio::spawn(self.run(subscription, command_rx, event_tx));
        (ConsumerHandle { commands: command_tx }, event_rx, task)
    }

    async fn run(
        mut self,
        mut subscription: Subscription,
        mut commands: mpsc::UnboundedReceiver<Command>,
        events: mpsc::UnboundedSender<ConsumerEvent>,
    ) {
        let mut commands_open = true;

        loop {
            let event = tokio::select! {
                command = commands.recv(), if commands_open => match command {
                    Some(Command::RequestAnalysis) => Some(self.request_analysis()),
                    Some(Command::Refetch) => Some(self.refetch()),
                    None => {
                        commands_open = false;
                        None
                    }
                },
                envelope = subscription.recv() => match envelope {
                    Some(envelope) => self.handle(&envelope),
                    None => break,
                },
            };

            if let Some(event) = event {
                if events.send(event).is_err() {
                    debug!("Event receiver dropped, consumer stopped");
                    return;
                }
            }
        }
        debug!("Bus closed, consumer stopped");
    }
}

#[derive(Debug, Clone, Copy)]
enum Command {
    RequestAnalysis,
    Refetch,
}

/// Sends user actions to a running consumer.
#[derive(Clone)]
pub struct ConsumerHandle {
    commands: mpsc::UnboundedSender<Command>,
}

impl ConsumerHandle {
    pub fn request_analysis(&self) {
        let _ = self.commands.send(Command::RequestAnalysis);
    }

    pub fn refetch(&self) {
        let _ = self.commands.send(Command::Refetch);
    }
}
