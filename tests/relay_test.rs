mod common;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use common::{fixed_clock, test_config, SampleHistory};
use gyftr_ledger::cli::fetch_analysis;
use gyftr_ledger::domain::WindowKind;
use gyftr_ledger::relay::{
    ConsumerEvent, Envelope, InpageAgent, MessageBus, Notice, OrdersConsumer, RelayMessage,
};
use gyftr_ledger::test_utils::MockTransport;
use serde_json::json;
use tokio::time::timeout;
use uuid::Uuid;

const WAIT: Duration = Duration::from_secs(2);

async fn next_event(
    events: &mut tokio::sync::mpsc::UnboundedReceiver<ConsumerEvent>,
) -> Result<ConsumerEvent> {
    timeout(WAIT, events.recv())
        .await?
        .ok_or_else(|| anyhow::anyhow!("consumer stopped"))
}

#[tokio::test]
async fn test_fetch_analysis_round_trip() -> Result<()> {
    let network = Arc::new(MockTransport::json(&SampleHistory::payload()));

    let analysis = fetch_analysis(
        network.clone(),
        test_config(),
        fixed_clock(),
        false,
        Duration::ZERO,
    )
    .await?
    .ok_or_else(|| anyhow::anyhow!("expected an analysis"))?;

    assert_eq!(analysis.window(WindowKind::CurrentMonth).totals.face, 2000.0);
    assert_eq!(analysis.window(WindowKind::Last365Days).totals.orders, 4);

    let requests = network.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.header("user_id"), Some("u-42"));
    assert!(request.header("Cookie").is_some());
    let body: serde_json::Value = serde_json::from_str(&request.body)?;
    assert_eq!(body, json!({"user_id": "u-42", "txn_token": "t/99"}));
    Ok(())
}

#[tokio::test]
async fn test_ambient_capture_delivers_host_page_response() -> Result<()> {
    let network = Arc::new(MockTransport::json(&SampleHistory::payload()));

    let analysis = fetch_analysis(network.clone(), test_config(), fixed_clock(), true, Duration::ZERO)
        .await?
        .ok_or_else(|| anyhow::anyhow!("expected an analysis"))?;

    assert_eq!(analysis.current_month.buckets.len(), 2);
    assert_eq!(network.requests().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_ambient_host_request_failure_is_reported() -> Result<()> {
    let network = Arc::new(MockTransport::failing("connection reset"));

    let outcome = timeout(
        WAIT,
        fetch_analysis(network, test_config(), fixed_clock(), true, Duration::ZERO),
    )
    .await?;

    let err = outcome.err().map(|e| e.to_string()).unwrap_or_default();
    assert!(err.contains("Host page request failed"));
    assert!(err.contains("connection reset"));
    Ok(())
}

#[tokio::test]
async fn test_on_demand_fetch_is_delivered_twice() -> Result<()> {
    let bus = MessageBus::new();
    let network = Arc::new(MockTransport::json(&SampleHistory::payload()));
    let agent_task = InpageAgent::new(network, bus.clone(), test_config()).spawn();
    let mut subscription = bus.subscribe();

    bus.post(RelayMessage::FetchPastOrders);

    let mut kinds = Vec::new();
    while kinds.len() < 2 {
        let envelope = timeout(WAIT, subscription.recv())
            .await?
            .ok_or_else(|| anyhow::anyhow!("bus closed"))?;
        if let Some(payload) = envelope.message.delivered_payload() {
            assert_eq!(payload, &SampleHistory::payload());
            kinds.push(envelope.message.as_str());
        }
    }
    kinds.sort();
    assert_eq!(kinds, vec!["PAST_ORDERS", "PAST_ORDERS_CAPTURED"]);

    agent_task.abort();
    Ok(())
}

#[tokio::test]
async fn test_network_failure_renders_empty_report() -> Result<()> {
    let network = Arc::new(MockTransport::failing("connection reset"));

    let analysis = fetch_analysis(network, test_config(), fixed_clock(), false, Duration::ZERO)
        .await?
        .ok_or_else(|| anyhow::anyhow!("error envelope carries an empty list"))?;

    assert!(analysis.current_month.is_empty());
    assert!(analysis.last_365_days.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_error_envelope_posted_on_failure() -> Result<()> {
    let bus = MessageBus::new();
    let network = Arc::new(MockTransport::responding(502, "<html>Bad Gateway</html>"));
    let agent_task = InpageAgent::new(network, bus.clone(), test_config()).spawn();
    let mut subscription = bus.subscribe();

    bus.post(RelayMessage::FetchPastOrders);

    let payload = loop {
        let envelope = timeout(WAIT, subscription.recv())
            .await?
            .ok_or_else(|| anyhow::anyhow!("bus closed"))?;
        if let RelayMessage::PastOrders { payload } = envelope.message {
            break payload;
        }
    };
    assert_eq!(payload["code"], 500);
    assert_eq!(payload["data"], json!([]));
    assert!(payload["error"].as_str().is_some_and(|e| !e.is_empty()));

    agent_task.abort();
    Ok(())
}

#[tokio::test]
async fn test_no_orders_notice() -> Result<()> {
    let network = Arc::new(MockTransport::json(&json!({"code": 401, "message": "Unauthorized"})));

    let delivered =
        fetch_analysis(network, test_config(), fixed_clock(), false, Duration::ZERO).await?;

    assert!(delivered.is_none());
    Ok(())
}

#[tokio::test]
async fn test_hanging_request_never_delivers() -> Result<()> {
    let network = Arc::new(MockTransport::hanging());

    let outcome = timeout(
        Duration::from_millis(200),
        fetch_analysis(network, test_config(), fixed_clock(), false, Duration::ZERO),
    )
    .await;

    assert!(outcome.is_err());
    Ok(())
}

#[tokio::test]
async fn test_consumer_ignores_foreign_window() -> Result<()> {
    let bus = MessageBus::new();
    let (_handle, mut events, task) = OrdersConsumer::new(bus.clone(), fixed_clock()).spawn();

    bus.post_from(
        Uuid::new_v4(),
        RelayMessage::PastOrders {
            payload: SampleHistory::payload(),
        },
    );
    assert!(timeout(Duration::from_millis(100), events.recv()).await.is_err());

    bus.post(RelayMessage::PastOrdersCaptured {
        payload: SampleHistory::payload(),
    });
    assert!(matches!(next_event(&mut events).await?, ConsumerEvent::Render(_)));

    task.abort();
    Ok(())
}

#[tokio::test]
async fn test_refetch_replaces_cached_payload() -> Result<()> {
    let bus = MessageBus::new();
    let (handle, mut events, task) = OrdersConsumer::new(bus.clone(), fixed_clock()).spawn();
    let mut subscription = bus.subscribe();

    handle.request_analysis();
    assert_eq!(next_event(&mut events).await?, ConsumerEvent::Notice(Notice::Fetching));

    bus.post(RelayMessage::PastOrders {
        payload: json!({"data": [common::order("C", "2024-06-01T10:00:00Z", "Old", 1, 100.0, 95.0)]}),
    });
    let ConsumerEvent::Render(first) = next_event(&mut events).await? else {
        anyhow::bail!("expected a render");
    };
    assert_eq!(first.current_month.buckets[0].brand, "Old");

    // Served from the cache, no new fetch
    handle.request_analysis();
    assert_eq!(next_event(&mut events).await?, ConsumerEvent::Render(first.clone()));

    handle.refetch();
    assert_eq!(next_event(&mut events).await?, ConsumerEvent::Notice(Notice::Refetching));

    bus.post(RelayMessage::PastOrders {
        payload: json!({"data": [common::order("C", "2024-06-02T10:00:00Z", "New", 1, 100.0, 95.0)]}),
    });
    let ConsumerEvent::Render(second) = next_event(&mut events).await? else {
        anyhow::bail!("expected a render");
    };
    assert_eq!(second.current_month.buckets[0].brand, "New");

    let fetches = collect_fetch_requests(&mut subscription).await;
    assert_eq!(fetches, 2);

    task.abort();
    Ok(())
}

async fn collect_fetch_requests(subscription: &mut gyftr_ledger::relay::Subscription) -> usize {
    let mut count = 0;
    while let Ok(Some(Envelope { message, .. })) =
        timeout(Duration::from_millis(50), subscription.recv()).await
    {
        if message == RelayMessage::FetchPastOrders {
            count += 1;
        }
    }
    count
}

#[tokio::test]
async fn test_settle_keeps_latest_delivery() -> Result<()> {
    let network = Arc::new(MockTransport::json(&SampleHistory::payload()));

    let settled = fetch_analysis(
        network.clone(),
        test_config(),
        fixed_clock(),
        false,
        Duration::from_millis(100),
    )
    .await?;
    let immediate =
        fetch_analysis(network, test_config(), fixed_clock(), false, Duration::ZERO).await?;

    assert!(settled.is_some());
    assert_eq!(settled, immediate);
    Ok(())
}
