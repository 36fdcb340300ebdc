// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Utc};
use gyftr_ledger::config::RelayConfig;
use gyftr_ledger::relay::{Clock, FixedClock};
use serde_json::{json, Value};

/// Helper to parse an RFC 3339 instant into DateTime<Utc>
pub fn parse_instant(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

/// 2024-06-20 12:00 IST, the evaluation instant most tests use
pub fn evaluation_instant() -> DateTime<Utc> {
    parse_instant("2024-06-20T12:00:00+05:30")
}

pub fn fixed_clock() -> Arc<dyn Clock> {
    Arc::new(FixedClock(evaluation_instant()))
}

/// One order row as the past-orders API reports it
pub fn order(status: &str, at: &str, brand: &str, quantity: u64, face: f64, cash: f64) -> Value {
    json!({
        "order_status": status,
        "order_on": at,
        "brand_name": brand,
        "quantity": quantity,
        "face_value": face,
        "cash": cash,
    })
}

/// Test fixture: a mixed history around the evaluation instant
pub struct SampleHistory;

impl SampleHistory {
    pub fn rows() -> Vec<Value> {
        vec![
            order("C", "2024-06-15T10:00:00Z", "Amazon", 2, 500.0, 950.0),
            order("C", "2024-06-02T09:30:00+05:30", "Flipkart", 1, 1000.0, 970.0),
            order("P", "2024-06-10T10:00:00Z", "Amazon", 5, 500.0, 2400.0),
            order("C", "2024-03-01T08:00:00Z", "Swiggy", 4, 250.0, 960.0),
            order("C", "2023-08-11T08:00:00Z", "Amazon", 1, 2000.0, 1900.0),
            order("C", "2023-06-19T08:00:00Z", "Myntra", 1, 1000.0, 950.0),
        ]
    }

    pub fn payload() -> Value {
        json!({ "code": 200, "data": Self::rows() })
    }
}

/// Relay configuration pointed at a fake endpoint with a logged-in session
pub fn test_config() -> RelayConfig {
    RelayConfig::default()
        .with_endpoint("https://shop.test/smartbuyapi/hdfc/api/v1/order/userpastorders")
        .with_cookies("smartbuy_token=u-42; smartbuy_txn_token=t%2F99")
}
