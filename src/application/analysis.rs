use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::domain::{to_ist, OrderRecord, ReportingWindow};

use super::AnalysisResult;

/// Order rows of a payload. A missing or non-list `data` field is an empty list.
pub fn order_rows(payload: &Value) -> &[Value] {
    payload
        .get("data")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Aggregate a past-orders payload into the current-month and last-365-days
/// windows, grouped by brand.
///
/// Pure and total: malformed rows are skipped or zero-defaulted, never fatal.
pub fn analyze(payload: &Value, now: DateTime<Utc>) -> AnalysisResult {
    let now_ist = to_ist(now);
    let mut month = ReportingWindow::current_month(now_ist);
    let mut year = ReportingWindow::last_365_days(now_ist);

    for row in order_rows(payload) {
        let record = OrderRecord::from_value(row);
        if !record.is_complete() {
            continue;
        }
        let Some(ordered_at) = record.ordered_at else {
            continue;
        };

        for window in [&mut month, &mut year] {
            if window.contains(ordered_at) {
                window.accumulate(&record);
            }
        }
    }

    AnalysisResult {
        evaluated_at: now_ist,
        current_month: month.into_report(),
        last_365_days: year.into_report(),
    }
}
