use chrono::{DateTime, FixedOffset};
use serde_json::Value;

use super::{parse_order_timestamp, Rupees};

static NULL: Value = Value::Null;

/// The only order status that is aggregated.
pub const COMPLETE_STATUS: &str = "C";

/// Label used for orders without a usable brand name.
pub const UNKNOWN_BRAND: &str = "Unknown";

/// One past order as reported by the API.
///
/// Parsing is lenient: a bad field degrades to a default instead of
/// rejecting the record, so one malformed row never fails a whole payload.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRecord {
    /// Raw `order_status` code, if it was a string
    pub status: Option<String>,
    /// `order_on` resolved to IST; `None` when unparseable
    pub ordered_at: Option<DateTime<FixedOffset>>,
    /// Trimmed `brand_name`, or `"Unknown"`
    pub brand: String,
    pub quantity: u64,
    pub face_value_per_unit: Rupees,
    pub cash_paid: Rupees,
}

impl OrderRecord {
    pub fn from_value(value: &Value) -> Self {
        Self {
            status: field(value, "order_status").as_str().map(str::to_string),
            ordered_at: parse_order_timestamp(field(value, "order_on")),
            brand: brand_label(field(value, "brand_name")),
            quantity: quantity(field(value, "quantity")),
            face_value_per_unit: amount(field(value, "face_value")),
            cash_paid: amount(field(value, "cash")),
        }
    }

    /// Status compare is case-insensitive; a missing status is never complete.
    pub fn is_complete(&self) -> bool {
        self.status
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case(COMPLETE_STATUS))
    }

    /// Face value of the whole order line: per-unit face value times quantity.
    pub fn face_value(&self) -> Rupees {
        self.face_value_per_unit * self.quantity as Rupees
    }
}

fn field<'a>(value: &'a Value, name: &str) -> &'a Value {
    value.get(name).unwrap_or(&NULL)
}

fn brand_label(value: &Value) -> String {
    let label = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    };

    if label.is_empty() {
        UNKNOWN_BRAND.to_string()
    } else {
        label
    }
}

fn number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            s.parse::<f64>().ok()?
        }
        _ => return None,
    };
    n.is_finite().then_some(n)
}

fn amount(value: &Value) -> Rupees {
    number(value).unwrap_or(0.0)
}

/// Non-negative whole quantities only; anything else counts as zero.
fn quantity(value: &Value) -> u64 {
    match number(value) {
        Some(n) if n >= 0.0 && n.fract() == 0.0 && n <= u64::MAX as f64 => n as u64,
        _ => 0,
    }
}
