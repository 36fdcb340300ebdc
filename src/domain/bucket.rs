use serde::{Deserialize, Serialize};

use super::{OrderRecord, Rupees};

/// Running totals for a set of orders. Used both per brand and as the
/// brand-less grand total of a reporting window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub orders: u64,
    pub qty: u64,
    /// Sum of face value per unit times quantity
    pub face: Rupees,
    pub cash: Rupees,
}

impl Totals {
    /// Counts saturate at `u64::MAX` rather than overflow.
    pub fn add(&mut self, record: &OrderRecord) {
        self.orders = self.orders.saturating_add(1);
        self.qty = self.qty.saturating_add(record.quantity);
        self.face += record.face_value();
        self.cash += record.cash_paid;
    }
}

/// Per-brand accumulator within one reporting window.
/// Serializes flat as `{ brand, orders, qty, face, cash }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateBucket {
    pub brand: String,
    #[serde(flatten)]
    pub totals: Totals,
}

impl AggregateBucket {
    pub fn new(brand: impl Into<String>) -> Self {
        Self {
            brand: brand.into(),
            totals: Totals::default(),
        }
    }
}
