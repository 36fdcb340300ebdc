use std::collections::HashMap;

use chrono::{DateTime, Datelike, FixedOffset};
use serde::{Deserialize, Serialize};

use super::{one_year_earlier, AggregateBucket, OrderRecord, Totals};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowKind {
    /// Calendar month of the evaluation instant, IST
    CurrentMonth,
    /// From the same wall-clock instant a year earlier up to the evaluation instant, IST
    #[serde(rename = "last_365_days")]
    Last365Days,
}

impl WindowKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WindowKind::CurrentMonth => "current_month",
            WindowKind::Last365Days => "last_365_days",
        }
    }

    /// Scope label written in the CSV export.
    pub fn scope_label(&self) -> &'static str {
        match self {
            WindowKind::CurrentMonth => "CurrentMonthIST",
            WindowKind::Last365Days => "Last365DaysIST",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            WindowKind::CurrentMonth => "Current Month (IST)",
            WindowKind::Last365Days => "Last 365 Days (IST)",
        }
    }
}

impl std::fmt::Display for WindowKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum WindowRange {
    CalendarMonth {
        year: i32,
        month: u32,
    },
    Trailing {
        from: DateTime<FixedOffset>,
        to: DateTime<FixedOffset>,
    },
}

/// A reporting window with its per-brand buckets and grand total.
///
/// Buckets are kept in first-seen order so that the final sort is stable on ties.
#[derive(Debug, Clone)]
pub struct ReportingWindow {
    kind: WindowKind,
    range: WindowRange,
    index: HashMap<String, usize>,
    buckets: Vec<AggregateBucket>,
    totals: Totals,
}

impl ReportingWindow {
    /// Window A: the IST calendar month containing `now`.
    pub fn current_month(now: DateTime<FixedOffset>) -> Self {
        Self::new(
            WindowKind::CurrentMonth,
            WindowRange::CalendarMonth {
                year: now.year(),
                month: now.month(),
            },
        )
    }

    /// Window B: `[now - 1 calendar year, now]`, inclusive on both ends.
    pub fn last_365_days(now: DateTime<FixedOffset>) -> Self {
        Self::new(
            WindowKind::Last365Days,
            WindowRange::Trailing {
                from: one_year_earlier(now),
                to: now,
            },
        )
    }

    fn new(kind: WindowKind, range: WindowRange) -> Self {
        Self {
            kind,
            range,
            index: HashMap::new(),
            buckets: Vec::new(),
            totals: Totals::default(),
        }
    }

    pub fn kind(&self) -> WindowKind {
        self.kind
    }

    pub fn contains(&self, at: DateTime<FixedOffset>) -> bool {
        match self.range {
            WindowRange::CalendarMonth { year, month } => {
                at.year() == year && at.month() == month
            }
            WindowRange::Trailing { from, to } => at >= from && at <= to,
        }
    }

    /// Add a record to its brand bucket (created on first use) and to the grand total.
    pub fn accumulate(&mut self, record: &OrderRecord) {
        let position = match self.index.get(&record.brand) {
            Some(&position) => position,
            None => {
                self.buckets.push(AggregateBucket::new(record.brand.clone()));
                let position = self.buckets.len() - 1;
                self.index.insert(record.brand.clone(), position);
                position
            }
        };

        self.buckets[position].totals.add(record);
        self.totals.add(record);
    }

    /// Finish the window: buckets sorted by total face value, highest first.
    pub fn into_report(self) -> WindowReport {
        let mut buckets = self.buckets;
        buckets.sort_by(|a, b| b.totals.face.total_cmp(&a.totals.face));

        WindowReport {
            scope: self.kind,
            buckets,
            totals: self.totals,
        }
    }
}

/// A finished reporting window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowReport {
    pub scope: WindowKind,
    pub buckets: Vec<AggregateBucket>,
    pub totals: Totals,
}

impl WindowReport {
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}
