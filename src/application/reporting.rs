use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::domain::{WindowKind, WindowReport};

/// Both reporting windows for one payload, evaluated at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Evaluation instant, expressed in IST
    pub evaluated_at: DateTime<FixedOffset>,
    pub current_month: WindowReport,
    pub last_365_days: WindowReport,
}

impl AnalysisResult {
    /// Month label for the current-month title, e.g. "June 2024".
    pub fn month_label(&self) -> String {
        self.evaluated_at.format("%B %Y").to_string()
    }

    pub fn window(&self, kind: WindowKind) -> &WindowReport {
        match kind {
            WindowKind::CurrentMonth => &self.current_month,
            WindowKind::Last365Days => &self.last_365_days,
        }
    }

    /// Windows in presentation order: current month first.
    pub fn windows(&self) -> [&WindowReport; 2] {
        [&self.current_month, &self.last_365_days]
    }
}
