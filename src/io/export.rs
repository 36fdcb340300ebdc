use anyhow::Result;
use std::io::Write;

use crate::application::AnalysisResult;
use crate::domain::WindowReport;

/// CSV header of every window block.
pub const CSV_HEADER: [&str; 6] = [
    "Scope",
    "Brand",
    "Orders",
    "Qty",
    "TotalFaceValue",
    "TotalCashPaid",
];

/// Exporter for writing an analysis to CSV or JSON
pub struct Exporter<'a> {
    analysis: &'a AnalysisResult,
}

impl<'a> Exporter<'a> {
    pub fn new(analysis: &'a AnalysisResult) -> Self {
        Self { analysis }
    }

    /// Export both windows to CSV: a header line then one row per bucket,
    /// current month block first. Returns the number of bucket rows written.
    pub fn export_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        let mut count = 0;
        for window in self.analysis.windows() {
            count += write_window(&mut csv_writer, window)?;
        }

        csv_writer.flush()?;
        Ok(count)
    }

    /// Export the full analysis as pretty-printed JSON
    pub fn export_json<W: Write>(&self, mut writer: W) -> Result<()> {
        let json = serde_json::to_string_pretty(self.analysis)?;
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }
}

fn write_window<W: Write>(csv_writer: &mut csv::Writer<W>, window: &WindowReport) -> Result<usize> {
    csv_writer.write_record(CSV_HEADER)?;

    let scope = window.scope.scope_label();
    for bucket in &window.buckets {
        let orders = bucket.totals.orders.to_string();
        let qty = bucket.totals.qty.to_string();
        let face = bucket.totals.face.to_string();
        let cash = bucket.totals.cash.to_string();
        let record: [&str; 6] = [scope, &bucket.brand, &orders, &qty, &face, &cash];
        csv_writer.write_record(record)?;
    }

    Ok(window.buckets.len())
}
