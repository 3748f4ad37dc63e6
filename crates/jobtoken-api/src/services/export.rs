//! Financial log CSV export.

use chrono::{DateTime, Duration, Utc};
use csv::{Terminator, WriterBuilder};

use jobtoken_store::TransactionWithOwner;

use crate::error::{ApiError, ApiResult};

/// Export file name offered to the browser.
pub const FINANCIAL_LOG_FILENAME: &str = "financial_log.csv";

/// Days of history included in the export.
pub const EXPORT_WINDOW_DAYS: i64 = 30;

const HEADER: [&str; 5] = ["Date", "User Email", "Tokens", "Type", "Reference ID"];

/// Oldest timestamp included in an export generated at `now`.
pub fn export_window_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::days(EXPORT_WINDOW_DAYS)
}

/// Render ledger rows as CSV, keeping only the export window, newest first.
pub fn render_financial_log(
    rows: &[TransactionWithOwner],
    now: DateTime<Utc>,
) -> ApiResult<String> {
    let since = export_window_start(now);

    let mut rows: Vec<&TransactionWithOwner> = rows
        .iter()
        .filter(|row| row.transaction.created_at >= since)
        .collect();
    rows.sort_by(|a, b| b.transaction.created_at.cmp(&a.transaction.created_at));

    let mut writer = WriterBuilder::new()
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(HEADER).map_err(csv_error)?;

    for row in rows {
        let tx = &row.transaction;
        let date = tx.created_at.format("%Y-%m-%d %H:%M:%S").to_string();
        let tokens = tx.tokens_added.to_string();
        writer
            .write_record([
                date.as_str(),
                row.owner_email().unwrap_or("N/A"),
                tokens.as_str(),
                tx.kind.as_str(),
                tx.reference_id.as_deref().unwrap_or(""),
            ])
            .map_err(csv_error)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ApiError::internal(format!("CSV export failed: {}", e)))?;

    String::from_utf8(bytes).map_err(|e| ApiError::internal(format!("CSV export failed: {}", e)))
}

fn csv_error(err: csv::Error) -> ApiError {
    ApiError::internal(format!("CSV export failed: {}", err))
}
