//! Admin analytics aggregation.
//!
//! Pure functions over rows already fetched from the store.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

use jobtoken_models::pricing::{KSH_PER_TOKEN, KSH_PER_TOPUP};
use jobtoken_store::{HireInterval, JobCategoryCount, JobReportSource};

/// Days covered by the admin chart, today included.
pub const CHART_DAYS: i64 = 7;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Revenue in Ksh from the number of top-ups.
pub fn total_revenue(topups: u64) -> i64 {
    topups as i64 * KSH_PER_TOPUP
}

/// Revenue estimate per job type: each application spends one token.
pub fn revenue_per_category(rows: &[JobCategoryCount]) -> BTreeMap<String, i64> {
    let mut revenue = BTreeMap::new();
    for row in rows {
        *revenue.entry(row.job_type.clone()).or_insert(0) +=
            row.application_count() as i64 * KSH_PER_TOKEN;
    }
    revenue
}

/// Mean days from application to shortlist, one decimal place.
///
/// Rows without an update time are skipped; no rows gives `"0.0"`.
pub fn average_days_to_hire(intervals: &[HireInterval]) -> String {
    let durations: Vec<f64> = intervals
        .iter()
        .filter_map(|i| i.updated_at.map(|updated| updated - i.created_at))
        .map(|d| d.num_milliseconds() as f64 / 1000.0 / SECONDS_PER_DAY)
        .collect();

    let average = if durations.is_empty() {
        0.0
    } else {
        durations.iter().sum::<f64>() / durations.len() as f64
    };

    format!("{:.1}", average)
}

/// First instant covered by the chart.
pub fn chart_window_start(today: NaiveDate) -> DateTime<Utc> {
    (today - Duration::days(CHART_DAYS - 1))
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
        .unwrap_or_else(Utc::now)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartPoint {
    pub date: String,
    pub applications: u64,
    pub revenue: i64,
}

/// One point per UTC day ending `today`, oldest first.
pub fn chart_series(
    today: NaiveDate,
    applications: &[DateTime<Utc>],
    topups: &[DateTime<Utc>],
) -> Vec<ChartPoint> {
    let mut days: BTreeMap<NaiveDate, ChartPoint> = (0..CHART_DAYS)
        .map(|offset| {
            let day = today - Duration::days(offset);
            (
                day,
                ChartPoint {
                    date: day.format("%Y-%m-%d").to_string(),
                    applications: 0,
                    revenue: 0,
                },
            )
        })
        .collect();

    for created in applications {
        if let Some(point) = days.get_mut(&created.date_naive()) {
            point.applications += 1;
        }
    }
    for created in topups {
        if let Some(point) = days.get_mut(&created.date_naive()) {
            point.revenue += KSH_PER_TOPUP;
        }
    }

    days.into_values().collect()
}

/// Row of the analytics report when computed locally.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub id: String,
    pub title: String,
    pub category: String,
    pub employer: Option<String>,
    pub applicant_count: u64,
    pub posted_at: DateTime<Utc>,
}

pub fn report_from_jobs(rows: Vec<JobReportSource>) -> Vec<ReportRow> {
    rows.into_iter()
        .map(|row| {
            let applicant_count = row.application_count();
            ReportRow {
                id: row.id,
                title: row.title,
                category: row.job_type,
                employer: row.poster.and_then(|p| p.full_name),
                applicant_count,
                posted_at: row.created_at,
            }
        })
        .collect()
}
