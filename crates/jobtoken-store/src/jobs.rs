//! Job repository and its embedded read shapes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use jobtoken_models::{Job, NewJob};

use crate::client::StoreClient;
use crate::error::{StoreError, StoreResult};
use crate::query::Query;

const TABLE: &str = "jobs";
const REPORT_VIEW: &str = "admin_analytics_report";

/// `applications(count)` embeds arrive as `[{"count": n}]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddedCount {
    pub count: u64,
}

fn first_count(counts: &[EmbeddedCount]) -> u64 {
    counts.first().map(|c| c.count).unwrap_or(0)
}

/// Employer fields embedded through `posted_by`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PosterRef {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// A job with its poster, for the admin job list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobWithPoster {
    #[serde(flatten)]
    pub job: Job,
    #[serde(rename = "profiles", default)]
    pub poster: Option<PosterRef>,
}

/// A job with the number of applications it received.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct JobWithApplicationCount {
    #[serde(flatten)]
    pub job: Job,
    #[serde(default)]
    pub applications: Vec<EmbeddedCount>,
}

impl JobWithApplicationCount {
    pub fn application_count(&self) -> u64 {
        first_count(&self.applications)
    }
}

/// Applications per job, keyed by category.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct JobCategoryCount {
    pub job_type: String,
    #[serde(default)]
    pub applications: Vec<EmbeddedCount>,
}

impl JobCategoryCount {
    pub fn application_count(&self) -> u64 {
        first_count(&self.applications)
    }
}

/// Per-job inputs for the analytics report when the view is unavailable.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct JobReportSource {
    pub id: String,
    pub title: String,
    pub job_type: String,
    pub created_at: DateTime<Utc>,
    #[serde(rename = "profiles", default)]
    pub poster: Option<PosterRef>,
    #[serde(default)]
    pub applications: Vec<EmbeddedCount>,
}

impl JobReportSource {
    pub fn application_count(&self) -> u64 {
        first_count(&self.applications)
    }
}

#[derive(Deserialize)]
struct TitleRow {
    title: String,
}

/// Repository for `jobs` rows.
pub struct JobRepository {
    client: StoreClient,
}

impl JobRepository {
    pub fn new(client: StoreClient) -> Self {
        Self { client }
    }

    /// All jobs newest first, optionally narrowed to one job type.
    pub async fn list(&self, job_type: Option<&str>) -> StoreResult<Vec<Job>> {
        let mut query = Query::new().select("*");
        if let Some(job_type) = job_type {
            query = query.eq("job_type", job_type);
        }
        let query = query.order_desc("created_at");
        self.client.select(TABLE, &query).await
    }

    pub async fn title(&self, job_id: &str) -> StoreResult<Option<String>> {
        let query = Query::new().select("title").eq("id", job_id);
        let row: Option<TitleRow> = self.client.select_one(TABLE, &query).await?;
        Ok(row.map(|r| r.title))
    }

    pub async fn create(&self, job: &NewJob) -> StoreResult<Job> {
        let rows: Vec<Job> = self.client.insert(TABLE, job).await?;
        let created = rows
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::InvalidResponse("insert returned no job".into()))?;
        info!(job_id = %created.id, posted_by = %created.posted_by, "Created job");
        Ok(created)
    }

    pub async fn delete(&self, job_id: &str) -> StoreResult<()> {
        self.client
            .delete(TABLE, &Query::new().eq("id", job_id))
            .await?;
        info!(job_id = %job_id, "Deleted job");
        Ok(())
    }

    /// An employer's jobs newest first, with application counts.
    pub async fn list_for_employer(
        &self,
        employer_id: &str,
    ) -> StoreResult<Vec<JobWithApplicationCount>> {
        let query = Query::new()
            .select("*,applications(count)")
            .eq("posted_by", employer_id)
            .order_desc("created_at");
        self.client.select(TABLE, &query).await
    }

    /// Every job with its poster's name and email, newest first.
    pub async fn list_with_poster(&self) -> StoreResult<Vec<JobWithPoster>> {
        let query = Query::new()
            .select("*,profiles:posted_by(full_name,email)")
            .order_desc("created_at");
        self.client.select(TABLE, &query).await
    }

    pub async fn category_application_counts(&self) -> StoreResult<Vec<JobCategoryCount>> {
        let query = Query::new().select("job_type,applications(count)");
        self.client.select(TABLE, &query).await
    }

    pub async fn report_rows(&self) -> StoreResult<Vec<JobReportSource>> {
        let query = Query::new().select(
            "id,
             title,
             job_type,
             created_at,
             profiles:posted_by(full_name),
             applications(count)",
        );
        self.client.select(TABLE, &query).await
    }

    /// Rows of the store-side analytics view, passed through untouched.
    pub async fn analytics_view(&self) -> StoreResult<Vec<serde_json::Value>> {
        self.client
            .select(REPORT_VIEW, &Query::new().select("*"))
            .await
    }
}
