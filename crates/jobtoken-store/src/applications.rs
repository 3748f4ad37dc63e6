//! Application repository and its embedded read shapes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use jobtoken_models::{Application, ApplicationStatus};

use crate::client::StoreClient;
use crate::error::{StoreError, StoreResult};
use crate::query::Query;

const TABLE: &str = "applications";

/// Job fields embedded in an application row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobTitleRef {
    pub title: String,
}

/// Applicant fields embedded through `user_id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicantRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl ApplicantRef {
    /// Name for greetings: full name, else the email's local part.
    pub fn display_name(&self) -> String {
        match (self.full_name.as_deref(), self.email.as_deref()) {
            (Some(name), _) if !name.trim().is_empty() => name.to_string(),
            (_, Some(email)) => email.split('@').next().unwrap_or(email).to_string(),
            _ => "there".to_string(),
        }
    }
}

/// An application with its job title and applicant contact details.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ApplicationWithParties {
    #[serde(flatten)]
    pub application: Application,
    #[serde(default)]
    pub jobs: Option<JobTitleRef>,
    #[serde(rename = "profiles", default)]
    pub applicant: Option<ApplicantRef>,
}

impl ApplicationWithParties {
    pub fn job_title(&self) -> Option<&str> {
        self.jobs.as_ref().map(|j| j.title.as_str())
    }
}

/// Submission and last-update time of a shortlisted application.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HireInterval {
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A seeker's own application with the job title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeekerApplication {
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub job: Option<JobTitleRef>,
}

/// An applicant to one job.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct JobApplicant {
    pub created_at: DateTime<Utc>,
    #[serde(rename = "profiles", default)]
    pub applicant: Option<ApplicantRef>,
}

#[derive(Serialize)]
struct StatusUpdate<'a> {
    status: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    notes: Option<&'a str>,
}

#[derive(Deserialize)]
struct CreatedAtRow {
    created_at: DateTime<Utc>,
}

/// Repository for `applications` rows.
pub struct ApplicationRepository {
    client: StoreClient,
}

impl ApplicationRepository {
    pub fn new(client: StoreClient) -> Self {
        Self { client }
    }

    /// Write a new status (and notes, when given) and return the updated row
    /// with job title and applicant.
    pub async fn update_status(
        &self,
        application_id: &str,
        status: &str,
        notes: Option<&str>,
    ) -> StoreResult<ApplicationWithParties> {
        let query = Query::new()
            .select("*,jobs(title),profiles:user_id(full_name,email)")
            .eq("id", application_id);

        let rows: Vec<ApplicationWithParties> = self
            .client
            .update(TABLE, &query, &StatusUpdate { status, notes })
            .await?;

        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::not_found("Application not found"))?;

        info!(application_id = %application_id, status = %status, "Updated application status");
        Ok(row)
    }

    pub async fn count_all(&self) -> StoreResult<u64> {
        self.client.count(TABLE, &Query::new().select("id")).await
    }

    pub async fn shortlisted_intervals(&self) -> StoreResult<Vec<HireInterval>> {
        let query = Query::new()
            .select("created_at,updated_at")
            .eq("status", ApplicationStatus::Shortlisted);
        self.client.select(TABLE, &query).await
    }

    /// Submission times of applications created at or after `since`.
    pub async fn created_since(&self, since: DateTime<Utc>) -> StoreResult<Vec<DateTime<Utc>>> {
        let query = Query::new().select("created_at").since("created_at", since);
        let rows: Vec<CreatedAtRow> = self.client.select(TABLE, &query).await?;
        Ok(rows.into_iter().map(|r| r.created_at).collect())
    }

    pub async fn for_user(&self, user_id: &str) -> StoreResult<Vec<SeekerApplication>> {
        let query = Query::new()
            .select("id,status,created_at,job:job_id(title)")
            .eq("user_id", user_id)
            .order_desc("created_at");
        self.client.select(TABLE, &query).await
    }

    pub async fn count_for_user(&self, user_id: &str) -> StoreResult<u64> {
        let query = Query::new().select("id").eq("user_id", user_id);
        self.client.count(TABLE, &query).await
    }

    pub async fn applicants_for_job(&self, job_id: &str) -> StoreResult<Vec<JobApplicant>> {
        let query = Query::new()
            .select("created_at,profiles:user_id(id,full_name,email)")
            .eq("job_id", job_id);
        self.client.select(TABLE, &query).await
    }

    /// Every application to jobs posted by `employer_id`, newest first.
    pub async fn for_employer(&self, employer_id: &str) -> StoreResult<Vec<ApplicationWithParties>> {
        let query = Query::new()
            .select("*,jobs!inner(title,posted_by),profiles:user_id(full_name,email)")
            .eq("jobs.posted_by", employer_id)
            .order_desc("created_at");
        self.client.select(TABLE, &query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_application_with_parties_deserializes() {
        let row: ApplicationWithParties = serde_json::from_str(
            r#"{
                "id":"a1","job_id":"j1","user_id":"u1","status":"shortlisted","notes":"Call Monday",
                "created_at":"2024-05-01T10:00:00+00:00","updated_at":"2024-05-03T10:00:00+00:00",
                "jobs":{"title":"Chef"},
                "profiles":{"full_name":null,"email":"amina@example.com"}
            }"#,
        )
        .unwrap();

        assert_eq!(row.job_title(), Some("Chef"));
        assert_eq!(row.application.notes.as_deref(), Some("Call Monday"));
        assert_eq!(row.applicant.unwrap().display_name(), "amina");
    }

    #[test]
    fn test_status_update_omits_missing_notes() {
        let body = serde_json::to_value(StatusUpdate {
            status: "rejected",
            notes: None,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({ "status": "rejected" }));
    }
}
