//! Job postings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};
use crate::pricing::DEFAULT_JOB_TOKEN_COST;

/// Job row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub job_type: String,
    pub token_cost: i64,
    pub posted_by: String,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a new posting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewJob {
    pub title: String,
    pub description: String,
    pub job_type: String,
    pub token_cost: i64,
    pub posted_by: String,
}

impl NewJob {
    /// Build a posting, trimming text fields and rejecting empty required ones.
    pub fn new(
        posted_by: impl Into<String>,
        title: &str,
        description: &str,
        job_type: &str,
        token_cost: Option<i64>,
    ) -> ModelResult<Self> {
        let title = title.trim();
        let job_type = job_type.trim();
        let token_cost = token_cost.unwrap_or(DEFAULT_JOB_TOKEN_COST);

        if title.is_empty() {
            return Err(ModelError::Invalid("Job title is required".to_string()));
        }
        if job_type.is_empty() {
            return Err(ModelError::Invalid("Please select a job type".to_string()));
        }
        if token_cost < 1 {
            return Err(ModelError::Invalid(
                "Token cost must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            title: title.to_string(),
            description: description.trim().to_string(),
            job_type: job_type.to_string(),
            token_cost,
            posted_by: posted_by.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_job_defaults_cost() {
        let job = NewJob::new("e1", "  Barista ", "Morning shifts", "part-time", None).unwrap();
        assert_eq!(job.title, "Barista");
        assert_eq!(job.token_cost, 1);
    }

    #[test]
    fn test_new_job_validation() {
        assert!(NewJob::new("e1", "", "", "full-time", None).is_err());
        assert!(NewJob::new("e1", "Chef", "", " ", None).is_err());
        assert!(NewJob::new("e1", "Chef", "", "full-time", Some(0)).is_err());
    }
}
