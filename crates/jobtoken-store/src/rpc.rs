//! Remote procedures executed inside the store.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::client::StoreClient;
use crate::error::StoreResult;

/// Deducts the job's token cost and creates the application atomically.
pub const APPLY_TO_JOB: &str = "apply_to_job";

#[derive(Serialize)]
struct ApplyArgs<'a> {
    p_job_id: &'a str,
    p_user_id: &'a str,
}

/// Result reported by `apply_to_job`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyOutcome {
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

impl StoreClient {
    /// Call an RPC by name with named arguments.
    pub async fn rpc<A, T>(&self, function: &str, args: &A) -> StoreResult<T>
    where
        A: Serialize + ?Sized,
        T: serde::de::DeserializeOwned,
    {
        let url = self.rpc_url(function);
        self.post_json("rpc", function, &url, args).await
    }

    /// Apply `user_id` to `job_id`. A business refusal (insufficient tokens,
    /// duplicate application) comes back as `success: false`, not as an error.
    pub async fn apply_to_job(&self, job_id: &str, user_id: &str) -> StoreResult<ApplyOutcome> {
        let outcome: ApplyOutcome = self
            .rpc(
                APPLY_TO_JOB,
                &ApplyArgs {
                    p_job_id: job_id,
                    p_user_id: user_id,
                },
            )
            .await?;

        if outcome.success {
            info!(job_id = %job_id, user_id = %user_id, "Application submitted");
        } else {
            warn!(
                job_id = %job_id,
                user_id = %user_id,
                reason = outcome.error.as_deref().unwrap_or("unknown"),
                "Application refused"
            );
        }

        Ok(outcome)
    }
}
