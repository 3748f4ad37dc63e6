//! Outgoing notifications.

use std::sync::Arc;

use tracing::{info, warn};

use jobtoken_mail::{
    ApplicationConfirmation, MailClient, RejectedNotice, ShortlistedNotice, VerificationEmail,
};
use jobtoken_models::ApplicationStatus;
use jobtoken_store::{ApplicationWithParties, JobRepository, StoreClient};

use crate::error::{ApiError, ApiResult};

#[derive(Clone)]
pub struct Notifier {
    store: Arc<StoreClient>,
    mail: Arc<MailClient>,
}

impl Notifier {
    pub fn new(store: Arc<StoreClient>, mail: Arc<MailClient>) -> Self {
        Self { store, mail }
    }

    /// Email a fresh sign-in link that verifies the address.
    pub async fn send_verification(&self, email: &str, redirect_to: &str) -> ApiResult<()> {
        let link = self.store.generate_magic_link(email, redirect_to).await?;
        self.mail
            .send(email, &VerificationEmail { link: &link })
            .await?;
        Ok(())
    }

    /// Confirm a submitted application. A failed title lookup falls back to
    /// generic wording.
    pub async fn send_application_confirmation(
        &self,
        email: &str,
        job_id: Option<&str>,
    ) -> ApiResult<()> {
        let title = match job_id {
            Some(job_id) => JobRepository::new(StoreClient::clone(&self.store))
                .title(job_id)
                .await
                .unwrap_or_else(|e| {
                    warn!(job_id = %job_id, error = %e, "Job title lookup failed");
                    None
                }),
            None => None,
        };

        self.mail
            .send(
                email,
                &ApplicationConfirmation {
                    job_title: title.as_deref(),
                },
            )
            .await?;
        Ok(())
    }

    /// Tell the applicant about a shortlist or rejection. Returns whether an
    /// email was sent; other statuses send nothing.
    pub async fn notify_status_change(
        &self,
        application: &ApplicationWithParties,
        status: &str,
        notes: Option<&str>,
    ) -> ApiResult<bool> {
        let status = match status.parse::<ApplicationStatus>() {
            Ok(status) if status.notifies_applicant() => status,
            _ => return Ok(false),
        };

        let applicant = application
            .applicant
            .as_ref()
            .ok_or_else(|| ApiError::internal("Applicant not found"))?;
        let email = applicant
            .email
            .as_deref()
            .ok_or_else(|| ApiError::internal("Applicant has no email address"))?;

        let name = applicant.display_name();
        let job_title = application.job_title().unwrap_or("the position");

        match status {
            ApplicationStatus::Shortlisted => {
                self.mail
                    .send(
                        email,
                        &ShortlistedNotice {
                            applicant_name: &name,
                            job_title,
                            notes,
                        },
                    )
                    .await?;
            }
            ApplicationStatus::Rejected => {
                self.mail
                    .send(
                        email,
                        &RejectedNotice {
                            applicant_name: &name,
                            job_title,
                        },
                    )
                    .await?;
            }
            ApplicationStatus::Pending => return Ok(false),
        }

        info!(
            application_id = %application.application.id,
            status = %status,
            "Applicant notified"
        );
        Ok(true)
    }
}
