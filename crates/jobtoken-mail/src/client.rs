//! Resend HTTP API client.

use std::time::Duration;

use metrics::counter;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{MailError, MailResult};
use crate::templates::{EmailTemplate, Sender};

const DEFAULT_API_URL: &str = "https://api.resend.com";

/// Mail client configuration.
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub api_key: String,
    pub api_url: String,
    /// Display name used in the `From` header
    pub from_name: String,
    pub onboarding_address: String,
    pub notifications_address: String,
    pub timeout: Duration,
}

impl MailConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_url: DEFAULT_API_URL.to_string(),
            from_name: "JobToken".to_string(),
            onboarding_address: "onboarding@resend.dev".to_string(),
            notifications_address: "notifications@resend.dev".to_string(),
            timeout: Duration::from_secs(15),
        }
    }

    /// Create config from environment variables.
    pub fn from_env() -> MailResult<Self> {
        let api_key = std::env::var("RESEND_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| MailError::config("RESEND_API_KEY must be set"))?;

        let mut config = Self::new(api_key);

        if let Ok(url) = std::env::var("RESEND_API_URL") {
            config.api_url = url;
        }
        if let Ok(name) = std::env::var("MAIL_FROM_NAME") {
            config.from_name = name;
        }
        if let Ok(addr) = std::env::var("MAIL_ONBOARDING_ADDRESS") {
            config.onboarding_address = addr;
        }
        if let Ok(addr) = std::env::var("MAIL_NOTIFICATIONS_ADDRESS") {
            config.notifications_address = addr;
        }

        Ok(config)
    }

    /// `Name <address>` for the given sender.
    pub fn from_header(&self, sender: Sender) -> String {
        let address = match sender {
            Sender::Onboarding => &self.onboarding_address,
            Sender::Notifications => &self.notifications_address,
        };
        format!("{} <{}>", self.from_name, address)
    }
}

#[derive(Serialize)]
struct SendEmailRequest<'a> {
    from: String,
    to: [&'a str; 1],
    subject: String,
    html: String,
}

#[derive(Deserialize)]
struct SendEmailResponse {
    id: String,
}

/// Sends rendered templates through Resend.
#[derive(Clone)]
pub struct MailClient {
    http: Client,
    config: MailConfig,
}

impl MailClient {
    pub fn new(config: MailConfig) -> MailResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("jobtoken-mail/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { http, config })
    }

    pub fn from_env() -> MailResult<Self> {
        Self::new(MailConfig::from_env()?)
    }

    /// Send `template` to one recipient and return the provider's message id.
    pub async fn send<T: EmailTemplate>(&self, to: &str, template: &T) -> MailResult<String> {
        let result = self.deliver(to, template).await;

        match &result {
            Ok(id) => {
                counter!("mail_sent_total", "template" => template.name()).increment(1);
                info!(template = template.name(), message_id = %id, "Email sent");
            }
            Err(e) => {
                counter!("mail_failed_total", "template" => template.name()).increment(1);
                warn!(template = template.name(), error = %e, "Email send failed");
            }
        }

        result
    }

    async fn deliver<T: EmailTemplate>(&self, to: &str, template: &T) -> MailResult<String> {
        let url = format!("{}/emails", self.config.api_url.trim_end_matches('/'));
        let request = SendEmailRequest {
            from: self.config.from_header(template.sender()),
            to: [to],
            subject: template.subject(),
            html: template.html(),
        };

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::from_response(status.as_u16(), &body));
        }

        let body: SendEmailResponse = response
            .json()
            .await
            .map_err(|e| MailError::InvalidResponse(e.to_string()))?;

        Ok(body.id)
    }
}
