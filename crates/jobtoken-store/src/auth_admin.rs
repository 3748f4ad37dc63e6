//! Auth admin API: privileged link generation.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::StoreClient;
use crate::error::{StoreError, StoreResult};

#[derive(Serialize)]
struct GenerateLinkRequest<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    email: &'a str,
    redirect_to: &'a str,
}

#[derive(Deserialize)]
struct LinkProperties {
    #[serde(default)]
    action_link: Option<String>,
}

/// Older auth servers return `action_link` at the top level, newer ones
/// nest it under `properties`.
#[derive(Deserialize)]
struct GenerateLinkResponse {
    #[serde(default)]
    action_link: Option<String>,
    #[serde(default)]
    properties: Option<LinkProperties>,
}

impl GenerateLinkResponse {
    fn into_action_link(self) -> Option<String> {
        self.properties
            .and_then(|p| p.action_link)
            .or(self.action_link)
            .filter(|link| !link.is_empty())
    }
}

impl StoreClient {
    /// Generate a one-time sign-in link for `email` that lands on `redirect_to`.
    pub async fn generate_magic_link(&self, email: &str, redirect_to: &str) -> StoreResult<String> {
        let url = self.auth_admin_url("generate_link");
        let request = GenerateLinkRequest {
            kind: "magiclink",
            email,
            redirect_to,
        };

        let response: GenerateLinkResponse = self
            .post_json("generate_link", "auth", &url, &request)
            .await?;

        let link = response
            .into_action_link()
            .ok_or_else(|| StoreError::InvalidResponse("auth server returned no action link".into()))?;

        debug!(email = %email, "Generated magic link");
        Ok(link)
    }
}
