//! PostgREST client.
//!
//! Production-grade client with:
//! - Service-role authentication headers on every request
//! - HTTP client tuning (pooling, timeouts)
//! - Observability (tracing spans, metrics)

use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info_span, Instrument};

use crate::error::{StoreError, StoreResult};
use crate::metrics::{record_request, record_rows};
use crate::query::Query;

/// Ask PostgREST to echo written rows back.
const RETURN_REPRESENTATION: &str = "return=representation";

/// Ask PostgREST for an exact row count in `Content-Range`.
const COUNT_EXACT: &str = "count=exact";

// =============================================================================
// Configuration
// =============================================================================

/// Store client configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Project base URL, e.g. `https://xyz.supabase.co`
    pub url: String,
    /// Service-role key; bypasses row-level security
    pub service_key: String,
    /// Request timeout
    pub timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
}

impl StoreConfig {
    pub fn new(url: impl Into<String>, service_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            service_key: service_key.into(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(5),
        }
    }

    /// Create config from environment variables.
    pub fn from_env() -> StoreResult<Self> {
        let url = std::env::var("SUPABASE_URL")
            .or_else(|_| std::env::var("VITE_SUPABASE_URL"))
            .map_err(|_| StoreError::config("SUPABASE_URL must be set to reach the data store"))?;

        if url.trim().is_empty() {
            return Err(StoreError::config("SUPABASE_URL cannot be empty"));
        }

        let service_key = std::env::var("SUPABASE_SERVICE_ROLE_KEY")
            .map_err(|_| StoreError::config("SUPABASE_SERVICE_ROLE_KEY must be set"))?;

        let timeout_secs: u64 = std::env::var("STORE_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(30);

        let connect_timeout_secs: u64 = std::env::var("STORE_CONNECT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5);

        Ok(Self {
            url: url.trim().to_string(),
            service_key,
            timeout: Duration::from_secs(timeout_secs),
            connect_timeout: Duration::from_secs(connect_timeout_secs),
        })
    }
}

// =============================================================================
// Client
// =============================================================================

/// Data store client. Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct StoreClient {
    http: Client,
    rest_url: String,
    auth_url: String,
}

impl StoreClient {
    /// Create a new store client.
    pub fn new(config: StoreConfig) -> StoreResult<Self> {
        let key = HeaderValue::from_str(&config.service_key)
            .map_err(|_| StoreError::config("Service key contains invalid characters"))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", config.service_key))
            .map_err(|_| StoreError::config("Service key contains invalid characters"))?;

        let mut headers = HeaderMap::new();
        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);

        let http = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .user_agent(concat!("jobtoken-store/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(StoreError::Network)?;

        let base = config.url.trim_end_matches('/');

        Ok(Self {
            http,
            rest_url: format!("{}/rest/v1", base),
            auth_url: format!("{}/auth/v1", base),
        })
    }

    /// Create from environment variables.
    pub fn from_env() -> StoreResult<Self> {
        Self::new(StoreConfig::from_env()?)
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{}", self.rest_url, table)
    }

    pub(crate) fn rpc_url(&self, function: &str) -> String {
        format!("{}/rpc/{}", self.rest_url, function)
    }

    pub(crate) fn auth_admin_url(&self, path: &str) -> String {
        format!("{}/admin/{}", self.auth_url, path)
    }

    // =========================================================================
    // Table Operations
    // =========================================================================

    /// Select rows.
    pub async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &Query,
    ) -> StoreResult<Vec<T>> {
        let url = self.table_url(table);

        self.execute_request("select", table, async {
            let response = self.http.get(&url).query(&query.to_params()).send().await?;
            let response = Self::check_status(response).await?;
            let rows: Vec<T> = Self::decode(response).await?;
            record_rows(table, rows.len());
            Ok(rows)
        })
        .await
    }

    /// Select at most one row.
    pub async fn select_one<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &Query,
    ) -> StoreResult<Option<T>> {
        let rows: Vec<T> = self.select(table, &query.clone().limit(1)).await?;
        Ok(rows.into_iter().next())
    }

    /// Exact row count without transferring rows.
    pub async fn count(&self, table: &str, query: &Query) -> StoreResult<u64> {
        let url = self.table_url(table);

        self.execute_request("count", table, async {
            let response = self
                .http
                .head(&url)
                .header("Prefer", COUNT_EXACT)
                .query(&query.to_params())
                .send()
                .await?;
            let response = Self::check_status(response).await?;

            let range = response
                .headers()
                .get("content-range")
                .and_then(|v| v.to_str().ok())
                .ok_or_else(|| StoreError::InvalidResponse("missing Content-Range header".into()))?;

            parse_content_range_total(range).ok_or_else(|| {
                StoreError::InvalidResponse(format!("unparseable Content-Range: {}", range))
            })
        })
        .await
    }

    /// Insert one row and return what was written.
    pub async fn insert<B, T>(&self, table: &str, body: &B) -> StoreResult<Vec<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.table_url(table);

        self.execute_request("insert", table, async {
            let response = self
                .http
                .post(&url)
                .header("Prefer", RETURN_REPRESENTATION)
                .json(body)
                .send()
                .await?;
            let response = Self::check_status(response).await?;
            Self::decode(response).await
        })
        .await
    }

    /// Update the rows matching `query` and return them.
    ///
    /// An empty result means no row matched the filters; callers use this for
    /// compare-and-set writes.
    pub async fn update<B, T>(&self, table: &str, query: &Query, body: &B) -> StoreResult<Vec<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        if !query.has_filters() {
            return Err(StoreError::request_failed(format!(
                "Refusing unfiltered update on {}",
                table
            )));
        }

        let url = self.table_url(table);

        self.execute_request("update", table, async {
            let response = self
                .http
                .patch(&url)
                .header("Prefer", RETURN_REPRESENTATION)
                .query(&query.to_params())
                .json(body)
                .send()
                .await?;
            let response = Self::check_status(response).await?;
            Self::decode(response).await
        })
        .await
    }

    /// Delete the rows matching `query`.
    pub async fn delete(&self, table: &str, query: &Query) -> StoreResult<()> {
        if !query.has_filters() {
            return Err(StoreError::request_failed(format!(
                "Refusing unfiltered delete on {}",
                table
            )));
        }

        let url = self.table_url(table);

        self.execute_request("delete", table, async {
            let response = self.http.delete(&url).query(&query.to_params()).send().await?;
            Self::check_status(response).await?;
            debug!("Deleted rows from {}", table);
            Ok(())
        })
        .await
    }

    /// POST a JSON body and decode the JSON reply. Used for RPC and auth admin calls.
    pub(crate) async fn post_json<B, T>(
        &self,
        operation: &str,
        scope: &str,
        url: &str,
        body: &B,
    ) -> StoreResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute_request(operation, scope, async {
            let response = self.http.post(url).json(body).send().await?;
            let response = Self::check_status(response).await?;
            Self::decode(response).await
        })
        .await
    }

    /// Cheap round trip used by readiness probes.
    pub async fn health_check(&self) -> StoreResult<()> {
        let _: Vec<serde_json::Value> = self
            .select("profiles", &Query::new().select("id").limit(1))
            .await?;
        Ok(())
    }

    // =========================================================================
    // Internal Helpers
    // =========================================================================

    /// Execute a request with tracing and metrics.
    async fn execute_request<T, F>(&self, operation: &str, table: &str, fut: F) -> StoreResult<T>
    where
        F: std::future::Future<Output = StoreResult<T>>,
    {
        let span = info_span!("store_request", operation = %operation, table = %table);

        let start = Instant::now();
        let result = fut.instrument(span).await;
        let latency_ms = start.elapsed().as_millis() as f64;

        let status = match &result {
            Ok(_) => 200,
            Err(e) => e.http_status().unwrap_or(500),
        };
        record_request(operation, table, status, latency_ms);

        result
    }

    /// Read the body and decode it. A body that doesn't match `T` is a
    /// `Json` error, not a network one.
    async fn decode<T: DeserializeOwned>(response: Response) -> StoreResult<T> {
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn check_status(response: Response) -> StoreResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(StoreError::from_http_status(status.as_u16(), &body))
    }
}

/// Total from a `Content-Range` value such as `0-24/3573` or `*/0`.
pub(crate) fn parse_content_range_total(range: &str) -> Option<u64> {
    range.rsplit('/').next()?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_config_from_env_requires_url() {
        std::env::remove_var("SUPABASE_URL");
        std::env::remove_var("VITE_SUPABASE_URL");
        assert!(StoreConfig::from_env().is_err());
    }

    #[test]
    #[serial]
    fn test_config_accepts_vite_alias() {
        std::env::remove_var("SUPABASE_URL");
        std::env::set_var("VITE_SUPABASE_URL", "https://demo.supabase.co");
        std::env::set_var("SUPABASE_SERVICE_ROLE_KEY", "service-key");
        std::env::remove_var("STORE_CONNECT_TIMEOUT_SECS");

        let config = StoreConfig::from_env().unwrap();
        assert_eq!(config.url, "https://demo.supabase.co");
        assert_eq!(config.connect_timeout, Duration::from_secs(5));

        std::env::remove_var("VITE_SUPABASE_URL");
        std::env::remove_var("SUPABASE_SERVICE_ROLE_KEY");
    }

    #[test]
    fn test_parse_content_range() {
        assert_eq!(parse_content_range_total("0-24/3573"), Some(3573));
        assert_eq!(parse_content_range_total("*/0"), Some(0));
        assert_eq!(parse_content_range_total("0-24/*"), None);
    }

    #[test]
    fn test_urls_trim_trailing_slash() {
        let client = StoreClient::new(StoreConfig::new("https://demo.supabase.co/", "k")).unwrap();
        assert_eq!(client.table_url("jobs"), "https://demo.supabase.co/rest/v1/jobs");
        assert_eq!(
            client.rpc_url("apply_to_job"),
            "https://demo.supabase.co/rest/v1/rpc/apply_to_job"
        );
        assert_eq!(
            client.auth_admin_url("generate_link"),
            "https://demo.supabase.co/auth/v1/admin/generate_link"
        );
    }
}
