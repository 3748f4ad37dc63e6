//! API configuration.

use std::time::Duration;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Rate limit requests per second, per client IP
    pub rate_limit_rps: u32,
    /// Max request body size
    pub max_body_size: usize,
    /// Environment (development/production)
    pub environment: String,
    /// Public URL of the web app; magic links redirect here
    pub app_url: String,
    /// Simulated payment confirmation delay during top-up
    pub topup_delay: Duration,
    /// HS256 secret for verifying access tokens. Admin routes are open when unset.
    pub jwt_secret: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            cors_origins: vec!["*".to_string()],
            rate_limit_rps: 10,
            max_body_size: 1024 * 1024, // 1MB
            environment: "development".to_string(),
            app_url: "http://localhost:3000".to_string(),
            topup_delay: Duration::from_millis(1500),
            jwt_secret: None,
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(defaults.cors_origins),
            rate_limit_rps: std::env::var("RATE_LIMIT_RPS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.rate_limit_rps),
            max_body_size: std::env::var("MAX_BODY_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_body_size),
            environment: std::env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            app_url: std::env::var("APP_URL")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(defaults.app_url),
            topup_delay: std::env::var("TOPUP_DELAY_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.topup_delay),
            jwt_secret: std::env::var("SUPABASE_JWT_SECRET")
                .ok()
                .filter(|s| !s.trim().is_empty()),
        }
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }

    /// Where magic links land after sign-in.
    pub fn magic_link_redirect(&self) -> String {
        format!("{}/", self.app_url.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        for key in [
            "API_PORT",
            "TOPUP_DELAY_MS",
            "SUPABASE_JWT_SECRET",
            "APP_URL",
            "MAX_BODY_SIZE",
        ] {
            std::env::remove_var(key);
        }

        let config = ApiConfig::from_env();
        assert_eq!(config.port, 3000);
        assert_eq!(config.topup_delay, Duration::from_millis(1500));
        assert_eq!(config.max_body_size, 1024 * 1024);
        assert!(config.jwt_secret.is_none());
        assert_eq!(config.magic_link_redirect(), "http://localhost:3000/");
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        std::env::set_var("TOPUP_DELAY_MS", "0");
        std::env::set_var("APP_URL", "https://jobs.example.com/");
        std::env::set_var("SUPABASE_JWT_SECRET", "  ");

        let config = ApiConfig::from_env();
        assert_eq!(config.topup_delay, Duration::ZERO);
        assert_eq!(config.magic_link_redirect(), "https://jobs.example.com/");
        assert!(config.jwt_secret.is_none());

        std::env::remove_var("TOPUP_DELAY_MS");
        std::env::remove_var("APP_URL");
        std::env::remove_var("SUPABASE_JWT_SECRET");
    }
}
