//! Supabase access token authentication.
//!
//! Tokens are HS256 JWTs signed with the project's JWT secret. Admin routes
//! additionally require the caller's profile to carry the `admin` role.

use axum::body::Body;
use axum::extract::{FromRequestParts, State};
use axum::http::request::Parts;
use axum::http::{HeaderMap, Request};
use axum::middleware::Next;
use axum::response::Response;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Audience of tokens issued to signed-in users.
const AUTHENTICATED_AUDIENCE: &str = "authenticated";

/// Decoded access token claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupabaseClaims {
    /// User ID
    pub sub: String,
    /// Email (if available)
    #[serde(default)]
    pub email: Option<String>,
    /// Postgres role the token maps to
    #[serde(default)]
    pub role: Option<String>,
    /// Expiration
    pub exp: i64,
}

/// Authenticated user extracted from request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub uid: String,
    pub email: Option<String>,
}

impl From<SupabaseClaims> for AuthUser {
    fn from(claims: SupabaseClaims) -> Self {
        Self {
            uid: claims.sub,
            email: claims.email,
        }
    }
}

/// Verify an access token against the project secret.
pub fn verify_token(secret: &str, token: &str) -> ApiResult<SupabaseClaims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[AUTHENTICATED_AUDIENCE]);

    decode::<SupabaseClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| ApiError::unauthorized(format!("Token validation failed: {}", e)))
}

fn bearer_token(headers: &HeaderMap) -> ApiResult<&str> {
    let auth_header = headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::unauthorized("Missing Authorization header"))?;

    auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::unauthorized("Invalid Authorization header format"))
}

fn authenticate(state: &AppState, headers: &HeaderMap) -> ApiResult<AuthUser> {
    let secret = state
        .config
        .jwt_secret
        .as_deref()
        .ok_or_else(|| ApiError::unauthorized("Authentication is not configured"))?;

    let token = bearer_token(headers)?;
    Ok(AuthUser::from(verify_token(secret, token)?))
}

/// Axum extractor for authenticated user.
#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }
        authenticate(state, &parts.headers)
    }
}

/// Gate for `/api/admin/*`.
///
/// Open when no JWT secret is configured; otherwise requires a valid token
/// whose profile role is admin.
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    if state.config.jwt_secret.is_none() {
        return Ok(next.run(request).await);
    }

    let user = authenticate(&state, request.headers())?;

    let profile = state.profiles().get(&user.uid).await?;
    match profile {
        Some(profile) if profile.is_admin() => {
            debug!(uid = %user.uid, "Admin access granted");
        }
        _ => {
            warn!(uid = %user.uid, path = %request.uri().path(), "Admin access denied");
            return Err(ApiError::forbidden("Admin access required"));
        }
    }

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use tokio_test::{assert_err, assert_ok};

    fn token(secret: &str, aud: &str, exp_offset: i64) -> String {
        let claims = serde_json::json!({
            "sub": "u1",
            "email": "admin@example.com",
            "aud": aud,
            "role": "authenticated",
            "exp": chrono::Utc::now().timestamp() + exp_offset,
        });
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_verify_token() {
        let claims = assert_ok!(verify_token("secret", &token("secret", "authenticated", 3600)));
        assert_eq!(claims.sub, "u1");
        assert_eq!(claims.email.as_deref(), Some("admin@example.com"));
    }

    #[test]
    fn test_verify_token_rejects_bad_tokens() {
        assert_err!(verify_token("secret", &token("other", "authenticated", 3600)));
        assert_err!(verify_token("secret", &token("secret", "anon", 3600)));
        assert_err!(verify_token("secret", &token("secret", "authenticated", -3600)));
        assert_err!(verify_token("secret", "not-a-jwt"));
    }

    #[test]
    fn test_bearer_token() {
        let mut headers = HeaderMap::new();
        assert_err!(bearer_token(&headers));

        headers.insert("Authorization", "Token abc".parse().unwrap());
        assert_err!(bearer_token(&headers));

        headers.insert("Authorization", "Bearer abc".parse().unwrap());
        assert_eq!(bearer_token(&headers).unwrap(), "abc");
    }
}
