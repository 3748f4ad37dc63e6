//! API integration tests.
//!
//! The router runs against wiremock servers standing in for the data store
//! and the email provider.

use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{body_json, body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use jobtoken_api::{create_router, ApiConfig, AppState};
use jobtoken_mail::{MailClient, MailConfig};
use jobtoken_store::{StoreClient, StoreConfig};

// =============================================================================
// Test Helpers
// =============================================================================

const JWT_SECRET: &str = "test-jwt-secret";

struct TestApp {
    store: MockServer,
    mail: MockServer,
    router: Router,
}

impl TestApp {
    async fn new() -> Self {
        Self::with_jwt_secret(None).await
    }

    async fn with_jwt_secret(jwt_secret: Option<&str>) -> Self {
        let store = MockServer::start().await;
        let mail = MockServer::start().await;

        let config = ApiConfig {
            topup_delay: Duration::ZERO,
            jwt_secret: jwt_secret.map(str::to_string),
            ..ApiConfig::default()
        };

        let store_client = StoreClient::new(StoreConfig::new(store.uri(), "service-key")).unwrap();
        let mut mail_config = MailConfig::new("re_test_key");
        mail_config.api_url = mail.uri();
        let mail_client = MailClient::new(mail_config).unwrap();

        let router = create_router(AppState::from_parts(config, store_client, mail_client), None);

        Self {
            store,
            mail,
            router,
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body.to_vec())
    }

    async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let (status, body) = self.send(request).await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let (status, body) = self.send(request).await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    async fn mount_mail(&self, expected_sends: u64) {
        Mock::given(method("POST"))
            .and(path("/emails"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "em_123" })))
            .expect(expected_sends)
            .mount(&self.mail)
            .await;
    }
}

fn wallet_row(balance: i64, expires_at: Option<DateTime<Utc>>) -> Value {
    json!({
        "id": "w1",
        "user_id": "u1",
        "token_balance": balance,
        "expires_at": expires_at,
    })
}

fn transaction_row(kind: &str, tokens: i64, reference: &str, created_at: DateTime<Utc>) -> Value {
    json!({
        "id": format!("t-{}", reference),
        "wallet_id": "w1",
        "tokens_added": tokens,
        "type": kind,
        "reference_id": reference,
        "created_at": created_at,
    })
}

fn application_row(status: &str) -> Value {
    json!({
        "id": "a1",
        "job_id": "j1",
        "user_id": "u1",
        "status": status,
        "notes": "Bring your certificates",
        "created_at": "2024-05-01T10:00:00+00:00",
        "updated_at": "2024-05-03T10:00:00+00:00",
        "jobs": { "title": "Line Cook" },
        "profiles": { "full_name": "Amina Njeri", "email": "amina@example.com" },
    })
}

fn job_row(id: &str, title: &str) -> Value {
    json!({
        "id": id,
        "title": title,
        "description": "Evening shifts",
        "job_type": "part-time",
        "token_cost": 1,
        "posted_by": "e1",
        "created_at": "2024-05-01T10:00:00+00:00",
    })
}

fn access_token(uid: &str) -> String {
    let claims = json!({
        "sub": uid,
        "aud": "authenticated",
        "role": "authenticated",
        "exp": Utc::now().timestamp() + 3600,
    });
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap()
}

async fn mount_profile(app: &TestApp, id: &str, role: &str) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/profiles"))
        .and(query_param("id", format!("eq.{}", id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": id,
            "email": format!("{}@example.com", id),
            "full_name": null,
            "role": role,
        }])))
        .mount(&app.store)
        .await;
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

// =============================================================================
// Top-up
// =============================================================================

#[tokio::test]
async fn test_topup_credits_bundle_and_resets_expiry() {
    let app = TestApp::new().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/wallets"))
        .and(query_param("user_id", "eq.u1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([wallet_row(3, None)])))
        .mount(&app.store)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/transactions"))
        .and(body_partial_json(json!({
            "wallet_id": "w1",
            "tokens_added": 5,
            "type": "topup",
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([transaction_row(
            "topup",
            5,
            "MPESA-TEST",
            Utc::now()
        )])))
        .expect(1)
        .mount(&app.store)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/wallets"))
        .and(query_param("id", "eq.w1"))
        .and(query_param("token_balance", "eq.3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([wallet_row(
            8,
            Some(Utc::now() + ChronoDuration::days(30))
        )])))
        .expect(1)
        .mount(&app.store)
        .await;

    let before = Utc::now();
    let (status, body) = app.post("/api/topup", json!({ "userId": "u1" })).await;
    let after = Utc::now();

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true, "newBalance": 8 }));

    let requests = app.store.received_requests().await.unwrap();
    let update = requests
        .iter()
        .find(|r| r.url.path() == "/rest/v1/wallets" && !r.body.is_empty())
        .unwrap();
    let written: Value = serde_json::from_slice(&update.body).unwrap();
    assert_eq!(written["token_balance"], 8);

    let expires_at: DateTime<Utc> = written["expires_at"].as_str().unwrap().parse().unwrap();
    assert!(expires_at >= before + ChronoDuration::days(30));
    assert!(expires_at <= after + ChronoDuration::days(30));
}

#[tokio::test]
async fn test_topup_retries_when_balance_moved() {
    let app = TestApp::new().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/wallets"))
        .and(query_param("user_id", "eq.u1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([wallet_row(3, None)])))
        .mount(&app.store)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/wallets"))
        .and(query_param("id", "eq.w1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([wallet_row(2, None)])))
        .mount(&app.store)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/transactions"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([transaction_row(
            "topup",
            5,
            "MPESA-TEST",
            Utc::now()
        )])))
        .expect(1)
        .mount(&app.store)
        .await;

    // A concurrent application spent a token between read and write
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/wallets"))
        .and(query_param("token_balance", "eq.3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&app.store)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/wallets"))
        .and(query_param("token_balance", "eq.2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([wallet_row(7, None)])))
        .expect(1)
        .mount(&app.store)
        .await;

    let (status, body) = app.post("/api/topup", json!({ "userId": "u1" })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["newBalance"], 7);
}

#[tokio::test]
async fn test_topup_without_wallet() {
    let app = TestApp::new().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/wallets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&app.store)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/transactions"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
        .expect(0)
        .mount(&app.store)
        .await;

    let (status, body) = app.post("/api/topup", json!({ "userId": "u1" })).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Wallet not found" }));
}

// =============================================================================
// Admin grant
// =============================================================================

async fn mount_grant_lookups(app: &TestApp, balance: i64) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/profiles"))
        .and(query_param("email", "eq.amina@example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": "u1",
            "email": "amina@example.com",
            "full_name": "Amina Njeri",
            "role": "seeker",
        }])))
        .mount(&app.store)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/wallets"))
        .and(query_param("user_id", "eq.u1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([wallet_row(balance, None)])))
        .mount(&app.store)
        .await;
}

#[tokio::test]
async fn test_grant_credits_exact_amount_and_logs_once() {
    let app = TestApp::new().await;
    mount_grant_lookups(&app, 3).await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/wallets"))
        .and(query_param("token_balance", "eq.3"))
        .and(body_json(json!({ "token_balance": 13 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([wallet_row(13, None)])))
        .expect(1)
        .mount(&app.store)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/transactions"))
        .and(body_partial_json(json!({
            "wallet_id": "w1",
            "tokens_added": 10,
            "type": "admin_grant",
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([transaction_row(
            "admin_grant",
            10,
            "ADMIN-TEST",
            Utc::now()
        )])))
        .expect(1)
        .mount(&app.store)
        .await;

    let (status, body) = app
        .post(
            "/api/admin/tokens/grant",
            json!({ "email": "amina@example.com", "amount": 10 }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true }));
}

#[tokio::test]
async fn test_grant_rejects_overdraw() {
    let app = TestApp::new().await;
    mount_grant_lookups(&app, 3).await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/wallets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&app.store)
        .await;

    let (status, _) = app
        .post(
            "/api/admin/tokens/grant",
            json!({ "email": "amina@example.com", "amount": -5 }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_grant_validates_input() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post("/api/admin/tokens/grant", json!({ "amount": 10 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Email is required" }));

    let (status, _) = app
        .post(
            "/api/admin/tokens/grant",
            json!({ "email": "amina@example.com", "amount": 0 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(app.store.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_grant_unknown_user() {
    let app = TestApp::new().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/profiles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&app.store)
        .await;

    let (status, body) = app
        .post(
            "/api/admin/tokens/grant",
            json!({ "email": "ghost@example.com", "amount": 5 }),
        )
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "User not found" }));
}

// =============================================================================
// Application status
// =============================================================================

async fn mount_status_update(app: &TestApp, status: &str) {
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/applications"))
        .and(query_param("id", "eq.a1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([application_row(status)])))
        .expect(1)
        .mount(&app.store)
        .await;
}

#[tokio::test]
async fn test_shortlisting_emails_applicant() {
    let app = TestApp::new().await;
    mount_status_update(&app, "shortlisted").await;
    app.mount_mail(1).await;

    let (status, body) = app
        .post(
            "/api/applications/update-status",
            json!({
                "applicationId": "a1",
                "status": "shortlisted",
                "notes": "Bring your certificates",
            }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true }));

    let sent = app.mail.received_requests().await.unwrap();
    let email: Value = serde_json::from_slice(&sent[0].body).unwrap();
    assert_eq!(email["to"], json!(["amina@example.com"]));
    assert!(email["html"].as_str().unwrap().contains("Line Cook"));
}

#[tokio::test]
async fn test_rejection_emails_applicant() {
    let app = TestApp::new().await;
    mount_status_update(&app, "rejected").await;
    app.mount_mail(1).await;

    let (status, _) = app
        .post(
            "/api/applications/update-status",
            json!({ "applicationId": "a1", "status": "rejected" }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_other_status_sends_no_email() {
    let app = TestApp::new().await;
    mount_status_update(&app, "pending").await;
    app.mount_mail(0).await;

    let (status, body) = app
        .post(
            "/api/applications/update-status",
            json!({ "applicationId": "a1", "status": "pending" }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true }));
}

#[tokio::test]
async fn test_status_is_written_as_given() {
    let app = TestApp::new().await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/applications"))
        .and(query_param("id", "eq.a1"))
        .and(body_json(json!({ "status": " shortlisted " })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([application_row(" shortlisted ")])),
        )
        .expect(1)
        .mount(&app.store)
        .await;
    app.mount_mail(0).await;

    let (status, body) = app
        .post(
            "/api/applications/update-status",
            json!({ "applicationId": "a1", "status": " shortlisted " }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true }));
}

#[tokio::test]
async fn test_status_update_rejects_blank_status() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post(
            "/api/applications/update-status",
            json!({ "applicationId": "a1", "status": "   " }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Missing applicationId or status" }));
    assert!(app.store.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_status_update_requires_fields() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post("/api/applications/update-status", json!({ "applicationId": "a1" }))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Missing applicationId or status" }));
}

// =============================================================================
// Verification email
// =============================================================================

#[tokio::test]
async fn test_resend_verification_requires_email() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post("/api/auth/resend-verification", json!({ "email": "  " }))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Email is required" }));
}

#[tokio::test]
async fn test_resend_verification_sends_magic_link() {
    let app = TestApp::new().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/admin/generate_link"))
        .and(body_partial_json(json!({
            "type": "magiclink",
            "email": "amina@example.com",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "properties": { "action_link": "https://auth.example.com/verify?token=abc" }
        })))
        .expect(1)
        .mount(&app.store)
        .await;
    app.mount_mail(1).await;

    let (status, body) = app
        .post(
            "/api/auth/resend-verification",
            json!({ "email": "amina@example.com" }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "success": true, "message": "Verification email sent" })
    );

    let sent = app.mail.received_requests().await.unwrap();
    let email: Value = serde_json::from_slice(&sent[0].body).unwrap();
    assert!(email["html"]
        .as_str()
        .unwrap()
        .contains("https://auth.example.com/verify?token=abc"));
}

#[tokio::test]
async fn test_application_confirmation_tolerates_missing_job() {
    let app = TestApp::new().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/jobs"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&app.store)
        .await;
    app.mount_mail(1).await;

    let (status, body) = app
        .post(
            "/api/auth/resend-verification",
            json!({
                "email": "amina@example.com",
                "type": "application_confirmation",
                "jobId": "j1",
            }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true }));

    let sent = app.mail.received_requests().await.unwrap();
    let email: Value = serde_json::from_slice(&sent[0].body).unwrap();
    assert_eq!(email["subject"], "Application Confirmed: New Job");
}

// =============================================================================
// Applying
// =============================================================================

#[tokio::test]
async fn test_apply_with_expired_wallet() {
    let app = TestApp::new().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/wallets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([wallet_row(
            4,
            Some(Utc::now() - ChronoDuration::days(1))
        )])))
        .mount(&app.store)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/apply_to_job"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(0)
        .mount(&app.store)
        .await;

    let (status, body) = app
        .post("/api/jobs/apply", json!({ "jobId": "j1", "userId": "u1" }))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({ "error": "Your tokens have expired. Please top up to reactivate." })
    );
}

#[tokio::test]
async fn test_apply_surfaces_procedure_error() {
    let app = TestApp::new().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/wallets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([wallet_row(0, None)])))
        .mount(&app.store)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/apply_to_job"))
        .and(body_json(json!({ "p_job_id": "j1", "p_user_id": "u1" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "success": false, "error": "Insufficient tokens" })),
        )
        .expect(1)
        .mount(&app.store)
        .await;

    let (status, body) = app
        .post("/api/jobs/apply", json!({ "jobId": "j1", "userId": "u1" }))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Insufficient tokens" }));
}

async fn mount_apply_success(app: &TestApp) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/wallets"))
        .and(query_param("user_id", "eq.u1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([wallet_row(
            4,
            Some(Utc::now() + ChronoDuration::days(10))
        )])))
        .mount(&app.store)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/apply_to_job"))
        .and(body_json(json!({ "p_job_id": "j1", "p_user_id": "u1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&app.store)
        .await;
}

#[tokio::test]
async fn test_apply_sends_confirmation_in_background() {
    let app = TestApp::new().await;
    mount_apply_success(&app).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/jobs"))
        .and(query_param("id", "eq.j1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{ "title": "Line Cook" }])),
        )
        .mount(&app.store)
        .await;
    app.mount_mail(1).await;

    let (status, body) = app
        .post(
            "/api/jobs/apply",
            json!({ "jobId": "j1", "userId": "u1", "email": "amina@example.com" }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true }));

    let mut sent = Vec::new();
    for _ in 0..100 {
        sent = app.mail.received_requests().await.unwrap();
        if !sent.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    assert_eq!(sent.len(), 1);
    let email: Value = serde_json::from_slice(&sent[0].body).unwrap();
    assert_eq!(email["to"], json!(["amina@example.com"]));
    assert_eq!(email["subject"], "Application Confirmed: Line Cook");
}

#[tokio::test]
async fn test_apply_without_email_sends_nothing() {
    let app = TestApp::new().await;
    mount_apply_success(&app).await;
    app.mount_mail(0).await;

    let (status, body) = app
        .post("/api/jobs/apply", json!({ "jobId": "j1", "userId": "u1" }))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true }));

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(app.mail.received_requests().await.unwrap().is_empty());
}

// =============================================================================
// Seeker and employer views
// =============================================================================

#[tokio::test]
async fn test_wallet_reports_expiry() {
    let app = TestApp::new().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/wallets"))
        .and(query_param("user_id", "eq.u1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([wallet_row(
            6,
            Some(Utc::now() - ChronoDuration::hours(1))
        )])))
        .mount(&app.store)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/wallets"))
        .and(query_param("user_id", "eq.u2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([wallet_row(
            2,
            Some(Utc::now() + ChronoDuration::days(3))
        )])))
        .mount(&app.store)
        .await;

    let (status, body) = app.get("/api/wallet?userId=u1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_balance"], 6);
    assert_eq!(body["expired"], true);

    let (status, body) = app.get("/api/wallet?userId=u2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_balance"], 2);
    assert_eq!(body["expired"], false);
}

#[tokio::test]
async fn test_seeker_stats_sums_spent_tokens() {
    let app = TestApp::new().await;

    Mock::given(method("HEAD"))
        .and(path("/rest/v1/applications"))
        .and(query_param("user_id", "eq.u1"))
        .respond_with(ResponseTemplate::new(200).insert_header("Content-Range", "*/4"))
        .mount(&app.store)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/wallets"))
        .and(query_param("user_id", "eq.u1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([wallet_row(1, None)])))
        .mount(&app.store)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/transactions"))
        .and(query_param("wallet_id", "eq.w1"))
        .and(query_param("type", "eq.deduction"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "tokens_added": -2 },
            { "tokens_added": -3 },
        ])))
        .mount(&app.store)
        .await;

    let (status, body) = app.get("/api/seeker/stats?userId=u1").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "applications": 4, "spent": 5 }));
}

#[tokio::test]
async fn test_employer_applications_flatten_parties() {
    let app = TestApp::new().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/applications"))
        .and(query_param("jobs.posted_by", "eq.e1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([application_row(
            "shortlisted"
        )])))
        .expect(1)
        .mount(&app.store)
        .await;

    let (status, body) = app.get("/api/employer/applications?employerId=e1").await;

    assert_eq!(status, StatusCode::OK);
    let row = &body[0];
    assert_eq!(row["id"], "a1");
    assert_eq!(row["status"], "shortlisted");
    assert_eq!(row["notes"], "Bring your certificates");
    assert_eq!(row["job_title"], "Line Cook");
    assert_eq!(row["applicant_name"], "Amina Njeri");
    assert_eq!(row["applicant_email"], "amina@example.com");
}

#[tokio::test]
async fn test_employer_jobs_count_applications() {
    let app = TestApp::new().await;

    let mut with_applicants = job_row("j1", "Line Cook");
    with_applicants["applications"] = json!([{ "count": 3 }]);
    let mut without_applicants = job_row("j2", "Barista");
    without_applicants["applications"] = json!([]);

    Mock::given(method("GET"))
        .and(path("/rest/v1/jobs"))
        .and(query_param("posted_by", "eq.e1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([with_applicants, without_applicants])),
        )
        .mount(&app.store)
        .await;

    let (status, body) = app.get("/api/employer/jobs?employerId=e1").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["title"], "Line Cook");
    assert_eq!(body[0]["applications_count"], 3);
    assert!(body[0].get("applications").is_none());
    assert_eq!(body[1]["applications_count"], 0);
}

#[tokio::test]
async fn test_create_job_defaults_token_cost() {
    let app = TestApp::new().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/jobs"))
        .and(body_json(json!({
            "title": "Barista",
            "description": "Evening shifts",
            "job_type": "part-time",
            "token_cost": 1,
            "posted_by": "e1",
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([job_row("j9", "Barista")])))
        .expect(1)
        .mount(&app.store)
        .await;

    let (status, body) = app
        .post(
            "/api/jobs",
            json!({
                "postedBy": "e1",
                "title": " Barista ",
                "description": "Evening shifts",
                "jobType": "part-time",
            }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], "j9");
    assert_eq!(body["token_cost"], 1);
}

#[tokio::test]
async fn test_create_job_validates_input() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post(
            "/api/jobs",
            json!({ "postedBy": "e1", "title": "Chef", "jobType": "full-time", "tokenCost": 0 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("Token cost must be at least 1"));

    let (status, body) = app
        .post("/api/jobs", json!({ "title": "Chef", "jobType": "full-time" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "postedBy is required" }));

    assert!(app.store.received_requests().await.unwrap().is_empty());
}

// =============================================================================
// Admin dashboard
// =============================================================================

#[tokio::test]
async fn test_export_csv_keeps_last_30_days_newest_first() {
    let app = TestApp::new().await;
    let now = Utc::now();

    let mut recent = transaction_row("topup", 5, "MPESA-NEW", now - ChronoDuration::hours(2));
    recent["wallet"] = json!({ "profiles": { "email": "amina@example.com" } });
    let mut older = transaction_row("admin_grant", 10, "ADMIN-OLD", now - ChronoDuration::days(1));
    older["wallet"] = Value::Null;
    let stale = transaction_row("topup", 5, "MPESA-STALE", now - ChronoDuration::days(40));

    Mock::given(method("GET"))
        .and(path("/rest/v1/transactions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([older, stale, recent])))
        .mount(&app.store)
        .await;

    let request = Request::builder()
        .uri("/api/admin/export-csv")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/csv");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=financial_log.csv"
    );

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let csv = String::from_utf8(body.to_vec()).unwrap();
    let lines: Vec<&str> = csv.lines().collect();

    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "Date,User Email,Tokens,Type,Reference ID");
    assert!(lines[1].ends_with(",amina@example.com,5,topup,MPESA-NEW"));
    assert!(lines[2].ends_with(",N/A,10,admin_grant,ADMIN-OLD"));
}

#[tokio::test]
async fn test_global_search_ignores_short_queries() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/api/admin/global-search?query=%20ab%20").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "transactions": [], "profiles": [] }));
    assert!(app.store.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_global_search_matches_references_and_emails() {
    let app = TestApp::new().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/transactions"))
        .and(query_param("reference_id", "ilike.*amina*"))
        .and(query_param("limit", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&app.store)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/profiles"))
        .and(query_param("email", "ilike.*amina*"))
        .and(query_param("limit", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": "u1",
            "email": "amina@example.com",
            "full_name": "Amina Njeri",
            "role": "seeker",
        }])))
        .expect(1)
        .mount(&app.store)
        .await;

    let (status, body) = app.get("/api/admin/global-search?query=amina").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["transactions"], json!([]));
    assert_eq!(body["profiles"][0]["email"], "amina@example.com");
}

#[tokio::test]
async fn test_stats_counts() {
    let app = TestApp::new().await;

    let count = |total: u64| {
        ResponseTemplate::new(200)
            .insert_header("Content-Range", format!("*/{}", total).as_str())
    };

    Mock::given(method("HEAD"))
        .and(path("/rest/v1/transactions"))
        .and(query_param("type", "eq.topup"))
        .respond_with(count(7))
        .mount(&app.store)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/rest/v1/profiles"))
        .and(query_param("role", "eq.seeker"))
        .respond_with(count(12))
        .mount(&app.store)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/rest/v1/profiles"))
        .and(query_param("role", "eq.employer"))
        .respond_with(count(3))
        .mount(&app.store)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/rest/v1/applications"))
        .respond_with(count(20))
        .mount(&app.store)
        .await;

    let (status, body) = app.get("/api/admin/stats").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "total_revenue": 700,
            "active_seekers": 12,
            "registered_employers": 3,
            "total_applications": 20,
        })
    );
}

#[tokio::test]
async fn test_analytics_report_falls_back_to_jobs() {
    let app = TestApp::new().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/admin_analytics_report"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "message": "relation \"public.admin_analytics_report\" does not exist"
        })))
        .mount(&app.store)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/jobs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": "j1",
            "title": "Line Cook",
            "job_type": "full-time",
            "created_at": "2024-05-01T10:00:00+00:00",
            "profiles": { "full_name": "Mama Oliech Restaurant" },
            "applications": [{ "count": 4 }],
        }])))
        .mount(&app.store)
        .await;

    let (status, body) = app.get("/api/admin/analytics-report").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["category"], "full-time");
    assert_eq!(body[0]["employer"], "Mama Oliech Restaurant");
    assert_eq!(body[0]["applicant_count"], 4);
}

// =============================================================================
// Admin guard
// =============================================================================

#[tokio::test]
async fn test_admin_routes_require_token_when_secret_configured() {
    let app = TestApp::with_jwt_secret(Some(JWT_SECRET)).await;

    let (status, body) = app.get("/api/admin/global-search?query=ab").await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_admin_routes_reject_non_admins() {
    let app = TestApp::with_jwt_secret(Some(JWT_SECRET)).await;
    mount_profile(&app, "u2", "employer").await;

    let request = Request::builder()
        .uri("/api/admin/global-search?query=ab")
        .header(header::AUTHORIZATION, format!("Bearer {}", access_token("u2")))
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.send(request).await;
    let body: Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, json!({ "error": "Admin access required" }));
}

#[tokio::test]
async fn test_admin_routes_admit_admins() {
    let app = TestApp::with_jwt_secret(Some(JWT_SECRET)).await;
    mount_profile(&app, "admin1", "admin").await;

    let request = Request::builder()
        .uri("/api/admin/global-search?query=ab")
        .header(header::AUTHORIZATION, format!("Bearer {}", access_token("admin1")))
        .body(Body::empty())
        .unwrap();
    let (status, _) = app.send(request).await;

    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_public_routes_ignore_admin_guard() {
    let app = TestApp::with_jwt_secret(Some(JWT_SECRET)).await;

    let (status, body) = app
        .post("/api/auth/resend-verification", json!({}))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Email is required" }));
}
