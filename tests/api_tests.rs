use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use std::sync::Arc;
use tower::ServiceExt;

use spesa::api;
use spesa::clients::google::GoogleTokenClient;
use spesa::config::Config;
use spesa::db::Store;
use spesa::models::account::{Account, Role};
use spesa::services::{IdentityVerifier, LogEmailService};

/// Bootstrap admin credential seeded by the initial migration
const ADMIN_EMAIL: &str = "admin@example.com";
const ADMIN_PASSWORD: &str = "Admin123*";

const JWT_SECRET: &str = "test-secret-key-minimum-32-characters-long";

fn test_config() -> Config {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.auth.jwt_secret = JWT_SECRET.to_string();
    config.auth.google_client_id = "test-client-id".to_string();
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;
    config
}

async fn spawn_app() -> Router {
    spawn_app_with_identity(Arc::new(GoogleTokenClient::new())).await
}

async fn spawn_app_with_identity(identity: Arc<dyn IdentityVerifier>) -> Router {
    let store = Store::with_pool_options("sqlite::memory:", 1, 1)
        .await
        .expect("Failed to create in-memory store");

    let state = api::create_app_state_with_collaborators(
        test_config(),
        store,
        Arc::new(LogEmailService),
        identity,
    )
    .expect("Failed to create app state");

    api::router(state)
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", mime::APPLICATION_JSON.as_ref())
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn admin_token(app: &Router) -> String {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            serde_json::json!({"email": ADMIN_EMAIL, "password": ADMIN_PASSWORD}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    body["data"]["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = spawn_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["status"], "ok");
}

#[tokio::test]
async fn test_admin_routes_require_valid_admin_token() {
    let app = spawn_app().await;

    // No token
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/accounts")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Garbage token
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/accounts")
                .header("Authorization", "Bearer not-a-real-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Valid signature, non-admin role
    let user_account = Account {
        id: 42,
        external_id: "u42".to_string(),
        first_name: "Plain".to_string(),
        surname: "User".to_string(),
        email: "plain@x.com".to_string(),
        password_hash: String::new(),
        role: Role::User,
        enabled: true,
        email_verified: true,
        is_first_login: false,
        verification_token: None,
        reset_token: None,
        google_id: None,
        profile_image: None,
        created_at: String::new(),
        updated_at: String::new(),
    };
    let user_token =
        spesa::services::token::issue_session_token(&user_account, JWT_SECRET).unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/accounts")
                .header("Authorization", format!("Bearer {user_token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // The seeded admin gets through
    let token = admin_token(&app).await;
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/accounts")
                .header("Authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    let emails: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["email"].as_str().unwrap())
        .collect();
    assert!(emails.contains(&ADMIN_EMAIL));
}

#[tokio::test]
async fn test_login_rejects_wrong_password_with_generic_message() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            serde_json::json!({"email": ADMIN_EMAIL, "password": "wrong"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Invalid credentials");

    // Unknown email gets the identical wire response
    let response = app
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            serde_json::json!({"email": "ghost@x.com", "password": "wrong"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Invalid credentials");
}

#[tokio::test]
async fn test_registration_and_verification_flow() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            serde_json::json!({
                "external_id": "u1",
                "first_name": "Ada",
                "surname": "Lovelace",
                "email": "A@X.com",
                "role": "User"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    let account_id = body["data"]["id"].as_i64().unwrap();
    assert_eq!(body["data"]["email"], "a@x.com");
    assert_eq!(body["data"]["enabled"], false);
    assert_eq!(body["data"]["is_first_login"], true);
    // The response never leaks tokens or hashes
    assert!(body["data"].get("verification_token").is_none());
    assert!(body["data"].get("password_hash").is_none());

    // Duplicate registration conflicts
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            serde_json::json!({
                "external_id": "u2",
                "first_name": "Ada",
                "surname": "Lovelace",
                "email": "a@x.com",
                "role": "User"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Unknown role names are rejected at the boundary
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            serde_json::json!({
                "external_id": "u3",
                "first_name": "Bad",
                "surname": "Role",
                "email": "c@x.com",
                "role": "Superuser"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // The pending queue (admin-only) exposes the verification token
    let token = admin_token(&app).await;
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/accounts/pending")
                .header("Authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let pending = body["data"].as_array().unwrap();
    assert_eq!(pending.len(), 1);
    let verification_token = pending[0]["verification_token"].as_str().unwrap().to_string();

    // Approve through the emailed-link endpoint
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/verify",
            serde_json::json!({
                "user_id": account_id,
                "token": verification_token,
                "approve": true
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The consumed token cannot be replayed
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/verify",
            serde_json::json!({
                "user_id": account_id,
                "token": verification_token,
                "approve": true
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Queue drained
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/accounts/pending")
                .header("Authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = json_body(response).await;
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_password_reset_request_is_indistinguishable() {
    let app = spawn_app().await;

    let known = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/password-reset/request",
            serde_json::json!({"email": ADMIN_EMAIL}),
        ))
        .await
        .unwrap();
    let unknown = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/password-reset/request",
            serde_json::json!({"email": "nobody@x.com"}),
        ))
        .await
        .unwrap();

    assert_eq!(known.status(), StatusCode::OK);
    assert_eq!(unknown.status(), StatusCode::OK);

    let known_body = json_body(known).await;
    let unknown_body = json_body(unknown).await;
    assert_eq!(known_body, unknown_body);
}

#[tokio::test]
async fn test_complete_reset_enforces_password_rules() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/password-reset/complete",
            serde_json::json!({
                "user_id": 1,
                "token": "whatever",
                "new_password": "weak"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Strong password but bogus token: still a 400, without revealing why
    let response = app
        .oneshot(json_request(
            "POST",
            "/api/auth/password-reset/complete",
            serde_json::json!({
                "user_id": 1,
                "token": "bogus-token",
                "new_password": "Strong-Pass1!"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_google_login_with_unreachable_provider_is_bad_gateway() {
    // Point the verifier at a port nothing listens on
    let identity = Arc::new(GoogleTokenClient::with_base_url("http://127.0.0.1:1"));
    let app = spawn_app_with_identity(identity).await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/auth/google",
            serde_json::json!({"id_token": "some-token"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_account_update_and_delete_via_api() {
    let app = spawn_app().await;
    let token = admin_token(&app).await;

    // Create a pending account to manage
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            serde_json::json!({
                "external_id": "u1",
                "first_name": "Ada",
                "surname": "Lovelace",
                "email": "a@x.com",
                "role": "User"
            }),
        ))
        .await
        .unwrap();
    let account_id = json_body(response).await["data"]["id"].as_i64().unwrap();

    // Update role and name
    let mut request = json_request(
        "PUT",
        &format!("/api/accounts/{account_id}"),
        serde_json::json!({"first_name": "Renamed", "role": "Manager"}),
    );
    request
        .headers_mut()
        .insert("Authorization", format!("Bearer {token}").parse().unwrap());
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["first_name"], "Renamed");
    assert_eq!(body["data"]["role"], "Manager");

    // Delete, then the lookup 404s
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/accounts/{account_id}"))
                .header("Authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/accounts/{account_id}"))
                .header("Authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
