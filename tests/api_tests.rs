//! End-to-end tests for the admin HTTP API.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use tower::ServiceExt;
use warden::config::Config;

/// Bootstrap token seeded by migration (must match m20240101_initial.rs)
const BOOTSTRAP_TOKEN: &str = "warden_bootstrap_admin_token_please_rotate";

async fn spawn_app() -> Router {
    let db_path = std::env::temp_dir().join(format!("warden-api-{}.db", uuid::Uuid::new_v4()));

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", db_path.display());
    // Keep test user creation fast
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;

    let state = warden::api::create_app_state_from_config(config)
        .await
        .expect("failed to create app state");
    warden::api::router(state).await
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header("X-Api-Key", token);
    }
    builder.body(Body::empty()).unwrap()
}

fn send_json(method: &str, uri: &str, token: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("X-Api-Key", token)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn auth_is_required_and_bootstrap_token_works() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(get("/api/system/status", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(get("/api/system/status", Some("wrong-token")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(get("/api/system/status", Some(BOOTSTRAP_TOKEN)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["database_ok"], true);

    // Bearer works the same as X-Api-Key
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/system/status")
                .header("Authorization", format!("Bearer {BOOTSTRAP_TOKEN}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn user_lifecycle_over_http() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(send_json(
            "POST",
            "/api/users",
            BOOTSTRAP_TOKEN,
            serde_json::json!({
                "username": "alice",
                "password": "correct-horse-battery",
                "email": "alice@example.com",
                "role": "user",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    let user_id = body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["username"], "alice");
    assert_eq!(body["data"]["status"]["state"], "active");

    // Duplicate username conflicts
    let response = app
        .clone()
        .oneshot(send_json(
            "POST",
            "/api/users",
            BOOTSTRAP_TOKEN,
            serde_json::json!({
                "username": "alice",
                "password": "correct-horse-battery",
                "role": "viewer",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Suspend, then check the tagged status in the snapshot
    let response = app
        .clone()
        .oneshot(send_json(
            "POST",
            &format!("/api/users/{user_id}/suspend"),
            BOOTSTRAP_TOKEN,
            serde_json::json!({ "reason": "policy violation" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["status"]["state"], "suspended");
    assert_eq!(body["data"]["status"]["suspended_by"], "user_system");

    // Suspending again conflicts
    let response = app
        .clone()
        .oneshot(send_json(
            "POST",
            &format!("/api/users/{user_id}/suspend"),
            BOOTSTRAP_TOKEN,
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Role change with an unknown role is a validation error
    let response = app
        .clone()
        .oneshot(send_json(
            "PUT",
            &format!("/api/users/{user_id}/role"),
            BOOTSTRAP_TOKEN,
            serde_json::json!({ "role": "superuser" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(send_json(
            "PUT",
            &format!("/api/users/{user_id}/role"),
            BOOTSTRAP_TOKEN,
            serde_json::json!({ "role": "viewer" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The audit trail is visible over HTTP
    let response = app
        .clone()
        .oneshot(get(&format!("/api/users/{user_id}/audit"), Some(BOOTSTRAP_TOKEN)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let operations: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["operation"].as_str().unwrap())
        .collect();
    assert!(operations.contains(&"create"));
    assert!(operations.contains(&"suspend"));
    assert!(operations.contains(&"role_change"));
}

#[tokio::test]
async fn delete_cascade_over_http() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(send_json(
            "POST",
            "/api/users",
            BOOTSTRAP_TOKEN,
            serde_json::json!({
                "username": "bob",
                "password": "correct-horse-battery",
                "role": "user",
            }),
        ))
        .await
        .unwrap();
    let user_id = json_body(response).await["data"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    // One agent and one token owned by the user
    let response = app
        .clone()
        .oneshot(send_json(
            "POST",
            "/api/agents",
            BOOTSTRAP_TOKEN,
            serde_json::json!({
                "name": "worker",
                "owner_id": user_id,
                "budget": 25.0,
                "providers": ["openai"],
                "tags": ["batch"],
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let agent_id = json_body(response).await["data"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .clone()
        .oneshot(send_json(
            "POST",
            "/api/tokens",
            BOOTSTRAP_TOKEN,
            serde_json::json!({ "name": "cli", "owner_user_id": user_id }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    // The secret is present at issue time
    assert!(body["data"]["token"].as_str().unwrap().len() == 64);

    let response = app
        .clone()
        .oneshot(send_json(
            "POST",
            "/api/budget-requests",
            BOOTSTRAP_TOKEN,
            serde_json::json!({
                "requester_id": user_id,
                "agent_id": agent_id,
                "amount": 10.0,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Delete and inspect the composite outcome
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/users/{user_id}"))
                .header("X-Api-Key", BOOTSTRAP_TOKEN)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["data"]["user"]["status"]["state"], "deleted");
    assert_eq!(body["data"]["reassignment"]["agents_reassigned"], 1);
    assert_eq!(body["data"]["reassignment"]["budget_requests_cancelled"], 1);
    assert_eq!(body["data"]["reassignment"]["api_tokens_revoked"], 1);

    // The agent is now in the orphaned project under the system owner
    let response = app
        .clone()
        .oneshot(get(&format!("/api/agents/{agent_id}"), Some(BOOTSTRAP_TOKEN)))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["data"]["owner_id"], "user_system");
    assert_eq!(body["data"]["project_id"], "proj_orphaned");
    let tags = body["data"]["tags"].as_array().unwrap();
    assert!(tags.iter().any(|t| t == "orphaned"));
    assert!(tags.iter().any(|t| t == &format!("original-owner:{user_id}")));

    // A retried delete is a 404
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/users/{user_id}"))
                .header("X-Api-Key", BOOTSTRAP_TOKEN)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn guard_violations_map_to_http_statuses() {
    let app = spawn_app().await;

    // Self delete (the bootstrap token acts as user_system)
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/users/user_system")
                .header("X-Api-Key", BOOTSTRAP_TOKEN)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Deleting the last active admin conflicts even for a different actor
    let response = app
        .clone()
        .oneshot(send_json(
            "POST",
            "/api/users",
            BOOTSTRAP_TOKEN,
            serde_json::json!({
                "username": "second-admin",
                "password": "correct-horse-battery",
                "role": "admin",
            }),
        ))
        .await
        .unwrap();
    let admin_id = json_body(response).await["data"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .clone()
        .oneshot(send_json(
            "POST",
            "/api/tokens",
            BOOTSTRAP_TOKEN,
            serde_json::json!({ "name": "admin2", "owner_user_id": admin_id }),
        ))
        .await
        .unwrap();
    let admin_token = json_body(response).await["data"]["token"]
        .as_str()
        .unwrap()
        .to_string();

    // Suspend the system account so second-admin is the last active admin
    let response = app
        .clone()
        .oneshot(send_json(
            "POST",
            "/api/users/user_system/suspend",
            &admin_token,
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/users/{admin_id}"))
                .header("X-Api-Key", BOOTSTRAP_TOKEN)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    // The suspended system account no longer authenticates
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // And second-admin cannot delete themselves either
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/users/{admin_id}"))
                .header("X-Api-Key", &admin_token)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn non_admin_tokens_are_rejected() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(send_json(
            "POST",
            "/api/users",
            BOOTSTRAP_TOKEN,
            serde_json::json!({
                "username": "plain-user",
                "password": "correct-horse-battery",
                "role": "user",
            }),
        ))
        .await
        .unwrap();
    let user_id = json_body(response).await["data"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .clone()
        .oneshot(send_json(
            "POST",
            "/api/tokens",
            BOOTSTRAP_TOKEN,
            serde_json::json!({ "name": "user-token", "owner_user_id": user_id }),
        ))
        .await
        .unwrap();
    let user_token = json_body(response).await["data"]["token"]
        .as_str()
        .unwrap()
        .to_string();

    // A valid token for a non-admin user is forbidden, not unauthorized
    let response = app
        .clone()
        .oneshot(get("/api/users", Some(&user_token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn token_listing_hides_the_secret() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(get("/api/tokens", Some(BOOTSTRAP_TOKEN)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    let tokens = body["data"].as_array().unwrap();
    // The bootstrap token row is present but its secret is not serialized
    assert!(!tokens.is_empty());
    for token in tokens {
        assert!(token.get("token").is_none());
        assert!(token["id"].is_string());
    }
}

#[tokio::test]
async fn budget_request_validation_and_listing() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(send_json(
            "POST",
            "/api/budget-requests",
            BOOTSTRAP_TOKEN,
            serde_json::json!({
                "requester_id": "user_system",
                "agent_id": "agent_missing",
                "amount": -5.0,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(get("/api/budget-requests?status=bogus", Some(BOOTSTRAP_TOKEN)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(get("/api/budget-requests?status=pending", Some(BOOTSTRAP_TOKEN)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn create_user_with_unknown_role_is_a_validation_error() {
    let app = spawn_app().await;

    let response = app
        .oneshot(send_json(
            "POST",
            "/api/users",
            BOOTSTRAP_TOKEN,
            serde_json::json!({
                "username": "mallory",
                "password": "correct-horse-battery",
                "role": "superadmin",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json_body(response).await;
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("superadmin"));
}
