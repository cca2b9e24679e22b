use axum::http::StatusCode;
use serde_json::json;

mod support;

use support::{empty_request, json_request, spawn_app, TEST_PASSWORD};

#[tokio::test]
async fn register_then_login_then_me() {
    let app = spawn_app();

    let (status, registered) = app
        .send(json_request(
            "POST",
            "/api/auth/register",
            None,
            json!({
                "email": "Alice@Example.com",
                "password": "long-enough-password",
                "display_name": "Alice"
            }),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED, "body: {registered}");
    assert_eq!(registered["token_type"], "Bearer");
    assert_eq!(registered["expires_in"], 3600);
    assert_eq!(registered["user"]["email"], "alice@example.com");
    assert!(registered.get("password_hash").is_none());

    let (status, logged_in) = app
        .send(json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "email": "alice@example.com", "password": "long-enough-password" }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    let token = logged_in["access_token"].as_str().expect("token");

    let (status, me) = app
        .send(empty_request("GET", "/api/auth/me", Some(token)))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["name"], "Alice");
    assert_eq!(me["id"], registered["user"]["id"]);
}

#[tokio::test]
async fn duplicate_email_conflicts() {
    let app = spawn_app();
    app.seed_user("taken@example.com", "Taken").await;

    let (status, body) = app
        .send(json_request(
            "POST",
            "/api/auth/register",
            None,
            json!({
                "email": "TAKEN@example.com",
                "password": "long-enough-password",
                "display_name": "Imposter"
            }),
        ))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");
}

#[tokio::test]
async fn invalid_registration_is_a_validation_error() {
    let app = spawn_app();
    let (status, body) = app
        .send(json_request(
            "POST",
            "/api/auth/register",
            None,
            json!({ "email": "nope", "password": "short", "display_name": "X" }),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn incomplete_credentials_body_is_a_bad_request() {
    let app = spawn_app();
    for uri in ["/api/auth/register", "/api/auth/login"] {
        let (status, body) = app
            .send(json_request("POST", uri, None, json!({ "email": "a@example.com" })))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "uri: {uri}");
        assert_eq!(body["code"], "BAD_REQUEST");
    }
}

#[tokio::test]
async fn wrong_password_and_unknown_email_look_the_same() {
    let app = spawn_app();
    app.seed_user("bob@example.com", "Bob").await;

    let (wrong_status, wrong_body) = app
        .send(json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "email": "bob@example.com", "password": "not-the-password" }),
        ))
        .await;
    let (unknown_status, unknown_body) = app
        .send(json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "email": "ghost@example.com", "password": TEST_PASSWORD }),
        ))
        .await;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body, unknown_body);
}

#[tokio::test]
async fn token_for_removed_account_is_rejected() {
    let app = spawn_app();
    let (user, token) = app.seed_user("gone@example.com", "Gone").await;
    app.users.remove(user.id).await;

    let (status, _) = app
        .send(empty_request("GET", "/api/auth/me", Some(&token)))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn health_is_public() {
    let app = spawn_app();
    let (status, body) = app.send(empty_request("GET", "/api/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}
