//! Integration tests for admin login, session checks, and lockout.

use std::time::Duration;

use furnish_integration_tests::{
    ADMIN_EMAIL, ADMIN_PASSWORD, FakeSanity, admin_login, browser, spawn_admin,
    spawn_admin_with_lockout,
};
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};

async fn is_authenticated(client: &Client, base_url: &str) -> bool {
    let resp = client
        .get(format!("{base_url}/api/check-auth"))
        .send()
        .await
        .expect("Failed to check auth");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Failed to parse check-auth");
    body["isAuthenticated"].as_bool().expect("isAuthenticated flag")
}

async fn attempt(client: &Client, base_url: &str, password: &str) -> (StatusCode, Value) {
    let resp = client
        .post(format!("{base_url}/api/login"))
        .json(&json!({ "email": ADMIN_EMAIL, "password": password }))
        .send()
        .await
        .expect("Failed to send login");
    let status = resp.status();
    (status, resp.json().await.expect("Failed to parse login"))
}

// ============================================================================
// Login & Logout
// ============================================================================

#[tokio::test]
async fn test_login_check_logout() {
    let sanity = FakeSanity::start().await;
    let base_url = spawn_admin(&sanity).await;
    let client = browser();

    assert!(!is_authenticated(&client, &base_url).await);

    let (status, body) = attempt(&client, &base_url, ADMIN_PASSWORD).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(is_authenticated(&client, &base_url).await);

    let resp = client
        .post(format!("{base_url}/api/logout"))
        .send()
        .await
        .expect("Failed to log out");
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(!is_authenticated(&client, &base_url).await);
}

#[tokio::test]
async fn test_login_cookie_attributes() {
    let sanity = FakeSanity::start().await;
    let base_url = spawn_admin(&sanity).await;

    let resp = Client::new()
        .post(format!("{base_url}/api/login"))
        .json(&json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }))
        .send()
        .await
        .expect("Failed to send login");

    let cookie = resp
        .headers()
        .get("set-cookie")
        .and_then(|v| v.to_str().ok())
        .expect("login sets a cookie")
        .to_string();
    assert!(cookie.starts_with("authToken="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(cookie.contains("Max-Age=86400"));
    assert!(!cookie.contains("Secure"));
}

#[tokio::test]
async fn test_email_is_case_insensitive() {
    let sanity = FakeSanity::start().await;
    let base_url = spawn_admin(&sanity).await;

    let resp = browser()
        .post(format!("{base_url}/api/login"))
        .json(&json!({ "email": ADMIN_EMAIL.to_uppercase(), "password": ADMIN_PASSWORD }))
        .send()
        .await
        .expect("Failed to send login");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_protected_routes_require_cookie() {
    let sanity = FakeSanity::start().await;
    let base_url = spawn_admin(&sanity).await;
    let client = browser();

    for path in ["/api/dashboard", "/api/products", "/api/orders", "/api/customers"] {
        let resp = client
            .get(format!("{base_url}{path}"))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{path}");
        let body: Value = resp.json().await.expect("Failed to parse body");
        assert_eq!(body["error"], "Unauthorized");
    }
}

#[tokio::test]
async fn test_forged_cookie_is_cleared() {
    let sanity = FakeSanity::start().await;
    let base_url = spawn_admin(&sanity).await;

    let resp = Client::new()
        .get(format!("{base_url}/api/check-auth"))
        .header("cookie", "authToken=not.a.token")
        .send()
        .await
        .expect("Failed to check auth");
    assert_eq!(resp.status(), StatusCode::OK);
    let cookie = resp
        .headers()
        .get("set-cookie")
        .and_then(|v| v.to_str().ok())
        .expect("invalid token is expired")
        .to_string();
    assert!(cookie.contains("Max-Age=0"));
}

// ============================================================================
// Lockout
// ============================================================================

#[tokio::test]
async fn test_three_failures_lock_login() {
    let sanity = FakeSanity::start().await;
    let base_url = spawn_admin(&sanity).await;
    let client = browser();

    let (status, body) = attempt(&client, &base_url, "wrong-one").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid credentials");
    assert_eq!(body["attemptsRemaining"], 2);

    let (_, body) = attempt(&client, &base_url, "wrong-two").await;
    assert_eq!(body["attemptsRemaining"], 1);

    let (status, body) = attempt(&client, &base_url, "wrong-three").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["attemptsRemaining"], 0);

    // Even the right password is refused while locked.
    let (status, body) = attempt(&client, &base_url, ADMIN_PASSWORD).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["success"], false);
    assert_eq!(body["attemptsRemaining"], 0);
}

#[tokio::test]
async fn test_forwarding_headers_do_not_reset_lockout() {
    let sanity = FakeSanity::start().await;
    let base_url = spawn_admin(&sanity).await;
    let client = browser();

    let mut statuses = Vec::new();
    for i in 0..6 {
        let resp = client
            .post(format!("{base_url}/api/login"))
            .header("x-forwarded-for", format!("203.0.113.{i}"))
            .header("x-real-ip", format!("198.51.100.{i}"))
            .json(&json!({ "email": ADMIN_EMAIL, "password": "guess" }))
            .send()
            .await
            .expect("Failed to send login");
        statuses.push(resp.status());
    }

    // The loopback peer is not a trusted proxy, so every attempt shares one bucket.
    assert_eq!(&statuses[..3], &[StatusCode::UNAUTHORIZED; 3]);
    assert!(statuses[3..].iter().all(|s| *s == StatusCode::TOO_MANY_REQUESTS));
}

#[tokio::test]
async fn test_success_resets_failures() {
    let sanity = FakeSanity::start().await;
    let base_url = spawn_admin(&sanity).await;
    let client = browser();

    attempt(&client, &base_url, "wrong-one").await;
    attempt(&client, &base_url, "wrong-two").await;
    let (status, _) = attempt(&client, &base_url, ADMIN_PASSWORD).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = attempt(&client, &base_url, "wrong-again").await;
    assert_eq!(body["attemptsRemaining"], 2);
}

#[tokio::test]
async fn test_lockout_expires() {
    let sanity = FakeSanity::start().await;
    let base_url = spawn_admin_with_lockout(&sanity, Duration::from_millis(200)).await;
    let client = browser();

    for password in ["wrong-one", "wrong-two", "wrong-three"] {
        attempt(&client, &base_url, password).await;
    }
    let (status, _) = attempt(&client, &base_url, ADMIN_PASSWORD).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

    tokio::time::sleep(Duration::from_millis(400)).await;
    let (status, _) = attempt(&client, &base_url, ADMIN_PASSWORD).await;
    assert_eq!(status, StatusCode::OK);
}

// ============================================================================
// Password Change
// ============================================================================

#[tokio::test]
async fn test_change_password() {
    let sanity = FakeSanity::start().await;
    let base_url = spawn_admin(&sanity).await;
    let client = browser();
    admin_login(&client, &base_url).await;

    let resp = client
        .post(format!("{base_url}/api/change-password"))
        .json(&json!({ "currentPassword": "not-it", "newPassword": "Cedar-Bench-77" }))
        .send()
        .await
        .expect("Failed to change password");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = resp.json().await.expect("Failed to parse body");
    assert_eq!(body["message"], "Incorrect current password");

    let resp = client
        .post(format!("{base_url}/api/change-password"))
        .json(&json!({ "currentPassword": ADMIN_PASSWORD, "newPassword": "short" }))
        .send()
        .await
        .expect("Failed to change password");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = client
        .post(format!("{base_url}/api/change-password"))
        .json(&json!({ "currentPassword": ADMIN_PASSWORD, "newPassword": "Cedar-Bench-77" }))
        .send()
        .await
        .expect("Failed to change password");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Failed to parse body");
    assert_eq!(body["message"], "Password changed successfully");

    // The old password no longer works; the new one does.
    let fresh = browser();
    let (status, _) = attempt(&fresh, &base_url, ADMIN_PASSWORD).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = attempt(&fresh, &base_url, "Cedar-Bench-77").await;
    assert_eq!(status, StatusCode::OK);
}
