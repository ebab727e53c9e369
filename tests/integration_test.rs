//! Integration tests for the catalog-auth-gateway crate.
//!
//! These tests exercise the public API surface end-to-end through the
//! router: SOAP interception, login, and the bearer-token gate together.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use catalog_auth_gateway::config::{GatewayConfig, UserConfig};
use catalog_auth_gateway::context::SecurityContext;
use catalog_auth_gateway::credentials::CredentialStore;
use catalog_auth_gateway::rest::{router, GatewayState};
use catalog_auth_gateway::token::TokenService;
use http_body_util::BodyExt;
use tower::ServiceExt;

// ============================================================================
// Helpers
// ============================================================================

fn test_config() -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.token.secret = "integration-test-signing-secret".to_string();
    config.token.ttl_secs = 300;
    config.users = vec![
        UserConfig {
            username: "admin".to_string(),
            password: "secret123".to_string(),
            roles: vec!["ADMIN".to_string()],
        },
        UserConfig {
            username: "user".to_string(),
            password: "password".to_string(),
            roles: vec!["USER".to_string()],
        },
    ];
    config
}

fn app() -> Router {
    let config = test_config();
    let credentials = CredentialStore::from_users(&config.users);
    let tokens = TokenService::new(&config.token).unwrap();
    router(GatewayState::new(&config, credentials, tokens))
}

fn soap_envelope(username: &str, password: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
  <soap:Header>
    <wsse:Security xmlns:wsse="http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-secext-1.0.xsd">
      <wsse:UsernameToken>
        <wsse:Username>{username}</wsse:Username>
        <wsse:Password>{password}</wsse:Password>
      </wsse:UsernameToken>
    </wsse:Security>
  </soap:Header>
  <soap:Body>
    <cat:GetProduct xmlns:cat="http://globalbooks.example.org/catalog">
      <cat:Isbn>978-0134685991</cat:Isbn>
    </cat:GetProduct>
  </soap:Body>
</soap:Envelope>"#
    )
}

fn soap_request(body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/soap")
        .header(header::CONTENT_TYPE, "text/xml; charset=utf-8")
        .body(Body::from(body))
        .unwrap()
}

fn login_request(username: &str, password: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/auth/token")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(format!(
            r#"{{"username":"{username}","password":"{password}"}}"#
        )))
        .unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

// ============================================================================
// SOAP surface
// ============================================================================

#[tokio::test]
async fn test_soap_valid_credentials_accepted() {
    let response = app()
        .oneshot(soap_request(soap_envelope("admin", "secret123")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("X-SOAP-Validated").unwrap(),
        "true"
    );
    assert_eq!(
        response.headers().get("X-SOAP-Operation").unwrap(),
        "GetProduct"
    );
}

#[tokio::test]
async fn test_soap_wrong_password_rejected_with_fault() {
    let response = app()
        .oneshot(soap_request(soap_envelope("admin", "wrong")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_string(response).await;
    assert!(body.contains("soap:Fault"));
    assert!(body.contains("Authentication failed"));
    // The fault must not disclose which check failed
    assert!(!body.contains("credentials"));
    assert!(!body.contains("wrong"));
}

#[tokio::test]
async fn test_soap_unknown_user_fault_is_identical_to_wrong_password() {
    let unknown = app()
        .oneshot(soap_request(soap_envelope("mallory", "secret123")))
        .await
        .unwrap();
    let wrong = app()
        .oneshot(soap_request(soap_envelope("admin", "wrong")))
        .await
        .unwrap();

    assert_eq!(unknown.status(), wrong.status());
    assert_eq!(body_string(unknown).await, body_string(wrong).await);
}

#[tokio::test]
async fn test_soap_missing_security_header_rejected() {
    let xml = r#"<?xml version="1.0"?>
<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
  <soap:Header>
    <m:RequestId xmlns:m="http://example.org/meta">REQ-1</m:RequestId>
  </soap:Header>
  <soap:Body>
    <cat:GetProduct xmlns:cat="http://globalbooks.example.org/catalog"/>
  </soap:Body>
</soap:Envelope>"#;

    let response = app().oneshot(soap_request(xml.to_string())).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_string(response).await.contains("soap:Fault"));
}

#[tokio::test]
async fn test_soap_malformed_xml_rejected_with_fault_not_panic() {
    let response = app()
        .oneshot(soap_request("<soap:Envelope><broken".to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_string(response).await.contains("soap:Fault"));
}

#[tokio::test]
async fn test_soap_xxe_payload_rejected() {
    let xml = r#"<?xml version="1.0"?>
<!DOCTYPE foo [<!ENTITY xxe SYSTEM "file:///etc/passwd">]>
<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
  <soap:Body>&xxe;</soap:Body>
</soap:Envelope>"#;

    let response = app().oneshot(soap_request(xml.to_string())).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_string(response).await;
    assert!(body.contains("soap:Fault"));
    assert!(!body.contains("DOCTYPE"));
}

#[tokio::test]
async fn test_soap_12_request_gets_soap_12_fault() {
    let xml = r#"<?xml version="1.0"?>
<soap:Envelope xmlns:soap="http://www.w3.org/2003/05/soap-envelope">
  <soap:Body>
    <cat:GetProduct xmlns:cat="http://globalbooks.example.org/catalog"/>
  </soap:Body>
</soap:Envelope>"#;

    let response = app().oneshot(soap_request(xml.to_string())).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_string(response).await;
    assert!(body.contains("http://www.w3.org/2003/05/soap-envelope"));
    assert!(body.contains("soap:Sender"));
}

#[tokio::test]
async fn test_soap_non_xml_content_type_rejected() {
    let request = Request::builder()
        .method("POST")
        .uri("/soap")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(soap_envelope("admin", "secret123")))
        .unwrap();

    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn test_soap_endpoint_needs_no_bearer_token() {
    // The SOAP surface authenticates inside the envelope, not via the
    // bearer gate.
    let response = app()
        .oneshot(soap_request(soap_envelope("admin", "secret123")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// ============================================================================
// REST surface: login + bearer gate
// ============================================================================

#[tokio::test]
async fn test_login_issues_token_and_token_authenticates() {
    let response = app()
        .oneshot(login_request("admin", "secret123"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let token = body_string(response).await;
    assert_eq!(token.split('.').count(), 3);

    let request = Request::builder()
        .method("GET")
        .uri("/api/whoami")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let ctx: SecurityContext =
        serde_json::from_str(&body_string(response).await).unwrap();
    assert!(ctx.authenticated);
    assert_eq!(ctx.principal, "admin");
    assert_eq!(ctx.roles, vec!["ADMIN".to_string()]);
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let unknown = app()
        .oneshot(login_request("nobody", "secret123"))
        .await
        .unwrap();
    let wrong = app()
        .oneshot(login_request("admin", "bad-password"))
        .await
        .unwrap();

    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_string(unknown).await, body_string(wrong).await);
}

#[tokio::test]
async fn test_protected_route_without_token_is_401() {
    let request = Request::builder()
        .method("GET")
        .uri("/api/whoami")
        .body(Body::empty())
        .unwrap();

    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_route_with_garbage_token_is_401() {
    let request = Request::builder()
        .method("GET")
        .uri("/api/whoami")
        .header(header::AUTHORIZATION, "Bearer this-is-not-a-token")
        .body(Body::empty())
        .unwrap();

    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_string(response).await;
    assert!(body.contains("authentication failed"));
    assert!(!body.contains("signature"));
}

#[tokio::test]
async fn test_expired_token_is_401() {
    let config = test_config();
    let tokens = TokenService::new(&config.token).unwrap();
    let expired = tokens
        .issue(
            "admin",
            vec!["ADMIN".to_string()],
            chrono::Duration::seconds(-60),
        )
        .unwrap();

    let request = Request::builder()
        .method("GET")
        .uri("/api/whoami")
        .header(header::AUTHORIZATION, format!("Bearer {expired}"))
        .body(Body::empty())
        .unwrap();

    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_signed_with_other_key_is_401() {
    let mut other_config = test_config();
    other_config.token.secret = "some-other-secret".to_string();
    let other = TokenService::new(&other_config.token).unwrap();
    let forged = other
        .issue(
            "admin",
            vec!["ADMIN".to_string()],
            chrono::Duration::seconds(300),
        )
        .unwrap();

    let request = Request::builder()
        .method("GET")
        .uri("/api/whoami")
        .header(header::AUTHORIZATION, format!("Bearer {forged}"))
        .body(Body::empty())
        .unwrap();

    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_roles_flow_from_store_through_token_to_context() {
    let response = app()
        .oneshot(login_request("user", "password"))
        .await
        .unwrap();
    let token = body_string(response).await;

    let request = Request::builder()
        .method("GET")
        .uri("/api/whoami")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let response = app().oneshot(request).await.unwrap();

    let ctx: SecurityContext =
        serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(ctx.principal, "user");
    assert!(ctx.has_role("USER"));
    assert!(!ctx.has_role("ADMIN"));
}

// ============================================================================
// Both surfaces share credentials semantics but not credential spaces
// ============================================================================

#[tokio::test]
async fn test_rest_user_cannot_authenticate_on_soap_surface() {
    // "user"/"password" is a REST store entry, not the SOAP service
    // credential; the surfaces are deliberately separate.
    let response = app()
        .oneshot(soap_request(soap_envelope("user", "password")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_soap_service_identity_can_also_be_a_rest_user() {
    // The default store used in these tests seeds "admin" in both spaces;
    // REST login for it goes through the CredentialStore, not the SOAP
    // service credential.
    let response = app()
        .oneshot(login_request("admin", "secret123"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
