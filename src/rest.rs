//! HTTP surface of the gateway.
//!
//! One axum router carries both protocol front ends: the bearer-token
//! middleware gates REST routes, the `/soap` handler feeds inbound
//! envelopes through the [`SoapSecurityInterceptor`], and the login
//! endpoint is the only place a token is ever issued.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::GatewayConfig;
use crate::context::SecurityContext;
use crate::credentials::CredentialStore;
use crate::error::{soap_fault_response, AuthError};
use crate::interceptor::{MessageDirection, SoapSecurityInterceptor};
use crate::parser::{SoapVersion, SOAP_12_NS};
use crate::token::TokenService;

/// Shared, read-only state behind the router. Everything here is built
/// once at startup; request handling never mutates it.
#[derive(Clone)]
pub struct GatewayState {
    pub credentials: Arc<CredentialStore>,
    pub tokens: Arc<TokenService>,
    pub interceptor: Arc<SoapSecurityInterceptor>,
    public_routes: Arc<Vec<String>>,
    max_body_size: usize,
    allowed_content_types: Arc<Vec<String>>,
}

impl GatewayState {
    pub fn new(
        config: &GatewayConfig,
        credentials: CredentialStore,
        tokens: TokenService,
    ) -> Self {
        Self {
            credentials: Arc::new(credentials),
            tokens: Arc::new(tokens),
            interceptor: Arc::new(SoapSecurityInterceptor::new(&config.soap)),
            public_routes: Arc::new(config.rest.public_routes.clone()),
            max_body_size: config.settings.max_body_size,
            allowed_content_types: Arc::new(config.settings.allowed_content_types.clone()),
        }
    }

    fn is_public_route(&self, path: &str) -> bool {
        self.public_routes.iter().any(|r| r == path)
    }

    fn is_soap_content_type(&self, content_type: Option<&str>) -> bool {
        match content_type {
            Some(ct) => {
                let ct_lower = ct.to_lowercase();
                self.allowed_content_types
                    .iter()
                    .any(|allowed| ct_lower.contains(&allowed.to_lowercase()))
            }
            None => false,
        }
    }
}

/// Build the gateway router.
pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/api/auth/token", post(login))
        .route("/api/whoami", get(whoami))
        .route("/soap", post(soap_endpoint))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .with_state(state)
}

/// Bearer-token gate for REST routes.
///
/// Public routes bypass the gate entirely (that allow list is
/// configuration, not a per-request security decision). Everything else
/// needs a verifiable token; on success the resulting [`SecurityContext`]
/// rides along as a request extension for this request only.
pub async fn auth_middleware(
    State(state): State<GatewayState>,
    mut req: Request,
    next: Next,
) -> Response {
    if state.is_public_route(req.uri().path()) {
        req.extensions_mut().insert(SecurityContext::anonymous());
        return next.run(req).await;
    }

    match authenticate_request(&state, req.headers()) {
        Ok(ctx) => {
            req.extensions_mut().insert(ctx);
            next.run(req).await
        }
        Err(err) => {
            // The reason stays in the logs; the response is uniform.
            debug!(path = %req.uri().path(), error = %err, "request rejected");
            unauthorized()
        }
    }
}

/// Decide whether a request is authenticated, and as whom. Authorization
/// beyond that is the consuming handler's concern.
fn authenticate_request(
    state: &GatewayState,
    headers: &HeaderMap,
) -> Result<SecurityContext, AuthError> {
    let token = extract_bearer_token(headers).ok_or(AuthError::Unauthenticated)?;
    state.tokens.verify(token)
}

/// Extract Bearer token from the Authorization header.
fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer ").map(str::trim))
}

/// Uniform rejection: no hint about which check failed.
fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({ "error": "authentication failed" })),
    )
        .into_response()
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// `POST /api/auth/token` — the only token issuance path.
async fn login(
    State(state): State<GatewayState>,
    Json(request): Json<LoginRequest>,
) -> Response {
    let Some(credential) = state
        .credentials
        .authenticate(&request.username, &request.password)
    else {
        debug!(username = %request.username, "login rejected");
        return unauthorized();
    };

    match state.tokens.issue(
        &credential.username,
        credential.roles.clone(),
        state.tokens.default_ttl(),
    ) {
        Ok(token) => {
            debug!(username = %credential.username, "token issued");
            token.into_response()
        }
        Err(err) => {
            warn!(error = %err, "token issuance failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// `GET /api/whoami` — a protected consumer of the attached context.
/// Role sufficiency for richer operations is this layer's decision, via
/// `SecurityContext::has_role`, not the middleware's.
async fn whoami(Extension(ctx): Extension<SecurityContext>) -> Json<SecurityContext> {
    Json(ctx)
}

/// `POST /soap` — inbound SOAP front end.
///
/// Runs the WS-Security interceptor; a rejected message answers with a
/// SOAP fault and the business operation is never invoked. Accepted
/// messages are marked validated for the dispatcher behind the gateway.
async fn soap_endpoint(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());
    if !state.is_soap_content_type(content_type) {
        return (
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "unsupported content type",
        )
            .into_response();
    }

    if body.len() > state.max_body_size {
        warn!(body_size = body.len(), "SOAP body too large");
        return (StatusCode::PAYLOAD_TOO_LARGE, "request body too large").into_response();
    }

    match state
        .interceptor
        .intercept(MessageDirection::Inbound, &body)
    {
        Ok(envelope) => {
            let operation = envelope
                .and_then(|e| e.operation)
                .unwrap_or_default();
            let mut response = (StatusCode::OK, Bytes::new()).into_response();
            let headers = response.headers_mut();
            headers.insert("X-SOAP-Validated", HeaderValue::from_static("true"));
            if !operation.is_empty() {
                if let Ok(value) = HeaderValue::from_str(&operation) {
                    headers.insert("X-SOAP-Operation", value);
                }
            }
            response
        }
        Err(violation) => {
            warn!(
                code = %violation.code.as_str(),
                message = %violation.message,
                "inbound SOAP message rejected"
            );
            // Answer in the caller's SOAP dialect where it is recognizable;
            // default to 1.1 otherwise.
            let version = std::str::from_utf8(&body)
                .ok()
                .filter(|s| s.contains(SOAP_12_NS))
                .map(|_| SoapVersion::Soap12);
            let content_type = match version {
                Some(SoapVersion::Soap12) => "application/soap+xml; charset=utf-8",
                _ => "text/xml; charset=utf-8",
            };
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, content_type)],
                soap_fault_response(version),
            )
                .into_response()
        }
    }
}
