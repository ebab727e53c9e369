//! Dual-protocol authentication gateway.
//!
//! Enforces credential validation on two structurally different wire
//! surfaces and issues bearer tokens on successful login:
//!
//! - SOAP envelopes carrying a WS-Security `UsernameToken` header are
//!   gated by an inbound-only interceptor checked against a fixed
//!   service credential
//! - REST requests carrying an `Authorization: Bearer` token are gated
//!   by middleware that verifies HS256-signed, time-bounded tokens
//!
//! Both front ends share one authorization model: a per-request
//! [`SecurityContext`] and a closed set of error kinds per surface.
//! Catalog logic, persistence and event publication live behind the
//! gateway and are not implemented here.
//!
//! # Example
//!
//! ```ignore
//! use catalog_auth_gateway::{config::GatewayConfig, credentials::CredentialStore,
//!     rest::{router, GatewayState}, token::TokenService};
//!
//! let config = GatewayConfig::default();
//! let store = CredentialStore::from_users(&config.users);
//! let tokens = TokenService::new(&config.token)?;
//! let app = router(GatewayState::new(&config, store, tokens));
//! axum::serve(listener, app).await?;
//! ```

pub mod config;
pub mod context;
pub mod credentials;
pub mod error;
pub mod interceptor;
pub mod parser;
pub mod rest;
pub mod token;

pub use config::GatewayConfig;
pub use context::SecurityContext;
pub use credentials::CredentialStore;
pub use error::{AuthError, Violation, ViolationCode};
pub use interceptor::{MessageDirection, SoapSecurityInterceptor};
pub use token::TokenService;
