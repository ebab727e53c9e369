//! Inbound SOAP message gate.
//!
//! Runs before the business handler ever sees the envelope. The checks run
//! in a fixed order and the first failure wins; outbound messages are
//! passed through untouched because this is an inbound-only gate.

use tracing::{debug, warn};

use crate::config::SoapSurfaceConfig;
use crate::error::{Violation, ViolationCode};
use crate::parser::{parse_envelope, SoapEnvelope};

/// Which way a message is travelling through the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageDirection {
    /// A request entering the system
    Inbound,
    /// A response leaving the system
    Outbound,
}

/// Validates WS-Security UsernameToken credentials on inbound envelopes.
///
/// The expected credential is a single fixed service-level identity from
/// configuration; the SOAP surface does not consult the per-user REST
/// credential store.
pub struct SoapSecurityInterceptor {
    expected_username: String,
    expected_password: String,
}

impl SoapSecurityInterceptor {
    pub fn new(config: &SoapSurfaceConfig) -> Self {
        Self {
            expected_username: config.service_username.clone(),
            expected_password: config.service_password.clone(),
        }
    }

    /// Gate one message. `Ok(None)` means an outbound message was passed
    /// through; `Ok(Some(envelope))` means an inbound message was accepted
    /// and may be dispatched.
    pub fn intercept(
        &self,
        direction: MessageDirection,
        payload: &[u8],
    ) -> Result<Option<SoapEnvelope>, Violation> {
        // Responses leaving the system are never validated.
        if direction == MessageDirection::Outbound {
            return Ok(None);
        }

        // Parsing failures of any kind are normalized: callers never see an
        // internal parser error type, and the document is not processed
        // past the point of failure.
        let envelope = parse_envelope(payload).map_err(|e| {
            Violation::new(
                ViolationCode::SecurityValidationFailed,
                format!("WS-Security validation failed: {e}"),
            )
        })?;

        let header = envelope.header.as_ref().ok_or_else(|| {
            Violation::new(ViolationCode::MissingHeader, "missing SOAP Header")
        })?;

        let security = header.security.as_ref().ok_or_else(|| {
            Violation::new(
                ViolationCode::MissingSecurityHeader,
                "missing WS-Security header",
            )
        })?;

        let token = security.username_token.as_ref().ok_or_else(|| {
            Violation::new(ViolationCode::MissingUsernameToken, "missing UsernameToken")
        })?;

        if token.username != self.expected_username || token.password != self.expected_password {
            warn!(username = %token.username, "UsernameToken credential mismatch");
            return Err(Violation::new(
                ViolationCode::InvalidCredentials,
                "invalid credentials",
            ));
        }

        debug!(
            username = %token.username,
            operation = ?envelope.operation,
            "inbound SOAP message validated"
        );
        Ok(Some(envelope))
    }
}
