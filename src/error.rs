//! Error types for the authentication gateway.
//!
//! Each protocol surface has its own closed set of failure kinds: the SOAP
//! interceptor reports [`Violation`]s, the token/REST side reports
//! [`AuthError`]s. Transport adapters map kinds to their native failure
//! representation (SOAP fault vs. HTTP status) without string matching.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::parser::SoapVersion;

/// Rejection kinds for the SOAP surface.
///
/// Variants are listed in the order the interceptor runs its checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViolationCode {
    /// Envelope carries no Header section
    MissingHeader,
    /// Header has no WS-Security `Security` element
    MissingSecurityHeader,
    /// Security element has no `UsernameToken`
    MissingUsernameToken,
    /// Username/password mismatch against the service credential
    InvalidCredentials,
    /// Malformed XML or any other parsing failure, normalized
    SecurityValidationFailed,
}

impl ViolationCode {
    /// Get the string code for this violation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingHeader => "MISSING_HEADER",
            Self::MissingSecurityHeader => "MISSING_SECURITY_HEADER",
            Self::MissingUsernameToken => "MISSING_USERNAME_TOKEN",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::SecurityValidationFailed => "SECURITY_VALIDATION_FAILED",
        }
    }
}

/// A security violation detected while intercepting an inbound SOAP message.
///
/// The message is for logs and tests only; the wire-visible fault never
/// carries it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    /// Violation code
    pub code: ViolationCode,
    /// Human-readable message (internal)
    pub message: String,
}

impl Violation {
    /// Create a new violation.
    pub fn new(code: ViolationCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Rejection kinds for the REST/token surface.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("request is not authenticated")]
    Unauthenticated,

    #[error("token signature verification failed")]
    BadSignature,

    #[error("token has expired")]
    Expired,

    #[error("configuration error: {0}")]
    ConfigurationError(String),
}

/// Render a SOAP fault for a rejected inbound message.
///
/// The faultstring is uniform: callers learn that authentication failed,
/// not which check tripped.
pub fn soap_fault_response(version: Option<SoapVersion>) -> String {
    match version {
        Some(SoapVersion::Soap12) => soap_12_fault(),
        _ => soap_11_fault(),
    }
}

fn soap_11_fault() -> String {
    r#"<?xml version="1.0" encoding="UTF-8"?>
<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
  <soap:Body>
    <soap:Fault>
      <faultcode>soap:Client</faultcode>
      <faultstring>Authentication failed</faultstring>
    </soap:Fault>
  </soap:Body>
</soap:Envelope>"#
        .to_string()
}

fn soap_12_fault() -> String {
    r#"<?xml version="1.0" encoding="UTF-8"?>
<soap:Envelope xmlns:soap="http://www.w3.org/2003/05/soap-envelope">
  <soap:Body>
    <soap:Fault>
      <soap:Code>
        <soap:Value>soap:Sender</soap:Value>
      </soap:Code>
      <soap:Reason>
        <soap:Text xml:lang="en">Authentication failed</soap:Text>
      </soap:Reason>
    </soap:Fault>
  </soap:Body>
</soap:Envelope>"#
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_violation_code_as_str() {
        assert_eq!(ViolationCode::MissingHeader.as_str(), "MISSING_HEADER");
        assert_eq!(
            ViolationCode::SecurityValidationFailed.as_str(),
            "SECURITY_VALIDATION_FAILED"
        );
    }

    #[test]
    fn test_soap_11_fault() {
        let fault = soap_fault_response(Some(SoapVersion::Soap11));
        assert!(fault.contains("http://schemas.xmlsoap.org/soap/envelope/"));
        assert!(fault.contains("Authentication failed"));
    }

    #[test]
    fn test_soap_12_fault() {
        let fault = soap_fault_response(Some(SoapVersion::Soap12));
        assert!(fault.contains("http://www.w3.org/2003/05/soap-envelope"));
        assert!(fault.contains("soap:Sender"));
    }

    #[test]
    fn test_fault_never_names_the_failed_check() {
        for fault in [
            soap_fault_response(None),
            soap_fault_response(Some(SoapVersion::Soap12)),
        ] {
            assert!(!fault.contains("MISSING"));
            assert!(!fault.contains("INVALID"));
            assert!(!fault.contains("credential"));
        }
    }
}
