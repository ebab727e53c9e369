//! Per-request security context.

use serde::{Deserialize, Serialize};

/// Who the caller is for the duration of one request.
///
/// Constructed fresh by whichever gate accepted the request and attached to
/// that request only; never shared across requests or persisted. Role
/// sufficiency for a given route is the consuming handler's decision, made
/// with [`SecurityContext::has_role`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityContext {
    /// Principal identifier
    pub principal: String,
    /// Roles granted to the principal
    pub roles: Vec<String>,
    /// Whether the request passed a credential or token check
    pub authenticated: bool,
}

impl SecurityContext {
    /// Context for a request that passed authentication.
    pub fn authenticated(principal: impl Into<String>, roles: Vec<String>) -> Self {
        Self {
            principal: principal.into(),
            roles,
            authenticated: true,
        }
    }

    /// Context for a request on a public route.
    pub fn anonymous() -> Self {
        Self {
            principal: String::new(),
            roles: Vec::new(),
            authenticated: false,
        }
    }

    /// Whether the principal holds the given role.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}
