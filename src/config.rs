//! Configuration types for the authentication gateway.
//!
//! Everything here is loaded once at startup and treated as read-only for
//! the life of the process. The components that need a piece of it receive
//! it by reference at construction time; there are no process-wide
//! singletons.

use serde::{Deserialize, Serialize};

/// Main configuration for the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Config version
    pub version: String,

    /// General listener settings
    pub settings: SettingsConfig,

    /// SOAP surface settings (service credential)
    pub soap: SoapSurfaceConfig,

    /// Token issuance/verification settings
    pub token: TokenConfig,

    /// REST surface settings (public routes)
    pub rest: RestSurfaceConfig,

    /// Users known to the REST credential store
    pub users: Vec<UserConfig>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            version: "1".to_string(),
            settings: SettingsConfig::default(),
            soap: SoapSurfaceConfig::default(),
            token: TokenConfig::default(),
            rest: RestSurfaceConfig::default(),
            users: vec![UserConfig::default()],
        }
    }
}

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsConfig {
    /// Maximum SOAP body size to process (bytes)
    pub max_body_size: usize,

    /// Allowed Content-Type headers for SOAP requests
    pub allowed_content_types: Vec<String>,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            max_body_size: 1_048_576, // 1MB
            allowed_content_types: vec![
                "text/xml".to_string(),
                "application/soap+xml".to_string(),
                "application/xml".to_string(),
            ],
        }
    }
}

/// SOAP surface configuration.
///
/// The SOAP endpoint authenticates a single service-level identity, kept
/// deliberately separate from the per-user REST credential store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SoapSurfaceConfig {
    /// Expected UsernameToken username
    pub service_username: String,

    /// Expected UsernameToken password (plain text mode)
    pub service_password: String,
}

impl Default for SoapSurfaceConfig {
    fn default() -> Self {
        Self {
            service_username: "admin".to_string(),
            service_password: "secret123".to_string(),
        }
    }
}

/// Token configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    /// HMAC signing secret. Must be non-empty; startup fails otherwise.
    pub secret: String,

    /// Token time-to-live in seconds
    pub ttl_secs: i64,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            ttl_secs: 3600,
        }
    }
}

/// REST surface configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RestSurfaceConfig {
    /// Paths the bearer-token gate does not apply to. The login endpoint
    /// and the SOAP endpoint are public by default; SOAP carries its own
    /// credentials in the envelope.
    pub public_routes: Vec<String>,
}

impl Default for RestSurfaceConfig {
    fn default() -> Self {
        Self {
            public_routes: vec!["/api/auth/token".to_string(), "/soap".to_string()],
        }
    }
}

/// A user entry for the REST credential store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UserConfig {
    /// Principal identifier
    pub username: String,

    /// Secret (plaintext-equivalent comparison; hashing policy is out of
    /// scope here)
    pub password: String,

    /// Role names granted to this user
    pub roles: Vec<String>,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            username: "user".to_string(),
            password: "password".to_string(),
            roles: vec!["USER".to_string()],
        }
    }
}
