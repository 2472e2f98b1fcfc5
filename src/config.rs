//! Configuration types for the authentication gateway
//!
//! Provides JSON-serializable configuration for the remote verifier, session
//! lifetime, and the broker hook layer. Read once at startup.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// Authentication Gateway Configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case", default)]
pub struct GatewayConfig {
    /// Remote verification endpoint
    pub auth: VerifierConfig,

    /// Session cache lifetime and eviction
    pub session: SessionConfig,

    /// Broker hook behaviour
    pub hooks: HooksConfig,
}

impl GatewayConfig {
    /// Load configuration from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Reject settings the gateway cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.session.ttl_secs == 0 {
            bail!("session.ttl-secs must be greater than zero");
        }
        if self.session.sweep_interval_secs == 0 {
            bail!("session.sweep-interval-secs must be greater than zero");
        }
        if self.auth.timeout_ms == 0 {
            bail!("auth.timeout-ms must be greater than zero");
        }
        let url = reqwest::Url::parse(&self.auth.url)
            .with_context(|| format!("Invalid auth.url: {}", self.auth.url))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("auth.url must use http or https, got {}", url.scheme());
        }
        Ok(())
    }
}

// ============================================================================
// Verifier Configuration
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct VerifierConfig {
    /// Verification endpoint URL
    pub url: String,

    /// Request timeout in milliseconds
    pub timeout_ms: u64,

    /// Extra headers to include in every verification request
    pub headers: HashMap<String, String>,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            url: default_auth_url(),
            timeout_ms: default_verify_timeout(),
            headers: HashMap::new(),
        }
    }
}

// ============================================================================
// Session Configuration
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SessionConfig {
    /// Session lifetime in seconds, refreshed on every cache hit
    pub ttl_secs: u64,

    /// Seconds between expired-session sweeps
    pub sweep_interval_secs: u64,
}

impl SessionConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_session_ttl(),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

// ============================================================================
// Hook Configuration
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct HooksConfig {
    /// How topic ACL checks are answered
    pub acl_mode: AclMode,

    /// Relay lifecycle events to the notifier
    pub notify: bool,

    /// Include publish payloads in relayed events
    pub notify_payloads: bool,
}

impl Default for HooksConfig {
    fn default() -> Self {
        Self {
            acl_mode: AclMode::AllowAll,
            notify: true,
            notify_payloads: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum AclMode {
    /// Every ACL check passes
    #[default]
    AllowAll,
    /// ACL checks pass only for clients holding a live session
    RequireSession,
}

// ============================================================================
// Default value functions
// ============================================================================

fn default_auth_url() -> String {
    "http://mqtt-panel.test/api/mqtt/auth".to_string()
}

fn default_verify_timeout() -> u64 {
    10_000
}

fn default_session_ttl() -> u64 {
    24 * 3600
}

fn default_sweep_interval() -> u64 {
    168 * 3600
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = GatewayConfig::default();
        assert_eq!(config.auth.url, "http://mqtt-panel.test/api/mqtt/auth");
        assert_eq!(config.auth.timeout_ms, 10_000);
        assert_eq!(config.session.ttl(), Duration::from_secs(86_400));
        assert_eq!(config.session.sweep_interval(), Duration::from_secs(604_800));
        assert_eq!(config.hooks.acl_mode, AclMode::AllowAll);
        assert!(config.hooks.notify);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deserialize_config() {
        let json = r#"{
            "auth": {
                "url": "https://panel.example.com/api/mqtt/auth",
                "timeout-ms": 2500,
                "headers": {"X-Gateway-Key": "abc"}
            },
            "session": {
                "ttl-secs": 3600
            },
            "hooks": {
                "acl-mode": "require-session",
                "notify-payloads": false
            }
        }"#;

        let config: GatewayConfig = serde_json::from_str(json).expect("Failed to parse");
        assert_eq!(config.auth.url, "https://panel.example.com/api/mqtt/auth");
        assert_eq!(config.auth.timeout_ms, 2500);
        assert_eq!(config.auth.headers.get("X-Gateway-Key").map(String::as_str), Some("abc"));
        assert_eq!(config.session.ttl_secs, 3600);
        // Unset fields keep their defaults
        assert_eq!(config.session.sweep_interval_secs, 168 * 3600);
        assert_eq!(config.hooks.acl_mode, AclMode::RequireSession);
        assert!(config.hooks.notify);
        assert!(!config.hooks.notify_payloads);
    }

    #[test]
    fn test_validate_rejects_zero_durations() {
        let mut config = GatewayConfig::default();
        config.session.ttl_secs = 0;
        assert!(config.validate().is_err());

        let mut config = GatewayConfig::default();
        config.session.sweep_interval_secs = 0;
        assert!(config.validate().is_err());

        let mut config = GatewayConfig::default();
        config.auth.timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let mut config = GatewayConfig::default();
        config.auth.url = "not a url".to_string();
        assert!(config.validate().is_err());

        config.auth.url = "ftp://panel.example.com/auth".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"{"session": {"ttl-secs": 60, "sweep-interval-secs": 30}}"#)
            .unwrap();

        let config = GatewayConfig::from_file(file.path()).unwrap();
        assert_eq!(config.session.ttl_secs, 60);
        assert_eq!(config.session.sweep_interval_secs, 30);
    }

    #[test]
    fn test_from_missing_file() {
        let err = GatewayConfig::from_file(Path::new("/nonexistent/gateway.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
