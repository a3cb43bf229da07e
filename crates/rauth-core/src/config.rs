//! Client configuration.

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// Gateway, endpoint and behaviour settings for one client.
///
/// # Example TOML
///
/// ```toml
/// gateway_url = "wss://remote-auth-gateway.discord.gg/?v=2"
/// origin = "https://discord.com"
/// login_url = "https://discord.com/api/v9/users/@me/remote-auth/login"
/// page_url = "https://discord.com/login"
/// fingerprint_url_base = "https://discordapp.com/ra/"
/// debug = false
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Remote auth gateway WebSocket URL
    #[serde(default = "default_gateway_url")]
    pub gateway_url: String,

    /// `Origin` header for the gateway upgrade request
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Ticket redemption endpoint
    #[serde(default = "default_login_url")]
    pub login_url: String,

    /// Page the challenge is presented on; also the redemption `referer`
    #[serde(default = "default_page_url")]
    pub page_url: String,

    /// Browser-like user agent for the redemption request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Prefix turning a fingerprint into a scannable URL
    #[serde(default = "default_fingerprint_url_base")]
    pub fingerprint_url_base: String,

    /// Verbose traffic logging, and skip malformed frames instead of failing
    #[serde(default)]
    pub debug: bool,
}

fn default_gateway_url() -> String {
    "wss://remote-auth-gateway.discord.gg/?v=2".to_string()
}

fn default_origin() -> String {
    "https://discord.com".to_string()
}

fn default_login_url() -> String {
    "https://discord.com/api/v9/users/@me/remote-auth/login".to_string()
}

fn default_page_url() -> String {
    "https://discord.com/login".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/105.0.0.0 Safari/537.36"
        .to_string()
}

fn default_fingerprint_url_base() -> String {
    "https://discordapp.com/ra/".to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            gateway_url: default_gateway_url(),
            origin: default_origin(),
            login_url: default_login_url(),
            page_url: default_page_url(),
            user_agent: default_user_agent(),
            fingerprint_url_base: default_fingerprint_url_base(),
            debug: false,
        }
    }
}

impl ClientConfig {
    /// Scannable URL for a fingerprint.
    pub fn fingerprint_url(&self, fingerprint: &str) -> String {
        format!("{}{}", self.fingerprint_url_base, fingerprint)
    }

    /// Check URL schemes.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_scheme("gateway_url", &self.gateway_url, &["ws://", "wss://"])?;
        check_scheme("origin", &self.origin, &["http://", "https://"])?;
        check_scheme("login_url", &self.login_url, &["http://", "https://"])?;
        check_scheme("page_url", &self.page_url, &["http://", "https://"])?;
        Ok(())
    }
}

fn check_scheme(field: &'static str, url: &str, schemes: &[&str]) -> Result<(), ConfigError> {
    if schemes.iter().any(|s| url.starts_with(s)) {
        Ok(())
    } else {
        Err(ConfigError::InvalidUrl {
            field,
            reason: format!("'{}' must start with one of {:?}", url, schemes),
        })
    }
}
