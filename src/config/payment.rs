//! Payment provider configuration (PixFlow gateway and Vendra checkout).

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// PixFlow gateway configuration (polling-style provider).
#[derive(Debug, Clone, Deserialize)]
pub struct PixflowConfig {
    /// API bearer token.
    pub api_token: SecretString,

    /// Base URL for the PixFlow API.
    #[serde(default = "default_pixflow_url")]
    pub base_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,

    /// Seconds between status fetches while a payment is pending.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Overall polling deadline in seconds; after this the watcher gives up
    /// silently.
    #[serde(default = "default_poll_deadline")]
    pub poll_deadline_secs: u64,
}

impl PixflowConfig {
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn poll_deadline(&self) -> Duration {
        Duration::from_secs(self.poll_deadline_secs)
    }

    /// Validate gateway configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.api_token.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired("PIXFLOW_API_TOKEN"));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ValidationError::InvalidGatewayUrl);
        }
        if self.poll_interval_secs == 0 || self.poll_interval_secs >= self.poll_deadline_secs {
            return Err(ValidationError::InvalidPollingWindow);
        }
        Ok(())
    }
}

/// Vendra checkout platform configuration (webhook-style provider).
#[derive(Debug, Clone, Deserialize)]
pub struct VendraConfig {
    /// OAuth client id for the account API.
    #[serde(default)]
    pub client_id: String,

    /// OAuth client secret for the account API.
    #[serde(default)]
    pub client_secret: Option<SecretString>,

    /// Seller account id.
    #[serde(default)]
    pub account_id: String,

    /// Base URL for the Vendra public API.
    #[serde(default = "default_vendra_url")]
    pub base_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,

    /// Static shared secret expected on inbound webhooks.
    pub webhook_token: SecretString,
}

impl VendraConfig {
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Whether the account API credentials are present.
    ///
    /// The webhook path only needs `webhook_token`; the account API client
    /// refuses construction without the full credential set.
    pub fn has_api_credentials(&self) -> bool {
        !self.client_id.is_empty()
            && self
                .client_secret
                .as_ref()
                .is_some_and(|s| !s.expose_secret().is_empty())
            && !self.account_id.is_empty()
    }

    /// Validate checkout provider configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.webhook_token.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired("VENDRA_WEBHOOK_TOKEN"));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ValidationError::InvalidGatewayUrl);
        }
        Ok(())
    }
}

fn default_pixflow_url() -> String {
    "https://api.pixflow.app/v1".to_string()
}

fn default_vendra_url() -> String {
    "https://public-api.vendra.com.br".to_string()
}

fn default_http_timeout() -> u64 {
    15
}

fn default_poll_interval() -> u64 {
    5
}

fn default_poll_deadline() -> u64 {
    600
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pixflow() -> PixflowConfig {
        PixflowConfig {
            api_token: SecretString::new("tok_test".to_string()),
            base_url: default_pixflow_url(),
            http_timeout_secs: 15,
            poll_interval_secs: 5,
            poll_deadline_secs: 600,
        }
    }

    fn vendra() -> VendraConfig {
        VendraConfig {
            client_id: "cid".to_string(),
            client_secret: Some(SecretString::new("csecret".to_string())),
            account_id: "acct".to_string(),
            base_url: default_vendra_url(),
            http_timeout_secs: 15,
            webhook_token: SecretString::new("whtok".to_string()),
        }
    }

    #[test]
    fn pixflow_defaults_are_provider_defaults() {
        let config = pixflow();
        assert_eq!(config.poll_interval(), Duration::from_secs(5));
        assert_eq!(config.poll_deadline(), Duration::from_secs(600));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn pixflow_rejects_empty_token() {
        let config = PixflowConfig {
            api_token: SecretString::new(String::new()),
            ..pixflow()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn pixflow_rejects_interval_at_or_past_deadline() {
        let config = PixflowConfig {
            poll_interval_secs: 600,
            ..pixflow()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn vendra_credentials_detection() {
        assert!(vendra().has_api_credentials());

        let partial = VendraConfig {
            client_secret: None,
            ..vendra()
        };
        assert!(!partial.has_api_credentials());
    }

    #[test]
    fn vendra_requires_webhook_token() {
        let config = VendraConfig {
            webhook_token: SecretString::new(String::new()),
            ..vendra()
        };
        assert!(config.validate().is_err());
    }
}
