//! Client Configuration
//!
//! Credentials and request defaults for the Rakuten Web Service client.

use serde::{Deserialize, Serialize};

/// Default user agent sent with every request
pub const DEFAULT_USER_AGENT: &str = concat!("rakuten-ws/", env!("CARGO_PKG_VERSION"));

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ClientConfig {
    /// Application id issued by the Rakuten developer portal
    #[serde(default)]
    pub application_id: String,
    /// Affiliate id, attached to requests when present
    #[serde(default)]
    pub affiliate_id: Option<String>,
    /// Response format version (`2` returns records without wrapper objects)
    #[serde(default)]
    pub format_version: Option<u8>,
    /// Overrides the default user agent
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl ClientConfig {
    /// Create a configuration with the given application id
    pub fn new(application_id: &str) -> Self {
        Self {
            application_id: application_id.to_string(),
            ..Self::default()
        }
    }

    /// Set the affiliate id
    pub fn with_affiliate_id(mut self, affiliate_id: &str) -> Self {
        self.affiliate_id = Some(affiliate_id.to_string());
        self
    }

    /// Set the response format version
    pub fn with_format_version(mut self, version: u8) -> Self {
        self.format_version = Some(version);
        self
    }

    /// Get effective user agent (configured > default)
    pub fn effective_user_agent(&self) -> &str {
        self.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT)
    }

    /// Query parameters every request carries, in wire form
    pub fn credential_params(&self) -> Vec<(String, String)> {
        let mut params = vec![("applicationId".to_string(), self.application_id.clone())];
        if let Some(ref affiliate_id) = self.affiliate_id {
            params.push(("affiliateId".to_string(), affiliate_id.clone()));
        }
        if let Some(version) = self.format_version {
            params.push(("formatVersion".to_string(), version.to_string()));
        }
        params
    }
}
