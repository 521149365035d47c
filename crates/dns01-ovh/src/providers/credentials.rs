//! OVH credentials and provider configuration
//!
//! OVH authenticates API calls with an application key/secret pair and a
//! consumer key granted to that application.
//!
//! Create a token at: https://eu.api.ovh.com/createToken/

use serde::{Deserialize, Serialize};

use crate::errors::DnsError;

pub const ENV_ENDPOINT: &str = "OVH_ENDPOINT";
pub const ENV_APPLICATION_KEY: &str = "OVH_APPLICATION_KEY";
pub const ENV_APPLICATION_SECRET: &str = "OVH_APPLICATION_SECRET";
pub const ENV_CONSUMER_KEY: &str = "OVH_CONSUMER_KEY";
pub const ENV_HTTP_TIMEOUT: &str = "OVH_HTTP_TIMEOUT";

/// OVH API credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OvhCredentials {
    /// Endpoint alias (`ovh-eu`, `ovh-ca`, ...) or an explicit base URL
    pub endpoint: String,

    pub application_key: String,

    pub application_secret: String,

    pub consumer_key: String,
}

impl OvhCredentials {
    pub fn new(
        endpoint: impl Into<String>,
        application_key: impl Into<String>,
        application_secret: impl Into<String>,
        consumer_key: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            application_key: application_key.into(),
            application_secret: application_secret.into(),
            consumer_key: consumer_key.into(),
        }
    }

    /// Reject credentials with any empty field
    pub fn validate(&self) -> Result<(), DnsError> {
        let missing: Vec<&str> = [
            ("endpoint", &self.endpoint),
            ("application_key", &self.application_key),
            ("application_secret", &self.application_secret),
            ("consumer_key", &self.consumer_key),
        ]
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(DnsError::Configuration(format!(
                "OVH credentials missing: {}",
                missing.join(", ")
            )))
        }
    }

    /// Log-safe representation
    pub fn masked(&self) -> serde_json::Value {
        serde_json::json!({
            "endpoint": self.endpoint.clone(),
            "application_key": mask_string(&self.application_key),
            "application_secret": "***",
            "consumer_key": mask_string(&self.consumer_key),
        })
    }
}

/// OVH provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OvhConfig {
    #[serde(flatten)]
    pub credentials: OvhCredentials,

    /// Timeout for each API request, in seconds
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
}

fn default_http_timeout_secs() -> u64 {
    30
}

impl OvhConfig {
    pub fn new(credentials: OvhCredentials) -> Self {
        Self {
            credentials,
            http_timeout_secs: default_http_timeout_secs(),
        }
    }

    /// Load the configuration from `OVH_*` environment variables
    pub fn from_env() -> Result<Self, DnsError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, DnsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut missing = Vec::new();
        let mut required = |name: &'static str| match lookup(name).filter(|v| !v.is_empty()) {
            Some(value) => value,
            None => {
                missing.push(name);
                String::new()
            }
        };

        let credentials = OvhCredentials {
            endpoint: required(ENV_ENDPOINT),
            application_key: required(ENV_APPLICATION_KEY),
            application_secret: required(ENV_APPLICATION_SECRET),
            consumer_key: required(ENV_CONSUMER_KEY),
        };

        if !missing.is_empty() {
            return Err(DnsError::Configuration(format!(
                "some credentials information are missing: {}",
                missing.join(",")
            )));
        }

        let http_timeout_secs = match lookup(ENV_HTTP_TIMEOUT) {
            Some(raw) => raw.parse().map_err(|_| {
                DnsError::Configuration(format!("{} must be a number of seconds", ENV_HTTP_TIMEOUT))
            })?,
            None => default_http_timeout_secs(),
        };

        Ok(Self {
            credentials,
            http_timeout_secs,
        })
    }
}

/// Mask a string, showing only first 4 and last 4 characters
fn mask_string(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= 8 {
        "***".to_string()
    } else {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    }
}
