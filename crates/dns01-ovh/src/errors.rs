//! DNS-01 provider error types

use thiserror::Error;

use crate::zone::ZoneLookupError;

/// DNS-01 provider errors
#[derive(Error, Debug)]
pub enum DnsError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Could not determine zone for domain '{domain}': {source}")]
    ZoneResolution {
        domain: String,
        #[source]
        source: ZoneLookupError,
    },

    #[error("OVH API call to {operation} in zone '{zone}' failed: {source}")]
    Remote {
        operation: &'static str,
        zone: String,
        #[source]
        source: ApiError,
    },

    #[error("Unknown record ID for '{fqdn}'")]
    UnknownRecord { fqdn: String },
}

/// Errors returned by the OVH API client
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl DnsError {
    pub(crate) fn remote(operation: &'static str, zone: &str, source: ApiError) -> Self {
        DnsError::Remote {
            operation,
            zone: zone.to_string(),
            source,
        }
    }
}
