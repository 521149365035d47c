//! OVH DNS-01 challenge provider
//!
//! Publishes the challenge TXT record through the OVH API, refreshes the
//! zone so the record goes live, and remembers the record ID so the matching
//! cleanup can delete it.
//!
//! Known limitations:
//! - A second `present` for the same record name replaces the remembered ID;
//!   the earlier remote record is left in the zone.
//! - If the zone refresh fails after the record was created, `present` fails
//!   and the record ID is not remembered, so `clean_up` reports an unknown
//!   record while the stray record still exists remotely.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::client::OvhClient;
use super::credentials::{OvhConfig, OvhCredentials};
use crate::challenge::{dns01_record, ChallengeProvider};
use crate::errors::DnsError;
use crate::ledger::RecordLedger;
use crate::zone::{extract_record_name, to_fqdn, un_fqdn, SoaZoneResolver, ZoneResolver};

/// Request body for `POST /domain/zone/{zone}/record`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TxtRecordRequest<'a> {
    field_type: &'a str,
    sub_domain: &'a str,
    target: &'a str,
    ttl: u32,
}

/// Response of `POST /domain/zone/{zone}/record`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TxtRecordResponse {
    id: i64,
    #[serde(default)]
    sub_domain: String,
    #[serde(default)]
    zone: String,
}

/// DNS-01 challenge provider backed by OVH DNS
pub struct OvhDnsProvider {
    client: OvhClient,
    resolver: Arc<dyn ZoneResolver>,
    ledger: RecordLedger,
}

impl OvhDnsProvider {
    /// Create a provider from the four OVH credential strings
    ///
    /// No network call is made; zones are discovered through SOA lookups
    /// against the system resolvers.
    pub fn new(
        endpoint: &str,
        application_key: &str,
        application_secret: &str,
        consumer_key: &str,
    ) -> Result<Self, DnsError> {
        let credentials =
            OvhCredentials::new(endpoint, application_key, application_secret, consumer_key);
        Self::from_config(OvhConfig::new(credentials))
    }

    /// Create a provider from `OVH_*` environment variables
    pub fn from_env() -> Result<Self, DnsError> {
        Self::from_config(OvhConfig::from_env()?)
    }

    pub fn from_config(config: OvhConfig) -> Result<Self, DnsError> {
        // Validate before touching the system resolver configuration
        config.credentials.validate()?;

        let resolver = SoaZoneResolver::new().map_err(|e| {
            DnsError::Configuration(format!("Failed to create DNS resolver: {}", e))
        })?;
        Self::with_resolver(config, Arc::new(resolver))
    }

    /// Create a provider that discovers zones through `resolver`
    pub fn with_resolver(
        config: OvhConfig,
        resolver: Arc<dyn ZoneResolver>,
    ) -> Result<Self, DnsError> {
        let client = OvhClient::new(
            &config.credentials,
            Duration::from_secs(config.http_timeout_secs),
        )?;

        debug!(credentials = %config.credentials.masked(), "Created OVH DNS provider");

        Ok(Self {
            client,
            resolver,
            ledger: RecordLedger::new(),
        })
    }

    /// Record IDs currently owned by this provider
    pub fn ledger(&self) -> &RecordLedger {
        &self.ledger
    }

    /// Resolve the authoritative zone for `domain`, without the trailing dot
    async fn auth_zone(&self, domain: &str) -> Result<String, DnsError> {
        let zone = self
            .resolver
            .find_zone_by_fqdn(&to_fqdn(domain))
            .await
            .map_err(|source| {
                warn!(domain = %domain, error = %source, "Zone resolution failed");
                DnsError::ZoneResolution {
                    domain: domain.to_string(),
                    source,
                }
            })?;

        Ok(un_fqdn(&zone).to_string())
    }
}

#[async_trait]
impl ChallengeProvider for OvhDnsProvider {
    async fn present(&self, domain: &str, _token: &str, key_auth: &str) -> Result<(), DnsError> {
        let record = dns01_record(domain, key_auth);
        let zone = self.auth_zone(domain).await?;
        let sub_domain = extract_record_name(&record.fqdn, &zone);

        debug!(
            domain = %domain,
            zone = %zone,
            sub_domain = %sub_domain,
            "Creating challenge TXT record"
        );

        let request = TxtRecordRequest {
            field_type: "TXT",
            sub_domain: &sub_domain,
            target: &record.value,
            ttl: record.ttl,
        };

        let created: TxtRecordResponse = self
            .client
            .post(&format!("/domain/zone/{}/record", zone), &request)
            .await
            .map_err(|e| DnsError::remote("add record", &zone, e))?;

        self.client
            .post_empty(&format!("/domain/zone/{}/refresh", zone))
            .await
            .map_err(|e| {
                warn!(
                    zone = %zone,
                    record_id = created.id,
                    "Zone refresh failed after record creation, record left in zone"
                );
                DnsError::remote("refresh zone", &zone, e)
            })?;

        if let Some(previous) = self.ledger.insert(&record.fqdn, created.id).await {
            warn!(
                fqdn = %record.fqdn,
                previous_id = previous,
                record_id = created.id,
                "Replaced record ID for challenge record, previous record left in zone"
            );
        }

        info!(
            fqdn = %record.fqdn,
            zone = %created.zone,
            sub_domain = %created.sub_domain,
            record_id = created.id,
            "Challenge TXT record created"
        );
        Ok(())
    }

    async fn clean_up(&self, domain: &str, _token: &str, key_auth: &str) -> Result<(), DnsError> {
        let record = dns01_record(domain, key_auth);

        let record_id = self
            .ledger
            .get(&record.fqdn)
            .await
            .ok_or_else(|| DnsError::UnknownRecord {
                fqdn: record.fqdn.clone(),
            })?;

        let zone = self.auth_zone(domain).await?;

        self.client
            .delete(&format!("/domain/zone/{}/record/{}", zone, record_id))
            .await
            .map_err(|e| DnsError::remote("delete challenge record", &zone, e))?;

        self.ledger.remove(&record.fqdn).await;

        info!(fqdn = %record.fqdn, zone = %zone, record_id, "Challenge TXT record deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zone::StaticZoneResolver;

    fn config(endpoint: &str) -> OvhConfig {
        OvhConfig::new(OvhCredentials::new(endpoint, "ak", "as", "ck"))
    }

    #[test]
    fn test_new_rejects_empty_credentials() {
        for (endpoint, ak, secret, ck) in [
            ("", "ak", "as", "ck"),
            ("ovh-eu", "", "as", "ck"),
            ("ovh-eu", "ak", "", "ck"),
            ("ovh-eu", "ak", "as", ""),
        ] {
            let result = OvhDnsProvider::new(endpoint, ak, secret, ck);
            assert!(matches!(result, Err(DnsError::Configuration(_))));
        }
    }

    #[test]
    fn test_unknown_endpoint() {
        let resolver = Arc::new(StaticZoneResolver::new(["example.com"]));
        let result = OvhDnsProvider::with_resolver(config("ovh-mars"), resolver);
        assert!(matches!(result, Err(DnsError::Configuration(_))));
    }

    #[test]
    fn test_request_wire_shape() {
        let request = TxtRecordRequest {
            field_type: "TXT",
            sub_domain: "_acme-challenge.sub",
            target: "value",
            ttl: 120,
        };

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({
                "fieldType": "TXT",
                "subDomain": "_acme-challenge.sub",
                "target": "value",
                "ttl": 120
            })
        );
    }

    #[test]
    fn test_response_wire_shape() {
        let response: TxtRecordResponse = serde_json::from_value(serde_json::json!({
            "id": 1234567,
            "fieldType": "TXT",
            "subDomain": "_acme-challenge",
            "target": "value",
            "ttl": 120,
            "zone": "example.com"
        }))
        .unwrap();

        assert_eq!(response.id, 1234567);
        assert_eq!(response.zone, "example.com");
        assert_eq!(response.sub_domain, "_acme-challenge");
    }

    #[test]
    fn test_response_without_echoed_fields() {
        let response: TxtRecordResponse =
            serde_json::from_value(serde_json::json!({ "id": 7 })).unwrap();

        assert_eq!(response.id, 7);
        assert!(response.zone.is_empty());
        assert!(response.sub_domain.is_empty());
    }
}
