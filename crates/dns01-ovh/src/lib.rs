//! DNS-01 challenge provider for OVH
//!
//! This crate publishes and removes the TXT records used by the ACME DNS-01
//! challenge, through the OVH DNS API.
//!
//! # Features
//!
//! - **Zone discovery**: finds the authoritative zone of any (possibly deeply
//!   delegated) domain through SOA lookups
//! - **Record tracking**: remembers the OVH record ID of each challenge record
//!   so cleanup deletes exactly what was created
//! - **Concurrent use**: one provider can serve many domains at once
//!
//! # Usage
//!
//! ```ignore
//! use dns01_ovh::{ChallengeProvider, OvhDnsProvider};
//!
//! let provider = OvhDnsProvider::from_env()?;
//!
//! provider.present("example.com", &token, &key_auth).await?;
//! // ... the ACME server validates the record ...
//! provider.clean_up("example.com", &token, &key_auth).await?;
//! ```

pub mod challenge;
pub mod errors;
pub mod ledger;
pub mod providers;
pub mod zone;

// Re-export main types
pub use challenge::{dns01_record, ChallengeProvider, ChallengeRecord};
pub use errors::{ApiError, DnsError};
pub use ledger::RecordLedger;
pub use providers::{OvhClient, OvhConfig, OvhCredentials, OvhDnsProvider};
pub use zone::{SoaZoneResolver, StaticZoneResolver, ZoneLookupError, ZoneResolver};
