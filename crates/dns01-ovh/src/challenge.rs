//! DNS-01 challenge records
//!
//! The generic challenge provider interface and the derivation of the TXT
//! record a certificate authority expects for a given key authorization.

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use sha2::{Digest, Sha256};

use crate::errors::DnsError;
use crate::zone::to_fqdn;

/// Label prepended to the validated domain
pub const ACME_CHALLENGE_LABEL: &str = "_acme-challenge";

/// TTL for challenge records, in seconds
pub const CHALLENGE_TTL: u32 = 120;

/// A provider that can satisfy DNS-01 challenges
///
/// `clean_up` receives the same arguments as the matching `present`, so
/// implementations must correlate the two from those values alone.
#[async_trait]
pub trait ChallengeProvider: Send + Sync {
    /// Publish the challenge TXT record for `domain`
    async fn present(&self, domain: &str, token: &str, key_auth: &str) -> Result<(), DnsError>;

    /// Remove the record published by `present`
    async fn clean_up(&self, domain: &str, token: &str, key_auth: &str) -> Result<(), DnsError>;
}

/// The TXT record answering a DNS-01 challenge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeRecord {
    /// Fully-qualified record name, e.g. `_acme-challenge.example.com.`
    pub fqdn: String,
    /// base64url (unpadded) SHA-256 digest of the key authorization
    pub value: String,
    pub ttl: u32,
}

/// Derive the challenge record for `domain` and `key_auth`
pub fn dns01_record(domain: &str, key_auth: &str) -> ChallengeRecord {
    let digest = Sha256::digest(key_auth.as_bytes());

    ChallengeRecord {
        fqdn: to_fqdn(&format!("{}.{}", ACME_CHALLENGE_LABEL, domain)),
        value: URL_SAFE_NO_PAD.encode(digest),
        ttl: CHALLENGE_TTL,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_name() {
        let record = dns01_record("example.com", "token.thumbprint");
        assert_eq!(record.fqdn, "_acme-challenge.example.com.");
        assert_eq!(record.ttl, 120);

        let record = dns01_record("foo.bar.example.com.", "token.thumbprint");
        assert_eq!(record.fqdn, "_acme-challenge.foo.bar.example.com.");
    }

    #[test]
    fn test_record_value() {
        // Digest of the empty string
        let record = dns01_record("example.com", "");
        assert_eq!(record.value, "47DEQpj8HBSa-_TImW-5JCeuQeRkm5NMpJWZG3hSuFU");

        let record = dns01_record("example.com", "token.thumbprint");
        assert_eq!(record.value.len(), 43);
        assert!(!record.value.contains('='));
        assert!(!record.value.contains('+'));
        assert!(!record.value.contains('/'));
    }

    #[test]
    fn test_record_is_deterministic() {
        assert_eq!(
            dns01_record("example.com", "abc.def"),
            dns01_record("example.com", "abc.def")
        );
        assert_ne!(
            dns01_record("example.com", "abc.def").value,
            dns01_record("example.com", "abc.xyz").value
        );
    }
}
