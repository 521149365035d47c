//! Authoritative zone discovery
//!
//! Record management calls must target the zone that actually holds a name,
//! which may sit several labels above it (`_acme-challenge.foo.bar.example.com`
//! lives in `example.com` unless `bar.example.com` is delegated).

use async_trait::async_trait;
use hickory_resolver::proto::rr::RecordType;
use hickory_resolver::{ResolveError, TokioResolver};
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, trace};

/// Zone lookup errors
#[derive(Error, Debug)]
pub enum ZoneLookupError {
    #[error("no authoritative zone found for '{0}'")]
    NotFound(String),

    #[error("resolver error: {0}")]
    Resolver(#[from] ResolveError),
}

/// Finds the authoritative zone for a fully-qualified name
#[async_trait]
pub trait ZoneResolver: Send + Sync {
    /// Returns the zone as a fully-qualified name (with trailing dot)
    async fn find_zone_by_fqdn(&self, fqdn: &str) -> Result<String, ZoneLookupError>;
}

/// Append the root label if missing
pub fn to_fqdn(name: &str) -> String {
    if name.ends_with('.') {
        name.to_string()
    } else {
        format!("{}.", name)
    }
}

/// Strip the root label if present
pub fn un_fqdn(name: &str) -> &str {
    name.strip_suffix('.').unwrap_or(name)
}

/// Record name relative to `zone`
///
/// Everything before the first `.{zone}` in the unqualified `fqdn`, or the
/// whole unqualified name when the zone suffix is absent.
pub fn extract_record_name(fqdn: &str, zone: &str) -> String {
    let name = un_fqdn(fqdn);
    match name.find(&format!(".{}", zone)) {
        Some(idx) => name[..idx].to_string(),
        None => name.to_string(),
    }
}

/// Every suffix of `fqdn`, most specific first: `a.b.c.` -> `a.b.c.`, `b.c.`, `c.`
fn candidate_zones(fqdn: &str) -> impl Iterator<Item = &str> {
    let name = un_fqdn(fqdn);
    std::iter::once(0)
        .chain(name.match_indices('.').map(|(idx, _)| idx + 1))
        .map(move |start| &fqdn[start..])
        .filter(|candidate| !candidate.is_empty() && *candidate != ".")
}

/// Zone discovery through SOA lookups against the system resolvers
pub struct SoaZoneResolver {
    resolver: TokioResolver,
    cache: RwLock<HashMap<String, String>>,
}

impl SoaZoneResolver {
    /// Create a resolver from the system DNS configuration
    pub fn new() -> Result<Self, ZoneLookupError> {
        let resolver = TokioResolver::builder_tokio()?.build();
        Ok(Self::with_resolver(resolver))
    }

    pub fn with_resolver(resolver: TokioResolver) -> Self {
        Self {
            resolver,
            cache: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl ZoneResolver for SoaZoneResolver {
    async fn find_zone_by_fqdn(&self, fqdn: &str) -> Result<String, ZoneLookupError> {
        let fqdn = to_fqdn(fqdn);

        if let Some(zone) = self.cache.read().await.get(&fqdn) {
            trace!(fqdn = %fqdn, zone = %zone, "Zone found in cache");
            return Ok(zone.clone());
        }

        for candidate in candidate_zones(&fqdn) {
            let lookup = match self.resolver.soa_lookup(candidate.to_string()).await {
                Ok(lookup) => lookup,
                Err(e) if e.is_no_records_found() || e.is_nx_domain() => {
                    trace!(candidate = %candidate, error = %e, "No SOA record");
                    continue;
                }
                Err(e) => {
                    debug!(candidate = %candidate, error = %e, "SOA lookup failed");
                    return Err(ZoneLookupError::Resolver(e));
                }
            };

            let records = lookup.as_lookup().records();

            // An aliased name is not a zone apex
            if records
                .iter()
                .any(|record| record.record_type() == RecordType::CNAME)
            {
                trace!(candidate = %candidate, "Skipping CNAME");
                continue;
            }

            let soa_owner = records
                .iter()
                .find(|record| record.record_type() == RecordType::SOA)
                .map(|record| to_fqdn(&record.name().to_utf8()));

            if let Some(zone) = soa_owner {
                debug!(fqdn = %fqdn, zone = %zone, "Found authoritative zone");
                self.cache.write().await.insert(fqdn.clone(), zone.clone());
                return Ok(zone);
            }
        }

        Err(ZoneLookupError::NotFound(fqdn))
    }
}

/// Zone discovery against a fixed list of zones
///
/// The longest zone that equals or is a parent of the name wins.
#[derive(Debug, Clone, Default)]
pub struct StaticZoneResolver {
    zones: Vec<String>,
}

impl StaticZoneResolver {
    pub fn new<I, S>(zones: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            zones: zones
                .into_iter()
                .map(|z| un_fqdn(z.as_ref()).to_lowercase())
                .collect(),
        }
    }
}

#[async_trait]
impl ZoneResolver for StaticZoneResolver {
    async fn find_zone_by_fqdn(&self, fqdn: &str) -> Result<String, ZoneLookupError> {
        let name = un_fqdn(fqdn).to_lowercase();

        self.zones
            .iter()
            .filter(|zone| name == **zone || name.ends_with(&format!(".{}", zone)))
            .max_by_key(|zone| zone.len())
            .map(|zone| to_fqdn(zone))
            .ok_or_else(|| ZoneLookupError::NotFound(to_fqdn(fqdn)))
    }
}
