//! Record ledger
//!
//! Tracks the OVH record IDs created for challenge records, keyed by the
//! record's fully-qualified name, so a later cleanup can delete exactly the
//! record its matching `present` created.

use std::collections::HashMap;
use tokio::sync::RwLock;

/// Concurrency-safe map from challenge FQDN to remote record ID
///
/// The lock is taken for the map access only; callers never hold it across
/// an API call.
#[derive(Debug, Default)]
pub struct RecordLedger {
    records: RwLock<HashMap<String, i64>>,
}

impl RecordLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the record ID for `fqdn`, returning the ID it replaced
    pub async fn insert(&self, fqdn: &str, record_id: i64) -> Option<i64> {
        self.records.write().await.insert(fqdn.to_string(), record_id)
    }

    pub async fn get(&self, fqdn: &str) -> Option<i64> {
        self.records.read().await.get(fqdn).copied()
    }

    pub async fn remove(&self, fqdn: &str) -> Option<i64> {
        self.records.write().await.remove(fqdn)
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_insert_get_remove() {
        let ledger = RecordLedger::new();
        assert!(ledger.is_empty().await);

        assert_eq!(ledger.insert("_acme-challenge.example.com.", 42).await, None);
        assert_eq!(ledger.get("_acme-challenge.example.com.").await, Some(42));
        assert_eq!(ledger.len().await, 1);

        assert_eq!(ledger.remove("_acme-challenge.example.com.").await, Some(42));
        assert_eq!(ledger.get("_acme-challenge.example.com.").await, None);
        assert!(ledger.is_empty().await);
    }

    #[tokio::test]
    async fn test_insert_overwrites() {
        let ledger = RecordLedger::new();

        ledger.insert("_acme-challenge.example.com.", 1).await;
        assert_eq!(ledger.insert("_acme-challenge.example.com.", 2).await, Some(1));
        assert_eq!(ledger.get("_acme-challenge.example.com.").await, Some(2));
        assert_eq!(ledger.len().await, 1);
    }

    #[tokio::test]
    async fn test_remove_missing() {
        let ledger = RecordLedger::new();
        assert_eq!(ledger.remove("_acme-challenge.example.com.").await, None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_inserts() {
        let ledger = Arc::new(RecordLedger::new());

        let handles: Vec<_> = (0..64)
            .map(|i| {
                let ledger = ledger.clone();
                tokio::spawn(async move {
                    ledger
                        .insert(&format!("_acme-challenge.d{}.example.com.", i), i)
                        .await;
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(ledger.len().await, 64);
        for i in 0..64 {
            assert_eq!(
                ledger
                    .get(&format!("_acme-challenge.d{}.example.com.", i))
                    .await,
                Some(i)
            );
        }
    }
}
