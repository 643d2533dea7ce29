//! Minimal embedding example for dns01-core
//!
//! This example drives the reconciler from a custom application with an
//! in-memory provider, the way an ACME client library would embed it.

use dns01_core::traits::{ProviderApiClient, RecordId};
use dns01_core::{ApiError, ChallengeAuthenticator, Result, ZoneRecordReconciler};
use std::collections::BTreeMap;
use std::sync::Mutex;

/// One TXT record held by the in-memory provider
struct StoredRecord {
    zone: String,
    subdomain: String,
    target: String,
}

/// Custom provider keeping its zone contents in memory
struct InMemoryProvider {
    zones: Vec<String>,
    records: Mutex<BTreeMap<u64, StoredRecord>>,
    next_id: Mutex<u64>,
}

impl InMemoryProvider {
    fn new(zones: &[&str]) -> Self {
        Self {
            zones: zones.iter().map(|z| z.to_string()).collect(),
            records: Mutex::new(BTreeMap::new()),
            next_id: Mutex::new(1),
        }
    }
}

#[async_trait::async_trait]
impl ProviderApiClient for InMemoryProvider {
    async fn list_zones(&self) -> std::result::Result<Vec<String>, ApiError> {
        Ok(self.zones.clone())
    }

    async fn query_txt_records(
        &self,
        zone: &str,
        subdomain: &str,
    ) -> std::result::Result<Vec<RecordId>, ApiError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, r)| r.zone == zone && r.subdomain == subdomain)
            .map(|(id, _)| RecordId::from(*id))
            .collect())
    }

    async fn create_txt_record(
        &self,
        zone: &str,
        subdomain: &str,
        target: &str,
        _ttl: u32,
    ) -> std::result::Result<(), ApiError> {
        let mut next_id = self.next_id.lock().unwrap();
        println!("[Embedded] Creating TXT {}.{} = {}", subdomain, zone, target);
        self.records.lock().unwrap().insert(
            *next_id,
            StoredRecord {
                zone: zone.to_string(),
                subdomain: subdomain.to_string(),
                target: target.to_string(),
            },
        );
        *next_id += 1;
        Ok(())
    }

    async fn update_record(
        &self,
        _zone: &str,
        record_id: &RecordId,
        _subdomain: &str,
        target: &str,
        _ttl: u32,
    ) -> std::result::Result<(), ApiError> {
        let id: u64 = record_id
            .as_str()
            .parse()
            .map_err(|_| ApiError::api(404, format!("No record {}", record_id)))?;
        match self.records.lock().unwrap().get_mut(&id) {
            Some(record) => {
                record.target = target.to_string();
                Ok(())
            }
            None => Err(ApiError::api(404, format!("No record {}", record_id))),
        }
    }

    async fn delete_record(
        &self,
        _zone: &str,
        record_id: &RecordId,
    ) -> std::result::Result<(), ApiError> {
        println!("[Embedded] Deleting record {}", record_id);
        if let Ok(id) = record_id.as_str().parse::<u64>() {
            self.records.lock().unwrap().remove(&id);
        }
        Ok(())
    }

    async fn refresh_zone(&self, zone: &str) -> std::result::Result<(), ApiError> {
        println!("[Embedded] Zone {} refreshed", zone);
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "embedded"
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("=== Embedded dns01-core Example ===\n");

    let provider = Box::new(InMemoryProvider::new(&["example.com", "example.org"]));
    let (reconciler, mut events) = ZoneRecordReconciler::observed(provider, 32);

    let domain = "www.example.com";
    let record_name = "_acme-challenge.www.example.com";

    // First publish creates, second publish overwrites the same record
    let created = reconciler
        .publish(domain, record_name, "first-token", 1)
        .await?;
    println!("Publish #1: {:?}", created);

    let updated = reconciler
        .publish(domain, record_name, "second-token", 1)
        .await?;
    println!("Publish #2: {:?}", updated);

    let removed = reconciler.remove(domain, record_name).await?;
    println!("Remove: {:?}", removed);

    // Closing the reconciler ends the event stream
    drop(reconciler);

    println!("\nObserved events:");
    while let Some(event) = events.recv().await {
        println!("  {:?}", event);
    }

    println!("\n=== Example completed ===");
    Ok(())
}
