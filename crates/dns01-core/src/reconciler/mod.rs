//! Zone record reconciler
//!
//! The reconciler owns every decision between "the CA wants a TXT record" and
//! the provider's record-management API:
//!
//! - Which account zone owns the challenged domain
//! - Which part of the record name lives inside that zone
//! - Whether a TXT record already sits at that subdomain
//! - Create, update, or delete, followed by a zone refresh
//!
//! ## Flow
//!
//! ```text
//! publish(domain, record_name, value, ttl)
//!   │
//!   ├─ list_zones ──────────────► zone          (ZoneLookup / ZoneNotFound)
//!   ├─ record_name - "." + zone ► subdomain     (InvalidRecordName)
//!   ├─ query_txt_records ───────► Option<id>    (RecordQuery)
//!   ├─ update_record | create_txt_record        (RecordUpdate / RecordCreate)
//!   └─ refresh_zone                             (ZoneRefresh)
//! ```
//!
//! `remove` follows the same path with `delete_record` (skipped when no record
//! exists) in place of the write.
//!
//! ## Failure policy
//!
//! Fail fast. Each provider error is wrapped once with the step that produced
//! it and returned; nothing is retried or suppressed. The only non-error
//! shortcut is "nothing to delete" during `remove`.
//!
//! ## Known limitations
//!
//! - If several TXT records share the subdomain, only the first one the
//!   provider returns is updated or deleted.
//! - Concurrent `publish`/`remove` calls for the same record are not
//!   serialized; the provider sees last-write-wins.

use crate::error::{Error, Result};
use crate::traits::{
    ChallengeAuthenticator, ProviderApiClient, PublishOutcome, RecordId, RemoveOutcome,
};
use crate::zone;
use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Entry point an event refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Challenge setup
    Publish,
    /// Challenge cleanup
    Remove,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Publish => f.write_str("publish"),
            Operation::Remove => f.write_str("remove"),
        }
    }
}

/// Events emitted by the reconciler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcilerEvent {
    /// The domain was matched to an account zone
    ZoneResolved { domain: String, zone: String },

    /// A new TXT record was created
    RecordCreated { zone: String, subdomain: String },

    /// An existing TXT record was overwritten
    RecordUpdated {
        zone: String,
        subdomain: String,
        record_id: RecordId,
    },

    /// A TXT record was deleted
    RecordDeleted {
        zone: String,
        subdomain: String,
        record_id: RecordId,
    },

    /// Cleanup found nothing to delete
    RecordAbsent { zone: String, subdomain: String },

    /// The zone was refreshed
    ZoneRefreshed { zone: String },

    /// An operation failed
    Failed {
        operation: Operation,
        record_name: String,
        error: String,
    },
}

/// Resolves zones and reconciles challenge TXT records against a provider
///
/// ## Lifecycle
///
/// 1. Create with [`ZoneRecordReconciler::new()`] (or [`ZoneRecordReconciler::observed()`])
/// 2. Call `publish` during challenge setup, `remove` during cleanup
///
/// The reconciler keeps no state between calls; one instance may serve any
/// number of challenges.
pub struct ZoneRecordReconciler {
    /// Provider API client
    client: Box<dyn ProviderApiClient>,

    /// Event sender for an optional caller-owned observer
    observer: Option<mpsc::Sender<ReconcilerEvent>>,
}

impl ZoneRecordReconciler {
    /// Create a reconciler without an observer
    pub fn new(client: Box<dyn ProviderApiClient>) -> Self {
        Self {
            client,
            observer: None,
        }
    }

    /// Create a reconciler with a bounded observer channel
    ///
    /// # Returns
    ///
    /// A tuple of (reconciler, event_receiver)
    pub fn observed(
        client: Box<dyn ProviderApiClient>,
        capacity: usize,
    ) -> (Self, mpsc::Receiver<ReconcilerEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self::new(client).with_observer(tx), rx)
    }

    /// Attach an observer
    pub fn with_observer(mut self, observer: mpsc::Sender<ReconcilerEvent>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Name of the underlying provider
    pub fn provider_name(&self) -> &'static str {
        self.client.provider_name()
    }

    /// Find the account zone that owns `domain`
    ///
    /// Candidates are tried most specific first; the first exact member of
    /// the account's zone list wins.
    pub async fn resolve_zone(&self, domain: &str) -> Result<String> {
        let zones = self
            .client
            .list_zones()
            .await
            .map_err(|source| Error::ZoneLookup { source })?;

        debug!(
            "Account has {} zone(s) at {}",
            zones.len(),
            self.client.provider_name()
        );

        let zone = zone::find_zone(domain, &zones)
            .map(str::to_string)
            .ok_or_else(|| Error::zone_not_found(domain))?;

        debug!("Resolved {} to zone {}", domain, zone);
        self.emit_event(ReconcilerEvent::ZoneResolved {
            domain: domain.to_string(),
            zone: zone.clone(),
        });
        Ok(zone)
    }

    /// Identifier of the TXT record at `subdomain` in `zone`, if any
    pub async fn find_existing_record(
        &self,
        zone: &str,
        subdomain: &str,
    ) -> Result<Option<RecordId>> {
        let records = self
            .client
            .query_txt_records(zone, subdomain)
            .await
            .map_err(|source| Error::RecordQuery {
                zone: zone.to_string(),
                subdomain: subdomain.to_string(),
                source,
            })?;

        if records.len() > 1 {
            warn!(
                "{} TXT records at {} in {}; only {} will be touched",
                records.len(),
                subdomain,
                zone,
                records[0]
            );
        }

        Ok(records.into_iter().next())
    }

    /// Zone-relative part of `record_name`
    fn subdomain_of<'a>(record_name: &'a str, zone: &str) -> Result<&'a str> {
        zone::subdomain_within(record_name, zone)
            .ok_or_else(|| Error::invalid_record_name(record_name, zone))
    }

    async fn refresh(&self, zone: &str) -> Result<()> {
        self.client
            .refresh_zone(zone)
            .await
            .map_err(|source| Error::ZoneRefresh {
                zone: zone.to_string(),
                source,
            })?;

        debug!("Refreshed zone {}", zone);
        self.emit_event(ReconcilerEvent::ZoneRefreshed {
            zone: zone.to_string(),
        });
        Ok(())
    }

    async fn do_publish(
        &self,
        domain: &str,
        record_name: &str,
        record_value: &str,
        ttl: u32,
    ) -> Result<PublishOutcome> {
        let zone = self.resolve_zone(domain).await?;
        let subdomain = Self::subdomain_of(record_name, &zone)?;

        let outcome = match self.find_existing_record(&zone, subdomain).await? {
            Some(record_id) => {
                debug!("Updating record {} ({}) in {}", record_id, subdomain, zone);
                self.client
                    .update_record(&zone, &record_id, subdomain, record_value, ttl)
                    .await
                    .map_err(|source| Error::RecordUpdate {
                        zone: zone.clone(),
                        subdomain: subdomain.to_string(),
                        record_id: record_id.clone(),
                        source,
                    })?;

                self.emit_event(ReconcilerEvent::RecordUpdated {
                    zone: zone.clone(),
                    subdomain: subdomain.to_string(),
                    record_id: record_id.clone(),
                });
                PublishOutcome::Updated {
                    zone: zone.clone(),
                    subdomain: subdomain.to_string(),
                    record_id,
                }
            }
            None => {
                debug!("Adding record to zone {}: {}", zone, subdomain);
                self.client
                    .create_txt_record(&zone, subdomain, record_value, ttl)
                    .await
                    .map_err(|source| Error::RecordCreate {
                        zone: zone.clone(),
                        subdomain: subdomain.to_string(),
                        source,
                    })?;

                self.emit_event(ReconcilerEvent::RecordCreated {
                    zone: zone.clone(),
                    subdomain: subdomain.to_string(),
                });
                PublishOutcome::Created {
                    zone: zone.clone(),
                    subdomain: subdomain.to_string(),
                }
            }
        };

        self.refresh(&zone).await?;
        Ok(outcome)
    }

    async fn do_remove(&self, domain: &str, record_name: &str) -> Result<RemoveOutcome> {
        let zone = self.resolve_zone(domain).await?;
        let subdomain = Self::subdomain_of(record_name, &zone)?;

        let outcome = match self.find_existing_record(&zone, subdomain).await? {
            Some(record_id) => {
                debug!("Deleting record {} ({}) in {}", record_id, subdomain, zone);
                self.client
                    .delete_record(&zone, &record_id)
                    .await
                    .map_err(|source| Error::RecordDelete {
                        zone: zone.clone(),
                        subdomain: subdomain.to_string(),
                        record_id: record_id.clone(),
                        source,
                    })?;

                self.emit_event(ReconcilerEvent::RecordDeleted {
                    zone: zone.clone(),
                    subdomain: subdomain.to_string(),
                    record_id: record_id.clone(),
                });
                RemoveOutcome::Deleted {
                    zone: zone.clone(),
                    subdomain: subdomain.to_string(),
                    record_id,
                }
            }
            None => {
                debug!("No TXT record at {} in {}, nothing to delete", subdomain, zone);
                self.emit_event(ReconcilerEvent::RecordAbsent {
                    zone: zone.clone(),
                    subdomain: subdomain.to_string(),
                });
                RemoveOutcome::Absent {
                    zone: zone.clone(),
                    subdomain: subdomain.to_string(),
                }
            }
        };

        self.refresh(&zone).await?;
        Ok(outcome)
    }

    fn report_failure(&self, operation: Operation, record_name: &str, error: &Error) {
        warn!("{} of {} failed: {}", operation, record_name, error);
        self.emit_event(ReconcilerEvent::Failed {
            operation,
            record_name: record_name.to_string(),
            error: error.to_string(),
        });
    }

    /// Emit a reconciler event
    ///
    /// A full channel drops the event.
    fn emit_event(&self, event: ReconcilerEvent) {
        if let Some(observer) = &self.observer
            && observer.try_send(event).is_err()
        {
            warn!("Observer channel full or closed, dropping reconciler event");
        }
    }
}

#[async_trait]
impl ChallengeAuthenticator for ZoneRecordReconciler {
    async fn publish(
        &self,
        domain: &str,
        record_name: &str,
        record_value: &str,
        ttl: u32,
    ) -> Result<PublishOutcome> {
        info!(
            "Publishing TXT record {} via {} (ttl: {})",
            record_name,
            self.client.provider_name(),
            ttl
        );

        match self.do_publish(domain, record_name, record_value, ttl).await {
            Ok(outcome) => {
                match &outcome {
                    PublishOutcome::Created { zone, .. } => {
                        info!("Created TXT record {} in zone {}", record_name, zone)
                    }
                    PublishOutcome::Updated { zone, record_id, .. } => info!(
                        "Updated TXT record {} (id: {}) in zone {}",
                        record_name, record_id, zone
                    ),
                }
                Ok(outcome)
            }
            Err(e) => {
                self.report_failure(Operation::Publish, record_name, &e);
                Err(e)
            }
        }
    }

    async fn remove(&self, domain: &str, record_name: &str) -> Result<RemoveOutcome> {
        info!(
            "Removing TXT record {} via {}",
            record_name,
            self.client.provider_name()
        );

        match self.do_remove(domain, record_name).await {
            Ok(outcome) => {
                match &outcome {
                    RemoveOutcome::Deleted { zone, record_id, .. } => info!(
                        "Deleted TXT record {} (id: {}) from zone {}",
                        record_name, record_id, zone
                    ),
                    RemoveOutcome::Absent { zone, .. } => {
                        info!("TXT record {} not present in zone {}", record_name, zone)
                    }
                }
                Ok(outcome)
            }
            Err(e) => {
                self.report_failure(Operation::Remove, record_name, &e);
                Err(e)
            }
        }
    }
}
