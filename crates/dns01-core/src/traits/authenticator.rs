//! Challenge authenticator trait
//!
//! This is the surface a host (certbot hook, ACME client, plugin shim)
//! integrates with. It is deliberately small: install a TXT record, tear it
//! down.

use crate::traits::RecordId;
use async_trait::async_trait;

/// What `publish` did at the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// No TXT record existed at the subdomain; one was created
    Created {
        /// Zone the record lives in
        zone: String,
        /// Zone-relative name of the record
        subdomain: String,
    },
    /// An existing TXT record was overwritten
    Updated {
        /// Zone the record lives in
        zone: String,
        /// Zone-relative name of the record
        subdomain: String,
        /// Identifier of the overwritten record
        record_id: RecordId,
    },
}

impl PublishOutcome {
    /// Zone the record was written to
    pub fn zone(&self) -> &str {
        match self {
            Self::Created { zone, .. } | Self::Updated { zone, .. } => zone,
        }
    }
}

/// What `remove` did at the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// The TXT record was deleted
    Deleted {
        /// Zone the record lived in
        zone: String,
        /// Zone-relative name of the record
        subdomain: String,
        /// Identifier of the deleted record
        record_id: RecordId,
    },
    /// There was nothing to delete
    Absent {
        /// Zone that was searched
        zone: String,
        /// Zone-relative name that was searched
        subdomain: String,
    },
}

/// Publishes and removes DNS-01 challenge records
///
/// # Idempotency
///
/// Both operations must be safe to repeat:
/// - `publish` with an identical record already present updates it in place
/// - `remove` with no record present succeeds without deleting anything
#[async_trait]
pub trait ChallengeAuthenticator: Send + Sync {
    /// Install `record_value` as the TXT record `record_name`
    ///
    /// # Parameters
    ///
    /// - `domain`: The domain being validated (used to find the zone)
    /// - `record_name`: Fully-qualified TXT record name, e.g. `_acme-challenge.example.com`
    /// - `record_value`: The validation token
    /// - `ttl`: Record TTL in seconds
    async fn publish(
        &self,
        domain: &str,
        record_name: &str,
        record_value: &str,
        ttl: u32,
    ) -> crate::Result<PublishOutcome>;

    /// Tear down the TXT record `record_name`
    async fn remove(&self, domain: &str, record_name: &str) -> crate::Result<RemoveOutcome>;
}
