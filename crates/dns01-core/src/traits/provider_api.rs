// # Provider API Client Trait
//
// Defines the record-management capability the reconciler depends on.
//
// ## Implementations
//
// - OVH: `dns01-provider-ovh` crate
//
// ## Usage
//
// ```rust,ignore
// use dns01_core::ProviderApiClient;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let client = /* ProviderApiClient implementation */;
//
//     for zone in client.list_zones().await? {
//         println!("{zone}");
//     }
//
//     Ok(())
// }
// ```

use crate::error::ApiError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque provider-side identifier of a DNS record
///
/// Providers that use numeric identifiers render them to their decimal form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Wrap a provider identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier as sent to the provider
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u64> for RecordId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Record-management calls against a DNS provider
///
/// # Contract
///
/// Implementations are single-shot and stateless beyond their transport and
/// authentication configuration:
///
/// - One provider request per method call
/// - No retries and no backoff; return the error and let the caller decide
/// - No caching of zone or record state between calls
/// - Errors carry a human-readable message; callers only wrap them
///
/// Timeouts are the implementation's responsibility.
#[async_trait]
pub trait ProviderApiClient: Send + Sync {
    /// List every zone known to the account
    async fn list_zones(&self) -> Result<Vec<String>, ApiError>;

    /// List the identifiers of TXT records at exactly `subdomain` in `zone`
    ///
    /// Filtering by type and subdomain happens on the provider side.
    async fn query_txt_records(&self, zone: &str, subdomain: &str)
    -> Result<Vec<RecordId>, ApiError>;

    /// Create a TXT record
    async fn create_txt_record(
        &self,
        zone: &str,
        subdomain: &str,
        target: &str,
        ttl: u32,
    ) -> Result<(), ApiError>;

    /// Overwrite the subdomain, target and TTL of an existing record
    async fn update_record(
        &self,
        zone: &str,
        record_id: &RecordId,
        subdomain: &str,
        target: &str,
        ttl: u32,
    ) -> Result<(), ApiError>;

    /// Delete a record
    async fn delete_record(&self, zone: &str, record_id: &RecordId) -> Result<(), ApiError>;

    /// Push pending edits of `zone` live
    async fn refresh_zone(&self, zone: &str) -> Result<(), ApiError>;

    /// Provider name, for logging (e.g. "ovh")
    fn provider_name(&self) -> &'static str;
}

/// Helper trait for constructing Provider API clients from configuration
pub trait ProviderApiFactory: Send + Sync {
    /// Create a client from provider configuration
    fn create(
        &self,
        config: &crate::config::ProviderConfig,
    ) -> Result<Box<dyn ProviderApiClient>, crate::Error>;
}
