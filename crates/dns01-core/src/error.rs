//! Error types for the DNS-01 reconciler
//!
//! Two layers are defined here:
//!
//! - [`ApiError`]: what a [`ProviderApiClient`](crate::traits::ProviderApiClient)
//!   returns when a single provider call fails. The reconciler never inspects
//!   its variants.
//! - [`Error`]: what the reconciler surfaces to its caller. Every provider
//!   failure is wrapped exactly once, at the call site that triggered it, with
//!   the zone and subdomain it concerned.

use crate::traits::RecordId;
use thiserror::Error;

/// Result type alias for reconciler operations
pub type Result<T> = std::result::Result<T, Error>;

/// Failure of a single Provider API call
#[derive(Error, Debug)]
pub enum ApiError {
    /// Transport-level failure (connection refused, timeout, TLS...)
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// The provider answered with a non-success status
    #[error("API error (status {status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Provider-supplied message, or the raw body
        message: String,
    },

    /// The provider answered, but the body could not be understood
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Anything else
    #[error("{0}")]
    Other(String),
}

impl ApiError {
    /// Create a transport error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create an error from a non-success API status
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create an invalid-response error
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }
}

/// Core error type for the DNS-01 reconciler
#[derive(Error, Debug)]
pub enum Error {
    /// The zone list could not be retrieved
    #[error("Error retrieving DNS zones: {source}")]
    ZoneLookup {
        /// Underlying provider error
        source: ApiError,
    },

    /// No zone on the account is a suffix of the challenged domain
    #[error(
        "Unable to determine DNS zone for {domain}. Please confirm that the domain name has \
         been entered correctly and is already associated with the supplied provider account."
    )]
    ZoneNotFound {
        /// The domain that could not be resolved
        domain: String,
    },

    /// The record name does not live inside the resolved zone
    #[error("Record name {record_name} is not in DNS zone {zone}.")]
    InvalidRecordName {
        /// Record name supplied by the caller
        record_name: String,
        /// Zone resolved from the domain
        zone: String,
    },

    /// Existing TXT records could not be queried
    #[error("Error querying TXT record of {subdomain} in {zone}: {source}")]
    RecordQuery {
        /// Zone queried
        zone: String,
        /// Subdomain queried
        subdomain: String,
        /// Underlying provider error
        source: ApiError,
    },

    /// A new TXT record could not be created
    #[error("Error creating TXT record {subdomain} in {zone}: {source}")]
    RecordCreate {
        /// Zone of the record
        zone: String,
        /// Subdomain of the record
        subdomain: String,
        /// Underlying provider error
        source: ApiError,
    },

    /// An existing TXT record could not be overwritten
    #[error("Error updating TXT record {record_id} ({subdomain}) in {zone}: {source}")]
    RecordUpdate {
        /// Zone of the record
        zone: String,
        /// Subdomain of the record
        subdomain: String,
        /// Provider identifier of the record
        record_id: RecordId,
        /// Underlying provider error
        source: ApiError,
    },

    /// An existing TXT record could not be deleted
    #[error("Error deleting TXT record {record_id} ({subdomain}) in {zone}: {source}")]
    RecordDelete {
        /// Zone of the record
        zone: String,
        /// Subdomain of the record
        subdomain: String,
        /// Provider identifier of the record
        record_id: RecordId,
        /// Underlying provider error
        source: ApiError,
    },

    /// The zone could not be refreshed after a change
    #[error("Error refreshing DNS zone {zone}: {source}")]
    ZoneRefresh {
        /// Zone that failed to refresh
        zone: String,
        /// Underlying provider error
        source: ApiError,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a "zone not found" error
    pub fn zone_not_found(domain: impl Into<String>) -> Self {
        Self::ZoneNotFound {
            domain: domain.into(),
        }
    }

    /// Create an "invalid record name" error
    pub fn invalid_record_name(record_name: impl Into<String>, zone: impl Into<String>) -> Self {
        Self::InvalidRecordName {
            record_name: record_name.into(),
            zone: zone.into(),
        }
    }

    /// Whether this failure happened while refreshing the zone
    ///
    /// When `true`, the preceding create/update/delete already succeeded; the
    /// change exists at the provider but may not be served yet.
    pub fn is_zone_refresh(&self) -> bool {
        matches!(self, Self::ZoneRefresh { .. })
    }

    /// Whether the user can fix this by correcting their setup
    pub fn is_user_actionable(&self) -> bool {
        matches!(self, Self::ZoneNotFound { .. } | Self::Config(_))
    }
}
