//! Core traits for the DNS-01 reconciler
//!
//! - [`ProviderApiClient`]: Record-management calls against a DNS provider
//! - [`ChallengeAuthenticator`]: The publish/remove entry points a host integrates with

pub mod provider_api;
pub mod authenticator;

pub use provider_api::{ProviderApiClient, ProviderApiFactory, RecordId};
pub use authenticator::{ChallengeAuthenticator, PublishOutcome, RemoveOutcome};
