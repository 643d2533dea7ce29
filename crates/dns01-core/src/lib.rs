// # dns01-core
//
// Core library for solving ACME DNS-01 challenges against a DNS provider API.
//
// ## Architecture Overview
//
// - **ProviderApiClient**: Trait for the provider's record-management calls
// - **ChallengeAuthenticator**: Trait exposing `publish` / `remove` to a host
// - **ZoneRecordReconciler**: Zone resolution and TXT record reconciliation
// - **ProviderRegistry**: Plugin-based registry of Provider API client factories
//
// ## Design Principles
//
// 1. **Core vs. transport**: Decision logic lives here; HTTP and signing live in provider crates
// 2. **Idempotency**: `publish` upserts, `remove` tolerates a missing record
// 3. **Fail fast**: Every provider error is wrapped once and surfaced, never retried
// 4. **Library-First**: Hosts inject configuration, clients and observers

pub mod traits;
pub mod reconciler;
pub mod registry;
pub mod config;
pub mod error;
pub mod zone;

// Re-export core types for convenience
pub use traits::{ChallengeAuthenticator, ProviderApiClient, PublishOutcome, RecordId, RemoveOutcome};
pub use reconciler::{Operation, ReconcilerEvent, ZoneRecordReconciler};
pub use registry::ProviderRegistry;
pub use config::{ChallengeConfig, Dns01Config, ProviderConfig};
pub use error::{ApiError, Error, Result};
