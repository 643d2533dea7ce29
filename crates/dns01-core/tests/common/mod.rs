//! Test doubles and common utilities for reconciler contract tests
//!
//! [`FakeProviderApi`] is an in-memory provider: it owns a zone list and a
//! record table, applies creates/updates/deletes to that table, and records
//! every call it receives so tests can assert on ordering and counts.

#![allow(dead_code)]

use async_trait::async_trait;
use dns01_core::error::ApiError;
use dns01_core::traits::{ProviderApiClient, RecordId};
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};

/// A call received by the fake provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    ListZones,
    QueryTxtRecords {
        zone: String,
        subdomain: String,
    },
    CreateTxtRecord {
        zone: String,
        subdomain: String,
        target: String,
        ttl: u32,
    },
    UpdateRecord {
        zone: String,
        record_id: RecordId,
        subdomain: String,
        target: String,
        ttl: u32,
    },
    DeleteRecord {
        zone: String,
        record_id: RecordId,
    },
    RefreshZone {
        zone: String,
    },
}

impl ApiCall {
    /// Whether this call changes provider state
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            ApiCall::CreateTxtRecord { .. }
                | ApiCall::UpdateRecord { .. }
                | ApiCall::DeleteRecord { .. }
                | ApiCall::RefreshZone { .. }
        )
    }
}

/// Provider call that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    ListZones,
    Query,
    Create,
    Update,
    Delete,
    Refresh,
}

/// A TXT record held by the fake provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeRecord {
    pub zone: String,
    pub subdomain: String,
    pub target: String,
    pub ttl: u32,
}

#[derive(Default)]
struct FakeState {
    zones: Vec<String>,
    records: BTreeMap<u64, FakeRecord>,
    next_id: u64,
    calls: Vec<ApiCall>,
    failures: HashSet<FailPoint>,
}

/// In-memory Provider API client
pub struct FakeProviderApi {
    state: Arc<Mutex<FakeState>>,
}

impl FakeProviderApi {
    /// Create a provider whose account holds `zones`
    pub fn new(zones: &[&str]) -> Self {
        let state = FakeState {
            zones: zones.iter().map(|z| z.to_string()).collect(),
            next_id: 1000,
            ..FakeState::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Create a new fake that shares state with an existing one
    pub fn sharing_state_with(other: &Self) -> Self {
        Self {
            state: Arc::clone(&other.state),
        }
    }

    /// Seed a TXT record and return its identifier
    pub fn with_record(&self, zone: &str, subdomain: &str, target: &str) -> RecordId {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id;
        state.next_id += 1;
        state.records.insert(
            id,
            FakeRecord {
                zone: zone.to_string(),
                subdomain: subdomain.to_string(),
                target: target.to_string(),
                ttl: 60,
            },
        );
        RecordId::from(id)
    }

    /// Make every subsequent call of this kind fail
    pub fn fail_on(&self, point: FailPoint) {
        self.state.lock().unwrap().failures.insert(point);
    }

    /// Every call received so far, in order
    pub fn calls(&self) -> Vec<ApiCall> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Clear the call log
    pub fn reset_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    /// Number of calls that change provider state
    pub fn mutating_call_count(&self) -> usize {
        self.calls().iter().filter(|c| c.is_mutating()).count()
    }

    /// TXT records currently stored at `subdomain` in `zone`
    pub fn records_at(&self, zone: &str, subdomain: &str) -> Vec<FakeRecord> {
        self.state
            .lock()
            .unwrap()
            .records
            .values()
            .filter(|r| r.zone == zone && r.subdomain == subdomain)
            .cloned()
            .collect()
    }

    /// Total number of stored records
    pub fn record_count(&self) -> usize {
        self.state.lock().unwrap().records.len()
    }

    fn enter(&self, call: ApiCall, point: FailPoint) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        if state.failures.contains(&point) {
            return Err(ApiError::http(format!("injected {:?} failure", point)));
        }
        Ok(())
    }
}

fn parse_id(record_id: &RecordId) -> Result<u64, ApiError> {
    record_id
        .as_str()
        .parse()
        .map_err(|_| ApiError::api(404, format!("No record {}", record_id)))
}

#[async_trait]
impl ProviderApiClient for FakeProviderApi {
    async fn list_zones(&self) -> Result<Vec<String>, ApiError> {
        self.enter(ApiCall::ListZones, FailPoint::ListZones)?;
        Ok(self.state.lock().unwrap().zones.clone())
    }

    async fn query_txt_records(
        &self,
        zone: &str,
        subdomain: &str,
    ) -> Result<Vec<RecordId>, ApiError> {
        self.enter(
            ApiCall::QueryTxtRecords {
                zone: zone.to_string(),
                subdomain: subdomain.to_string(),
            },
            FailPoint::Query,
        )?;

        let state = self.state.lock().unwrap();
        Ok(state
            .records
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
        ttl: u32,
    ) -> Result<(), ApiError> {
        self.enter(
            ApiCall::CreateTxtRecord {
                zone: zone.to_string(),
                subdomain: subdomain.to_string(),
                target: target.to_string(),
                ttl,
            },
            FailPoint::Create,
        )?;

        let mut state = self.state.lock().unwrap();
        let id = state.next_id;
        state.next_id += 1;
        state.records.insert(
            id,
            FakeRecord {
                zone: zone.to_string(),
                subdomain: subdomain.to_string(),
                target: target.to_string(),
                ttl,
            },
        );
        Ok(())
    }

    async fn update_record(
        &self,
        zone: &str,
        record_id: &RecordId,
        subdomain: &str,
        target: &str,
        ttl: u32,
    ) -> Result<(), ApiError> {
        self.enter(
            ApiCall::UpdateRecord {
                zone: zone.to_string(),
                record_id: record_id.clone(),
                subdomain: subdomain.to_string(),
                target: target.to_string(),
                ttl,
            },
            FailPoint::Update,
        )?;

        let id = parse_id(record_id)?;
        let mut state = self.state.lock().unwrap();
        let record = state
            .records
            .get_mut(&id)
            .ok_or_else(|| ApiError::api(404, format!("No record {}", record_id)))?;
        record.subdomain = subdomain.to_string();
        record.target = target.to_string();
        record.ttl = ttl;
        Ok(())
    }

    async fn delete_record(&self, zone: &str, record_id: &RecordId) -> Result<(), ApiError> {
        self.enter(
            ApiCall::DeleteRecord {
                zone: zone.to_string(),
                record_id: record_id.clone(),
            },
            FailPoint::Delete,
        )?;

        let id = parse_id(record_id)?;
        self.state
            .lock()
            .unwrap()
            .records
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| ApiError::api(404, format!("No record {}", record_id)))
    }

    async fn refresh_zone(&self, zone: &str) -> Result<(), ApiError> {
        self.enter(
            ApiCall::RefreshZone {
                zone: zone.to_string(),
            },
            FailPoint::Refresh,
        )
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }
}

/// Build a reconciler over a fake that shares state with `provider`
pub fn reconciler_for(provider: &FakeProviderApi) -> dns01_core::ZoneRecordReconciler {
    dns01_core::ZoneRecordReconciler::new(Box::new(FakeProviderApi::sharing_state_with(provider)))
}
