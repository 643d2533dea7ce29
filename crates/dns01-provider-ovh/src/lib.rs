// # OVH Provider API Client
//
// This crate implements `dns01_core::ProviderApiClient` against the OVH REST API.
//
// ## Behavior
//
// - ✅ One HTTP request per capability call (plus a one-time `/auth/time` lookup)
// - ✅ Full error propagation to the reconciler (no retry, no backoff)
// - ✅ HTTP timeout configured (30 seconds)
// - ✅ Status-specific error messages (401/403, 404, 409, 429, 5xx)
// - ✅ Dry-run mode: reads are performed, writes are logged and skipped
// - ✅ Endpoint aliases (ovh-eu, ovh-ca, ovh-us, kimsufi-*, soyoustart-*) or explicit URL
// - ❌ NO retry logic (the reconciler fails fast)
// - ❌ NO caching of zones or records
//
// ## Security Requirements
//
// - Application secret and consumer key NEVER appear in logs or Debug output
// - Construction fails if any credential is empty
//
// ## API Reference
//
// - List zones: GET `/domain/zone`
// - List records: GET `/domain/zone/:zone/record?fieldType=TXT&subDomain=...`
// - Create record: POST `/domain/zone/:zone/record`
// - Update record: PUT `/domain/zone/:zone/record/:id`
// - Delete record: DELETE `/domain/zone/:zone/record/:id`
// - Refresh zone: POST `/domain/zone/:zone/refresh`
// - Server time: GET `/auth/time` (unauthenticated)

pub mod endpoint;
pub mod signature;

use async_trait::async_trait;
use dns01_core::config::ProviderConfig;
use dns01_core::traits::{ProviderApiClient, ProviderApiFactory, RecordId};
use dns01_core::{ApiError, Error, Result};
use reqwest::{Method, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::sync::OnceCell;

pub use endpoint::resolve_endpoint;

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Body of a record creation request
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NewRecord<'a> {
    field_type: &'a str,
    sub_domain: &'a str,
    target: &'a str,
    ttl: u32,
}

/// Body of a record update request
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RecordUpdate<'a> {
    sub_domain: &'a str,
    target: &'a str,
    ttl: u32,
}

/// OVH Provider API client
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, the client will:
/// - Perform all GET requests (zone list, record lookup)
/// - Log the intended POST/PUT/DELETE
/// - **NOT** modify the zone
pub struct OvhClient {
    /// Resolved API base URL, without trailing slash
    base_url: String,

    /// Application key (public)
    application_key: String,

    /// Application secret
    /// ⚠️ NEVER log this value
    application_secret: String,

    /// Consumer key
    /// ⚠️ NEVER log this value
    consumer_key: String,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Server clock minus local clock, fetched on first signed request
    time_delta: OnceCell<i64>,

    /// Dry-run mode: if true, perform GET requests but skip writes
    dry_run: bool,
}

// Custom Debug implementation that hides the credentials
impl std::fmt::Debug for OvhClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OvhClient")
            .field("base_url", &self.base_url)
            .field("application_key", &self.application_key)
            .field("application_secret", &"<REDACTED>")
            .field("consumer_key", &"<REDACTED>")
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl OvhClient {
    /// Create a new OVH client
    ///
    /// # Parameters
    ///
    /// - `endpoint`: Endpoint alias (e.g. "ovh-eu") or absolute base URL
    /// - `application_key`, `application_secret`, `consumer_key`: API credentials
    /// - `dry_run`: If true, perform GET requests but skip writes
    ///
    /// # Errors
    ///
    /// `Error::Config` for an unknown endpoint, an empty credential, or an
    /// HTTP client that cannot be built.
    pub fn new(
        endpoint: &str,
        application_key: impl Into<String>,
        application_secret: impl Into<String>,
        consumer_key: impl Into<String>,
        dry_run: bool,
    ) -> Result<Self> {
        let base_url = resolve_endpoint(endpoint)?;
        let application_key = application_key.into();
        let application_secret = application_secret.into();
        let consumer_key = consumer_key.into();

        if application_key.is_empty() || application_secret.is_empty() || consumer_key.is_empty() {
            return Err(Error::config("OVH credentials cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url,
            application_key,
            application_secret,
            consumer_key,
            client,
            time_delta: OnceCell::new(),
            dry_run,
        })
    }

    /// Create a new OVH client (live mode)
    pub fn new_live(
        endpoint: &str,
        application_key: impl Into<String>,
        application_secret: impl Into<String>,
        consumer_key: impl Into<String>,
    ) -> Result<Self> {
        Self::new(endpoint, application_key, application_secret, consumer_key, false)
    }

    /// Create a new OVH client (dry-run mode)
    pub fn new_dry_run(
        endpoint: &str,
        application_key: impl Into<String>,
        application_secret: impl Into<String>,
        consumer_key: impl Into<String>,
    ) -> Result<Self> {
        Self::new(endpoint, application_key, application_secret, consumer_key, true)
    }

    /// Whether writes are skipped
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Server clock minus local clock, in seconds
    ///
    /// # API Call
    ///
    /// ```http
    /// GET /auth/time
    /// ```
    async fn time_delta(&self) -> std::result::Result<i64, ApiError> {
        self.time_delta
            .get_or_try_init(|| async {
                let url = format!("{}/auth/time", self.base_url);
                let response = self
                    .client
                    .get(&url)
                    .send()
                    .await
                    .map_err(|e| ApiError::http(e.to_string()))?;

                let status = response.status().as_u16();
                let text = response
                    .text()
                    .await
                    .map_err(|e| ApiError::http(e.to_string()))?;
                if !(200..300).contains(&status) {
                    return Err(map_status(status, &text, "Server time lookup failed"));
                }

                let server_time: i64 = text.trim().parse().map_err(|e| {
                    ApiError::invalid_response(format!("Invalid server time '{}': {}", text, e))
                })?;
                let delta = server_time - chrono::Utc::now().timestamp();
                tracing::debug!("OVH server clock offset: {}s", delta);
                Ok(delta)
            })
            .await
            .copied()
    }

    fn url(&self, path: &str, query: &[(&str, &str)]) -> std::result::Result<Url, ApiError> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, path))
            .map_err(|e| ApiError::Other(format!("Invalid request URL for {}: {}", path, e)))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    /// Send one signed request and return the response body
    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<String>,
    ) -> std::result::Result<String, ApiError> {
        let url = self.url(path, query)?;
        let body = body.unwrap_or_default();

        if self.dry_run && method != Method::GET {
            tracing::info!(
                "[DRY-RUN] Would send {} request to {} with payload: {}",
                method,
                url,
                if body.is_empty() { "<none>" } else { body.as_str() }
            );
            return Ok("null".to_string());
        }

        let timestamp = chrono::Utc::now().timestamp() + self.time_delta().await?;
        let signature = signature::sign(
            &self.application_secret,
            &self.consumer_key,
            method.as_str(),
            url.as_str(),
            &body,
            timestamp,
        );

        tracing::debug!("{} {}", method, url);

        let mut request = self
            .client
            .request(method.clone(), url.clone())
            .header("X-Ovh-Application", &self.application_key)
            .header("X-Ovh-Consumer", &self.consumer_key)
            .header("X-Ovh-Timestamp", timestamp.to_string())
            .header("X-Ovh-Signature", signature);
        if !body.is_empty() {
            request = request.header("Content-Type", "application/json").body(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::http(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read response body".to_string());

        if !(200..300).contains(&status) {
            return Err(map_status(
                status,
                &text,
                &format!("{} {} failed", method, path),
            ));
        }

        Ok(text)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> std::result::Result<T, ApiError> {
        let text = self.send(Method::GET, path, query, None).await?;
        serde_json::from_str(&text)
            .map_err(|e| ApiError::invalid_response(format!("GET {}: {}", path, e)))
    }

    async fn write<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> std::result::Result<(), ApiError> {
        let body = body
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| ApiError::Other(format!("Failed to encode request body: {}", e)))?;
        self.send(method, path, &[], body).await.map(|_| ())
    }
}

/// Turn a non-success response into an `ApiError`
///
/// OVH error bodies look like `{"class": "...", "message": "..."}`; the raw
/// body is used when there is no message.
fn map_status(status: u16, body: &str, context: &str) -> ApiError {
    let detail = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string());

    match status {
        401 | 403 => ApiError::api(
            status,
            format!("Authentication failed: invalid credentials or insufficient rights: {}", detail),
        ),
        404 => ApiError::api(status, format!("Not found: {}", detail)),
        409 => ApiError::api(status, format!("Conflict: {}", detail)),
        429 => ApiError::api(status, format!("Rate limit exceeded: {}", detail)),
        500..=599 => ApiError::api(status, format!("OVH server error (transient): {}", detail)),
        _ => ApiError::api(status, format!("{}: {}", context, detail)),
    }
}

fn record_path(zone: &str, record_id: &RecordId) -> String {
    format!("/domain/zone/{}/record/{}", zone, record_id)
}

#[async_trait]
impl ProviderApiClient for OvhClient {
    async fn list_zones(&self) -> std::result::Result<Vec<String>, ApiError> {
        self.get_json("/domain/zone", &[]).await
    }

    async fn query_txt_records(
        &self,
        zone: &str,
        subdomain: &str,
    ) -> std::result::Result<Vec<RecordId>, ApiError> {
        let ids: Vec<u64> = self
            .get_json(
                &format!("/domain/zone/{}/record", zone),
                &[("fieldType", "TXT"), ("subDomain", subdomain)],
            )
            .await?;
        Ok(ids.into_iter().map(RecordId::from).collect())
    }

    async fn create_txt_record(
        &self,
        zone: &str,
        subdomain: &str,
        target: &str,
        ttl: u32,
    ) -> std::result::Result<(), ApiError> {
        let body = NewRecord {
            field_type: "TXT",
            sub_domain: subdomain,
            target,
            ttl,
        };
        self.write(Method::POST, &format!("/domain/zone/{}/record", zone), Some(&body))
            .await
    }

    async fn update_record(
        &self,
        zone: &str,
        record_id: &RecordId,
        subdomain: &str,
        target: &str,
        ttl: u32,
    ) -> std::result::Result<(), ApiError> {
        let body = RecordUpdate {
            sub_domain: subdomain,
            target,
            ttl,
        };
        self.write(Method::PUT, &record_path(zone, record_id), Some(&body))
            .await
    }

    async fn delete_record(
        &self,
        zone: &str,
        record_id: &RecordId,
    ) -> std::result::Result<(), ApiError> {
        self.write::<()>(Method::DELETE, &record_path(zone, record_id), None)
            .await
    }

    async fn refresh_zone(&self, zone: &str) -> std::result::Result<(), ApiError> {
        // OVH clients sign an empty JSON object for body-less POSTs
        self.write(
            Method::POST,
            &format!("/domain/zone/{}/refresh", zone),
            Some(&serde_json::json!({})),
        )
        .await
    }

    fn provider_name(&self) -> &'static str {
        "ovh"
    }
}

/// Factory for creating OVH clients
pub struct OvhFactory;

impl ProviderApiFactory for OvhFactory {
    fn create(&self, config: &ProviderConfig) -> Result<Box<dyn ProviderApiClient>> {
        match config {
            ProviderConfig::Ovh {
                endpoint,
                application_key,
                application_secret,
                consumer_key,
            } => {
                // Check for dry-run mode environment variable
                let dry_run = std::env::var("DNS01_MODE")
                    .unwrap_or_default()
                    .eq_ignore_ascii_case("dry-run");

                if dry_run {
                    tracing::warn!("OVH client running in DRY-RUN mode - no changes will be made");
                }

                Ok(Box::new(OvhClient::new(
                    endpoint,
                    application_key.clone(),
                    application_secret.clone(),
                    consumer_key.clone(),
                    dry_run,
                )?))
            }
            _ => Err(Error::config("Invalid config for OVH provider")),
        }
    }
}

/// Register the OVH client factory with a registry
///
/// # Example
///
/// ```rust
/// use dns01_core::ProviderRegistry;
///
/// let registry = ProviderRegistry::new();
/// dns01_provider_ovh::register(&registry);
/// assert!(registry.has_provider("ovh"));
/// ```
pub fn register(registry: &dns01_core::ProviderRegistry) {
    registry.register_provider("ovh", Box::new(OvhFactory));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(endpoint: &str) -> ProviderConfig {
        ProviderConfig::Ovh {
            endpoint: endpoint.to_string(),
            application_key: "app_key".to_string(),
            application_secret: "app_secret_12345".to_string(),
            consumer_key: "consumer_key_67890".to_string(),
        }
    }

    #[test]
    fn test_factory_creation() {
        let client = OvhFactory.create(&config("ovh-eu"));
        assert!(client.is_ok());
        assert_eq!(client.map(|c| c.provider_name()).ok(), Some("ovh"));
    }

    #[test]
    fn test_factory_unknown_endpoint() {
        let client = OvhFactory.create(&config("ovh-moon"));
        assert!(matches!(client, Err(Error::Config(_))));
    }

    #[test]
    fn test_factory_rejects_other_provider_config() {
        let other = ProviderConfig::Custom {
            factory: "ovh".to_string(),
            config: serde_json::json!({}),
        };
        assert!(OvhFactory.create(&other).is_err());
    }

    #[test]
    fn test_empty_credentials_rejected() {
        let client = OvhClient::new_live("ovh-eu", "key", "", "consumer");
        assert!(matches!(client, Err(Error::Config(_))));
    }

    #[test]
    fn test_dry_run_mode() {
        let dry = OvhClient::new_dry_run("ovh-eu", "k", "s", "c").unwrap();
        let live = OvhClient::new_live("ovh-eu", "k", "s", "c").unwrap();

        assert!(dry.is_dry_run());
        assert!(!live.is_dry_run());
    }

    #[test]
    fn test_credentials_not_exposed_in_debug() {
        let client =
            OvhClient::new_live("ovh-ca", "app_key", "app_secret_12345", "consumer_key_67890")
                .unwrap();

        let debug_str = format!("{:?}", client);
        assert!(!debug_str.contains("app_secret_12345"));
        assert!(!debug_str.contains("consumer_key_67890"));
        assert!(debug_str.contains("OvhClient"));
        assert!(debug_str.contains("https://ca.api.ovh.com/1.0"));
    }

    #[test]
    fn test_query_string_is_encoded() {
        let client = OvhClient::new_live("ovh-eu", "k", "s", "c").unwrap();
        let url = client
            .url(
                "/domain/zone/example.com/record",
                &[("fieldType", "TXT"), ("subDomain", "_acme-challenge.a b")],
            )
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://eu.api.ovh.com/1.0/domain/zone/example.com/record?fieldType=TXT&subDomain=_acme-challenge.a+b"
        );
    }

    #[test]
    fn test_error_message_prefers_ovh_message() {
        let err = map_status(
            403,
            r#"{"class":"Client::Forbidden","message":"This call has not been granted"}"#,
            "GET /domain/zone failed",
        );
        assert!(err.to_string().contains("This call has not been granted"));
        assert!(err.to_string().contains("403"));
    }

    #[test]
    fn test_error_message_falls_back_to_body() {
        let err = map_status(400, "plain failure\n", "POST /x failed");
        assert_eq!(
            err.to_string(),
            "API error (status 400): POST /x failed: plain failure"
        );
    }

    #[test]
    fn test_register() {
        let registry = dns01_core::ProviderRegistry::new();
        register(&registry);
        assert!(registry.has_provider("ovh"));
        assert!(registry.create_client(&config("ovh-eu")).is_ok());
    }
}
