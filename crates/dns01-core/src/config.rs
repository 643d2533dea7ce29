//! Configuration types for the DNS-01 reconciler
//!
//! Configuration is passed in explicitly at construction time; nothing in this
//! crate reads files or the environment.

use serde::{Deserialize, Serialize};

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dns01Config {
    /// DNS provider configuration
    pub provider: ProviderConfig,

    /// Challenge settings passed through to the caller
    #[serde(default)]
    pub challenge: ChallengeConfig,
}

impl Dns01Config {
    /// Create a configuration for `provider` with default challenge settings
    pub fn new(provider: ProviderConfig) -> Self {
        Self {
            provider,
            challenge: ChallengeConfig::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.provider.validate()?;
        self.challenge.validate()?;

        Ok(())
    }
}

/// DNS provider configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// OVH API
    Ovh {
        /// Endpoint alias (e.g. "ovh-eu") or absolute base URL
        #[serde(default = "default_ovh_endpoint")]
        endpoint: String,
        /// Application key
        application_key: String,
        /// Application secret
        application_secret: String,
        /// Consumer key
        consumer_key: String,
    },

    /// Custom provider
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl ProviderConfig {
    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            ProviderConfig::Ovh {
                endpoint,
                application_key,
                application_secret,
                consumer_key,
            } => {
                if endpoint.is_empty() {
                    return Err(crate::Error::config("OVH endpoint cannot be empty"));
                }
                if application_key.is_empty() {
                    return Err(crate::Error::config("OVH application key cannot be empty"));
                }
                if application_secret.is_empty() {
                    return Err(crate::Error::config(
                        "OVH application secret cannot be empty",
                    ));
                }
                if consumer_key.is_empty() {
                    return Err(crate::Error::config("OVH consumer key cannot be empty"));
                }
                Ok(())
            }
            ProviderConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config(
                        "Custom provider factory cannot be empty",
                    ));
                }
                if config.is_null() {
                    return Err(crate::Error::config(
                        "Custom provider config cannot be null",
                    ));
                }
                Ok(())
            }
        }
    }

    /// Get the provider type name
    pub fn type_name(&self) -> &str {
        match self {
            ProviderConfig::Ovh { .. } => "ovh",
            ProviderConfig::Custom { factory, .. } => factory,
        }
    }
}

// Credentials stay out of Debug output.
impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderConfig::Ovh {
                endpoint,
                application_key,
                ..
            } => f
                .debug_struct("Ovh")
                .field("endpoint", endpoint)
                .field("application_key", application_key)
                .field("application_secret", &"<REDACTED>")
                .field("consumer_key", &"<REDACTED>")
                .finish(),
            ProviderConfig::Custom { factory, .. } => f
                .debug_struct("Custom")
                .field("factory", factory)
                .field("config", &"<REDACTED>")
                .finish(),
        }
    }
}

/// Challenge settings
///
/// Neither value changes reconciler behavior; the TTL is handed to `publish`
/// and the propagation delay is honored by whoever drives the challenge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeConfig {
    /// TTL of the challenge TXT record, in seconds
    #[serde(default = "default_ttl")]
    pub ttl: u32,

    /// How long to wait after publishing before the CA is asked to validate
    #[serde(default = "default_propagation_seconds")]
    pub propagation_seconds: u64,
}

impl ChallengeConfig {
    /// Validate the challenge settings
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.ttl == 0 {
            return Err(crate::Error::config("Challenge TTL must be > 0"));
        }
        Ok(())
    }

    /// Propagation delay as a `Duration`
    pub fn propagation_delay(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.propagation_seconds)
    }
}

impl Default for ChallengeConfig {
    fn default() -> Self {
        Self {
            ttl: default_ttl(),
            propagation_seconds: default_propagation_seconds(),
        }
    }
}

fn default_ovh_endpoint() -> String {
    "ovh-eu".to_string()
}

fn default_ttl() -> u32 {
    1
}

fn default_propagation_seconds() -> u64 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ovh() -> ProviderConfig {
        ProviderConfig::Ovh {
            endpoint: "ovh-eu".to_string(),
            application_key: "app-key".to_string(),
            application_secret: "app-secret".to_string(),
            consumer_key: "consumer-key".to_string(),
        }
    }

    #[test]
    fn challenge_defaults() {
        let challenge = ChallengeConfig::default();
        assert_eq!(challenge.ttl, 1);
        assert_eq!(challenge.propagation_seconds, 10);
    }

    #[test]
    fn parses_minimal_json() {
        let config: Dns01Config = serde_json::from_str(
            r#"{
                "provider": {
                    "type": "ovh",
                    "application_key": "k",
                    "application_secret": "s",
                    "consumer_key": "c"
                }
            }"#,
        )
        .unwrap();

        assert_eq!(config.provider.type_name(), "ovh");
        assert_eq!(config.challenge.ttl, 1);
        match &config.provider {
            ProviderConfig::Ovh { endpoint, .. } => assert_eq!(endpoint, "ovh-eu"),
            other => panic!("unexpected provider: {other:?}"),
        }
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_credentials_are_rejected() {
        let config = ProviderConfig::Ovh {
            endpoint: "ovh-eu".to_string(),
            application_key: "k".to_string(),
            application_secret: String::new(),
            consumer_key: "c".to_string(),
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("application secret"));
    }

    #[test]
    fn zero_ttl_is_rejected() {
        let mut config = Dns01Config::new(ovh());
        config.challenge.ttl = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn custom_provider_requires_factory() {
        let config = ProviderConfig::Custom {
            factory: String::new(),
            config: serde_json::json!({"token": "x"}),
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn debug_redacts_secrets() {
        let rendered = format!("{:?}", ovh());
        assert!(rendered.contains("app-key"));
        assert!(!rendered.contains("app-secret"));
        assert!(!rendered.contains("consumer-key"));
    }
}
