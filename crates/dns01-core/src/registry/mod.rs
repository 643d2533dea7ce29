//! Plugin-based provider registry
//!
//! The registry maps provider type names to [`ProviderApiFactory`] objects so
//! hosts can build a Provider API client from configuration without hardcoded
//! if-else chains.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use dns01_core::registry::ProviderRegistry;
//! use dns01_core::config::ProviderConfig;
//!
//! let registry = ProviderRegistry::new();
//! dns01_provider_ovh::register(&registry);
//!
//! let config = ProviderConfig::Ovh { ... };
//! let client = registry.create_client(&config)?;
//! ```

use crate::config::ProviderConfig;
use crate::error::{Error, Result};
use crate::traits::{ProviderApiClient, ProviderApiFactory};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Provider registry
///
/// Uses interior mutability with `RwLock`, allowing concurrent reads and
/// exclusive writes.
#[derive(Default)]
pub struct ProviderRegistry {
    /// Registered Provider API client factories
    providers: RwLock<HashMap<String, Box<dyn ProviderApiFactory>>>,
}

impl ProviderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a Provider API client factory
    ///
    /// Registering the same name twice replaces the earlier factory.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// # use dns01_core::registry::ProviderRegistry;
    /// # use dns01_core::traits::ProviderApiFactory;
    /// # struct MyFactory;
    /// # impl ProviderApiFactory for MyFactory {
    /// #     fn create(&self, config: &dns01_core::config::ProviderConfig) -> dns01_core::Result<Box<dyn dns01_core::ProviderApiClient>> { unimplemented!() }
    /// # }
    /// let registry = ProviderRegistry::new();
    /// registry.register_provider("myprovider", Box::new(MyFactory));
    /// ```
    pub fn register_provider(&self, name: impl Into<String>, factory: Box<dyn ProviderApiFactory>) {
        let mut providers = self
            .providers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        providers.insert(name.into(), factory);
    }

    /// Create a Provider API client from configuration
    ///
    /// The configuration is validated before the factory sees it.
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn ProviderApiClient>)`: Created client
    /// - `Err(Error)`: If the provider type is not registered, the config is
    ///   invalid, or creation fails
    pub fn create_client(&self, config: &ProviderConfig) -> Result<Box<dyn ProviderApiClient>> {
        config.validate()?;

        let provider_type = config.type_name();
        let providers = self
            .providers
            .read()
            .unwrap_or_else(PoisonError::into_inner);

        let factory = providers
            .get(provider_type)
            .ok_or_else(|| Error::config(format!("Unknown provider type: {}", provider_type)))?;

        factory.create(config)
    }

    /// List all registered provider types, sorted
    pub fn list_providers(&self) -> Vec<String> {
        let providers = self
            .providers
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = providers.keys().cloned().collect();
        names.sort();
        names
    }

    /// Check if a provider type is registered
    pub fn has_provider(&self, name: &str) -> bool {
        let providers = self
            .providers
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        providers.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockProviderFactory;

    impl ProviderApiFactory for MockProviderFactory {
        fn create(&self, _config: &ProviderConfig) -> Result<Box<dyn ProviderApiClient>> {
            Err(Error::Other("Mock provider not implemented".to_string()))
        }
    }

    fn custom(factory: &str) -> ProviderConfig {
        ProviderConfig::Custom {
            factory: factory.to_string(),
            config: serde_json::json!({ "token": "t" }),
        }
    }

    #[test]
    fn test_registry_registration() {
        let registry = ProviderRegistry::new();

        assert!(!registry.has_provider("mock"));

        registry.register_provider("mock", Box::new(MockProviderFactory));

        assert!(registry.has_provider("mock"));
        assert_eq!(registry.list_providers(), vec!["mock".to_string()]);
    }

    #[test]
    fn unknown_provider_is_a_config_error() {
        let registry = ProviderRegistry::new();
        let err = registry.create_client(&custom("nowhere")).err().unwrap();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("nowhere"));
    }

    #[test]
    fn registered_factory_is_used() {
        let registry = ProviderRegistry::new();
        registry.register_provider("mock", Box::new(MockProviderFactory));

        let err = registry.create_client(&custom("mock")).err().unwrap();
        assert!(err.to_string().contains("Mock provider not implemented"));
    }

    #[test]
    fn invalid_config_never_reaches_factory() {
        let registry = ProviderRegistry::new();
        registry.register_provider("mock", Box::new(MockProviderFactory));

        let config = ProviderConfig::Custom {
            factory: "mock".to_string(),
            config: serde_json::Value::Null,
        };
        let err = registry.create_client(&config).err().unwrap();
        assert!(matches!(err, Error::Config(_)));
    }
}
