// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! API context for the compute API server

use std::sync::Arc;

use anyhow::{Context, Result};
use compute_extensions::extended_availability_zone::ExtendedAvailabilityZone;
use compute_extensions::{
    AggregateStore, AggregateZoneResolver, ApiExtension, ExtensionRegistry, Policy, PolicyCheck,
    ZoneResolver,
};
use tracing::info;

use crate::config::ServerConfig;
use crate::dispatch::ExtensionDispatcher;
use crate::store::FixtureStore;

/// API context shared across all request handlers
pub struct ApiContext {
    store: Arc<FixtureStore>,
    registry: Arc<ExtensionRegistry>,
    dispatcher: ExtensionDispatcher,
}

impl ApiContext {
    /// Load fixtures and policy named by `config`, then register extensions
    pub fn new(config: &ServerConfig) -> Result<Self> {
        let store = Arc::new(FixtureStore::from_fixtures(&config.fixtures_dir)?);
        info!(
            fixtures_dir = %config.fixtures_dir.display(),
            instances = store.len(),
            "Loaded instance fixtures"
        );

        let policy: Arc<dyn PolicyCheck> = match &config.policy_file {
            Some(path) => {
                let policy = Policy::load(path)
                    .with_context(|| format!("Failed to load policy {}", path.display()))?;
                info!(policy_file = %path.display(), "Loaded policy");
                Arc::new(policy)
            }
            None => Arc::new(Policy::defaults()),
        };

        Self::from_parts(config, store, policy)
    }

    /// Build a context around an existing store and policy
    pub fn from_parts(
        config: &ServerConfig,
        store: Arc<FixtureStore>,
        policy: Arc<dyn PolicyCheck>,
    ) -> Result<Self> {
        let zones = Arc::new(AggregateZoneResolver::new(
            Arc::clone(&store) as Arc<dyn AggregateStore>,
            config.default_availability_zone.clone(),
            config.az_cache_ttl,
        ));

        let mut registry = ExtensionRegistry::new();
        let loaded = registry
            .load(builtin_extensions(policy, zones), &config.extensions)
            .context("Failed to load extensions")?;
        info!(loaded, "Registered API extensions");

        let registry = Arc::new(registry);
        Ok(Self {
            store,
            dispatcher: ExtensionDispatcher::new(Arc::clone(&registry)),
            registry,
        })
    }

    pub fn store(&self) -> &FixtureStore {
        &self.store
    }

    pub fn registry(&self) -> &ExtensionRegistry {
        &self.registry
    }

    pub fn dispatcher(&self) -> &ExtensionDispatcher {
        &self.dispatcher
    }
}

/// Extensions shipped with the server, in load order
pub fn builtin_extensions(
    policy: Arc<dyn PolicyCheck>,
    zones: Arc<dyn ZoneResolver>,
) -> Vec<Arc<dyn ApiExtension>> {
    let extended_az: Arc<dyn ApiExtension> = Arc::new(ExtendedAvailabilityZone::new(policy, zones));
    vec![extended_az]
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use compute_extensions::ExtensionFilter;
    use compute_extensions::extended_availability_zone::ALIAS;

    use super::*;

    #[test]
    fn test_new_loads_builtin_extensions() {
        let ctx = ApiContext::new(&ServerConfig::default()).unwrap();
        assert_eq!(ctx.registry().len(), 1);
        assert!(ctx.registry().get(ALIAS).is_some());
        assert_eq!(ctx.registry().extensions_for("servers").count(), 1);
        assert!(!ctx.store().is_empty());
    }

    #[test]
    fn test_blacklisted_extension_not_loaded() {
        let config = ServerConfig {
            extensions: ExtensionFilter {
                whitelist: vec![],
                blacklist: vec![ALIAS.to_string()],
            },
            ..ServerConfig::default()
        };
        let ctx = ApiContext::from_parts(
            &config,
            Arc::new(FixtureStore::default()),
            Arc::new(Policy::defaults()),
        )
        .unwrap();
        assert!(ctx.registry().is_empty());
        assert_eq!(ctx.registry().extensions_for("servers").count(), 0);
    }

    #[test]
    fn test_missing_policy_file_fails() {
        let config = ServerConfig {
            policy_file: Some("/nonexistent/policy.json".into()),
            ..ServerConfig::default()
        };
        assert!(ApiContext::new(&config).is_err());
    }
}
