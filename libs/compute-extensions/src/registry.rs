// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Process-wide registry of loaded extensions
//!
//! Populated once during startup, then shared read-only (behind an `Arc`)
//! by every request. There is no removal: the registry only grows, and a
//! failed registration leaves it exactly as it was.

use std::collections::HashSet;
use std::sync::Arc;

use crate::error::ExtensionError;
use crate::extension::{ApiExtension, ControllerExtension, ExtensionDescriptor};

/// Which extensions may be loaded, by alias
///
/// An empty whitelist admits everything not on the blacklist.
#[derive(Clone, Debug, Default)]
pub struct ExtensionFilter {
    pub whitelist: Vec<String>,
    pub blacklist: Vec<String>,
}

impl ExtensionFilter {
    pub fn allows(&self, alias: &str) -> bool {
        if self.blacklist.iter().any(|a| a == alias) {
            return false;
        }
        self.whitelist.is_empty() || self.whitelist.iter().any(|a| a == alias)
    }
}

/// Ordered, alias-keyed set of extensions and their controller bindings
#[derive(Debug, Default)]
pub struct ExtensionRegistry {
    extensions: Vec<Arc<ExtensionDescriptor>>,
    bindings: Vec<ControllerExtension>,
}

impl ExtensionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an extension and all of its controller bindings
    pub fn register(&mut self, extension: &dyn ApiExtension) -> Result<(), ExtensionError> {
        let descriptor = extension.descriptor();
        if self.get(&descriptor.alias).is_some() {
            return Err(ExtensionError::DuplicateAlias(descriptor.alias.clone()));
        }

        let bindings = extension.controller_extensions();
        {
            let mut collections = HashSet::new();
            for binding in &bindings {
                if binding.alias() != descriptor.alias {
                    return Err(ExtensionError::ForeignBinding {
                        alias: descriptor.alias.clone(),
                        binding_alias: binding.alias().to_string(),
                    });
                }
                if !collections.insert(binding.collection.as_str()) {
                    return Err(ExtensionError::DuplicateBinding {
                        alias: descriptor.alias.clone(),
                        resource: binding.collection.clone(),
                    });
                }
            }
        }

        tracing::info!(
            alias = %descriptor.alias,
            name = %descriptor.name,
            version = descriptor.version,
            bindings = bindings.len(),
            "Loaded extension"
        );
        self.extensions.push(descriptor);
        self.bindings.extend(bindings);
        Ok(())
    }

    /// Register every extension the filter admits
    ///
    /// Stops at the first failure; extensions registered before it stay
    /// registered. Returns the number of extensions loaded.
    pub fn load<I>(&mut self, extensions: I, filter: &ExtensionFilter) -> Result<usize, ExtensionError>
    where
        I: IntoIterator<Item = Arc<dyn ApiExtension>>,
    {
        let mut loaded = 0;
        for extension in extensions {
            let alias = extension.descriptor().alias.clone();
            if !filter.allows(&alias) {
                tracing::info!(alias = %alias, "Extension disabled by configuration");
                continue;
            }
            self.register(extension.as_ref())?;
            loaded += 1;
        }
        Ok(loaded)
    }

    /// Bindings that decorate `collection`, in registration order
    pub fn extensions_for<'a>(
        &'a self,
        collection: &'a str,
    ) -> impl Iterator<Item = &'a ControllerExtension> + 'a {
        self.bindings
            .iter()
            .filter(move |b| b.collection == collection)
    }

    pub fn get(&self, alias: &str) -> Option<&ExtensionDescriptor> {
        self.extensions
            .iter()
            .find(|e| e.alias == alias)
            .map(Arc::as_ref)
    }

    /// All loaded extensions in registration order
    pub fn descriptors(&self) -> impl Iterator<Item = &ExtensionDescriptor> {
        self.extensions.iter().map(Arc::as_ref)
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::extension::ResponseExtender;
    use crate::representation::ResponseObject;
    use crate::request::ExtensionRequest;
    use async_trait::async_trait;

    struct Noop;

    #[async_trait]
    impl ResponseExtender for Noop {
        async fn on_single_response(
            &self,
            _req: &ExtensionRequest<'_>,
            _resp: &mut ResponseObject,
            _id: &str,
        ) -> Result<(), ExtensionError> {
            Ok(())
        }

        async fn on_list_response(
            &self,
            _req: &ExtensionRequest<'_>,
            _resp: &mut ResponseObject,
        ) -> Result<(), ExtensionError> {
            Ok(())
        }
    }

    struct TestExtension {
        descriptor: Arc<ExtensionDescriptor>,
        collections: Vec<&'static str>,
    }

    impl TestExtension {
        fn new(alias: &str, collections: Vec<&'static str>) -> Self {
            Self {
                descriptor: Arc::new(ExtensionDescriptor {
                    name: format!("Test {}", alias),
                    alias: alias.to_string(),
                    namespace: format!("http://example.com/{}", alias),
                    version: 1,
                    description: String::new(),
                }),
                collections,
            }
        }
    }

    impl ApiExtension for TestExtension {
        fn descriptor(&self) -> Arc<ExtensionDescriptor> {
            Arc::clone(&self.descriptor)
        }

        fn controller_extensions(&self) -> Vec<ControllerExtension> {
            self.collections
                .iter()
                .map(|c| ControllerExtension::new(self.descriptor(), *c, Arc::new(Noop)))
                .collect()
        }
    }

    fn aliases_for(registry: &ExtensionRegistry, collection: &str) -> Vec<String> {
        registry
            .extensions_for(collection)
            .map(|b| b.alias().to_string())
            .collect()
    }

    #[test]
    fn test_registration_order_is_kept() {
        let mut registry = ExtensionRegistry::new();
        registry
            .register(&TestExtension::new("b", vec!["servers"]))
            .unwrap();
        registry
            .register(&TestExtension::new("a", vec!["servers", "images"]))
            .unwrap();
        registry
            .register(&TestExtension::new("c", vec!["images"]))
            .unwrap();

        assert_eq!(aliases_for(&registry, "servers"), vec!["b", "a"]);
        assert_eq!(aliases_for(&registry, "images"), vec!["a", "c"]);
        assert!(aliases_for(&registry, "flavors").is_empty());
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_duplicate_alias_leaves_registry_unchanged() {
        let mut registry = ExtensionRegistry::new();
        registry
            .register(&TestExtension::new("a", vec!["servers"]))
            .unwrap();

        let before: Vec<ExtensionDescriptor> = registry.descriptors().cloned().collect();
        let err = registry
            .register(&TestExtension::new("a", vec!["images"]))
            .unwrap_err();
        assert!(matches!(err, ExtensionError::DuplicateAlias(ref a) if a == "a"));

        let after: Vec<ExtensionDescriptor> = registry.descriptors().cloned().collect();
        assert_eq!(before, after);
        assert_eq!(aliases_for(&registry, "servers"), vec!["a"]);
        assert!(aliases_for(&registry, "images").is_empty());
    }

    #[test]
    fn test_duplicate_binding_rejected() {
        let mut registry = ExtensionRegistry::new();
        let err = registry
            .register(&TestExtension::new("a", vec!["servers", "servers"]))
            .unwrap_err();
        assert!(matches!(err, ExtensionError::DuplicateBinding { .. }));
        assert!(registry.is_empty());
    }

    /// Offers its bindings under another extension's descriptor
    struct ImpostorExtension {
        own: TestExtension,
        other: Arc<ExtensionDescriptor>,
    }

    impl ApiExtension for ImpostorExtension {
        fn descriptor(&self) -> Arc<ExtensionDescriptor> {
            self.own.descriptor()
        }

        fn controller_extensions(&self) -> Vec<ControllerExtension> {
            vec![
                ControllerExtension::new(self.own.descriptor(), "servers", Arc::new(Noop)),
                ControllerExtension::new(Arc::clone(&self.other), "images", Arc::new(Noop)),
            ]
        }
    }

    #[test]
    fn test_binding_for_other_alias_rejected() {
        let mut registry = ExtensionRegistry::new();
        let impostor = ImpostorExtension {
            own: TestExtension::new("a", vec![]),
            other: TestExtension::new("ghost", vec![]).descriptor(),
        };
        let err = registry.register(&impostor).unwrap_err();
        assert!(matches!(
            err,
            ExtensionError::ForeignBinding { ref alias, ref binding_alias }
                if alias == "a" && binding_alias == "ghost"
        ));
        assert!(registry.is_empty());
        assert!(aliases_for(&registry, "servers").is_empty());
        assert!(aliases_for(&registry, "images").is_empty());
    }

    #[test]
    fn test_load_applies_filter() {
        let candidates: Vec<Arc<dyn ApiExtension>> = vec![
            Arc::new(TestExtension::new("a", vec!["servers"])),
            Arc::new(TestExtension::new("b", vec!["servers"])),
            Arc::new(TestExtension::new("c", vec!["servers"])),
        ];
        let filter = ExtensionFilter {
            whitelist: vec!["a".to_string(), "b".to_string()],
            blacklist: vec!["b".to_string()],
        };
        let mut registry = ExtensionRegistry::new();
        assert_eq!(registry.load(candidates, &filter).unwrap(), 1);
        assert!(registry.get("a").is_some());
        assert!(registry.get("b").is_none());
        assert!(registry.get("c").is_none());
    }

    #[test]
    fn test_filter_defaults_allow_all() {
        let filter = ExtensionFilter::default();
        assert!(filter.allows("anything"));
    }
}
