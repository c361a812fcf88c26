// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Invocation of registered response extenders after the base handler

use std::sync::Arc;

use compute_extensions::{ExtensionError, ExtensionRegistry, ExtensionRequest, ResponseObject};

/// Runs every extension bound to a collection, in registration order
#[derive(Clone, Debug)]
pub struct ExtensionDispatcher {
    registry: Arc<ExtensionRegistry>,
}

impl ExtensionDispatcher {
    pub fn new(registry: Arc<ExtensionRegistry>) -> Self {
        Self { registry }
    }

    /// Decorate a single-resource response
    ///
    /// The first extender error aborts the request; decorations already
    /// applied by earlier extenders are discarded along with the response.
    pub async fn single(
        &self,
        collection: &str,
        req: &ExtensionRequest<'_>,
        resp: &mut ResponseObject,
        id: &str,
    ) -> Result<(), ExtensionError> {
        for binding in self.registry.extensions_for(collection) {
            tracing::debug!(
                request_id = %req.context().request_id,
                alias = binding.alias(),
                server_id = id,
                "Applying extension to single response"
            );
            binding.controller.on_single_response(req, resp, id).await?;
        }
        Ok(())
    }

    /// Decorate a list response
    pub async fn list(
        &self,
        collection: &str,
        req: &ExtensionRequest<'_>,
        resp: &mut ResponseObject,
    ) -> Result<(), ExtensionError> {
        for binding in self.registry.extensions_for(collection) {
            tracing::debug!(
                request_id = %req.context().request_id,
                alias = binding.alias(),
                "Applying extension to list response"
            );
            binding.controller.on_list_response(req, resp).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::sync::Mutex;

    use async_trait::async_trait;
    use compute_extensions::{
        ApiExtension, ComputeContext, ControllerExtension, ExtensionDescriptor, InstanceLookup,
        InstanceRecord, ResponseExtender,
    };
    use pretty_assertions::assert_eq;
    use serde_json::{Map, json};

    use super::*;

    struct NoInstances;

    #[async_trait]
    impl InstanceLookup for NoInstances {
        async fn get_instance(
            &self,
            _ctx: &ComputeContext,
            id: &str,
        ) -> Result<InstanceRecord, ExtensionError> {
            Err(ExtensionError::InstanceNotFound(id.to_string()))
        }
    }

    /// Appends its alias to a shared call log and tags the body
    struct Recorder {
        alias: String,
        calls: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl ResponseExtender for Recorder {
        async fn on_single_response(
            &self,
            _req: &ExtensionRequest<'_>,
            resp: &mut ResponseObject,
            _id: &str,
        ) -> Result<(), ExtensionError> {
            self.calls.lock().unwrap().push(self.alias.clone());
            resp.member_mut("server")?
                .insert(format!("{}:seen", self.alias), json!(true));
            Ok(())
        }

        async fn on_list_response(
            &self,
            _req: &ExtensionRequest<'_>,
            resp: &mut ResponseObject,
        ) -> Result<(), ExtensionError> {
            self.calls.lock().unwrap().push(self.alias.clone());
            for item in resp.collection_mut("servers")? {
                if let Some(server) = item.as_object_mut() {
                    server.insert(format!("{}:seen", self.alias), json!(true));
                }
            }
            Ok(())
        }
    }

    struct RecordingExtension {
        descriptor: Arc<ExtensionDescriptor>,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl RecordingExtension {
        fn new(alias: &str, calls: &Arc<Mutex<Vec<String>>>) -> Self {
            Self {
                descriptor: Arc::new(ExtensionDescriptor {
                    name: alias.to_string(),
                    alias: alias.to_string(),
                    namespace: format!("http://example.com/{}", alias),
                    version: 1,
                    description: String::new(),
                }),
                calls: Arc::clone(calls),
            }
        }
    }

    impl ApiExtension for RecordingExtension {
        fn descriptor(&self) -> Arc<ExtensionDescriptor> {
            Arc::clone(&self.descriptor)
        }

        fn controller_extensions(&self) -> Vec<ControllerExtension> {
            vec![ControllerExtension::new(
                self.descriptor(),
                "servers",
                Arc::new(Recorder {
                    alias: self.descriptor.alias.clone(),
                    calls: Arc::clone(&self.calls),
                }),
            )]
        }
    }

    fn dispatcher(calls: &Arc<Mutex<Vec<String>>>) -> ExtensionDispatcher {
        let mut registry = ExtensionRegistry::new();
        registry
            .register(&RecordingExtension::new("os-first", calls))
            .unwrap();
        registry
            .register(&RecordingExtension::new("os-second", calls))
            .unwrap();
        ExtensionDispatcher::new(Arc::new(registry))
    }

    #[tokio::test]
    async fn test_single_runs_in_registration_order() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let dispatcher = dispatcher(&calls);
        let ctx = ComputeContext::new("alice", "project-a", vec![]);
        let req = ExtensionRequest::new(&ctx, &NoInstances);
        let mut resp = ResponseObject::single("server", Map::new());

        dispatcher.single("servers", &req, &mut resp, "s-1").await.unwrap();

        assert_eq!(*calls.lock().unwrap(), vec!["os-first", "os-second"]);
        assert_eq!(
            resp.body(),
            &json!({"server": {"os-first:seen": true, "os-second:seen": true}})
        );
    }

    #[tokio::test]
    async fn test_list_runs_in_registration_order() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let dispatcher = dispatcher(&calls);
        let ctx = ComputeContext::new("alice", "project-a", vec![]);
        let req = ExtensionRequest::new(&ctx, &NoInstances);
        let mut first = Map::new();
        first.insert("id".to_string(), json!("s-1"));
        let mut second = Map::new();
        second.insert("id".to_string(), json!("s-2"));
        let mut resp = ResponseObject::list("servers", vec![first, second]);

        dispatcher.list("servers", &req, &mut resp).await.unwrap();

        assert_eq!(*calls.lock().unwrap(), vec!["os-first", "os-second"]);
        assert_eq!(
            resp.body(),
            &json!({"servers": [
                {"id": "s-1", "os-first:seen": true, "os-second:seen": true},
                {"id": "s-2", "os-first:seen": true, "os-second:seen": true},
            ]})
        );
    }

    #[tokio::test]
    async fn test_unbound_collection_is_untouched() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let dispatcher = dispatcher(&calls);
        let ctx = ComputeContext::new("alice", "project-a", vec![]);
        let req = ExtensionRequest::new(&ctx, &NoInstances);
        let mut resp = ResponseObject::list("images", vec![]);

        dispatcher.list("images", &req, &mut resp).await.unwrap();

        assert!(calls.lock().unwrap().is_empty());
        assert_eq!(resp.body(), &json!({"images": []}));
    }

    #[tokio::test]
    async fn test_extender_error_stops_dispatch() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let dispatcher = dispatcher(&calls);
        let ctx = ComputeContext::new("alice", "project-a", vec![]);
        let req = ExtensionRequest::new(&ctx, &NoInstances);
        // No "server" member, so the first extender fails
        let mut resp = ResponseObject::list("servers", vec![]);

        let err = dispatcher
            .single("servers", &req, &mut resp, "s-1")
            .await
            .unwrap_err();

        assert!(matches!(err, ExtensionError::MalformedRepresentation(_)));
        assert_eq!(*calls.lock().unwrap(), vec!["os-first"]);
    }
}
