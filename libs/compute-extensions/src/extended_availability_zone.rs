// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Extended availability zone extension
//!
//! Adds `os-extended-availability-zone:availability_zone` to every server
//! returned by `show` and `detail`. The value is the instance's
//! authoritative zone, else the zone requested at boot, else `null`. The
//! key is always present once the caller is authorized.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::authz::{AuthorizationGate, SoftExtensionAuthorizer};
use crate::context::ComputeContext;
use crate::error::ExtensionError;
use crate::extension::{ApiExtension, ControllerExtension, ExtensionDescriptor, ResponseExtender};
use crate::instance::InstanceRecord;
use crate::policy::PolicyCheck;
use crate::representation::{NamespacedFields, ResponseObject};
use crate::request::ExtensionRequest;
use crate::xml::{QualifiedName, SlaveTemplate, TemplateElement};
use crate::zones::ZoneResolver;

pub const ALIAS: &str = "os-extended-availability-zone";
pub const NAME: &str = "ExtendedAvailabilityZone";
pub const NAMESPACE: &str = "http://docs.openstack.org/compute/ext/extended_availability_zone/api/v3";
pub const VERSION: u32 = 1;

/// Field name within the extension's namespace
pub const FIELD: &str = "availability_zone";

const RESOURCE: &str = "servers";
const MEMBER: &str = "server";

/// The loadable extension
pub struct ExtendedAvailabilityZone {
    descriptor: Arc<ExtensionDescriptor>,
    controller: Arc<ExtendedAzController>,
}

impl ExtendedAvailabilityZone {
    /// Build the extension, gated by the `compute_extension:v3:<alias>` policy
    pub fn new(policy: Arc<dyn PolicyCheck>, zones: Arc<dyn ZoneResolver>) -> Self {
        let gate = Arc::new(SoftExtensionAuthorizer::new(
            policy,
            "compute",
            &format!("v3:{}", ALIAS),
        ));
        Self::with_gate(gate, zones)
    }

    /// Build the extension with an explicit authorization gate
    pub fn with_gate(gate: Arc<dyn AuthorizationGate>, zones: Arc<dyn ZoneResolver>) -> Self {
        let descriptor = Arc::new(ExtensionDescriptor {
            name: NAME.to_string(),
            alias: ALIAS.to_string(),
            namespace: NAMESPACE.to_string(),
            version: VERSION,
            description: "Adds the availability zone to server representations.".to_string(),
        });
        let controller = Arc::new(ExtendedAzController {
            alias: descriptor.alias.clone(),
            namespace: descriptor.namespace.clone(),
            gate,
            zones,
        });
        Self {
            descriptor,
            controller,
        }
    }
}

impl ApiExtension for ExtendedAvailabilityZone {
    fn descriptor(&self) -> Arc<ExtensionDescriptor> {
        Arc::clone(&self.descriptor)
    }

    fn controller_extensions(&self) -> Vec<ControllerExtension> {
        vec![ControllerExtension::new(
            self.descriptor(),
            RESOURCE,
            Arc::clone(&self.controller) as Arc<dyn ResponseExtender>,
        )]
    }
}

/// Hooks for the `servers` controller
pub struct ExtendedAzController {
    alias: String,
    namespace: String,
    gate: Arc<dyn AuthorizationGate>,
    zones: Arc<dyn ZoneResolver>,
}

impl ExtendedAzController {
    /// Zone to report: authoritative first, then the requested zone
    async fn zone_for(&self, ctx: &ComputeContext, instance: &InstanceRecord) -> Option<String> {
        let zone = self
            .zones
            .instance_availability_zone(ctx, instance)
            .await
            .filter(|z| !z.is_empty());
        if zone.is_some() {
            return zone;
        }
        // Likely not scheduled yet; report the zone asked for at boot
        let requested = instance.requested_zone().map(str::to_string);
        if requested.is_some() {
            tracing::debug!(
                request_id = %ctx.request_id,
                instance = %instance.uuid,
                "Using requested availability zone"
            );
        }
        requested
    }

    async fn extend_server(
        &self,
        ctx: &ComputeContext,
        server: &mut Map<String, Value>,
        instance: &InstanceRecord,
    ) {
        let zone = self.zone_for(ctx, instance).await;
        NamespacedFields::new(&self.alias, server)
            .set(FIELD, zone.map(Value::String).unwrap_or(Value::Null));
    }

    fn nsmap(&self) -> BTreeMap<String, String> {
        let mut nsmap = BTreeMap::new();
        nsmap.insert(self.alias.clone(), self.namespace.clone());
        nsmap
    }

    fn decorate(&self, elem: &mut TemplateElement) {
        elem.set(
            QualifiedName::namespaced(self.namespace.clone(), FIELD),
            format!("{}:{}", self.alias, FIELD),
        );
    }

    /// XML template for a single `<server>` root
    pub fn server_template(&self) -> SlaveTemplate {
        let mut root = TemplateElement::new(MEMBER).selector(MEMBER);
        self.decorate(&mut root);
        SlaveTemplate::new(root, 1, self.nsmap())
    }

    /// XML template for `<server>` children of a `<servers>` root
    pub fn servers_template(&self) -> SlaveTemplate {
        let mut root = TemplateElement::new(RESOURCE);
        let elem = root.sub_element(TemplateElement::new(MEMBER).selector(RESOURCE));
        self.decorate(elem);
        SlaveTemplate::new(root, 1, self.nsmap())
    }
}

#[async_trait]
impl ResponseExtender for ExtendedAzController {
    async fn on_single_response(
        &self,
        req: &ExtensionRequest<'_>,
        resp: &mut ResponseObject,
        id: &str,
    ) -> Result<(), ExtensionError> {
        let ctx = req.context();
        if !self.gate.authorize(ctx)? {
            return Ok(());
        }
        resp.attach(&self.alias, self.server_template());
        let instance = req.get_instance(id).await?;
        let server = resp.member_mut(MEMBER)?;
        self.extend_server(ctx, server, &instance).await;
        Ok(())
    }

    async fn on_list_response(
        &self,
        req: &ExtensionRequest<'_>,
        resp: &mut ResponseObject,
    ) -> Result<(), ExtensionError> {
        let ctx = req.context();
        if !self.gate.authorize(ctx)? {
            return Ok(());
        }
        resp.attach(&self.alias, self.servers_template());
        for item in resp.collection_mut(RESOURCE)?.iter_mut() {
            let Value::Object(server) = item else {
                tracing::warn!(request_id = %ctx.request_id, "Skipping non-object server entry");
                continue;
            };
            let id = server.get("id").and_then(Value::as_str).map(str::to_string);
            let instance = match id {
                Some(id) => req.get_instance(&id).await,
                None => Err(ExtensionError::MalformedRepresentation(
                    "server entry without an id".to_string(),
                )),
            };
            match instance {
                Ok(instance) => self.extend_server(ctx, server, &instance).await,
                Err(e) => {
                    tracing::warn!(
                        request_id = %ctx.request_id,
                        error = %e,
                        "Could not resolve backing instance for server"
                    );
                    NamespacedFields::new(&self.alias, server).set(FIELD, Value::Null);
                }
            }
        }
        Ok(())
    }
}
