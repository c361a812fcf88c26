// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Extension descriptors and controller bindings

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::ExtensionError;
use crate::representation::ResponseObject;
use crate::request::ExtensionRequest;

/// Identity of a loaded extension
///
/// Immutable once registered; the alias is both the registry key and the
/// prefix of every field the extension injects.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ExtensionDescriptor {
    /// Display name, e.g. `ExtendedAvailabilityZone`
    pub name: String,
    /// Unique short name, e.g. `os-extended-availability-zone`
    pub alias: String,
    /// XML namespace for the extension's attributes
    pub namespace: String,
    pub version: u32,
    /// One-line summary for the extension listing
    pub description: String,
}

/// Hooks run by the dispatch layer after the base handler has built its
/// representation and before it is serialized
///
/// Hooks are called in registration order. They must keep no per-request
/// state on `self`.
#[async_trait]
pub trait ResponseExtender: Send + Sync {
    /// A single resource is about to be returned (`show`)
    async fn on_single_response(
        &self,
        req: &ExtensionRequest<'_>,
        resp: &mut ResponseObject,
        id: &str,
    ) -> Result<(), ExtensionError>;

    /// A detailed list of resources is about to be returned (`detail`)
    async fn on_list_response(
        &self,
        req: &ExtensionRequest<'_>,
        resp: &mut ResponseObject,
    ) -> Result<(), ExtensionError>;
}

/// Attachment of an extension's hooks to one base resource controller
#[derive(Clone)]
pub struct ControllerExtension {
    pub extension: Arc<ExtensionDescriptor>,
    /// Base resource type, e.g. `servers`
    pub collection: String,
    pub controller: Arc<dyn ResponseExtender>,
}

impl ControllerExtension {
    pub fn new(
        extension: Arc<ExtensionDescriptor>,
        collection: impl Into<String>,
        controller: Arc<dyn ResponseExtender>,
    ) -> Self {
        Self {
            extension,
            collection: collection.into(),
            controller,
        }
    }

    pub fn alias(&self) -> &str {
        &self.extension.alias
    }
}

impl std::fmt::Debug for ControllerExtension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControllerExtension")
            .field("alias", &self.extension.alias)
            .field("collection", &self.collection)
            .finish()
    }
}

/// A loadable API extension
pub trait ApiExtension: Send + Sync {
    fn descriptor(&self) -> Arc<ExtensionDescriptor>;

    /// Bindings of this extension's hooks to base resource controllers
    fn controller_extensions(&self) -> Vec<ControllerExtension>;
}
