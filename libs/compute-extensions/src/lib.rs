// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Compute API response extensions
//!
//! Extensions decorate the representations produced by base resource
//! controllers (for example `servers`) before they are serialized. The
//! dispatch layer drives them in a fixed order:
//!
//! 1. the base handler builds a [`ResponseObject`]
//! 2. the [`ExtensionRegistry`] yields the bindings for the resource type,
//!    in registration order
//! 3. each binding's [`ResponseExtender`] checks its authorization gate and,
//!    if allowed, writes fields under its own alias and attaches an XML
//!    [`SlaveTemplate`]
//! 4. the dispatch layer serializes the final representation
//!
//! # Modules
//!
//! - [`registry`] - append-only extension registry
//! - [`extension`] - descriptors, hook trait, controller bindings
//! - [`authz`] / [`policy`] - authorization gates and the rule engine
//! - [`representation`] - response objects and namespaced field access
//! - [`xml`] - master/slave XML templates
//! - [`zones`] - availability-zone resolution
//! - [`extended_availability_zone`] - the `os-extended-availability-zone`
//!   extension

pub mod authz;
pub mod context;
pub mod error;
pub mod extended_availability_zone;
pub mod extension;
pub mod instance;
pub mod policy;
pub mod registry;
pub mod representation;
pub mod request;
pub mod xml;
pub mod zones;

pub use authz::{AuthorizationGate, SoftExtensionAuthorizer};
pub use context::ComputeContext;
pub use error::{ExtensionError, PolicyError, TemplateError};
pub use extension::{ApiExtension, ControllerExtension, ExtensionDescriptor, ResponseExtender};
pub use instance::{InstanceLookup, InstanceRecord};
pub use policy::{Policy, PolicyCheck};
pub use registry::{ExtensionFilter, ExtensionRegistry};
pub use representation::{NamespacedFields, ResponseObject, namespaced_key};
pub use request::ExtensionRequest;
pub use xml::{MasterTemplate, QualifiedName, SlaveTemplate, TemplateElement};
pub use zones::{AggregateStore, AggregateZoneResolver, ZoneResolver};
