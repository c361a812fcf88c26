// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Error types for compute-extensions

use thiserror::Error;

/// Errors raised while loading extensions or decorating a response
#[derive(Error, Debug)]
pub enum ExtensionError {
    /// An extension with the same alias is already registered
    #[error("Extension alias already registered: {0}")]
    DuplicateAlias(String),

    /// A binding names a different extension than the one registering it
    #[error("Extension {alias} offered a binding owned by {binding_alias}")]
    ForeignBinding {
        alias: String,
        binding_alias: String,
    },

    /// An extension offered two bindings for the same resource type
    #[error("Extension {alias} binds resource '{resource}' more than once")]
    DuplicateBinding { alias: String, resource: String },

    /// The policy engine could not reach a decision for the caller
    #[error("Authorization failed for {action}: {source}")]
    Authorization {
        action: String,
        #[source]
        source: PolicyError,
    },

    /// The backing instance record does not exist
    #[error("Instance not found: {0}")]
    InstanceNotFound(String),

    /// The persistence collaborator failed
    #[error("Instance lookup failed: {0}")]
    InstanceLookup(String),

    /// The response object does not have the shape the hook expects
    #[error("Malformed representation: {0}")]
    MalformedRepresentation(String),

    /// A serialization template could not be attached or rendered
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),
}

/// Errors from the policy engine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    /// A rule expression could not be parsed
    #[error("Invalid rule '{rule}': {reason}")]
    InvalidRule { rule: String, reason: String },

    /// A `rule:<name>` reference names a rule that does not exist
    #[error("Unknown rule reference: {0}")]
    UnknownRule(String),

    /// Rule references form a cycle
    #[error("Rule recursion limit exceeded at: {0}")]
    RecursionLimit(String),

    /// The policy document could not be read
    #[error("Failed to load policy: {0}")]
    Load(String),
}

/// Errors from XML serialization templates
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// A slave template's root does not match the master's root
    #[error("Template root mismatch: master <{master}>, slave <{slave}>")]
    RootMismatch { master: String, slave: String },

    /// Two templates bind the same prefix to different namespaces
    #[error("Namespace prefix '{prefix}' bound to both {existing} and {conflicting}")]
    NamespaceCollision {
        prefix: String,
        existing: String,
        conflicting: String,
    },

    /// An attribute names a namespace with no declared prefix
    #[error("No prefix declared for namespace {0}")]
    UndeclaredNamespace(String),

    /// The data selected for an element is not renderable
    #[error("Cannot render <{element}>: {reason}")]
    Render { element: String, reason: String },
}
