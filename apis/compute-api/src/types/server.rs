// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Server-related types

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Path parameter for server operations
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ServerPath {
    /// Server (instance) UUID
    pub server_id: String,
}

/// Server status as shown to API clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerStatus {
    Active,
    Build,
    Shutoff,
    Paused,
    Suspended,
    Error,
    Deleted,
    Unknown,
}

impl ServerStatus {
    /// Map a stored lifecycle state onto the client-facing status
    pub fn from_vm_state(vm_state: &str) -> Self {
        match vm_state {
            "active" => ServerStatus::Active,
            "building" => ServerStatus::Build,
            "stopped" => ServerStatus::Shutoff,
            "paused" => ServerStatus::Paused,
            "suspended" => ServerStatus::Suspended,
            "error" => ServerStatus::Error,
            "deleted" => ServerStatus::Deleted,
            _ => ServerStatus::Unknown,
        }
    }
}

/// Base server representation
///
/// Loaded extensions may add namespaced keys (`<alias>:<field>`) next to
/// these fields; clients should ignore keys they do not understand.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Server {
    /// Server UUID
    pub id: String,
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
    pub status: ServerStatus,
    /// Owning project
    pub tenant_id: String,
    /// Creating user
    pub user_id: String,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub updated: Option<String>,
}
