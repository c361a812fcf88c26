// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Extension listing types

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Path parameter for extension lookups
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ExtensionPath {
    /// Extension alias, e.g. `os-extended-availability-zone`
    pub alias: String,
}

/// A loaded API extension
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExtensionInfo {
    pub name: String,
    pub alias: String,
    /// XML namespace of the extension's attributes
    pub namespace: String,
    pub version: u32,
    pub description: String,
}

/// Response for the extension list
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ExtensionList {
    /// Extensions in load order
    pub extensions: Vec<ExtensionInfo>,
}
