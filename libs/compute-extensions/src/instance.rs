// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Backing instance records and the persistence seam used to fetch them

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::context::ComputeContext;
use crate::error::ExtensionError;

/// Stored record of a compute instance
///
/// This is the authoritative data behind a `server` representation. Only a
/// few fields matter to extensions; the rest feed the base representation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceRecord {
    /// Instance UUID, also the server `id`
    pub uuid: String,
    #[serde(default)]
    pub display_name: Option<String>,
    pub project_id: String,
    pub user_id: String,
    /// Lifecycle state (`active`, `building`, `stopped`, ...)
    pub vm_state: String,
    /// Compute host the instance landed on, once scheduled
    #[serde(default)]
    pub host: Option<String>,
    /// Zone requested at boot; best-effort and may never be honoured
    #[serde(default)]
    pub availability_zone: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl InstanceRecord {
    /// The requested zone, if one was given and is not blank
    pub fn requested_zone(&self) -> Option<&str> {
        self.availability_zone
            .as_deref()
            .filter(|zone| !zone.is_empty())
    }
}

/// Persistence collaborator that loads instance records by id
#[async_trait]
pub trait InstanceLookup: Send + Sync {
    async fn get_instance(
        &self,
        ctx: &ComputeContext,
        id: &str,
    ) -> Result<InstanceRecord, ExtensionError>;
}
