// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Caller identity carried through a single API request

use serde::Serialize;
use uuid::Uuid;

/// Per-request security context
///
/// Built by the dispatch layer from the authenticated request and handed to
/// extensions read-only. Extensions pass it through to the authorization gate
/// and the zone resolver; they never store it.
#[derive(Clone, Debug, Serialize)]
pub struct ComputeContext {
    /// Request identifier, used for log correlation
    pub request_id: Uuid,
    /// Authenticated user
    pub user_id: String,
    /// Project (tenant) the request is scoped to
    pub project_id: String,
    /// Roles granted to the user in the project
    pub roles: Vec<String>,
    /// Whether the caller holds the admin role
    pub is_admin: bool,
}

impl ComputeContext {
    /// Create a context for a user in a project
    ///
    /// `is_admin` is derived from the presence of the `admin` role.
    pub fn new(
        user_id: impl Into<String>,
        project_id: impl Into<String>,
        roles: Vec<String>,
    ) -> Self {
        let is_admin = roles.iter().any(|r| r.eq_ignore_ascii_case("admin"));
        Self {
            request_id: Uuid::new_v4(),
            user_id: user_id.into(),
            project_id: project_id.into(),
            roles,
            is_admin,
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r.eq_ignore_ascii_case(role))
    }

    /// Copy of this context with admin rights, for internal lookups that
    /// must not be filtered by the caller's project
    pub fn elevated(&self) -> Self {
        let mut ctx = self.clone();
        if !ctx.has_role("admin") {
            ctx.roles.push("admin".to_string());
        }
        ctx.is_admin = true;
        ctx
    }
}
