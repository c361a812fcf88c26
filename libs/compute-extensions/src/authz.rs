// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Authorization gates consulted by extensions before they decorate a response

use std::sync::Arc;

use crate::context::ComputeContext;
use crate::error::ExtensionError;
use crate::policy::{PolicyCheck, caller_target};

/// Yes/no predicate deciding whether an extension applies to a request
///
/// Implementations must not mutate anything they are given. A denial is
/// `Ok(false)`; an `Err` fails the whole request.
pub trait AuthorizationGate: Send + Sync {
    fn authorize(&self, ctx: &ComputeContext) -> Result<bool, ExtensionError>;
}

/// Gate that turns a policy denial into "do not decorate"
///
/// The checked action is `<api>_extension:<extension>`, for example
/// `compute_extension:v3:os-extended-availability-zone`. The target is the
/// caller's own project and user.
pub struct SoftExtensionAuthorizer {
    policy: Arc<dyn PolicyCheck>,
    action: String,
}

impl SoftExtensionAuthorizer {
    pub fn new(policy: Arc<dyn PolicyCheck>, api_name: &str, extension_name: &str) -> Self {
        Self {
            policy,
            action: format!("{}_extension:{}", api_name, extension_name),
        }
    }

    /// Policy action this gate checks
    pub fn action(&self) -> &str {
        &self.action
    }
}

impl AuthorizationGate for SoftExtensionAuthorizer {
    fn authorize(&self, ctx: &ComputeContext) -> Result<bool, ExtensionError> {
        let allowed = self
            .policy
            .check(ctx, &self.action, &caller_target(ctx))
            .map_err(|source| ExtensionError::Authorization {
                action: self.action.clone(),
                source,
            })?;
        if !allowed {
            tracing::debug!(
                request_id = %ctx.request_id,
                action = %self.action,
                "extension not authorized for caller"
            );
        }
        Ok(allowed)
    }
}
