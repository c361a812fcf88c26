// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Request-scoped view handed to extension hooks

use std::collections::HashMap;

use crate::context::ComputeContext;
use crate::error::ExtensionError;
use crate::instance::{InstanceLookup, InstanceRecord};

/// What an extension hook sees of the request being answered
///
/// The base handler primes the instance cache with the records it already
/// loaded, so hooks resolve `server.id` without a second trip to the store.
/// Records are always paired by id, never by position.
pub struct ExtensionRequest<'a> {
    context: &'a ComputeContext,
    instances: &'a dyn InstanceLookup,
    cache: HashMap<String, InstanceRecord>,
}

impl<'a> ExtensionRequest<'a> {
    pub fn new(context: &'a ComputeContext, instances: &'a dyn InstanceLookup) -> Self {
        Self {
            context,
            instances,
            cache: HashMap::new(),
        }
    }

    pub fn context(&self) -> &ComputeContext {
        self.context
    }

    /// Remember records the base handler has already loaded
    pub fn cache_instances<I>(&mut self, records: I)
    where
        I: IntoIterator<Item = InstanceRecord>,
    {
        for record in records {
            self.cache.insert(record.uuid.clone(), record);
        }
    }

    /// Backing record for a server id, from the cache or the store
    pub async fn get_instance(&self, id: &str) -> Result<InstanceRecord, ExtensionError> {
        if let Some(record) = self.cache.get(id) {
            return Ok(record.clone());
        }
        self.instances.get_instance(self.context, id).await
    }
}
