// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Availability-zone resolution for instances

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::context::ComputeContext;
use crate::error::ExtensionError;
use crate::instance::InstanceRecord;

/// Default lifetime of a cached host-to-zone mapping
pub const DEFAULT_AZ_CACHE_SECONDS: u64 = 60;

/// Resolves the authoritative zone of an instance
///
/// `None` means "not known (yet)". Implementations absorb their own
/// failures; callers treat the answer as best effort.
#[async_trait]
pub trait ZoneResolver: Send + Sync {
    async fn instance_availability_zone(
        &self,
        ctx: &ComputeContext,
        instance: &InstanceRecord,
    ) -> Option<String>;
}

/// Source of host aggregate metadata
#[async_trait]
pub trait AggregateStore: Send + Sync {
    /// Zone assigned to `host` through its aggregates, if any
    async fn host_availability_zone(
        &self,
        ctx: &ComputeContext,
        host: &str,
    ) -> Result<Option<String>, ExtensionError>;
}

struct CacheEntry {
    zone: String,
    expires_at: Instant,
}

/// Zone resolver backed by host aggregates
///
/// An instance that has not landed on a host has no zone. Otherwise the
/// zone is the one set on the host's aggregate, or the default zone when
/// the host belongs to none. Answers are cached per host.
pub struct AggregateZoneResolver {
    store: Arc<dyn AggregateStore>,
    default_zone: String,
    ttl: Duration,
    cache: Mutex<HashMap<String, CacheEntry>>,
}

impl AggregateZoneResolver {
    pub fn new(store: Arc<dyn AggregateStore>, default_zone: impl Into<String>, ttl: Duration) -> Self {
        Self {
            store,
            default_zone: default_zone.into(),
            ttl,
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn cache(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        // The map holds plain values, so a poisoned lock is still consistent
        match self.cache.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn cached(&self, host: &str) -> Option<String> {
        let mut cache = self.cache();
        let now = Instant::now();
        cache.retain(|_, entry| entry.expires_at > now);
        cache.get(host).map(|entry| entry.zone.clone())
    }

    /// Zone for a host, consulting the store on a cache miss
    pub async fn host_availability_zone(
        &self,
        ctx: &ComputeContext,
        host: &str,
    ) -> Result<String, ExtensionError> {
        if let Some(zone) = self.cached(host) {
            return Ok(zone);
        }
        let zone = self
            .store
            .host_availability_zone(&ctx.elevated(), host)
            .await?
            .unwrap_or_else(|| self.default_zone.clone());
        self.cache().insert(
            host.to_string(),
            CacheEntry {
                zone: zone.clone(),
                expires_at: Instant::now() + self.ttl,
            },
        );
        Ok(zone)
    }
}

#[async_trait]
impl ZoneResolver for AggregateZoneResolver {
    async fn instance_availability_zone(
        &self,
        ctx: &ComputeContext,
        instance: &InstanceRecord,
    ) -> Option<String> {
        let host = instance.host.as_deref().filter(|h| !h.is_empty())?;
        match self.host_availability_zone(ctx, host).await {
            Ok(zone) => Some(zone),
            Err(e) => {
                tracing::warn!(
                    request_id = %ctx.request_id,
                    instance = %instance.uuid,
                    host = %host,
                    error = %e,
                    "Failed to resolve availability zone"
                );
                None
            }
        }
    }
}
