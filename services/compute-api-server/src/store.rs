// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Fixture-backed instance and aggregate store
//!
//! Stands in for the compute database: instance records and host aggregates
//! are loaded from JSON files at startup and served read-only.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use compute_extensions::{AggregateStore, ComputeContext, ExtensionError, InstanceLookup, InstanceRecord};
use serde::Deserialize;

/// A host aggregate, optionally pinned to an availability zone
#[derive(Clone, Debug, Deserialize)]
pub struct Aggregate {
    pub name: String,
    #[serde(default)]
    pub availability_zone: Option<String>,
    #[serde(default)]
    pub hosts: Vec<String>,
}

#[derive(Debug, Default)]
pub struct FixtureStore {
    /// Instances in fixture order
    instances: Vec<InstanceRecord>,
    aggregates: Vec<Aggregate>,
}

impl FixtureStore {
    pub fn new(instances: Vec<InstanceRecord>, aggregates: Vec<Aggregate>) -> Self {
        Self {
            instances,
            aggregates,
        }
    }

    /// Load `instances.json` and, if present, `aggregates.json`
    pub fn from_fixtures(fixtures_dir: &Path) -> Result<Self> {
        let instances_path = fixtures_dir.join("instances.json");
        let instances_json = std::fs::read_to_string(&instances_path)
            .with_context(|| format!("Failed to read {}", instances_path.display()))?;
        let instances: Vec<InstanceRecord> = serde_json::from_str(&instances_json)
            .with_context(|| format!("Failed to parse {}", instances_path.display()))?;

        let aggregates_path = fixtures_dir.join("aggregates.json");
        let aggregates: Vec<Aggregate> = if aggregates_path.exists() {
            let json = std::fs::read_to_string(&aggregates_path)
                .with_context(|| format!("Failed to read {}", aggregates_path.display()))?;
            serde_json::from_str(&json)
                .with_context(|| format!("Failed to parse {}", aggregates_path.display()))?
        } else {
            Vec::new()
        };

        let mut seen = HashSet::new();
        for instance in &instances {
            if !seen.insert(instance.uuid.as_str()) {
                anyhow::bail!("Duplicate instance {} in fixtures", instance.uuid);
            }
        }

        tracing::info!(
            instances = instances.len(),
            aggregates = aggregates.len(),
            "Loaded fixtures from {}",
            fixtures_dir.display()
        );
        Ok(Self::new(instances, aggregates))
    }

    fn visible(ctx: &ComputeContext, instance: &InstanceRecord) -> bool {
        ctx.is_admin || instance.project_id == ctx.project_id
    }

    /// Instances the caller may see, in stored order
    pub fn list_instances(&self, ctx: &ComputeContext) -> Vec<InstanceRecord> {
        self.instances
            .iter()
            .filter(|i| Self::visible(ctx, i))
            .cloned()
            .collect()
    }

    /// One instance, if it exists and the caller may see it
    pub fn find_instance(&self, ctx: &ComputeContext, id: &str) -> Result<InstanceRecord, ExtensionError> {
        self.instances
            .iter()
            .find(|i| i.uuid == id && Self::visible(ctx, i))
            .cloned()
            .ok_or_else(|| ExtensionError::InstanceNotFound(id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

#[async_trait]
impl InstanceLookup for FixtureStore {
    async fn get_instance(&self, ctx: &ComputeContext, id: &str) -> Result<InstanceRecord, ExtensionError> {
        self.find_instance(ctx, id)
    }
}

#[async_trait]
impl AggregateStore for FixtureStore {
    async fn host_availability_zone(
        &self,
        _ctx: &ComputeContext,
        host: &str,
    ) -> Result<Option<String>, ExtensionError> {
        Ok(self
            .aggregates
            .iter()
            .filter(|a| a.hosts.iter().any(|h| h == host))
            .find_map(|a| a.availability_zone.clone()))
    }
}
