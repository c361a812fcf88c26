// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Server configuration

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use compute_extensions::ExtensionFilter;
use compute_extensions::zones::DEFAULT_AZ_CACHE_SECONDS;

/// Default bind address for the HTTP server
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8774";

/// Zone reported for hosts that belong to no zoned aggregate
pub const DEFAULT_AVAILABILITY_ZONE: &str = "nova";

/// Server configuration
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: SocketAddr,
    /// Directory holding `instances.json` and `aggregates.json`
    pub fixtures_dir: PathBuf,
    /// JSON policy document; built-in rules when unset
    pub policy_file: Option<PathBuf>,
    pub default_availability_zone: String,
    /// Lifetime of cached host-to-zone answers
    pub az_cache_ttl: Duration,
    pub extensions: ExtensionFilter,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 8774)),
            fixtures_dir: default_fixtures_dir(),
            policy_file: None,
            default_availability_zone: DEFAULT_AVAILABILITY_ZONE.to_string(),
            az_cache_ttl: Duration::from_secs(DEFAULT_AZ_CACHE_SECONDS),
            extensions: ExtensionFilter::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let bind_address = std::env::var("BIND_ADDRESS")
            .unwrap_or_else(|_| DEFAULT_BIND_ADDRESS.to_string())
            .parse()
            .context("Invalid BIND_ADDRESS")?;

        let fixtures_dir = std::env::var("FIXTURES_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_fixtures_dir());

        let policy_file = std::env::var("POLICY_FILE").ok().map(PathBuf::from);

        let default_availability_zone = std::env::var("DEFAULT_AVAILABILITY_ZONE")
            .unwrap_or_else(|_| DEFAULT_AVAILABILITY_ZONE.to_string());

        let az_cache_secs = match std::env::var("AZ_CACHE_SECONDS") {
            Ok(s) => s.parse().context("Invalid AZ_CACHE_SECONDS")?,
            Err(_) => DEFAULT_AZ_CACHE_SECONDS,
        };

        let extensions = ExtensionFilter {
            whitelist: alias_list("EXTENSIONS_WHITELIST"),
            blacklist: alias_list("EXTENSIONS_BLACKLIST"),
        };

        Ok(Self {
            bind_address,
            fixtures_dir,
            policy_file,
            default_availability_zone,
            az_cache_ttl: Duration::from_secs(az_cache_secs),
            extensions,
        })
    }
}

fn default_fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
}

/// Comma-separated aliases from an environment variable
fn alias_list(var: &str) -> Vec<String> {
    std::env::var(var)
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
