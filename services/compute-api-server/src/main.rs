// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Compute API Server
//!
//! Serves `GET /v3/servers` and `GET /v3/servers/{id}` from fixtures. Each
//! response passes through the loaded API extensions, which may add
//! namespaced fields (such as the instance availability zone) before it is
//! rendered as JSON or XML.

use anyhow::{Context, Result};
use dropshot::{ConfigDropshot, ConfigLogging, ConfigLoggingLevel, HttpServerStarter};
use tracing::info;

use compute_api_server::config::{DEFAULT_AVAILABILITY_ZONE, DEFAULT_BIND_ADDRESS, ServerConfig};
use compute_api_server::context::ApiContext;

/// Default maximum request body size (bytes).
const DEFAULT_BODY_MAX_BYTES: usize = 1024 * 1024;

fn print_version() {
    let version = env!("CARGO_PKG_VERSION");
    let name = env!("CARGO_PKG_NAME");
    let buildstamp = option_env!("STAMP").unwrap_or("no-STAMP");
    println!("{} {} ({})", name, version, buildstamp);
}

fn print_usage(program: &str) {
    print_version();
    println!("Usage: {} [OPTIONS]", program);
    println!();
    println!("Options:");
    println!("  -h, --help                 Display this information");
    println!("  -V, --version              Display the program's version number");
    println!();
    println!("Environment variables:");
    println!(
        "  BIND_ADDRESS               Server bind address (default: {})",
        DEFAULT_BIND_ADDRESS
    );
    println!("  FIXTURES_DIR               Directory holding instances.json and aggregates.json");
    println!("  POLICY_FILE                JSON policy rules (default: built-in rules)");
    println!(
        "  DEFAULT_AVAILABILITY_ZONE  Zone for hosts outside any zoned aggregate (default: {})",
        DEFAULT_AVAILABILITY_ZONE
    );
    println!("  AZ_CACHE_SECONDS           Host zone cache lifetime (default: 60)");
    println!("  EXTENSIONS_WHITELIST       Comma-separated aliases to load (default: all)");
    println!("  EXTENSIONS_BLACKLIST       Comma-separated aliases to skip");
    println!(
        "  RUST_LOG                   Log filter (default: compute_api_server=info,compute_extensions=info,dropshot=info)"
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    #[allow(clippy::never_loop)] // Intentional: early return on first recognized arg
    for arg in &args[1..] {
        match arg.as_str() {
            "-V" | "--version" => {
                print_version();
                return Ok(());
            }
            "-h" | "--help" => {
                print_usage(&args[0]);
                return Ok(());
            }
            _ => {
                eprintln!("Unknown option: {}", arg);
                std::process::exit(1);
            }
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| {
                "compute_api_server=info,compute_extensions=info,dropshot=info".to_string()
            }),
        ))
        .init();

    print_version();

    let config = ServerConfig::from_env()?;
    info!(
        fixtures_dir = %config.fixtures_dir.display(),
        default_availability_zone = %config.default_availability_zone,
        az_cache_seconds = config.az_cache_ttl.as_secs(),
        "Loaded configuration"
    );

    let api_context = ApiContext::new(&config).context("Failed to create API context")?;

    let api = compute_api_server::api_description()
        .map_err(|e| anyhow::anyhow!("Failed to create API description: {}", e))?;

    let config_dropshot = ConfigDropshot {
        bind_address: config.bind_address,
        default_request_body_max_bytes: DEFAULT_BODY_MAX_BYTES,
        default_handler_task_mode: dropshot::HandlerTaskMode::Detached,
        ..Default::default()
    };

    let config_logging = ConfigLogging::StderrTerminal {
        level: ConfigLoggingLevel::Info,
    };

    let log = config_logging
        .to_logger("compute-api-server")
        .map_err(|error| anyhow::anyhow!("failed to create logger: {}", error))?;

    let server = HttpServerStarter::new(&config_dropshot, api, api_context, &log)
        .map_err(|error| anyhow::anyhow!("failed to create server: {}", error))?
        .start();

    info!("Compute API server running on http://{}", server.local_addr());

    server
        .await
        .map_err(|error| anyhow::anyhow!("server failed: {}", error))
}
