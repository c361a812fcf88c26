// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

use dropshot::{Body, HttpError, HttpResponseOk, Path, RequestContext};
use http::Response;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub mod types;

pub use types::*;

/// Health check response
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct PingResponse {
    pub status: String,
    pub version: String,
}

/// Compute API Trait
///
/// Server endpoints negotiate their wire format from the `Accept` header:
/// `application/xml` selects XML, anything else JSON. Representations carry
/// whatever fields the loaded extensions add.
#[dropshot::api_description]
pub trait ComputeApi {
    /// Context type for request handlers
    type Context: Send + Sync + 'static;

    /// Health check
    #[endpoint {
        method = GET,
        path = "/ping",
        tags = ["system"],
    }]
    async fn ping(
        rqctx: RequestContext<Self::Context>,
    ) -> Result<HttpResponseOk<PingResponse>, HttpError>;

    /// Show a server
    ///
    /// Returns `{"server": {...}}` or a `<server>` document.
    #[endpoint {
        method = GET,
        path = "/v3/servers/{server_id}",
        tags = ["servers"],
    }]
    async fn get_server(
        rqctx: RequestContext<Self::Context>,
        path: Path<ServerPath>,
    ) -> Result<Response<Body>, HttpError>;

    /// List servers with details
    ///
    /// Returns `{"servers": [...]}` or a `<servers>` document. Callers see
    /// their own project's servers; admins see all servers.
    #[endpoint {
        method = GET,
        path = "/v3/servers",
        tags = ["servers"],
    }]
    async fn list_servers(
        rqctx: RequestContext<Self::Context>,
    ) -> Result<Response<Body>, HttpError>;

    /// List loaded extensions
    #[endpoint {
        method = GET,
        path = "/v3/extensions",
        tags = ["extensions"],
    }]
    async fn list_extensions(
        rqctx: RequestContext<Self::Context>,
    ) -> Result<HttpResponseOk<ExtensionList>, HttpError>;

    /// Show one loaded extension
    #[endpoint {
        method = GET,
        path = "/v3/extensions/{alias}",
        tags = ["extensions"],
    }]
    async fn get_extension(
        rqctx: RequestContext<Self::Context>,
        path: Path<ExtensionPath>,
    ) -> Result<HttpResponseOk<ExtensionInfo>, HttpError>;
}
