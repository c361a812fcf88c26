// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Compute API Server Library
//!
//! Serves the v3 servers resource from a fixture store and runs the
//! registered response extensions over every show and list response.
//!
//! # Modules
//!
//! - [`config`] - Server configuration from the environment
//! - [`context`] - API context for request handlers
//! - [`dispatch`] - Invocation of response extenders
//! - [`render`] - JSON and XML serialization of decorated responses
//! - [`store`] - Fixture-backed instances and host aggregates

pub mod config;
pub mod context;
pub mod dispatch;
pub mod render;
pub mod store;

use compute_api::{
    ComputeApi, ExtensionInfo, ExtensionList, ExtensionPath, PingResponse, Server, ServerPath,
    ServerStatus,
};
use compute_extensions::{
    ComputeContext, ExtensionDescriptor, ExtensionError, ExtensionRequest, InstanceRecord,
    ResponseObject,
};
use dropshot::{Body, ClientErrorStatusCode, HttpError, HttpResponseOk, Path, RequestContext};
use http::{HeaderMap, Response};
use serde_json::{Map, Value};

use crate::context::ApiContext;
use crate::render::ResponseFormat;

/// Header carrying the authenticated user id
pub const USER_ID_HEADER: &str = "x-user-id";
/// Header carrying the caller's project id
pub const PROJECT_ID_HEADER: &str = "x-project-id";
/// Header carrying a comma-separated role list
pub const ROLES_HEADER: &str = "x-roles";

const SERVERS: &str = "servers";
const SERVER: &str = "server";

/// Compute API implementation
pub enum ComputeServiceImpl {}

/// Build the Dropshot API description for [`ComputeServiceImpl`]
pub fn api_description() -> Result<dropshot::ApiDescription<ApiContext>, String> {
    compute_api::compute_api_mod::api_description::<ComputeServiceImpl>().map_err(|e| e.to_string())
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Build the caller's context from identity headers
pub fn caller_context(headers: &HeaderMap) -> Result<ComputeContext, HttpError> {
    let (Some(user_id), Some(project_id)) = (
        header_str(headers, USER_ID_HEADER),
        header_str(headers, PROJECT_ID_HEADER),
    ) else {
        return Err(HttpError::for_client_error(
            None,
            ClientErrorStatusCode::UNAUTHORIZED,
            "missing user or project identity".to_string(),
        ));
    };
    let roles = header_str(headers, ROLES_HEADER)
        .map(|roles| {
            roles
                .split(',')
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    Ok(ComputeContext::new(user_id, project_id, roles))
}

/// Base representation of an instance
pub fn server_view(instance: &InstanceRecord) -> Result<Map<String, Value>, HttpError> {
    let server = Server {
        id: instance.uuid.clone(),
        name: instance.display_name.clone(),
        status: ServerStatus::from_vm_state(&instance.vm_state),
        tenant_id: instance.project_id.clone(),
        user_id: instance.user_id.clone(),
        created: instance.created_at.clone(),
        updated: instance.updated_at.clone(),
    };
    match serde_json::to_value(server) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(HttpError::for_internal_error(
            "server view is not an object".to_string(),
        )),
        Err(e) => Err(HttpError::for_internal_error(format!(
            "Failed to serialize server: {}",
            e
        ))),
    }
}

/// Map an extension failure onto an HTTP error
pub fn to_http_error(err: ExtensionError) -> HttpError {
    match err {
        ExtensionError::InstanceNotFound(id) => {
            HttpError::for_not_found(None, format!("Instance {} could not be found.", id))
        }
        ExtensionError::Authorization { .. } => HttpError::for_client_error(
            None,
            ClientErrorStatusCode::FORBIDDEN,
            err.to_string(),
        ),
        other => HttpError::for_internal_error(other.to_string()),
    }
}

fn extension_info(descriptor: &ExtensionDescriptor) -> ExtensionInfo {
    ExtensionInfo {
        name: descriptor.name.clone(),
        alias: descriptor.alias.clone(),
        namespace: descriptor.namespace.clone(),
        version: descriptor.version,
        description: descriptor.description.clone(),
    }
}

impl ComputeApi for ComputeServiceImpl {
    type Context = ApiContext;

    async fn ping(
        _rqctx: RequestContext<Self::Context>,
    ) -> Result<HttpResponseOk<PingResponse>, HttpError> {
        Ok(HttpResponseOk(PingResponse {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }))
    }

    async fn get_server(
        rqctx: RequestContext<Self::Context>,
        path: Path<ServerPath>,
    ) -> Result<Response<Body>, HttpError> {
        let api = rqctx.context();
        let headers = rqctx.request.headers();
        let ctx = caller_context(headers)?;
        let format = ResponseFormat::from_headers(headers);
        let server_id = path.into_inner().server_id;

        tracing::debug!(
            request_id = %ctx.request_id,
            server_id = %server_id,
            "Show server"
        );

        let instance = api
            .store()
            .find_instance(&ctx, &server_id)
            .map_err(to_http_error)?;
        let mut resp = ResponseObject::single(SERVER, server_view(&instance)?);

        let mut req = ExtensionRequest::new(&ctx, api.store());
        req.cache_instances([instance]);
        api.dispatcher()
            .single(SERVERS, &req, &mut resp, &server_id)
            .await
            .map_err(|e| {
                tracing::error!(
                    request_id = %ctx.request_id,
                    server_id = %server_id,
                    error = %e,
                    "Extension failed on show"
                );
                to_http_error(e)
            })?;

        render::respond(resp, format, render::server_template())
    }

    async fn list_servers(
        rqctx: RequestContext<Self::Context>,
    ) -> Result<Response<Body>, HttpError> {
        let api = rqctx.context();
        let headers = rqctx.request.headers();
        let ctx = caller_context(headers)?;
        let format = ResponseFormat::from_headers(headers);

        let instances = api.store().list_instances(&ctx);
        tracing::debug!(
            request_id = %ctx.request_id,
            count = instances.len(),
            "List servers"
        );

        let views = instances
            .iter()
            .map(server_view)
            .collect::<Result<Vec<_>, _>>()?;
        let mut resp = ResponseObject::list(SERVERS, views);

        let mut req = ExtensionRequest::new(&ctx, api.store());
        req.cache_instances(instances);
        api.dispatcher()
            .list(SERVERS, &req, &mut resp)
            .await
            .map_err(|e| {
                tracing::error!(
                    request_id = %ctx.request_id,
                    error = %e,
                    "Extension failed on list"
                );
                to_http_error(e)
            })?;

        render::respond(resp, format, render::servers_template())
    }

    async fn list_extensions(
        rqctx: RequestContext<Self::Context>,
    ) -> Result<HttpResponseOk<ExtensionList>, HttpError> {
        let api = rqctx.context();
        caller_context(rqctx.request.headers())?;
        Ok(HttpResponseOk(ExtensionList {
            extensions: api.registry().descriptors().map(extension_info).collect(),
        }))
    }

    async fn get_extension(
        rqctx: RequestContext<Self::Context>,
        path: Path<ExtensionPath>,
    ) -> Result<HttpResponseOk<ExtensionInfo>, HttpError> {
        let api = rqctx.context();
        caller_context(rqctx.request.headers())?;
        let alias = path.into_inner().alias;
        api.registry()
            .get(&alias)
            .map(|d| HttpResponseOk(extension_info(d)))
            .ok_or_else(|| HttpError::for_not_found(None, format!("Extension {} not found", alias)))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use compute_extensions::PolicyError;
    use http::HeaderValue;
    use http::StatusCode;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in pairs {
            headers.insert(*name, HeaderValue::from_str(value).unwrap());
        }
        headers
    }

    #[test]
    fn test_caller_context_from_headers() {
        let ctx = caller_context(&headers(&[
            (USER_ID_HEADER, "alice"),
            (PROJECT_ID_HEADER, "project-a"),
            (ROLES_HEADER, "member, admin"),
        ]))
        .unwrap();
        assert_eq!(ctx.user_id, "alice");
        assert_eq!(ctx.project_id, "project-a");
        assert_eq!(ctx.roles, vec!["member", "admin"]);
        assert!(ctx.is_admin);
    }

    #[test]
    fn test_caller_context_requires_identity() {
        let err = caller_context(&headers(&[(USER_ID_HEADER, "alice")])).unwrap_err();
        assert_eq!(err.status_code.as_u16(), StatusCode::UNAUTHORIZED.as_u16());

        let err = caller_context(&headers(&[
            (USER_ID_HEADER, " "),
            (PROJECT_ID_HEADER, "project-a"),
        ]))
        .unwrap_err();
        assert_eq!(err.status_code.as_u16(), StatusCode::UNAUTHORIZED.as_u16());
    }

    #[test]
    fn test_server_view() {
        let instance: InstanceRecord = serde_json::from_value(json!({
            "uuid": "s-1",
            "display_name": "web",
            "project_id": "project-a",
            "user_id": "alice",
            "vm_state": "stopped",
            "host": "cn-1",
        }))
        .unwrap();
        assert_eq!(
            Value::Object(server_view(&instance).unwrap()),
            json!({
                "id": "s-1",
                "name": "web",
                "status": "SHUTOFF",
                "tenant_id": "project-a",
                "user_id": "alice",
                "created": null,
                "updated": null,
            })
        );
    }

    #[test]
    fn test_error_mapping() {
        let err = to_http_error(ExtensionError::InstanceNotFound("s-1".to_string()));
        assert_eq!(err.status_code.as_u16(), 404);

        let err = to_http_error(ExtensionError::Authorization {
            action: "compute_extension:v3:os-x".to_string(),
            source: PolicyError::RecursionLimit("loop".to_string()),
        });
        assert_eq!(err.status_code.as_u16(), 403);

        let err = to_http_error(ExtensionError::InstanceLookup("db down".to_string()));
        assert_eq!(err.status_code.as_u16(), 500);
    }
}
