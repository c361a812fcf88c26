// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Wire-format negotiation and serialization of decorated representations

use compute_extensions::{MasterTemplate, ResponseObject, TemplateElement, TemplateError};
use dropshot::{Body, HttpError};
use http::header::{ACCEPT, CONTENT_TYPE};
use http::{HeaderMap, Response, StatusCode};

/// Default XML namespace of compute API documents
pub const XMLNS_V11: &str = "http://docs.openstack.org/compute/api/v1.1";

/// Version of the base server templates
const SERVER_TEMPLATE_VERSION: u32 = 1;

const SERVER_ATTRIBUTES: &[&str] = &["id", "name", "status", "tenant_id", "user_id", "created", "updated"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResponseFormat {
    Json,
    Xml,
}

impl ResponseFormat {
    /// Pick a format from the `Accept` header
    ///
    /// The first recognised media type wins; quality values are ignored.
    /// Anything unrecognised, or no header, means JSON.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let Some(accept) = headers.get(ACCEPT).and_then(|v| v.to_str().ok()) else {
            return ResponseFormat::Json;
        };
        for media in accept.split(',') {
            let media = media.split(';').next().unwrap_or("").trim();
            match media.to_ascii_lowercase().as_str() {
                "application/json" => return ResponseFormat::Json,
                "application/xml" | "text/xml" => return ResponseFormat::Xml,
                _ => {}
            }
        }
        ResponseFormat::Json
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ResponseFormat::Json => "application/json",
            ResponseFormat::Xml => "application/xml",
        }
    }
}

fn server_element() -> TemplateElement {
    SERVER_ATTRIBUTES
        .iter()
        .fold(TemplateElement::new("server"), |elem, attr| elem.attribute(attr))
}

/// Master template for a single `<server>` document
pub fn server_template() -> MasterTemplate {
    MasterTemplate::new(
        server_element().selector("server"),
        SERVER_TEMPLATE_VERSION,
        Some(XMLNS_V11.to_string()),
    )
}

/// Master template for a `<servers>` document
pub fn servers_template() -> MasterTemplate {
    let mut root = TemplateElement::new("servers");
    root.sub_element(server_element().selector("servers"));
    MasterTemplate::new(root, SERVER_TEMPLATE_VERSION, Some(XMLNS_V11.to_string()))
}

/// Merge the extension templates attached to `resp` into `master` and render
pub fn render_xml(resp: &ResponseObject, mut master: MasterTemplate) -> Result<String, TemplateError> {
    for template in resp.templates() {
        master.attach(template)?;
    }
    master.render(resp.body())
}

/// Serialize `resp` in the negotiated format
pub fn respond(
    resp: ResponseObject,
    format: ResponseFormat,
    master: MasterTemplate,
) -> Result<Response<Body>, HttpError> {
    let text = match format {
        ResponseFormat::Json => serde_json::to_string(resp.body())
            .map_err(|e| HttpError::for_internal_error(format!("Failed to serialize JSON: {}", e)))?,
        ResponseFormat::Xml => render_xml(&resp, master)
            .map_err(|e| HttpError::for_internal_error(format!("Failed to render XML: {}", e)))?,
    };

    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, format.content_type())
        .body(Body::from(text))
        .map_err(|e| HttpError::for_internal_error(format!("Failed to build response: {}", e)))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use http::HeaderValue;
    use pretty_assertions::assert_eq;
    use serde_json::{Map, json};

    fn accept(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_format_negotiation() {
        assert_eq!(ResponseFormat::from_headers(&HeaderMap::new()), ResponseFormat::Json);
        assert_eq!(ResponseFormat::from_headers(&accept("application/xml")), ResponseFormat::Xml);
        assert_eq!(ResponseFormat::from_headers(&accept("text/xml; charset=utf-8")), ResponseFormat::Xml);
        assert_eq!(
            ResponseFormat::from_headers(&accept("text/html, application/xml;q=0.9")),
            ResponseFormat::Xml
        );
        assert_eq!(
            ResponseFormat::from_headers(&accept("application/json, application/xml")),
            ResponseFormat::Json
        );
        assert_eq!(ResponseFormat::from_headers(&accept("*/*")), ResponseFormat::Json);
    }

    #[test]
    fn test_render_base_server() {
        let mut server = Map::new();
        server.insert("id".to_string(), json!("s-1"));
        server.insert("name".to_string(), json!("web"));
        server.insert("status".to_string(), json!("ACTIVE"));
        let resp = ResponseObject::single("server", server);
        assert_eq!(
            render_xml(&resp, server_template()).unwrap(),
            "<?xml version='1.0' encoding='UTF-8'?>\n\
             <server xmlns=\"http://docs.openstack.org/compute/api/v1.1\" \
             id=\"s-1\" name=\"web\" status=\"ACTIVE\"/>"
        );
    }

    #[test]
    fn test_render_empty_list() {
        let resp = ResponseObject::list("servers", vec![]);
        assert_eq!(
            render_xml(&resp, servers_template()).unwrap(),
            "<?xml version='1.0' encoding='UTF-8'?>\n\
             <servers xmlns=\"http://docs.openstack.org/compute/api/v1.1\"/>"
        );
    }
}
