// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! XML serialization templates
//!
//! The base controller owns a [`MasterTemplate`] describing how its
//! representation maps onto XML. Extensions contribute [`SlaveTemplate`]s
//! that add attributes (in their own namespace) to elements of the master.
//! Slaves are merged in attachment order before rendering.
//!
//! Elements select their data with a key into the current datum. A selected
//! array repeats the element once per item; a missing or null selection
//! omits the element. Attributes mirror a key of the element's datum: a
//! missing key omits the attribute, a null value renders it empty.

use std::collections::BTreeMap;
use std::fmt::Write;

use serde_json::Value;

use crate::error::TemplateError;

const XML_DECLARATION: &str = "<?xml version='1.0' encoding='UTF-8'?>\n";

/// Attribute or element name, optionally bound to a namespace URI
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QualifiedName {
    pub namespace: Option<String>,
    pub local: String,
}

impl QualifiedName {
    pub fn local(name: impl Into<String>) -> Self {
        Self {
            namespace: None,
            local: name.into(),
        }
    }

    pub fn namespaced(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            local: name.into(),
        }
    }
}

/// Attribute whose value mirrors one key of the element's datum
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TemplateAttribute {
    pub name: QualifiedName,
    pub key: String,
}

/// One element of a template tree
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TemplateElement {
    tag: String,
    selector: Option<String>,
    attributes: Vec<TemplateAttribute>,
    children: Vec<TemplateElement>,
}

impl TemplateElement {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            selector: None,
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Select `datum[key]` as this element's data
    pub fn selector(mut self, key: impl Into<String>) -> Self {
        self.selector = Some(key.into());
        self
    }

    /// Add an attribute mirroring `key`; replaces an attribute of the same name
    pub fn set(&mut self, name: QualifiedName, key: impl Into<String>) {
        let key = key.into();
        match self.attributes.iter_mut().find(|a| a.name == name) {
            Some(existing) => existing.key = key,
            None => self.attributes.push(TemplateAttribute { name, key }),
        }
    }

    /// Builder form of [`TemplateElement::set`] for unqualified attributes
    pub fn attribute(mut self, name: &str) -> Self {
        self.set(QualifiedName::local(name), name);
        self
    }

    /// Append a child element and return it for further construction
    pub fn sub_element(&mut self, child: TemplateElement) -> &mut TemplateElement {
        self.children.push(child);
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attributes(&self) -> &[TemplateAttribute] {
        &self.attributes
    }

    pub fn children(&self) -> &[TemplateElement] {
        &self.children
    }

    fn merge(&mut self, other: &TemplateElement) {
        if self.selector.is_none() {
            self.selector.clone_from(&other.selector);
        }
        for attr in &other.attributes {
            self.set(attr.name.clone(), attr.key.clone());
        }
        for child in &other.children {
            match self.children.iter_mut().find(|c| c.tag == child.tag) {
                Some(existing) => existing.merge(child),
                None => self.children.push(child.clone()),
            }
        }
    }
}

/// Template contributed by an extension
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlaveTemplate {
    root: TemplateElement,
    min_version: u32,
    nsmap: BTreeMap<String, String>,
}

impl SlaveTemplate {
    /// `min_version` is the lowest master version this slave applies to
    pub fn new(root: TemplateElement, min_version: u32, nsmap: BTreeMap<String, String>) -> Self {
        Self {
            root,
            min_version,
            nsmap,
        }
    }

    pub fn root(&self) -> &TemplateElement {
        &self.root
    }

    /// Prefix to namespace URI declarations
    pub fn nsmap(&self) -> &BTreeMap<String, String> {
        &self.nsmap
    }

    pub fn min_version(&self) -> u32 {
        self.min_version
    }
}

/// Template owned by the base controller
#[derive(Clone, Debug)]
pub struct MasterTemplate {
    root: TemplateElement,
    version: u32,
    default_namespace: Option<String>,
    nsmap: BTreeMap<String, String>,
}

impl MasterTemplate {
    pub fn new(root: TemplateElement, version: u32, default_namespace: Option<String>) -> Self {
        Self {
            root,
            version,
            default_namespace,
            nsmap: BTreeMap::new(),
        }
    }

    /// Merge a slave template
    ///
    /// Returns `Ok(false)` without changes when the slave requires a newer
    /// master version. Fails when the roots differ or a prefix would be
    /// bound to two different namespaces.
    pub fn attach(&mut self, slave: &SlaveTemplate) -> Result<bool, TemplateError> {
        if slave.min_version > self.version {
            return Ok(false);
        }
        if slave.root.tag != self.root.tag {
            return Err(TemplateError::RootMismatch {
                master: self.root.tag.clone(),
                slave: slave.root.tag.clone(),
            });
        }
        for (prefix, uri) in &slave.nsmap {
            if let Some(existing) = self.nsmap.get(prefix) {
                if existing != uri {
                    return Err(TemplateError::NamespaceCollision {
                        prefix: prefix.clone(),
                        existing: existing.clone(),
                        conflicting: uri.clone(),
                    });
                }
            }
        }
        self.nsmap
            .extend(slave.nsmap.iter().map(|(p, u)| (p.clone(), u.clone())));
        self.root.merge(&slave.root);
        Ok(true)
    }

    /// Render `data` as an XML document
    pub fn render(&self, data: &Value) -> Result<String, TemplateError> {
        let mut out = String::from(XML_DECLARATION);
        let datum = match &self.root.selector {
            Some(key) => match data.get(key) {
                Some(Value::Null) | None => {
                    return Err(TemplateError::Render {
                        element: self.root.tag.clone(),
                        reason: format!("no data under '{}'", key),
                    });
                }
                Some(Value::Array(_)) => {
                    return Err(TemplateError::Render {
                        element: self.root.tag.clone(),
                        reason: "root element cannot repeat".to_string(),
                    });
                }
                Some(selected) => selected,
            },
            None => data,
        };

        let mut declarations = String::new();
        if let Some(ns) = &self.default_namespace {
            write_attr(&mut declarations, &self.root.tag, "xmlns", ns)?;
        }
        for (prefix, uri) in &self.nsmap {
            write_attr(
                &mut declarations,
                &self.root.tag,
                &format!("xmlns:{}", prefix),
                uri,
            )?;
        }
        self.write_element(&mut out, &self.root, datum, &declarations)?;
        Ok(out)
    }

    fn write_element(
        &self,
        out: &mut String,
        elem: &TemplateElement,
        datum: &Value,
        extra: &str,
    ) -> Result<(), TemplateError> {
        out.push('<');
        out.push_str(&elem.tag);
        out.push_str(extra);
        for attr in &elem.attributes {
            let Some(value) = datum.get(&attr.key) else {
                continue;
            };
            let text = match value {
                Value::Null => String::new(),
                Value::String(s) => s.clone(),
                Value::Bool(_) | Value::Number(_) => value.to_string(),
                Value::Array(_) | Value::Object(_) => {
                    return Err(TemplateError::Render {
                        element: elem.tag.clone(),
                        reason: format!("attribute '{}' is not a scalar", attr.key),
                    });
                }
            };
            let name = self.attribute_name(&attr.name)?;
            write_attr(out, &elem.tag, &name, &text)?;
        }

        let mut body = String::new();
        for child in &elem.children {
            match &child.selector {
                None => self.write_element(&mut body, child, datum, "")?,
                Some(key) => match datum.get(key) {
                    Some(Value::Null) | None => {}
                    Some(Value::Array(items)) => {
                        for item in items {
                            self.write_element(&mut body, child, item, "")?;
                        }
                    }
                    Some(selected) => self.write_element(&mut body, child, selected, "")?,
                },
            }
        }

        if body.is_empty() {
            out.push_str("/>");
        } else {
            out.push('>');
            out.push_str(&body);
            // Infallible for String
            let _ = write!(out, "</{}>", elem.tag);
        }
        Ok(())
    }

    fn attribute_name(&self, name: &QualifiedName) -> Result<String, TemplateError> {
        let Some(uri) = &name.namespace else {
            return Ok(name.local.clone());
        };
        self.nsmap
            .iter()
            .find(|(_, u)| *u == uri)
            .map(|(prefix, _)| format!("{}:{}", prefix, name.local))
            .ok_or_else(|| TemplateError::UndeclaredNamespace(uri.clone()))
    }
}

/// Characters allowed by the XML 1.0 `Char` production
fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}')
}

/// Append ` name="value"` with the value escaped
///
/// Whitespace other than a space is written as a character reference so
/// attribute-value normalization does not turn it into a space.
fn write_attr(out: &mut String, element: &str, name: &str, value: &str) -> Result<(), TemplateError> {
    if let Some(c) = value.chars().find(|c| !is_xml_char(*c)) {
        return Err(TemplateError::Render {
            element: element.to_string(),
            reason: format!(
                "attribute '{}' contains character U+{:04X} not allowed in XML",
                name, c as u32
            ),
        });
    }
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\n' => out.push_str("&#10;"),
            '\t' => out.push_str("&#9;"),
            '\r' => out.push_str("&#13;"),
            _ => out.push(c),
        }
    }
    out.push('"');
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const NS: &str = "http://example.com/ext/v1";

    fn server_master() -> MasterTemplate {
        let root = TemplateElement::new("server")
            .selector("server")
            .attribute("id")
            .attribute("name");
        MasterTemplate::new(root, 1, Some("http://example.com/api".to_string()))
    }

    fn servers_master() -> MasterTemplate {
        let mut root = TemplateElement::new("servers");
        root.sub_element(
            TemplateElement::new("server")
                .selector("servers")
                .attribute("id"),
        );
        MasterTemplate::new(root, 1, None)
    }

    fn ext_slave(root_tag: &str, list: bool) -> SlaveTemplate {
        let mut nsmap = BTreeMap::new();
        nsmap.insert("ext".to_string(), NS.to_string());
        let mut server = TemplateElement::new("server");
        server.set(QualifiedName::namespaced(NS, "color"), "ext:color");
        let root = if list {
            let mut root = TemplateElement::new(root_tag);
            root.sub_element(server.selector("servers"));
            root
        } else {
            server.selector("server")
        };
        SlaveTemplate::new(root, 1, nsmap)
    }

    #[test]
    fn test_render_single_with_slave() {
        let mut master = server_master();
        assert!(master.attach(&ext_slave("server", false)).unwrap());
        let data = json!({"server": {"id": "a&b", "name": "web", "ext:color": "blue"}});
        assert_eq!(
            master.render(&data).unwrap(),
            "<?xml version='1.0' encoding='UTF-8'?>\n\
             <server xmlns=\"http://example.com/api\" xmlns:ext=\"http://example.com/ext/v1\" \
             id=\"a&amp;b\" name=\"web\" ext:color=\"blue\"/>"
        );
    }

    #[test]
    fn test_render_list_repeats_children_in_order() {
        let mut master = servers_master();
        master.attach(&ext_slave("servers", true)).unwrap();
        let data = json!({"servers": [
            {"id": "1", "ext:color": "red"},
            {"id": "2", "ext:color": null},
            {"id": "3"},
        ]});
        assert_eq!(
            master.render(&data).unwrap(),
            "<?xml version='1.0' encoding='UTF-8'?>\n\
             <servers xmlns:ext=\"http://example.com/ext/v1\">\
             <server id=\"1\" ext:color=\"red\"/><server id=\"2\" ext:color=\"\"/><server id=\"3\"/>\
             </servers>"
        );
    }

    #[test]
    fn test_empty_list_renders_empty_root() {
        let master = servers_master();
        assert_eq!(
            master.render(&json!({"servers": []})).unwrap(),
            "<?xml version='1.0' encoding='UTF-8'?>\n<servers/>"
        );
    }

    #[test]
    fn test_root_mismatch() {
        let mut master = server_master();
        let err = master.attach(&ext_slave("servers", true)).unwrap_err();
        assert!(matches!(err, TemplateError::RootMismatch { .. }));
    }

    #[test]
    fn test_namespace_collision() {
        let mut master = server_master();
        master.attach(&ext_slave("server", false)).unwrap();

        let mut nsmap = BTreeMap::new();
        nsmap.insert("ext".to_string(), "http://other.example.com/".to_string());
        let other = SlaveTemplate::new(TemplateElement::new("server"), 1, nsmap);
        let err = master.attach(&other).unwrap_err();
        assert!(matches!(err, TemplateError::NamespaceCollision { .. }));

        // Same mapping twice is fine
        assert!(master.attach(&ext_slave("server", false)).unwrap());
    }

    #[test]
    fn test_version_gating() {
        let mut master = server_master();
        let mut nsmap = BTreeMap::new();
        nsmap.insert("ext".to_string(), NS.to_string());
        let newer = SlaveTemplate::new(TemplateElement::new("server"), 2, nsmap);
        assert!(!master.attach(&newer).unwrap());
        let out = master.render(&json!({"server": {"id": "1"}})).unwrap();
        assert!(!out.contains("xmlns:ext"));
    }

    #[test]
    fn test_whitespace_escaped_as_character_references() {
        let master = server_master();
        let out = master
            .render(&json!({"server": {"name": "web\n1\ttab\r"}}))
            .unwrap();
        assert!(out.ends_with("name=\"web&#10;1&#9;tab&#13;\"/>"));
    }

    #[test]
    fn test_disallowed_characters_rejected() {
        let master = server_master();
        for bad in ["web\u{1}", "nul\u{0}", "esc\u{1b}", "nonchar\u{FFFE}"] {
            let err = master
                .render(&json!({"server": {"id": "1", "name": bad}}))
                .unwrap_err();
            assert!(
                matches!(err, TemplateError::Render { ref element, .. } if element == "server"),
                "expected {:?} to be rejected, got {:?}",
                bad,
                err
            );
        }
    }

    #[test]
    fn test_null_renders_empty_missing_omits() {
        let mut master = server_master();
        master.attach(&ext_slave("server", false)).unwrap();
        let out = master
            .render(&json!({"server": {"id": "1", "ext:color": null}}))
            .unwrap();
        assert!(out.contains("id=\"1\" ext:color=\"\"/>"));
        assert!(!out.contains("name="));
    }

    #[test]
    fn test_undeclared_namespace() {
        let mut root = TemplateElement::new("server").selector("server");
        root.set(QualifiedName::namespaced(NS, "color"), "color");
        let master = MasterTemplate::new(root, 1, None);
        let err = master
            .render(&json!({"server": {"color": "x"}}))
            .unwrap_err();
        assert_eq!(err, TemplateError::UndeclaredNamespace(NS.to_string()));
    }

    #[test]
    fn test_missing_root_data() {
        let master = server_master();
        assert!(matches!(
            master.render(&json!({"servers": []})),
            Err(TemplateError::Render { .. })
        ));
    }
}
