// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Response representations that extensions decorate in place

use serde_json::{Map, Value};

use crate::error::ExtensionError;
use crate::xml::SlaveTemplate;

/// Key an extension uses for one of its fields: `<alias>:<field>`
pub fn namespaced_key(alias: &str, field: &str) -> String {
    format!("{}:{}", alias, field)
}

/// A base representation on its way to the client
///
/// The body is either `{"<member>": {...}}` for a single resource or
/// `{"<collection>": [{...}, ...]}` for a list. Extensions attach XML
/// templates keyed by their alias; attaching again under the same alias
/// replaces the earlier template.
#[derive(Clone, Debug)]
pub struct ResponseObject {
    body: Value,
    templates: Vec<(String, SlaveTemplate)>,
}

impl ResponseObject {
    pub fn single(member: &str, item: Map<String, Value>) -> Self {
        let mut body = Map::new();
        body.insert(member.to_string(), Value::Object(item));
        Self {
            body: Value::Object(body),
            templates: Vec::new(),
        }
    }

    pub fn list(collection: &str, items: Vec<Map<String, Value>>) -> Self {
        let mut body = Map::new();
        body.insert(
            collection.to_string(),
            Value::Array(items.into_iter().map(Value::Object).collect()),
        );
        Self {
            body: Value::Object(body),
            templates: Vec::new(),
        }
    }

    pub fn body(&self) -> &Value {
        &self.body
    }

    pub fn into_body(self) -> Value {
        self.body
    }

    /// The single resource stored under `member`
    pub fn member_mut(&mut self, member: &str) -> Result<&mut Map<String, Value>, ExtensionError> {
        match self.body.get_mut(member) {
            Some(Value::Object(map)) => Ok(map),
            _ => Err(ExtensionError::MalformedRepresentation(format!(
                "expected object under '{}'",
                member
            ))),
        }
    }

    /// The item list stored under `collection`
    pub fn collection_mut(&mut self, collection: &str) -> Result<&mut Vec<Value>, ExtensionError> {
        match self.body.get_mut(collection) {
            Some(Value::Array(items)) => Ok(items),
            _ => Err(ExtensionError::MalformedRepresentation(format!(
                "expected array under '{}'",
                collection
            ))),
        }
    }

    pub fn attach(&mut self, alias: &str, template: SlaveTemplate) {
        match self.templates.iter_mut().find(|(a, _)| a == alias) {
            Some((_, existing)) => *existing = template,
            None => self.templates.push((alias.to_string(), template)),
        }
    }

    /// Template attached by the extension with this alias
    pub fn template(&self, alias: &str) -> Option<&SlaveTemplate> {
        self.templates
            .iter()
            .find(|(a, _)| a == alias)
            .map(|(_, t)| t)
    }

    /// Attached templates in attachment order
    pub fn templates(&self) -> impl Iterator<Item = &SlaveTemplate> {
        self.templates.iter().map(|(_, t)| t)
    }
}

/// Write access to one extension's namespace within a representation
///
/// Every key written through this handle is prefixed with the alias, so an
/// extension cannot clobber base fields or another extension's fields.
pub struct NamespacedFields<'a> {
    alias: &'a str,
    map: &'a mut Map<String, Value>,
}

impl<'a> NamespacedFields<'a> {
    pub fn new(alias: &'a str, map: &'a mut Map<String, Value>) -> Self {
        Self { alias, map }
    }

    pub fn set(&mut self, field: &str, value: Value) {
        self.map.insert(namespaced_key(self.alias, field), value);
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.map.get(&namespaced_key(self.alias, field))
    }

    /// Read a base (unnamespaced) field such as `id`
    pub fn base(&self, key: &str) -> Option<&Value> {
        self.map.get(key)
    }
}
