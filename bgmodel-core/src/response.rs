//! XML response decoding.
//!
//! The service answers with a small XML document. It is parsed into an
//! element tree, written back out as canonical XML, and then folded into an
//! ordered key/value tree ([`XmlValue`]) where attributes live under `@name`
//! keys, mixed-content text under `#text`, and repeated siblings become a list.

use regex::Regex;
use serde::{Serialize, Serializer, ser::SerializeMap, ser::SerializeSeq};
use std::sync::LazyLock;
use xmltree::{Element, XMLNode};

use crate::error::FetchError;

/// Leading decimal number of a statistics field, e.g. `12.5` in `"12.5 (MJy/sr)"`.
static NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d*\.?\d+").expect("number pattern is valid")
});

/// Status value the service reports for a successful query.
pub const STATUS_OK: &str = "ok";

#[derive(Debug, Clone, PartialEq)]
pub enum XmlValue {
    /// Empty element.
    Null,
    Text(String),
    /// Ordered keys, in document order.
    Map(Vec<(String, XmlValue)>),
    List(Vec<XmlValue>),
}

impl XmlValue {
    pub fn get(&self, key: &str) -> Option<&XmlValue> {
        match self {
            XmlValue::Map(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Follow a chain of keys through nested maps.
    pub fn path(&self, keys: &[&str]) -> Option<&XmlValue> {
        keys.iter().try_fold(self, |node, key| node.get(key))
    }

    /// Text content, either a plain text node or the `#text` of a mixed element.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            XmlValue::Text(s) => Some(s.as_str()),
            XmlValue::Map(_) => self.get("#text").and_then(XmlValue::as_text),
            _ => None,
        }
    }

    fn from_element(element: &Element) -> XmlValue {
        let mut entries: Vec<(String, XmlValue)> = Vec::new();

        // xmltree keeps attributes unordered; sort them so output is stable.
        let mut attributes: Vec<_> = element.attributes.iter().collect();
        attributes.sort();
        for (name, value) in attributes {
            entries.push((format!("@{name}"), XmlValue::Text(value.clone())));
        }

        let mut text = String::new();
        for child in &element.children {
            match child {
                XMLNode::Element(el) => {
                    let name = qualified_name(el);
                    let value = XmlValue::from_element(el);
                    match entries.iter_mut().find(|(k, _)| *k == name) {
                        Some((_, XmlValue::List(items))) => items.push(value),
                        Some((_, existing)) => {
                            let first = std::mem::replace(existing, XmlValue::Null);
                            *existing = XmlValue::List(vec![first, value]);
                        }
                        None => entries.push((name, value)),
                    }
                }
                XMLNode::Text(t) | XMLNode::CData(t) => text.push_str(t),
                _ => {}
            }
        }

        let text = text.trim();
        match (entries.is_empty(), text.is_empty()) {
            (true, true) => XmlValue::Null,
            (true, false) => XmlValue::Text(text.to_string()),
            (false, true) => XmlValue::Map(entries),
            (false, false) => {
                entries.push(("#text".to_string(), XmlValue::Text(text.to_string())));
                XmlValue::Map(entries)
            }
        }
    }
}

impl Serialize for XmlValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            XmlValue::Null => serializer.serialize_none(),
            XmlValue::Text(s) => serializer.serialize_str(s),
            XmlValue::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            XmlValue::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}

fn qualified_name(element: &Element) -> String {
    match &element.prefix {
        Some(prefix) => format!("{prefix}:{}", element.name),
        None => element.name.clone(),
    }
}

/// Parsed service reply.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceResponse {
    tree: XmlValue,
    canonical_xml: String,
}

impl ServiceResponse {
    pub fn parse(body: &str) -> Result<Self, FetchError> {
        let element = Element::parse(body.as_bytes()).map_err(|e| FetchError::Xml(e.to_string()))?;

        let mut buf = Vec::new();
        element.write(&mut buf).map_err(|e| FetchError::Xml(e.to_string()))?;
        let canonical_xml = String::from_utf8(buf).map_err(|e| FetchError::Xml(e.to_string()))?;

        let reparsed =
            Element::parse(canonical_xml.as_bytes()).map_err(|e| FetchError::Xml(e.to_string()))?;

        let tree =
            XmlValue::Map(vec![(qualified_name(&reparsed), XmlValue::from_element(&reparsed))]);

        Ok(Self { tree, canonical_xml })
    }

    /// Root mapping: `{ "results": { "@status": ..., "result": ... } }`.
    pub fn tree(&self) -> &XmlValue {
        &self.tree
    }

    pub fn canonical_xml(&self) -> &str {
        &self.canonical_xml
    }

    /// `results/@status`, if the service sent one.
    pub fn status(&self) -> Option<&str> {
        self.tree.path(&["results", "@status"]).and_then(XmlValue::as_text)
    }

    /// `results/message`, which the service fills in on errors.
    pub fn message(&self) -> Option<&str> {
        self.tree.path(&["results", "message"]).and_then(XmlValue::as_text)
    }

    pub fn is_ok(&self) -> bool {
        self.status().is_some_and(|s| s.eq_ignore_ascii_case(STATUS_OK))
    }

    /// Fails with [`FetchError::StatusNotOk`] unless the service reported success.
    pub fn ensure_ok(&self) -> Result<(), FetchError> {
        match self.status() {
            None => Err(FetchError::MissingField("results/@status".to_string())),
            Some(_) if self.is_ok() => Ok(()),
            Some(status) => Err(FetchError::StatusNotOk {
                status: status.to_string(),
                message: self.message().map(str::to_string),
            }),
        }
    }

    /// Numeric value of `results/result/statistics/<field>`.
    pub fn statistic(&self, field: &str) -> Result<f64, FetchError> {
        let missing = || FetchError::MissingField(format!("results/result/statistics/{field}"));
        let value = self
            .tree
            .path(&["results", "result", "statistics", field])
            .ok_or_else(missing)?;

        // `<zody/>` is present but empty.
        let text = match value {
            XmlValue::Null => "",
            other => other.as_text().ok_or_else(missing)?,
        };

        extract_number(field, text)
    }
}

/// First decimal number in `text`, matched by `\d*\.?\d+`.
pub fn extract_number(field: &str, text: &str) -> Result<f64, FetchError> {
    let matched = NUMBER.find(text).ok_or_else(|| FetchError::NoNumber {
        field: field.to_string(),
        text: text.to_string(),
    })?;

    matched.as_str().parse::<f64>().map_err(|_| FetchError::InvalidNumber {
        field: field.to_string(),
        text: text.to_string(),
    })
}
