//! Request payloads and their wire encodings.
//!
//! # Design
//! A payload is either a field mapping or a pre-encoded string, never both.
//! Field mappings are encoded on demand: as a query string for GET, and as
//! JSON or a form body otherwise. Query and form encoding follow PHP's
//! `http_build_query` rules (nested keys as `a[b]`, booleans as `1`/`0`,
//! nulls dropped, `*` escaped), which is what the API documents its
//! parameters against.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use serde_json::{Map, Value};
use url::form_urlencoded::Serializer;

use crate::error::{ApiError, Result};

/// Data carried by a request.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Fields(Map<String, Value>),
    /// Sent verbatim as the query string (GET) or body (everything else).
    Raw(String),
}

impl Default for Payload {
    fn default() -> Self {
        Payload::Fields(Map::new())
    }
}

impl Payload {
    pub fn from_map(map: Map<String, Value>) -> Self {
        Payload::Fields(map)
    }

    pub fn from_key_value(key: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut map = Map::new();
        map.insert(key.into(), value.into());
        Payload::Fields(map)
    }

    pub fn from_raw(raw: impl Into<String>) -> Self {
        Payload::Raw(raw.into())
    }

    /// Objects become fields, sequences become fields keyed by index, and
    /// any other value becomes a single field keyed `"0"`.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Payload::Fields(map),
            Value::Array(items) => Payload::Fields(
                items
                    .into_iter()
                    .enumerate()
                    .map(|(i, item)| (i.to_string(), item))
                    .collect(),
            ),
            Value::Null => Payload::default(),
            scalar => Payload::from_key_value("0", scalar),
        }
    }

    /// Any serializable value, shaped as in [`Payload::from_value`].
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        Ok(Self::from_value(serde_json::to_value(value)?))
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Payload::Fields(map) => map.is_empty(),
            Payload::Raw(raw) => raw.is_empty(),
        }
    }

    /// Query-string form without the leading `?`.
    pub fn to_query_string(&self) -> String {
        match self {
            Payload::Fields(map) => build_query(map),
            Payload::Raw(raw) => raw.clone(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        match self {
            Payload::Fields(map) => Ok(serde_json::to_string(map)?),
            Payload::Raw(raw) => Ok(raw.clone()),
        }
    }

    /// `application/x-www-form-urlencoded` body.
    pub fn to_form(&self) -> String {
        self.to_query_string()
    }
}

impl From<Map<String, Value>> for Payload {
    fn from(map: Map<String, Value>) -> Self {
        Payload::from_map(map)
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Payload::from_value(value)
    }
}

impl<K: Into<String>, V: Into<Value>> From<(K, V)> for Payload {
    fn from((key, value): (K, V)) -> Self {
        Payload::from_key_value(key, value)
    }
}

impl<K: Into<String>, V: Into<Value>> From<Vec<(K, V)>> for Payload {
    fn from(pairs: Vec<(K, V)>) -> Self {
        Payload::Fields(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// How a non-GET field payload is put on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PostEncoding {
    /// JSON document.
    #[default]
    Body,
    /// URL-encoded form.
    Form,
}

impl PostEncoding {
    pub fn content_type(self) -> &'static str {
        match self {
            PostEncoding::Body => "application/json",
            PostEncoding::Form => "application/x-www-form-urlencoded",
        }
    }
}

impl fmt::Display for PostEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostEncoding::Body => f.write_str("body"),
            PostEncoding::Form => f.write_str("form"),
        }
    }
}

impl FromStr for PostEncoding {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "body" | "json" => Ok(PostEncoding::Body),
            "form" | "form_params" => Ok(PostEncoding::Form),
            other => Err(ApiError::UnknownEncoding(other.to_string())),
        }
    }
}

fn build_query(map: &Map<String, Value>) -> String {
    let mut serializer = Serializer::new(String::new());
    for (key, value) in map {
        append_value(&mut serializer, key, value);
    }
    // form_urlencoded leaves `*` alone; http_build_query escapes it. Every
    // other byte that needs escaping is already `%XX`, so this is unambiguous.
    serializer.finish().replace('*', "%2A")
}

fn append_value(serializer: &mut Serializer<'_, String>, key: &str, value: &Value) {
    match value {
        Value::Null => {}
        Value::Bool(b) => {
            serializer.append_pair(key, if *b { "1" } else { "0" });
        }
        Value::Number(n) => {
            serializer.append_pair(key, &n.to_string());
        }
        Value::String(s) => {
            serializer.append_pair(key, s);
        }
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                append_value(serializer, &format!("{key}[{i}]"), item);
            }
        }
        Value::Object(fields) => {
            for (name, item) in fields {
                append_value(serializer, &format!("{key}[{name}]"), item);
            }
        }
    }
}
