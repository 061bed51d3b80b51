use std::collections::BTreeMap;
use std::fmt::{self, Write as _};
use std::ops::Index;

use serde::de::{Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};

use crate::{JsonError, JsonResult};

static INVALID: Json = Json::Invalid;

/// A schema-less JSON document.
///
/// Navigation never fails loudly: looking up a missing key, an out of range
/// index, or anything on a non-container yields [`Json::Invalid`], and every
/// lookup on `Invalid` yields `Invalid` again.
///
/// ```
/// use birdcall::Json;
///
/// let json = Json::parse(br#"{"errors":[{"code":34}]}"#).unwrap();
/// assert_eq!(json["errors"][0]["code"].as_i64(), Some(34));
/// assert!(json["missing"]["deeper"][3].is_invalid());
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Json {
    String(String),
    Number(f64),
    Object(BTreeMap<String, Json>),
    Array(Vec<Json>),
    Bool(bool),
    Null,
    #[default]
    Invalid,
}

impl Json {
    /// Parse a complete JSON document.
    pub fn parse(bytes: &[u8]) -> JsonResult<Json> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn parse_str(text: &str) -> JsonResult<Json> {
        Self::parse(text.as_bytes())
    }

    pub fn get(&self, key: &str) -> &Json {
        match self {
            Json::Object(map) => map.get(key).unwrap_or(&INVALID),
            _ => &INVALID,
        }
    }

    pub fn at(&self, index: usize) -> &Json {
        match self {
            Json::Array(items) => items.get(index).unwrap_or(&INVALID),
            _ => &INVALID,
        }
    }

    /// Walk a slash-separated path such as `"errors/0/code"`.
    ///
    /// Segments that parse as an integer index into arrays; on objects every
    /// segment is used as a key.
    pub fn path(&self, path: &str) -> &Json {
        path.split('/')
            .filter(|segment| !segment.is_empty())
            .fold(self, |current, segment| match current {
                Json::Array(_) => match segment.parse::<usize>() {
                    Ok(index) => current.at(index),
                    Err(_) => &INVALID,
                },
                _ => current.get(segment),
            })
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Json::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Json::Number(value) => Some(*value),
            _ => None,
        }
    }

    /// The number truncated towards zero.
    pub fn as_i64(&self) -> Option<i64> {
        self.as_f64().map(|value| value as i64)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Json::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&BTreeMap<String, Json>> {
        match self {
            Json::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Json]> {
        match self {
            Json::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Json::Null)
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, Json::Invalid)
    }

    /// Pretty-print with `indent` repeated once per nesting level.
    ///
    /// Fails if this value, or anything nested in it, is `Invalid`. Non-finite
    /// numbers are written as `null`.
    pub fn stringify(&self, indent: &str) -> JsonResult<String> {
        let mut out = String::new();
        self.write_pretty(&mut out, indent, 0)?;
        Ok(out)
    }

    fn write_pretty(&self, out: &mut String, indent: &str, level: usize) -> JsonResult<()> {
        match self {
            Json::Bool(value) => out.push_str(if *value { "true" } else { "false" }),
            Json::Number(value) => write_number(out, *value),
            Json::String(value) => write_string(out, value),
            Json::Null => out.push_str("null"),
            Json::Invalid => return Err(JsonError::InvalidValue),
            Json::Array(items) if items.is_empty() => out.push_str("[]"),
            Json::Object(map) if map.is_empty() => out.push_str("{}"),
            Json::Array(items) => {
                out.push_str("[\n");
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push_str(",\n");
                    }
                    push_indent(out, indent, level + 1);
                    item.write_pretty(out, indent, level + 1)?;
                }
                out.push('\n');
                push_indent(out, indent, level);
                out.push(']');
            }
            Json::Object(map) => {
                out.push_str("{\n");
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        out.push_str(",\n");
                    }
                    push_indent(out, indent, level + 1);
                    write_string(out, key);
                    out.push_str(" : ");
                    value.write_pretty(out, indent, level + 1)?;
                }
                out.push('\n');
                push_indent(out, indent, level);
                out.push('}');
            }
        }
        Ok(())
    }
}

fn push_indent(out: &mut String, indent: &str, level: usize) {
    for _ in 0..level {
        out.push_str(indent);
    }
}

/// Integral values that fit an `i64` are written as integers, everything else
/// in the shortest form that parses back to the same `f64`. JSON cannot spell
/// NaN or the infinities, so those are written as `null`.
fn write_number(out: &mut String, value: f64) {
    if value.fract() == 0.0 && value >= i64::MIN as f64 && value < i64::MAX as f64 {
        let _ = write!(out, "{}", value as i64);
        return;
    }
    match serde_json::Number::from_f64(value) {
        Some(number) => {
            let _ = write!(out, "{}", number);
        }
        None => out.push_str("null"),
    }
}

fn write_string(out: &mut String, value: &str) {
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0c}' => out.push_str("\\f"),
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

impl fmt::Display for Json {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.stringify("  ") {
            Ok(text) => f.write_str(&text),
            Err(_) => f.write_str("<INVALID JSON>"),
        }
    }
}

impl Index<&str> for Json {
    type Output = Json;

    fn index(&self, key: &str) -> &Json {
        self.get(key)
    }
}

impl Index<usize> for Json {
    type Output = Json;

    fn index(&self, index: usize) -> &Json {
        self.at(index)
    }
}

impl<'de> Deserialize<'de> for Json {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(JsonVisitor)
    }
}

struct JsonVisitor;

impl<'de> Visitor<'de> for JsonVisitor {
    type Value = Json;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("any valid JSON value")
    }

    fn visit_bool<E>(self, value: bool) -> Result<Json, E> {
        Ok(Json::Bool(value))
    }

    fn visit_i64<E>(self, value: i64) -> Result<Json, E> {
        Ok(Json::Number(value as f64))
    }

    fn visit_u64<E>(self, value: u64) -> Result<Json, E> {
        Ok(Json::Number(value as f64))
    }

    fn visit_f64<E>(self, value: f64) -> Result<Json, E> {
        Ok(Json::Number(value))
    }

    fn visit_str<E>(self, value: &str) -> Result<Json, E> {
        Ok(Json::String(value.to_owned()))
    }

    fn visit_string<E>(self, value: String) -> Result<Json, E> {
        Ok(Json::String(value))
    }

    fn visit_unit<E>(self) -> Result<Json, E> {
        Ok(Json::Null)
    }

    fn visit_none<E>(self) -> Result<Json, E> {
        Ok(Json::Null)
    }

    fn visit_some<D>(self, deserializer: D) -> Result<Json, D::Error>
    where
        D: Deserializer<'de>,
    {
        Deserialize::deserialize(deserializer)
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Json, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Json::Array(items))
    }

    fn visit_map<A>(self, mut map: A) -> Result<Json, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut object = BTreeMap::new();
        while let Some((key, value)) = map.next_entry::<String, Json>()? {
            object.insert(key, value);
        }
        Ok(Json::Object(object))
    }
}

impl From<&str> for Json {
    fn from(value: &str) -> Self {
        Json::String(value.to_owned())
    }
}

impl From<String> for Json {
    fn from(value: String) -> Self {
        Json::String(value)
    }
}

impl From<f64> for Json {
    fn from(value: f64) -> Self {
        Json::Number(value)
    }
}

impl From<i64> for Json {
    fn from(value: i64) -> Self {
        Json::Number(value as f64)
    }
}

impl From<i32> for Json {
    fn from(value: i32) -> Self {
        Json::Number(value.into())
    }
}

impl From<bool> for Json {
    fn from(value: bool) -> Self {
        Json::Bool(value)
    }
}

impl From<Vec<Json>> for Json {
    fn from(value: Vec<Json>) -> Self {
        Json::Array(value)
    }
}

impl From<BTreeMap<String, Json>> for Json {
    fn from(value: BTreeMap<String, Json>) -> Self {
        Json::Object(value)
    }
}

impl<T: Into<Json>> From<Option<T>> for Json {
    fn from(value: Option<T>) -> Self {
        value.map_or(Json::Null, Into::into)
    }
}

impl<K: Into<String>> FromIterator<(K, Json)> for Json {
    fn from_iter<I: IntoIterator<Item = (K, Json)>>(iter: I) -> Self {
        Json::Object(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl FromIterator<Json> for Json {
    fn from_iter<I: IntoIterator<Item = Json>>(iter: I) -> Self {
        Json::Array(iter.into_iter().collect())
    }
}
