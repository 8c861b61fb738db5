//! Dynamically-typed JSON values.
//!
//! [`JsonValue`] is the in-memory representation of an arbitrary JSON
//! document with no compile-time schema: a tagged variant over null-ness,
//! objects, arrays, strings, three number widths, and booleans. Objects keep
//! insertion order using a plain `Vec` of pairs rather than an ordered-map
//! dependency (the same trade-off the rest of this workspace makes).
//!
//! The active variant is the sole source of truth: scalar accessors fail
//! with [`JsonError::TypeMismatch`] instead of coercing, and numeric
//! widening is left to the object mapper. Serialization through
//! [`JsonValue::to_json`] is cached until the next mutation.

use crate::error::{JsonError, Result};
use crate::writer::JsonWriter;

/// The variant tag of a [`JsonValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JsonKind {
    /// No value yet. Upgraded in place by the first keyed or indexed write.
    None,
    Object,
    Array,
    String,
    Int,
    Long,
    Double,
    Boolean,
}

impl JsonKind {
    pub fn name(self) -> &'static str {
        match self {
            JsonKind::None => "none",
            JsonKind::Object => "object",
            JsonKind::Array => "array",
            JsonKind::String => "string",
            JsonKind::Int => "int",
            JsonKind::Long => "long",
            JsonKind::Double => "double",
            JsonKind::Boolean => "boolean",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
enum Repr {
    #[default]
    None,
    Object(Vec<(String, JsonValue)>),
    Array(Vec<JsonValue>),
    String(String),
    Int(i32),
    Long(i64),
    Double(f64),
    Boolean(bool),
}

impl Repr {
    fn default_for(kind: JsonKind) -> Repr {
        match kind {
            JsonKind::None => Repr::None,
            JsonKind::Object => Repr::Object(Vec::new()),
            JsonKind::Array => Repr::Array(Vec::new()),
            JsonKind::String => Repr::String(String::new()),
            JsonKind::Int => Repr::Int(0),
            JsonKind::Long => Repr::Long(0),
            JsonKind::Double => Repr::Double(0.0),
            JsonKind::Boolean => Repr::Boolean(false),
        }
    }
}

/// A mutable, dynamically-typed JSON value.
#[derive(Debug, Clone, Default)]
pub struct JsonValue {
    repr: Repr,
    /// Compact text cached by `to_json`, dropped on any mutation.
    cached: Option<String>,
}

/// Equality is variant-aware and ignores the text cache: scalars compare
/// payloads, arrays compare element-wise in order, objects compare key and
/// value pairs in insertion order.
impl PartialEq for JsonValue {
    fn eq(&self, other: &Self) -> bool {
        self.repr == other.repr
    }
}

impl JsonValue {
    /// A value with no variant yet (`JsonKind::None`).
    pub fn new() -> Self {
        Self::default()
    }

    fn from_repr(repr: Repr) -> Self {
        Self { repr, cached: None }
    }

    pub fn object() -> Self {
        Self::from_repr(Repr::Object(Vec::new()))
    }

    pub fn array() -> Self {
        Self::from_repr(Repr::Array(Vec::new()))
    }

    pub fn kind(&self) -> JsonKind {
        match self.repr {
            Repr::None => JsonKind::None,
            Repr::Object(_) => JsonKind::Object,
            Repr::Array(_) => JsonKind::Array,
            Repr::String(_) => JsonKind::String,
            Repr::Int(_) => JsonKind::Int,
            Repr::Long(_) => JsonKind::Long,
            Repr::Double(_) => JsonKind::Double,
            Repr::Boolean(_) => JsonKind::Boolean,
        }
    }

    pub fn is_none(&self) -> bool {
        self.kind() == JsonKind::None
    }

    pub fn is_object(&self) -> bool {
        self.kind() == JsonKind::Object
    }

    pub fn is_array(&self) -> bool {
        self.kind() == JsonKind::Array
    }

    pub fn is_string(&self) -> bool {
        self.kind() == JsonKind::String
    }

    pub fn is_boolean(&self) -> bool {
        self.kind() == JsonKind::Boolean
    }

    /// True for any of the three number variants.
    pub fn is_number(&self) -> bool {
        matches!(self.kind(), JsonKind::Int | JsonKind::Long | JsonKind::Double)
    }

    /// Reset this value to the given kind's default payload. A no-op when
    /// the variant already matches, so containers being built incrementally
    /// keep their contents.
    pub fn set_kind(&mut self, kind: JsonKind) {
        if self.kind() != kind {
            self.repr = Repr::default_for(kind);
        }
        self.cached = None;
    }

    fn mismatch(&self, expected: &'static str) -> JsonError {
        JsonError::TypeMismatch {
            expected,
            actual: self.kind().name(),
        }
    }

    pub fn as_bool(&self) -> Result<bool> {
        match self.repr {
            Repr::Boolean(b) => Ok(b),
            _ => Err(self.mismatch("boolean")),
        }
    }

    pub fn as_int(&self) -> Result<i32> {
        match self.repr {
            Repr::Int(n) => Ok(n),
            _ => Err(self.mismatch("int")),
        }
    }

    pub fn as_long(&self) -> Result<i64> {
        match self.repr {
            Repr::Long(n) => Ok(n),
            _ => Err(self.mismatch("long")),
        }
    }

    pub fn as_double(&self) -> Result<f64> {
        match self.repr {
            Repr::Double(f) => Ok(f),
            _ => Err(self.mismatch("double")),
        }
    }

    pub fn as_str(&self) -> Result<&str> {
        match &self.repr {
            Repr::String(s) => Ok(s),
            _ => Err(self.mismatch("string")),
        }
    }

    /// Element count of a container; scalars and `None` report zero.
    pub fn len(&self) -> usize {
        match &self.repr {
            Repr::Object(entries) => entries.len(),
            Repr::Array(items) => items.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up an object member by key.
    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        match &self.repr {
            Repr::Object(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Index an array, or an object's entries ordinally in insertion order.
    pub fn get_index(&self, index: usize) -> Option<&JsonValue> {
        match &self.repr {
            Repr::Array(items) => items.get(index),
            Repr::Object(entries) => entries.get(index).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Object keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        let entries = match &self.repr {
            Repr::Object(entries) => entries.as_slice(),
            _ => &[],
        };
        entries.iter().map(|(k, _)| k.as_str())
    }

    /// Object entries in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &JsonValue)> {
        let entries = match &self.repr {
            Repr::Object(entries) => entries.as_slice(),
            _ => &[],
        };
        entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Array items in order.
    pub fn items(&self) -> impl Iterator<Item = &JsonValue> {
        let items = match &self.repr {
            Repr::Array(items) => items.as_slice(),
            _ => &[],
        };
        items.iter()
    }

    /// Insert or replace an object member. Replacing keeps the key's
    /// original position. A `None` value upgrades to an empty object on the
    /// first keyed write; any other variant is a [`JsonError::TypeMismatch`].
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Result<()> {
        if self.is_none() {
            self.repr = Repr::Object(Vec::new());
        }
        match &mut self.repr {
            Repr::Object(entries) => {
                self.cached = None;
                let key = key.into();
                let value = value.into();
                match entries.iter_mut().find(|(k, _)| *k == key) {
                    Some((_, slot)) => *slot = value,
                    None => entries.push((key, value)),
                }
                Ok(())
            }
            _ => Err(self.mismatch("object")),
        }
    }

    /// Append an array element. A `None` value upgrades to an empty array
    /// on the first push.
    pub fn push(&mut self, value: impl Into<JsonValue>) -> Result<()> {
        if self.is_none() {
            self.repr = Repr::Array(Vec::new());
        }
        match &mut self.repr {
            Repr::Array(items) => {
                self.cached = None;
                items.push(value.into());
                Ok(())
            }
            _ => Err(self.mismatch("array")),
        }
    }

    /// Mutable access to an object member, for in-place tree edits.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut JsonValue> {
        self.cached = None;
        match &mut self.repr {
            Repr::Object(entries) => entries.iter_mut().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Serialize recursively to compact JSON text. The result is cached and
    /// reused until the next mutation.
    pub fn to_json(&mut self) -> String {
        if let Some(cached) = &self.cached {
            return cached.clone();
        }
        let text = self.to_json_uncached(false);
        self.cached = Some(text.clone());
        text
    }

    /// Serialize to pretty-printed JSON text (never cached).
    pub fn to_json_pretty(&self) -> String {
        self.to_json_uncached(true)
    }

    fn to_json_uncached(&self, pretty: bool) -> String {
        let mut buf = String::new();
        let mut writer = if pretty {
            JsonWriter::pretty(&mut buf)
        } else {
            JsonWriter::new(&mut buf)
        };
        // Writing into a String cannot fail.
        let _ = self.write(&mut writer);
        buf
    }

    /// Emit this value through a [`JsonWriter`].
    pub fn write(&self, writer: &mut JsonWriter<'_>) -> Result<()> {
        self.write_at_depth(writer, 0, usize::MAX)
    }

    /// As [`JsonValue::write`], starting `depth` containers deep and failing
    /// with [`JsonError::DepthExceeded`] once nesting reaches `max_depth`.
    /// The object mapper uses this so a dynamic subtree counts against the
    /// same write-side depth budget as typed containers.
    pub(crate) fn write_at_depth(
        &self,
        writer: &mut JsonWriter<'_>,
        depth: usize,
        max_depth: usize,
    ) -> Result<()> {
        match &self.repr {
            Repr::None => writer.write_null(),
            Repr::Boolean(b) => writer.write_bool(*b),
            Repr::Int(n) => writer.write_int(*n as i64),
            Repr::Long(n) => writer.write_int(*n),
            Repr::Double(f) => writer.write_double(*f),
            Repr::String(s) => writer.write_string(s),
            Repr::Array(items) => {
                if depth >= max_depth {
                    return Err(JsonError::DepthExceeded { limit: max_depth });
                }
                writer.begin_array()?;
                for item in items {
                    item.write_at_depth(writer, depth + 1, max_depth)?;
                }
                writer.end_array()
            }
            Repr::Object(entries) => {
                if depth >= max_depth {
                    return Err(JsonError::DepthExceeded { limit: max_depth });
                }
                writer.begin_object()?;
                for (key, value) in entries {
                    writer.property_name(key)?;
                    value.write_at_depth(writer, depth + 1, max_depth)?;
                }
                writer.end_object()
            }
        }
    }
}

impl From<bool> for JsonValue {
    fn from(b: bool) -> Self {
        Self::from_repr(Repr::Boolean(b))
    }
}

impl From<i32> for JsonValue {
    fn from(n: i32) -> Self {
        Self::from_repr(Repr::Int(n))
    }
}

impl From<i64> for JsonValue {
    fn from(n: i64) -> Self {
        Self::from_repr(Repr::Long(n))
    }
}

impl From<f64> for JsonValue {
    fn from(f: f64) -> Self {
        Self::from_repr(Repr::Double(f))
    }
}

impl From<&str> for JsonValue {
    fn from(s: &str) -> Self {
        Self::from_repr(Repr::String(s.to_string()))
    }
}

impl From<String> for JsonValue {
    fn from(s: String) -> Self {
        Self::from_repr(Repr::String(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_upgrades_to_object_on_keyed_write() {
        let mut v = JsonValue::new();
        v.insert("a", 1).unwrap();
        assert_eq!(v.kind(), JsonKind::Object);
        assert_eq!(v.get("a").unwrap().as_int().unwrap(), 1);
    }

    #[test]
    fn wrong_accessor_fails() {
        let v = JsonValue::from(3.5);
        assert!(matches!(v.as_int(), Err(JsonError::TypeMismatch { .. })));
        assert_eq!(v.as_double().unwrap(), 3.5);
    }

    #[test]
    fn no_widening_between_number_variants() {
        let v = JsonValue::from(5i32);
        assert!(v.as_long().is_err());
        assert!(v.as_double().is_err());
    }

    #[test]
    fn insertion_order_preserved() {
        let mut v = JsonValue::new();
        v.insert("z", 1).unwrap();
        v.insert("a", 2).unwrap();
        v.insert("z", 3).unwrap(); // replace keeps position
        let keys: Vec<_> = v.keys().collect();
        assert_eq!(keys, vec!["z", "a"]);
        assert_eq!(v.get_index(0).unwrap().as_int().unwrap(), 3);
    }

    #[test]
    fn cache_invalidated_on_mutation() {
        let mut v = JsonValue::new();
        v.insert("a", 1).unwrap();
        let first = v.to_json();
        v.insert("b", 2).unwrap();
        let second = v.to_json();
        assert_ne!(first, second);
        assert_eq!(second, r#"{"a":1,"b":2}"#);
    }

    #[test]
    fn set_kind_resets_only_on_change() {
        let mut v = JsonValue::new();
        v.push(1).unwrap();
        v.set_kind(JsonKind::Array);
        assert_eq!(v.len(), 1);
        v.set_kind(JsonKind::Int);
        assert_eq!(v.as_int().unwrap(), 0);
    }
}
