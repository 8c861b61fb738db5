//! The object mapper: typed values to JSON text and back.
//!
//! A [`Mapper`] owns everything serialization needs: the configuration, the
//! per-type [`MetadataCache`], and the importer/exporter registries. There
//! is no global state; two mappers with different configurations coexist
//! freely.
//!
//! Serialization walks a value's [`Shape`] and emits tokens into a
//! [`JsonWriter`]. Deserialization pulls structural tokens from a
//! [`JsonReader`] and fills a `Default`-constructed instance slot by slot.
//! Scalar dispatch tries, in order: the exact kind, enum name/ordinal
//! conversion, a registered importer for the (JSON kind, target type) pair,
//! general numeric/textual coercion, and finally fails with a
//! [`JsonError::Conversion`] naming the value and both types.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::{JsonError, Result};
use crate::lexer::LexerConfig;
use crate::metadata::{
    concrete, concrete_mut, MetadataCache, RecordShape, ScalarShape, Shape, TypeMetadata,
};
use crate::reader::{JsonReader, JsonToken, DEFAULT_MAX_DEPTH};
use crate::reflect::JsonType;
use crate::value::{JsonKind, JsonValue};
use crate::writer::JsonWriter;

/// Mapper behavior switches.
#[derive(Debug, Clone)]
pub struct MapperConfig {
    /// Treat `//` and `/* */` comments as whitespace.
    pub allow_comments: bool,
    /// Accept single-quoted string literals.
    pub allow_single_quoted_strings: bool,
    /// Silently discard object properties with no matching record member.
    pub skip_unknown_members: bool,
    /// Serialize enums as their variant name instead of their ordinal.
    pub enum_as_string: bool,
    /// Bound on container nesting, both reading and writing.
    pub max_depth: usize,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            allow_comments: true,
            allow_single_quoted_strings: true,
            skip_unknown_members: false,
            enum_as_string: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

type ImporterFn = Box<dyn Fn(&JsonValue, &mut dyn Any) -> Result<()> + Send + Sync>;
type ExporterFn = Box<dyn Fn(&dyn Any, &mut JsonWriter<'_>) -> Result<()> + Send + Sync>;

/// Serialization context: configuration, metadata cache, and conversion
/// registries.
#[derive(Default)]
pub struct Mapper {
    config: MapperConfig,
    metadata: MetadataCache,
    importers: RwLock<HashMap<(JsonKind, TypeId), ImporterFn>>,
    exporters: RwLock<HashMap<TypeId, ExporterFn>>,
}

impl Mapper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: MapperConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    /// Register a deserialization hook for values of the given JSON kind
    /// aimed at `T`. Consulted after the exact kind and enum conversions
    /// fail; re-registering for the same (kind, type) pair replaces the
    /// previous hook.
    pub fn register_importer<T: JsonType>(&self, kind: JsonKind, f: fn(&JsonValue) -> Result<T>) {
        let wrapped: ImporterFn = Box::new(move |value, out| {
            *concrete_mut::<T>(out) = f(value)?;
            Ok(())
        });
        self.write_importers().insert((kind, TypeId::of::<T>()), wrapped);
    }

    /// Register a serialization hook for `T`, overriding the default record
    /// or enum representation. Last registration wins.
    pub fn register_exporter<T: JsonType>(&self, f: fn(&T, &mut JsonWriter<'_>) -> Result<()>) {
        let wrapped: ExporterFn = Box::new(move |value, writer| f(concrete::<T>(value), writer));
        self.write_exporters().insert(TypeId::of::<T>(), wrapped);
    }

    /// Serialize a value to compact JSON text.
    pub fn to_json<T: JsonType>(&self, value: &T) -> Result<String> {
        let mut buf = String::new();
        let mut writer = JsonWriter::new(&mut buf);
        self.serialize_to(value, &mut writer)?;
        Ok(buf)
    }

    /// Serialize a value to pretty-printed JSON text.
    pub fn to_json_pretty<T: JsonType>(&self, value: &T) -> Result<String> {
        let mut buf = String::new();
        let mut writer = JsonWriter::pretty(&mut buf);
        self.serialize_to(value, &mut writer)?;
        Ok(buf)
    }

    /// Serialize a value into an existing writer.
    pub fn serialize_to<T: JsonType>(&self, value: &T, writer: &mut JsonWriter<'_>) -> Result<()> {
        let meta = self.metadata.of::<T>();
        self.write_value(&meta, value, writer, 0)
    }

    /// Deserialize JSON text into a fresh `T`.
    pub fn to_object<T: JsonType>(&self, text: &str) -> Result<T> {
        let mut value = T::default();
        self.fill_object(&mut value, text)?;
        Ok(value)
    }

    /// Deserialize JSON text into an existing instance. Members already
    /// written when an error occurs stay written; callers that need
    /// all-or-nothing semantics should fill a scratch instance first.
    pub fn fill_object<T: JsonType>(&self, target: &mut T, text: &str) -> Result<()> {
        let mut reader = self.reader(text);
        let meta = self.metadata.of::<T>();
        self.read_value(&meta, target, &mut reader)?;
        reader.expect_end()
    }

    /// As [`Mapper::fill_object`], from an in-memory value tree.
    pub fn fill_object_from_value<T: JsonType>(
        &self,
        target: &mut T,
        value: &JsonValue,
    ) -> Result<()> {
        let mut text = String::new();
        let mut writer = JsonWriter::new(&mut text);
        value.write_at_depth(&mut writer, 0, self.config.max_depth)?;
        self.fill_object(target, &text)
    }

    /// Parse JSON text into a dynamically-typed [`JsonValue`] tree.
    pub fn to_dynamic(&self, text: &str) -> Result<JsonValue> {
        let mut reader = self.reader(text);
        let token = reader.read()?;
        let value = self.collect_dynamic(token, &mut reader)?;
        reader.expect_end()?;
        Ok(value)
    }

    fn reader<'t>(&self, text: &'t str) -> JsonReader<'t> {
        let lexer = LexerConfig {
            allow_comments: self.config.allow_comments,
            allow_single_quoted_strings: self.config.allow_single_quoted_strings,
        };
        JsonReader::with_config(text, lexer, self.config.max_depth)
    }

    // ---- serialization ----

    fn write_value(
        &self,
        meta: &TypeMetadata,
        instance: &dyn Any,
        writer: &mut JsonWriter<'_>,
        depth: usize,
    ) -> Result<()> {
        if let Shape::Record(_) | Shape::Enum(_) = meta.shape {
            if self.run_exporter(meta.type_id, instance, writer)? {
                return Ok(());
            }
        }
        match &meta.shape {
            Shape::Scalar(scalar) => match scalar {
                ScalarShape::Bool { get, .. } => writer.write_bool(get(instance)),
                ScalarShape::Int { get, .. } => writer.write_int(get(instance)),
                ScalarShape::UInt { get, .. } => writer.write_uint(get(instance)),
                ScalarShape::Double { get, .. } => writer.write_double(get(instance)),
                ScalarShape::Str { get, .. } => writer.write_string(get(instance)),
            },
            Shape::Dynamic => {
                concrete::<JsonValue>(instance).write_at_depth(writer, depth, self.config.max_depth)
            }
            Shape::Bytes(bytes) => writer.write_string(&base64_encode((bytes.get)(instance))),
            Shape::Enum(shape) => {
                if self.config.enum_as_string {
                    match (shape.name_of)(instance) {
                        Some(name) => writer.write_string(name),
                        None => Err(self.unlisted_variant(meta)),
                    }
                } else {
                    match (shape.value_of)(instance) {
                        Some(value) => writer.write_int(value),
                        None => Err(self.unlisted_variant(meta)),
                    }
                }
            }
            Shape::Boxed(boxed) => {
                let inner = (boxed.inner)(&self.metadata);
                self.write_value(&inner, (boxed.get)(instance), writer, depth)
            }
            Shape::Optional(opt) => match (opt.get)(instance) {
                Some(inner) => {
                    let inner_meta = (opt.inner)(&self.metadata);
                    self.write_value(&inner_meta, inner, writer, depth)
                }
                None => writer.write_null(),
            },
            Shape::List(list) => {
                self.check_write_depth(depth)?;
                let element = (list.element)(&self.metadata);
                writer.begin_array()?;
                for index in 0..(list.len)(instance) {
                    self.write_value(&element, (list.get)(instance, index), writer, depth + 1)?;
                }
                writer.end_array()
            }
            Shape::Dictionary(dict) => {
                self.check_write_depth(depth)?;
                let value_meta = (dict.value)(&self.metadata);
                writer.begin_object()?;
                (dict.visit)(instance, &mut |key, value| {
                    writer.property_name(key)?;
                    self.write_value(&value_meta, value, writer, depth + 1)
                })?;
                writer.end_object()
            }
            Shape::Record(record) => {
                self.check_write_depth(depth)?;
                writer.begin_object()?;
                for prop in &record.properties {
                    writer.property_name(prop.name)?;
                    let prop_meta = (prop.metadata)(&self.metadata);
                    self.write_value(&prop_meta, (prop.get)(instance), writer, depth + 1)?;
                }
                writer.end_object()
            }
        }
    }

    fn check_write_depth(&self, depth: usize) -> Result<()> {
        if depth >= self.config.max_depth {
            return Err(JsonError::DepthExceeded {
                limit: self.config.max_depth,
            });
        }
        Ok(())
    }

    fn run_exporter(
        &self,
        type_id: TypeId,
        instance: &dyn Any,
        writer: &mut JsonWriter<'_>,
    ) -> Result<bool> {
        let exporters = self.read_exporters();
        match exporters.get(&type_id) {
            Some(exporter) => {
                exporter(instance, writer)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn unlisted_variant(&self, meta: &TypeMetadata) -> JsonError {
        JsonError::Conversion {
            json_kind: "none",
            value: "variant not listed in the enum descriptor".to_string(),
            target: meta.type_name,
        }
    }

    // ---- deserialization ----

    fn read_value(
        &self,
        meta: &TypeMetadata,
        slot: &mut dyn Any,
        reader: &mut JsonReader<'_>,
    ) -> Result<()> {
        let token = reader.read()?;
        self.read_token(meta, slot, token, reader)
    }

    fn read_token(
        &self,
        meta: &TypeMetadata,
        slot: &mut dyn Any,
        token: JsonToken,
        reader: &mut JsonReader<'_>,
    ) -> Result<()> {
        match &meta.shape {
            Shape::Optional(opt) => {
                if token == JsonToken::Null {
                    (opt.set_none)(slot);
                    return Ok(());
                }
                let inner = (opt.inner)(&self.metadata);
                self.read_token(&inner, (opt.insert_default)(slot), token, reader)
            }
            Shape::Boxed(boxed) => {
                let inner = (boxed.inner)(&self.metadata);
                self.read_token(&inner, (boxed.get_mut)(slot), token, reader)
            }
            Shape::Dynamic => {
                *concrete_mut::<JsonValue>(slot) = self.collect_dynamic(token, reader)?;
                Ok(())
            }
            Shape::Scalar(scalar) => self.read_scalar(meta, scalar, slot, token),
            Shape::Enum(shape) => {
                match &token {
                    JsonToken::Str(name) => {
                        if (shape.from_name)(slot, name) {
                            return Ok(());
                        }
                    }
                    JsonToken::Int(n) => {
                        if (shape.from_value)(slot, i64::from(*n)) {
                            return Ok(());
                        }
                    }
                    JsonToken::Long(n) => {
                        if (shape.from_value)(slot, *n) {
                            return Ok(());
                        }
                    }
                    _ => {}
                }
                self.divert(meta, slot, token, reader)
            }
            Shape::Bytes(bytes) => match token {
                JsonToken::Str(text) => match base64_decode(&text) {
                    Some(decoded) => {
                        (bytes.set)(slot, decoded);
                        Ok(())
                    }
                    None => Err(JsonError::Conversion {
                        json_kind: "string",
                        value: text,
                        target: meta.type_name,
                    }),
                },
                other => self.divert(meta, slot, other, reader),
            },
            Shape::Record(record) => match token {
                JsonToken::ObjectStart => self.read_record(meta, record, slot, reader),
                other => self.divert(meta, slot, other, reader),
            },
            Shape::Dictionary(dict) => match token {
                JsonToken::ObjectStart => {
                    (dict.clear)(slot);
                    let value_meta = (dict.value)(&self.metadata);
                    let mut seen: Vec<String> = Vec::new();
                    loop {
                        match reader.read()? {
                            JsonToken::ObjectEnd => return Ok(()),
                            JsonToken::PropertyName(name) => {
                                if seen.iter().any(|k| *k == name) {
                                    return Err(duplicate_property(&name));
                                }
                                seen.push(name.clone());
                                let value_slot = (dict.insert)(slot, name);
                                self.read_value(&value_meta, value_slot, reader)?;
                            }
                            other => return Err(unexpected_in_object(&other)),
                        }
                    }
                }
                other => self.divert(meta, slot, other, reader),
            },
            Shape::List(list) => match token {
                JsonToken::ArrayStart => {
                    (list.clear)(slot);
                    let element = (list.element)(&self.metadata);
                    let mut count = 0usize;
                    loop {
                        let token = reader.read()?;
                        if token == JsonToken::ArrayEnd {
                            break;
                        }
                        match (list.slot)(slot, count) {
                            Some(element_slot) => {
                                self.read_token(&element, element_slot, token, reader)?;
                            }
                            None => {
                                return Err(JsonError::Conversion {
                                    json_kind: "array",
                                    value: format!("more than {count} elements"),
                                    target: meta.type_name,
                                });
                            }
                        }
                        count += 1;
                    }
                    if let Some(expected) = list.fixed_len {
                        if count != expected {
                            return Err(JsonError::Conversion {
                                json_kind: "array",
                                value: format!("{count} elements, need exactly {expected}"),
                                target: meta.type_name,
                            });
                        }
                    }
                    Ok(())
                }
                other => self.divert(meta, slot, other, reader),
            },
        }
    }

    fn read_record(
        &self,
        meta: &TypeMetadata,
        record: &RecordShape,
        slot: &mut dyn Any,
        reader: &mut JsonReader<'_>,
    ) -> Result<()> {
        let mut filled: Vec<&'static str> = Vec::new();
        let mut skipped: Vec<String> = Vec::new();
        loop {
            match reader.read()? {
                JsonToken::ObjectEnd => return Ok(()),
                JsonToken::PropertyName(name) => {
                    match record.properties.iter().find(|p| p.name == name) {
                        Some(prop) => {
                            if filled.contains(&prop.name) {
                                return Err(duplicate_property(&name));
                            }
                            filled.push(prop.name);
                            let prop_meta = (prop.metadata)(&self.metadata);
                            self.read_value(&prop_meta, (prop.get_mut)(slot), reader)?;
                        }
                        // Unknown members are subject to the same duplicate
                        // rule as known ones, even when merely skipped.
                        None if self.config.skip_unknown_members => {
                            if skipped.iter().any(|k| *k == name) {
                                return Err(duplicate_property(&name));
                            }
                            reader.skip_value()?;
                            skipped.push(name);
                        }
                        None => {
                            return Err(JsonError::UnknownMember {
                                member: name,
                                target: meta.type_name,
                            });
                        }
                    }
                }
                other => return Err(unexpected_in_object(&other)),
            }
        }
    }

    fn read_scalar(
        &self,
        meta: &TypeMetadata,
        scalar: &ScalarShape,
        slot: &mut dyn Any,
        token: JsonToken,
    ) -> Result<()> {
        // Exact kind first. Range failures fall through to the importer and
        // coercion tiers so a registered hook gets its chance.
        match (scalar, &token) {
            (ScalarShape::Bool { set, .. }, JsonToken::Bool(b)) => {
                set(slot, *b);
                return Ok(());
            }
            (ScalarShape::Int { set, .. }, JsonToken::Int(n)) => {
                if set(slot, i64::from(*n)) {
                    return Ok(());
                }
            }
            (ScalarShape::Int { set, .. }, JsonToken::Long(n)) => {
                if set(slot, *n) {
                    return Ok(());
                }
            }
            (ScalarShape::UInt { set, .. }, JsonToken::Int(n)) => {
                if u64::try_from(*n).map(|n| set(slot, n)).unwrap_or(false) {
                    return Ok(());
                }
            }
            (ScalarShape::UInt { set, .. }, JsonToken::Long(n)) => {
                if u64::try_from(*n).map(|n| set(slot, n)).unwrap_or(false) {
                    return Ok(());
                }
            }
            (ScalarShape::Double { set, .. }, JsonToken::Double(f)) => {
                if set(slot, *f) {
                    return Ok(());
                }
            }
            (ScalarShape::Str { set, .. }, JsonToken::Str(_)) => {
                if let JsonToken::Str(s) = token {
                    set(slot, s);
                }
                return Ok(());
            }
            _ => {}
        }
        if let Some(value) = scalar_to_value(&token) {
            if self.try_import(meta, slot, &value)? {
                return Ok(());
            }
        }
        self.coerce_scalar(meta, scalar, slot, token)
    }

    /// General coercion tier: bounded integer narrowing, int/float when
    /// exact, string-to-number/bool parsing, and number/bool-to-string.
    fn coerce_scalar(
        &self,
        meta: &TypeMetadata,
        scalar: &ScalarShape,
        slot: &mut dyn Any,
        token: JsonToken,
    ) -> Result<()> {
        let converted = match (scalar, &token) {
            (ScalarShape::Bool { set, .. }, JsonToken::Str(s)) => match s.as_str() {
                "true" => {
                    set(slot, true);
                    true
                }
                "false" => {
                    set(slot, false);
                    true
                }
                _ => false,
            },
            (ScalarShape::Int { set, .. }, JsonToken::Double(f)) => {
                // Upper bound is exclusive: 2^63 rounds to itself as f64 and
                // would saturate on the cast. `i64::MIN` converts exactly.
                f.fract() == 0.0
                    && *f >= i64::MIN as f64
                    && *f < 9_223_372_036_854_775_808.0
                    && set(slot, *f as i64)
            }
            (ScalarShape::Int { set, .. }, JsonToken::Str(s)) => {
                s.parse::<i64>().map(|n| set(slot, n)).unwrap_or(false)
            }
            (ScalarShape::UInt { set, .. }, JsonToken::Double(f)) => {
                // Same exclusive bound at 2^64.
                f.fract() == 0.0
                    && *f >= 0.0
                    && *f < 18_446_744_073_709_551_616.0
                    && set(slot, *f as u64)
            }
            (ScalarShape::UInt { set, .. }, JsonToken::Str(s)) => {
                s.parse::<u64>().map(|n| set(slot, n)).unwrap_or(false)
            }
            (ScalarShape::Double { set, .. }, JsonToken::Int(n)) => set(slot, f64::from(*n)),
            (ScalarShape::Double { set, .. }, JsonToken::Long(n)) => {
                // Only when f64 represents the integer exactly.
                (*n as f64) as i64 == *n && set(slot, *n as f64)
            }
            (ScalarShape::Double { set, .. }, JsonToken::Str(s)) => {
                s.parse::<f64>().map(|f| set(slot, f)).unwrap_or(false)
            }
            (ScalarShape::Str { set, .. }, JsonToken::Int(n)) => {
                set(slot, n.to_string());
                true
            }
            (ScalarShape::Str { set, .. }, JsonToken::Long(n)) => {
                set(slot, n.to_string());
                true
            }
            (ScalarShape::Str { set, .. }, JsonToken::Double(f)) => {
                set(slot, f.to_string());
                true
            }
            (ScalarShape::Str { set, .. }, JsonToken::Bool(b)) => {
                set(slot, b.to_string());
                true
            }
            _ => false,
        };
        if converted {
            Ok(())
        } else {
            Err(conversion_error(&token, meta))
        }
    }

    /// Non-scalar fallback: materialize the value and hand it to a
    /// registered importer, or fail.
    fn divert(
        &self,
        meta: &TypeMetadata,
        slot: &mut dyn Any,
        token: JsonToken,
        reader: &mut JsonReader<'_>,
    ) -> Result<()> {
        let kind = token_kind(&token);
        if matches!(token, JsonToken::ObjectStart | JsonToken::ArrayStart)
            && !self.has_importer(kind, meta.type_id)
        {
            return Err(conversion_error(&token, meta));
        }
        let value = self.collect_dynamic(token, reader)?;
        if self.try_import(meta, slot, &value)? {
            return Ok(());
        }
        Err(JsonError::Conversion {
            json_kind: kind.name(),
            value: value.to_json_pretty(),
            target: meta.type_name,
        })
    }

    fn has_importer(&self, kind: JsonKind, type_id: TypeId) -> bool {
        self.read_importers().contains_key(&(kind, type_id))
    }

    fn try_import(&self, meta: &TypeMetadata, slot: &mut dyn Any, value: &JsonValue) -> Result<bool> {
        let importers = self.read_importers();
        match importers.get(&(value.kind(), meta.type_id)) {
            Some(importer) => {
                importer(value, slot)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Build a [`JsonValue`] subtree starting from an already-read token.
    fn collect_dynamic(&self, token: JsonToken, reader: &mut JsonReader<'_>) -> Result<JsonValue> {
        match token {
            JsonToken::ObjectStart => {
                let mut object = JsonValue::object();
                loop {
                    match reader.read()? {
                        JsonToken::ObjectEnd => return Ok(object),
                        JsonToken::PropertyName(name) => {
                            if object.get(&name).is_some() {
                                return Err(duplicate_property(&name));
                            }
                            let token = reader.read()?;
                            let value = self.collect_dynamic(token, reader)?;
                            object.insert(name, value)?;
                        }
                        other => return Err(unexpected_in_object(&other)),
                    }
                }
            }
            JsonToken::ArrayStart => {
                let mut array = JsonValue::array();
                loop {
                    let token = reader.read()?;
                    if token == JsonToken::ArrayEnd {
                        return Ok(array);
                    }
                    array.push(self.collect_dynamic(token, reader)?)?;
                }
            }
            JsonToken::Int(n) => Ok(JsonValue::from(n)),
            JsonToken::Long(n) => Ok(JsonValue::from(n)),
            JsonToken::Double(f) => Ok(JsonValue::from(f)),
            JsonToken::Str(s) => Ok(JsonValue::from(s)),
            JsonToken::Bool(b) => Ok(JsonValue::from(b)),
            JsonToken::Null => Ok(JsonValue::new()),
            other => Err(JsonError::Structural {
                message: format!("expected a value, found {}", other.describe()),
            }),
        }
    }

    fn read_importers(&self) -> std::sync::RwLockReadGuard<'_, HashMap<(JsonKind, TypeId), ImporterFn>> {
        match self.importers.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write_importers(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<(JsonKind, TypeId), ImporterFn>> {
        match self.importers.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn read_exporters(&self) -> std::sync::RwLockReadGuard<'_, HashMap<TypeId, ExporterFn>> {
        match self.exporters.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write_exporters(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<TypeId, ExporterFn>> {
        match self.exporters.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

fn token_kind(token: &JsonToken) -> JsonKind {
    match token {
        JsonToken::ObjectStart => JsonKind::Object,
        JsonToken::ArrayStart => JsonKind::Array,
        JsonToken::Int(_) => JsonKind::Int,
        JsonToken::Long(_) => JsonKind::Long,
        JsonToken::Double(_) => JsonKind::Double,
        JsonToken::Str(_) => JsonKind::String,
        JsonToken::Bool(_) => JsonKind::Boolean,
        _ => JsonKind::None,
    }
}

/// A scalar token as a [`JsonValue`], for importer lookup. Containers are
/// handled by [`Mapper::divert`].
fn scalar_to_value(token: &JsonToken) -> Option<JsonValue> {
    match token {
        JsonToken::Int(n) => Some(JsonValue::from(*n)),
        JsonToken::Long(n) => Some(JsonValue::from(*n)),
        JsonToken::Double(f) => Some(JsonValue::from(*f)),
        JsonToken::Str(s) => Some(JsonValue::from(s.as_str())),
        JsonToken::Bool(b) => Some(JsonValue::from(*b)),
        JsonToken::Null => Some(JsonValue::new()),
        _ => None,
    }
}

fn conversion_error(token: &JsonToken, meta: &TypeMetadata) -> JsonError {
    let value = match token {
        JsonToken::Int(n) => n.to_string(),
        JsonToken::Long(n) => n.to_string(),
        JsonToken::Double(f) => f.to_string(),
        JsonToken::Str(s) => s.clone(),
        JsonToken::Bool(b) => b.to_string(),
        JsonToken::Null => "null".to_string(),
        JsonToken::ObjectStart => "{...}".to_string(),
        JsonToken::ArrayStart => "[...]".to_string(),
        other => other.describe().to_string(),
    };
    JsonError::Conversion {
        json_kind: token_kind(token).name(),
        value,
        target: meta.type_name,
    }
}

fn duplicate_property(name: &str) -> JsonError {
    JsonError::Structural {
        message: format!("duplicate property `{name}`"),
    }
}

fn unexpected_in_object(token: &JsonToken) -> JsonError {
    JsonError::Structural {
        message: format!(
            "expected a property name or object end, found {}",
            token.describe()
        ),
    }
}

// ---- base64 ----
//
// Standard alphabet with `=` padding. Hand-rolled because this is the only
// binary-to-text concern in the crate.

const BASE64_ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

pub(crate) fn base64_encode(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len().div_ceil(3) * 4);
    for chunk in data.chunks(3) {
        let b0 = chunk[0] as u32;
        let b1 = chunk.get(1).copied().unwrap_or(0) as u32;
        let b2 = chunk.get(2).copied().unwrap_or(0) as u32;
        let triple = (b0 << 16) | (b1 << 8) | b2;
        out.push(BASE64_ALPHABET[(triple >> 18) as usize & 0x3f] as char);
        out.push(BASE64_ALPHABET[(triple >> 12) as usize & 0x3f] as char);
        out.push(if chunk.len() > 1 {
            BASE64_ALPHABET[(triple >> 6) as usize & 0x3f] as char
        } else {
            '='
        });
        out.push(if chunk.len() > 2 {
            BASE64_ALPHABET[triple as usize & 0x3f] as char
        } else {
            '='
        });
    }
    out
}

pub(crate) fn base64_decode(text: &str) -> Option<Vec<u8>> {
    fn value_of(c: u8) -> Option<u32> {
        match c {
            b'A'..=b'Z' => Some(u32::from(c - b'A')),
            b'a'..=b'z' => Some(u32::from(c - b'a') + 26),
            b'0'..=b'9' => Some(u32::from(c - b'0') + 52),
            b'+' => Some(62),
            b'/' => Some(63),
            _ => None,
        }
    }
    let bytes = text.as_bytes();
    if bytes.len() % 4 != 0 {
        return None;
    }
    let mut out = Vec::with_capacity(bytes.len() / 4 * 3);
    for (i, quad) in bytes.chunks(4).enumerate() {
        let last = i == bytes.len() / 4 - 1;
        let pads = quad.iter().rev().take_while(|&&c| c == b'=').count();
        if pads > 2 || (pads > 0 && !last) {
            return None;
        }
        let mut triple = 0u32;
        for &c in &quad[..4 - pads] {
            triple = (triple << 6) | value_of(c)?;
        }
        triple <<= 6 * pads as u32;
        out.push((triple >> 16) as u8);
        if pads < 2 {
            out.push((triple >> 8) as u8);
        }
        if pads < 1 {
            out.push(triple as u8);
        }
    }
    Some(out)
}
