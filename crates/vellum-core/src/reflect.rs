//! The mappable-type trait and its library implementations.
//!
//! [`JsonType`] ties a Rust type to its [`TypeMetadata`] descriptor. All
//! accessors in a descriptor are plain function pointers monomorphized per
//! type here, so describing a type allocates its property table once and
//! nothing else.
//!
//! Implementations are provided for the primitive scalars, `String`,
//! [`JsonValue`], [`Bytes`], `Vec<T>`, `[T; N]`, `Option<T>`, and
//! string-keyed `HashMap`/`BTreeMap`. User records and fieldless enums opt
//! in through [`json_record!`](crate::json_record) and
//! [`json_enum!`](crate::json_enum).

use std::any::{Any, TypeId};
use std::collections::{BTreeMap, HashMap};

use crate::error::Result;
use crate::metadata::{
    concrete, concrete_mut, BoxedShape, BytesShape, DictionaryShape, ListShape, MetadataCache,
    OptionalShape, ScalarShape, Shape, TypeMetadata,
};
use crate::value::JsonValue;

/// A type the mapper can serialize and deserialize.
///
/// `Default` supplies the blank instance deserialization fills in; every
/// field of a record therefore needs a `Default` of its own.
pub trait JsonType: Any + Default {
    /// Build this type's descriptor. Called at most once per cache; use
    /// [`MetadataCache::of`] to obtain the shared `Arc`.
    fn describe() -> TypeMetadata;
}

fn meta<T: JsonType>(shape: Shape) -> TypeMetadata {
    TypeMetadata {
        type_name: std::any::type_name::<T>(),
        type_id: TypeId::of::<T>(),
        shape,
    }
}

macro_rules! signed_scalar {
    ($($ty:ty),+) => {$(
        impl JsonType for $ty {
            fn describe() -> TypeMetadata {
                meta::<$ty>(Shape::Scalar(ScalarShape::Int {
                    get: |v| *concrete::<$ty>(v) as i64,
                    set: |v, n| match <$ty>::try_from(n) {
                        Ok(n) => {
                            *concrete_mut::<$ty>(v) = n;
                            true
                        }
                        Err(_) => false,
                    },
                }))
            }
        }
    )+};
}

macro_rules! unsigned_scalar {
    ($($ty:ty),+) => {$(
        impl JsonType for $ty {
            fn describe() -> TypeMetadata {
                meta::<$ty>(Shape::Scalar(ScalarShape::UInt {
                    get: |v| *concrete::<$ty>(v) as u64,
                    set: |v, n| match <$ty>::try_from(n) {
                        Ok(n) => {
                            *concrete_mut::<$ty>(v) = n;
                            true
                        }
                        Err(_) => false,
                    },
                }))
            }
        }
    )+};
}

signed_scalar!(i8, i16, i32, i64, isize);
unsigned_scalar!(u8, u16, u32, u64, usize);

impl JsonType for bool {
    fn describe() -> TypeMetadata {
        meta::<bool>(Shape::Scalar(ScalarShape::Bool {
            get: |v| *concrete::<bool>(v),
            set: |v, b| *concrete_mut::<bool>(v) = b,
        }))
    }
}

impl JsonType for f64 {
    fn describe() -> TypeMetadata {
        meta::<f64>(Shape::Scalar(ScalarShape::Double {
            get: |v| *concrete::<f64>(v),
            set: |v, f| {
                *concrete_mut::<f64>(v) = f;
                true
            },
        }))
    }
}

impl JsonType for f32 {
    fn describe() -> TypeMetadata {
        meta::<f32>(Shape::Scalar(ScalarShape::Double {
            get: |v| f64::from(*concrete::<f32>(v)),
            set: |v, f| {
                // Values outside f32 range would collapse to infinity.
                if f.is_finite() && f.abs() > f64::from(f32::MAX) {
                    return false;
                }
                *concrete_mut::<f32>(v) = f as f32;
                true
            },
        }))
    }
}

impl JsonType for String {
    fn describe() -> TypeMetadata {
        fn get(v: &dyn Any) -> &str {
            concrete::<String>(v).as_str()
        }
        meta::<String>(Shape::Scalar(ScalarShape::Str {
            get,
            set: |v, s| *concrete_mut::<String>(v) = s,
        }))
    }
}

impl JsonType for JsonValue {
    fn describe() -> TypeMetadata {
        meta::<JsonValue>(Shape::Dynamic)
    }
}

/// Raw bytes, carried in JSON as a base64 string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bytes(pub Vec<u8>);

impl From<Vec<u8>> for Bytes {
    fn from(bytes: Vec<u8>) -> Self {
        Bytes(bytes)
    }
}

impl Bytes {
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }
}

impl JsonType for Bytes {
    fn describe() -> TypeMetadata {
        fn get(v: &dyn Any) -> &[u8] {
            concrete::<Bytes>(v).0.as_slice()
        }
        meta::<Bytes>(Shape::Bytes(BytesShape {
            get,
            set: |v, bytes| concrete_mut::<Bytes>(v).0 = bytes,
        }))
    }
}

impl<T: JsonType> JsonType for Vec<T> {
    fn describe() -> TypeMetadata {
        fn len<T: JsonType>(v: &dyn Any) -> usize {
            concrete::<Vec<T>>(v).len()
        }
        fn get<T: JsonType>(v: &dyn Any, index: usize) -> &dyn Any {
            &concrete::<Vec<T>>(v)[index]
        }
        fn clear<T: JsonType>(v: &mut dyn Any) {
            concrete_mut::<Vec<T>>(v).clear();
        }
        fn slot<T: JsonType>(v: &mut dyn Any, index: usize) -> Option<&mut dyn Any> {
            let items = concrete_mut::<Vec<T>>(v);
            if index == items.len() {
                items.push(T::default());
            }
            items.get_mut(index).map(|item| item as &mut dyn Any)
        }
        meta::<Vec<T>>(Shape::List(ListShape {
            element: MetadataCache::of::<T>,
            fixed_len: None,
            len: len::<T>,
            get: get::<T>,
            clear: clear::<T>,
            slot: slot::<T>,
        }))
    }
}

impl<T: JsonType, const N: usize> JsonType for [T; N]
where
    [T; N]: Default,
{
    fn describe() -> TypeMetadata {
        fn len<T: JsonType, const N: usize>(_v: &dyn Any) -> usize {
            N
        }
        fn get<T: JsonType, const N: usize>(v: &dyn Any, index: usize) -> &dyn Any {
            &concrete::<[T; N]>(v)[index]
        }
        fn clear<T: JsonType, const N: usize>(_v: &mut dyn Any) {}
        fn slot<T: JsonType, const N: usize>(v: &mut dyn Any, index: usize) -> Option<&mut dyn Any> {
            concrete_mut::<[T; N]>(v)
                .get_mut(index)
                .map(|item| item as &mut dyn Any)
        }
        meta::<[T; N]>(Shape::List(ListShape {
            element: MetadataCache::of::<T>,
            fixed_len: Some(N),
            len: len::<T, N>,
            get: get::<T, N>,
            clear: clear::<T, N>,
            slot: slot::<T, N>,
        }))
    }
}

/// Boxes are transparent: `Box<T>` maps exactly as `T` does. This is what
/// lets records refer to themselves (`Option<Box<Node>>`).
impl<T: JsonType> JsonType for Box<T> {
    fn describe() -> TypeMetadata {
        fn get<T: JsonType>(v: &dyn Any) -> &dyn Any {
            concrete::<Box<T>>(v).as_ref()
        }
        fn get_mut<T: JsonType>(v: &mut dyn Any) -> &mut dyn Any {
            concrete_mut::<Box<T>>(v).as_mut()
        }
        meta::<Box<T>>(Shape::Boxed(BoxedShape {
            inner: MetadataCache::of::<T>,
            get: get::<T>,
            get_mut: get_mut::<T>,
        }))
    }
}

impl<T: JsonType> JsonType for Option<T> {
    fn describe() -> TypeMetadata {
        fn get<T: JsonType>(v: &dyn Any) -> Option<&dyn Any> {
            concrete::<Option<T>>(v).as_ref().map(|inner| inner as &dyn Any)
        }
        fn insert_default<T: JsonType>(v: &mut dyn Any) -> &mut dyn Any {
            concrete_mut::<Option<T>>(v).insert(T::default())
        }
        meta::<Option<T>>(Shape::Optional(OptionalShape {
            inner: MetadataCache::of::<T>,
            get: get::<T>,
            set_none: |v| *concrete_mut::<Option<T>>(v) = None,
            insert_default: insert_default::<T>,
        }))
    }
}

macro_rules! dictionary_impl {
    ($map:ident) => {
        impl<T: JsonType> JsonType for $map<String, T> {
            fn describe() -> TypeMetadata {
                fn visit<T: JsonType>(
                    v: &dyn Any,
                    f: &mut dyn FnMut(&str, &dyn Any) -> Result<()>,
                ) -> Result<()> {
                    for (key, value) in concrete::<$map<String, T>>(v) {
                        f(key, value)?;
                    }
                    Ok(())
                }
                fn insert<T: JsonType>(v: &mut dyn Any, key: String) -> &mut dyn Any {
                    concrete_mut::<$map<String, T>>(v)
                        .entry(key)
                        .or_insert_with(T::default)
                }
                meta::<$map<String, T>>(Shape::Dictionary(DictionaryShape {
                    value: MetadataCache::of::<T>,
                    visit: visit::<T>,
                    clear: |v| concrete_mut::<$map<String, T>>(v).clear(),
                    insert: insert::<T>,
                }))
            }
        }
    };
}

dictionary_impl!(HashMap);
dictionary_impl!(BTreeMap);

/// Implement [`JsonType`] for a `Default` struct, mapping each listed field
/// to a JSON property. Properties serialize in the listed order. A field
/// maps to its own name unless renamed with `as "jsonName"`.
///
/// ```
/// use vellum_core::{json_record, Mapper};
///
/// #[derive(Debug, Default, PartialEq)]
/// struct Point {
///     x: i32,
///     y: i32,
/// }
/// json_record!(Point { x, y });
///
/// let mapper = Mapper::new();
/// let p: Point = mapper.to_object(r#"{"x": 1, "y": 2}"#).unwrap();
/// assert_eq!(p, Point { x: 1, y: 2 });
/// ```
#[macro_export]
macro_rules! json_record {
    ($ty:ty { $( $field:ident $(as $json_name:literal)? ),+ $(,)? }) => {
        impl $crate::JsonType for $ty {
            fn describe() -> $crate::metadata::TypeMetadata {
                $crate::metadata::TypeMetadata {
                    type_name: ::std::any::type_name::<$ty>(),
                    type_id: ::std::any::TypeId::of::<$ty>(),
                    shape: $crate::metadata::Shape::Record($crate::metadata::RecordShape {
                        properties: vec![
                            $({
                                fn get(v: &dyn ::std::any::Any) -> &dyn ::std::any::Any {
                                    &$crate::metadata::concrete::<$ty>(v).$field
                                }
                                fn get_mut(
                                    v: &mut dyn ::std::any::Any,
                                ) -> &mut dyn ::std::any::Any {
                                    &mut $crate::metadata::concrete_mut::<$ty>(v).$field
                                }
                                #[allow(unused_variables)]
                                let name: &'static str = stringify!($field);
                                $(let name: &'static str = $json_name;)?
                                $crate::metadata::PropertyMetadata {
                                    name,
                                    type_name: $crate::metadata::member_type_name(
                                        |v: &$ty| &v.$field,
                                    ),
                                    metadata: $crate::metadata::member_meta(|v: &$ty| &v.$field),
                                    get,
                                    get_mut,
                                }
                            }),+
                        ],
                    }),
                }
            }
        }
    };
}

/// Implement [`JsonType`] for a fieldless enum (`Copy + PartialEq +
/// Default` required). A variant's numeric value is its ordinal in the
/// listed order; its name is the variant identifier.
#[macro_export]
macro_rules! json_enum {
    ($ty:ty { $( $variant:ident ),+ $(,)? }) => {
        impl $crate::JsonType for $ty {
            fn describe() -> $crate::metadata::TypeMetadata {
                const NAMES: &[&str] = &[$(stringify!($variant)),+];
                const VARIANTS: &[(&str, $ty)] =
                    &[$((stringify!($variant), <$ty>::$variant)),+];
                fn name_of(v: &dyn ::std::any::Any) -> Option<&'static str> {
                    let current = $crate::metadata::concrete::<$ty>(v);
                    VARIANTS
                        .iter()
                        .find(|(_, variant)| variant == current)
                        .map(|(name, _)| *name)
                }
                fn value_of(v: &dyn ::std::any::Any) -> Option<i64> {
                    let current = $crate::metadata::concrete::<$ty>(v);
                    VARIANTS
                        .iter()
                        .position(|(_, variant)| variant == current)
                        .map(|ordinal| ordinal as i64)
                }
                fn from_name(v: &mut dyn ::std::any::Any, name: &str) -> bool {
                    match VARIANTS.iter().find(|(n, _)| *n == name) {
                        Some((_, variant)) => {
                            *$crate::metadata::concrete_mut::<$ty>(v) = *variant;
                            true
                        }
                        None => false,
                    }
                }
                fn from_value(v: &mut dyn ::std::any::Any, value: i64) -> bool {
                    let found = usize::try_from(value)
                        .ok()
                        .and_then(|ordinal| VARIANTS.get(ordinal));
                    match found {
                        Some((_, variant)) => {
                            *$crate::metadata::concrete_mut::<$ty>(v) = *variant;
                            true
                        }
                        None => false,
                    }
                }
                $crate::metadata::TypeMetadata {
                    type_name: ::std::any::type_name::<$ty>(),
                    type_id: ::std::any::TypeId::of::<$ty>(),
                    shape: $crate::metadata::Shape::Enum($crate::metadata::EnumShape {
                        names: NAMES,
                        name_of,
                        value_of,
                        from_name,
                        from_value,
                    }),
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq)]
    struct Sample {
        id: i32,
        label: String,
    }
    json_record!(Sample { id, label as "displayLabel" });

    #[derive(Debug, Default, Clone, Copy, PartialEq)]
    enum Mode {
        #[default]
        Off,
        On,
    }
    json_enum!(Mode { Off, On });

    #[test]
    fn record_properties_in_declaration_order() {
        let meta = Sample::describe();
        match &meta.shape {
            Shape::Record(record) => {
                let names: Vec<_> = record.properties.iter().map(|p| p.name).collect();
                assert_eq!(names, vec!["id", "displayLabel"]);
            }
            _ => panic!("expected a record shape"),
        }
    }

    #[test]
    fn record_accessors_reach_fields() {
        let meta = Sample::describe();
        let mut sample = Sample {
            id: 7,
            label: "x".to_string(),
        };
        let Shape::Record(record) = &meta.shape else {
            panic!("expected a record shape");
        };
        let id = (record.properties[0].get)(&sample);
        assert_eq!(*id.downcast_ref::<i32>().unwrap(), 7);
        let label = (record.properties[1].get_mut)(&mut sample);
        *label.downcast_mut::<String>().unwrap() = "y".to_string();
        assert_eq!(sample.label, "y");
    }

    #[test]
    fn enum_conversions() {
        let meta = Mode::describe();
        let Shape::Enum(shape) = &meta.shape else {
            panic!("expected an enum shape");
        };
        let value = Mode::On;
        assert_eq!((shape.name_of)(&value), Some("On"));
        assert_eq!((shape.value_of)(&value), Some(1));
        let mut target = Mode::Off;
        assert!((shape.from_name)(&mut target, "On"));
        assert_eq!(target, Mode::On);
        assert!((shape.from_value)(&mut target, 0));
        assert_eq!(target, Mode::Off);
        assert!(!(shape.from_value)(&mut target, 9));
    }

    #[test]
    fn integer_set_rejects_out_of_range() {
        let meta = i8::describe();
        let Shape::Scalar(ScalarShape::Int { set, .. }) = meta.shape else {
            panic!("expected an integer scalar");
        };
        let mut target = 0i8;
        assert!(set(&mut target, 100));
        assert_eq!(target, 100);
        assert!(!set(&mut target, 1000));
    }
}
