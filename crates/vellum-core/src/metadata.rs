//! Type descriptors and the per-type metadata cache.
//!
//! Every mappable type is described once by a [`TypeMetadata`] whose
//! [`Shape`] tells the mapper how to traverse it. Shapes carry monomorphized
//! function pointers generated by the `JsonType` implementations in
//! `reflect`; the pointers operate on type-erased `&dyn Any` instances, so
//! the mapper itself stays non-generic.
//!
//! Descriptors are immutable after construction and memoized per `TypeId` in
//! a [`MetadataCache`]. Two threads describing the same type concurrently
//! may both build a descriptor; the first insert wins and both observe
//! equivalent metadata, so the race is benign. Entries are never evicted.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::error::Result;
use crate::reflect::JsonType;

/// Lazy reference to another type's descriptor, resolved through the cache
/// at traversal time so self-referential types do not recurse at
/// description time.
pub type MetaFn = fn(&MetadataCache) -> Arc<TypeMetadata>;

/// Descriptor for one mappable type.
pub struct TypeMetadata {
    pub type_name: &'static str,
    pub type_id: TypeId,
    pub shape: Shape,
}

/// How the mapper traverses a type.
pub enum Shape {
    Scalar(ScalarShape),
    /// The type is `JsonValue` itself; the mapper downcasts directly.
    Dynamic,
    /// Raw bytes, represented in JSON as a base64 string.
    Bytes(BytesShape),
    List(ListShape),
    Dictionary(DictionaryShape),
    Record(RecordShape),
    Enum(EnumShape),
    Optional(OptionalShape),
    /// Transparent indirection (`Box<T>`); the JSON representation is the
    /// inner type's.
    Boxed(BoxedShape),
}

/// Accessors for a primitive value. Integer widths funnel through `i64`
/// (`u64` for the unsigned family); `set` reports range failures so the
/// mapper can surface a conversion error naming the value.
pub enum ScalarShape {
    Bool {
        get: fn(&dyn Any) -> bool,
        set: fn(&mut dyn Any, bool),
    },
    Int {
        get: fn(&dyn Any) -> i64,
        set: fn(&mut dyn Any, i64) -> bool,
    },
    UInt {
        get: fn(&dyn Any) -> u64,
        set: fn(&mut dyn Any, u64) -> bool,
    },
    Double {
        get: fn(&dyn Any) -> f64,
        set: fn(&mut dyn Any, f64) -> bool,
    },
    Str {
        get: fn(&dyn Any) -> &str,
        set: fn(&mut dyn Any, String),
    },
}

impl ScalarShape {
    /// The JSON-side name of this scalar family, for error messages.
    pub fn describe(&self) -> &'static str {
        match self {
            ScalarShape::Bool { .. } => "boolean",
            ScalarShape::Int { .. } | ScalarShape::UInt { .. } => "integer",
            ScalarShape::Double { .. } => "double",
            ScalarShape::Str { .. } => "string",
        }
    }
}

pub struct BytesShape {
    pub get: fn(&dyn Any) -> &[u8],
    pub set: fn(&mut dyn Any, Vec<u8>),
}

/// Sequence accessors shared by `Vec<T>` and `[T; N]`. Reading fills slots
/// in order: `slot(i)` returns the `i`-th element (growing a `Vec`,
/// indexing into an array) or `None` past a fixed length.
pub struct ListShape {
    pub element: MetaFn,
    /// `Some(n)` for `[T; N]`; reading must supply exactly `n` elements.
    pub fixed_len: Option<usize>,
    pub len: fn(&dyn Any) -> usize,
    pub get: fn(&dyn Any, usize) -> &dyn Any,
    /// Reset before a fresh read. No-op for fixed arrays.
    pub clear: fn(&mut dyn Any),
    pub slot: fn(&mut dyn Any, usize) -> Option<&mut dyn Any>,
}

/// String-keyed map accessors (`HashMap<String, T>`, `BTreeMap<String, T>`).
pub struct DictionaryShape {
    pub value: MetaFn,
    pub visit: fn(&dyn Any, &mut dyn FnMut(&str, &dyn Any) -> Result<()>) -> Result<()>,
    pub clear: fn(&mut dyn Any),
    /// Insert a default value under the key and return its slot.
    pub insert: fn(&mut dyn Any, String) -> &mut dyn Any,
}

pub struct RecordShape {
    /// Declaration order; serialization emits properties in this order.
    pub properties: Vec<PropertyMetadata>,
}

pub struct PropertyMetadata {
    pub name: &'static str,
    pub type_name: &'static str,
    pub metadata: MetaFn,
    pub get: fn(&dyn Any) -> &dyn Any,
    pub get_mut: fn(&mut dyn Any) -> &mut dyn Any,
}

/// Fieldless enums: a name table in declaration order plus conversions in
/// both directions. The numeric value of a variant is its ordinal.
pub struct EnumShape {
    pub names: &'static [&'static str],
    pub name_of: fn(&dyn Any) -> Option<&'static str>,
    pub value_of: fn(&dyn Any) -> Option<i64>,
    pub from_name: fn(&mut dyn Any, &str) -> bool,
    pub from_value: fn(&mut dyn Any, i64) -> bool,
}

pub struct BoxedShape {
    pub inner: MetaFn,
    pub get: fn(&dyn Any) -> &dyn Any,
    pub get_mut: fn(&mut dyn Any) -> &mut dyn Any,
}

pub struct OptionalShape {
    pub inner: MetaFn,
    pub get: fn(&dyn Any) -> Option<&dyn Any>,
    pub set_none: fn(&mut dyn Any),
    /// Make the option `Some(Default::default())` and return the inner slot.
    pub insert_default: fn(&mut dyn Any) -> &mut dyn Any,
}

/// Memoized `TypeId -> Arc<TypeMetadata>` map. Owned by a `Mapper`; shapes
/// hold [`MetaFn`] pointers back into it for nested lookups.
#[derive(Default)]
pub struct MetadataCache {
    entries: RwLock<HashMap<TypeId, Arc<TypeMetadata>>>,
}

impl MetadataCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Descriptor for `T`, building and caching it on first use.
    pub fn of<T: JsonType>(&self) -> Arc<TypeMetadata> {
        let id = TypeId::of::<T>();
        {
            let entries = match self.entries.read() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            if let Some(found) = entries.get(&id) {
                return found.clone();
            }
        }
        // Built outside the lock; a concurrent builder's insert wins.
        let built = Arc::new(T::describe());
        let mut entries = match self.entries.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.entry(id).or_insert(built).clone()
    }

    /// Number of described types, for diagnostics.
    pub fn len(&self) -> usize {
        match self.entries.read() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Downcast helpers for shape function pointers. The mapper only invokes a
/// shape's accessors with the instance the descriptor was built for, so a
/// failed downcast is an internal invariant violation, not a user error.
pub fn concrete<T: Any>(value: &dyn Any) -> &T {
    match value.downcast_ref::<T>() {
        Some(v) => v,
        None => panic!(
            "metadata accessor applied to a value that is not {}",
            std::any::type_name::<T>()
        ),
    }
}

pub fn concrete_mut<T: Any>(value: &mut dyn Any) -> &mut T {
    match value.downcast_mut::<T>() {
        Some(v) => v,
        None => panic!(
            "metadata accessor applied to a value that is not {}",
            std::any::type_name::<T>()
        ),
    }
}

/// Resolve a record member's descriptor from a field-access probe. Never
/// called; it exists so `json_record!` can name the member type without the
/// caller spelling it out.
pub fn member_meta<T: 'static, M: JsonType>(_probe: fn(&T) -> &M) -> MetaFn {
    MetadataCache::of::<M>
}

/// Companion to [`member_meta`] for the member's display name.
pub fn member_type_name<T: 'static, M: JsonType>(_probe: fn(&T) -> &M) -> &'static str {
    std::any::type_name::<M>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_returns_same_descriptor() {
        let cache = MetadataCache::new();
        let a = cache.of::<i32>();
        let b = cache.of::<i32>();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn concurrent_describe_converges() {
        let cache = Arc::new(MetadataCache::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                std::thread::spawn(move || cache.of::<Vec<String>>())
            })
            .collect();
        let first = cache.of::<Vec<String>>();
        for handle in handles {
            let got = handle.join().unwrap();
            assert!(Arc::ptr_eq(&got, &first));
        }
        assert_eq!(cache.len(), 1);
    }
}
