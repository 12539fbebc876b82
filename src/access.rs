//! Default-shielded accessors over borrowed JSON nodes.
//!
//! An accessor wraps exactly one node and is rebuilt on every hop; it owns
//! nothing and caches nothing. Lookups by key (mappings) or index
//! (sequences) share one family of operations through [`Access`]:
//!
//! | call              | missing      | wrong type        | coercion |
//! |-------------------|--------------|-------------------|----------|
//! | `ensure`          | default      | default           | no       |
//! | `ensure_cast`     | default      | coerced / default | yes      |
//! | `optional_get`    | `None`       | `None`            | no       |
//! | `optional_cast`   | `None`       | coerced / `None`  | yes      |
//! | `assert_get`      | `Err`        | `Err`             | no       |
pub mod iter;

use std::borrow::Cow;
use std::fmt;

use once_cell::sync::Lazy;
use serde_json::{Map, Value};

use crate::coerce::coerce;
use crate::error::AccessError;
use crate::path::Chain;
use crate::tag::TypeTag;

pub use iter::Elements;

static EMPTY_MAPPING: Lazy<Value> = Lazy::new(|| Value::Object(Map::new()));
static EMPTY_SEQUENCE: Lazy<Value> = Lazy::new(|| Value::Array(Vec::new()));

// ————————————————————————————————————————————————————————————————————————————
// EXTRACTION TARGETS
// ————————————————————————————————————————————————————————————————————————————

/// A Rust type standing in for one [`TypeTag`].
pub trait Extract<'a>: Sized {
    const TAG: TypeTag;

    /// Succeeds only when the node already carries `TAG`.
    fn exact(value: &'a Value) -> Option<Self>;

    /// Converts the output of the coercion matrix.
    fn coerced(value: Cow<'a, Value>) -> Option<Self>;

    /// The per-tag default.
    fn fallback() -> Self;

    fn cast(value: &'a Value) -> Option<Self> {
        coerce(value, Self::TAG).and_then(Self::coerced)
    }
}

impl<'a> Extract<'a> for String {
    const TAG: TypeTag = TypeTag::String;

    fn exact(value: &'a Value) -> Option<Self> {
        value.as_str().map(str::to_owned)
    }
    fn coerced(value: Cow<'a, Value>) -> Option<Self> {
        match value.into_owned() {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
    fn fallback() -> Self {
        String::new()
    }
}

impl<'a> Extract<'a> for i64 {
    const TAG: TypeTag = TypeTag::Integer;

    fn exact(value: &'a Value) -> Option<Self> {
        value.as_i64()
    }
    fn coerced(value: Cow<'a, Value>) -> Option<Self> {
        value.as_i64()
    }
    fn fallback() -> Self {
        0
    }
}

impl<'a> Extract<'a> for f64 {
    const TAG: TypeTag = TypeTag::Float;

    fn exact(value: &'a Value) -> Option<Self> {
        // `as_f64` happily widens integers; the exact family must not.
        if TypeTag::Float.matches(value) { value.as_f64() } else { None }
    }
    fn coerced(value: Cow<'a, Value>) -> Option<Self> {
        value.as_f64()
    }
    fn fallback() -> Self {
        0.0
    }
}

impl<'a> Extract<'a> for bool {
    const TAG: TypeTag = TypeTag::Boolean;

    fn exact(value: &'a Value) -> Option<Self> {
        value.as_bool()
    }
    fn coerced(value: Cow<'a, Value>) -> Option<Self> {
        value.as_bool()
    }
    fn fallback() -> Self {
        false
    }
}

impl<'a> Extract<'a> for MapAccess<'a> {
    const TAG: TypeTag = TypeTag::Mapping;

    fn exact(value: &'a Value) -> Option<Self> {
        MapAccess::from_value(value)
    }
    fn coerced(value: Cow<'a, Value>) -> Option<Self> {
        match value {
            Cow::Borrowed(v) => Self::exact(v),
            Cow::Owned(_) => None,
        }
    }
    fn fallback() -> Self {
        MapAccess(&EMPTY_MAPPING)
    }
}

impl<'a> Extract<'a> for SeqAccess<'a> {
    const TAG: TypeTag = TypeTag::Sequence;

    fn exact(value: &'a Value) -> Option<Self> {
        SeqAccess::from_value(value)
    }
    fn coerced(value: Cow<'a, Value>) -> Option<Self> {
        match value {
            Cow::Borrowed(v) => Self::exact(v),
            Cow::Owned(_) => None,
        }
    }
    fn fallback() -> Self {
        SeqAccess(&EMPTY_SEQUENCE)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// ACCESS FAMILY
// ————————————————————————————————————————————————————————————————————————————

pub trait Access<'a> {
    type Key<'k>: Copy;

    /// Raw lookup; a key of the wrong kind is just a miss.
    fn get(&self, key: Self::Key<'_>) -> Option<&'a Value>;

    /// Human-readable location of `key`, used in error reports.
    fn locate(key: Self::Key<'_>) -> String;

    fn ensure<T: Extract<'a>>(&self, key: Self::Key<'_>) -> T {
        self.ensure_or(key, T::fallback())
    }

    fn ensure_or<T: Extract<'a>>(&self, key: Self::Key<'_>, default: T) -> T {
        self.optional_get(key).unwrap_or(default)
    }

    fn ensure_cast<T: Extract<'a>>(&self, key: Self::Key<'_>) -> T {
        self.ensure_cast_or(key, T::fallback())
    }

    fn ensure_cast_or<T: Extract<'a>>(&self, key: Self::Key<'_>, default: T) -> T {
        self.optional_cast(key).unwrap_or(default)
    }

    fn optional_get<T: Extract<'a>>(&self, key: Self::Key<'_>) -> Option<T> {
        self.get(key).and_then(T::exact)
    }

    fn try_get<T: Extract<'a>>(&self, key: Self::Key<'_>) -> Option<T> {
        self.optional_get(key)
    }

    fn optional_cast<T: Extract<'a>>(&self, key: Self::Key<'_>) -> Option<T> {
        self.get(key).and_then(T::cast)
    }

    fn assert_get<T: Extract<'a>>(&self, key: Self::Key<'_>) -> Result<T, AccessError> {
        let found = self.get(key);
        found
            .and_then(T::exact)
            .ok_or_else(|| AccessError::assertion(Self::locate(key), T::TAG, found.map(TypeTag::of)))
    }

    fn get_tagged(&self, key: Self::Key<'_>, tag: TypeTag) -> Option<&'a Value> {
        self.get(key).filter(|v| tag.matches(v))
    }

    fn cast_tagged(&self, key: Self::Key<'_>, tag: TypeTag) -> Option<Cow<'a, Value>> {
        self.get(key).and_then(|v| coerce(v, tag))
    }

    fn ensure_cast_value(&self, key: Self::Key<'_>, tag: TypeTag) -> Value {
        self.cast_tagged(key, tag)
            .map(Cow::into_owned)
            .unwrap_or_else(|| tag.default_value())
    }

    fn chain(&self) -> Chain<'a>;
}

// ————————————————————————————————————————————————————————————————————————————
// MAPPING
// ————————————————————————————————————————————————————————————————————————————

/// Accessor over a mapping node.
#[derive(Clone, Copy)]
pub struct MapAccess<'a>(&'a Value);

impl<'a> MapAccess<'a> {
    /// Wraps `value`, or an empty mapping when `value` is anything else.
    pub fn of(value: &'a Value) -> Self {
        Self::from_value(value).unwrap_or_else(Self::fallback)
    }

    pub fn from_value(value: &'a Value) -> Option<Self> {
        value.is_object().then_some(MapAccess(value))
    }

    pub fn as_map(&self) -> &'a Map<String, Value> {
        match self.0 {
            Value::Object(map) => map,
            _ => unreachable!("MapAccess always wraps a mapping"),
        }
    }

    pub fn as_value(&self) -> &'a Value {
        self.0
    }

    pub fn keys(&self) -> impl Iterator<Item = &'a str> + 'a {
        self.as_map().keys().map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.as_map().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.as_map().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_map().is_empty()
    }

    pub fn to_string_pretty(&self) -> String {
        format!("{:#}", self.0)
    }
}

impl<'a> Access<'a> for MapAccess<'a> {
    type Key<'k> = &'k str;

    fn get(&self, key: &str) -> Option<&'a Value> {
        self.as_map().get(key)
    }

    fn locate(key: &str) -> String {
        key.to_string()
    }

    fn chain(&self) -> Chain<'a> {
        Chain::new(self.0)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// SEQUENCE
// ————————————————————————————————————————————————————————————————————————————

/// Accessor over a sequence node.
#[derive(Clone, Copy)]
pub struct SeqAccess<'a>(&'a Value);

impl<'a> SeqAccess<'a> {
    /// Wraps `value`, or an empty sequence when `value` is anything else.
    pub fn of(value: &'a Value) -> Self {
        Self::from_value(value).unwrap_or_else(Self::fallback)
    }

    pub fn from_value(value: &'a Value) -> Option<Self> {
        value.is_array().then_some(SeqAccess(value))
    }

    pub fn as_slice(&self) -> &'a [Value] {
        match self.0 {
            Value::Array(items) => items,
            _ => unreachable!("SeqAccess always wraps a sequence"),
        }
    }

    pub fn as_value(&self) -> &'a Value {
        self.0
    }

    /// Lazy, restartable walk over the elements, each wrapped in a
    /// [`ValueAccess`].
    pub fn iter(&self) -> Elements<'a> {
        Elements::new(self.as_slice())
    }

    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }

    pub fn to_string_pretty(&self) -> String {
        format!("{:#}", self.0)
    }
}

impl<'a> Access<'a> for SeqAccess<'a> {
    type Key<'k> = usize;

    fn get(&self, index: usize) -> Option<&'a Value> {
        self.as_slice().get(index)
    }

    fn locate(index: usize) -> String {
        format!("[{index}]")
    }

    fn chain(&self) -> Chain<'a> {
        Chain::new(self.0)
    }
}

impl<'a> IntoIterator for SeqAccess<'a> {
    type Item = ValueAccess<'a>;
    type IntoIter = Elements<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// ————————————————————————————————————————————————————————————————————————————
// SINGLE NODE
// ————————————————————————————————————————————————————————————————————————————

/// Accessor over one node with no key in between, as yielded by
/// [`Elements`].
#[derive(Clone, Copy)]
pub struct ValueAccess<'a>(&'a Value);

impl<'a> ValueAccess<'a> {
    pub fn new(value: &'a Value) -> Self {
        ValueAccess(value)
    }

    pub fn as_value(&self) -> &'a Value {
        self.0
    }

    pub fn tag(&self) -> TypeTag {
        TypeTag::of(self.0)
    }

    pub fn ensure<T: Extract<'a>>(&self) -> T {
        self.optional_get().unwrap_or_else(T::fallback)
    }

    pub fn ensure_or<T: Extract<'a>>(&self, default: T) -> T {
        self.optional_get().unwrap_or(default)
    }

    pub fn ensure_cast<T: Extract<'a>>(&self) -> T {
        self.optional_cast().unwrap_or_else(T::fallback)
    }

    pub fn ensure_cast_or<T: Extract<'a>>(&self, default: T) -> T {
        self.optional_cast().unwrap_or(default)
    }

    pub fn optional_get<T: Extract<'a>>(&self) -> Option<T> {
        T::exact(self.0)
    }

    pub fn optional_cast<T: Extract<'a>>(&self) -> Option<T> {
        T::cast(self.0)
    }

    pub fn assert_get<T: Extract<'a>>(&self) -> Result<T, AccessError> {
        T::exact(self.0).ok_or_else(|| AccessError::assertion("(value)", T::TAG, Some(self.tag())))
    }

    pub fn chain(&self) -> Chain<'a> {
        Chain::new(self.0)
    }
}

macro_rules! display_as_json {
    ($($ty:ident),*) => {$(
        impl fmt::Display for $ty<'_> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(self.0, f)
            }
        }

        impl fmt::Debug for $ty<'_> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_tuple(stringify!($ty)).field(self.0).finish()
            }
        }

        impl PartialEq<Value> for $ty<'_> {
            fn eq(&self, other: &Value) -> bool {
                self.0 == other
            }
        }
    )*};
}

display_as_json!(MapAccess, SeqAccess, ValueAccess);

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
