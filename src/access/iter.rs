use std::iter::FusedIterator;
use std::slice;

use serde_json::Value;

use super::{Extract, ValueAccess};
use crate::error::AccessError;

/// Elements of a sequence, one [`ValueAccess`] at a time.
///
/// Cloning restarts nothing and copies nothing but a slice cursor, so a
/// walk can be replayed as often as needed.
#[derive(Clone, Debug)]
pub struct Elements<'a> {
    inner: slice::Iter<'a, Value>,
}

impl<'a> Elements<'a> {
    pub(crate) fn new(items: &'a [Value]) -> Self {
        Self { inner: items.iter() }
    }

    /// Elements that coerce to `T`; the rest are skipped.
    pub fn ensure_cast<T: Extract<'a>>(self) -> impl Iterator<Item = T> + Clone {
        self.filter_map(|el| el.optional_cast::<T>())
    }

    /// Every element, with mismatches replaced by the default of `T`.
    pub fn ensure<T: Extract<'a>>(self) -> impl Iterator<Item = T> + Clone {
        self.map(|el| el.ensure::<T>())
    }

    pub fn optional_get<T: Extract<'a>>(self) -> impl Iterator<Item = Option<T>> + Clone {
        self.map(|el| el.optional_get::<T>())
    }

    pub fn optional_cast<T: Extract<'a>>(self) -> impl Iterator<Item = Option<T>> + Clone {
        self.map(|el| el.optional_cast::<T>())
    }

    /// Collects every element as `T`, failing on the first one that is not.
    pub fn assert_get<T: Extract<'a>>(self) -> Result<Vec<T>, AccessError> {
        self.enumerate()
            .map(|(i, el)| {
                el.assert_get::<T>().map_err(|err| match err {
                    AccessError::Assertion { expected, found, .. } => {
                        AccessError::assertion(format!("[{i}]"), expected, found)
                    }
                    other => other,
                })
            })
            .collect()
    }
}

impl<'a> Iterator for Elements<'a> {
    type Item = ValueAccess<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(ValueAccess::new)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl DoubleEndedIterator for Elements<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(ValueAccess::new)
    }
}

impl ExactSizeIterator for Elements<'_> {}

impl FusedIterator for Elements<'_> {}
