//! Optional-chaining paths: `a.b[0]`, `cat?.name`, `list[3]?`.
//!
//! A trailing `?` marks the step it follows as optional. When an optional
//! step finds nothing (or finds `null`), resolution stops quietly with no
//! value; when a required step finds nothing, strict resolution fails.
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::access::Extract;
use crate::coerce::coerce;
use crate::error::{AccessError, PathSyntaxError};
use crate::tag::TypeTag;

// ————————————————————————————————————————————————————————————————————————————
// SEGMENTS
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Key(String),
    Index(usize),
    OptionalKey(String),
    OptionalIndex(usize),
}

impl Segment {
    pub fn is_optional(&self) -> bool {
        matches!(self, Segment::OptionalKey(_) | Segment::OptionalIndex(_))
    }

    /// Indexing a mapping or keying a sequence is a plain miss.
    pub fn lookup<'a>(&self, value: &'a Value) -> Option<&'a Value> {
        match self {
            Segment::Key(key) | Segment::OptionalKey(key) => value.as_object()?.get(key),
            Segment::Index(i) | Segment::OptionalIndex(i) => value.as_array()?.get(*i),
        }
    }

    fn write(&self, f: &mut fmt::Formatter<'_>, first: bool) -> fmt::Result {
        match self {
            Segment::Key(key) | Segment::OptionalKey(key) => {
                if !first {
                    f.write_str(".")?;
                }
                f.write_str(key)?;
            }
            Segment::Index(i) | Segment::OptionalIndex(i) => write!(f, "[{i}]")?,
        }
        if self.is_optional() {
            f.write_str("?")?;
        }
        Ok(())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// PATH
// ————————————————————————————————————————————————————————————————————————————

/// An immutable, parsed sequence of segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Path {
    segments: Vec<Segment>,
}

static STEP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(?P<dot>\.)?\[(?P<index>[^\]]*)\]|(?P<sep>\.)?(?P<key>[^.\[\]?]+))(?P<opt>\?)?")
        .expect("step pattern is valid")
});

impl Path {
    pub fn parse(text: &str) -> Result<Self, PathSyntaxError> {
        let fail = |offset: usize, reason: &'static str| PathSyntaxError {
            path: text.to_string(),
            offset,
            reason,
        };
        if text.is_empty() {
            return Err(fail(0, "empty path"));
        }

        let mut segments = Vec::new();
        let mut offset = 0;
        while offset < text.len() {
            let rest = &text[offset..];
            let caps = STEP.captures(rest).ok_or_else(|| fail(offset, diagnose(rest)))?;
            let first = segments.is_empty();
            let optional = caps.name("opt").is_some();

            let segment = if let Some(raw) = caps.name("index") {
                if first && caps.name("dot").is_some() {
                    return Err(fail(offset, "empty segment"));
                }
                let index = raw
                    .as_str()
                    .parse::<usize>()
                    .map_err(|_| fail(offset, "index must be a non-negative integer"))?;
                if optional { Segment::OptionalIndex(index) } else { Segment::Index(index) }
            } else {
                let has_sep = caps.name("sep").is_some();
                if first && has_sep {
                    return Err(fail(offset, "empty segment"));
                }
                if !first && !has_sep {
                    return Err(fail(offset, "expected `.` or `[` between segments"));
                }
                let key = caps.name("key").map_or("", |m| m.as_str()).to_string();
                if optional { Segment::OptionalKey(key) } else { Segment::Key(key) }
            };

            segments.push(segment);
            offset += caps.get(0).map_or(rest.len(), |m| m.end());
        }
        Ok(Path { segments })
    }

    pub(crate) fn from_segments(segments: Vec<Segment>) -> Self {
        Path { segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Rendering of the first `n` segments.
    pub fn prefix(&self, n: usize) -> String {
        Path { segments: self.segments[..n.min(self.segments.len())].to_vec() }.to_string()
    }
}

fn diagnose(rest: &str) -> &'static str {
    let body = rest.strip_prefix('.').unwrap_or(rest);
    match body.chars().next() {
        None | Some('.') | Some('?') if rest.starts_with('.') => "empty segment",
        Some('[') => "unmatched `[`",
        Some(']') => "unmatched `]`",
        Some('?') => "misplaced `?`",
        _ => "unexpected character",
    }
}

impl FromStr for Path {
    type Err = PathSyntaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Path::parse(s)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            segment.write(f, i == 0)?;
        }
        Ok(())
    }
}

/// Anything a chain can be walked along: path text or a parsed [`Path`].
pub trait AsPath {
    fn as_path(&self) -> Result<Cow<'_, Path>, PathSyntaxError>;
}

impl AsPath for str {
    fn as_path(&self) -> Result<Cow<'_, Path>, PathSyntaxError> {
        Path::parse(self).map(Cow::Owned)
    }
}

impl AsPath for String {
    fn as_path(&self) -> Result<Cow<'_, Path>, PathSyntaxError> {
        self.as_str().as_path()
    }
}

impl AsPath for Path {
    fn as_path(&self) -> Result<Cow<'_, Path>, PathSyntaxError> {
        Ok(Cow::Borrowed(self))
    }
}

// ————————————————————————————————————————————————————————————————————————————
// CHAIN
// ————————————————————————————————————————————————————————————————————————————

enum Walk<'a> {
    Found(&'a Value),
    /// An optional step came up empty.
    Skipped,
    /// A required step came up empty; carries the failing segment's index.
    Broken(usize),
}

/// Path-based access over the node an accessor wraps.
#[derive(Clone, Copy, Debug)]
pub struct Chain<'a> {
    root: &'a Value,
}

impl<'a> Chain<'a> {
    pub fn new(root: &'a Value) -> Self {
        Self { root }
    }

    fn walk(&self, path: &Path) -> Walk<'a> {
        let mut current = self.root;
        for (i, segment) in path.segments().iter().enumerate() {
            match segment.lookup(current) {
                Some(next) if segment.is_optional() && next.is_null() => {
                    tracing::trace!(%path, step = i, "optional step is null");
                    return Walk::Skipped;
                }
                Some(next) => current = next,
                None if segment.is_optional() => {
                    tracing::trace!(%path, step = i, "optional step missing");
                    return Walk::Skipped;
                }
                None => {
                    tracing::trace!(%path, step = i, "required step missing");
                    return Walk::Broken(i);
                }
            }
        }
        Walk::Found(current)
    }

    /// Strict resolution: `Ok(None)` only when an optional step stopped the
    /// walk; a missing required step is an [`AccessError::Absent`].
    pub fn resolve<P: AsPath + ?Sized>(&self, path: &P) -> Result<Option<&'a Value>, AccessError> {
        let path = path.as_path()?;
        match self.walk(&path) {
            Walk::Found(value) => Ok(Some(value)),
            Walk::Skipped => Ok(None),
            Walk::Broken(i) => Err(AccessError::Absent { at: path.prefix(i + 1) }),
        }
    }

    /// Lenient resolution: every failure, malformed paths included, is `None`.
    pub fn find<P: AsPath + ?Sized>(&self, path: &P) -> Option<&'a Value> {
        match path.as_path() {
            Ok(path) => match self.walk(&path) {
                Walk::Found(value) => Some(value),
                Walk::Skipped | Walk::Broken(_) => None,
            },
            Err(error) => {
                tracing::warn!(%error, "ignoring malformed path");
                None
            }
        }
    }

    pub fn ensure<T: Extract<'a>, P: AsPath + ?Sized>(&self, path: &P) -> T {
        self.optional_get(path).unwrap_or_else(T::fallback)
    }

    pub fn ensure_or<T: Extract<'a>, P: AsPath + ?Sized>(&self, path: &P, default: T) -> T {
        self.optional_get(path).unwrap_or(default)
    }

    pub fn ensure_cast<T: Extract<'a>, P: AsPath + ?Sized>(&self, path: &P) -> T {
        self.optional_cast(path).unwrap_or_else(T::fallback)
    }

    pub fn ensure_cast_or<T: Extract<'a>, P: AsPath + ?Sized>(&self, path: &P, default: T) -> T {
        self.optional_cast(path).unwrap_or(default)
    }

    pub fn ensure_cast_value<P: AsPath + ?Sized>(&self, path: &P, tag: TypeTag) -> Value {
        self.find(path)
            .and_then(|v| coerce(v, tag))
            .map(Cow::into_owned)
            .unwrap_or_else(|| tag.default_value())
    }

    pub fn optional_get<T: Extract<'a>, P: AsPath + ?Sized>(&self, path: &P) -> Option<T> {
        self.find(path).and_then(T::exact)
    }

    pub fn try_get<T: Extract<'a>, P: AsPath + ?Sized>(&self, path: &P) -> Option<T> {
        self.optional_get(path)
    }

    pub fn optional_cast<T: Extract<'a>, P: AsPath + ?Sized>(&self, path: &P) -> Option<T> {
        self.find(path).and_then(T::cast)
    }

    /// Like [`Chain::resolve`], but an optional short-circuit or a type
    /// mismatch at the end is an assertion failure too.
    pub fn assert_get<T: Extract<'a>, P: AsPath + ?Sized>(&self, path: &P) -> Result<T, AccessError> {
        let parsed = path.as_path()?;
        let found = self.resolve(&*parsed)?;
        found
            .and_then(T::exact)
            .ok_or_else(|| AccessError::assertion(parsed.to_string(), T::TAG, found.map(TypeTag::of)))
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
