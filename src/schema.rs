//! Composable validators for loosely-typed trees.
//!
//! A [`Schema`] is built once from constructors and modifiers, then applied
//! to any number of values. Modifiers consume the receiver and hand back a
//! new node; children sit behind `Arc`, so cloning a base schema to derive
//! variants is cheap and the variants never see each other's changes.
//!
//! ```
//! use json_shield::schema::{Rule, Schema};
//! use serde_json::json;
//!
//! let person = Schema::object([
//!     ("name", Schema::string().min(1)),
//!     ("age", Schema::integer().min(0).optional()),
//! ]);
//! assert!(person.valid(&json!({"name": "Ada"})));
//!
//! let err = person.error(&json!({"name": "Ada", "age": -1})).unwrap();
//! assert_eq!((err.path(), err.rule()), ("age", Rule::Min));
//! ```
pub mod error;
mod validate;

use std::sync::Arc;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::tag::TypeTag;

pub use error::{Rule, ValidationError};

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9_.+-]+@[a-zA-Z0-9-]+\.[a-zA-Z0-9-.]+$").expect("email pattern is valid")
});

/// A length or magnitude limit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bound {
    pub limit: f64,
    pub inclusive: bool,
}

/// Numbers usable as a bound. Every width converts to `f64`; integers past
/// 2^53 lose precision.
pub trait Limit: Copy {
    fn to_limit(self) -> f64;
}

macro_rules! limit_as_f64 {
    ($($ty:ty),*) => {$(
        impl Limit for $ty {
            fn to_limit(self) -> f64 {
                self as f64
            }
        }
    )*};
}

limit_as_f64!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

#[derive(Debug, Clone)]
pub(crate) enum Kind {
    Any,
    String { pattern: Option<Regex> },
    Integer,
    Float,
    Boolean,
    Object { shape: Arc<IndexMap<String, Schema>>, additional: bool },
    Array { element: Arc<Schema> },
    Literal(Arc<Value>),
}

impl Kind {
    fn tag(&self) -> Option<TypeTag> {
        match self {
            Kind::String { .. } => Some(TypeTag::String),
            Kind::Integer => Some(TypeTag::Integer),
            Kind::Float => Some(TypeTag::Float),
            Kind::Boolean => Some(TypeTag::Boolean),
            Kind::Object { .. } => Some(TypeTag::Mapping),
            Kind::Array { .. } => Some(TypeTag::Sequence),
            Kind::Any | Kind::Literal(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Rules {
    min: Option<Bound>,
    max: Option<Bound>,
    allowed: Option<Arc<[Value]>>,
    coerce: bool,
    optional: bool,
    nullable: bool,
    default: Option<Arc<Value>>,
}

#[derive(Debug, Clone)]
pub struct Schema {
    kind: Kind,
    rules: Rules,
}

// ————————————————————————————————————————————————————————————————————————————
// CONSTRUCTORS
// ————————————————————————————————————————————————————————————————————————————

impl Schema {
    fn of(kind: Kind) -> Self {
        Self { kind, rules: Rules::default() }
    }

    pub fn string() -> Self {
        Self::of(Kind::String { pattern: None })
    }

    pub fn integer() -> Self {
        Self::of(Kind::Integer)
    }

    /// Accepts floats and, by widening, integers.
    pub fn float() -> Self {
        Self::of(Kind::Float)
    }

    pub fn boolean() -> Self {
        Self::of(Kind::Boolean)
    }

    /// Accepts every value.
    pub fn any() -> Self {
        Self::of(Kind::Any)
    }

    /// A mapping checked field by field, in the order given here. Values that
    /// are plain JSON rather than schemas become literals.
    pub fn object<I, K, S>(shape: I) -> Self
    where
        I: IntoIterator<Item = (K, S)>,
        K: Into<String>,
        S: Into<Schema>,
    {
        let shape = shape.into_iter().map(|(k, s)| (k.into(), s.into())).collect();
        Self::of(Kind::Object { shape: Arc::new(shape), additional: false })
    }

    pub fn array(element: impl Into<Schema>) -> Self {
        Self::of(Kind::Array { element: Arc::new(element.into()) })
    }

    /// Schema by example: the input must equal `example`, recursively.
    pub fn literal(example: impl Into<Value>) -> Self {
        Self::of(Kind::Literal(Arc::new(example.into())))
    }
}

impl From<Value> for Schema {
    fn from(example: Value) -> Self {
        Schema::literal(example)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// MODIFIERS
// ————————————————————————————————————————————————————————————————————————————

impl Schema {
    /// Inclusive lower bound on length (strings, arrays) or magnitude
    /// (numbers). Other kinds ignore it.
    #[must_use]
    pub fn min(mut self, limit: impl Limit) -> Self {
        self.rules.min = Some(Bound { limit: limit.to_limit(), inclusive: true });
        self
    }

    #[must_use]
    pub fn min_exclusive(mut self, limit: impl Limit) -> Self {
        self.rules.min = Some(Bound { limit: limit.to_limit(), inclusive: false });
        self
    }

    #[must_use]
    pub fn max(mut self, limit: impl Limit) -> Self {
        self.rules.max = Some(Bound { limit: limit.to_limit(), inclusive: true });
        self
    }

    #[must_use]
    pub fn max_exclusive(mut self, limit: impl Limit) -> Self {
        self.rules.max = Some(Bound { limit: limit.to_limit(), inclusive: false });
        self
    }

    /// The value must equal one of `values`.
    #[must_use]
    pub fn enum_values<I>(mut self, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.rules.allowed = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Run the coercion matrix before the type check.
    #[must_use]
    pub fn coerce(mut self) -> Self {
        self.rules.coerce = true;
        self
    }

    /// May be absent from the enclosing object; implies [`Schema::nullable`].
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.rules.optional = true;
        self.rules.nullable = true;
        self
    }

    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.rules.nullable = true;
        self
    }

    /// Substituted by [`Schema::parse`] for `null` or an absent optional field.
    #[must_use]
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.rules.default = Some(Arc::new(value.into()));
        self.rules.nullable = true;
        self
    }

    /// Strings only: the value must match `pattern` somewhere.
    pub fn regex(self, pattern: &str) -> Result<Self, regex::Error> {
        Ok(self.pattern(Regex::new(pattern)?))
    }

    #[must_use]
    pub fn pattern(mut self, pattern: Regex) -> Self {
        if let Kind::String { pattern: slot } = &mut self.kind {
            *slot = Some(pattern);
        }
        self
    }

    #[must_use]
    pub fn email(self) -> Self {
        self.pattern(EMAIL.clone())
    }

    /// Objects only: keys outside the shape are accepted.
    #[must_use]
    pub fn with_additional_properties(self) -> Self {
        self.additional_properties(true)
    }

    #[must_use]
    pub fn no_additional_properties(self) -> Self {
        self.additional_properties(false)
    }

    fn additional_properties(mut self, allow: bool) -> Self {
        if let Kind::Object { additional, .. } = &mut self.kind {
            *additional = allow;
        }
        self
    }
}

// ————————————————————————————————————————————————————————————————————————————
// QUERIES
// ————————————————————————————————————————————————————————————————————————————

impl Schema {
    /// The first failure in a depth-first, declaration-ordered walk, if any.
    pub fn error(&self, value: &Value) -> Option<ValidationError> {
        self.check(value).err()
    }

    pub fn valid(&self, value: &Value) -> bool {
        self.error(value).is_none()
    }

    /// Validates and returns the value with coercions and defaults applied.
    pub fn parse(&self, value: &Value) -> Result<Value, ValidationError> {
        self.check(value).map(|v| v.into_owned())
    }

    /// The tag this node checks for; `None` for literals and `any`.
    pub fn tag(&self) -> Option<TypeTag> {
        self.kind.tag()
    }

    pub fn is_optional(&self) -> bool {
        self.rules.optional
    }

    pub fn is_nullable(&self) -> bool {
        self.rules.nullable
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "name": "John",
            "age": 30,
            "cars": [
                {"model": "BMW 230", "mpg": 27.5},
                {"model": "Ford Edge", "mpg": 24.1}
            ]
        })
    }

    fn car() -> Schema {
        Schema::object([("model", Schema::string()), ("mpg", Schema::float())])
    }

    #[test]
    fn nested_shapes_pass() {
        let schema = Schema::object([
            ("name", Schema::string()),
            ("age", Schema::integer()),
            ("cars", Schema::array(car()).min_exclusive(1).max(2)),
        ]);
        assert_eq!(schema.error(&sample()), None);
    }

    #[test]
    fn loosened_shapes_pass() {
        let schema = Schema::object([
            ("name", Schema::string()),
            ("age", Schema::string().coerce()),
            ("dogs", Schema::array(Schema::string()).min(1).optional()),
        ])
        .with_additional_properties();
        assert_eq!(schema.error(&sample()), None);
    }

    #[test]
    fn first_declared_failure_wins() {
        let schema = Schema::object([
            ("name", Schema::string().min(5)),
            ("age", Schema::float()),
            ("cars", Schema::object(Vec::<(String, Schema)>::new())),
        ]);
        let err = schema.error(&sample()).unwrap();
        assert_eq!(err.path(), "name");
        assert_eq!(err.rule(), Rule::Min);
        assert_eq!(err.message(), "expected 4 to be greater than or equal to 5");
        assert_eq!(err.to_string(), "expected 4 to be greater than or equal to 5 at name: min");
    }

    #[test]
    fn bounds_on_numbers() {
        let schema = Schema::object([("x", Schema::integer().min(5))]);
        let err = schema.error(&json!({"x": 3})).unwrap();
        assert_eq!((err.path(), err.rule()), ("x", Rule::Min));
        assert_eq!(schema.error(&json!({"x": 10})), None);

        let open = Schema::integer().min_exclusive(0).max_exclusive(10);
        assert!(!open.valid(&json!(1.0)));
        assert!(!open.valid(&json!(0)));
        assert!(open.valid(&json!(1)));
        assert!(open.valid(&json!(9)));
        assert!(!open.valid(&json!(10)));

        let half_open = Schema::integer().min(0).max_exclusive(10);
        assert!(half_open.valid(&json!(0)));
        assert!(!half_open.valid(&json!(10)));
        assert_eq!(half_open.error(&json!(10)).unwrap().rule(), Rule::Max);
    }

    #[test]
    fn bounds_take_any_numeric_width() {
        let sample = "four";
        let schema = Schema::string().min(1_u8).max(sample.len());
        assert!(schema.valid(&json!("four")));
        assert!(!schema.valid(&json!("fives")));
        assert!(Schema::integer().max(i64::MAX).valid(&json!(i64::MAX)));
        assert!(!Schema::integer().min(10_u64).valid(&json!(9)));
        assert!(Schema::float().max_exclusive(0.5_f32).valid(&json!(0.25)));
    }

    #[test]
    fn bounds_on_lengths_count_characters() {
        let schema = Schema::string().min(2).max(3);
        assert!(schema.valid(&json!("αβγ")));
        assert!(!schema.valid(&json!("α")));
        assert!(!schema.valid(&json!("abcd")));
        let list = Schema::array(Schema::any()).max(1);
        assert_eq!(list.error(&json!([1, 2])).unwrap().rule(), Rule::Max);
    }

    #[test]
    fn optional_fields_may_be_absent_but_not_wrong() {
        let schema = Schema::object([("x", Schema::string().optional())]);
        assert_eq!(schema.error(&json!({})), None);
        assert_eq!(schema.error(&json!({"x": null})), None);
        let err = schema.error(&json!({"x": 5})).unwrap();
        assert_eq!((err.path(), err.rule()), ("x", Rule::Type));
    }

    #[test]
    fn missing_required_fields_are_reported() {
        let schema = Schema::object([("a", Schema::integer()), ("b", Schema::integer())]);
        let err = schema.error(&json!({"a": 1})).unwrap();
        assert_eq!((err.path(), err.rule()), ("b", Rule::Required));
    }

    #[test]
    fn unknown_keys_are_rejected_unless_permitted() {
        let strict = Schema::object([("a", Schema::integer())]);
        let err = strict.error(&json!({"a": 1, "b": 2})).unwrap();
        assert_eq!((err.path(), err.rule()), ("b", Rule::AdditionalProperties));
        assert!(strict.clone().with_additional_properties().valid(&json!({"a": 1, "b": 2})));
        // declared fields are checked before unknown keys
        let err = strict.error(&json!({"b": 2, "a": "x"})).unwrap();
        assert_eq!((err.path(), err.rule()), ("a", Rule::Type));
    }

    #[test]
    fn float_nodes_widen_integers_but_not_the_reverse() {
        assert!(Schema::float().valid(&json!(30)));
        assert_eq!(Schema::float().parse(&json!(30)).unwrap(), json!(30.0));
        assert_eq!(Schema::integer().error(&json!(30.5)).unwrap().rule(), Rule::Type);
        assert_eq!(Schema::integer().coerce().parse(&json!(30.5)).unwrap(), json!(30));
    }

    #[test]
    fn enum_is_checked_before_bounds() {
        let schema = Schema::integer().enum_values([1, 2, 30]).max(10);
        assert!(schema.valid(&json!(2)));
        assert_eq!(schema.error(&json!(5)).unwrap().rule(), Rule::Enum);
        assert_eq!(schema.error(&json!(30)).unwrap().rule(), Rule::Max);
        let colors = Schema::string().enum_values(["red", "green"]);
        assert!(colors.valid(&json!("red")));
        assert!(!colors.valid(&json!("blue")));
    }

    #[test]
    fn coercion_runs_before_the_type_check() {
        let schema = Schema::object([("n", Schema::integer().coerce().min(3))]);
        assert_eq!(schema.parse(&json!({"n": "5"})).unwrap(), json!({"n": 5}));
        assert_eq!(schema.error(&json!({"n": "2"})).unwrap().rule(), Rule::Min);
        assert_eq!(schema.error(&json!({"n": "x"})).unwrap().rule(), Rule::Type);
        assert!(Schema::boolean().coerce().valid(&json!("yes")));
        assert!(!Schema::boolean().valid(&json!("yes")));
    }

    #[test]
    fn array_elements_report_their_index() {
        let schema = Schema::object([("cars", Schema::array(car()))]);
        let data = json!({"cars": [{"model": "A", "mpg": 1.5}, {"model": 7, "mpg": 2.0}]});
        let err = schema.error(&data).unwrap();
        assert_eq!(err.path(), "cars[1].model");
        assert_eq!(err.rule(), Rule::Type);
    }

    #[test]
    fn schema_by_example() {
        let schema = Schema::literal(json!({"a": 1}));
        assert_eq!(schema.error(&json!({"a": 1})), None);
        assert_eq!(schema.error(&json!({"a": 1.0})), None);
        let err = schema.error(&json!({"a": 2})).unwrap();
        assert_eq!((err.path(), err.rule()), ("a", Rule::Literal));

        let nested = Schema::literal(json!({"xs": [1, {"b": true}]}));
        assert!(nested.valid(&json!({"xs": [1, {"b": true}]})));
        let err = nested.error(&json!({"xs": [1, {"b": false}]})).unwrap();
        assert_eq!(err.path(), "xs[1].b");
        let err = nested.error(&json!({"xs": [1]})).unwrap();
        assert_eq!((err.path(), err.rule()), ("xs", Rule::Literal));
        let err = nested.error(&json!({"xs": "nope"})).unwrap();
        assert_eq!(err.rule(), Rule::Type);
    }

    #[test]
    fn shapes_mix_nodes_and_literals() {
        let schema = Schema::object([("kind", Schema::from(json!("user"))), ("id", Schema::integer())]);
        assert!(schema.valid(&json!({"kind": "user", "id": 1})));
        assert_eq!(schema.error(&json!({"kind": "bot", "id": 1})).unwrap().rule(), Rule::Literal);
    }

    #[test]
    fn literal_mismatches_name_their_rule() {
        let schema = Schema::object([("a", json!(1))]);
        let err = schema.error(&json!({"a": 2})).unwrap();
        assert_eq!(err.path(), "a");
        assert_eq!(err.rule().as_str(), "literal-mismatch");
        assert_eq!(err.to_string(), "expected 1, found 2 at a: literal-mismatch");
        assert_eq!(serde_json::to_value(&err).unwrap()["rule"], "literal-mismatch");
    }

    #[test]
    fn derived_variants_leave_the_base_alone() {
        let base = Schema::string();
        let short = base.clone().max(3);
        let strict = base.clone().enum_values(["a"]);
        assert!(base.valid(&json!("abcdef")));
        assert!(!short.valid(&json!("abcdef")));
        assert!(strict.valid(&json!("a")));
        assert!(!strict.valid(&json!("b")));
        assert!(short.valid(&json!("b")));

        let shape = Schema::object([("a", Schema::integer())]);
        let open = shape.clone().with_additional_properties();
        assert!(!shape.valid(&json!({"a": 1, "b": 2})));
        assert!(open.valid(&json!({"a": 1, "b": 2})));
    }

    #[test]
    fn defaults_fill_nulls_and_gaps() {
        let schema = Schema::object([
            ("tags", Schema::array(Schema::string()).default(json!([]))),
            ("limit", Schema::integer().optional().default(10)),
        ]);
        assert_eq!(
            schema.parse(&json!({"tags": null})).unwrap(),
            json!({"tags": [], "limit": 10})
        );
        assert_eq!(schema.error(&json!({})).unwrap().rule(), Rule::Required);
    }

    #[test]
    fn string_patterns() {
        let schema = Schema::string().regex(r"^\d{3}$").unwrap();
        assert!(schema.valid(&json!("123")));
        assert_eq!(schema.error(&json!("12a")).unwrap().rule(), Rule::Pattern);
        assert!(Schema::string().regex("(").is_err());
        let email = Schema::string().email();
        assert!(email.valid(&json!("ada@example.org")));
        assert!(!email.valid(&json!("ada.example.org")));
    }

    #[test]
    fn root_errors_render_as_root() {
        let err = Schema::boolean().error(&json!("x")).unwrap();
        assert_eq!(err.path(), "");
        assert_eq!(err.location(), "(root)");
        assert_eq!(err.to_string(), "expected boolean, found string at (root): type");
    }

    #[test]
    fn errors_serialize_for_reports() {
        let err = Schema::object([("a", Schema::integer())])
            .error(&json!({"a": 1, "zz": 0}))
            .unwrap();
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["rule"], "additionalProperties");
        assert_eq!(json["path"], "zz");
    }
}
