//! Schema inference from sample documents.
//!
//! Samples are folded into an [`Observed`] summary with a join (⊔) that is
//! associative and commutative, so the order samples arrive in never
//! matters. Field maps compare without regard to order. The summary keeps
//! at most one arm per kind; lowering turns it into a [`Schema`] that
//! accepts every sample seen.
use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::schema::Schema;
use crate::tag::TypeTag;

// ————————————————————————————————————————————————————————————————————————————
// STATE
// ————————————————————————————————————————————————————————————————————————————

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Observed {
    pub nullable: bool,
    pub has_bool: bool,
    pub has_int: bool,
    pub has_float: bool,
    pub has_str: bool,
    pub arr: Option<Box<Observed>>,
    pub obj: Option<ObjObserved>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObjObserved {
    pub fields: IndexMap<String, FieldObserved>,
    pub seen: u64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FieldObserved {
    pub ty: Observed,
    pub present_in: u64,
}

impl Observed {
    pub fn is_bottom(&self) -> bool {
        *self == Observed::default()
    }

    /// Non-null kinds seen, numbers counted once.
    fn kinds(&self) -> usize {
        [
            self.has_bool,
            self.has_int || self.has_float,
            self.has_str,
            self.arr.is_some(),
            self.obj.is_some(),
        ]
        .into_iter()
        .filter(|seen| *seen)
        .count()
    }
}

// ————————————————————————————————————————————————————————————————————————————
// OBSERVE
// ————————————————————————————————————————————————————————————————————————————

pub fn observe(value: &Value) -> Observed {
    match value {
        Value::Null => Observed { nullable: true, ..Observed::default() },
        Value::Bool(_) => Observed { has_bool: true, ..Observed::default() },
        Value::Number(_) if TypeTag::Integer.matches(value) => Observed { has_int: true, ..Observed::default() },
        Value::Number(_) => Observed { has_float: true, ..Observed::default() },
        Value::String(_) => Observed { has_str: true, ..Observed::default() },
        Value::Array(items) => {
            let item = items.iter().fold(Observed::default(), |acc, el| join(&acc, &observe(el)));
            Observed { arr: Some(Box::new(item)), ..Observed::default() }
        }
        Value::Object(map) => Observed { obj: Some(observe_object(map)), ..Observed::default() },
    }
}

fn observe_object(map: &Map<String, Value>) -> ObjObserved {
    let fields = map
        .iter()
        .map(|(k, v)| (k.clone(), FieldObserved { ty: observe(v), present_in: 1 }))
        .collect();
    ObjObserved { fields, seen: 1 }
}

// ————————————————————————————————————————————————————————————————————————————
// JOIN (⊔)
// ————————————————————————————————————————————————————————————————————————————

pub fn join(a: &Observed, b: &Observed) -> Observed {
    Observed {
        nullable: a.nullable || b.nullable,
        has_bool: a.has_bool || b.has_bool,
        has_int: a.has_int || b.has_int,
        has_float: a.has_float || b.has_float,
        has_str: a.has_str || b.has_str,
        arr: match (&a.arr, &b.arr) {
            (None, None) => None,
            (Some(x), None) | (None, Some(x)) => Some(x.clone()),
            (Some(x), Some(y)) => Some(Box::new(join(x, y))),
        },
        obj: match (&a.obj, &b.obj) {
            (None, None) => None,
            (Some(x), None) | (None, Some(x)) => Some(x.clone()),
            (Some(x), Some(y)) => Some(join_obj(x, y)),
        },
    }
}

fn join_obj(a: &ObjObserved, b: &ObjObserved) -> ObjObserved {
    let mut fields = a.fields.clone();
    for (key, fb) in &b.fields {
        match fields.get_mut(key) {
            Some(fa) => {
                fa.ty = join(&fa.ty, &fb.ty);
                fa.present_in += fb.present_in;
            }
            None => {
                fields.insert(key.clone(), fb.clone());
            }
        }
    }
    ObjObserved { fields, seen: a.seen + b.seen }
}

// ————————————————————————————————————————————————————————————————————————————
// LOWER
// ————————————————————————————————————————————————————————————————————————————

/// The narrowest schema accepting everything summarized in `observed`.
/// Mixed kinds fall back to `any`.
pub fn lower(observed: &Observed) -> Schema {
    let schema = if observed.kinds() != 1 {
        Schema::any()
    } else if observed.has_bool {
        Schema::boolean()
    } else if observed.has_float {
        Schema::float()
    } else if observed.has_int {
        Schema::integer()
    } else if observed.has_str {
        Schema::string()
    } else if let Some(item) = &observed.arr {
        Schema::array(lower(item))
    } else if let Some(obj) = &observed.obj {
        lower_object(obj)
    } else {
        Schema::any()
    };
    if observed.nullable { schema.nullable() } else { schema }
}

fn lower_object(obj: &ObjObserved) -> Schema {
    Schema::object(obj.fields.iter().map(|(key, field)| {
        let schema = lower(&field.ty);
        let schema = if field.present_in < obj.seen { schema.optional() } else { schema };
        (key.clone(), schema)
    }))
}

// ————————————————————————————————————————————————————————————————————————————
// DRIVER
// ————————————————————————————————————————————————————————————————————————————

/// Streaming accumulator over samples.
#[derive(Clone, Debug, Default)]
pub struct Inference {
    state: Observed,
    samples: usize,
}

impl Inference {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe_value(&mut self, value: &Value) {
        self.state = join(&self.state, &observe(value));
        self.samples += 1;
    }

    pub fn samples(&self) -> usize {
        self.samples
    }

    pub fn observed(&self) -> &Observed {
        &self.state
    }

    pub fn solve(&self) -> Schema {
        tracing::debug!(samples = self.samples, "lowering inferred shape");
        lower(&self.state)
    }
}

pub fn shape_of(value: &Value) -> Schema {
    lower(&observe(value))
}

pub fn shape_of_all<'a, I>(values: I) -> Schema
where
    I: IntoIterator<Item = &'a Value>,
{
    let mut inference = Inference::new();
    for value in values {
        inference.observe_value(value);
    }
    inference.solve()
}
