//! Type-safe access, optional chaining and schema validation over untyped
//! JSON-like trees.
pub mod access;
pub mod coerce;
pub mod error;
pub mod infer;
pub mod path;
pub mod schema;
pub mod tag;

pub use access::{Access, Elements, Extract, MapAccess, SeqAccess, ValueAccess};
pub use error::{AccessError, PathSyntaxError};
pub use path::{AsPath, Chain, Path, Segment};
pub use schema::{Rule, Schema, ValidationError};
pub use tag::TypeTag;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn alice() -> Value {
        json!({
            "name": "Alice",
            "age": 30,
            "pets": [
                {"name": "Dinah", "kind": "cat"},
                {"name": "Rabbit", "kind": "rabbit", "age": "2"}
            ],
            "job": null
        })
    }

    #[test]
    fn accessors_chains_and_schemas_agree() {
        let data = alice();
        let person = MapAccess::of(&data);

        assert_eq!(person.ensure::<String>("name"), "Alice");
        assert_eq!(person.chain().ensure_cast::<i64, _>("pets[1].age"), 2);
        assert_eq!(person.chain().optional_get::<String, _>("job?.title"), None);

        let schema = Schema::object([
            ("name", Schema::string().min(1)),
            ("age", Schema::integer().min(0)),
            (
                "pets",
                Schema::array(Schema::object([
                    ("name", Schema::string()),
                    ("kind", Schema::string().enum_values(["cat", "dog", "rabbit"])),
                    ("age", Schema::integer().coerce().optional()),
                ])),
            ),
            ("job", Schema::string().nullable()),
        ]);
        assert_eq!(schema.error(&data), None);
        let parsed = schema.parse(&data).unwrap();
        assert_eq!(MapAccess::of(&parsed).chain().optional_get::<i64, _>("pets[1].age"), Some(2));
    }

    #[test]
    fn declaration_order_decides_the_reported_failure() {
        let schema = Schema::object([
            ("name", Schema::string().min(10)),
            ("age", Schema::string()),
        ]);
        let err = schema.error(&alice()).unwrap();
        assert_eq!((err.path(), err.rule()), ("name", Rule::Min));
    }

    #[test]
    fn mixed_lists_filter_by_what_coerces() {
        let data = json!([1, "2", "three", 4.9, true, null]);
        let ints: Vec<i64> = SeqAccess::of(&data).iter().ensure_cast::<i64>().collect();
        assert_eq!(ints, vec![1, 2, 4, 1]);
        let strings: Vec<String> = SeqAccess::of(&data).iter().optional_get::<String>().flatten().collect();
        assert_eq!(strings, vec!["2", "three"]);
    }

    #[test]
    fn inferred_schemas_validate_their_samples() {
        let data = alice();
        let schema = infer::shape_of(&data);
        assert!(schema.valid(&data));
        let pets = Chain::new(&data).find("pets").unwrap();
        assert!(infer::shape_of(pets).valid(&json!([])));
    }

    #[test]
    fn access_errors_render_readably() {
        let data = alice();
        let err = MapAccess::of(&data).assert_get::<i64>("name").unwrap_err();
        assert_eq!(err.to_string(), "assertion failed at `name`: expected integer, found string");
        let err = Chain::new(&data).resolve("pets[").unwrap_err();
        assert!(matches!(err, AccessError::Syntax(_)));
    }
}
