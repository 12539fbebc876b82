//! Walks a few realistic documents through the accessors, chains and
//! schemas and prints what each call produced.
use colored::Colorize;
use serde_json::{Value, json};

use json_shield::{Access, Chain, MapAccess, Rule, Schema, SeqAccess, infer};

fn sample() -> Value {
    json!({
        "name": "John",
        "age": 30,
        "cars": [
            {"model": "BMW 230", "mpg": 27.5},
            {"model": "Ford Edge", "mpg": 24.1}
        ],
        "dog": null
    })
}

fn report(label: &str, ok: bool) {
    let mark = if ok { "✔".green() } else { "✘".red() };
    println!("{mark} {label}");
}

fn run_accessors(data: &Value) -> bool {
    let root = MapAccess::of(data);
    let name = root.ensure::<String>("name");
    let age_text = root.ensure_cast::<String>("age");
    let missing = root.ensure_or::<i64>("height", 180);
    println!("  name={name} age={age_text:?} height={missing}");
    name == "John" && age_text == "30" && missing == 180
}

fn run_chains(data: &Value) -> anyhow::Result<bool> {
    let chain = Chain::new(data);
    let model = chain.ensure::<String, _>("cars[1].model");
    let dog = chain.optional_get::<String, _>("dog?.name");
    let strict = chain.resolve("cars[5].model");
    println!("  model={model:?} dog={dog:?} strict={strict:?}");
    let mpg = chain.assert_get::<f64, _>("cars[0].mpg")?;
    Ok(model == "Ford Edge" && dog.is_none() && strict.is_err() && mpg == 27.5)
}

fn run_mixed_lists() -> bool {
    let data = json!([[1, 2, 3], ["4", "5", "6"], "I'm not even a list"]);
    let sums: Vec<i64> = SeqAccess::of(&data)
        .iter()
        .ensure_cast::<SeqAccess>()
        .map(|list| list.iter().ensure_cast::<i64>().sum::<i64>())
        .collect();
    println!("  sums={sums:?}");
    sums == vec![6, 15]
}

fn run_schemas(data: &Value) -> bool {
    let car = Schema::object([("model", Schema::string()), ("mpg", Schema::float())]);
    let person = Schema::object([
        ("name", Schema::string().min(5)),
        ("age", Schema::integer()),
        ("cars", Schema::array(car).min(1)),
        ("dog", Schema::any().optional()),
    ]);
    let error = person.error(data);
    println!("  error={}", error.as_ref().map_or("none".to_string(), ToString::to_string));
    error.is_some_and(|e| e.path() == "name" && e.rule() == Rule::Min)
}

fn run_inference(data: &Value) -> bool {
    let shape = infer::shape_of(data);
    let drifted = json!({"name": "Jane", "age": "31", "cars": [], "dog": null});
    let error = shape.error(&drifted);
    println!("  drift={}", error.as_ref().map_or("none".to_string(), ToString::to_string));
    shape.valid(data) && error.is_some_and(|e| e.path() == "age")
}

fn main() -> anyhow::Result<()> {
    let data = sample();
    let results = [
        ("accessors", run_accessors(&data)),
        ("chains", run_chains(&data)?),
        ("mixed lists", run_mixed_lists()),
        ("schemas", run_schemas(&data)),
        ("inference", run_inference(&data)),
    ];
    for (label, ok) in results {
        report(label, ok);
    }
    if results.iter().any(|(_, ok)| !ok) {
        anyhow::bail!("some scenarios did not behave as expected");
    }
    Ok(())
}
