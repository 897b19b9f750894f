//! Conditions and adjusters.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p optargs-demos --example validation
//! ```

use optargs_core::{OptionSpec, ParseConfig, Schema, Value, ValueKind, adjust, condition};

fn main() {
    let schema = Schema::define("OptArg", |s| {
        s.declare_option("x", OptionSpec::new().condition(condition::in_range(3.0, 5.0)))?;
        s.declare_option(
            "y",
            OptionSpec::new().condition(condition::and([
                condition::kind(ValueKind::Float),
                condition::in_range(3.0, 5.0),
            ])),
        )?;
        s.declare_option("z", OptionSpec::new().adjuster(adjust::to_float))?;
        Ok(())
    })
    .unwrap();
    let config = ParseConfig::default();

    let inputs: Vec<(&str, Value)> = vec![
        ("x", Value::from(4)),
        ("x", Value::from(9)),
        ("y", Value::from(4)),
        ("y", Value::from(4.5)),
        ("z", Value::from("1")),
        ("z", Value::from("one")),
    ];

    for (name, value) in inputs {
        match schema.parse([(name, value)], &config) {
            Ok(opts) => println!("ok: {opts}"),
            Err(err) => println!("error: {err}"),
        }
    }

    let json = serde_json::json!({"x": 3, "y": 3.5, "z": 2});
    let opts = schema.parse_json(json, &config).unwrap();
    println!("{}", serde_json::to_string_pretty(&opts).unwrap());
}
