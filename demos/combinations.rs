//! Conflicts, requirements, aliases, and deprecated names.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p optargs-demos --example combinations
//! ```

use optargs_core::{OptionSpec, ParseConfig, Schema};

fn main() {
    let schema = Schema::define("OptArg", |s| {
        s.declare_option("a", OptionSpec::new())?;
        s.declare_option("b", OptionSpec::new())?;
        s.declare_conflict(["a", "b"])?;
        s.declare_option("c", OptionSpec::new().requires(["b", "d"]))?;
        s.declare_option("d", OptionSpec::new().aliases(["d2", "d3"]))?;
        s.declare_option("e", OptionSpec::new().deprecated_names(["e2", "e3"]))?;
        Ok(())
    })
    .unwrap();
    let config = ParseConfig::default();

    if let Err(err) = schema.parse([("a", 1), ("b", 1)], &config) {
        println!("error: {err}");
    }

    if let Err(err) = schema.parse([("c", 1)], &config) {
        println!("error: {err}");
    }

    let opts = schema.parse([("d2", 1)], &config).unwrap();
    println!("d3 = {}", opts.get("d3").unwrap());

    let opts = schema.parse([("e2", 1)], &config).unwrap();
    println!("e3 = {}", opts.get("e3").unwrap());
    for notice in opts.notices() {
        println!("notice: {notice}");
    }
}
