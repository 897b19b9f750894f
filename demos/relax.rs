//! Ignoring undeclared names.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p optargs-demos --example relax
//! ```

use optargs_core::{OptionSpec, ParseConfig, Schema};

fn main() {
    let schema = Schema::define("OptArg", |s| {
        s.declare_option("known", OptionSpec::new().required())?;
        Ok(())
    })
    .unwrap();

    let input = [("known", 1), ("unknown", 2)];

    if let Err(err) = schema.parse(input, &ParseConfig::default()) {
        println!("strict: {err}");
    }

    let opts = schema.parse(input, &ParseConfig::relaxed()).unwrap();
    println!("relaxed: {opts}");
}
