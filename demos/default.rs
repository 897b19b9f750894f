//! Default values fill absent options.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p optargs-demos --example default
//! ```

use optargs_core::{OptionSpec, ParseConfig, Schema};

fn main() {
    let schema = Schema::define("OptArg", |s| {
        s.declare_option("a", OptionSpec::new())?;
        s.declare_option("b", OptionSpec::new().default("This is a default value"))?;
        Ok(())
    })
    .unwrap();

    let opts = schema.parse([("a", 1)], &ParseConfig::default()).unwrap();
    println!("b = {}", opts.get("b").unwrap());
    println!("{opts}");
}
