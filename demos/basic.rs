//! Required and optional options.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p optargs-demos --example basic
//! ```

use optargs_core::{OptionSpec, ParseConfig, Result, Schema, Value};

struct Foo {
    options: Schema,
}

impl Foo {
    fn new() -> Result<Self> {
        let options = Schema::define("FuncOptions", |s| {
            s.declare_option("a", OptionSpec::new().required())?;
            s.declare_option("b", OptionSpec::new())?;
            Ok(())
        })?;
        Ok(Self { options })
    }

    fn func(&self, pairs: &[(&str, i64)]) -> Result<()> {
        let opts = self.options.parse(pairs.iter().copied(), &ParseConfig::default())?;
        println!("a  = {}", opts.get("a")?);
        println!("b? = {}", opts.with("b")?);
        match opts.get("b") {
            Ok(value) => println!("b  = {value}"),
            Err(_) => println!("b  = {}", Value::Null),
        }
        Ok(())
    }
}

fn main() {
    let foo = Foo::new().unwrap();

    foo.func(&[("a", 1)]).unwrap();
    foo.func(&[("a", 1), ("b", 2)]).unwrap();

    // `a` is required
    if let Err(err) = foo.func(&[("b", 2)]) {
        println!("error: {err}");
    }

    // `c` is not declared
    if let Err(err) = foo.func(&[("a", 1), ("c", 3)]) {
        println!("error: {err}");
    }
}
