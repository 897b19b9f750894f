//! Replacing parse failures with a caller-defined error type.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p optargs-demos --example switch_error
//! ```

use optargs_core::{Error, OptionSpec, ParseConfig, Schema};

#[derive(Debug, thiserror::Error)]
enum CallError {
    #[error("argument error: {0}")]
    Argument(#[source] Error),
    #[error("key error: {0}")]
    Key(#[source] Error),
}

fn main() {
    let schema = Schema::define("OptArg", |s| {
        s.declare_option("a", OptionSpec::new())?;
        Ok(())
    })
    .unwrap();

    for config in [
        ParseConfig::default().with_exception(CallError::Argument),
        ParseConfig::default().with_exception(CallError::Key),
    ] {
        let Err(Error::Substituted(err)) = schema.parse([("b", 1)], &config) else {
            continue;
        };
        match err.downcast_ref::<CallError>() {
            Some(call) => println!("{call:?}"),
            None => println!("{err}"),
        }
    }
}
