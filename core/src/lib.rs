//! Declarative validation of named options.
//!
//! A [`Schema`] is declared once and then used to parse any number of
//! key/value inputs into read-only [`ParsedOptions`]:
//!
//! - [`SchemaBuilder`] declares options ([`OptionSpec`]) with aliases,
//!   deprecated names, defaults, conditions, adjusters, and
//!   cross-requirements, plus conflict sets between options.
//! - [`Schema::parse`] resolves names to canonical keys, adjusts and checks
//!   each value, then validates required keys, requirements, and conflicts,
//!   in that order.
//! - [`ParsedOptions`] reads values back by any declared name, or through
//!   generated accessors such as `fetch_by_N` and `with_N?`.
//!
//! Failures are reported with [`Error`]. A [`ParseConfig`] can relax the
//! unknown-name policy or wrap parse failures in a caller-provided error.
//!
//! # Example
//!
//! ```
//! use optargs_core::{condition, adjust, Error, OptionSpec, ParseConfig, Schema, Value};
//!
//! let schema = Schema::define("Server", |s| {
//!     s.declare_option("host", OptionSpec::new().required())?;
//!     s.declare_option(
//!         "timeout",
//!         OptionSpec::new()
//!             .aliases(["wait"])
//!             .default(30.0)
//!             .adjuster(adjust::to_float)
//!             .condition(condition::in_range(0.0, 600.0)),
//!     )?;
//!     s.declare_option("tls", OptionSpec::new())?;
//!     s.declare_option("plain", OptionSpec::new())?;
//!     s.declare_conflict(["tls", "plain"])?;
//!     Ok(())
//! })?;
//!
//! let config = ParseConfig::default();
//! let opts = schema.parse([("host", Value::from("db")), ("wait", Value::from("2.5"))], &config)?;
//! assert_eq!(opts.get("timeout")?, &Value::from(2.5));
//! assert_eq!(opts.to_string(), r#"<Server: host="db", timeout=2.5>"#);
//!
//! let err = schema.parse([("timeout", 1)], &config).unwrap_err();
//! assert_eq!(err.to_string(), "malformed options: shortage option parameter: host");
//! # Ok::<(), Error>(())
//! ```

pub mod adjust;
pub mod condition;

mod builder;
mod error;
mod key;
mod notice;
mod options;
mod parse;
mod schema;
mod value;

pub use builder::{OptionSpec, SchemaBuilder};
pub use condition::{Condition, SharedCondition};
pub use error::{BoxError, Error, Result};
pub use key::Key;
pub use notice::Notice;
pub use options::{Accessed, Pairs, ParsedOptions};
pub use parse::ParseConfig;
pub use schema::{NameKind, Schema};
pub use value::{Value, ValueKind};

/// Declares a schema. Shorthand for [`Schema::define`].
pub fn define<F>(name: impl Into<String>, declare: F) -> Result<Schema>
where
    F: FnOnce(&mut SchemaBuilder) -> Result<()>,
{
    Schema::define(name, declare)
}

/// Declares a throwaway schema and parses one input with it.
///
/// # Examples
///
/// ```
/// use optargs_core::{OptionSpec, ParseConfig, Value};
///
/// let opts = optargs_core::parse("Once", [("a", 1)], &ParseConfig::default(), |s| {
///     s.declare_option("a", OptionSpec::new())?;
///     s.declare_option("b", OptionSpec::new().default(false))?;
///     Ok(())
/// })
/// .unwrap();
/// assert_eq!(opts.get("b").unwrap(), &Value::Bool(false));
/// ```
///
/// # Errors
///
/// Any declaration error, or any error from [`Schema::parse`].
pub fn parse<I, K, V, F>(
    name: impl Into<String>,
    pairs: I,
    config: &ParseConfig,
    declare: F,
) -> Result<ParsedOptions>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<Value>,
    F: FnOnce(&mut SchemaBuilder) -> Result<()>,
{
    Schema::define(name, declare)?.parse(pairs, config)
}
