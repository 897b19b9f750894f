//! Parsing raw key/value input against a [`Schema`].
//!
//! Parsing resolves every supplied name to its canonical key, runs the
//! adjuster and condition of each value, then validates the combination of
//! present keys in a fixed order:
//!
//! 1. required keys (shortage),
//! 2. cross-requirements,
//! 3. conflict sets.
//!
//! Finally, defaults are filled in for absent keys (through the same
//! adjuster/condition pipeline) and a [`ParsedOptions`] is returned.
//!
//! # Example
//!
//! ```
//! use optargs_core::{Error, OptionSpec, ParseConfig, Schema};
//!
//! let schema = Schema::define("Opts", |s| {
//!     s.declare_option("a", OptionSpec::new())?;
//!     s.declare_option("b", OptionSpec::new())?;
//!     s.declare_conflict(["a", "b"])?;
//!     s.declare_option("c", OptionSpec::new().requires(["b", "d"]))?;
//!     s.declare_option("d", OptionSpec::new().aliases(["d2", "d3"]))?;
//!     Ok(())
//! })?;
//! let config = ParseConfig::default();
//!
//! let err = schema.parse([("a", 1), ("b", 1)], &config).unwrap_err();
//! assert!(matches!(err, Error::KeyConflict(_)));
//!
//! let err = schema.parse([("c", 1)], &config).unwrap_err();
//! assert!(matches!(err, Error::MalformedOptions(_)));
//!
//! let opts = schema.parse([("d2", 1)], &config)?;
//! assert_eq!(opts.get("d3")?.as_i64(), Some(1));
//! # Ok::<(), Error>(())
//! ```

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use crate::{BoxError, Error, Key, NameKind, Notice, ParsedOptions, Result, Schema, Value};

type Substitute = Arc<dyn Fn(Error) -> BoxError + Send + Sync>;

/// Per-call parsing policy.
///
/// Only `defined_only` is data; the alternate error kind is code and is
/// attached with [`with_exception`](ParseConfig::with_exception). When
/// deserialized (e.g. from a host's YAML config), unknown fields are
/// rejected.
///
/// # Examples
///
/// ```
/// use optargs_core::ParseConfig;
///
/// let config = ParseConfig::from_yaml_str("defined_only: false").unwrap();
/// assert!(!config.defined_only);
/// assert!(ParseConfig::default().defined_only);
/// assert!(ParseConfig::from_yaml_str("strict: true").is_err());
/// ```
#[derive(Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParseConfig {
    /// Reject names the schema does not declare (`true`), or silently drop
    /// them (`false`).
    pub defined_only: bool,
    #[serde(skip)]
    exception: Option<Substitute>,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            defined_only: true,
            exception: None,
        }
    }
}

impl ParseConfig {
    /// A config that ignores undeclared names.
    pub fn relaxed() -> Self {
        Self {
            defined_only: false,
            ..Self::default()
        }
    }

    /// Replaces parse failures with the caller's own error kind.
    ///
    /// `wrap` receives the original [`Error`] (malformed options, key
    /// conflict, invalid adjusting, or invalid writing); its result is
    /// returned as [`Error::Substituted`]. Other errors pass through.
    ///
    /// # Examples
    ///
    /// ```
    /// use optargs_core::{Error, OptionSpec, ParseConfig, Schema};
    ///
    /// #[derive(Debug, thiserror::Error)]
    /// #[error("bad call: {0}")]
    /// struct BadCall(#[source] Error);
    ///
    /// let schema = Schema::define("Opts", |s| {
    ///     s.declare_option("a", OptionSpec::new())?;
    ///     Ok(())
    /// })
    /// .unwrap();
    ///
    /// let config = ParseConfig::default().with_exception(BadCall);
    /// let err = schema.parse([("bogus", 1)], &config).unwrap_err();
    /// let Error::Substituted(inner) = err else { panic!("not substituted") };
    /// let bad = inner.downcast_ref::<BadCall>().unwrap();
    /// assert!(matches!(bad.0, Error::MalformedOptions(_)));
    /// ```
    pub fn with_exception<E, F>(mut self, wrap: F) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
        F: Fn(Error) -> E + Send + Sync + 'static,
    {
        self.exception = Some(Arc::new(move |err| Box::new(wrap(err)) as BoxError));
        self
    }

    /// Returns `true` if an alternate error kind is configured.
    pub fn has_exception(&self) -> bool {
        self.exception.is_some()
    }

    /// Parses a config from YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Yaml`] on invalid YAML or unknown fields.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Loads a config from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read, or
    /// [`Error::Yaml`] if parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        Ok(serde_yaml::from_reader(reader)?)
    }

    fn substitute(&self, err: Error) -> Error {
        match &self.exception {
            Some(wrap) if err.is_parse_failure() => Error::Substituted(wrap(err)),
            _ => err,
        }
    }
}

impl std::fmt::Debug for ParseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParseConfig")
            .field("defined_only", &self.defined_only)
            .field("exception", &self.exception.is_some())
            .finish()
    }
}

impl Schema {
    /// Parses key/value pairs into a [`ParsedOptions`].
    ///
    /// # Errors
    ///
    /// - [`Error::MalformedOptions`] for an unknown name (under
    ///   `defined_only`), a missing required key, or an unmet requirement.
    /// - [`Error::KeyConflict`] when two names hit one key or a conflict
    ///   set is fully present.
    /// - [`Error::InvalidAdjusting`] / [`Error::InvalidWriting`] when a
    ///   supplied or defaulted value fails its pipeline.
    ///
    /// Any of these becomes [`Error::Substituted`] if `config` carries an
    /// alternate error kind.
    pub fn parse<I, K, V>(&self, pairs: I, config: &ParseConfig) -> Result<ParsedOptions>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        self.resolve(pairs, config.defined_only)
            .map_err(|err| self.reject(err, config))
    }

    /// Parses a [`Value`], which must be a `Map`.
    ///
    /// # Errors
    ///
    /// As [`parse`](Schema::parse), plus [`Error::MalformedOptions`] if
    /// `input` is not a map.
    pub fn parse_value(&self, input: Value, config: &ParseConfig) -> Result<ParsedOptions> {
        match input {
            Value::Map(map) => self.parse(map, config),
            other => Err(self.reject(
                Error::MalformedOptions(format!(
                    "options must be key-value pairs, got {}",
                    other.kind()
                )),
                config,
            )),
        }
    }

    /// Parses a JSON document, which must be an object.
    ///
    /// Numbers convert as described on [`Value`]'s `From<serde_json::Value>`
    /// impl: integers beyond `i64` arrive as `Float`.
    ///
    /// # Examples
    ///
    /// ```
    /// use optargs_core::{Error, OptionSpec, ParseConfig, Schema};
    ///
    /// let schema = Schema::define("Opts", |s| {
    ///     s.declare_option("port", OptionSpec::new())?;
    ///     Ok(())
    /// })
    /// .unwrap();
    /// let config = ParseConfig::default();
    ///
    /// let opts = schema.parse_json(serde_json::json!({"port": 8080}), &config).unwrap();
    /// assert_eq!(opts.get("port").unwrap().as_i64(), Some(8080));
    ///
    /// let err = schema.parse_json(serde_json::json!([1, 2]), &config).unwrap_err();
    /// assert!(matches!(err, Error::MalformedOptions(_)));
    /// ```
    pub fn parse_json(
        &self,
        input: serde_json::Value,
        config: &ParseConfig,
    ) -> Result<ParsedOptions> {
        self.parse_value(Value::from(input), config)
    }

    fn reject(&self, err: Error, config: &ParseConfig) -> Error {
        debug!(schema = %self.name(), error = %err, "Rejected options");
        config.substitute(err)
    }

    fn resolve<I, K, V>(&self, pairs: I, defined_only: bool) -> Result<ParsedOptions>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut slots: Vec<Option<Value>> = vec![None; self.tables.options.len()];
        let mut notices = Vec::new();

        for (name, raw) in pairs {
            let name = name.as_ref();
            let Some(entry) = self.entry(name) else {
                if defined_only {
                    return Err(Error::MalformedOptions(format!(
                        "unknown defined name \"{name}\""
                    )));
                }
                continue;
            };

            let slot = entry.slot;
            let key = &self.tables.options[slot].key;
            if slots[slot].is_some() {
                return Err(Error::KeyConflict(format!(
                    "`{name}` resolves to `{key}`, which was already given"
                )));
            }

            if entry.kind == NameKind::Deprecated {
                let notice = Notice::Deprecated {
                    name: entry.name.clone(),
                    replacement: key.clone(),
                };
                notice.emit();
                notices.push(notice);
            }

            slots[slot] = Some(self.validate_value(slot, raw.into())?);
        }

        self.validate_combinations(&slots)?;

        for (slot, option) in self.tables.options.iter().enumerate() {
            if slots[slot].is_none() {
                if let Some(default) = &option.default {
                    slots[slot] = Some(self.validate_value(slot, default.clone())?);
                }
            }
        }

        Ok(ParsedOptions::new(self.clone(), slots, notices))
    }

    /// Runs the adjuster, then the condition, for the option in `slot`.
    fn validate_value(&self, slot: usize, value: Value) -> Result<Value> {
        let option = &self.tables.options[slot];

        let value = match &option.adjuster {
            Some(adjust) => adjust(value).map_err(|source| Error::InvalidAdjusting {
                key: option.key.clone(),
                source,
            })?,
            None => value,
        };

        if let Some(condition) = &option.condition {
            if !condition.matches(&value) {
                return Err(Error::InvalidWriting {
                    key: option.key.clone(),
                    value,
                    condition: condition.describe(),
                });
            }
        }

        Ok(value)
    }

    fn validate_combinations(&self, slots: &[Option<Value>]) -> Result<()> {
        let present = |slot: &usize| slots[*slot].is_some();
        let options = &self.tables.options;

        let shortage: Vec<&Key> = options
            .iter()
            .enumerate()
            .filter(|(slot, option)| option.required && !present(slot))
            .map(|(_, option)| &option.key)
            .collect();
        if !shortage.is_empty() {
            return Err(Error::MalformedOptions(format!(
                "shortage option parameter: {}",
                join(&shortage)
            )));
        }

        for (slot, option) in options.iter().enumerate() {
            if !present(&slot) {
                continue;
            }
            let missing: Vec<&Key> = option
                .requirements
                .iter()
                .filter(|&required| !present(required))
                .map(|&required| &options[required].key)
                .collect();
            if !missing.is_empty() {
                return Err(Error::MalformedOptions(format!(
                    "shortage option parameter for {}: {}",
                    option.key,
                    join(&missing)
                )));
            }
        }

        if let Some(set) = self
            .tables
            .conflict_sets
            .iter()
            .find(|set| set.iter().all(present))
        {
            let keys: Vec<&Key> = set.iter().map(|&slot| &options[slot].key).collect();
            return Err(Error::KeyConflict(format!(
                "conflict combination thrown: {}",
                join(&keys)
            )));
        }

        Ok(())
    }
}

fn join(keys: &[&Key]) -> String {
    keys.iter()
        .map(|k| k.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition;
    use crate::{OptionSpec, ValueKind};

    fn combinations() -> Schema {
        Schema::define("Combos", |s| {
            s.declare_option("a", OptionSpec::new())?;
            s.declare_option("b", OptionSpec::new().requires(["a", "d"]))?;
            s.declare_option("c", OptionSpec::new().required())?;
            s.declare_option("d", OptionSpec::new())?;
            s.declare_option("x", OptionSpec::new())?;
            s.declare_conflict(["a", "x"])?;
            Ok(())
        })
        .unwrap()
    }

    #[test]
    fn test_shortage_reported_before_requirements_and_conflicts() {
        let schema = combinations();
        let err = schema
            .parse([("a", 1), ("x", 1), ("b", 1)], &ParseConfig::default())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "malformed options: shortage option parameter: c"
        );
    }

    #[test]
    fn test_requirements_reported_before_conflicts() {
        let schema = combinations();
        let err = schema
            .parse([("a", 1), ("x", 1), ("b", 1), ("c", 1)], &ParseConfig::default())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "malformed options: shortage option parameter for b: d"
        );
    }

    #[test]
    fn test_conflict_fires_when_required_present() {
        let schema = combinations();
        let err = schema
            .parse([("a", 1), ("x", 1), ("c", 1)], &ParseConfig::default())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "key conflict: conflict combination thrown: a, x"
        );
    }

    #[test]
    fn test_duplicate_name_is_key_conflict_before_combinations() {
        let schema = Schema::define("Dup", |s| {
            s.declare_option("origin", OptionSpec::new().aliases(["aliased"]))?;
            s.declare_option("must", OptionSpec::new().required())?;
            Ok(())
        })
        .unwrap();
        let err = schema
            .parse([("origin", 1), ("aliased", 2)], &ParseConfig::default())
            .unwrap_err();
        assert!(matches!(err, Error::KeyConflict(_)));

        let err = schema
            .parse([("origin", 1), ("origin", 2)], &ParseConfig::default())
            .unwrap_err();
        assert!(matches!(err, Error::KeyConflict(_)));
    }

    #[test]
    fn test_unknown_names_follow_defined_only() {
        let schema = Schema::define("Relax", |s| {
            s.declare_option("known", OptionSpec::new().required())?;
            Ok(())
        })
        .unwrap();

        let err = schema
            .parse([("known", 1), ("unknown", 2)], &ParseConfig::default())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "malformed options: unknown defined name \"unknown\""
        );

        let opts = schema
            .parse([("known", 1), ("unknown", 2)], &ParseConfig::relaxed())
            .unwrap();
        assert_eq!(opts.len(), 1);
        assert!(matches!(opts.get("unknown"), Err(Error::UnknownName(_))));
    }

    #[test]
    fn test_defaults_pass_through_pipeline() {
        let schema = Schema::define("Defaults", |s| {
            s.declare_option(
                "strict",
                OptionSpec::new()
                    .default("FOO")
                    .condition(condition::kind(ValueKind::Int)),
            )?;
            Ok(())
        })
        .unwrap();

        let err = schema
            .parse(Vec::<(&str, Value)>::new(), &ParseConfig::default())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidWriting { .. }));

        let opts = schema.parse([("strict", 3)], &ParseConfig::default()).unwrap();
        assert_eq!(opts.get("strict").unwrap(), &Value::Int(3));
    }

    #[test]
    fn test_adjuster_failure_is_invalid_adjusting() {
        let schema = Schema::define("Adjust", |s| {
            s.declare_option("z", OptionSpec::new().adjuster(crate::adjust::to_float))?;
            Ok(())
        })
        .unwrap();
        let err = schema
            .parse([("z", "one")], &ParseConfig::default())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid adjusting for `z`: invalid value for Float: \"one\""
        );
    }

    #[test]
    fn test_substitution_leaves_other_errors_alone() {
        #[derive(Debug, thiserror::Error)]
        #[error("custom")]
        struct Custom;

        let config = ParseConfig::default().with_exception(|_| Custom);
        assert!(config.has_exception());
        assert_eq!(
            config.substitute(Error::EmptySchema).to_string(),
            "no assigned options yet"
        );
        let replaced = config.substitute(Error::MalformedOptions("x".into()));
        assert_eq!(replaced.to_string(), "custom");
    }

    #[test]
    fn test_option_without_condition_accepts_any_value() {
        let schema = Schema::define("Open", |s| {
            s.declare_option("free", OptionSpec::new())?;
            Ok(())
        })
        .unwrap();
        assert!(!schema.has_condition("free"));

        for value in [
            Value::Null,
            Value::from(vec![1, 2]),
            Value::from(f64::NAN),
            Value::from("x"),
        ] {
            let opts = schema.parse([("free", value.clone())], &ParseConfig::default());
            assert_eq!(opts.unwrap().get("free").unwrap(), &value);
        }
    }

    #[test]
    fn test_parse_value_rejects_non_map() {
        let schema = combinations();
        let err = schema
            .parse_value(Value::from(vec![1, 2]), &ParseConfig::default())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "malformed options: options must be key-value pairs, got List"
        );
    }

    #[test]
    fn test_config_debug_hides_closure() {
        let config = ParseConfig::relaxed().with_exception(|e| e);
        assert_eq!(
            format!("{config:?}"),
            "ParseConfig { defined_only: false, exception: true }"
        );
    }
}
