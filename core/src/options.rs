//! Parsed, read-only option results.
//!
//! A [`ParsedOptions`] maps canonical keys to their final values. Values
//! can be read by any declared name, or through the generated accessor
//! table (`N`, `fetch_by_N`, `N?`, `with_N?` for every name `N`) with
//! [`ParsedOptions::invoke`].

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::schema::AccessorKind;
use crate::{Error, Key, Notice, Result, Schema, Value};

/// Result of a generated accessor call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accessed<'a> {
    /// From `N` or `fetch_by_N`.
    Value(&'a Value),
    /// From `N?` or `with_N?`.
    Flag(bool),
}

impl<'a> Accessed<'a> {
    pub fn value(self) -> Option<&'a Value> {
        match self {
            Self::Value(value) => Some(value),
            Self::Flag(_) => None,
        }
    }

    pub fn flag(self) -> Option<bool> {
        match self {
            Self::Flag(flag) => Some(flag),
            Self::Value(_) => None,
        }
    }
}

/// Validated options from one parse call.
///
/// Two results are equal when they come from the same [`Schema`] and hold
/// equal values under the same keys. Notices are not compared.
///
/// # Examples
///
/// ```
/// use optargs_core::{OptionSpec, ParseConfig, Schema, Value};
///
/// let schema = Schema::define("optargs", |s| {
///     s.declare_option("a", OptionSpec::new())?;
///     s.declare_option("b", OptionSpec::new().aliases(["b2"]))?;
///     s.declare_option("c", OptionSpec::new().default("C"))?;
///     Ok(())
/// })
/// .unwrap();
///
/// let opts = schema.parse([("a", "A")], &ParseConfig::default()).unwrap();
/// assert_eq!(opts.to_string(), r#"<optargs: a="A", c="C">"#);
/// assert_eq!(opts.get("c").unwrap(), &Value::from("C"));
/// assert!(!opts.with("b2").unwrap());
/// assert_eq!(opts, schema.parse([("a", "A")], &ParseConfig::default()).unwrap());
/// ```
#[derive(Debug, Clone)]
pub struct ParsedOptions {
    schema: Schema,
    slots: Vec<Option<Value>>,
    notices: Vec<Notice>,
}

impl ParsedOptions {
    pub(crate) fn new(schema: Schema, slots: Vec<Option<Value>>, notices: Vec<Notice>) -> Self {
        Self {
            schema,
            slots,
            notices,
        }
    }

    /// The schema this result was parsed with.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Deprecation notices raised by this parse, in input order.
    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Value for any declared name: the stored value, else the declared
    /// default.
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownName`] if `name` was never declared.
    /// - [`Error::NoSuchValue`] if the option was neither given nor
    ///   defaulted.
    pub fn get(&self, name: &str) -> Result<&Value> {
        let slot = self.slot(name)?;
        self.fetch(slot)
    }

    /// Same as [`get`](ParsedOptions::get).
    pub fn fetch_by(&self, name: &str) -> Result<&Value> {
        self.get(name)
    }

    /// Whether the option behind `name` is effectively present: given in
    /// the input, or covered by a declared default.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownName`] if `name` was never declared.
    pub fn with(&self, name: &str) -> Result<bool> {
        let slot = self.slot(name)?;
        Ok(self.is_effectively_present(slot))
    }

    /// Whether a value is stored for `name`, ignoring declared defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownName`] if `name` was never declared.
    pub fn presence(&self, name: &str) -> Result<bool> {
        let slot = self.slot(name)?;
        Ok(self.slots[slot].is_some())
    }

    /// Calls a generated accessor by its name.
    ///
    /// # Examples
    ///
    /// ```
    /// use optargs_core::{Accessed, OptionSpec, ParseConfig, Schema, Value};
    ///
    /// let schema = Schema::define("Opts", |s| {
    ///     s.declare_option("origin", OptionSpec::new().aliases(["aliased"]))?;
    ///     Ok(())
    /// })
    /// .unwrap();
    /// let opts = schema.parse([("aliased", ":)")], &ParseConfig::default()).unwrap();
    ///
    /// let value = Value::from(":)");
    /// assert_eq!(opts.invoke("origin").unwrap(), Accessed::Value(&value));
    /// assert_eq!(opts.invoke("fetch_by_aliased").unwrap(), Accessed::Value(&value));
    /// assert_eq!(opts.invoke("with_origin?").unwrap(), Accessed::Flag(true));
    /// assert_eq!(opts.invoke("aliased?").unwrap(), Accessed::Flag(true));
    /// assert!(opts.invoke("missing?").is_err());
    /// ```
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownName`] if no accessor has that name.
    /// - [`Error::NoSuchValue`] for a fetch accessor of an absent,
    ///   undefaulted option.
    pub fn invoke(&self, accessor: &str) -> Result<Accessed<'_>> {
        let found = self
            .schema
            .accessor(accessor)
            .ok_or_else(|| Error::UnknownName(accessor.to_string()))?;
        match found.kind {
            AccessorKind::Fetch => self.fetch(found.slot).map(Accessed::Value),
            AccessorKind::Predicate => Ok(Accessed::Flag(self.is_effectively_present(found.slot))),
        }
    }

    /// Number of canonical keys holding a value.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|v| v.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(canonical key, value)` pairs in declaration order.
    ///
    /// The iterator is lazy and can be cloned to restart it.
    pub fn to_pairs(&self) -> Pairs<'_> {
        Pairs {
            keys: &self.schema.tables.options,
            slots: &self.slots,
            next: 0,
        }
    }

    /// An independent copy of the canonical key to value mapping.
    pub fn to_map(&self) -> BTreeMap<Key, Value> {
        self.to_pairs()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    fn slot(&self, name: &str) -> Result<usize> {
        self.schema
            .slot_of(name)
            .ok_or_else(|| Error::UnknownName(name.to_string()))
    }

    fn fetch(&self, slot: usize) -> Result<&Value> {
        let option = &self.schema.tables.options[slot];
        self.slots[slot]
            .as_ref()
            .or(option.default.as_ref())
            .ok_or_else(|| Error::NoSuchValue(option.key.clone()))
    }

    fn is_effectively_present(&self, slot: usize) -> bool {
        self.slots[slot].is_some() || self.schema.tables.options[slot].default.is_some()
    }
}

/// Iterator over the stored pairs of a [`ParsedOptions`].
#[derive(Clone)]
pub struct Pairs<'a> {
    keys: &'a [crate::schema::OptionDef],
    slots: &'a [Option<Value>],
    next: usize,
}

impl<'a> Iterator for Pairs<'a> {
    type Item = (&'a Key, &'a Value);

    fn next(&mut self) -> Option<Self::Item> {
        while self.next < self.slots.len() {
            let slot = self.next;
            self.next += 1;
            if let Some(value) = &self.slots[slot] {
                return Some((&self.keys[slot].key, value));
            }
        }
        None
    }
}

impl fmt::Debug for Pairs<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

impl<'a> IntoIterator for &'a ParsedOptions {
    type Item = (&'a Key, &'a Value);
    type IntoIter = Pairs<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.to_pairs()
    }
}

impl PartialEq for ParsedOptions {
    fn eq(&self, other: &Self) -> bool {
        self.schema.same(&other.schema) && self.slots == other.slots
    }
}

impl Eq for ParsedOptions {}

impl Hash for ParsedOptions {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.slots.hash(state);
    }
}

impl fmt::Display for ParsedOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}: ", self.schema.name())?;
        for (i, (key, value)) in self.to_pairs().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key}={value}")?;
        }
        f.write_str(">")
    }
}

impl Serialize for ParsedOptions {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self.to_pairs() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::{OptionSpec, ParseConfig};

    fn basic() -> Schema {
        Schema::define("optargs", |s| {
            s.declare_option("a", OptionSpec::new())?;
            s.declare_option("b", OptionSpec::new().aliases(["b2"]))?;
            s.declare_option("c", OptionSpec::new().default("C"))?;
            Ok(())
        })
        .unwrap()
    }

    fn parse(schema: &Schema, pairs: Vec<(&str, Value)>) -> ParsedOptions {
        schema.parse(pairs, &ParseConfig::default()).unwrap()
    }

    #[test]
    fn test_to_pairs_in_declaration_order() {
        let schema = basic();
        let opts = parse(&schema, vec![("b2", Value::from("B2")), ("a", Value::from("A"))]);
        let pairs: Vec<(&str, &Value)> = opts.to_pairs().map(|(k, v)| (k.as_str(), v)).collect();
        assert_eq!(
            pairs,
            vec![
                ("a", &Value::from("A")),
                ("b", &Value::from("B2")),
                ("c", &Value::from("C")),
            ]
        );
    }

    #[test]
    fn test_pairs_restart_when_cloned() {
        let schema = basic();
        let opts = parse(&schema, vec![("a", Value::from(1))]);
        let mut pairs = opts.to_pairs();
        let restart = pairs.clone();
        assert_eq!(pairs.next().map(|(k, _)| k.as_str()), Some("a"));
        assert_eq!(pairs.next().map(|(k, _)| k.as_str()), Some("c"));
        assert!(pairs.next().is_none());
        assert_eq!(restart.count(), 2);
        assert_eq!((&opts).into_iter().count(), 2);
    }

    #[test]
    fn test_to_map_is_independent() {
        let schema = basic();
        let opts = parse(&schema, vec![("a", Value::from("A"))]);
        let mut map = opts.to_map();
        map.insert(Key::from("b"), Value::from("mutated"));
        assert_eq!(opts.to_map().len(), 2);
        assert!(!opts.presence("b").unwrap());
    }

    #[test]
    fn test_get_missing_value() {
        let schema = basic();
        let opts = parse(&schema, vec![]);
        assert!(matches!(opts.get("b"), Err(Error::NoSuchValue(ref k)) if k.as_str() == "b"));
        assert!(matches!(opts.get("q"), Err(Error::UnknownName(_))));
        assert!(!opts.with("b").unwrap());
        assert!(opts.with("c").unwrap());
        assert!(opts.presence("c").unwrap());
    }

    #[test]
    fn test_equality_and_hash() {
        let schema = basic();
        let one = parse(&schema, vec![("a", Value::from(1))]);
        let same = parse(&schema, vec![("a", Value::from(1))]);
        let float = parse(&schema, vec![("a", Value::from(1.0))]);
        let empty = parse(&schema, vec![]);
        let with_null = parse(&schema, vec![("a", Value::from(1)), ("b", Value::Null)]);

        assert_eq!(one, same);
        assert_ne!(one, float);
        assert_ne!(one, empty);
        assert_ne!(one, with_null);

        let mut table = HashMap::new();
        table.insert(one, "MATCH");
        assert_eq!(table.get(&same), Some(&"MATCH"));
    }

    #[test]
    fn test_equality_requires_same_schema() {
        let first = parse(&basic(), vec![("a", Value::from(1))]);
        let second = parse(&basic(), vec![("a", Value::from(1))]);
        assert_eq!(first.to_map(), second.to_map());
        assert_ne!(first, second);
    }

    #[test]
    fn test_display_and_serialize() {
        let schema = basic();
        let opts = parse(&schema, vec![("a", Value::from(vec![1, 2]))]);
        assert_eq!(opts.to_string(), r#"<optargs: a=[1, 2], c="C">"#);
        assert_eq!(
            serde_json::to_string(&opts).unwrap(),
            r#"{"a":[1,2],"c":"C"}"#
        );
    }

    #[test]
    fn test_invoke_predicate_uses_defaults() {
        let schema = basic();
        let opts = parse(&schema, vec![]);
        assert_eq!(opts.invoke("c?").unwrap(), Accessed::Flag(true));
        assert_eq!(opts.invoke("with_b2?").unwrap(), Accessed::Flag(false));
        assert!(matches!(opts.invoke("b"), Err(Error::NoSuchValue(_))));
        assert_eq!(opts.invoke("fetch_by_c").unwrap().value(), Some(&Value::from("C")));
        assert_eq!(opts.invoke("c?").unwrap().flag(), Some(true));
    }
}
