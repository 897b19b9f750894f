//! The frozen option schema and its introspection API.
//!
//! A [`Schema`] is produced once by [`SchemaBuilder::finish`] and never
//! changes afterwards. It is a cheap handle over shared tables, so parsed
//! results keep a clone of it and concurrent parses only ever read it.
//!
//! [`SchemaBuilder::finish`]: crate::SchemaBuilder::finish

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::adjust::Adjuster;
use crate::condition::SharedCondition;
use crate::{Error, Key, Notice, Result, Value};

/// How a name relates to the option it resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NameKind {
    /// The option's own canonical key.
    Canonical,
    /// An additional accepted name, without warning.
    Alias,
    /// An accepted name that triggers a deprecation notice.
    Deprecated,
}

/// What a generated accessor returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AccessorKind {
    /// `N` / `fetch_by_N`: the stored or defaulted value.
    Fetch,
    /// `N?` / `with_N?`: whether the option is effectively present.
    Predicate,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Accessor {
    pub slot: usize,
    pub kind: AccessorKind,
}

#[derive(Clone)]
pub(crate) struct OptionDef {
    pub key: Key,
    pub required: bool,
    pub default: Option<Value>,
    pub condition: Option<SharedCondition>,
    pub adjuster: Option<Adjuster>,
    /// Slots of the options that must accompany this one.
    pub requirements: Vec<usize>,
}

#[derive(Debug, Clone)]
pub(crate) struct NameEntry {
    pub name: Key,
    pub slot: usize,
    pub kind: NameKind,
}

pub(crate) struct SchemaTables {
    pub name: String,
    /// Declared options, indexed by slot in declaration order.
    pub options: Vec<OptionDef>,
    /// Every registered name in registration order.
    pub names: Vec<NameEntry>,
    /// Name to index into `names`.
    pub lookup: HashMap<Key, usize>,
    pub conflict_sets: Vec<Vec<usize>>,
    pub accessors: HashMap<String, Accessor>,
    pub notices: Vec<Notice>,
}

/// An immutable, shareable option schema.
///
/// # Examples
///
/// ```
/// use optargs_core::{OptionSpec, Schema};
///
/// let schema = Schema::define("Reflect", |s| {
///     s.declare_option("b", OptionSpec::new().aliases(["b1"]))?;
///     s.declare_option("d", OptionSpec::new().deprecated_names(["d1"]))?;
///     Ok(())
/// })
/// .unwrap();
///
/// let keys: Vec<&str> = schema.canonical_keys().map(|k| k.as_str()).collect();
/// assert_eq!(keys, ["b", "d"]);
/// assert!(schema.is_alias("b1"));
/// assert!(schema.is_deprecated("d1"));
/// assert_eq!(schema.canonical_key_for("d1").unwrap().as_str(), "d");
/// ```
#[derive(Clone)]
pub struct Schema {
    pub(crate) tables: Arc<SchemaTables>,
}

impl Schema {
    pub(crate) fn from_tables(tables: SchemaTables) -> Self {
        Self {
            tables: Arc::new(tables),
        }
    }

    /// Schema name, used when rendering parsed results.
    pub fn name(&self) -> &str {
        &self.tables.name
    }

    /// Canonical keys in declaration order.
    pub fn canonical_keys(&self) -> impl ExactSizeIterator<Item = &Key> + '_ {
        self.tables.options.iter().map(|o| &o.key)
    }

    /// Every recognized name (canonical keys, aliases, deprecated names) in
    /// registration order.
    pub fn members(&self) -> impl Iterator<Item = &Key> + '_ {
        self.tables.names.iter().map(|e| &e.name)
    }

    /// `(name, canonical key)` pairs in registration order.
    pub fn names(&self) -> impl Iterator<Item = (&Key, &Key)> + '_ {
        self.tables
            .names
            .iter()
            .map(|e| (&e.name, &self.tables.options[e.slot].key))
    }

    pub fn aliases(&self) -> impl Iterator<Item = &Key> + '_ {
        self.names_of_kind(NameKind::Alias)
    }

    pub fn deprecated_names(&self) -> impl Iterator<Item = &Key> + '_ {
        self.names_of_kind(NameKind::Deprecated)
    }

    fn names_of_kind(&self, kind: NameKind) -> impl Iterator<Item = &Key> + '_ {
        self.tables
            .names
            .iter()
            .filter(move |e| e.kind == kind)
            .map(|e| &e.name)
    }

    /// Resolves any recognized name to its canonical key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownName`] if `name` was never declared.
    pub fn canonical_key_for(&self, name: &str) -> Result<&Key> {
        self.slot_of(name)
            .map(|slot| &self.tables.options[slot].key)
            .ok_or_else(|| Error::UnknownName(name.to_string()))
    }

    /// Returns how `name` was registered, or `None` if it is unknown.
    pub fn name_kind(&self, name: &str) -> Option<NameKind> {
        self.entry(name).map(|e| e.kind)
    }

    pub fn is_member(&self, name: &str) -> bool {
        self.entry(name).is_some()
    }

    pub fn is_canonical(&self, name: &str) -> bool {
        self.name_kind(name) == Some(NameKind::Canonical)
    }

    pub fn is_alias(&self, name: &str) -> bool {
        self.name_kind(name) == Some(NameKind::Alias)
    }

    pub fn is_deprecated(&self, name: &str) -> bool {
        self.name_kind(name) == Some(NameKind::Deprecated)
    }

    /// Whether the option behind `name` must be present in every parse.
    pub fn is_required(&self, name: &str) -> bool {
        self.option(name).is_some_and(|o| o.required)
    }

    pub fn has_default(&self, name: &str) -> bool {
        self.option(name).is_some_and(|o| o.default.is_some())
    }

    pub fn has_condition(&self, name: &str) -> bool {
        self.option(name).is_some_and(|o| o.condition.is_some())
    }

    pub fn has_adjuster(&self, name: &str) -> bool {
        self.option(name).is_some_and(|o| o.adjuster.is_some())
    }

    /// The raw (unadjusted) default declared for the option behind `name`.
    pub fn default_for(&self, name: &str) -> Option<&Value> {
        self.option(name).and_then(|o| o.default.as_ref())
    }

    /// Canonical keys that must accompany the option behind `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownName`] if `name` was never declared.
    pub fn requirements_of(&self, name: &str) -> Result<Vec<&Key>> {
        let option = self
            .option(name)
            .ok_or_else(|| Error::UnknownName(name.to_string()))?;
        Ok(option
            .requirements
            .iter()
            .map(|&slot| &self.tables.options[slot].key)
            .collect())
    }

    /// Declared conflict sets, each in declaration order.
    pub fn conflict_sets(&self) -> Vec<Vec<&Key>> {
        self.tables
            .conflict_sets
            .iter()
            .map(|set| set.iter().map(|&slot| &self.tables.options[slot].key).collect())
            .collect()
    }

    /// Names of every generated accessor, sorted.
    pub fn accessor_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tables.accessors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Advisory notices raised while the schema was declared.
    pub fn notices(&self) -> &[Notice] {
        &self.tables.notices
    }

    /// Returns `true` if both handles refer to the same finished schema.
    pub fn same(&self, other: &Schema) -> bool {
        Arc::ptr_eq(&self.tables, &other.tables)
    }

    pub(crate) fn entry(&self, name: &str) -> Option<&NameEntry> {
        self.tables
            .lookup
            .get(name)
            .map(|&index| &self.tables.names[index])
    }

    pub(crate) fn slot_of(&self, name: &str) -> Option<usize> {
        self.entry(name).map(|e| e.slot)
    }

    pub(crate) fn option(&self, name: &str) -> Option<&OptionDef> {
        self.slot_of(name).map(|slot| &self.tables.options[slot])
    }

    pub(crate) fn accessor(&self, accessor: &str) -> Option<Accessor> {
        self.tables.accessors.get(accessor).copied()
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("name", &self.tables.name)
            .field("keys", &self.canonical_keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use crate::{OptionSpec, Schema};

    fn reflection_schema() -> Schema {
        Schema::define("Reflect", |s| {
            s.declare_option("a", OptionSpec::new())?;
            s.declare_option("b", OptionSpec::new().aliases(["b1"]))?;
            s.declare_option("c", OptionSpec::new().aliases(["c1", "c2"]))?;
            s.declare_option("d", OptionSpec::new().deprecated_names(["d1"]))?;
            s.declare_option("e", OptionSpec::new().deprecated_names(["e1", "e2"]))?;
            s.declare_option("z", OptionSpec::new())?;
            s.declare_conflict(["a", "z"])?;
            Ok(())
        })
        .unwrap()
    }

    fn strs<'a>(keys: impl Iterator<Item = &'a crate::Key>) -> Vec<&'a str> {
        keys.map(|k| k.as_str()).collect()
    }

    #[test]
    fn test_canonical_keys_in_declaration_order() {
        let schema = reflection_schema();
        assert_eq!(strs(schema.canonical_keys()), ["a", "b", "c", "d", "e", "z"]);
    }

    #[test]
    fn test_members_and_names() {
        let schema = reflection_schema();
        assert_eq!(
            strs(schema.members()),
            ["a", "b", "b1", "c", "c1", "c2", "d", "d1", "e", "e1", "e2", "z"]
        );
        let pairs: Vec<(&str, &str)> = schema
            .names()
            .map(|(n, k)| (n.as_str(), k.as_str()))
            .collect();
        assert!(pairs.contains(&("c2", "c")));
        assert!(pairs.contains(&("e1", "e")));
        assert_eq!(pairs.len(), 12);
    }

    #[test]
    fn test_aliases_and_deprecated_names() {
        let schema = reflection_schema();
        assert_eq!(strs(schema.aliases()), ["b1", "c1", "c2"]);
        assert_eq!(strs(schema.deprecated_names()), ["d1", "e1", "e2"]);
    }

    #[test]
    fn test_name_predicates() {
        let schema = reflection_schema();
        assert!(schema.is_canonical("a"));
        assert!(!schema.is_canonical("b1"));
        assert!(schema.is_member("e2"));
        assert!(!schema.is_member("undefined"));
        assert!(schema.is_alias("c1"));
        assert!(!schema.is_alias("d1"));
        assert!(!schema.is_alias("a"));
        assert!(schema.is_deprecated("d1"));
        assert!(!schema.is_deprecated("d"));
        assert!(!schema.is_deprecated("undefined"));
    }

    #[test]
    fn test_canonical_key_for_unknown_name() {
        let schema = reflection_schema();
        assert!(matches!(
            schema.canonical_key_for("nope"),
            Err(crate::Error::UnknownName(name)) if name == "nope"
        ));
    }

    #[test]
    fn test_conflict_sets_and_accessors() {
        let schema = reflection_schema();
        let sets: Vec<Vec<&str>> = schema
            .conflict_sets()
            .into_iter()
            .map(|set| set.into_iter().map(|k| k.as_str()).collect())
            .collect();
        assert_eq!(sets, vec![vec!["a", "z"]]);

        let accessors = schema.accessor_names();
        assert!(accessors.contains(&"fetch_by_b1"));
        assert!(accessors.contains(&"with_e2?"));
        assert!(accessors.contains(&"z?"));
        assert_eq!(accessors.len(), 12 * 4);
    }

    #[test]
    fn test_clones_are_the_same_schema() {
        let schema = reflection_schema();
        let other = reflection_schema();
        assert!(schema.same(&schema.clone()));
        assert!(!schema.same(&other));
    }
}
