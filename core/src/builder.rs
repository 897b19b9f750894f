//! Schema construction.
//!
//! Options are declared on a mutable [`SchemaBuilder`] and frozen into a
//! [`Schema`] with [`SchemaBuilder::finish`]. `finish` consumes the
//! builder, so nothing can be declared on a finished schema.
//!
//! Requirements may name options declared later in the same session; they
//! are resolved (through aliases and deprecated names too) when the schema
//! is finished.
//!
//! # Example
//!
//! ```
//! use optargs_core::{OptionSpec, SchemaBuilder};
//!
//! let mut builder = SchemaBuilder::new("FuncOptions");
//! builder
//!     .declare_option("a", OptionSpec::new().default(":)").aliases(["b", "c"]))?
//!     .declare_option("f", OptionSpec::new().required())?
//!     .declare_option("x", OptionSpec::new())?
//!     .declare_conflict(["a", "x"])?;
//! let schema = builder.finish()?;
//!
//! assert!(schema.is_required("f"));
//! assert_eq!(schema.canonical_key_for("c")?.as_str(), "a");
//! # Ok::<(), optargs_core::Error>(())
//! ```

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::adjust::Adjuster;
use crate::condition::SharedCondition;
use crate::schema::{Accessor, AccessorKind, NameEntry, OptionDef, SchemaTables};
use crate::{BoxError, Error, Key, NameKind, Notice, Result, Schema, Value};

/// Method names of [`ParsedOptions`](crate::ParsedOptions) that generated
/// accessors can shadow.
const BUILTIN_METHODS: &[&str] = &[
    "get",
    "fetch_by",
    "with",
    "presence",
    "invoke",
    "schema",
    "notices",
    "len",
    "is_empty",
    "to_pairs",
    "to_map",
    "to_string",
    "clone",
    "eq",
    "hash",
];

/// Settings for one declared option.
///
/// # Examples
///
/// ```
/// use optargs_core::condition;
/// use optargs_core::{adjust, OptionSpec, ValueKind};
///
/// let spec = OptionSpec::new()
///     .default("0.5")
///     .adjuster(adjust::to_float)
///     .condition(condition::and([
///         condition::kind(ValueKind::Float),
///         condition::in_range(0.0, 1.0),
///     ]))
///     .aliases(["ratio"])
///     .requires(["mode"]);
/// # let _ = spec;
/// ```
#[derive(Clone, Default)]
pub struct OptionSpec {
    required: bool,
    default: Option<Value>,
    aliases: Vec<Key>,
    deprecated_names: Vec<Key>,
    requirements: Vec<Key>,
    condition: Option<SharedCondition>,
    adjuster: Option<Adjuster>,
}

impl OptionSpec {
    pub fn new() -> Self {
        <Self as Default>::default()
    }

    /// Marks the option as mandatory in every parse.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Value used when the option is absent. It goes through the adjuster
    /// and condition at parse time, like a supplied value.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn aliases<I, K>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<Key>,
    {
        self.aliases.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn deprecated_names<I, K>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<Key>,
    {
        self.deprecated_names.extend(names.into_iter().map(Into::into));
        self
    }

    /// Names of options that must also be present whenever this one is.
    pub fn requires<I, K>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<Key>,
    {
        self.requirements.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn condition(mut self, condition: SharedCondition) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Transform applied to the raw value before the condition is tested.
    pub fn adjuster<F>(mut self, adjuster: F) -> Self
    where
        F: Fn(Value) -> std::result::Result<Value, BoxError> + Send + Sync + 'static,
    {
        self.adjuster = Some(Arc::new(adjuster));
        self
    }
}

impl fmt::Debug for OptionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionSpec")
            .field("required", &self.required)
            .field("default", &self.default)
            .field("aliases", &self.aliases)
            .field("deprecated_names", &self.deprecated_names)
            .field("requirements", &self.requirements)
            .field("condition", &self.condition)
            .field("adjuster", &self.adjuster.is_some())
            .finish()
    }
}

/// Accumulates option declarations for one schema.
pub struct SchemaBuilder {
    name: String,
    options: Vec<OptionDef>,
    pending_requirements: Vec<Vec<Key>>,
    names: Vec<NameEntry>,
    lookup: HashMap<Key, usize>,
    conflict_sets: Vec<Vec<usize>>,
    accessors: HashMap<String, Accessor>,
    notices: Vec<Notice>,
}

impl SchemaBuilder {
    /// Starts an empty declaration session.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            options: Vec::new(),
            pending_requirements: Vec::new(),
            names: Vec::new(),
            lookup: HashMap::new(),
            conflict_sets: Vec::new(),
            accessors: HashMap::new(),
            notices: Vec::new(),
        }
    }

    /// Declares an option under canonical key `name`.
    ///
    /// The canonical key, its aliases, and its deprecated names are all
    /// registered as names; a failed declaration leaves the builder
    /// untouched.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidDeclaration`] for an empty name.
    /// - [`Error::NameCollision`] if any name is already registered (or
    ///   repeated within this declaration).
    /// - [`Error::ConflictingDeclaration`] if the option is both required
    ///   and defaulted.
    pub fn declare_option(
        &mut self,
        name: impl Into<Key>,
        spec: OptionSpec,
    ) -> Result<&mut Self> {
        let key = name.into();

        let mut all_names =
            Vec::with_capacity(1 + spec.aliases.len() + spec.deprecated_names.len());
        all_names.push((key.clone(), NameKind::Canonical));
        all_names.extend(spec.aliases.iter().map(|n| (n.clone(), NameKind::Alias)));
        all_names.extend(
            spec.deprecated_names
                .iter()
                .map(|n| (n.clone(), NameKind::Deprecated)),
        );

        let mut fresh: HashSet<&Key> = HashSet::new();
        for (candidate, _) in &all_names {
            if candidate.is_blank() {
                return Err(Error::InvalidDeclaration(format!(
                    "option `{key}` declares an empty name"
                )));
            }
            if self.lookup.contains_key(candidate) || !fresh.insert(candidate) {
                return Err(Error::NameCollision(candidate.clone()));
            }
        }

        if spec.required && spec.default.is_some() {
            return Err(Error::ConflictingDeclaration {
                key,
                reason: "\"required\" conflicts with \"default\"".to_string(),
            });
        }

        let slot = self.options.len();
        self.options.push(OptionDef {
            key,
            required: spec.required,
            default: spec.default,
            condition: spec.condition,
            adjuster: spec.adjuster,
            requirements: Vec::new(),
        });
        self.pending_requirements.push(dedup(spec.requirements));

        for (name, kind) in all_names {
            self.register_name(name, slot, kind);
        }

        Ok(self)
    }

    fn register_name(&mut self, name: Key, slot: usize, kind: NameKind) {
        let generated = [
            (name.to_string(), AccessorKind::Fetch),
            (format!("fetch_by_{name}"), AccessorKind::Fetch),
            (format!("with_{name}?"), AccessorKind::Predicate),
            (format!("{name}?"), AccessorKind::Predicate),
        ];

        let overrides: Vec<String> = generated
            .iter()
            .filter(|(accessor, _)| {
                BUILTIN_METHODS.contains(&accessor.as_str())
                    || self.accessors.contains_key(accessor)
            })
            .map(|(accessor, _)| accessor.clone())
            .collect();

        for (accessor, accessor_kind) in generated {
            self.accessors.insert(
                accessor,
                Accessor {
                    slot,
                    kind: accessor_kind,
                },
            );
        }

        if !overrides.is_empty() {
            let notice = Notice::AccessorOverride {
                name: name.clone(),
                accessors: overrides,
            };
            notice.emit();
            self.notices.push(notice);
        }

        self.lookup.insert(name.clone(), self.names.len());
        self.names.push(NameEntry { name, slot, kind });
    }

    /// Declares that the given canonical keys may not all be present at
    /// once.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidDeclaration`] for fewer than two keys or a repeated
    ///   key.
    /// - [`Error::UnknownKey`] if any key is not a declared canonical key.
    /// - [`Error::DuplicateDeclaration`] if the same set (in any order) was
    ///   already declared.
    pub fn declare_conflict<I, K>(&mut self, keys: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = K>,
        K: Into<Key>,
    {
        let keys: Vec<Key> = keys.into_iter().map(Into::into).collect();
        let listed = join(&keys);

        if keys.len() < 2 {
            return Err(Error::InvalidDeclaration(format!(
                "a conflict needs at least two keys, got: {listed}"
            )));
        }
        if dedup(keys.clone()).len() != keys.len() {
            return Err(Error::InvalidDeclaration(format!(
                "conflict repeats a key: {listed}"
            )));
        }

        let not_canonical: Vec<Key> = keys
            .iter()
            .filter(|k| self.entry_kind(k) != Some(NameKind::Canonical))
            .cloned()
            .collect();
        if !not_canonical.is_empty() {
            return Err(Error::UnknownKey(join(&not_canonical)));
        }

        let slots: Vec<usize> = keys.iter().map(|k| self.names[self.lookup[k]].slot).collect();
        let mut sorted = slots.clone();
        sorted.sort_unstable();
        let duplicate = self.conflict_sets.iter().any(|existing| {
            let mut other = existing.clone();
            other.sort_unstable();
            other == sorted
        });
        if duplicate {
            return Err(Error::DuplicateDeclaration(format!(
                "conflict already declared: {listed}"
            )));
        }

        self.conflict_sets.push(slots);
        Ok(self)
    }

    fn entry_kind(&self, name: &Key) -> Option<NameKind> {
        self.lookup.get(name).map(|&index| self.names[index].kind)
    }

    /// Freezes the declarations into a [`Schema`].
    ///
    /// # Errors
    ///
    /// - [`Error::EmptySchema`] if no option was declared.
    /// - [`Error::UnresolvedRequirement`] if a requirement names an
    ///   undeclared option.
    pub fn finish(mut self) -> Result<Schema> {
        if self.options.is_empty() {
            return Err(Error::EmptySchema);
        }

        for (slot, names) in self.pending_requirements.iter().enumerate() {
            let mut resolved = Vec::with_capacity(names.len());
            let mut missing = Vec::new();
            for name in names {
                match self.lookup.get(name) {
                    Some(&index) => {
                        let target = self.names[index].slot;
                        if !resolved.contains(&target) {
                            resolved.push(target);
                        }
                    }
                    None => missing.push(name.clone()),
                }
            }
            if !missing.is_empty() {
                return Err(Error::UnresolvedRequirement {
                    key: self.options[slot].key.clone(),
                    missing: join(&missing),
                });
            }
            self.options[slot].requirements = resolved;
        }

        debug!(
            schema = %self.name,
            options = self.options.len(),
            names = self.names.len(),
            conflicts = self.conflict_sets.len(),
            "Finished option schema"
        );

        Ok(Schema::from_tables(SchemaTables {
            name: self.name,
            options: self.options,
            names: self.names,
            lookup: self.lookup,
            conflict_sets: self.conflict_sets,
            accessors: self.accessors,
            notices: self.notices,
        }))
    }
}

impl fmt::Debug for SchemaBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaBuilder")
            .field("name", &self.name)
            .field("options", &self.options.len())
            .field("names", &self.names)
            .finish_non_exhaustive()
    }
}

impl Schema {
    /// Runs a declaration session and finishes it.
    ///
    /// # Examples
    ///
    /// ```
    /// use optargs_core::{Error, OptionSpec, Schema};
    ///
    /// let schema = Schema::define("Opts", |s| {
    ///     s.declare_option("a", OptionSpec::new())?;
    ///     Ok(())
    /// });
    /// assert!(schema.is_ok());
    ///
    /// let empty = Schema::define("Empty", |_| Ok(()));
    /// assert!(matches!(empty, Err(Error::EmptySchema)));
    /// ```
    pub fn define<F>(name: impl Into<String>, declare: F) -> Result<Schema>
    where
        F: FnOnce(&mut SchemaBuilder) -> Result<()>,
    {
        let mut builder = SchemaBuilder::new(name);
        declare(&mut builder)?;
        builder.finish()
    }
}

fn dedup(keys: Vec<Key>) -> Vec<Key> {
    let mut seen = HashSet::new();
    keys.into_iter().filter(|k| seen.insert(k.clone())).collect()
}

fn join(keys: &[Key]) -> String {
    keys.iter()
        .map(Key::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition;

    #[test]
    fn test_required_with_default_is_rejected() {
        let mut builder = SchemaBuilder::new("Opts");
        let err = builder
            .declare_option("a", OptionSpec::new().required().default(1))
            .unwrap_err();
        assert!(
            matches!(err, Error::ConflictingDeclaration { ref key, .. } if key.as_str() == "a")
        );
    }

    #[test]
    fn test_name_collision_across_kinds() {
        let mut builder = SchemaBuilder::new("Opts");
        builder
            .declare_option("a", OptionSpec::new().deprecated_names(["old"]))
            .unwrap();
        let err = builder
            .declare_option("b", OptionSpec::new().aliases(["old"]))
            .unwrap_err();
        assert!(matches!(err, Error::NameCollision(ref k) if k.as_str() == "old"));
        // The failed declaration registered nothing.
        assert!(builder.declare_option("b", OptionSpec::new()).is_ok());
    }

    #[test]
    fn test_name_collision_within_one_declaration() {
        let mut builder = SchemaBuilder::new("Opts");
        let err = builder
            .declare_option("a", OptionSpec::new().aliases(["a"]))
            .unwrap_err();
        assert!(matches!(err, Error::NameCollision(_)));
    }

    #[test]
    fn test_empty_name_is_invalid() {
        let mut builder = SchemaBuilder::new("Opts");
        let err = builder
            .declare_option("a", OptionSpec::new().aliases([" "]))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidDeclaration(_)));
    }

    #[test]
    fn test_conflict_validation() {
        let mut builder = SchemaBuilder::new("Opts");
        builder
            .declare_option("a", OptionSpec::new().aliases(["a2"]))
            .unwrap()
            .declare_option("b", OptionSpec::new())
            .unwrap();

        assert!(matches!(
            builder.declare_conflict(["a"]),
            Err(Error::InvalidDeclaration(_))
        ));
        assert!(matches!(
            builder.declare_conflict(["a", "a"]),
            Err(Error::InvalidDeclaration(_))
        ));
        assert!(matches!(
            builder.declare_conflict(["a2", "b"]),
            Err(Error::UnknownKey(ref names)) if names == "a2"
        ));
        assert!(matches!(
            builder.declare_conflict(["a", "nope"]),
            Err(Error::UnknownKey(_))
        ));

        builder.declare_conflict(["a", "b"]).unwrap();
        assert!(matches!(
            builder.declare_conflict(["b", "a"]),
            Err(Error::DuplicateDeclaration(_))
        ));
    }

    #[test]
    fn test_forward_requirements_resolve_at_finish() {
        let schema = Schema::define("Opts", |s| {
            s.declare_option("b", OptionSpec::new().requires(["a", "d2", "d"]))?;
            s.declare_option("a", OptionSpec::new())?;
            s.declare_option("d", OptionSpec::new().aliases(["d2"]))?;
            Ok(())
        })
        .unwrap();

        let reqs: Vec<&str> = schema
            .requirements_of("b")
            .unwrap()
            .into_iter()
            .map(|k| k.as_str())
            .collect();
        assert_eq!(reqs, ["a", "d"]);
    }

    #[test]
    fn test_unresolved_requirement() {
        let err = Schema::define("Opts", |s| {
            s.declare_option("a", OptionSpec::new())?;
            s.declare_option("b", OptionSpec::new().requires(["a", "d", "e"]))?;
            s.declare_option("d", OptionSpec::new())?;
            Ok(())
        })
        .unwrap_err();
        assert_eq!(err.to_string(), "`b` with invalid requirements: e");
    }

    #[test]
    fn test_accessor_override_notice() {
        let schema = Schema::define("Opts", |s| {
            s.declare_option("get", OptionSpec::new())?;
            s.declare_option(
                "a",
                OptionSpec::new().condition(condition::kind(crate::ValueKind::Int)),
            )?;
            Ok(())
        })
        .unwrap();
        assert_eq!(
            schema.notices(),
            &[Notice::AccessorOverride {
                name: Key::from("get"),
                accessors: vec!["get".to_string()],
            }]
        );
        assert!(schema.has_condition("a"));
        assert!(!schema.has_adjuster("a"));
    }

    #[test]
    fn test_generated_accessor_shadowing_is_reported() {
        let schema = Schema::define("Opts", |s| {
            s.declare_option("a", OptionSpec::new())?;
            s.declare_option("fetch_by_a", OptionSpec::new())?;
            Ok(())
        })
        .unwrap();
        assert_eq!(schema.notices().len(), 1);
        assert_eq!(
            schema.notices()[0].to_string(),
            "override methods: fetch_by_a"
        );
    }
}
