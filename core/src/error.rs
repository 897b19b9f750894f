//! Error types for schema declaration, option parsing, and option lookup.
//!
//! A single [`Error`] enum covers every failure mode. Declaration-time
//! variants are fatal for the schema being built; parse-time variants
//! (see [`Error::is_parse_failure`]) are recoverable and can be swapped for
//! a caller-chosen error through
//! [`ParseConfig::with_exception`](crate::ParseConfig::with_exception).

use thiserror::Error;

use crate::{Key, Value};

/// Boxed, thread-safe error used for adjuster failures and substituted
/// parse errors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised while declaring a schema, parsing options, or reading a
/// parsed result.
#[derive(Debug, Error)]
pub enum Error {
    /// Input is not key/value shaped, names an unknown option, misses a
    /// required option, or leaves a requirement unmet.
    #[error("malformed options: {0}")]
    MalformedOptions(String),

    /// Two input names resolve to one option, or a declared conflict set is
    /// fully present.
    #[error("key conflict: {0}")]
    KeyConflict(String),

    /// An adjuster failed while transforming a value.
    #[error("invalid adjusting for `{key}`: {source}")]
    InvalidAdjusting {
        /// Canonical key whose value was being adjusted.
        key: Key,
        /// Error returned by the adjuster.
        #[source]
        source: BoxError,
    },

    /// A supplied or defaulted value fails its condition.
    #[error("{value} is deficient for {condition} (option `{key}`)")]
    InvalidWriting {
        /// Canonical key the value was written to.
        key: Key,
        /// The (adjusted) value that was rejected.
        value: Value,
        /// Description of the condition it failed.
        condition: String,
    },

    /// A name or accessor that the schema never declared.
    #[error("unknown name: {0}")]
    UnknownName(String),

    /// Option is declared but neither stored nor defaulted.
    #[error("no value stored or defaulted for `{0}`")]
    NoSuchValue(Key),

    /// A name is already registered as a canonical key, alias, or
    /// deprecated name.
    #[error("already defined the name: {0}")]
    NameCollision(Key),

    /// Mutually exclusive declaration settings were combined.
    #[error("conflicting declaration for `{key}`: {reason}")]
    ConflictingDeclaration {
        /// Canonical key being declared.
        key: Key,
        /// Which settings clash.
        reason: String,
    },

    /// A declaration is structurally unusable (empty name, short or
    /// repetitive conflict set).
    #[error("invalid declaration: {0}")]
    InvalidDeclaration(String),

    /// A conflict set references names that are not canonical keys.
    #[error("not declared as canonical keys: {0}")]
    UnknownKey(String),

    /// The same conflict set was declared twice.
    #[error("duplicate declaration: {0}")]
    DuplicateDeclaration(String),

    /// Requirements still name undeclared options when the schema is
    /// finished.
    #[error("`{key}` with invalid requirements: {missing}")]
    UnresolvedRequirement {
        /// Canonical key owning the requirement list.
        key: Key,
        /// Comma-separated unresolved names.
        missing: String,
    },

    /// `finish` was called before any option was declared.
    #[error("no assigned options yet")]
    EmptySchema,

    /// A parse failure replaced by the caller's own error kind.
    #[error(transparent)]
    Substituted(BoxError),

    /// Reading parse configuration from disk failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse configuration is not valid YAML for [`ParseConfig`](crate::ParseConfig).
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Returns `true` for the recoverable parse-time family: malformed
    /// options, key conflicts, and adjusting/writing failures.
    ///
    /// Only these are replaced when a parse is configured with an
    /// alternate error kind.
    ///
    /// # Examples
    ///
    /// ```
    /// use optargs_core::Error;
    ///
    /// assert!(Error::KeyConflict("a, b".into()).is_parse_failure());
    /// assert!(!Error::EmptySchema.is_parse_failure());
    /// ```
    pub fn is_parse_failure(&self) -> bool {
        matches!(
            self,
            Self::MalformedOptions(_)
                | Self::KeyConflict(_)
                | Self::InvalidAdjusting { .. }
                | Self::InvalidWriting { .. }
        )
    }
}

/// Convenience alias for results with [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
