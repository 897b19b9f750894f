//! Advisory notices.
//!
//! Notices never abort declaration or parsing. They are logged through
//! `tracing` at warn level and also handed back to the caller: parse
//! notices on [`ParsedOptions::notices`](crate::ParsedOptions::notices),
//! declaration notices on [`Schema::notices`](crate::Schema::notices).

use std::fmt;

use crate::Key;

/// A non-fatal observation made while declaring or parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// A deprecated name was used in parse input.
    Deprecated {
        /// The deprecated name as supplied.
        name: Key,
        /// Canonical key it resolves to.
        replacement: Key,
    },
    /// Generated accessors shadow built-in `ParsedOptions` methods.
    AccessorOverride {
        /// Name whose accessors were generated.
        name: Key,
        /// The colliding accessor names.
        accessors: Vec<String>,
    },
}

impl Notice {
    pub(crate) fn emit(&self) {
        tracing::warn!("{self}");
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deprecated { name, replacement } => {
                write!(f, "`{name}` is deprecated, use `{replacement}`")
            }
            Self::AccessorOverride { accessors, .. } => {
                write!(f, "override methods: {}", accessors.join(", "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deprecated_message() {
        let notice = Notice::Deprecated {
            name: Key::from("e2"),
            replacement: Key::from("e"),
        };
        assert_eq!(notice.to_string(), "`e2` is deprecated, use `e`");
    }

    #[test]
    fn test_override_message() {
        let notice = Notice::AccessorOverride {
            name: Key::from("get"),
            accessors: vec!["get".to_string()],
        };
        assert_eq!(notice.to_string(), "override methods: get");
    }
}
