//! Value conditions.
//!
//! A [`Condition`] is anything that can test a final option value. The
//! schema treats conditions as opaque and only calls
//! [`matches`](Condition::matches); [`describe`](Condition::describe) feeds
//! the error message when a value is rejected.
//!
//! Stock conditions cover type tags, numeric ranges, regular expressions,
//! enumerations, and closures. [`and`], [`or`] and [`not`] compose them.
//!
//! # Example
//!
//! ```
//! use optargs_core::condition::{self, Condition};
//! use optargs_core::{Value, ValueKind};
//!
//! let float_in_range = condition::and([
//!     condition::kind(ValueKind::Float),
//!     condition::in_range(3.0, 5.0),
//! ]);
//!
//! assert!(float_in_range.matches(&Value::from(5.0)));
//! assert!(!float_in_range.matches(&Value::from(5)));
//! assert_eq!(float_in_range.describe(), "AND(Float, 3..=5)");
//! ```

use std::fmt;
use std::sync::Arc;

use regex::Regex;

use crate::{Value, ValueKind};

/// A predicate over option values.
pub trait Condition: fmt::Debug + Send + Sync {
    /// Returns `true` if `value` satisfies the condition.
    fn matches(&self, value: &Value) -> bool;

    /// Human-readable rendering used in error messages.
    fn describe(&self) -> String;
}

/// Shared handle to a condition, as stored in a schema.
pub type SharedCondition = Arc<dyn Condition>;

/// Accepts every value. Useful as a branch of [`or`] or [`and`]; an option
/// with no condition skips the check entirely.
#[derive(Debug, Clone, Copy, Default)]
pub struct Anything;

impl Condition for Anything {
    fn matches(&self, _value: &Value) -> bool {
        true
    }

    fn describe(&self) -> String {
        "anything".to_string()
    }
}

/// Matches values of one [`ValueKind`].
#[derive(Debug, Clone, Copy)]
pub struct Kind(pub ValueKind);

impl Condition for Kind {
    fn matches(&self, value: &Value) -> bool {
        value.kind() == self.0
    }

    fn describe(&self) -> String {
        self.0.to_string()
    }
}

/// Matches `Int` or `Float` values inside an inclusive numeric range.
#[derive(Debug, Clone, Copy)]
pub struct InRange {
    pub start: f64,
    pub end: f64,
}

impl Condition for InRange {
    fn matches(&self, value: &Value) -> bool {
        value
            .as_number()
            .is_some_and(|n| self.start <= n && n <= self.end)
    }

    fn describe(&self) -> String {
        format!("{}..={}", self.start, self.end)
    }
}

/// Matches `Str` values against a regular expression.
#[derive(Debug, Clone)]
pub struct Pattern(pub Regex);

impl Condition for Pattern {
    fn matches(&self, value: &Value) -> bool {
        value.as_str().is_some_and(|s| self.0.is_match(s))
    }

    fn describe(&self) -> String {
        format!("/{}/", self.0.as_str())
    }
}

/// Matches any of an explicit list of values.
#[derive(Debug, Clone)]
pub struct OneOf(pub Vec<Value>);

impl Condition for OneOf {
    fn matches(&self, value: &Value) -> bool {
        self.0.contains(value)
    }

    fn describe(&self) -> String {
        let items: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        format!("one of [{}]", items.join(", "))
    }
}

/// Wraps a closure with a label for messages.
pub struct Predicate<F> {
    label: String,
    test: F,
}

impl<F> fmt::Debug for Predicate<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predicate")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

impl<F> Condition for Predicate<F>
where
    F: Fn(&Value) -> bool + Send + Sync,
{
    fn matches(&self, value: &Value) -> bool {
        (self.test)(value)
    }

    fn describe(&self) -> String {
        self.label.clone()
    }
}

/// Matches when every inner condition matches (AND).
#[derive(Debug, Clone)]
pub struct All(pub Vec<SharedCondition>);

impl Condition for All {
    fn matches(&self, value: &Value) -> bool {
        self.0.iter().all(|c| c.matches(value))
    }

    fn describe(&self) -> String {
        format!("AND({})", describe_each(&self.0))
    }
}

/// Matches when at least one inner condition matches (OR).
#[derive(Debug, Clone)]
pub struct AnyOf(pub Vec<SharedCondition>);

impl Condition for AnyOf {
    fn matches(&self, value: &Value) -> bool {
        self.0.iter().any(|c| c.matches(value))
    }

    fn describe(&self) -> String {
        format!("OR({})", describe_each(&self.0))
    }
}

/// Inverts a condition.
#[derive(Debug, Clone)]
pub struct Not(pub SharedCondition);

impl Condition for Not {
    fn matches(&self, value: &Value) -> bool {
        !self.0.matches(value)
    }

    fn describe(&self) -> String {
        format!("NOT({})", self.0.describe())
    }
}

fn describe_each(conditions: &[SharedCondition]) -> String {
    conditions
        .iter()
        .map(|c| c.describe())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Type-tag condition.
pub fn kind(kind: ValueKind) -> SharedCondition {
    Arc::new(Kind(kind))
}

/// Inclusive numeric range condition.
pub fn in_range(start: f64, end: f64) -> SharedCondition {
    Arc::new(InRange { start, end })
}

/// Regular-expression condition.
///
/// # Errors
///
/// Returns the [`regex::Error`] if `pattern` does not compile.
pub fn pattern(pattern: &str) -> Result<SharedCondition, regex::Error> {
    Ok(Arc::new(Pattern(Regex::new(pattern)?)))
}

/// Enumeration condition.
pub fn one_of<I, V>(values: I) -> SharedCondition
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    Arc::new(OneOf(values.into_iter().map(Into::into).collect()))
}

/// Closure condition; `label` is shown when a value is rejected.
///
/// # Examples
///
/// ```
/// use optargs_core::condition::{self, Condition};
/// use optargs_core::Value;
///
/// let even = condition::predicate("even", |v| v.as_i64().is_some_and(|n| n % 2 == 0));
/// assert!(even.matches(&Value::from(4)));
/// assert!(!even.matches(&Value::from(3)));
/// assert_eq!(even.describe(), "even");
/// ```
pub fn predicate<F>(label: impl Into<String>, test: F) -> SharedCondition
where
    F: Fn(&Value) -> bool + Send + Sync + 'static,
{
    Arc::new(Predicate {
        label: label.into(),
        test,
    })
}

/// AND combinator.
pub fn and<I>(conditions: I) -> SharedCondition
where
    I: IntoIterator<Item = SharedCondition>,
{
    Arc::new(All(conditions.into_iter().collect()))
}

/// OR combinator.
pub fn or<I>(conditions: I) -> SharedCondition
where
    I: IntoIterator<Item = SharedCondition>,
{
    Arc::new(AnyOf(conditions.into_iter().collect()))
}

/// Negation.
pub fn not(condition: SharedCondition) -> SharedCondition {
    Arc::new(Not(condition))
}
