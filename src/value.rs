//! The dynamic value model that lenses transform.
//!
//! Every lens in this crate maps between two [`Value`] trees: a *concrete*
//! value (the source of truth) and an *abstract* value (the derived view).
//! `Value` is a closed enum over the semi-structured data the engine
//! understands: primitive scalars, ordered sequences, and unordered keyed
//! records.
//!
//! # Absence and loose equality
//!
//! [`Value::Undefined`] models the absent value. `putback` implementations
//! receive `Undefined` when there is no prior concrete value, and record
//! entries mapped to `Undefined` are indistinguishable from missing entries.
//! The crate's structural equality is deliberately *loose* in exactly that
//! one place:
//!
//! ```
//! use bilens::record;
//! use bilens::value::Value;
//!
//! let sparse = record! { "a" => 1.0, "b" => Value::Undefined };
//! let dense = record! { "a" => 1.0 };
//! assert_eq!(sparse, dense);
//! ```
//!
//! This looseness is relied upon by combinators that reconstruct records key
//! by key; do not tighten it.
//!
//! # Predicates
//!
//! Record-reshaping combinators partition records by key. [`KeyPred`]
//! normalizes the ways a caller can describe a key set (a single name, a
//! list of names, an arbitrary test function) into one type.
//! [`ValuePred`] is the whole-value analogue used by the conditional
//! combinators.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

// =============================================================================
// Value
// =============================================================================

/// A semi-structured datum: the universe both sides of a lens range over.
///
/// # Examples
///
/// ```
/// use bilens::{record, seq_value};
/// use bilens::value::Value;
///
/// let tree = record! {
///     "name" => "rectangle",
///     "size" => seq_value![20.0, 30.0],
/// };
/// assert!(tree.is_record());
/// ```
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    /// The absent value. Also what a missing record entry reads as.
    Undefined,
    /// A boolean scalar.
    Bool(bool),
    /// A numeric scalar. All numbers are `f64`.
    Num(f64),
    /// A string scalar.
    Str(String),
    /// An ordered sequence.
    Seq(Vec<Value>),
    /// An unordered record with unique string keys.
    Record(BTreeMap<String, Value>),
}

impl Value {
    /// Returns `true` unless this value is [`Value::Undefined`].
    pub const fn is_defined(&self) -> bool {
        !matches!(self, Self::Undefined)
    }

    /// Returns `true` if this value is a record.
    pub const fn is_record(&self) -> bool {
        matches!(self, Self::Record(_))
    }

    /// Returns `true` if this value is a sequence.
    pub const fn is_seq(&self) -> bool {
        matches!(self, Self::Seq(_))
    }

    /// Returns the numeric payload, if this value is a number.
    pub const fn as_num(&self) -> Option<f64> {
        match self {
            Self::Num(number) => Some(*number),
            _ => None,
        }
    }

    /// Returns the boolean payload, if this value is a boolean.
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(flag) => Some(*flag),
            _ => None,
        }
    }

    /// Returns the string payload, if this value is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(text) => Some(text),
            _ => None,
        }
    }

    /// Returns the elements, if this value is a sequence.
    pub fn as_seq(&self) -> Option<&[Value]> {
        match self {
            Self::Seq(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the entries, if this value is a record.
    pub const fn as_record(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Self::Record(entries) => Some(entries),
            _ => None,
        }
    }

    /// Looks up a record entry, reading a missing key as `Undefined`.
    ///
    /// Returns `Undefined` when this value is not a record at all; shape
    /// errors are the caller's concern.
    pub fn entry(&self, key: &str) -> &Value {
        match self {
            Self::Record(entries) => entries.get(key).unwrap_or(&Self::Undefined),
            _ => &Self::Undefined,
        }
    }
}

/// Loose structural equality.
///
/// Two records are equal when their *defined* entry sets are pairwise equal;
/// a key mapped to `Undefined` counts as absent. Everything else is ordinary
/// structural equality.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Undefined, Self::Undefined) => true,
            (Self::Bool(left), Self::Bool(right)) => left == right,
            (Self::Num(left), Self::Num(right)) => left == right,
            (Self::Str(left), Self::Str(right)) => left == right,
            (Self::Seq(left), Self::Seq(right)) => left == right,
            (Self::Record(left), Self::Record(right)) => {
                left.keys().chain(right.keys()).all(|key| {
                    let here = left.get(key).unwrap_or(&Self::Undefined);
                    let there = right.get(key).unwrap_or(&Self::Undefined);
                    here == there
                })
            }
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => write!(formatter, "undefined"),
            Self::Bool(flag) => write!(formatter, "{flag}"),
            Self::Num(number) => write!(formatter, "{number}"),
            Self::Str(text) => write!(formatter, "{text:?}"),
            Self::Seq(items) => {
                write!(formatter, "[")?;
                for (position, item) in items.iter().enumerate() {
                    if position > 0 {
                        write!(formatter, ", ")?;
                    }
                    write!(formatter, "{item}")?;
                }
                write!(formatter, "]")
            }
            Self::Record(entries) => {
                write!(formatter, "{{")?;
                for (position, (key, value)) in entries.iter().enumerate() {
                    if position > 0 {
                        write!(formatter, ", ")?;
                    }
                    write!(formatter, "{key:?}: {value}")?;
                }
                write!(formatter, "}}")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(flag: bool) -> Self {
        Self::Bool(flag)
    }
}

impl From<f64> for Value {
    fn from(number: f64) -> Self {
        Self::Num(number)
    }
}

impl From<i32> for Value {
    fn from(number: i32) -> Self {
        Self::Num(f64::from(number))
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Self::Str(text.to_string())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Self::Str(text)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::Seq(items)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(entries: BTreeMap<String, Value>) -> Self {
        Self::Record(entries)
    }
}

// =============================================================================
// Key Predicates
// =============================================================================

/// A normalized predicate over record keys.
///
/// Combinators that partition records (`fork`, `filter`, `rename`, ...)
/// accept anything convertible into a `KeyPred`: a single key name, a list
/// of names, or an arbitrary test function.
///
/// # Examples
///
/// ```
/// use bilens::value::KeyPred;
///
/// let single = KeyPred::from("x");
/// assert!(single.matches("x"));
/// assert!(!single.matches("y"));
///
/// let several = KeyPred::keys(["x", "y"]);
/// assert!(several.matches("y"));
///
/// let custom = KeyPred::test(|key| key.starts_with("item"));
/// assert!(custom.matches("item3"));
/// ```
#[derive(Clone)]
pub enum KeyPred {
    /// Matches every key.
    Always,
    /// Matches no key.
    Never,
    /// Matches exactly one key.
    Key(String),
    /// Matches any key in the list.
    Keys(Vec<String>),
    /// Matches keys accepted by the test function.
    Test(Rc<dyn Fn(&str) -> bool>),
}

impl KeyPred {
    /// Builds a predicate matching any of the given keys.
    pub fn keys<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        Self::Keys(keys.into_iter().map(Into::into).collect())
    }

    /// Builds a predicate from an arbitrary test function.
    pub fn test(test: impl Fn(&str) -> bool + 'static) -> Self {
        Self::Test(Rc::new(test))
    }

    /// Returns `true` if the predicate accepts `key`.
    pub fn matches(&self, key: &str) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Key(name) => name == key,
            Self::Keys(names) => names.iter().any(|name| name == key),
            Self::Test(test) => test(key),
        }
    }
}

impl fmt::Debug for KeyPred {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Always => write!(formatter, "Always"),
            Self::Never => write!(formatter, "Never"),
            Self::Key(name) => write!(formatter, "Key({name:?})"),
            Self::Keys(names) => write!(formatter, "Keys({names:?})"),
            Self::Test(_) => write!(formatter, "Test(..)"),
        }
    }
}

impl From<&str> for KeyPred {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

impl From<String> for KeyPred {
    fn from(key: String) -> Self {
        Self::Key(key)
    }
}

impl From<Vec<String>> for KeyPred {
    fn from(keys: Vec<String>) -> Self {
        Self::Keys(keys)
    }
}

// =============================================================================
// Value Predicates
// =============================================================================

/// A shared predicate over whole values.
///
/// The conditional combinators (`ccond`, `acond`, `cond`) dispatch on
/// `ValuePred`s. Predicates are evaluated fresh on every call; they must be
/// cheap and side-effect free.
#[derive(Clone)]
pub struct ValuePred {
    test: Rc<dyn Fn(&Value) -> bool>,
}

impl ValuePred {
    /// Wraps a test function.
    pub fn new(test: impl Fn(&Value) -> bool + 'static) -> Self {
        Self {
            test: Rc::new(test),
        }
    }

    /// A predicate that holds when the value is a record defining `key`.
    ///
    /// A key mapped to `Undefined` counts as absent, consistent with loose
    /// equality.
    pub fn has(key: impl Into<String>) -> Self {
        let key = key.into();
        Self::new(move |value| value.entry(&key).is_defined())
    }

    /// A predicate that always holds.
    pub fn always() -> Self {
        Self::new(|_| true)
    }

    /// Evaluates the predicate.
    pub fn check(&self, value: &Value) -> bool {
        (self.test)(value)
    }
}

impl fmt::Debug for ValuePred {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_struct("ValuePred").finish_non_exhaustive()
    }
}

// =============================================================================
// Construction Macros
// =============================================================================

/// Builds a [`Value::Record`] from `key => value` pairs.
///
/// Values go through [`Value::from`], so scalars, strings, and nested
/// `Value`s all work.
///
/// # Examples
///
/// ```
/// use bilens::{record, seq_value};
///
/// let point = record! { "x" => 10.0, "y" => 20.0 };
/// let nested = record! { "point" => point, "tags" => seq_value!["a", "b"] };
/// assert!(nested.is_record());
/// ```
#[macro_export]
macro_rules! record {
    () => {
        $crate::value::Value::Record(std::collections::BTreeMap::new())
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut entries = std::collections::BTreeMap::new();
        $(
            entries.insert(String::from($key), $crate::value::Value::from($value));
        )+
        $crate::value::Value::Record(entries)
    }};
}

/// Builds a [`Value::Seq`] from element expressions.
///
/// # Examples
///
/// ```
/// use bilens::seq_value;
///
/// let numbers = seq_value![1.0, 2.0, 3.0];
/// assert_eq!(numbers.as_seq().map(|items| items.len()), Some(3));
/// ```
#[macro_export]
macro_rules! seq_value {
    () => {
        $crate::value::Value::Seq(Vec::new())
    };
    ($($item:expr),+ $(,)?) => {
        $crate::value::Value::Seq(vec![$($crate::value::Value::from($item)),+])
    };
}
