//! Tag and value model for parsed script instructions.
//!
//! A script parses into a flat sequence of tags; each tag is a name plus an
//! open mapping of values. Keys are arbitrary, values are the closed variant
//! [`Value`] (string, number, or boolean). Every tag carries the original
//! source text of its line under the reserved [`BODY_KEY`].

use std::collections::BTreeMap;
use std::fmt;

// ── Reserved names ────────────────────────────────────────────────────────────

/// Reserved value key holding the original source text of the line.
pub const BODY_KEY: &str = "__body__";
/// Value key carrying the display character of a text tag.
pub const TEXT_KEY: &str = "text";
/// Value key carrying the print flag of an embedded-code tag.
pub const PRINT_KEY: &str = "print";

/// Name of the structural label tag.
pub const LABEL_TAG: &str = "__label__";
/// Name of the embedded-code tag.
pub const CODE_TAG: &str = "__code__";
/// Name of the one-character text tag.
pub const CH_TAG: &str = "ch";
/// Name of the forced-break tag.
pub const BR_TAG: &str = "br";

// ── Value ─────────────────────────────────────────────────────────────────────

/// A tag value: string, number, or boolean.
///
/// Numbers are a single f64 kind; the display form collapses integral floats
/// (`2.0` prints as `2`), so substitution results read naturally in text.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Num(f64),
    Bool(bool),
}

impl Default for Value {
    fn default() -> Self {
        Value::Str(String::new())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{s}"),
            Value::Num(x) => {
                if x.fract() == 0.0 && x.is_finite() && x.abs() < 1e15 {
                    write!(f, "{}", *x as i64)
                } else {
                    write!(f, "{x}")
                }
            }
            Value::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl Value {
    /// Coerce to boolean: the empty string, `0`, and `false` are falsy.
    pub fn as_bool(&self) -> bool {
        match self {
            Value::Str(s) => !s.is_empty(),
            Value::Num(x) => *x != 0.0,
            Value::Bool(b) => *b,
        }
    }

    /// Coerce to f64 (0.0 for non-numeric strings).
    pub fn as_num(&self) -> f64 {
        match self {
            Value::Str(s) => s.trim().parse().unwrap_or(0.0),
            Value::Num(x) => *x,
            Value::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    /// Borrow the string payload, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Kind name, used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Str(_) => "string",
            Value::Num(_) => "number",
            Value::Bool(_) => "boolean",
        }
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_owned())
    }
}

impl From<char> for Value {
    fn from(c: char) -> Self {
        Value::Str(c.to_string())
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Num(x)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Num(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

// ── Tag ───────────────────────────────────────────────────────────────────────

/// One parsed script instruction: a name plus an open value mapping.
///
/// The parser produces tags once and they act as templates; the conductor
/// clones a tag before substituting values, so the canonical sequence is
/// never mutated in place. Values iterate in key order (`BTreeMap`), which
/// keeps substitution order deterministic when expressions have side effects.
#[derive(Debug, Clone, PartialEq)]
pub struct Tag {
    pub name: String,
    pub values: BTreeMap<String, Value>,
}

impl Tag {
    /// New tag with only the reserved body entry.
    pub fn new(name: impl Into<String>, body: impl Into<String>) -> Self {
        let mut values = BTreeMap::new();
        values.insert(BODY_KEY.to_owned(), Value::Str(body.into()));
        Tag {
            name: name.into(),
            values,
        }
    }

    /// New tag from a prebuilt value mapping (the command-tag path; the
    /// caller is responsible for the reserved body entry).
    pub fn from_values(name: impl Into<String>, values: BTreeMap<String, Value>) -> Self {
        Tag {
            name: name.into(),
            values,
        }
    }

    /// Insert or replace a value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    /// Look up a value by key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// The reserved original-text body ("" if absent).
    pub fn body(&self) -> &str {
        match self.values.get(BODY_KEY) {
            Some(Value::Str(s)) => s,
            _ => "",
        }
    }

    /// The print flag of an embedded-code tag; a missing key means silent.
    pub fn print(&self) -> bool {
        self.values.get(PRINT_KEY).map_or(false, Value::as_bool)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_str() {
        assert_eq!(Value::Str("hello".into()).to_string(), "hello");
        assert_eq!(Value::Str(String::new()).to_string(), "");
    }

    #[test]
    fn display_num_collapses_integral() {
        assert_eq!(Value::Num(2.0).to_string(), "2");
        assert_eq!(Value::Num(-7.0).to_string(), "-7");
        assert_eq!(Value::Num(2.5).to_string(), "2.5");
        assert_eq!(Value::Num(0.0).to_string(), "0");
    }

    #[test]
    fn display_bool() {
        assert_eq!(Value::Bool(true).to_string(), "true");
        assert_eq!(Value::Bool(false).to_string(), "false");
    }

    #[test]
    fn as_bool() {
        assert!(Value::Str("x".into()).as_bool());
        assert!(!Value::Str("".into()).as_bool());
        assert!(Value::Num(1.0).as_bool());
        assert!(!Value::Num(0.0).as_bool());
        assert!(Value::Bool(true).as_bool());
        assert!(!Value::Bool(false).as_bool());
    }

    #[test]
    fn as_num() {
        assert_eq!(Value::Num(3.5).as_num(), 3.5);
        assert_eq!(Value::Str(" 42 ".into()).as_num(), 42.0);
        assert_eq!(Value::Str("abc".into()).as_num(), 0.0);
        assert_eq!(Value::Bool(true).as_num(), 1.0);
    }

    #[test]
    fn from_impls() {
        assert_eq!(Value::from("hi"), Value::Str("hi".into()));
        assert_eq!(Value::from(3i64), Value::Num(3.0));
        assert_eq!(Value::from(true), Value::Bool(true));
        assert_eq!(Value::from('あ'), Value::Str("あ".into()));
    }

    #[test]
    fn tag_body() {
        let tag = Tag::new(CH_TAG, "a");
        assert_eq!(tag.body(), "a");
        assert_eq!(tag.name, CH_TAG);
    }

    #[test]
    fn tag_body_defaults_empty() {
        let tag = Tag::from_values("x", BTreeMap::new());
        assert_eq!(tag.body(), "");
    }

    #[test]
    fn tag_print_flag() {
        let mut tag = Tag::new(CODE_TAG, "x=1");
        assert!(!tag.print(), "missing print key means silent");
        tag.set(PRINT_KEY, true);
        assert!(tag.print());
        tag.set(PRINT_KEY, false);
        assert!(!tag.print());
    }

    #[test]
    fn tag_set_and_get() {
        let mut tag = Tag::new("foo", ";foo{}");
        tag.set("a", 1i64);
        assert_eq!(tag.get("a"), Some(&Value::Num(1.0)));
        assert_eq!(tag.get("missing"), None);
    }
}
