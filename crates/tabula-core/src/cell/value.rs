//! Scalar values and literal parsing

use lazy_regex::regex_captures;
use std::fmt;
use std::sync::Arc;

/// A scalar value
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// No value
    #[default]
    Empty,

    /// Boolean value (TRUE/FALSE)
    Boolean(bool),

    /// Numeric value
    Number(f64),

    /// Text value
    Text(SharedString),
}

impl Value {
    /// Create a new text value
    pub fn text<S: AsRef<str>>(s: S) -> Self {
        Value::Text(SharedString::new(s))
    }

    /// Check if the value is empty
    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }

    /// Try to get the value as a number
    ///
    /// Empty counts as zero and booleans as 0/1; text is never coerced here.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Empty => Some(0.0),
            Value::Text(_) => None,
        }
    }

    /// Try to get the value as a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            Value::Number(n) => Some(*n != 0.0),
            Value::Empty => Some(false),
            Value::Text(s) => match s.as_str().to_ascii_uppercase().as_str() {
                "TRUE" => Some(true),
                "FALSE" => Some(false),
                _ => None,
            },
        }
    }

    /// Get the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Empty => "empty",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::Text(_) => "text",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Empty => write!(f, ""),
            Value::Boolean(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            Value::Number(n) => write!(f, "{}", crate::format::format_number(*n, None)),
            Value::Text(s) => write!(f, "{}", s.as_str()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::text(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::text(s)
    }
}

/// A value together with the number format it should be displayed with
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValueAndFormat {
    pub value: Value,
    pub format: Option<String>,
}

impl ValueAndFormat {
    pub fn new(value: impl Into<Value>, format: Option<String>) -> Self {
        Self {
            value: value.into(),
            format,
        }
    }

    /// Parse the content of a literal cell
    ///
    /// `TRUE`/`FALSE` (any case) become booleans, numbers become numbers,
    /// `12%` becomes `0.12` with a percent format, anything else is text.
    pub fn parse_literal(content: &str) -> Self {
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Self::default();
        }
        if trimmed.eq_ignore_ascii_case("true") {
            return Self::new(true, None);
        }
        if trimmed.eq_ignore_ascii_case("false") {
            return Self::new(false, None);
        }
        if let Some((_, number, decimals, percent)) = regex_captures!(
            r"^([+-]?(?:\d+(?:\.(\d*))?|\.\d+)(?:[eE][+-]?\d+)?)(%?)$",
            trimmed
        ) {
            if let Ok(n) = number.parse::<f64>() {
                if percent.is_empty() {
                    return Self::new(n, None);
                }
                let format = if decimals.is_empty() { "0%" } else { "0.00%" };
                return Self::new(n / 100.0, Some(format.to_string()));
            }
        }
        Self::new(content, None)
    }
}

impl From<Value> for ValueAndFormat {
    fn from(value: Value) -> Self {
        Self {
            value,
            format: None,
        }
    }
}

/// Interned string shared between cells and evaluation results
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SharedString(Arc<str>);

impl SharedString {
    /// Create a new shared string
    pub fn new<S: AsRef<str>>(s: S) -> Self {
        SharedString(Arc::from(s.as_ref()))
    }

    /// Get the string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Get the length of the string in characters
    pub fn char_len(&self) -> usize {
        self.0.chars().count()
    }

    /// Check if the string is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SharedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl fmt::Display for SharedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for SharedString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SharedString {
    fn from(s: &str) -> Self {
        SharedString::new(s)
    }
}
