//! Dynamic values produced by the expression language and held by resources.

use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A dynamic value: the result of evaluating an expression, or the
/// content of a resource.
///
/// The language has no integer type. Numbers are `f64` and are floored
/// wherever an integer is expected.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Missing operand or empty expression.
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    /// Snapshot of the tag set or the item multiset.
    List(Vec<String>),
}

impl Value {
    /// Truthiness used by `&&`, `||`, `^^` and conditions.
    pub fn truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(b) => *b,
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::Text(s) => !s.is_empty(),
            Self::List(_) => true,
        }
    }

    /// Numeric coercion. Values with no numeric reading become NaN.
    pub fn as_number(&self) -> f64 {
        match self {
            Self::Null => f64::NAN,
            Self::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Self::Number(n) => *n,
            Self::Text(s) => parse_numeric(s),
            Self::List(items) => match items.as_slice() {
                [] => 0.0,
                [only] => parse_numeric(only),
                _ => f64::NAN,
            },
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Self::Number(_))
    }

    /// Loose equality: values of different kinds are coerced before
    /// comparison instead of being unequal outright.
    ///
    /// - `Null` only equals `Null`.
    /// - Booleans compare as `1`/`0`.
    /// - Number against text compares the parsed text.
    /// - A list against a primitive compares its comma-joined text.
    /// - Two lists compare element-wise.
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Null, _) | (_, Self::Null) => false,
            (Self::Bool(_), _) => Self::Number(self.as_number()).loose_eq(other),
            (_, Self::Bool(_)) => self.loose_eq(&Self::Number(other.as_number())),
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Number(a), Self::Text(_)) => *a == other.as_number(),
            (Self::Text(_), Self::Number(b)) => self.as_number() == *b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::List(_), _) => Self::Text(self.to_string()).loose_eq(other),
            (_, Self::List(_)) => self.loose_eq(&Self::Text(other.to_string())),
        }
    }

    /// Relational ordering. Two texts (lists read as their joined text)
    /// compare lexicographically, anything else numerically. `None` when
    /// a side is NaN.
    pub fn loose_cmp(&self, other: &Value) -> Option<Ordering> {
        let left = self.to_primitive();
        let right = other.to_primitive();
        match (&left, &right) {
            (Self::Text(a), Self::Text(b)) => Some(a.cmp(b)),
            _ => left.as_number().partial_cmp(&right.as_number()),
        }
    }

    /// Whether this value is a list holding `needle`. Lists only hold
    /// text, so a number or boolean needle never matches.
    pub fn list_contains(&self, needle: &Value) -> bool {
        match (self, needle) {
            (Self::List(items), Self::Text(needle)) => items.iter().any(|item| item == needle),
            _ => false,
        }
    }

    fn to_primitive(&self) -> Value {
        match self {
            Self::List(_) => Self::Text(self.to_string()),
            other => other.clone(),
        }
    }
}

fn parse_numeric(text: &str) -> f64 {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    // "Infinity" is the only numeric word; "inf" and "nan" are not numbers.
    let digits = trimmed.trim_start_matches(['+', '-']);
    if digits.starts_with(|c: char| c.is_ascii_alphabetic()) && digits != "Infinity" {
        return f64::NAN;
    }
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

fn format_number(n: f64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let n = if n == 0.0 { 0.0 } else { n };
    if n.is_nan() {
        write!(f, "NaN")
    } else if n.is_infinite() {
        write!(f, "{}", if n > 0.0 { "Infinity" } else { "-Infinity" })
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        write!(f, "{:.0}", n)
    } else {
        write!(f, "{}", n)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Number(n) => format_number(*n, f),
            Self::Text(s) => f.write_str(s),
            Self::List(items) => f.write_str(&items.join(",")),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

/// Source text of an expression as authored in content.
///
/// Content may write an expression as a string (`"gold + 1"`), or as a
/// bare number or boolean; all three deserialize to source text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct Expression(String);

impl Expression {
    pub fn new(source: impl Into<String>) -> Self {
        Self(source.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Expression {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Expression {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl<'de> Deserialize<'de> for Expression {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawExpression {
            Text(String),
            Int(i64),
            Float(f64),
            Bool(bool),
        }

        Ok(match RawExpression::deserialize(deserializer)? {
            RawExpression::Text(s) => Self(s),
            RawExpression::Int(n) => Self(n.to_string()),
            RawExpression::Float(n) => Self(n.to_string()),
            RawExpression::Bool(b) => Self(b.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness() {
        assert!(!Value::Null.truthy());
        assert!(!Value::Number(0.0).truthy());
        assert!(!Value::Number(f64::NAN).truthy());
        assert!(Value::Number(-1.0).truthy());
        assert!(!Value::Text(String::new()).truthy());
        assert!(Value::Text("x".to_string()).truthy());
        assert!(Value::List(vec![]).truthy());
    }

    #[test]
    fn loose_equality_across_kinds() {
        assert!(Value::Number(3.0).loose_eq(&Value::from("3")));
        assert!(Value::Bool(true).loose_eq(&Value::Number(1.0)));
        assert!(Value::from("1").loose_eq(&Value::Bool(true)));
        assert!(!Value::Null.loose_eq(&Value::Number(0.0)));
        assert!(Value::Null.loose_eq(&Value::Null));
        assert!(!Value::from("abc").loose_eq(&Value::Number(0.0)));
        assert!(Value::List(vec!["a".into(), "b".into()]).loose_eq(&Value::from("a,b")));
        assert!(Value::from("").loose_eq(&Value::Number(0.0)));
    }

    #[test]
    fn relational_ordering() {
        assert_eq!(
            Value::from("apple").loose_cmp(&Value::from("banana")),
            Some(Ordering::Less)
        );
        assert_eq!(
            Value::from("10").loose_cmp(&Value::Number(9.0)),
            Some(Ordering::Greater)
        );
        assert_eq!(Value::from("abc").loose_cmp(&Value::Number(9.0)), None);
    }

    #[test]
    fn list_membership_matches_text_only() {
        let list = Value::List(vec!["brave".into(), "5".into()]);
        assert!(list.list_contains(&Value::from("brave")));
        assert!(list.list_contains(&Value::from("5")));
        assert!(!list.list_contains(&Value::Number(5.0)));
        assert!(!list.list_contains(&Value::Bool(true)));
        assert!(!list.list_contains(&Value::from("coward")));
        assert!(!Value::from("brave").list_contains(&Value::from("brave")));
    }

    #[test]
    fn numeric_text_rejects_non_number_words() {
        assert_eq!(Value::from(" 12 ").as_number(), 12.0);
        assert_eq!(Value::from("-Infinity").as_number(), f64::NEG_INFINITY);
        for word in ["inf", "-inf", "infinity", "nan", "NaN"] {
            assert!(Value::from(word).as_number().is_nan(), "{}", word);
        }
    }

    #[test]
    fn display_formats_integers_without_fraction() {
        assert_eq!(Value::Number(4.0).to_string(), "4");
        assert_eq!(Value::Number(-4.0).to_string(), "-4");
        assert_eq!(Value::Number(2.5).to_string(), "2.5");
        assert_eq!(Value::Number(f64::INFINITY).to_string(), "Infinity");
        assert_eq!(Value::Number(-0.0).to_string(), "0");
        assert_eq!(Value::Bool(false).to_string(), "false");
    }

    #[test]
    fn expression_accepts_scalars() {
        let exprs: Vec<Expression> = serde_json::from_str(r#"["gold > 3", 5, 2.5, true]"#).unwrap();
        assert_eq!(exprs[0].as_str(), "gold > 3");
        assert_eq!(exprs[1].as_str(), "5");
        assert_eq!(exprs[2].as_str(), "2.5");
        assert_eq!(exprs[3].as_str(), "true");
    }

    #[test]
    fn value_deserializes_untagged() {
        let values: Vec<Value> = serde_json::from_str(r#"[null, true, 3, "x"]"#).unwrap();
        assert_eq!(
            values,
            vec![
                Value::Null,
                Value::Bool(true),
                Value::Number(3.0),
                Value::Text("x".to_string())
            ]
        );
    }
}
