//! Expression builder: turns plain values into embeddable JavaScript
//! expressions.
//!
//! Callers build a [`Value`] explicitly and convert it with
//! [`to_expression`]. Lists and maps drop entries that have no
//! representation instead of failing, so one odd field in a metadata record
//! never loses the rest of it.

use std::fmt;

/// A plain value that may be embedded into a compiled module.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<Value>),
    Map(Record),
    /// A slot with no JSON representation. Converts to nothing.
    Undefined,
}

/// Insertion-ordered string-keyed map of values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record(Vec<(String, Value)>);

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `value` under `key`. An existing key keeps its position and
    /// takes the new value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.0.push((key, value)),
        }
    }

    /// Merge every field of `other` on top of this record.
    pub fn merge(&mut self, other: Record) {
        for (key, value) in other.0 {
            self.insert(key, value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (key, value) in iter {
            record.insert(key, value);
        }
        record
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(value as f64)
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Value::Number(value as f64)
    }
}

impl From<u8> for Value {
    fn from(value: u8) -> Self {
        Value::Number(f64::from(value))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::List(value)
    }
}

impl From<Record> for Value {
    fn from(value: Record) -> Self {
        Value::Map(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => n.as_f64().map_or(Value::Undefined, Value::Number),
            serde_json::Value::String(s) => Value::Text(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Map(map.into_iter().collect()),
        }
    }
}

/// A literal expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
}

/// `key: value` inside an object expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub key: String,
    pub value: Expression,
}

/// The subset of JavaScript expressions a [`Value`] converts into.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal(Literal),
    Array(Vec<Expression>),
    Object(Vec<Property>),
}

impl Expression {
    pub fn string(value: impl Into<String>) -> Self {
        Expression::Literal(Literal::String(value.into()))
    }
}

/// Convert `value` into an expression node.
///
/// Returns `None` for values without a representation ([`Value::Undefined`]
/// and non-finite numbers). Such entries are skipped inside lists and maps.
pub fn to_expression(value: &Value) -> Option<Expression> {
    let expression = match value {
        Value::Null => Expression::Literal(Literal::Null),
        Value::Bool(b) => Expression::Literal(Literal::Bool(*b)),
        Value::Number(n) if n.is_finite() => Expression::Literal(Literal::Number(*n)),
        Value::Number(_) | Value::Undefined => return None,
        Value::Text(s) => Expression::string(s.as_str()),
        Value::List(items) => Expression::Array(items.iter().filter_map(to_expression).collect()),
        Value::Map(record) => Expression::Object(
            record
                .iter()
                .filter_map(|(key, value)| {
                    to_expression(value).map(|value| Property {
                        key: key.to_string(),
                        value,
                    })
                })
                .collect(),
        ),
    };
    Some(expression)
}

/// Quote `s` as a JavaScript string literal.
pub fn js_string_literal(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string())
}

/// Whether `s` can be used as a bare property key.
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Format `key` for use in an object literal.
pub fn property_key(key: &str) -> String {
    if is_identifier(key) {
        key.to_string()
    } else {
        js_string_literal(key)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Null => f.write_str("null"),
            Literal::Bool(b) => write!(f, "{b}"),
            Literal::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Literal::Number(n) => write!(f, "{n}"),
            Literal::String(s) => f.write_str(&js_string_literal(s)),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Literal(literal) => write!(f, "{literal}"),
            Expression::Array(elements) => {
                f.write_str("[")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{element}")?;
                }
                f.write_str("]")
            }
            Expression::Object(properties) => {
                f.write_str("{")?;
                for (i, property) in properties.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", property_key(&property.key), property.value)?;
                }
                f.write_str("}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn number(n: f64) -> Expression {
        Expression::Literal(Literal::Number(n))
    }

    #[test]
    fn drops_unconvertible_entries() {
        let value = Value::Map(Record::from_iter([
            ("a", Value::Number(1.0)),
            ("b", Value::Undefined),
            (
                "c",
                Value::List(vec![Value::Number(1.0), Value::Undefined, Value::Number(2.0)]),
            ),
        ]));

        let expression = to_expression(&value).unwrap();

        assert_eq!(
            expression,
            Expression::Object(vec![
                Property {
                    key: "a".to_string(),
                    value: number(1.0),
                },
                Property {
                    key: "c".to_string(),
                    value: Expression::Array(vec![number(1.0), number(2.0)]),
                },
            ])
        );
    }

    #[test]
    fn keeps_literal_null() {
        let value = Value::List(vec![Value::Null, Value::Number(f64::NAN)]);
        assert_eq!(
            to_expression(&value),
            Some(Expression::Array(vec![Expression::Literal(Literal::Null)]))
        );
        assert_eq!(to_expression(&Value::Undefined), None);
    }

    #[test]
    fn prints_javascript_source() {
        let value = Value::Map(Record::from_iter([
            ("title", Value::from("Say \"hi\"")),
            ("reading-time", Value::from(3u64)),
            ("ratio", Value::from(0.5)),
            ("draft", Value::from(false)),
            ("lastUpdated", Value::from(None::<i64>)),
        ]));

        let source = to_expression(&value).unwrap().to_string();

        assert_eq!(
            source,
            r#"{title: "Say \"hi\"", "reading-time": 3, ratio: 0.5, draft: false, lastUpdated: null}"#
        );
    }

    #[test]
    fn insert_overwrites_in_place() {
        let mut record = Record::from_iter([("a", 1u64), ("b", 2u64)]);
        record.merge(Record::from_iter([("a", Value::from("x")), ("c", Value::from(3u64))]));

        let keys: Vec<_> = record.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
        assert_eq!(record.get("a"), Some(&Value::from("x")));
    }

    #[test]
    fn converts_json_preserving_order() {
        let json: serde_json::Value =
            serde_json::from_str(r#"{"z": 1, "a": [true, null], "m": {"k": "v"}}"#).unwrap();

        let source = to_expression(&Value::from(json)).unwrap().to_string();

        assert_eq!(source, r#"{z: 1, a: [true, null], m: {k: "v"}}"#);
    }

    #[test]
    fn identifier_detection() {
        assert!(is_identifier("_metadata"));
        assert!(is_identifier("$x1"));
        assert!(!is_identifier("1x"));
        assert!(!is_identifier("data-highlight"));
        assert!(!is_identifier(""));
    }
}
