//! Runtime values supplied as stamping context and produced by expressions.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A dynamically typed context value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Absent value
    #[default]
    Null,
    /// Boolean
    Bool(bool),
    /// Signed integer
    Int(i64),
    /// Floating point number
    Float(f64),
    /// Text
    String(String),
    /// Ordered collection
    List(Vec<Value>),
    /// Keyed record
    Map(BTreeMap<String, Value>),
    /// Calendar date
    Date(NaiveDate),
    /// Date with time of day
    DateTime(NaiveDateTime),
    /// Tabular data for table filling
    Table(TableData),
}

impl Value {
    /// Build a map value from key/value pairs.
    pub fn map<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Build a list value.
    pub fn list<V: Into<Value>>(items: impl IntoIterator<Item = V>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }

    /// Get the kind of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::String(_) => ValueKind::String,
            Value::List(_) => ValueKind::List,
            Value::Map(_) => ValueKind::Map,
            Value::Date(_) => ValueKind::Date,
            Value::DateTime(_) => ValueKind::DateTime,
            Value::Table(_) => ValueKind::Table,
        }
    }

    /// Check if the value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get the boolean if this is a bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get the string slice if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get a numeric view of ints and floats.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Look up a field of a map value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Map(map) => map.get(key),
            _ => None,
        }
    }

    /// Convert the value to the kind a custom function declares, if allowed.
    ///
    /// Exact kinds always pass, `Int` widens to `Float`, `Any` accepts
    /// everything and `Null` binds to any declared kind.
    pub fn coerce(self, kind: ValueKind) -> std::result::Result<Value, Value> {
        match (kind, self) {
            (ValueKind::Any, v) => Ok(v),
            (_, Value::Null) => Ok(Value::Null),
            (ValueKind::Float, Value::Int(i)) => Ok(Value::Float(i as f64)),
            (k, v) if v.kind() == k => Ok(v),
            (_, v) => Err(v),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => {
                if x.fract() == 0.0 && x.is_finite() && x.abs() < 1e15 {
                    write!(f, "{:.1}", x)
                } else {
                    write!(f, "{}", x)
                }
            }
            Value::String(s) => f.write_str(s),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Value::Map(map) => {
                f.write_str("{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}={}", k, v)?;
                }
                f.write_str("}")
            }
            Value::Date(d) => write!(f, "{}", d),
            Value::DateTime(dt) => write!(f, "{}", dt),
            Value::Table(t) => write!(f, "table[{}x{}]", t.records.len(), t.headers.len()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(dt: NaiveDateTime) -> Self {
        Value::DateTime(dt)
    }
}

impl From<TableData> for Value {
    fn from(t: TableData) -> Self {
        Value::Table(t)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or(Value::Null)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::list(items)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

/// Classification of values, used for function signatures and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    /// Matches every value (parameter declarations only)
    Any,
    /// `null`
    Null,
    /// Boolean
    Bool,
    /// Integer
    Int,
    /// Float
    Float,
    /// String
    String,
    /// List
    List,
    /// Map
    Map,
    /// Date
    Date,
    /// Date-time
    DateTime,
    /// Table data
    Table,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Any => "any",
            ValueKind::Null => "null",
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::String => "string",
            ValueKind::List => "list",
            ValueKind::Map => "map",
            ValueKind::Date => "date",
            ValueKind::DateTime => "datetime",
            ValueKind::Table => "table",
        };
        f.write_str(name)
    }
}

/// Ordered headers plus rows of string cells.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableData {
    /// Column headers; define the column count
    pub headers: Vec<String>,

    /// Data rows
    pub records: Vec<Vec<String>>,
}

impl TableData {
    /// Create table data from headers and records.
    pub fn new<H, R, C>(headers: impl IntoIterator<Item = H>, records: impl IntoIterator<Item = R>) -> Self
    where
        H: Into<String>,
        R: IntoIterator<Item = C>,
        C: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            records: records
                .into_iter()
                .map(|r| r.into_iter().map(Into::into).collect())
                .collect(),
        }
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.headers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json() {
        let json = serde_json::json!({
            "name": "Ada",
            "age": 36,
            "score": 9.5,
            "tags": ["a", "b"],
            "spouse": null
        });
        let value = Value::from(json);
        assert_eq!(value.get("name"), Some(&Value::from("Ada")));
        assert_eq!(value.get("age"), Some(&Value::Int(36)));
        assert_eq!(value.get("score"), Some(&Value::Float(9.5)));
        assert_eq!(value.get("spouse"), Some(&Value::Null));
        assert_eq!(value.get("tags").map(Value::kind), Some(ValueKind::List));
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Null.to_string(), "");
        assert_eq!(Value::Int(3).to_string(), "3");
        assert_eq!(Value::Float(2.0).to_string(), "2.0");
        assert_eq!(Value::list([1, 2]).to_string(), "[1, 2]");
    }

    #[test]
    fn test_coerce() {
        assert_eq!(Value::Int(2).coerce(ValueKind::Float), Ok(Value::Float(2.0)));
        assert_eq!(Value::Null.coerce(ValueKind::String), Ok(Value::Null));
        assert_eq!(
            Value::from("x").coerce(ValueKind::Any),
            Ok(Value::from("x"))
        );
        assert!(Value::from("x").coerce(ValueKind::Int).is_err());
    }

    #[test]
    fn test_table_data() {
        let table = TableData::new(["Name", "Age"], [vec!["Ada", "36"], vec!["Alan"]]);
        assert_eq!(table.column_count(), 2);
        assert_eq!(table.records[1], vec!["Alan".to_string()]);
    }
}
