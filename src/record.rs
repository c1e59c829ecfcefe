// Field-path access into weakly-typed records

use crate::error::{ChartError, ChartResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Records are arbitrary JSON values; the pipeline only reads declared paths.
pub type Record = Value;

/// A dotted path into a nested record, e.g. `orderInformation.orderDate`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct FieldPath {
    segments: Vec<String>,
}

/// Result of reading a path: either missing (absent or null) or present.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Field<'a> {
    Missing,
    Present(&'a Value),
}

impl FieldPath {
    pub fn parse(dotted: &str) -> Self {
        FieldPath {
            segments: dotted
                .split('.')
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string())
                .collect(),
        }
    }

    /// Walk the path. A present-but-non-object intermediate is a shape error.
    pub fn lookup<'a>(&self, record: &'a Value) -> ChartResult<Field<'a>> {
        let mut current = record;
        for (depth, segment) in self.segments.iter().enumerate() {
            match current {
                Value::Null => return Ok(Field::Missing),
                Value::Object(map) => match map.get(segment) {
                    Some(next) => current = next,
                    None => return Ok(Field::Missing),
                },
                other => {
                    return Err(ChartError::invalid_field(
                        self,
                        format!(
                            "expected an object at '{}', found {}",
                            self.segments[..depth].join("."),
                            kind_of(other)
                        ),
                    ))
                }
            }
        }
        if current.is_null() {
            Ok(Field::Missing)
        } else {
            Ok(Field::Present(current))
        }
    }

    /// Read a string field. Missing stays missing; non-strings are rejected.
    pub fn read_str<'a>(&self, record: &'a Value) -> ChartResult<Option<&'a str>> {
        match self.lookup(record)? {
            Field::Missing => Ok(None),
            Field::Present(Value::String(s)) => Ok(Some(s.as_str())),
            Field::Present(other) => Err(ChartError::invalid_field(
                self,
                format!("expected a string, found {}", kind_of(other)),
            )),
        }
    }

    /// Read a label: strings as-is, numbers formatted.
    pub fn read_label(&self, record: &Value) -> ChartResult<Option<String>> {
        match self.lookup(record)? {
            Field::Missing => Ok(None),
            Field::Present(Value::String(s)) => Ok(Some(s.clone())),
            Field::Present(Value::Number(n)) => Ok(Some(n.to_string())),
            Field::Present(other) => Err(ChartError::invalid_field(
                self,
                format!("expected a string or number, found {}", kind_of(other)),
            )),
        }
    }

    /// Read a number. Numeric strings (including `NaN` and `inf`) are accepted.
    pub fn read_f64(&self, record: &Value) -> ChartResult<Option<f64>> {
        match self.lookup(record)? {
            Field::Missing => Ok(None),
            Field::Present(Value::Number(n)) => Ok(Some(n.as_f64().unwrap_or(f64::NAN))),
            Field::Present(Value::String(s)) => s.trim().parse::<f64>().map(Some).map_err(|_| {
                ChartError::invalid_field(self, format!("'{}' is not a number", s))
            }),
            Field::Present(other) => Err(ChartError::invalid_field(
                self,
                format!("expected a number, found {}", kind_of(other)),
            )),
        }
    }
}

impl From<&str> for FieldPath {
    fn from(s: &str) -> Self {
        FieldPath::parse(s)
    }
}

impl From<String> for FieldPath {
    fn from(s: String) -> Self {
        FieldPath::parse(&s)
    }
}

impl From<FieldPath> for String {
    fn from(path: FieldPath) -> Self {
        path.to_string()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Borrow the record list, rejecting anything that is not an array.
pub fn as_records(records: &Value) -> ChartResult<&[Value]> {
    records
        .as_array()
        .map(|v| v.as_slice())
        .ok_or_else(|| ChartError::InvalidInput(format!("records must be an array, found {}", kind_of(records))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lookup_nested() {
        let record = json!({"a": {"b": {"c": 3}}});
        let path = FieldPath::parse("a.b.c");
        assert_eq!(path.lookup(&record).unwrap(), Field::Present(&json!(3)));
        assert_eq!(path.to_string(), "a.b.c");
    }

    #[test]
    fn test_lookup_missing_and_null() {
        let record = json!({"a": {"b": null}});
        assert_eq!(FieldPath::parse("a.b").lookup(&record).unwrap(), Field::Missing);
        assert_eq!(FieldPath::parse("a.b.c").lookup(&record).unwrap(), Field::Missing);
        assert_eq!(FieldPath::parse("x.y").lookup(&record).unwrap(), Field::Missing);
    }

    #[test]
    fn test_lookup_wrong_shape() {
        let record = json!({"a": 5});
        let err = FieldPath::parse("a.b").lookup(&record).unwrap_err();
        assert!(matches!(err, ChartError::InvalidField { .. }));
    }

    #[test]
    fn test_read_f64_coercion() {
        let record = json!({"n": 1.5, "s": "2.5", "nan": "NaN", "bad": "abc", "b": true});
        assert_eq!(FieldPath::parse("n").read_f64(&record).unwrap(), Some(1.5));
        assert_eq!(FieldPath::parse("s").read_f64(&record).unwrap(), Some(2.5));
        assert!(FieldPath::parse("nan").read_f64(&record).unwrap().unwrap().is_nan());
        assert!(FieldPath::parse("bad").read_f64(&record).is_err());
        assert!(FieldPath::parse("b").read_f64(&record).is_err());
        assert_eq!(FieldPath::parse("none").read_f64(&record).unwrap(), None);
    }

    #[test]
    fn test_read_label_accepts_numbers() {
        let record = json!({"id": 1001});
        assert_eq!(FieldPath::parse("id").read_label(&record).unwrap(), Some("1001".to_string()));
    }

    #[test]
    fn test_as_records() {
        assert_eq!(as_records(&json!([1, 2])).unwrap().len(), 2);
        assert!(matches!(as_records(&json!({"a": 1})), Err(ChartError::InvalidInput(_))));
    }
}
