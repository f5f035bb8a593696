use std::fmt;

use serde::{Deserialize, Serialize};

use crate::column::ColumnType;

/// A single typed cell.
///
/// `Float` never holds NaN or an infinity: [`Value::float`] and the `From<f64>`
/// impl turn non-finite numbers into `Null`, so the sentinel can never reach
/// the text grid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    /// Build a float value, mapping non-finite input to `Null`.
    pub fn float(n: f64) -> Self {
        if n.is_finite() {
            Value::Float(n)
        } else {
            Value::Null
        }
    }

    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Column type this value is evidence for. `Null` carries no evidence.
    pub fn kind(&self) -> Option<ColumnType> {
        match self {
            Value::Null => None,
            Value::Int(_) => Some(ColumnType::Int),
            Value::Float(_) => Some(ColumnType::Float),
            Value::Text(_) => Some(ColumnType::Text),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Text placed in the grid for this value.
    pub fn display_text(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Int(n) => n.to_string(),
            Value::Float(n) => format_float(*n),
            Value::Text(s) => s.clone(),
        }
    }

    /// Type-aware equality used for row matching.
    ///
    /// Numbers compare by value across `Int`/`Float`, text compares exactly,
    /// and `Null` matches nothing (not even another `Null`).
    pub fn matches(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, _) | (_, Value::Null) => false,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Text(_), _) | (_, Value::Text(_)) => false,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(i), Value::Float(f)) | (Value::Float(f), Value::Int(i)) => {
                int_equals_float(*i, *f)
            }
        }
    }
}

/// Exact comparison: the float must be integral and inside the i64 range,
/// so large integers never collide through f64 rounding.
fn int_equals_float(i: i64, f: f64) -> bool {
    const LIMIT: f64 = 9_223_372_036_854_775_808.0; // 2^63
    f.fract() == 0.0 && (-LIMIT..LIMIT).contains(&f) && f as i64 == i
}

/// Shortest round-trip decimal text; integral floats print without a fraction.
pub(crate) fn format_float(n: f64) -> String {
    if n == 0.0 {
        // Avoid "-0"
        return "0".to_string();
    }
    format!("{}", n)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_text())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::float(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_finite_float_is_null() {
        assert_eq!(Value::from(f64::NAN), Value::Null);
        assert_eq!(Value::float(f64::INFINITY), Value::Null);
        assert_eq!(Value::float(1.5), Value::Float(1.5));
    }

    #[test]
    fn test_display_text() {
        assert_eq!(Value::Null.display_text(), "");
        assert_eq!(Value::Int(-42).display_text(), "-42");
        assert_eq!(Value::Float(2.0).display_text(), "2");
        assert_eq!(Value::Float(0.1).display_text(), "0.1");
        assert_eq!(Value::Float(-0.0).display_text(), "0");
        assert_eq!(Value::text("open").display_text(), "open");
    }

    #[test]
    fn test_matches_is_type_aware() {
        assert!(Value::Int(123).matches(&Value::Int(123)));
        assert!(Value::Int(2).matches(&Value::Float(2.0)));
        assert!(Value::Float(-7.0).matches(&Value::Int(-7)));
        assert!(!Value::Int(2).matches(&Value::Float(2.5)));
        assert!(!Value::Int(2).matches(&Value::text("2")));
        assert!(Value::text("open").matches(&Value::text("open")));
        assert!(!Value::text("open").matches(&Value::text("Open")));
        assert!(!Value::Null.matches(&Value::Null));
    }

    #[test]
    fn test_json_shape() {
        let row = vec![Value::Int(1), Value::Null, Value::Float(1.5), Value::text("x")];
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"[1,null,1.5,"x"]"#);

        let parsed: Vec<Value> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, row);
    }

    #[test]
    fn test_large_integers_do_not_collide_with_floats() {
        // 2^53 + 1 is not representable as f64
        let big = Value::Int(9_007_199_254_740_993);
        assert!(!big.matches(&Value::Float(9_007_199_254_740_992.0)));
        assert!(Value::Int(9_007_199_254_740_992).matches(&Value::Float(9_007_199_254_740_992.0)));
        assert!(!Value::Int(i64::MAX).matches(&Value::Float(9_223_372_036_854_775_808.0)));
    }
}
