//! Column types and per-column type inference.
//!
//! A column's type is a tag recomputed from its contents, never hidden state:
//! - inference scans the non-header cells of a grid column
//! - writes widen the tag (Empty < Int < Float < Text) instead of failing
//! - values are always coerced to the column's current tag

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Inferred type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// No evidence yet: every value is null.
    #[default]
    Empty,
    /// Nullable integer.
    Int,
    Float,
    Text,
}

impl ColumnType {
    /// Smallest type able to hold values of both `self` and `other`.
    pub fn widen(self, other: ColumnType) -> ColumnType {
        use ColumnType::*;
        match (self, other) {
            (Empty, t) | (t, Empty) => t,
            (Int, Int) => Int,
            (Int, Float) | (Float, Int) | (Float, Float) => Float,
            _ => Text,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Empty => "empty",
            ColumnType::Int => "int",
            ColumnType::Float => "float",
            ColumnType::Text => "text",
        }
    }
}

/// Numeric reading of a cell.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Number {
    Int(i64),
    Float(f64),
}

/// Parse a cell as a number. Integral values that fit `i64` read as integers,
/// so `"1"` and `"1.0"` are the same evidence. Non-finite spellings
/// (`inf`, `NaN`) are not numbers.
fn parse_number(cell: &str) -> Option<Number> {
    let t = cell.trim();
    if t.is_empty() {
        return None;
    }
    if let Ok(n) = t.parse::<i64>() {
        return Some(Number::Int(n));
    }
    let n: f64 = t.parse().ok()?;
    if !n.is_finite() {
        return None;
    }
    // 2^63 is exactly representable; anything at or past it overflows i64.
    if n.fract() == 0.0 && n.abs() < 9_223_372_036_854_775_808.0 {
        return Some(Number::Int(n as i64));
    }
    Some(Number::Float(n))
}

/// Infer a column type from raw cell text. Empty cells contribute nothing.
pub fn infer<'a>(cells: impl IntoIterator<Item = &'a str>) -> ColumnType {
    let mut kind = ColumnType::Empty;
    for cell in cells {
        if cell.is_empty() {
            continue;
        }
        let evidence = match parse_number(cell) {
            Some(Number::Int(_)) => ColumnType::Int,
            Some(Number::Float(_)) => ColumnType::Float,
            None => ColumnType::Text,
        };
        kind = kind.widen(evidence);
        if kind == ColumnType::Text {
            break;
        }
    }
    kind
}

/// Decode one cell under an already-inferred column type.
pub fn decode(cell: &str, kind: ColumnType) -> Value {
    if cell.is_empty() {
        return Value::Null;
    }
    match (kind, parse_number(cell)) {
        (ColumnType::Int, Some(Number::Int(n))) => Value::Int(n),
        (ColumnType::Float, Some(Number::Int(n))) => Value::Float(n as f64),
        (ColumnType::Float, Some(Number::Float(n))) => Value::Float(n),
        _ => Value::Text(cell.to_string()),
    }
}

/// Convert a value so it fits a column of type `kind`.
/// `kind` must already be wide enough for the value.
fn coerce(value: Value, kind: ColumnType) -> Value {
    match (kind, value) {
        (_, Value::Null) => Value::Null,
        (ColumnType::Float, Value::Int(n)) => Value::Float(n as f64),
        (ColumnType::Text, v @ (Value::Int(_) | Value::Float(_))) => Value::Text(v.display_text()),
        (_, v) => v,
    }
}

/// A named, uniformly typed column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Column {
    name: String,
    kind: ColumnType,
    values: Vec<Value>,
}

impl Column {
    /// A column of `len` nulls.
    pub fn nulls(name: impl Into<String>, len: usize) -> Self {
        Self {
            name: name.into(),
            kind: ColumnType::Empty,
            values: vec![Value::Null; len],
        }
    }

    /// Infer the type from raw cells and decode them.
    pub fn from_cells(name: impl Into<String>, cells: &[&str]) -> Self {
        let kind = infer(cells.iter().copied());
        Self {
            name: name.into(),
            kind,
            values: cells.iter().map(|c| decode(c, kind)).collect(),
        }
    }

    /// Build from already-typed values; the tag is the widest value type.
    pub fn from_values(name: impl Into<String>, values: Vec<Value>) -> Self {
        let kind = values
            .iter()
            .filter_map(Value::kind)
            .fold(ColumnType::Empty, ColumnType::widen);
        Self {
            name: name.into(),
            kind,
            values: values.into_iter().map(|v| coerce(v, kind)).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ColumnType {
        self.kind
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn get(&self, row: usize) -> Option<&Value> {
        self.values.get(row)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Overwrite one cell, widening the whole column if the value does not fit.
    ///
    /// Panics if `row` is out of bounds.
    pub fn set(&mut self, row: usize, value: Value) {
        let value = self.admit(value);
        self.values[row] = value;
    }

    pub fn push(&mut self, value: Value) {
        let value = self.admit(value);
        self.values.push(value);
    }

    /// Widen the column for `value` and return the value coerced to the tag.
    fn admit(&mut self, value: Value) -> Value {
        if let Some(incoming) = value.kind() {
            let widened = self.kind.widen(incoming);
            if widened != self.kind {
                self.retag(widened);
            }
        }
        coerce(value, self.kind)
    }

    fn retag(&mut self, kind: ColumnType) {
        self.kind = kind;
        for v in &mut self.values {
            *v = coerce(std::mem::take(v), kind);
        }
    }

    /// Keep only the given rows, in the given order.
    pub(crate) fn select(&self, rows: &[usize]) -> Column {
        Column {
            name: self.name.clone(),
            kind: self.kind,
            values: rows.iter().map(|&r| self.values[r].clone()).collect(),
        }
    }
}
