//! In-memory table model shared by the snapshot builder, CDC synthesizer and writer.

/// A single cell value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    /// Wrap an optional string, mapping `None` to `Null`
    pub fn opt_text(s: Option<String>) -> Self {
        s.map(Value::Text).unwrap_or(Value::Null)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(n) => Some(*n),
            _ => None,
        }
    }

    /// Format for a CSV field. Nulls become an empty field.
    pub fn to_csv_field(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Int(n) => n.to_string(),
            Value::Float(n) => format_float(*n),
            Value::Text(s) => s.clone(),
        }
    }
}

/// Floats always carry a decimal point so `100.0` is not written as `100`.
fn format_float(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 {
        format!("{:.1}", n)
    } else {
        n.to_string()
    }
}

/// Round to two decimal places (prices, amounts)
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// A row of generated data, ordered like the owning table's columns
pub type Row = Vec<Value>;

/// Generated data for a single table
#[derive(Debug, Clone)]
pub struct Table {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn new(name: impl Into<String>, columns: &[&str]) -> Self {
        Self {
            name: name.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn with_capacity(name: impl Into<String>, columns: &[&str], rows: usize) -> Self {
        let mut table = Self::new(name, columns);
        table.rows.reserve(rows);
        table
    }

    pub fn push(&mut self, row: Row) {
        debug_assert_eq!(row.len(), self.columns.len(), "row width for {}", self.name);
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a column by name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Non-null text values of a column, in row order
    pub fn text_values(&self, column: &str) -> Vec<String> {
        let Some(idx) = self.column_index(column) else {
            return Vec::new();
        };
        self.rows
            .iter()
            .filter_map(|r| r.get(idx).and_then(Value::as_str).map(str::to_string))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_field_formatting() {
        assert_eq!(Value::Null.to_csv_field(), "");
        assert_eq!(Value::Int(7).to_csv_field(), "7");
        assert_eq!(Value::Float(100.0).to_csv_field(), "100.0");
        assert_eq!(Value::Float(12.34).to_csv_field(), "12.34");
        assert_eq!(Value::text("abc").to_csv_field(), "abc");
    }

    #[test]
    fn test_text_values_skip_nulls() {
        let mut table = Table::new("t", &["id", "name"]);
        table.push(vec![Value::text("A"), Value::text("x")]);
        table.push(vec![Value::Null, Value::text("y")]);
        table.push(vec![Value::text("B"), Value::Null]);

        assert_eq!(table.text_values("id"), vec!["A", "B"]);
        assert!(table.text_values("missing").is_empty());
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(1.23456), 1.23);
        assert_eq!(round2(9.999), 10.0);
    }
}
