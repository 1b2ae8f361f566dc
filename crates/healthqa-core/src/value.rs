use std::fmt;

use chrono::NaiveDate;

/// Canonical date rendering used for cells, keys and reports.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Typed cell value.
///
/// `Invalid` marks a value that failed date standardisation; the raw text is
/// kept so reports can show what was rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Text(String),
    Number(f64),
    Date(NaiveDate),
    Invalid(String),
}

impl Value {
    /// Read a raw tabular cell as text, treating the usual missing-value
    /// spellings as null.
    ///
    /// No numeric inference happens here: `00123` stays `00123`. Numeric
    /// roles read text through [`Value::as_f64`].
    pub fn from_cell(raw: &str) -> Self {
        let trimmed = raw.trim();
        if is_missing_token(trimmed) {
            return Value::Null;
        }
        Value::Text(trimmed.to_string())
    }

    pub fn text(value: impl Into<String>) -> Self {
        Value::Text(value.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, Value::Invalid(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }

    /// Numeric view: numbers, and text that parses as a finite number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(value) => Some(*value),
            Value::Text(value) => value
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|number| number.is_finite()),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(value) => Some(*value),
            _ => None,
        }
    }

    /// Render the value as a flat tabular cell.
    pub fn to_cell(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Text(value) | Value::Invalid(value) => value.clone(),
            Value::Number(value) => format_number(*value),
            Value::Date(value) => value.format(DATE_FORMAT).to_string(),
        }
    }

    /// Stable key used for equality grouping (duplicates, modes).
    pub fn key(&self) -> String {
        match self {
            Value::Null => "null:".to_string(),
            Value::Text(value) => format!("text:{value}"),
            Value::Number(value) => format!("number:{}", format_number(*value)),
            Value::Date(value) => format!("date:{}", value.format(DATE_FORMAT)),
            Value::Invalid(value) => format!("invalid:{value}"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            other => write!(f, "{}", other.to_cell()),
        }
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

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Value::Date(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Format a number without a trailing `.0` for integral values.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

fn is_missing_token(value: &str) -> bool {
    value.is_empty()
        || matches!(
            value.to_ascii_lowercase().as_str(),
            "na" | "n/a" | "nan" | "null" | "none"
        )
}
