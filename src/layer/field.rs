use std::fmt;

/// An attribute value read from a layer or table.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Integer(i64),
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// Interpret the value as a number.
    ///
    /// Returns `None` for nulls and blank text, `Some(Err(text))` for text that
    /// does not parse as a float.
    pub fn to_f64(&self) -> Option<Result<f64, String>> {
        match self {
            FieldValue::Null => None,
            FieldValue::Integer(i) => Some(Ok(*i as f64)),
            FieldValue::Number(n) => Some(Ok(*n)),
            FieldValue::Text(s) if s.trim().is_empty() => None,
            FieldValue::Text(s) => Some(s.trim().parse::<f64>().map_err(|_| s.clone())),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => Ok(()),
            FieldValue::Integer(i) => write!(f, "{i}"),
            FieldValue::Number(n) => write!(f, "{n}"),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self { FieldValue::Text(value.to_string()) }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self { FieldValue::Text(value) }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self { FieldValue::Integer(value) }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self { FieldValue::Number(value) }
}

#[cfg(test)]
mod tests {
    use super::FieldValue;

    #[test]
    fn numbers_display_without_trailing_fraction() {
        assert_eq!(FieldValue::Number(27001.0).to_string(), "27001");
        assert_eq!(FieldValue::Number(2.5).to_string(), "2.5");
        assert_eq!(FieldValue::Integer(-3).to_string(), "-3");
        assert_eq!(FieldValue::Null.to_string(), "");
    }

    #[test]
    fn text_parses_as_number() {
        assert_eq!(FieldValue::from(" 12.5 ").to_f64(), Some(Ok(12.5)));
        assert_eq!(FieldValue::from("").to_f64(), None);
        assert_eq!(FieldValue::from("n/a").to_f64(), Some(Err("n/a".to_string())));
        assert_eq!(FieldValue::Null.to_f64(), None);
    }
}
