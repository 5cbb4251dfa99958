//! Feature maps attached to documents and annotations.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Features keyed by name. Ordered so that rendering and comparison are stable.
pub type FeatureMap = BTreeMap<String, FeatureValue>;

/// A value stored in a [`FeatureMap`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<FeatureValue>),
}

impl FeatureValue {
    /// Returns the string content if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FeatureValue::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Exact match against a string value.
    ///
    /// Only text values can match; `Int(3)` does not match `"3"`.
    pub fn matches_text(&self, expected: &str) -> bool {
        self.as_text() == Some(expected)
    }
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureValue::Bool(value) => write!(f, "{}", value),
            FeatureValue::Int(value) => write!(f, "{}", value),
            FeatureValue::Float(value) => write!(f, "{}", value),
            FeatureValue::Text(value) => write!(f, "{:?}", value),
            FeatureValue::List(values) => {
                f.write_str("[")?;
                for (idx, value) in values.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", value)?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<&str> for FeatureValue {
    fn from(value: &str) -> Self {
        FeatureValue::Text(value.to_string())
    }
}

impl From<String> for FeatureValue {
    fn from(value: String) -> Self {
        FeatureValue::Text(value)
    }
}

impl From<i64> for FeatureValue {
    fn from(value: i64) -> Self {
        FeatureValue::Int(value)
    }
}

impl From<bool> for FeatureValue {
    fn from(value: bool) -> Self {
        FeatureValue::Bool(value)
    }
}

impl From<f64> for FeatureValue {
    fn from(value: f64) -> Self {
        FeatureValue::Float(value)
    }
}

/// Build a [`FeatureMap`] from `(name, value)` pairs.
///
/// ```
/// use layered_composite::{features, FeatureValue};
///
/// let map = features([("kind", "header")]);
/// assert_eq!(map.get("kind"), Some(&FeatureValue::from("header")));
/// ```
pub fn features<K, V, I>(pairs: I) -> FeatureMap
where
    K: Into<String>,
    V: Into<FeatureValue>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(key, value)| (key.into(), value.into()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_match_is_exact() {
        let value = FeatureValue::from("header");
        assert!(value.matches_text("header"));
        assert!(!value.matches_text("Header"));
        assert!(!value.matches_text("head"));
        assert!(!FeatureValue::Int(3).matches_text("3"));
    }

    #[test]
    fn display_lists() {
        let value = FeatureValue::List(vec![FeatureValue::Int(1), FeatureValue::from("a")]);
        assert_eq!(value.to_string(), "[1, \"a\"]");
    }
}
