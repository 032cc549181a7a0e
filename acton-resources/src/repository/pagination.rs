//! Pagination and filtering types for repository queries
//!
//! # Example
//!
//! ```rust
//! use acton_resources::repository::{FilterCondition, Pagination};
//!
//! let pagination = Pagination::new(20, 10);
//! let filters = vec![
//!     FilterCondition::eq("status", "active"),
//!     FilterCondition::gte("age", 18),
//! ];
//! assert_eq!(pagination.offset, 20);
//! assert_eq!(filters.len(), 2);
//! ```

use std::cmp::Ordering;
use std::fmt;

use serde_json::Value;

/// Offset/limit window over a query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Number of results to skip
    pub offset: u64,
    /// Maximum number of results to return
    pub limit: u64,
}

impl Pagination {
    /// Create new pagination parameters
    #[must_use]
    pub const fn new(offset: u64, limit: u64) -> Self {
        Self { offset, limit }
    }

    /// First page with the given limit
    #[must_use]
    pub const fn first_page(limit: u64) -> Self {
        Self { offset: 0, limit }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 20,
        }
    }
}

/// Comparison operators for filter conditions
///
/// ```rust
/// use acton_resources::repository::FilterOperator;
///
/// assert_eq!(format!("{}", FilterOperator::Equal), "=");
/// assert_eq!(format!("{}", FilterOperator::Like), "LIKE");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    /// Equal to (=)
    Equal,
    /// Not equal to (!=)
    NotEqual,
    /// Greater than (>)
    GreaterThan,
    /// Greater than or equal to (>=)
    GreaterThanOrEqual,
    /// Less than (<)
    LessThan,
    /// Less than or equal to (<=)
    LessThanOrEqual,
    /// Pattern matching with `%` and `_` wildcards (LIKE)
    Like,
    /// Value is in a list (IN)
    In,
    /// Value is null or absent (IS NULL)
    IsNull,
    /// Value is present and not null (IS NOT NULL)
    IsNotNull,
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equal => write!(f, "="),
            Self::NotEqual => write!(f, "!="),
            Self::GreaterThan => write!(f, ">"),
            Self::GreaterThanOrEqual => write!(f, ">="),
            Self::LessThan => write!(f, "<"),
            Self::LessThanOrEqual => write!(f, "<="),
            Self::Like => write!(f, "LIKE"),
            Self::In => write!(f, "IN"),
            Self::IsNull => write!(f, "IS NULL"),
            Self::IsNotNull => write!(f, "IS NOT NULL"),
        }
    }
}

/// A value that can be used in filter conditions
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    /// String value
    String(String),
    /// 64-bit integer value
    Integer(i64),
    /// 64-bit floating point value
    Float(f64),
    /// Boolean value
    Boolean(bool),
    /// List of string values (for IN operator)
    StringList(Vec<String>),
    /// List of integer values (for IN operator)
    IntegerList(Vec<i64>),
    /// Null value (for IS NULL / IS NOT NULL)
    Null,
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for FilterValue {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<i32> for FilterValue {
    fn from(n: i32) -> Self {
        Self::Integer(i64::from(n))
    }
}

impl From<f64> for FilterValue {
    fn from(n: f64) -> Self {
        Self::Float(n)
    }
}

impl From<bool> for FilterValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<Vec<String>> for FilterValue {
    fn from(list: Vec<String>) -> Self {
        Self::StringList(list)
    }
}

impl From<Vec<i64>> for FilterValue {
    fn from(list: Vec<i64>) -> Self {
        Self::IntegerList(list)
    }
}

impl FilterValue {
    fn to_json(&self) -> Value {
        match self {
            Self::String(s) => Value::from(s.as_str()),
            Self::Integer(n) => Value::from(*n),
            Self::Float(n) => Value::from(*n),
            Self::Boolean(b) => Value::from(*b),
            Self::StringList(list) => Value::from(list.clone()),
            Self::IntegerList(list) => Value::from(list.clone()),
            Self::Null => Value::Null,
        }
    }
}

/// A single filter condition for querying entities
///
/// ```rust
/// use acton_resources::repository::FilterCondition;
/// use serde_json::json;
///
/// let row = json!({"id": 7, "name": "sprocket"});
/// assert!(FilterCondition::eq("id", "7").matches(&row));
/// assert!(FilterCondition::like("name", "spro%").matches(&row));
/// assert!(FilterCondition::is_null("deleted_at").matches(&row));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCondition {
    /// The field name to filter on
    pub field: String,
    /// The comparison operator
    pub operator: FilterOperator,
    /// The value to compare against
    pub value: FilterValue,
}

impl FilterCondition {
    /// Create a new filter condition
    pub fn new(field: impl Into<String>, operator: FilterOperator, value: FilterValue) -> Self {
        Self {
            field: field.into(),
            operator,
            value,
        }
    }

    /// Equality filter
    pub fn eq(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOperator::Equal, value.into())
    }

    /// Inequality filter
    pub fn ne(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOperator::NotEqual, value.into())
    }

    /// Greater-than filter
    pub fn gt(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOperator::GreaterThan, value.into())
    }

    /// Greater-than-or-equal filter
    pub fn gte(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOperator::GreaterThanOrEqual, value.into())
    }

    /// Less-than filter
    pub fn lt(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOperator::LessThan, value.into())
    }

    /// Less-than-or-equal filter
    pub fn lte(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOperator::LessThanOrEqual, value.into())
    }

    /// LIKE filter
    pub fn like(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::new(field, FilterOperator::Like, FilterValue::String(pattern.into()))
    }

    /// IN filter over strings
    pub fn in_strings(field: impl Into<String>, values: Vec<String>) -> Self {
        Self::new(field, FilterOperator::In, FilterValue::StringList(values))
    }

    /// IN filter over integers
    pub fn in_integers(field: impl Into<String>, values: Vec<i64>) -> Self {
        Self::new(field, FilterOperator::In, FilterValue::IntegerList(values))
    }

    /// IS NULL filter
    pub fn is_null(field: impl Into<String>) -> Self {
        Self::new(field, FilterOperator::IsNull, FilterValue::Null)
    }

    /// IS NOT NULL filter
    pub fn is_not_null(field: impl Into<String>) -> Self {
        Self::new(field, FilterOperator::IsNotNull, FilterValue::Null)
    }

    /// Evaluate the condition against a serialized row
    ///
    /// Scalars compare by their textual form when types differ, so a path
    /// parameter `"7"` matches a numeric id `7`.
    pub fn matches(&self, row: &Value) -> bool {
        let actual = row.get(&self.field).unwrap_or(&Value::Null);
        let expected = self.value.to_json();

        match self.operator {
            FilterOperator::Equal => loosely_equal(actual, &expected),
            FilterOperator::NotEqual => !actual.is_null() && !loosely_equal(actual, &expected),
            FilterOperator::GreaterThan => compare(actual, &expected) == Some(Ordering::Greater),
            FilterOperator::GreaterThanOrEqual => matches!(
                compare(actual, &expected),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            FilterOperator::LessThan => compare(actual, &expected) == Some(Ordering::Less),
            FilterOperator::LessThanOrEqual => matches!(
                compare(actual, &expected),
                Some(Ordering::Less | Ordering::Equal)
            ),
            FilterOperator::Like => match (scalar_text(actual), &self.value) {
                (Some(text), FilterValue::String(pattern)) => like(&text, pattern),
                _ => false,
            },
            FilterOperator::In => match expected {
                Value::Array(candidates) => {
                    candidates.iter().any(|candidate| loosely_equal(actual, candidate))
                }
                _ => false,
            },
            FilterOperator::IsNull => actual.is_null(),
            FilterOperator::IsNotNull => !actual.is_null(),
        }
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn loosely_equal(actual: &Value, expected: &Value) -> bool {
    if actual == expected {
        return true;
    }
    match (scalar_text(actual), scalar_text(expected)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

fn compare(actual: &Value, expected: &Value) -> Option<Ordering> {
    if let (Some(a), Some(b)) = (as_number(actual), as_number(expected)) {
        return a.partial_cmp(&b);
    }
    match (actual, expected) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn like(text: &str, pattern: &str) -> bool {
    let mut expr = String::from("^");
    for ch in pattern.chars() {
        match ch {
            '%' => expr.push_str(".*"),
            '_' => expr.push('.'),
            other => expr.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
        }
    }
    expr.push('$');

    regex::Regex::new(&expr)
        .map(|re| re.is_match(text))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pagination_defaults() {
        let pagination = Pagination::default();
        assert_eq!(pagination, Pagination::new(0, 20));
        assert_eq!(Pagination::first_page(5).limit, 5);
    }

    #[test]
    fn test_equality_coerces_scalars() {
        let row = json!({"id": 42, "active": true});
        assert!(FilterCondition::eq("id", 42).matches(&row));
        assert!(FilterCondition::eq("id", "42").matches(&row));
        assert!(FilterCondition::eq("active", "true").matches(&row));
        assert!(!FilterCondition::eq("id", 41).matches(&row));
        assert!(FilterCondition::ne("id", 41).matches(&row));
    }

    #[test]
    fn test_ordering() {
        let row = json!({"age": 30, "name": "m"});
        assert!(FilterCondition::gt("age", 18).matches(&row));
        assert!(FilterCondition::gte("age", 30).matches(&row));
        assert!(FilterCondition::lt("age", 31).matches(&row));
        assert!(FilterCondition::lte("name", "m").matches(&row));
        assert!(!FilterCondition::lt("name", "a").matches(&row));
    }

    #[test]
    fn test_like_wildcards() {
        let row = json!({"name": "widget.v2"});
        assert!(FilterCondition::like("name", "wid%").matches(&row));
        assert!(FilterCondition::like("name", "widget_v2").matches(&row));
        assert!(!FilterCondition::like("name", "gadget%").matches(&row));
        // dots in the pattern are literal
        assert!(!FilterCondition::like("name", "widget.v_3").matches(&row));
    }

    #[test]
    fn test_in_and_null() {
        let row = json!({"id": 3, "tag": null});
        assert!(FilterCondition::in_integers("id", vec![1, 3]).matches(&row));
        assert!(!FilterCondition::in_strings("id", vec!["4".to_string()]).matches(&row));
        assert!(FilterCondition::is_null("tag").matches(&row));
        assert!(FilterCondition::is_null("missing").matches(&row));
        assert!(FilterCondition::is_not_null("id").matches(&row));
    }
}
