//! Query construction for document collections
//!
//! Filters are a tagged union: a bare value means equality, a structured
//! comparison carries its operator explicitly.

use crate::timestamp;
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Comparison operators understood by document stores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOperator {
    Eq,               // ==
    Ne,               // !=
    Gt,               // >
    Gte,              // >=
    Lt,               // <
    Lte,              // <=
    In,               // in
    NotIn,            // not-in
    ArrayContains,    // array-contains
    ArrayContainsAny, // array-contains-any
}

impl CompareOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompareOperator::Eq => "==",
            CompareOperator::Ne => "!=",
            CompareOperator::Gt => ">",
            CompareOperator::Gte => ">=",
            CompareOperator::Lt => "<",
            CompareOperator::Lte => "<=",
            CompareOperator::In => "in",
            CompareOperator::NotIn => "not-in",
            CompareOperator::ArrayContains => "array-contains",
            CompareOperator::ArrayContainsAny => "array-contains-any",
        }
    }
}

impl fmt::Display for CompareOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompareOperator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "==" | "=" => Ok(CompareOperator::Eq),
            "!=" => Ok(CompareOperator::Ne),
            ">" => Ok(CompareOperator::Gt),
            ">=" => Ok(CompareOperator::Gte),
            "<" => Ok(CompareOperator::Lt),
            "<=" => Ok(CompareOperator::Lte),
            "in" => Ok(CompareOperator::In),
            "not-in" => Ok(CompareOperator::NotIn),
            "array-contains" => Ok(CompareOperator::ArrayContains),
            "array-contains-any" => Ok(CompareOperator::ArrayContainsAny),
            other => Err(format!("unknown comparison operator '{}'", other)),
        }
    }
}

/// Condition applied to a single field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldFilter {
    /// Plain value, compared for equality
    Equals(Value),
    /// Explicit operator and operand
    Compare(CompareOperator, Value),
}

impl FieldFilter {
    pub fn equals(value: impl Into<Value>) -> Self {
        Self::Equals(value.into())
    }

    pub fn compare(operator: CompareOperator, value: impl Into<Value>) -> Self {
        Self::Compare(operator, value.into())
    }

    /// The operand carried by this filter
    pub fn value(&self) -> &Value {
        match self {
            FieldFilter::Equals(value) | FieldFilter::Compare(_, value) => value,
        }
    }

    pub fn operator(&self) -> CompareOperator {
        match self {
            FieldFilter::Equals(_) => CompareOperator::Eq,
            FieldFilter::Compare(op, _) => *op,
        }
    }

    /// Evaluate the filter against a field value (`None` when the field is missing)
    pub fn matches(&self, field: Option<&Value>) -> bool {
        let operand = self.value();
        match (self.operator(), field) {
            (CompareOperator::Eq, Some(actual)) => values_equal(actual, operand),
            (CompareOperator::Ne, Some(actual)) => !values_equal(actual, operand),
            (CompareOperator::Gt, Some(actual)) => {
                compare_values(actual, operand) == Some(Ordering::Greater)
            }
            (CompareOperator::Gte, Some(actual)) => matches!(
                compare_values(actual, operand),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            (CompareOperator::Lt, Some(actual)) => {
                compare_values(actual, operand) == Some(Ordering::Less)
            }
            (CompareOperator::Lte, Some(actual)) => matches!(
                compare_values(actual, operand),
                Some(Ordering::Less | Ordering::Equal)
            ),
            (CompareOperator::In, Some(actual)) => operand
                .as_array()
                .is_some_and(|candidates| candidates.iter().any(|c| values_equal(actual, c))),
            (CompareOperator::NotIn, Some(actual)) => operand
                .as_array()
                .is_some_and(|candidates| !candidates.iter().any(|c| values_equal(actual, c))),
            (CompareOperator::ArrayContains, Some(Value::Array(items))) => {
                items.iter().any(|item| values_equal(item, operand))
            }
            (CompareOperator::ArrayContainsAny, Some(Value::Array(items))) => {
                operand.as_array().is_some_and(|candidates| {
                    items
                        .iter()
                        .any(|item| candidates.iter().any(|c| values_equal(item, c)))
                })
            }
            // Missing fields never match, not even `!=`
            _ => false,
        }
    }
}

impl From<Value> for FieldFilter {
    fn from(value: Value) -> Self {
        FieldFilter::Equals(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Query over a single collection
#[derive(Debug, Clone, Default)]
pub struct DocumentQuery {
    pub filters: Vec<(String, FieldFilter)>,
    pub order_by: Vec<(String, SortOrder)>,
    pub limit: Option<usize>,
    /// Id of the document after which results resume
    pub start_after: Option<String>,
}

impl DocumentQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a filter condition (combined with AND)
    pub fn filter(mut self, field: &str, filter: FieldFilter) -> Self {
        self.filters.push((field.to_string(), filter));
        self
    }

    /// Add multiple filters (combined with AND)
    pub fn filters(mut self, filters: impl IntoIterator<Item = (String, FieldFilter)>) -> Self {
        self.filters.extend(filters);
        self
    }

    pub fn where_eq(self, field: &str, value: impl Into<Value>) -> Self {
        self.filter(field, FieldFilter::equals(value))
    }

    pub fn where_op(self, field: &str, operator: CompareOperator, value: impl Into<Value>) -> Self {
        self.filter(field, FieldFilter::compare(operator, value))
    }

    pub fn order_by(mut self, field: &str, order: SortOrder) -> Self {
        self.order_by.push((field.to_string(), order));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn start_after(mut self, document_id: impl Into<String>) -> Self {
        self.start_after = Some(document_id.into());
        self
    }

    /// Check every filter against a document payload
    pub fn matches(&self, document: &crate::Document) -> bool {
        self.filters
            .iter()
            .all(|(field, filter)| filter.matches(document.get(field)))
    }
}

/// Equality with numeric normalization (`1` equals `1.0`)
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        _ => a == b,
    }
}

/// Ordering between two values of the same kind; `None` when incomparable.
///
/// Strings that both parse as RFC 3339 timestamps compare chronologically.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => {
            match (timestamp::parse(x), timestamp::parse(y)) {
                (Some(x), Some(y)) => Some(x.cmp(&y)),
                _ => Some(x.cmp(y)),
            }
        }
        _ => None,
    }
}

/// Total ordering used for sorting mixed values
pub(crate) fn sort_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(value: Option<&Value>) -> u8 {
        match value {
            None | Some(Value::Null) => 0,
            Some(Value::Bool(_)) => 1,
            Some(Value::Number(_)) => 2,
            Some(Value::String(_)) => 3,
            Some(Value::Array(_)) => 4,
            Some(Value::Object(_)) => 5,
        }
    }

    match (a, b) {
        (Some(x), Some(y)) => compare_values(x, y).unwrap_or_else(|| rank(a).cmp(&rank(b))),
        _ => rank(a).cmp(&rank(b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_operator_parsing() {
        assert_eq!(">".parse::<CompareOperator>(), Ok(CompareOperator::Gt));
        assert_eq!(
            "array-contains".parse::<CompareOperator>(),
            Ok(CompareOperator::ArrayContains)
        );
        assert!("~".parse::<CompareOperator>().is_err());
        assert_eq!(CompareOperator::NotIn.to_string(), "not-in");
    }

    #[test]
    fn test_equality_filter() {
        let filter = FieldFilter::equals("spanish");
        assert!(filter.matches(Some(&json!("spanish"))));
        assert!(!filter.matches(Some(&json!("french"))));
        assert!(!filter.matches(None));

        // Integers and floats compare numerically
        assert!(FieldFilter::equals(3).matches(Some(&json!(3.0))));
    }

    #[test]
    fn test_comparison_filters() {
        let gt = FieldFilter::compare(CompareOperator::Gt, 25);
        assert!(gt.matches(Some(&json!(30))));
        assert!(!gt.matches(Some(&json!(25))));
        assert!(!gt.matches(Some(&json!("thirty"))));

        let lte = FieldFilter::compare(CompareOperator::Lte, 25);
        assert!(lte.matches(Some(&json!(25))));
        assert!(!lte.matches(Some(&json!(26))));

        let ne = FieldFilter::compare(CompareOperator::Ne, "draft");
        assert!(ne.matches(Some(&json!("published"))));
        assert!(!ne.matches(None));
    }

    #[test]
    fn test_membership_filters() {
        let in_filter = FieldFilter::compare(CompareOperator::In, json!(["new", "learning"]));
        assert!(in_filter.matches(Some(&json!("learning"))));
        assert!(!in_filter.matches(Some(&json!("review"))));

        let not_in = FieldFilter::compare(CompareOperator::NotIn, json!(["suspended"]));
        assert!(not_in.matches(Some(&json!("review"))));
        assert!(!not_in.matches(Some(&json!("suspended"))));

        let contains = FieldFilter::compare(CompareOperator::ArrayContains, "verbs");
        assert!(contains.matches(Some(&json!(["nouns", "verbs"]))));
        assert!(!contains.matches(Some(&json!("verbs"))));

        let contains_any =
            FieldFilter::compare(CompareOperator::ArrayContainsAny, json!(["a", "z"]));
        assert!(contains_any.matches(Some(&json!(["x", "z"]))));
        assert!(!contains_any.matches(Some(&json!(["x", "y"]))));
    }

    #[test]
    fn test_timestamp_strings_compare_chronologically() {
        // Lexicographic order would put the fractional form first
        let earlier = json!("2024-05-01T10:00:00Z");
        let later = json!("2024-05-01T10:00:00.500Z");
        assert_eq!(compare_values(&earlier, &later), Some(Ordering::Less));
    }

    #[test]
    fn test_query_builder_accumulates() {
        let query = DocumentQuery::new()
            .where_eq("deckId", "d1")
            .where_op("due", CompareOperator::Lt, "2024-01-01T00:00:00Z")
            .order_by("due", SortOrder::Asc)
            .limit(10)
            .start_after("card-9");

        assert_eq!(query.filters.len(), 2);
        assert_eq!(query.order_by.len(), 1);
        assert_eq!(query.limit, Some(10));
        assert_eq!(query.start_after.as_deref(), Some("card-9"));
    }
}
