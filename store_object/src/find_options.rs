//! Listing options for repositories
//!
//! [`Filters`] is an ordered list of per-field conditions. Conditions whose
//! value is JSON `null` are dropped when added, so optional query parameters
//! can be passed straight through without filtering on "missing".

use document_store::{CompareOperator, DocumentQuery, FieldFilter, SortOrder};
use serde_json::Value;

pub const DEFAULT_LIMIT: usize = 100;
pub const DEFAULT_ORDER_BY: &str = "createdAt";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filters {
    entries: Vec<(String, FieldFilter)>,
}

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `field == value`
    pub fn eq(self, field: &str, value: impl Into<Value>) -> Self {
        self.with(field, FieldFilter::equals(value))
    }

    /// Require `field <op> value`
    pub fn compare(self, field: &str, operator: CompareOperator, value: impl Into<Value>) -> Self {
        self.with(field, FieldFilter::compare(operator, value))
    }

    /// Add a prebuilt condition; null-valued conditions are skipped
    pub fn with(mut self, field: &str, filter: FieldFilter) -> Self {
        if !filter.value().is_null() {
            self.entries.push((field.to_string(), filter));
        }
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn as_slice(&self) -> &[(String, FieldFilter)] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, FieldFilter)> {
        self.entries.iter()
    }
}

impl<S: Into<String>> FromIterator<(S, FieldFilter)> for Filters {
    fn from_iter<I: IntoIterator<Item = (S, FieldFilter)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Filters::new(), |filters, (field, filter)| {
                let field: String = field.into();
                filters.with(&field, filter)
            })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FindOptions {
    pub limit: usize,
    pub offset: usize,
    pub order_by: String,
    pub order_direction: SortOrder,
    pub filters: Filters,
}

impl Default for FindOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
            order_by: DEFAULT_ORDER_BY.to_string(),
            order_direction: SortOrder::Desc,
            filters: Filters::new(),
        }
    }
}

impl FindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn order_by(mut self, field: &str, direction: SortOrder) -> Self {
        self.order_by = field.to_string();
        self.order_direction = direction;
        self
    }

    pub fn filters(mut self, filters: Filters) -> Self {
        self.filters = filters;
        self
    }

    /// Query with these filters and ordering but no limit or cursor
    pub(crate) fn base_query(&self) -> DocumentQuery {
        DocumentQuery::new()
            .filters(self.filters.iter().cloned())
            .order_by(&self.order_by, self.order_direction)
    }
}
