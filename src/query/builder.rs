// Query builder
// Accumulates filter/sort/limit criteria and produces an immutable Query

use super::filter::{Filter, FilterOp};
use serde_json::Value;

/// The selected-columns marker of a query
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Columns {
    #[default]
    All,
    Named(Vec<String>),
}

impl Columns {
    /// Parse a column list such as `"*"` or `"id, name"`
    pub fn parse(columns: &str) -> Self {
        let names: Vec<String> = columns
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();

        if names.is_empty() || names.iter().any(|name| name == "*") {
            Columns::All
        } else {
            Columns::Named(names)
        }
    }
}

/// A single sort key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub ascending: bool,
}

/// An immutable query descriptor against one table
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub table: String,
    pub columns: Columns,
    pub filters: Vec<Filter>,
    pub order: Option<OrderBy>,
    pub limit: Option<usize>,
}

/// Fluent builder for a [`Query`]
/// Every method consumes and returns the builder so calls can be chained
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    query: Query,
}

impl QueryBuilder {
    /// Start a query against `table`
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            query: Query {
                table: table.into(),
                columns: Columns::All,
                filters: Vec::new(),
                order: None,
                limit: None,
            },
        }
    }

    /// Record the column projection request
    pub fn select(mut self, columns: &str) -> Self {
        self.query.columns = Columns::parse(columns);
        self
    }

    /// Append a predicate
    pub fn filter(mut self, field: impl Into<String>, op: FilterOp) -> Self {
        self.query.filters.push(Filter::new(field, op));
        self
    }

    pub fn eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(field, FilterOp::Eq(value.into()))
    }

    pub fn neq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(field, FilterOp::Neq(value.into()))
    }

    pub fn gt(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(field, FilterOp::Gt(value.into()))
    }

    pub fn gte(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(field, FilterOp::Gte(value.into()))
    }

    pub fn lt(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(field, FilterOp::Lt(value.into()))
    }

    pub fn lte(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(field, FilterOp::Lte(value.into()))
    }

    pub fn like(self, field: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.filter(field, FilterOp::Like(pattern.into()))
    }

    /// Membership filter (`in` is a keyword, hence the underscore)
    pub fn in_<I, V>(self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.filter(field, FilterOp::In(values))
    }

    /// Sort ascending by `field`
    pub fn order(self, field: impl Into<String>) -> Self {
        self.order_by(field, true)
    }

    /// Sort by `field` in the given direction; a later call replaces an earlier one
    pub fn order_by(mut self, field: impl Into<String>, ascending: bool) -> Self {
        self.query.order = Some(OrderBy {
            field: field.into(),
            ascending,
        });
        self
    }

    pub fn order_desc(self, field: impl Into<String>) -> Self {
        self.order_by(field, false)
    }

    /// Cap the number of rows returned; a later call replaces an earlier one
    pub fn limit(mut self, count: usize) -> Self {
        self.query.limit = Some(count);
        self
    }

    /// Finish building
    pub fn build(self) -> Query {
        self.query
    }
}
