// SQL Parser
// Translates the console's SQL subset into query descriptors and write statements
// We use the sqlparser crate to handle the SQL grammar

use super::builder::{Columns, OrderBy, Query, QueryBuilder};
use super::filter::{Filter, FilterOp};
use crate::error::{MockError, MockResult};
use crate::storage::Record;
use serde_json::{Number, Value};
use sqlparser::ast::{
    AssignmentTarget, BinaryOperator, Expr, FromTable, GroupByExpr, ObjectName, SelectItem, SetExpr,
    Statement as SqlStatement, TableFactor, TableWithJoins, UnaryOperator, Value as SqlValue,
};
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;

/// A console statement, ready for the executor
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// SELECT cols FROM t [WHERE ...] [ORDER BY col [ASC|DESC]] [LIMIT n]
    Select(Query),
    /// INSERT INTO t [(cols)] VALUES (...), ...
    Insert { table: String, records: Vec<Record> },
    /// UPDATE t SET col = value, ... [WHERE ...]
    Update { query: Query, patch: Record },
    /// DELETE FROM t [WHERE ...]
    Delete(Query),
}

/// The query parser
pub struct QueryParser;

impl QueryParser {
    /// Parse a SQL string into a Statement
    pub fn parse(sql: &str) -> MockResult<Statement> {
        let dialect = GenericDialect {};
        let ast = Parser::parse_sql(&dialect, sql).map_err(|e| MockError::Parse(e.to_string()))?;

        if ast.len() != 1 {
            return Err(MockError::Unsupported(
                "only single statements are supported".to_string(),
            ));
        }

        match &ast[0] {
            SqlStatement::Query(query) => Self::parse_select(query),
            SqlStatement::Insert(insert) => Self::parse_insert(insert),
            SqlStatement::Update {
                table,
                assignments,
                from,
                selection,
                returning,
                or,
            } => {
                Self::reject_clauses(&[
                    ("UPDATE ... FROM", from.is_some()),
                    ("RETURNING", returning.is_some()),
                    ("UPDATE OR", or.is_some()),
                ])?;
                Self::parse_update(table, assignments, selection.as_ref())
            }
            SqlStatement::Delete(delete) => Self::parse_delete(delete),
            other => Err(MockError::Unsupported(format!("statement: {}", other))),
        }
    }

    fn parse_select(query: &sqlparser::ast::Query) -> MockResult<Statement> {
        let select = match query.body.as_ref() {
            SetExpr::Select(select) => select,
            _ => return Err(MockError::Unsupported("only plain SELECT is supported".to_string())),
        };

        let grouped = match &select.group_by {
            GroupByExpr::Expressions(exprs, modifiers) => !exprs.is_empty() || !modifiers.is_empty(),
            GroupByExpr::All(_) => true,
        };
        Self::reject_clauses(&[
            ("WITH", query.with.is_some()),
            ("OFFSET", query.offset.is_some()),
            ("FETCH", query.fetch.is_some()),
            ("LIMIT BY", !query.limit_by.is_empty()),
            ("FOR UPDATE/SHARE", !query.locks.is_empty()),
            ("DISTINCT", select.distinct.is_some()),
            ("TOP", select.top.is_some()),
            ("SELECT INTO", select.into.is_some()),
            ("GROUP BY", grouped),
            ("HAVING", select.having.is_some()),
            ("QUALIFY", select.qualify.is_some()),
            ("WINDOW", !select.named_window.is_empty()),
            ("SORT BY", !select.sort_by.is_empty()),
        ])?;

        let table = match select.from.as_slice() {
            [from] => Self::table_name(from)?,
            [] => return Err(MockError::Unsupported("SELECT needs a FROM table".to_string())),
            _ => return Err(MockError::Unsupported("joins are not supported".to_string())),
        };

        let mut columns = Vec::new();
        for item in &select.projection {
            match item {
                SelectItem::Wildcard(_) => columns.push("*".to_string()),
                SelectItem::UnnamedExpr(expr) => columns.push(Self::column_name(expr)?),
                _ => return Err(MockError::Unsupported(format!("select item: {}", item))),
            }
        }

        let mut descriptor = QueryBuilder::new(table).build();
        descriptor.columns = Columns::parse(&columns.join(","));
        if let Some(selection) = &select.selection {
            Self::parse_where(selection, &mut descriptor.filters)?;
        }

        if let Some(order_by) = &query.order_by {
            // Only one sort key is kept; the last one wins like repeated order() calls
            for order in &order_by.exprs {
                if order.nulls_first.is_some() {
                    return Err(MockError::Unsupported("NULLS FIRST/LAST".to_string()));
                }
                descriptor.order = Some(OrderBy {
                    field: Self::column_name(&order.expr)?,
                    ascending: order.asc.unwrap_or(true),
                });
            }
        }

        if let Some(limit) = &query.limit {
            let count = Self::parse_value(limit)?
                .as_u64()
                .ok_or_else(|| MockError::Unsupported(format!("LIMIT {}", limit)))?;
            descriptor.limit = Some(count as usize);
        }

        Ok(Statement::Select(descriptor))
    }

    fn parse_insert(insert: &sqlparser::ast::Insert) -> MockResult<Statement> {
        Self::reject_clauses(&[
            ("ON CONFLICT/DUPLICATE KEY", insert.on.is_some()),
            ("RETURNING", insert.returning.is_some()),
            ("INSERT OR", insert.or.is_some()),
        ])?;
        let table = Self::object_name(&insert.table_name);

        let rows = match &insert.source {
            Some(source) => match source.body.as_ref() {
                SetExpr::Values(values) => &values.rows,
                _ => return Err(MockError::Unsupported("INSERT needs a VALUES clause".to_string())),
            },
            None => return Err(MockError::Unsupported("INSERT needs a VALUES clause".to_string())),
        };

        let columns: Vec<String> = insert.columns.iter().map(|c| c.value.clone()).collect();
        let mut records = Vec::with_capacity(rows.len());

        for row in rows {
            let record = if columns.is_empty() {
                // Without a column list each row is one JSON object literal
                match row.as_slice() {
                    [expr] => Self::parse_json_object(expr)?,
                    _ => {
                        return Err(MockError::Unsupported(
                            "without a column list, each row must be a single JSON object string"
                                .to_string(),
                        ))
                    }
                }
            } else {
                if row.len() != columns.len() {
                    return Err(MockError::Parse(format!(
                        "expected {} values, got {}",
                        columns.len(),
                        row.len()
                    )));
                }
                let mut record = Record::new();
                for (column, expr) in columns.iter().zip(row) {
                    record.insert(column.clone(), Self::parse_value(expr)?);
                }
                record
            };
            records.push(record);
        }

        Ok(Statement::Insert { table, records })
    }

    fn parse_update(
        table: &TableWithJoins,
        assignments: &[sqlparser::ast::Assignment],
        selection: Option<&Expr>,
    ) -> MockResult<Statement> {
        let mut query = QueryBuilder::new(Self::table_name(table)?).build();

        let mut patch = Record::new();
        for assignment in assignments {
            let column = match &assignment.target {
                AssignmentTarget::ColumnName(name) => Self::object_name(name),
                _ => return Err(MockError::Unsupported("tuple assignments".to_string())),
            };
            patch.insert(column, Self::parse_value(&assignment.value)?);
        }

        if let Some(expr) = selection {
            Self::parse_where(expr, &mut query.filters)?;
        }

        Ok(Statement::Update { query, patch })
    }

    fn parse_delete(delete: &sqlparser::ast::Delete) -> MockResult<Statement> {
        Self::reject_clauses(&[
            ("DELETE ... USING", delete.using.is_some()),
            ("RETURNING", delete.returning.is_some()),
            ("DELETE ... ORDER BY", !delete.order_by.is_empty()),
            ("DELETE ... LIMIT", delete.limit.is_some()),
        ])?;
        let tables = match &delete.from {
            FromTable::WithFromKeyword(tables) | FromTable::WithoutKeyword(tables) => tables,
        };
        let table = match tables.as_slice() {
            [table] => Self::table_name(table)?,
            _ => return Err(MockError::Unsupported("DELETE needs exactly one table".to_string())),
        };

        let mut query = QueryBuilder::new(table).build();
        if let Some(expr) = &delete.selection {
            Self::parse_where(expr, &mut query.filters)?;
        }

        Ok(Statement::Delete(query))
    }

    /// Fail on the first clause present that the engine cannot honour
    fn reject_clauses(clauses: &[(&str, bool)]) -> MockResult<()> {
        match clauses.iter().find(|(_, present)| *present) {
            Some((clause, _)) => Err(MockError::Unsupported(format!("{} is not supported", clause))),
            None => Ok(()),
        }
    }

    /// Flatten a WHERE clause into AND-ed predicates
    fn parse_where(expr: &Expr, filters: &mut Vec<Filter>) -> MockResult<()> {
        match expr {
            Expr::Nested(inner) => Self::parse_where(inner, filters),
            Expr::BinaryOp {
                left,
                op: BinaryOperator::And,
                right,
            } => {
                Self::parse_where(left, filters)?;
                Self::parse_where(right, filters)
            }
            Expr::BinaryOp { left, op, right } => {
                let field = Self::column_name(left)?;
                let value = Self::parse_value(right)?;
                let op = match op {
                    BinaryOperator::Eq => FilterOp::Eq(value),
                    BinaryOperator::NotEq => FilterOp::Neq(value),
                    BinaryOperator::Gt => FilterOp::Gt(value),
                    BinaryOperator::GtEq => FilterOp::Gte(value),
                    BinaryOperator::Lt => FilterOp::Lt(value),
                    BinaryOperator::LtEq => FilterOp::Lte(value),
                    other => return Err(MockError::Unsupported(format!("operator {}", other))),
                };
                filters.push(Filter::new(field, op));
                Ok(())
            }
            Expr::Like {
                negated: false,
                expr,
                pattern,
                ..
            } => {
                let pattern = match Self::parse_value(pattern)? {
                    Value::String(pattern) => pattern,
                    other => return Err(MockError::Unsupported(format!("LIKE pattern {}", other))),
                };
                filters.push(Filter::new(Self::column_name(expr)?, FilterOp::Like(pattern)));
                Ok(())
            }
            Expr::InList {
                expr,
                list,
                negated: false,
            } => {
                let values = list.iter().map(Self::parse_value).collect::<MockResult<Vec<_>>>()?;
                filters.push(Filter::new(Self::column_name(expr)?, FilterOp::In(values)));
                Ok(())
            }
            _ => Err(MockError::Unsupported(format!("WHERE clause: {}", expr))),
        }
    }

    /// Parse a literal into a JSON value
    fn parse_value(expr: &Expr) -> MockResult<Value> {
        match expr {
            Expr::Value(SqlValue::Number(n, _)) => Self::parse_number(n),
            Expr::Value(SqlValue::SingleQuotedString(s))
            | Expr::Value(SqlValue::DoubleQuotedString(s)) => Ok(Value::String(s.clone())),
            Expr::Value(SqlValue::Boolean(b)) => Ok(Value::Bool(*b)),
            Expr::Value(SqlValue::Null) => Ok(Value::Null),
            Expr::UnaryOp {
                op: UnaryOperator::Minus,
                expr,
            } => match expr.as_ref() {
                Expr::Value(SqlValue::Number(n, _)) => Self::parse_number(&format!("-{}", n)),
                _ => Err(MockError::Unsupported(format!("value {}", expr))),
            },
            Expr::Nested(inner) => Self::parse_value(inner),
            _ => Err(MockError::Unsupported(format!("value {}", expr))),
        }
    }

    fn parse_number(text: &str) -> MockResult<Value> {
        if let Ok(int) = text.parse::<i64>() {
            return Ok(Value::from(int));
        }
        text.parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| MockError::Parse(format!("invalid number: {}", text)))
    }

    fn parse_json_object(expr: &Expr) -> MockResult<Record> {
        match Self::parse_value(expr)? {
            Value::String(text) => match serde_json::from_str::<Value>(&text)? {
                Value::Object(record) => Ok(record),
                _ => Err(MockError::Parse("row must be a JSON object".to_string())),
            },
            _ => Err(MockError::Parse("row must be a JSON object string".to_string())),
        }
    }

    fn column_name(expr: &Expr) -> MockResult<String> {
        match expr {
            Expr::Identifier(ident) => Ok(ident.value.clone()),
            Expr::CompoundIdentifier(idents) => idents
                .last()
                .map(|ident| ident.value.clone())
                .ok_or_else(|| MockError::Parse("empty column name".to_string())),
            _ => Err(MockError::Unsupported(format!("expected a column name, got {}", expr))),
        }
    }

    fn table_name(table: &TableWithJoins) -> MockResult<String> {
        if !table.joins.is_empty() {
            return Err(MockError::Unsupported("joins are not supported".to_string()));
        }
        match &table.relation {
            TableFactor::Table { name, .. } => Ok(Self::object_name(name)),
            _ => Err(MockError::Unsupported("unsupported table reference".to_string())),
        }
    }

    fn object_name(name: &ObjectName) -> String {
        name.0
            .iter()
            .map(|ident| ident.value.clone())
            .collect::<Vec<_>>()
            .join(".")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_select_with_everything() {
        let statement = QueryParser::parse(
            "SELECT name, score FROM t WHERE score = 5 AND name LIKE '%a%' ORDER BY name DESC LIMIT 2",
        )
        .unwrap();

        let expected = QueryBuilder::new("t")
            .select("name, score")
            .eq("score", 5)
            .like("name", "%a%")
            .order_desc("name")
            .limit(2)
            .build();
        assert_eq!(statement, Statement::Select(expected));
    }

    #[test]
    fn test_parse_select_star() {
        match QueryParser::parse("SELECT * FROM workouts").unwrap() {
            Statement::Select(query) => {
                assert_eq!(query.columns, Columns::All);
                assert!(query.filters.is_empty());
                assert_eq!(query.order, None);
            }
            other => panic!("unexpected statement: {:?}", other),
        }
    }

    #[test]
    fn test_parse_where_operators() {
        let statement = QueryParser::parse(
            "SELECT * FROM t WHERE (a <> 1) AND b > -2 AND c >= 2.5 AND d < 'x' AND e <= true AND f IN ('p', 'q')",
        )
        .unwrap();

        let query = match statement {
            Statement::Select(query) => query,
            other => panic!("unexpected statement: {:?}", other),
        };
        let ops: Vec<FilterOp> = query.filters.into_iter().map(|f| f.op).collect();
        assert_eq!(
            ops,
            vec![
                FilterOp::Neq(json!(1)),
                FilterOp::Gt(json!(-2)),
                FilterOp::Gte(json!(2.5)),
                FilterOp::Lt(json!("x")),
                FilterOp::Lte(json!(true)),
                FilterOp::In(vec![json!("p"), json!("q")]),
            ]
        );
    }

    #[test]
    fn test_parse_insert_with_columns() {
        let statement =
            QueryParser::parse("INSERT INTO t (name, score) VALUES ('a', 5), ('b', NULL)").unwrap();

        match statement {
            Statement::Insert { table, records } => {
                assert_eq!(table, "t");
                assert_eq!(records.len(), 2);
                assert_eq!(records[0]["score"], json!(5));
                assert_eq!(records[1]["score"], json!(null));
            }
            other => panic!("unexpected statement: {:?}", other),
        }
    }

    #[test]
    fn test_parse_insert_json_rows() {
        let statement =
            QueryParser::parse(r#"INSERT INTO t VALUES ('{"name": "a", "tags": ["x"]}')"#).unwrap();

        match statement {
            Statement::Insert { records, .. } => {
                assert_eq!(records[0]["tags"], json!(["x"]));
            }
            other => panic!("unexpected statement: {:?}", other),
        }
    }

    #[test]
    fn test_parse_update_without_where() {
        let statement = QueryParser::parse("UPDATE t SET status = 'done', reps = 3").unwrap();

        match statement {
            Statement::Update { query, patch } => {
                assert!(query.filters.is_empty());
                assert_eq!(patch["status"], json!("done"));
                assert_eq!(patch["reps"], json!(3));
            }
            other => panic!("unexpected statement: {:?}", other),
        }
    }

    #[test]
    fn test_parse_delete() {
        let statement = QueryParser::parse("DELETE FROM t WHERE id = 'x'").unwrap();
        assert_eq!(
            statement,
            Statement::Delete(QueryBuilder::new("t").eq("id", "x").build())
        );
    }

    #[test]
    fn test_rejects_unsupported() {
        assert!(matches!(
            QueryParser::parse("CREATE TABLE t (id INT)"),
            Err(MockError::Unsupported(_))
        ));
        assert!(matches!(
            QueryParser::parse("SELECT * FROM t WHERE a OR b"),
            Err(MockError::Unsupported(_))
        ));
        assert!(matches!(QueryParser::parse("SELEC nope"), Err(MockError::Parse(_))));

        for sql in [
            "SELECT * FROM t LIMIT 1 OFFSET 2",
            "SELECT DISTINCT tag FROM t",
            "SELECT tag FROM t GROUP BY tag",
            "SELECT DISTINCT tag FROM t GROUP BY tag",
            "SELECT tag FROM t GROUP BY tag HAVING tag = 'a'",
            "SELECT * FROM t FETCH FIRST 1 ROWS ONLY",
            "SELECT * FROM t ORDER BY a NULLS FIRST",
            "WITH x AS (SELECT * FROM t) SELECT * FROM x",
            "UPDATE t SET a = 1 WHERE id = 'x' RETURNING id",
            "UPDATE t SET a = s.a FROM s WHERE t.id = s.id",
            "INSERT INTO t (a) VALUES (1) RETURNING a",
            "DELETE FROM t WHERE id = 'x' RETURNING id",
        ] {
            assert!(
                matches!(QueryParser::parse(sql), Err(MockError::Unsupported(_))),
                "{}",
                sql
            );
        }
    }

    #[test]
    fn test_unsupported_error_names_the_clause() {
        let err = QueryParser::parse("UPDATE t SET a = 1 WHERE id = 'x' RETURNING id").unwrap_err();
        assert!(err.to_string().contains("RETURNING"));
    }
}
