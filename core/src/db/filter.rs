use sea_orm::sea_query::{Alias, Expr, Query, SelectStatement, SqliteQueryBuilder, Value};
use sea_orm::ConnectionTrait;
use serde::{Deserialize, Serialize};

use super::introspect::{load_table, ColumnSchema, TableSchema};
use super::values::{ColumnKind, ResultSet};
use crate::error::{EngineError, Result};

/// `column = value`, compared exactly.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterPredicate {
    pub column: String,
    pub value: String,
}

impl FilterPredicate {
    pub fn new(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }
}

pub trait SelectPredicates: Sized {
    fn predicates<'a, I>(self, schema: &TableSchema, predicates: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a FilterPredicate>;
}

impl SelectPredicates for SelectStatement {
    fn predicates<'a, I>(self, schema: &TableSchema, predicates: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a FilterPredicate>,
    {
        let mut select = self;
        for p in predicates {
            let column = schema
                .column(&p.column)
                .ok_or_else(|| EngineError::column_not_found(&schema.name, &p.column))?;
            let value = predicate_value(column, &p.value)?;
            select.and_where(Expr::col(Alias::new(column.name.as_str())).eq(value));
        }
        Ok(select)
    }
}

fn predicate_value(column: &ColumnSchema, raw: &str) -> Result<Value> {
    match column.kind {
        // stored text is matched as-is, whatever its format
        ColumnKind::Temporal => Ok(Value::from(raw.to_owned())),
        kind => kind.bind(&column.name, raw),
    }
}

/// A read over one table, ready to run.
#[derive(Clone, Debug)]
pub struct QuerySpec {
    table: String,
    columns: Vec<String>,
    select: SelectStatement,
}

impl QuerySpec {
    pub fn build(schema: &TableSchema, predicates: &[FilterPredicate]) -> Result<Self> {
        let columns = schema.column_names();
        let select = Query::select()
            .columns(columns.iter().map(|c| Alias::new(c.as_str())))
            .from(Alias::new(schema.name.as_str()))
            .to_owned()
            .predicates(schema, predicates)?;

        Ok(Self {
            table: schema.name.clone(),
            columns,
            select,
        })
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.select.limit(limit);
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// SQL text with values inlined, for display only.
    pub fn to_sql(&self) -> String {
        self.select.to_string(SqliteQueryBuilder)
    }

    pub async fn fetch<C>(&self, db: &C) -> Result<ResultSet>
    where
        C: ConnectionTrait,
    {
        Ok(super::fetch(db, &self.select, self.columns.clone()).await?)
    }
}

pub async fn build<C>(db: &C, table: &str, predicates: &[FilterPredicate]) -> Result<QuerySpec>
where
    C: ConnectionTrait,
{
    let schema = load_table(db, table).await?;
    QuerySpec::build(&schema, predicates)
}
