use sea_orm::sea_query::{Alias, Expr, Query};
use sea_orm::ConnectionTrait;
use serde::Serialize;
use std::collections::BTreeSet;

use super::introspect::{load_table, TableSchema};
use super::values::Cell;
use crate::error::Result;

/// Columns with at most this many distinct non-null values get an
/// enumerable picker; larger ones get free-text matching.
pub const LOW_CARDINALITY_LIMIT: usize = 50;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum Cardinality {
    Low(BTreeSet<String>),
    High,
}

impl Cardinality {
    pub fn is_low(&self) -> bool {
        matches!(self, Cardinality::Low(_))
    }

    pub fn values(&self) -> Option<&BTreeSet<String>> {
        match self {
            Cardinality::Low(values) => Some(values),
            Cardinality::High => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    pub cardinality: Cardinality,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TableMetadata {
    pub name: String,
    pub columns: Vec<ColumnInfo>,
}

pub fn classify<'a, I>(values: I) -> Cardinality
where
    I: IntoIterator<Item = &'a Cell>,
{
    let mut distinct = BTreeSet::new();
    for cell in values.into_iter().filter(|c| !c.is_null()) {
        distinct.insert(cell.to_string());
        if distinct.len() > LOW_CARDINALITY_LIMIT {
            return Cardinality::High;
        }
    }
    Cardinality::Low(distinct)
}

async fn load_column<C>(db: &C, schema: &TableSchema, column: &str) -> Result<ColumnInfo>
where
    C: ConnectionTrait,
{
    let select = Query::select()
        .distinct()
        .column(Alias::new(column))
        .from(Alias::new(schema.name.as_str()))
        .and_where(Expr::col(Alias::new(column)).is_not_null())
        .limit(LOW_CARDINALITY_LIMIT as u64 + 1)
        .to_owned();
    let values = super::fetch(db, &select, vec![column.to_owned()]).await?;

    Ok(ColumnInfo {
        name: column.to_owned(),
        cardinality: classify(values.rows.iter().flat_map(|row| row.first())),
    })
}

/// Classifies every column of `table` against its current contents.
pub async fn load_metadata<C>(db: &C, table: &str) -> Result<TableMetadata>
where
    C: ConnectionTrait,
{
    let schema = load_table(db, table).await?;
    let mut columns = Vec::with_capacity(schema.columns.len());
    for column in &schema.columns {
        columns.push(load_column(db, &schema, &column.name).await?);
    }
    Ok(TableMetadata {
        name: schema.name,
        columns,
    })
}
