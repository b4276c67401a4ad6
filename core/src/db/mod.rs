pub mod balance;
pub mod classify;
pub mod filter;
pub mod import;
pub mod introspect;
pub mod record;
pub mod schema;
pub mod values;

pub use values::{Cell, ColumnKind, ResultSet};

use sea_orm::{sea_query::SelectStatement, ConnectionTrait, DbErr};

/// Runs a select and collects the rows as cells, one per named column.
pub async fn fetch<C>(db: &C, select: &SelectStatement, columns: Vec<String>) -> Result<ResultSet, DbErr>
where
    C: ConnectionTrait,
{
    let stmt = db.get_database_backend().build(select);
    log::debug!("{}", stmt);
    let rows = db.query_all(stmt).await?;
    ResultSet::from_rows(columns, rows)
}
