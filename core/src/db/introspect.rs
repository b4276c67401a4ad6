use sea_orm::{ConnectionTrait, DbErr, Statement};
use serde::Serialize;

use super::values::ColumnKind;
use crate::error::{EngineError, Result};
use crate::model::TableKind;

/// Bookkeeping table of the migrator, never shown to operators.
const MIGRATION_TABLE: &str = "seaql_migrations";

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ColumnSchema {
    pub name: String,
    pub declared_type: String,
    pub kind: ColumnKind,
    pub not_null: bool,
    pub primary_key: bool,
}

/// Shape of a table as found in the catalog.
///
/// Table and column names held here are the only identifiers the query
/// builders ever interpolate.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TableSchema {
    pub name: String,
    pub identity: String,
    pub columns: Vec<ColumnSchema>,
}

impl TableSchema {
    pub fn column(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn identity_column(&self) -> Result<&ColumnSchema> {
        self.column(&self.identity)
            .ok_or_else(|| EngineError::column_not_found(&self.name, &self.identity))
    }
}

pub async fn list_tables<C>(db: &C) -> Result<Vec<String>, DbErr>
where
    C: ConnectionTrait,
{
    let stmt = Statement::from_string(
        db.get_database_backend(),
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY rowid"
            .to_owned(),
    );
    let rows = db.query_all(stmt).await?;

    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let name: String = row.try_get("", "name")?;
        if name != MIGRATION_TABLE {
            out.push(name);
        }
    }
    Ok(out)
}

/// Maps operator input onto the catalog's spelling of a table name.
pub async fn resolve_table<C>(db: &C, table: &str) -> Result<String>
where
    C: ConnectionTrait,
{
    let tables = list_tables(db).await?;
    tables
        .iter()
        .find(|t| t.as_str() == table)
        .or_else(|| tables.iter().find(|t| t.eq_ignore_ascii_case(table)))
        .cloned()
        .ok_or_else(|| EngineError::table_not_found(table))
}

pub async fn load_table<C>(db: &C, table: &str) -> Result<TableSchema>
where
    C: ConnectionTrait,
{
    let name = resolve_table(db, table).await?;
    let stmt = Statement::from_sql_and_values(
        db.get_database_backend(),
        r#"SELECT name, type, "notnull", pk FROM pragma_table_info(?) ORDER BY cid"#,
        [name.clone().into()],
    );
    let rows = db.query_all(stmt).await?;

    let mut columns = Vec::with_capacity(rows.len());
    for row in rows {
        let column: String = row.try_get("", "name")?;
        let declared_type: String = row.try_get("", "type").unwrap_or_default();
        let not_null: i64 = row.try_get("", "notnull").unwrap_or(0);
        let pk: i64 = row.try_get("", "pk").unwrap_or(0);
        columns.push(ColumnSchema {
            name: column,
            kind: ColumnKind::from_declared(&declared_type),
            declared_type,
            not_null: not_null != 0,
            primary_key: pk != 0,
        });
    }

    let identity =
        resolve_identity(&name, &columns).ok_or_else(|| EngineError::table_not_found(&name))?;
    log::debug!(
        "loaded table {} ({} columns, identity {})",
        name,
        columns.len(),
        identity
    );

    Ok(TableSchema {
        name,
        identity,
        columns,
    })
}

pub async fn load_columns<C>(db: &C, table: &str) -> Result<Vec<String>>
where
    C: ConnectionTrait,
{
    Ok(load_table(db, table).await?.column_names())
}

/// Known tables use their declared key, otherwise a single catalog primary
/// key, otherwise the first column.
fn resolve_identity(table: &str, columns: &[ColumnSchema]) -> Option<String> {
    let known = TableKind::from_table_name(table)
        .map(|k| k.identity_column())
        .and_then(|key| columns.iter().find(|c| c.name.eq_ignore_ascii_case(key)));

    let declared = || {
        let mut pks = columns.iter().filter(|c| c.primary_key);
        match (pks.next(), pks.next()) {
            (Some(pk), None) => Some(pk),
            _ => None,
        }
    };

    known
        .or_else(declared)
        .or_else(|| columns.first())
        .map(|c| c.name.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::{exec, memory_db};
    use sea_orm::Database;

    #[tokio::test]
    async fn test_list_tables() {
        let db = memory_db().await;
        let tables = list_tables(&db).await.unwrap();
        assert_eq!(
            tables,
            vec![
                "customers",
                "accounts",
                "transactions",
                "branches",
                "loans",
                "support_tickets",
                "credit_cards"
            ]
        );
    }

    #[tokio::test]
    async fn test_list_tables_empty_store() {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        assert!(list_tables(&db).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_load_columns() {
        let db = memory_db().await;
        let columns = load_columns(&db, "accounts").await.unwrap();
        assert_eq!(
            columns,
            vec!["customer_id", "account_type", "account_balance", "last_updated"]
        );

        let schema = load_table(&db, "ACCOUNTS").await.unwrap();
        assert_eq!(schema.name, "accounts");
        assert_eq!(schema.identity, "customer_id");
        assert_eq!(
            schema.column("account_balance").map(|c| c.kind),
            Some(ColumnKind::Real)
        );
        assert_eq!(
            schema.column("last_updated").map(|c| c.kind),
            Some(ColumnKind::Temporal)
        );
    }

    #[tokio::test]
    async fn test_load_missing_table() {
        let db = memory_db().await;
        assert!(matches!(
            load_columns(&db, "audit_log").await,
            Err(EngineError::NotFound(_))
        ));
        assert!(matches!(
            load_table(&db, "accounts; DROP TABLE accounts").await,
            Err(EngineError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_identity_of_dynamic_table() {
        let db = memory_db().await;
        exec(&db, "CREATE TABLE notes (body TEXT, note_id INTEGER PRIMARY KEY)").await;
        exec(&db, "CREATE TABLE tags (label TEXT, weight REAL)").await;

        assert_eq!(load_table(&db, "notes").await.unwrap().identity, "note_id");
        assert_eq!(load_table(&db, "tags").await.unwrap().identity, "label");
    }
}
