use sea_orm::sea_query::{Alias, Expr, Query, SimpleExpr, Value};
use sea_orm::{ConnectionTrait, DatabaseConnection, TransactionTrait};
use std::collections::BTreeMap;

use super::introspect::{load_table, TableSchema};
use crate::error::{EngineError, Result};

/// Field values keyed by column name, as typed by the operator.
pub type Record = BTreeMap<String, String>;

/// Stored values keyed by column name; `None` is NULL.
pub type NullableRecord = BTreeMap<String, Option<String>>;

/// Validates that `fields` covers exactly the declared columns and converts
/// each value according to its column's declared type.
pub(crate) fn bind_fields(
    schema: &TableSchema,
    fields: &Record,
) -> Result<Vec<(String, Value)>> {
    if let Some(unknown) = fields.keys().find(|k| schema.column(k).is_none()) {
        return Err(unknown_column(schema, unknown));
    }
    let missing: Vec<&str> = schema
        .columns
        .iter()
        .filter(|c| !fields.contains_key(&c.name))
        .map(|c| c.name.as_str())
        .collect();
    if !missing.is_empty() {
        return Err(EngineError::Validation(format!(
            "missing value for {} in table '{}'",
            missing.join(", "),
            schema.name
        )));
    }

    schema
        .columns
        .iter()
        .map(|c| Ok((c.name.clone(), c.kind.bind(&c.name, &fields[&c.name])?)))
        .collect()
}

fn identity_key(schema: &TableSchema, identity: &str) -> Result<SimpleExpr> {
    let column = schema.identity_column()?;
    let key = column.kind.bind(&column.name, identity)?;
    Ok(Expr::col(Alias::new(column.name.as_str())).eq(key))
}

pub(crate) async fn insert<C>(
    db: &C,
    schema: &TableSchema,
    values: Vec<(String, Value)>,
) -> Result<()>
where
    C: ConnectionTrait,
{
    let (columns, values): (Vec<_>, Vec<_>) = values.into_iter().unzip();
    let mut insert = Query::insert();
    insert
        .into_table(Alias::new(schema.name.as_str()))
        .columns(columns.into_iter().map(Alias::new))
        .values(values.into_iter().map(SimpleExpr::Value))
        .map_err(|e| EngineError::Validation(e.to_string()))?;

    db.execute(db.get_database_backend().build(&insert)).await?;
    Ok(())
}

pub async fn add(db: &DatabaseConnection, table: &str, fields: &Record) -> Result<()> {
    let schema = load_table(db, table).await?;
    let values = bind_fields(&schema, fields)?;

    let txn = db.begin().await?;
    insert(&txn, &schema, values).await?;
    txn.commit().await?;

    log::info!(
        "added row {} to {}",
        fields.get(&schema.identity).map(String::as_str).unwrap_or_default(),
        schema.name
    );
    Ok(())
}

/// Rewrites every column of the row keyed by `identity`.
pub async fn update(
    db: &DatabaseConnection,
    table: &str,
    identity: &str,
    fields: &Record,
) -> Result<()> {
    let schema = load_table(db, table).await?;
    let values = bind_fields(&schema, fields)?;
    update_row(db, &schema, identity, values).await
}

/// Rewrites only the columns named in `fields`; the rest of the row, NULLs
/// and blobs included, stays as stored.
pub async fn update_columns(
    db: &DatabaseConnection,
    table: &str,
    identity: &str,
    fields: &Record,
) -> Result<()> {
    let schema = load_table(db, table).await?;
    if fields.is_empty() {
        return Err(EngineError::Validation(format!(
            "no columns given to update in '{}'",
            schema.name
        )));
    }
    let values = fields
        .iter()
        .map(|(name, raw)| {
            let column = schema
                .column(name)
                .ok_or_else(|| unknown_column(&schema, name))?;
            Ok((column.name.clone(), column.kind.bind(&column.name, raw)?))
        })
        .collect::<Result<Vec<_>>>()?;
    update_row(db, &schema, identity, values).await
}

async fn update_row(
    db: &DatabaseConnection,
    schema: &TableSchema,
    identity: &str,
    values: Vec<(String, Value)>,
) -> Result<()> {
    let stmt = Query::update()
        .table(Alias::new(schema.name.as_str()))
        .values(
            values
                .into_iter()
                .map(|(c, v)| (Alias::new(c), SimpleExpr::Value(v))),
        )
        .and_where(identity_key(schema, identity)?)
        .to_owned();

    let txn = db.begin().await?;
    let res = txn.execute(txn.get_database_backend().build(&stmt)).await?;
    match res.rows_affected() {
        0 => Err(row_not_found(schema, identity)),
        1 => {
            txn.commit().await?;
            log::info!("updated row {} in {}", identity, schema.name);
            Ok(())
        }
        n => {
            txn.rollback().await?;
            Err(EngineError::Validation(format!(
                "{} = '{}' matches {} rows in '{}', nothing updated",
                schema.identity, identity, n, schema.name
            )))
        }
    }
}

/// Removes one row. Nothing is touched unless `confirmed` is set.
pub async fn delete(
    db: &DatabaseConnection,
    table: &str,
    identity: &str,
    confirmed: bool,
) -> Result<()> {
    if !confirmed {
        return Err(EngineError::Validation(format!(
            "delete of '{}' from '{}' was not confirmed",
            identity, table
        )));
    }
    let schema = load_table(db, table).await?;
    let stmt = Query::delete()
        .from_table(Alias::new(schema.name.as_str()))
        .and_where(identity_key(&schema, identity)?)
        .to_owned();

    let txn = db.begin().await?;
    let res = txn.execute(txn.get_database_backend().build(&stmt)).await?;
    match res.rows_affected() {
        0 => Err(row_not_found(&schema, identity)),
        1 => {
            txn.commit().await?;
            log::info!("deleted row {} from {}", identity, schema.name);
            Ok(())
        }
        n => {
            txn.rollback().await?;
            Err(EngineError::Validation(format!(
                "{} = '{}' matches {} rows in '{}', nothing deleted",
                schema.identity, identity, n, schema.name
            )))
        }
    }
}

/// Current contents of one row as text, e.g. to prefill an edit. NULL stays
/// `None`.
pub async fn fetch_record<C>(
    db: &C,
    table: &str,
    identity: &str,
) -> Result<Option<NullableRecord>>
where
    C: ConnectionTrait,
{
    let schema = load_table(db, table).await?;
    let columns = schema.column_names();
    let select = Query::select()
        .columns(columns.iter().map(|c| Alias::new(c.as_str())))
        .from(Alias::new(schema.name.as_str()))
        .and_where(identity_key(&schema, identity)?)
        .limit(1)
        .to_owned();
    let rows = super::fetch(db, &select, columns).await?;

    Ok(rows.rows.first().map(|row| {
        rows.columns
            .iter()
            .cloned()
            .zip(row.iter().map(|c| (!c.is_null()).then(|| c.to_string())))
            .collect()
    }))
}

pub(crate) fn unknown_column(schema: &TableSchema, column: &str) -> EngineError {
    EngineError::Validation(format!(
        "table '{}' has no column '{}'",
        schema.name, column
    ))
}

fn row_not_found(schema: &TableSchema, identity: &str) -> EngineError {
    EngineError::NotFound(format!(
        "row with {} = '{}' in '{}'",
        schema.identity, identity, schema.name
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::filter;
    use crate::db::testing::{exec, memory_db};

    fn record(pairs: &[(&str, &str)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn branch(id: &str, city: &str) -> Record {
        record(&[
            ("branch_id", id),
            ("branch_name", "Central"),
            ("city", city),
            ("manager_name", "R. Mehta"),
            ("total_employees", "12"),
            ("branch_revenue", "1500000.5"),
            ("opening_date", "2019-04-01"),
            ("performance_rating", ""),
        ])
    }

    async fn count(db: &DatabaseConnection, table: &str) -> usize {
        filter::build(db, table, &[])
            .await
            .unwrap()
            .fetch(db)
            .await
            .unwrap()
            .len()
    }

    #[tokio::test]
    async fn test_add_update_delete_round_trip() {
        let db = memory_db().await;
        add(&db, "branches", &branch("B1", "Pune")).await.unwrap();
        let before = count(&db, "branches").await;

        add(&db, "branches", &branch("B2", "Delhi")).await.unwrap();
        assert_eq!(count(&db, "branches").await, before + 1);

        update(&db, "branches", "B2", &branch("B2", "Mumbai"))
            .await
            .unwrap();
        let row = fetch_record(&db, "branches", "B2").await.unwrap().unwrap();
        assert_eq!(row["city"].as_deref(), Some("Mumbai"));
        assert_eq!(row["total_employees"].as_deref(), Some("12"));
        assert_eq!(row["performance_rating"], None);

        delete(&db, "branches", "B2", true).await.unwrap();
        assert_eq!(count(&db, "branches").await, before);
        assert!(fetch_record(&db, "branches", "B2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_add_requires_exact_columns() {
        let db = memory_db().await;
        let mut fields = branch("B1", "Pune");
        fields.remove("city");
        assert!(matches!(
            add(&db, "branches", &fields).await,
            Err(EngineError::Validation(_))
        ));

        let mut fields = branch("B1", "Pune");
        fields.insert("region".to_owned(), "West".to_owned());
        assert!(matches!(
            add(&db, "branches", &fields).await,
            Err(EngineError::Validation(_))
        ));
        assert_eq!(count(&db, "branches").await, 0);
    }

    #[tokio::test]
    async fn test_add_rejects_malformed_numbers() {
        let db = memory_db().await;
        let mut fields = branch("B1", "Pune");
        fields.insert("total_employees".to_owned(), "a dozen".to_owned());
        assert!(matches!(
            add(&db, "branches", &fields).await,
            Err(EngineError::Validation(_))
        ));
        assert_eq!(count(&db, "branches").await, 0);
    }

    #[tokio::test]
    async fn test_missing_rows() {
        let db = memory_db().await;
        assert!(matches!(
            update(&db, "branches", "B9", &branch("B9", "Goa")).await,
            Err(EngineError::NotFound(_))
        ));
        assert!(matches!(
            delete(&db, "branches", "B9", true).await,
            Err(EngineError::NotFound(_))
        ));
        assert!(matches!(
            add(&db, "vaults", &branch("B9", "Goa")).await,
            Err(EngineError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_needs_confirmation() {
        let db = memory_db().await;
        add(&db, "branches", &branch("B1", "Pune")).await.unwrap();
        assert!(matches!(
            delete(&db, "branches", "B1", false).await,
            Err(EngineError::Validation(_))
        ));
        assert_eq!(count(&db, "branches").await, 1);
    }

    #[tokio::test]
    async fn test_duplicate_identity_is_not_updated() {
        let db = memory_db().await;
        exec(&db, "CREATE TABLE notes (author TEXT, body TEXT)").await;
        exec(
            &db,
            "INSERT INTO notes VALUES ('ana', 'first'), ('ana', 'second'), ('raj', 'third')",
        )
        .await;

        let fields = record(&[("author", "ana"), ("body", "edited")]);
        assert!(matches!(
            update(&db, "notes", "ana", &fields).await,
            Err(EngineError::Validation(_))
        ));
        let rows = filter::build(&db, "notes", &[filter::FilterPredicate::new("body", "edited")])
            .await
            .unwrap()
            .fetch(&db)
            .await
            .unwrap();
        assert!(rows.is_empty());

        let fields = record(&[("author", "raj"), ("body", "edited")]);
        update(&db, "notes", "raj", &fields).await.unwrap();
    }

    #[tokio::test]
    async fn test_update_columns_keeps_other_values() {
        let db = memory_db().await;
        exec(
            &db,
            "INSERT INTO credit_cards (card_id, customer_id, card_type, card_network, credit_limit, current_balance, status) \
             VALUES ('K1', 'C100', 'Gold', NULL, 50000, 0, 'Active')",
        )
        .await;

        let row = fetch_record(&db, "credit_cards", "K1").await.unwrap().unwrap();
        assert_eq!(row["card_network"], None);
        assert_eq!(row["status"].as_deref(), Some("Active"));

        update_columns(&db, "credit_cards", "K1", &record(&[("status", "Blocked")]))
            .await
            .unwrap();

        let blank = filter::build(
            &db,
            "credit_cards",
            &[filter::FilterPredicate::new("card_network", "")],
        )
        .await
        .unwrap()
        .fetch(&db)
        .await
        .unwrap();
        assert!(blank.is_empty());

        let row = fetch_record(&db, "credit_cards", "K1").await.unwrap().unwrap();
        assert_eq!(row["card_network"], None);
        assert_eq!(row["status"].as_deref(), Some("Blocked"));
        assert_eq!(row["card_type"].as_deref(), Some("Gold"));
    }

    #[tokio::test]
    async fn test_update_columns_keeps_blobs() {
        let db = memory_db().await;
        exec(&db, "CREATE TABLE scans (scan_id TEXT PRIMARY KEY, label TEXT, image BLOB)").await;
        exec(&db, "INSERT INTO scans VALUES ('S1', 'front', x'00ff10')").await;

        update_columns(&db, "scans", "S1", &record(&[("label", "back")]))
            .await
            .unwrap();

        let rows = filter::build(&db, "scans", &[])
            .await
            .unwrap()
            .fetch(&db)
            .await
            .unwrap();
        assert_eq!(rows.rows[0][1], crate::db::Cell::Text("back".into()));
        assert_eq!(rows.rows[0][2], crate::db::Cell::Blob(vec![0x00, 0xff, 0x10]));
    }

    #[tokio::test]
    async fn test_update_columns_errors() {
        let db = memory_db().await;
        add(&db, "branches", &branch("B1", "Pune")).await.unwrap();
        assert!(matches!(
            update_columns(&db, "branches", "B1", &Record::new()).await,
            Err(EngineError::Validation(_))
        ));
        assert!(matches!(
            update_columns(&db, "branches", "B1", &record(&[("region", "West")])).await,
            Err(EngineError::Validation(_))
        ));
        assert!(matches!(
            update_columns(&db, "branches", "B1", &record(&[("total_employees", "many")])).await,
            Err(EngineError::Validation(_))
        ));
        assert!(matches!(
            update_columns(&db, "branches", "B9", &record(&[("city", "Goa")])).await,
            Err(EngineError::NotFound(_))
        ));
        let row = fetch_record(&db, "branches", "B1").await.unwrap().unwrap();
        assert_eq!(row["city"].as_deref(), Some("Pune"));
    }
}
