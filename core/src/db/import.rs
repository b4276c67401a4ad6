use sea_orm::sea_query::{Alias, Query, Value};
use sea_orm::{ConnectionTrait, DatabaseConnection, TransactionTrait};
use serde_json::{Map, Value as JsonValue};

use super::introspect::{load_table, TableSchema};
use super::record::{bind_fields, insert, unknown_column, NullableRecord, Record};
use crate::error::{EngineError, Result};

/// Flattened JSON record; `None` marks an explicit null.
pub type FlatRecord = NullableRecord;

fn flatten_into(prefix: Option<&str>, object: &Map<String, JsonValue>, out: &mut FlatRecord) {
    for (key, value) in object {
        let key = match prefix {
            Some(p) => format!("{}.{}", p, key),
            None => key.clone(),
        };
        match value {
            JsonValue::Object(inner) => flatten_into(Some(&key), inner, out),
            JsonValue::Null => {
                out.insert(key, None);
            }
            JsonValue::String(s) => {
                out.insert(key, Some(s.clone()));
            }
            other => {
                out.insert(key, Some(other.to_string()));
            }
        }
    }
}

/// Nested objects become `parent.child` keys.
pub fn flatten(object: &Map<String, JsonValue>) -> FlatRecord {
    let mut out = FlatRecord::new();
    flatten_into(None, object, &mut out);
    out
}

fn bind_flat(schema: &TableSchema, flat: &FlatRecord) -> Result<Vec<(String, Value)>> {
    if let Some(unknown) = flat.keys().find(|k| schema.column(k).is_none()) {
        return Err(unknown_column(schema, unknown));
    }
    let mut record = Record::new();
    let mut nulls = Vec::new();
    for column in &schema.columns {
        match flat.get(&column.name) {
            Some(Some(v)) => {
                record.insert(column.name.clone(), v.clone());
            }
            _ => {
                record.insert(column.name.clone(), String::new());
                nulls.push(column.name.as_str());
            }
        }
    }

    let mut values = bind_fields(schema, &record)?;
    for (column, value) in values.iter_mut() {
        if nulls.contains(&column.as_str()) {
            *value = Value::String(None);
        }
    }
    Ok(values)
}

fn in_record(idx: usize, e: EngineError) -> EngineError {
    match e {
        EngineError::Validation(msg) => EngineError::Validation(format!("record {}: {}", idx, msg)),
        e => e,
    }
}

async fn replace_rows(
    db: &DatabaseConnection,
    schema: &TableSchema,
    rows: Vec<Vec<(String, Value)>>,
) -> Result<u64> {
    let txn = db.begin().await?;
    let clear = Query::delete()
        .from_table(Alias::new(schema.name.as_str()))
        .to_owned();
    txn.execute(txn.get_database_backend().build(&clear)).await?;
    let count = rows.len() as u64;
    for values in rows {
        insert(&txn, schema, values).await?;
    }
    txn.commit().await?;

    log::info!("{} loaded with {} rows", schema.name, count);
    Ok(count)
}

/// Replaces every row of `table` with the records of a JSON array.
///
/// Keys must name declared columns; absent keys and nulls import as NULL.
/// Either all records land or the table is left as it was.
pub async fn import_json(db: &DatabaseConnection, table: &str, json: &JsonValue) -> Result<u64> {
    let items = json.as_array().ok_or_else(|| {
        EngineError::Validation("import data must be a JSON array of records".to_owned())
    })?;
    let schema = load_table(db, table).await?;

    let mut rows = Vec::with_capacity(items.len());
    for (idx, item) in items.iter().enumerate() {
        let object = item.as_object().ok_or_else(|| {
            EngineError::Validation(format!("record {} is not a JSON object", idx))
        })?;
        rows.push(bind_flat(&schema, &flatten(object)).map_err(|e| in_record(idx, e))?);
    }
    replace_rows(db, &schema, rows).await
}

fn csv_error(e: csv::Error) -> EngineError {
    EngineError::Validation(format!("malformed csv: {}", e))
}

/// Parses CSV text whose first row names the columns. Header names match
/// declared columns case-insensitively; empty fields are NULL.
fn parse_csv(schema: &TableSchema, data: &[u8]) -> Result<Vec<FlatRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(data);
    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_error)?
        .iter()
        .map(|h| {
            schema
                .columns
                .iter()
                .find(|c| c.name.eq_ignore_ascii_case(h))
                .map_or_else(|| h.to_owned(), |c| c.name.clone())
        })
        .collect();

    let mut out = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_error)?;
        out.push(
            headers
                .iter()
                .cloned()
                .zip(record.iter().map(|v| (!v.is_empty()).then(|| v.to_owned())))
                .collect(),
        );
    }
    Ok(out)
}

/// Replaces every row of `table` with the rows of a CSV document, with the
/// same all-or-nothing guarantee as [`import_json`].
pub async fn import_csv(db: &DatabaseConnection, table: &str, data: &[u8]) -> Result<u64> {
    let schema = load_table(db, table).await?;
    let rows = parse_csv(&schema, data)?
        .iter()
        .enumerate()
        .map(|(idx, flat)| bind_flat(&schema, flat).map_err(|e| in_record(idx, e)))
        .collect::<Result<Vec<_>>>()?;
    replace_rows(db, &schema, rows).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::filter;
    use crate::db::testing::{exec, memory_db};
    use crate::db::Cell;
    use serde_json::json;

    #[test]
    fn test_flatten() {
        let value = json!({"card_id": "K1", "limits": {"credit": 5000, "cash": null}, "active": true});
        let record = flatten(value.as_object().unwrap());
        assert_eq!(record["card_id"].as_deref(), Some("K1"));
        assert_eq!(record["limits.credit"].as_deref(), Some("5000"));
        assert_eq!(record["limits.cash"], None);
        assert_eq!(record["active"].as_deref(), Some("true"));
    }

    #[tokio::test]
    async fn test_import_replaces_contents() {
        let db = memory_db().await;
        exec(
            &db,
            "INSERT INTO credit_cards (card_id, customer_id, card_type, credit_limit, current_balance, status) \
             VALUES ('OLD', 'C1', 'Gold', 1000, 0, 'Blocked')",
        )
        .await;

        let data = json!([
            {"card_id": "K1", "customer_id": "C100", "card_type": "Platinum", "card_network": "Visa",
             "credit_limit": 250000, "current_balance": 1200.75, "issued_date": "2022-03-01",
             "expiry_date": "2027-03-01", "status": "Active"},
            {"card_id": "K2", "customer_id": "C200", "card_type": "Classic",
             "credit_limit": 50000, "current_balance": 0, "status": "Active"}
        ]);
        assert_eq!(import_json(&db, "credit_cards", &data).await.unwrap(), 2);

        let rows = filter::build(&db, "credit_cards", &[])
            .await
            .unwrap()
            .fetch(&db)
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        let ids: Vec<_> = rows.column("card_id").cloned().collect();
        assert_eq!(ids, vec![Cell::Text("K1".into()), Cell::Text("K2".into())]);
        assert!(rows.column("card_network").any(Cell::is_null));
    }

    #[tokio::test]
    async fn test_import_is_all_or_nothing() {
        let db = memory_db().await;
        exec(
            &db,
            "INSERT INTO credit_cards (card_id, customer_id, card_type, credit_limit, current_balance, status) \
             VALUES ('OLD', 'C1', 'Gold', 1000, 0, 'Blocked')",
        )
        .await;

        let bad_column = json!([{"card_id": "K1", "pin": "1234"}]);
        assert!(matches!(
            import_json(&db, "credit_cards", &bad_column).await,
            Err(EngineError::Validation(_))
        ));

        // second record violates NOT NULL on card_type
        let bad_row = json!([
            {"card_id": "K1", "customer_id": "C100", "card_type": "Platinum",
             "credit_limit": 1, "current_balance": 0, "status": "Active"},
            {"card_id": "K2", "customer_id": "C200", "card_type": null,
             "credit_limit": 1, "current_balance": 0, "status": "Active"}
        ]);
        assert!(import_json(&db, "credit_cards", &bad_row).await.is_err());

        let rows = filter::build(&db, "credit_cards", &[])
            .await
            .unwrap()
            .fetch(&db)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows.rows[0][0], Cell::Text("OLD".into()));

        assert!(import_json(&db, "credit_cards", &json!({"card_id": "K1"})).await.is_err());
    }

    #[tokio::test]
    async fn test_import_csv() {
        let db = memory_db().await;
        exec(
            &db,
            "INSERT INTO customers (customer_id, name) VALUES ('C0', 'Old Entry')",
        )
        .await;

        let data = "Customer_ID,name,gender,age,city,account_type,join_date\n\
                    C100,\"Mehta, Riya\",F,34,Pune,Savings,2021-06-15\n\
                    C200,Arjun Rao,,41,,Current,\n";
        assert_eq!(
            import_csv(&db, "customers", data.as_bytes()).await.unwrap(),
            2
        );

        let rows = filter::build(&db, "customers", &[])
            .await
            .unwrap()
            .fetch(&db)
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        let names: Vec<_> = rows.column("name").cloned().collect();
        assert_eq!(
            names,
            vec![Cell::Text("Mehta, Riya".into()), Cell::Text("Arjun Rao".into())]
        );
        let ages: Vec<_> = rows.column("age").cloned().collect();
        assert_eq!(ages, vec![Cell::Integer(34), Cell::Integer(41)]);
        assert_eq!(rows.rows[1][2], Cell::Null);
        assert_eq!(rows.rows[1][4], Cell::Null);
    }

    #[tokio::test]
    async fn test_import_csv_rejects_bad_rows() {
        let db = memory_db().await;
        exec(
            &db,
            "INSERT INTO customers (customer_id, name) VALUES ('C0', 'Old Entry')",
        )
        .await;

        for data in [
            "customer_id,name,nickname\nC1,Asha,Ash\n",
            "customer_id,name,age\nC1,Asha,thirty\n",
            "customer_id,name\nC1,Asha,extra\n",
            "customer_id,name\nC1,\n",
        ] {
            assert!(
                import_csv(&db, "customers", data.as_bytes()).await.is_err(),
                "accepted {:?}",
                data
            );
        }

        let rows = filter::build(&db, "customers", &[])
            .await
            .unwrap()
            .fetch(&db)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows.rows[0][0], Cell::Text("C0".into()));
    }
}
