use crate::model::{account, branch, credit_card, customer, loan, support_ticket, transaction};
use sea_orm::{
    sea_query::TableCreateStatement, ConnectionTrait, DbBackend, DbErr, EntityTrait, Schema,
};

fn create_statement<E>(schema: &Schema, entity: E) -> TableCreateStatement
where
    E: EntityTrait,
{
    schema
        .create_table_from_entity(entity)
        .if_not_exists()
        .to_owned()
}

/// DDL for the schema-of-record tables, in creation order.
pub fn table_statements(backend: DbBackend) -> Vec<TableCreateStatement> {
    let schema = Schema::new(backend);
    vec![
        create_statement(&schema, customer::Entity),
        create_statement(&schema, account::Entity),
        create_statement(&schema, transaction::Entity),
        create_statement(&schema, branch::Entity),
        create_statement(&schema, loan::Entity),
        create_statement(&schema, support_ticket::Entity),
        create_statement(&schema, credit_card::Entity),
    ]
}

pub async fn create_tables<C>(db: &C) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    let backend = db.get_database_backend();
    for stmt in table_statements(backend) {
        db.execute(backend.build(&stmt)).await?;
    }
    Ok(())
}
