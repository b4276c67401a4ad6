use banksight_core::db::schema::table_statements;
use banksight_core::model::TableKind;
use sea_orm_migration::prelude::*;
use strum::IntoEnumIterator;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let stmts = table_statements(manager.get_database_backend());
        let count = stmts.len();
        for stmt in stmts {
            manager.create_table(stmt).await?;
        }
        log::info!("created {} bank tables", count);
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for kind in TableKind::iter() {
            manager
                .drop_table(
                    Table::drop()
                        .table(Alias::new(kind.as_ref()))
                        .if_exists()
                        .to_owned(),
                )
                .await?;
        }
        Ok(())
    }
}
