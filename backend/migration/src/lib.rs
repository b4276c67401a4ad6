pub use sea_orm_migration::{prelude::*, Migration, MigrationStatus};

mod m20250101_000001_create_bank_tables;
mod m20250101_000002_create_lookup_index;

pub struct Migrator;

#[macro_export]
macro_rules! index_name {
    ($entity:path, $($column:path),+) => {
        concat!(
            "idx_",
            stringify!($entity), "_",
            $(stringify!($column), "_"),+
        ).trim_end_matches('_')
    };
}

#[macro_export]
macro_rules! lookup_index {
    ($entity:path, $($column:path),+) => {
        Index::create()
            .name(index_name!($entity, $($column),+))
            .table($entity)
            $(.col($column))+
            .if_not_exists()
            .to_owned()
    };
}

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_bank_tables::Migration),
            Box::new(m20250101_000002_create_lookup_index::Migration),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use banksight_core::db::introspect::list_tables;
    use sea_orm_migration::sea_orm::Database;

    #[async_std::test]
    async fn test_up_and_down() {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        Migrator::up(&db, None).await.unwrap();

        let tables = list_tables(&db).await.unwrap();
        assert_eq!(tables.len(), 7);
        assert!(tables.iter().any(|t| t == "accounts"));
        assert!(!tables.iter().any(|t| t == "seaql_migrations"));

        // idempotent on an already migrated store
        Migrator::up(&db, None).await.unwrap();

        Migrator::down(&db, None).await.unwrap();
        assert!(list_tables(&db).await.unwrap().is_empty());
    }
}
