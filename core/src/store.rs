use sea_orm::sqlx::sqlite::SqliteJournalMode;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::path::Path;

use crate::db::balance::{self, BalanceAction, BalanceResult};
use crate::db::classify::{self, TableMetadata};
use crate::db::filter::{self, FilterPredicate, QuerySpec};
use crate::db::introspect::{self, TableSchema};
use crate::db::record::{self, NullableRecord, Record};
use crate::db::{import, ResultSet};
use crate::error::Result;
use crate::insight::{self, InsightResult};

/// Options for a database file. The path goes to the driver as is, never
/// through a URL, so `?`, `#` and `%` in it are plain characters.
pub fn file_options(path: &Path) -> ConnectOptions {
    let path = path.to_path_buf();
    // only selects the sqlite driver, the file is set below
    let mut opt = ConnectOptions::new("sqlite://banksight.db");
    opt.map_sqlx_sqlite_opts(move |o| {
        o.filename(&path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
    });
    opt
}

/// Owner of the shared connection.
///
/// Open it once at start-up, hand out references, and `close` it on the way
/// out. The underlying pool handle is `Send + Sync` and cheap to clone.
#[derive(Clone, Debug)]
pub struct Store {
    db: DatabaseConnection,
}

impl Store {
    pub async fn open(url: &str) -> Result<Self> {
        Self::connect(ConnectOptions::new(url)).await
    }

    pub async fn connect(opt: ConnectOptions) -> Result<Self> {
        let url = opt.get_url().to_owned();
        let db = Database::connect(opt).await?;
        log::info!("store opened: {}", url);
        Ok(Self { db })
    }

    /// `<path>` is created when missing and kept in WAL mode.
    pub async fn open_file(path: &Path) -> Result<Self> {
        let db = Database::connect(file_options(path)).await?;
        log::info!("store opened: {}", path.display());
        Ok(Self { db })
    }

    pub fn from_connection(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub async fn close(self) -> Result<()> {
        self.db.close().await?;
        log::info!("store closed");
        Ok(())
    }

    pub async fn list_tables(&self) -> Result<Vec<String>> {
        Ok(introspect::list_tables(&self.db).await?)
    }

    pub async fn load_columns(&self, table: &str) -> Result<Vec<String>> {
        introspect::load_columns(&self.db, table).await
    }

    pub async fn load_table(&self, table: &str) -> Result<TableSchema> {
        introspect::load_table(&self.db, table).await
    }

    pub async fn load_metadata(&self, table: &str) -> Result<TableMetadata> {
        classify::load_metadata(&self.db, table).await
    }

    pub async fn build_query(
        &self,
        table: &str,
        predicates: &[FilterPredicate],
    ) -> Result<QuerySpec> {
        filter::build(&self.db, table, predicates).await
    }

    pub async fn fetch(&self, query: &QuerySpec) -> Result<ResultSet> {
        query.fetch(&self.db).await
    }

    pub async fn fetch_record(
        &self,
        table: &str,
        identity: &str,
    ) -> Result<Option<NullableRecord>> {
        record::fetch_record(&self.db, table, identity).await
    }

    pub async fn add(&self, table: &str, fields: &Record) -> Result<()> {
        record::add(&self.db, table, fields).await
    }

    pub async fn update(&self, table: &str, identity: &str, fields: &Record) -> Result<()> {
        record::update(&self.db, table, identity, fields).await
    }

    pub async fn update_columns(
        &self,
        table: &str,
        identity: &str,
        fields: &Record,
    ) -> Result<()> {
        record::update_columns(&self.db, table, identity, fields).await
    }

    pub async fn delete(&self, table: &str, identity: &str, confirmed: bool) -> Result<()> {
        record::delete(&self.db, table, identity, confirmed).await
    }

    pub async fn apply_action(
        &self,
        account_id: &str,
        action: BalanceAction,
    ) -> Result<BalanceResult> {
        balance::apply_action(&self.db, account_id, action).await
    }

    pub async fn import_json(&self, table: &str, json: &serde_json::Value) -> Result<u64> {
        import::import_json(&self.db, table, json).await
    }

    pub async fn import_csv(&self, table: &str, data: &[u8]) -> Result<u64> {
        import::import_csv(&self.db, table, data).await
    }

    pub async fn run_insight(&self, id: u32) -> Result<InsightResult> {
        insight::run(&self.db, id).await
    }
}
