use crate::config::{DatabaseConfig as ConfigDatabaseConfig, DbType as ConfigDbType};
use crate::db::memory::MemorySheetStore;
use crate::db::{DatabaseError, SheetStore};
use std::sync::Arc;

#[cfg(feature = "sqlite")]
use crate::db::sqlite::SqliteSheetStore;
#[cfg(feature = "sqlite")]
use diesel::sqlite::SqliteConnection;
#[cfg(feature = "sqlite")]
use diesel::{Connection, RunQueryDsl};

#[derive(Clone)]
pub struct DatabaseManager {
    #[cfg(feature = "sqlite")]
    sqlite_path: Option<String>,
    sheet_store: Arc<dyn SheetStore>,
    db_type: DbType,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DbType {
    Sqlite,
    Memory,
}

impl From<ConfigDbType> for DbType {
    fn from(value: ConfigDbType) -> Self {
        match value {
            ConfigDbType::Sqlite => DbType::Sqlite,
            ConfigDbType::Memory => DbType::Memory,
        }
    }
}

impl DatabaseManager {
    pub async fn new(config: &ConfigDatabaseConfig) -> Result<Self, DatabaseError> {
        let db_type = DbType::from(config.db_type());

        match db_type {
            #[cfg(feature = "sqlite")]
            DbType::Sqlite => {
                let path = config.sqlite_path().ok_or_else(|| {
                    DatabaseError::Connection("sqlite path is not configured".to_string())
                })?;
                let sheet_store = Arc::new(SqliteSheetStore::new(Arc::new(path.clone())));

                Ok(Self {
                    sqlite_path: Some(path),
                    sheet_store,
                    db_type,
                })
            }
            #[cfg(not(feature = "sqlite"))]
            DbType::Sqlite => Err(DatabaseError::Connection(
                "SQLite feature not enabled".to_string(),
            )),
            DbType::Memory => Ok(Self {
                #[cfg(feature = "sqlite")]
                sqlite_path: None,
                sheet_store: Arc::new(MemorySheetStore::new()),
                db_type,
            }),
        }
    }

    pub async fn migrate(&self) -> Result<(), DatabaseError> {
        match self.db_type {
            #[cfg(feature = "sqlite")]
            DbType::Sqlite => {
                let path = self.sqlite_path.as_ref().ok_or_else(|| {
                    DatabaseError::Migration("sqlite path is not configured".to_string())
                })?;
                Self::migrate_sqlite(path).await
            }
            #[cfg(not(feature = "sqlite"))]
            DbType::Sqlite => Err(DatabaseError::Migration(
                "SQLite feature not enabled".to_string(),
            )),
            DbType::Memory => Ok(()),
        }
    }

    #[cfg(feature = "sqlite")]
    async fn migrate_sqlite(path: &str) -> Result<(), DatabaseError> {
        let path = path.to_string();
        tokio::task::spawn_blocking(move || {
            let mut conn = SqliteConnection::establish(&path)
                .map_err(|e| DatabaseError::Connection(e.to_string()))?;

            let statements = [
                r#"
                CREATE TABLE IF NOT EXISTS sheets (
                    name TEXT PRIMARY KEY NOT NULL,
                    created_at TEXT NOT NULL DEFAULT (datetime('now'))
                )
                "#,
                r#"
                CREATE TABLE IF NOT EXISTS sheet_rows (
                    id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
                    sheet TEXT NOT NULL REFERENCES sheets(name) ON DELETE CASCADE,
                    cells TEXT NOT NULL
                )
                "#,
                "CREATE INDEX IF NOT EXISTS idx_sheet_rows_sheet ON sheet_rows(sheet, id)",
            ];

            for statement in statements {
                diesel::sql_query(statement)
                    .execute(&mut conn)
                    .map_err(|e| DatabaseError::Migration(e.to_string()))?;
            }

            Ok(())
        })
        .await
        .map_err(|e| DatabaseError::Migration(format!("migration task failed: {e}")))?
    }

    pub fn sheet_store(&self) -> Arc<dyn SheetStore> {
        self.sheet_store.clone()
    }

    pub fn db_type(&self) -> DbType {
        self.db_type
    }
}
