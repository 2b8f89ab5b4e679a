use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::db::{DatabaseError, Row, SheetStore};

/// Read/write access to named tables with a per-table snapshot cache.
///
/// Every write updates the cached snapshot of the table it touches, so a
/// read without `force_reload` after a write sees that write.
pub struct SheetAdapter {
    store: Arc<dyn SheetStore>,
    cache: Mutex<HashMap<String, Vec<Row>>>,
}

impl SheetAdapter {
    pub fn new(store: Arc<dyn SheetStore>) -> Self {
        Self {
            store,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub async fn table_exists(&self, table: &str) -> Result<bool, DatabaseError> {
        self.store.table_exists(table).await
    }

    /// Creates the table if missing. Returns true when it was created.
    pub async fn ensure_table(&self, table: &str) -> Result<bool, DatabaseError> {
        if self.table_exists(table).await? {
            return Ok(false);
        }
        self.store.create_table(table).await?;
        self.cache.lock().insert(table.to_string(), Vec::new());
        debug!("created table {}", table);
        Ok(true)
    }

    pub async fn load_table(
        &self,
        table: &str,
        force_reload: bool,
    ) -> Result<Vec<Row>, DatabaseError> {
        if !force_reload {
            if let Some(rows) = self.cache.lock().get(table) {
                return Ok(rows.clone());
            }
        }

        let rows = self.store.load_rows(table).await?;
        debug!("loaded {} rows from table {}", rows.len(), table);
        self.cache.lock().insert(table.to_string(), rows.clone());
        Ok(rows)
    }

    pub async fn append_row(&self, table: &str, row: Row) -> Result<(), DatabaseError> {
        self.store.append_row(table, &row).await?;
        if let Some(rows) = self.cache.lock().get_mut(table) {
            rows.push(row);
        }
        Ok(())
    }

    /// Overwrites the whole table.
    pub async fn write_range(&self, table: &str, rows: Vec<Row>) -> Result<(), DatabaseError> {
        self.store.replace_rows(table, &rows).await?;
        self.cache.lock().insert(table.to_string(), rows);
        Ok(())
    }

    /// Empties the table but keeps it.
    #[allow(dead_code)]
    pub async fn clear_table(&self, table: &str) -> Result<(), DatabaseError> {
        self.store.clear_rows(table).await?;
        self.cache.lock().insert(table.to_string(), Vec::new());
        Ok(())
    }
}
