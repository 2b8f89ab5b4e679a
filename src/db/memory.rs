use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{DatabaseError, models::Row};

/// Process-local store, selected with `memory://`. Contents are lost when
/// the process exits.
#[derive(Default)]
pub struct MemorySheetStore {
    tables: Mutex<HashMap<String, Vec<Row>>>,
}

impl MemorySheetStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl super::SheetStore for MemorySheetStore {
    async fn table_exists(&self, table: &str) -> Result<bool, DatabaseError> {
        Ok(self.tables.lock().contains_key(table))
    }

    async fn create_table(&self, table: &str) -> Result<(), DatabaseError> {
        self.tables.lock().entry(table.to_string()).or_default();
        Ok(())
    }

    async fn load_rows(&self, table: &str) -> Result<Vec<Row>, DatabaseError> {
        Ok(self.tables.lock().get(table).cloned().unwrap_or_default())
    }

    async fn append_row(&self, table: &str, row: &Row) -> Result<(), DatabaseError> {
        self.tables
            .lock()
            .entry(table.to_string())
            .or_default()
            .push(row.clone());
        Ok(())
    }

    async fn replace_rows(&self, table: &str, rows: &[Row]) -> Result<(), DatabaseError> {
        self.tables.lock().insert(table.to_string(), rows.to_vec());
        Ok(())
    }

    async fn clear_rows(&self, table: &str) -> Result<(), DatabaseError> {
        if let Some(rows) = self.tables.lock().get_mut(table) {
            rows.clear();
        }
        Ok(())
    }
}
