use async_trait::async_trait;

use super::DatabaseError;
use super::models::Row;

/// Named tables of ordered rows. The first row of a table is its header by
/// convention; the store itself does not interpret it.
#[async_trait]
pub trait SheetStore: Send + Sync {
    async fn table_exists(&self, name: &str) -> Result<bool, DatabaseError>;
    async fn create_table(&self, name: &str) -> Result<(), DatabaseError>;
    async fn load_rows(&self, name: &str) -> Result<Vec<Row>, DatabaseError>;
    async fn append_row(&self, name: &str, row: &Row) -> Result<(), DatabaseError>;
    async fn replace_rows(&self, name: &str, rows: &[Row]) -> Result<(), DatabaseError>;
    async fn clear_rows(&self, name: &str) -> Result<(), DatabaseError>;
}
