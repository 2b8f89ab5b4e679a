use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;

use crate::db::schema_sqlite::{sheet_rows, sheets};

use super::{DatabaseError, models::Row};

#[derive(Insertable)]
#[diesel(table_name = sheets)]
struct NewSheet<'a> {
    name: &'a str,
    created_at: String,
}

#[derive(Insertable)]
#[diesel(table_name = sheet_rows)]
struct NewSheetRow<'a> {
    sheet: &'a str,
    cells: String,
}

fn encode_row(row: &Row) -> Result<String, DatabaseError> {
    Ok(serde_json::to_string(row)?)
}

fn decode_row(cells: &str) -> Result<Row, DatabaseError> {
    Ok(serde_json::from_str(cells)?)
}

fn establish_connection(path: &str) -> Result<SqliteConnection, DatabaseError> {
    SqliteConnection::establish(path).map_err(|e| DatabaseError::Connection(e.to_string()))
}

fn ensure_sheet(conn: &mut SqliteConnection, sheet_name: &str) -> QueryResult<usize> {
    diesel::insert_or_ignore_into(sheets::table)
        .values(&NewSheet {
            name: sheet_name,
            created_at: Utc::now().to_rfc3339(),
        })
        .execute(conn)
}

pub struct SqliteSheetStore {
    db_path: Arc<String>,
}

impl SqliteSheetStore {
    pub fn new(db_path: Arc<String>) -> Self {
        Self { db_path }
    }
}

#[async_trait]
impl super::SheetStore for SqliteSheetStore {
    async fn table_exists(&self, table: &str) -> Result<bool, DatabaseError> {
        let table = table.to_string();
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = establish_connection(&db_path)?;
            let count: i64 = sheets::table
                .filter(sheets::name.eq(table))
                .count()
                .get_result(&mut conn)
                .map_err(|e| DatabaseError::Query(e.to_string()))?;
            Ok(count > 0)
        })
        .await
        .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
    }

    async fn create_table(&self, table: &str) -> Result<(), DatabaseError> {
        let table = table.to_string();
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = establish_connection(&db_path)?;
            ensure_sheet(&mut conn, &table)
                .map(|_| ())
                .map_err(|e| DatabaseError::Query(e.to_string()))
        })
        .await
        .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
    }

    async fn load_rows(&self, table: &str) -> Result<Vec<Row>, DatabaseError> {
        let table = table.to_string();
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = establish_connection(&db_path)?;
            let encoded = sheet_rows::table
                .filter(sheet_rows::sheet.eq(table))
                .order(sheet_rows::id.asc())
                .select(sheet_rows::cells)
                .load::<String>(&mut conn)
                .map_err(|e| DatabaseError::Query(e.to_string()))?;

            encoded.iter().map(|cells| decode_row(cells)).collect()
        })
        .await
        .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
    }

    async fn append_row(&self, table: &str, row: &Row) -> Result<(), DatabaseError> {
        let table = table.to_string();
        let cells = encode_row(row)?;
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = establish_connection(&db_path)?;
            conn.transaction::<_, diesel::result::Error, _>(|conn| {
                ensure_sheet(conn, &table)?;
                diesel::insert_into(sheet_rows::table)
                    .values(&NewSheetRow {
                        sheet: &table,
                        cells,
                    })
                    .execute(conn)?;
                Ok(())
            })
            .map_err(|e| DatabaseError::Query(e.to_string()))
        })
        .await
        .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
    }

    async fn replace_rows(&self, table: &str, rows: &[Row]) -> Result<(), DatabaseError> {
        let table = table.to_string();
        let encoded = rows.iter().map(encode_row).collect::<Result<Vec<_>, _>>()?;
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = establish_connection(&db_path)?;
            conn.transaction::<_, diesel::result::Error, _>(|conn| {
                ensure_sheet(conn, &table)?;
                diesel::delete(sheet_rows::table.filter(sheet_rows::sheet.eq(&table)))
                    .execute(conn)?;
                let new_rows: Vec<NewSheetRow<'_>> = encoded
                    .into_iter()
                    .map(|cells| NewSheetRow {
                        sheet: &table,
                        cells,
                    })
                    .collect();
                for new_row in &new_rows {
                    diesel::insert_into(sheet_rows::table)
                        .values(new_row)
                        .execute(conn)?;
                }
                Ok(())
            })
            .map_err(|e| DatabaseError::Query(e.to_string()))
        })
        .await
        .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
    }

    async fn clear_rows(&self, table: &str) -> Result<(), DatabaseError> {
        let table = table.to_string();
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = establish_connection(&db_path)?;
            diesel::delete(sheet_rows::table.filter(sheet_rows::sheet.eq(table)))
                .execute(&mut conn)
                .map(|_| ())
                .map_err(|e| DatabaseError::Query(e.to_string()))
        })
        .await
        .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
    }
}
