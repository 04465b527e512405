use anyhow::{Context, Result};
use sqlx::mysql::MySqlRow;

use super::decode;
use super::manager::DatabaseManager;
use super::types::PlanRow;
use crate::services::sql::{single_statement, strip_explain_prefix};

impl DatabaseManager {
    /// Run `EXPLAIN` on `sql` and return the plan rows in server order.
    ///
    /// `sql` must be a single statement; it is sent as one prepared statement.
    pub async fn explain(&self, sql: &str) -> Result<Vec<PlanRow>> {
        let sql = single_statement(strip_explain_prefix(sql))?;
        let pool = self.pool().await?;
        let statement = format!("EXPLAIN {}", sql);

        let rows = sqlx::query(&statement)
            .fetch_all(&pool)
            .await
            .context("EXPLAIN failed")?;

        rows.iter().map(plan_row).collect()
    }
}

fn plan_row(row: &MySqlRow) -> Result<PlanRow> {
    Ok(PlanRow {
        id: decode::integer(row, "id")?,
        select_type: decode::text_or_empty(row, "select_type")?,
        table: decode::text_or_empty(row, "table")?,
        partitions: decode::text_or_empty(row, "partitions")?,
        access_type: decode::text_or_empty(row, "type")?,
        possible_keys: decode::text_or_empty(row, "possible_keys")?,
        key: decode::text_or_empty(row, "key")?,
        key_len: decode::text_or_empty(row, "key_len")?,
        ref_columns: decode::text_or_empty(row, "ref")?,
        rows: decode::integer(row, "rows")?.unwrap_or(0),
        filtered: decode::float(row, "filtered")?.unwrap_or(0.0),
        extra: decode::text_or_empty(row, "Extra")?,
    })
}
