use anyhow::{Context, Result, anyhow};
use sqlx::MySqlPool;

use super::decode;
use super::manager::DatabaseManager;
use super::types::{ColumnDescriptor, IndexDescriptor, TableDescriptor};

/// Backtick-quote a possibly schema-qualified identifier, part by part.
///
/// `shop.orders` becomes `` `shop`.`orders` ``; embedded backticks are doubled.
pub fn quote_identifier(name: &str) -> String {
    name.split('.')
        .map(|part| format!("`{}`", part.replace('`', "``")))
        .collect::<Vec<_>>()
        .join(".")
}

impl DatabaseManager {
    /// Columns, indexes and DDL of `table_name`, fetched in that order.
    ///
    /// Identifiers cannot be bound as parameters, so the name is quoted and
    /// interpolated.
    pub async fn describe_table(&self, table_name: &str) -> Result<TableDescriptor> {
        let pool = self.pool().await?;
        let quoted = quote_identifier(table_name);

        let columns = fetch_columns(&quoted, &pool)
            .await
            .with_context(|| format!("Failed to describe columns of {}", table_name))?;

        let indexes = fetch_indexes(&quoted, &pool)
            .await
            .with_context(|| format!("Failed to list indexes of {}", table_name))?;

        let create_statement = fetch_create_statement(&quoted, &pool)
            .await
            .with_context(|| format!("Failed to read DDL of {}", table_name))?;

        tracing::debug!(
            "Inspected {}: {} columns, {} index rows",
            table_name,
            columns.len(),
            indexes.len()
        );

        Ok(TableDescriptor {
            table_name: table_name.to_string(),
            columns,
            indexes,
            create_statement,
        })
    }
}

async fn fetch_columns(quoted: &str, pool: &MySqlPool) -> Result<Vec<ColumnDescriptor>> {
    let sql = format!("DESCRIBE {}", quoted);
    let rows = sqlx::raw_sql(&sql).fetch_all(pool).await?;

    rows.iter()
        .map(|row| {
            let nullable = decode::text_or_empty(row, "Null")?;
            Ok(ColumnDescriptor {
                field: decode::text_or_empty(row, "Field")?,
                column_type: decode::text_or_empty(row, "Type")?,
                nullable: decode::yes_no(&nullable),
                key: decode::text_or_empty(row, "Key")?,
                default: decode::text(row, "Default")?,
                extra: decode::text_or_empty(row, "Extra")?,
            })
        })
        .collect()
}

async fn fetch_indexes(quoted: &str, pool: &MySqlPool) -> Result<Vec<IndexDescriptor>> {
    let sql = format!("SHOW INDEX FROM {}", quoted);
    let rows = sqlx::raw_sql(&sql).fetch_all(pool).await?;

    rows.iter()
        .map(|row| {
            Ok(IndexDescriptor {
                index_name: decode::text_or_empty(row, "Key_name")?,
                column_name: decode::text(row, "Column_name")?,
                unique: decode::unique_flag(decode::integer(row, "Non_unique")?),
                seq_in_index: decode::sequence_number(decode::integer(row, "Seq_in_index")?),
            })
        })
        .collect()
}

async fn fetch_create_statement(quoted: &str, pool: &MySqlPool) -> Result<String> {
    let sql = format!("SHOW CREATE TABLE {}", quoted);
    let rows = sqlx::raw_sql(&sql).fetch_all(pool).await?;

    let row = rows
        .first()
        .ok_or_else(|| anyhow!("SHOW CREATE TABLE returned no rows"))?;

    // Second column is `Create Table` for tables and `Create View` for views
    decode::text(row, 1usize)?.ok_or_else(|| anyhow!("SHOW CREATE TABLE returned NULL"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_plain_identifier() {
        assert_eq!(quote_identifier("orders"), "`orders`");
    }

    #[test]
    fn test_quote_schema_qualified_identifier() {
        assert_eq!(quote_identifier("shop.orders"), "`shop`.`orders`");
    }

    #[test]
    fn test_quote_escapes_backticks() {
        assert_eq!(quote_identifier("we`ird"), "`we``ird`");
    }
}
