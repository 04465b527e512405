//! Collects everything the language model needs about one query.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::services::database::{DatabaseManager, PlanRow, TableDescriptor};

/// The complete payload handed to the prompt builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub sql_query: String,
    pub table_infos: Vec<TableDescriptor>,
    pub explain_plan: Vec<PlanRow>,
    pub server_version: Option<String>,
}

impl AnalysisRequest {
    pub fn new(
        sql_query: impl Into<String>,
        table_infos: Vec<TableDescriptor>,
        explain_plan: Vec<PlanRow>,
        server_version: Option<String>,
    ) -> Self {
        Self {
            sql_query: sql_query.into(),
            table_infos,
            explain_plan,
            server_version,
        }
    }
}

/// Source of schema and plan metadata.
#[allow(async_fn_in_trait)]
pub trait Inspector {
    async fn describe_table(&self, table_name: &str) -> Result<TableDescriptor>;
    async fn explain(&self, sql: &str) -> Result<Vec<PlanRow>>;
    async fn server_version(&self) -> Result<String>;
}

impl Inspector for DatabaseManager {
    async fn describe_table(&self, table_name: &str) -> Result<TableDescriptor> {
        DatabaseManager::describe_table(self, table_name).await
    }

    async fn explain(&self, sql: &str) -> Result<Vec<PlanRow>> {
        DatabaseManager::explain(self, sql).await
    }

    async fn server_version(&self) -> Result<String> {
        DatabaseManager::server_version(self).await
    }
}

/// Inspect `tables` one at a time, run the plan, and assemble the request.
///
/// A table that cannot be inspected is logged and left out. A failed
/// `EXPLAIN` fails the whole call.
pub async fn gather<I: Inspector>(
    inspector: &I,
    sql: &str,
    tables: &[String],
) -> Result<AnalysisRequest> {
    let mut table_infos = Vec::with_capacity(tables.len());
    for table in tables {
        match inspector.describe_table(table).await {
            Ok(info) => table_infos.push(info),
            Err(e) => tracing::warn!("Skipping table {}: {:#}", table, e),
        }
    }

    let explain_plan = inspector
        .explain(sql)
        .await
        .context("Failed to run EXPLAIN")?;

    let server_version = match inspector.server_version().await {
        Ok(version) => Some(version),
        Err(e) => {
            tracing::warn!("Could not determine server version: {:#}", e);
            None
        }
    };

    Ok(AnalysisRequest::new(
        sql,
        table_infos,
        explain_plan,
        server_version,
    ))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::services::agent::build_prompt;
    use crate::services::database::{ColumnDescriptor, IndexDescriptor};
    use crate::services::sql::extract_table_names;
    use anyhow::anyhow;
    use std::cell::RefCell;
    use std::collections::HashMap;

    pub(crate) fn orders_table() -> TableDescriptor {
        TableDescriptor {
            table_name: "orders".to_string(),
            columns: vec![
                ColumnDescriptor {
                    field: "id".to_string(),
                    column_type: "bigint".to_string(),
                    nullable: false,
                    key: "PRI".to_string(),
                    default: None,
                    extra: "auto_increment".to_string(),
                },
                ColumnDescriptor {
                    field: "cid".to_string(),
                    column_type: "bigint".to_string(),
                    nullable: true,
                    key: "MUL".to_string(),
                    default: Some("0".to_string()),
                    extra: String::new(),
                },
            ],
            indexes: vec![IndexDescriptor {
                index_name: "PRIMARY".to_string(),
                column_name: Some("id".to_string()),
                unique: true,
                seq_in_index: 1,
            }],
            create_statement: "CREATE TABLE `orders` (\n  `id` bigint NOT NULL AUTO_INCREMENT,\n  `cid` bigint DEFAULT '0',\n  PRIMARY KEY (`id`)\n)".to_string(),
        }
    }

    pub(crate) fn full_scan_row(table: &str) -> PlanRow {
        PlanRow {
            id: Some(1),
            select_type: "SIMPLE".to_string(),
            table: table.to_string(),
            partitions: String::new(),
            access_type: "ALL".to_string(),
            possible_keys: String::new(),
            key: String::new(),
            key_len: String::new(),
            ref_columns: String::new(),
            rows: 1000,
            filtered: 100.0,
            extra: String::new(),
        }
    }

    /// In-memory inspector over a fixed set of tables.
    struct FakeInspector {
        tables: HashMap<String, TableDescriptor>,
        plan: Option<Vec<PlanRow>>,
        version: Option<String>,
        described: RefCell<Vec<String>>,
    }

    impl FakeInspector {
        fn with_orders() -> Self {
            Self {
                tables: HashMap::from([("orders".to_string(), orders_table())]),
                plan: Some(vec![full_scan_row("o"), full_scan_row("c")]),
                version: Some("8.0.36".to_string()),
                described: RefCell::new(Vec::new()),
            }
        }
    }

    impl Inspector for FakeInspector {
        async fn describe_table(&self, table_name: &str) -> Result<TableDescriptor> {
            self.described.borrow_mut().push(table_name.to_string());
            self.tables
                .get(table_name)
                .cloned()
                .ok_or_else(|| anyhow!("Table '{}' doesn't exist", table_name))
        }

        async fn explain(&self, _sql: &str) -> Result<Vec<PlanRow>> {
            self.plan
                .clone()
                .ok_or_else(|| anyhow!("You have an error in your SQL syntax"))
        }

        async fn server_version(&self) -> Result<String> {
            self.version
                .clone()
                .ok_or_else(|| anyhow!("version unavailable"))
        }
    }

    const ORDERS_QUERY: &str = "SELECT * FROM orders o JOIN customers c ON o.cid=c.id";

    #[async_std::test]
    async fn test_missing_table_is_skipped() {
        let inspector = FakeInspector::with_orders();
        let tables = extract_table_names(ORDERS_QUERY);
        assert_eq!(tables, vec!["orders", "customers"]);

        let request = gather(&inspector, ORDERS_QUERY, &tables).await.unwrap();

        assert_eq!(*inspector.described.borrow(), vec!["orders", "customers"]);
        assert_eq!(request.table_infos.len(), 1);
        assert_eq!(request.table_infos[0].table_name, "orders");
        assert_eq!(request.explain_plan.len(), 2);
        assert_eq!(request.server_version.as_deref(), Some("8.0.36"));

        let prompt = build_prompt(&request).unwrap();
        assert!(prompt.contains("\"table_name\": \"orders\""));
        assert!(!prompt.contains("\"table_name\": \"customers\""));
    }

    #[async_std::test]
    async fn test_plan_failure_is_fatal() {
        let mut inspector = FakeInspector::with_orders();
        inspector.plan = None;

        let tables = vec!["orders".to_string()];
        let err = gather(&inspector, "SELEC * FROM orders", &tables)
            .await
            .unwrap_err();
        assert!(format!("{:#}", err).contains("SQL syntax"));
    }

    #[async_std::test]
    async fn test_missing_version_is_tolerated() {
        let mut inspector = FakeInspector::with_orders();
        inspector.version = None;

        let tables = vec!["orders".to_string()];
        let request = gather(&inspector, "SELECT * FROM orders", &tables)
            .await
            .unwrap();
        assert!(request.server_version.is_none());
    }

    #[async_std::test]
    async fn test_repeated_inspection_is_stable() {
        let inspector = FakeInspector::with_orders();
        let tables = vec!["orders".to_string()];

        let first = gather(&inspector, "SELECT * FROM orders", &tables)
            .await
            .unwrap();
        let second = gather(&inspector, "SELECT * FROM orders", &tables)
            .await
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(first.table_infos[0].columns.len(), 2);
        assert_eq!(first.table_infos[0].indexes.len(), 1);
    }
}
