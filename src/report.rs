//! Plain-text rendering of the collected metadata for the terminal.

use sqlformat::{FormatOptions, QueryParams};
use std::fmt::Write;

use crate::pipeline::AnalysisRequest;
use crate::services::database::{PlanRow, TableDescriptor};

pub fn render_query(sql: &str) -> String {
    let formatted = sqlformat::format(sql, &QueryParams::None, &FormatOptions::default());
    format!("Query:\n{}\n", formatted)
}

pub fn render_table(table: &TableDescriptor) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\nTable: {}", table.table_name);

    let _ = writeln!(out, "Columns:");
    for col in &table.columns {
        let _ = writeln!(
            out,
            "  - {:<20} {:<24} null: {:<4} key: {:<4} default: {:<12} extra: {}",
            col.field,
            col.column_type,
            if col.nullable { "YES" } else { "NO" },
            col.key,
            col.default.as_deref().unwrap_or("NULL"),
            col.extra
        );
    }

    let _ = writeln!(out, "\nIndexes:");
    let groups = table.grouped_indexes();
    if groups.is_empty() {
        let _ = writeln!(out, "  (none)");
    }
    for index in groups {
        let _ = writeln!(
            out,
            "  - {:<24} ({}){}",
            index.name,
            index.columns.join(", "),
            if index.unique { " UNIQUE" } else { "" }
        );
    }

    let _ = writeln!(out, "\nDDL:\n{}", table.create_statement);
    out
}

pub fn render_plan(rows: &[PlanRow]) -> String {
    let mut out = String::from("\nEXPLAIN:\n");
    for row in rows {
        let id = row.id.map(|id| id.to_string()).unwrap_or_else(|| "NULL".to_string());
        let _ = writeln!(
            out,
            "id: {}, select_type: {}, table: {}, type: {}, possible_keys: {}, key: {}, key_len: {}, ref: {}, rows: {}, filtered: {:.2}, extra: {}",
            id,
            row.select_type,
            row.table,
            row.access_type,
            row.possible_keys,
            row.key,
            row.key_len,
            row.ref_columns,
            row.rows,
            row.filtered,
            row.extra
        );
    }
    out
}

/// Everything printed before the model's answer.
pub fn render_request(request: &AnalysisRequest) -> String {
    let mut out = render_query(&request.sql_query);
    if let Some(version) = &request.server_version {
        let _ = writeln!(out, "Server version: {}", version);
    }
    for table in &request.table_infos {
        out.push_str(&render_table(table));
    }
    out.push_str(&render_plan(&request.explain_plan));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::tests::{full_scan_row, orders_table};

    #[test]
    fn test_render_table_lists_columns_indexes_and_ddl() {
        let text = render_table(&orders_table());

        assert!(text.contains("Table: orders"));
        assert!(text.contains("auto_increment"));
        assert!(text.contains("PRIMARY"));
        assert!(text.contains("(id) UNIQUE"));
        assert!(text.contains("CREATE TABLE `orders`"));
    }

    #[test]
    fn test_render_plan_rows() {
        let mut union_result = full_scan_row("<union1,2>");
        union_result.id = None;
        let text = render_plan(&[full_scan_row("orders"), union_result]);

        assert!(text.contains("id: 1, select_type: SIMPLE, table: orders, type: ALL"));
        assert!(text.contains("filtered: 100.00"));
        assert!(text.contains("id: NULL"));
    }

    #[test]
    fn test_render_request_order() {
        let request = AnalysisRequest::new(
            "select * from orders",
            vec![orders_table()],
            vec![full_scan_row("orders")],
            Some("8.0.36".to_string()),
        );
        let text = render_request(&request);

        let query = text.find("Query:").unwrap();
        let table = text.find("Table: orders").unwrap();
        let plan = text.find("EXPLAIN:").unwrap();
        assert!(query < table && table < plan);
        assert!(text.contains("Server version: 8.0.36"));
    }
}
