use serde::{Deserialize, Serialize};

/// One row of `DESCRIBE <table>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub field: String,
    pub column_type: String,
    pub nullable: bool,
    /// `PRI`, `UNI`, `MUL` or empty
    pub key: String,
    pub default: Option<String>,
    /// e.g. `auto_increment`
    pub extra: String,
}

/// One (index, column) pair from `SHOW INDEX`.
///
/// A composite index produces one descriptor per participating column; use
/// [`TableDescriptor::grouped_indexes`] for a per-index view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDescriptor {
    pub index_name: String,
    /// `None` for functional index parts
    pub column_name: Option<String>,
    pub unique: bool,
    pub seq_in_index: u32,
}

/// An index with its columns collected in `Seq_in_index` order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexGroup {
    pub name: String,
    pub columns: Vec<String>,
    pub unique: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDescriptor {
    pub table_name: String,
    pub columns: Vec<ColumnDescriptor>,
    pub indexes: Vec<IndexDescriptor>,
    pub create_statement: String,
}

impl TableDescriptor {
    /// Groups the flattened index rows by index name, keeping the order in
    /// which each index first appears.
    pub fn grouped_indexes(&self) -> Vec<IndexGroup> {
        let mut groups: Vec<(IndexGroup, Vec<(u32, String)>)> = Vec::new();

        for index in &self.indexes {
            let column = index
                .column_name
                .clone()
                .unwrap_or_else(|| "(expression)".to_string());

            match groups.iter_mut().find(|(g, _)| g.name == index.index_name) {
                Some((_, parts)) => parts.push((index.seq_in_index, column)),
                None => groups.push((
                    IndexGroup {
                        name: index.index_name.clone(),
                        columns: Vec::new(),
                        unique: index.unique,
                    },
                    vec![(index.seq_in_index, column)],
                )),
            }
        }

        groups
            .into_iter()
            .map(|(mut group, mut parts)| {
                parts.sort_by_key(|(seq, _)| *seq);
                group.columns = parts.into_iter().map(|(_, column)| column).collect();
                group
            })
            .collect()
    }
}

/// One row of `EXPLAIN` output. Missing or NULL text columns are empty,
/// missing numeric columns are zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanRow {
    /// `None` for `UNION RESULT` rows
    pub id: Option<i64>,
    pub select_type: String,
    pub table: String,
    pub partitions: String,
    pub access_type: String,
    pub possible_keys: String,
    pub key: String,
    pub key_len: String,
    pub ref_columns: String,
    pub rows: i64,
    pub filtered: f64,
    pub extra: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(name: &str, column: Option<&str>, unique: bool, seq: u32) -> IndexDescriptor {
        IndexDescriptor {
            index_name: name.to_string(),
            column_name: column.map(str::to_string),
            unique,
            seq_in_index: seq,
        }
    }

    fn table_with(indexes: Vec<IndexDescriptor>) -> TableDescriptor {
        TableDescriptor {
            table_name: "orders".to_string(),
            columns: vec![],
            indexes,
            create_statement: String::new(),
        }
    }

    #[test]
    fn test_grouped_indexes_collects_composite_columns() {
        let table = table_with(vec![
            index("PRIMARY", Some("id"), true, 1),
            index("idx_customer_date", Some("created_at"), false, 2),
            index("idx_customer_date", Some("customer_id"), false, 1),
        ]);

        let groups = table.grouped_indexes();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].name, "PRIMARY");
        assert_eq!(groups[0].columns, vec!["id"]);
        assert!(groups[0].unique);
        assert_eq!(groups[1].name, "idx_customer_date");
        assert_eq!(groups[1].columns, vec!["customer_id", "created_at"]);
        assert!(!groups[1].unique);
    }

    #[test]
    fn test_grouped_indexes_functional_part() {
        let table = table_with(vec![index("idx_lower_email", None, false, 1)]);
        assert_eq!(table.grouped_indexes()[0].columns, vec!["(expression)"]);
    }

    #[test]
    fn test_grouped_indexes_empty() {
        assert!(table_with(vec![]).grouped_indexes().is_empty());
    }
}
