mod tables;

pub use tables::{extract_table_names, single_statement, strip_explain_prefix};
