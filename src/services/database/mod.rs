mod decode;
mod explain;
mod manager;
mod schema;
mod types;

pub use manager::DatabaseManager;
pub use schema::quote_identifier;
pub use types::{ColumnDescriptor, IndexDescriptor, IndexGroup, PlanRow, TableDescriptor};
