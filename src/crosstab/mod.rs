//! Cross-tabulation of categorical fields.

mod build;
mod order;

pub use build::{build_contingency_table, build_contingency_table_with};
pub use order::TableOrder;
