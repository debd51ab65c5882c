//! Display ordering for contingency tables.

use crate::data::ContingencyTable;
use log::warn;
use serde::{Deserialize, Serialize};

/// Row and column ordering applied after a table is built.
///
/// Without a `sort_by` label rows stay in natural level order. With one,
/// rows are sorted by their proportion in that category column and ties keep
/// natural level order. Columns listed in `column_order` come first, in the
/// given order, followed by the remaining columns in natural level order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableOrder {
    /// Category label whose proportion orders the rows.
    pub sort_by: Option<String>,
    /// Sort rows largest proportion first.
    pub descending: bool,
    /// Fixed legend order for category columns.
    pub column_order: Vec<String>,
}

impl TableOrder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sort rows by the proportion in the given category column.
    pub fn sort_by(mut self, label: &str) -> Self {
        self.sort_by = Some(label.to_string());
        self
    }

    pub fn descending(mut self, descending: bool) -> Self {
        self.descending = descending;
        self
    }

    /// Pin the legend order of category columns.
    pub fn column_order(mut self, labels: &[&str]) -> Self {
        self.column_order = labels.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Rearrange a table built in natural level order.
    ///
    /// A `sort_by` label that is not a column of the table counts as a 0.0
    /// proportion for every row, which leaves rows in natural level order.
    pub fn apply(&self, table: ContingencyTable) -> ContingencyTable {
        // A label listed twice keeps its first position.
        let mut column_order: Vec<usize> = Vec::with_capacity(table.n_cols());
        let pinned = self
            .column_order
            .iter()
            .filter_map(|label| table.column_index(label));
        for j in pinned.chain(0..table.n_cols()) {
            if !column_order.contains(&j) {
                column_order.push(j);
            }
        }

        let mut row_order: Vec<usize> = (0..table.n_rows()).collect();
        if let Some(label) = &self.sort_by {
            match table.column_index(label) {
                Some(col) => {
                    let props = table.proportions();
                    // Stable sort keeps natural order among equal proportions.
                    row_order.sort_by(|&a, &b| {
                        let ord = props[(a, col)].total_cmp(&props[(b, col)]);
                        if self.descending {
                            ord.reverse()
                        } else {
                            ord
                        }
                    });
                }
                None => warn!(
                    "Sort category '{}' not present in {} x {} table; keeping natural row order",
                    label, table.row_field, table.column_field
                ),
            }
        }

        let identity = row_order.iter().enumerate().all(|(k, &i)| k == i)
            && column_order.iter().enumerate().all(|(k, &j)| k == j);
        if identity {
            table
        } else {
            table.permuted(&row_order, &column_order)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::DMatrix;

    fn sample_table() -> ContingencyTable {
        // Contains software proportions: A 0.25, B 0.75, C 0.25
        ContingencyTable::from_counts(
            "ris",
            "Category",
            vec!["A".to_string(), "B".to_string(), "C".to_string()],
            vec!["Contains software".to_string(), "No".to_string()],
            DMatrix::from_row_slice(3, 2, &[1.0, 3.0, 3.0, 1.0, 2.0, 6.0]),
        )
        .unwrap()
    }

    #[test]
    fn test_default_order_is_identity() {
        let table = sample_table();
        assert_eq!(TableOrder::new().apply(table.clone()), table);
    }

    #[test]
    fn test_sort_by_category_ascending() {
        let ordered = TableOrder::new()
            .sort_by("Contains software")
            .apply(sample_table());
        // Ties (A, C) keep natural order.
        assert_eq!(ordered.row_labels(), &["A", "C", "B"]);
    }

    #[test]
    fn test_sort_by_category_descending() {
        let ordered = TableOrder::new()
            .sort_by("Contains software")
            .descending(true)
            .apply(sample_table());
        assert_eq!(ordered.row_labels(), &["B", "A", "C"]);
    }

    #[test]
    fn test_absent_sort_category_falls_back() {
        let ordered = TableOrder::new().sort_by("Unknown").apply(sample_table());
        assert_eq!(ordered.row_labels(), &["A", "B", "C"]);
    }

    #[test]
    fn test_column_order() {
        let ordered = TableOrder::new()
            .column_order(&["No", "Missing label"])
            .apply(sample_table());
        assert_eq!(ordered.column_labels(), &["No", "Contains software"]);
        assert_eq!(ordered.get("A", "No"), Some(0.75));
    }

    #[test]
    fn test_repeated_column_order_labels() {
        let ordered = TableOrder::new()
            .column_order(&["No", "No", "Contains software", "No"])
            .apply(sample_table());
        assert_eq!(ordered.column_labels(), &["No", "Contains software"]);
        for i in 0..ordered.n_rows() {
            let sum: f64 = ordered.proportions().row(i).sum();
            assert!((sum - 1.0).abs() < 1e-12);
        }
    }
}
