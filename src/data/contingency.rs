//! Row-normalised contingency tables.

use crate::error::{Result, SurveyError};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

/// Cross-tabulation of two categorical fields.
///
/// Rows are levels of the grouping field, columns are levels of the category
/// field. The table keeps the raw counts and the row-normalised proportions;
/// every row of `proportions` sums to 1.0 and no cell is negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContingencyTable {
    /// Grouping field (row index).
    pub row_field: String,
    /// Category field (columns).
    pub column_field: String,
    row_labels: Vec<String>,
    column_labels: Vec<String>,
    counts: DMatrix<f64>,
    proportions: DMatrix<f64>,
}

impl ContingencyTable {
    /// Create a table from raw counts, normalising each row.
    ///
    /// Fails if the labels do not match the matrix shape, if any count is
    /// negative or not finite, or if a row has no observations.
    pub fn from_counts(
        row_field: &str,
        column_field: &str,
        row_labels: Vec<String>,
        column_labels: Vec<String>,
        counts: DMatrix<f64>,
    ) -> Result<Self> {
        if counts.nrows() != row_labels.len() || counts.ncols() != column_labels.len() {
            return Err(SurveyError::InvalidParameter(format!(
                "Counts are {}x{} but {} row and {} column labels were given",
                counts.nrows(),
                counts.ncols(),
                row_labels.len(),
                column_labels.len()
            )));
        }
        if counts.iter().any(|&c| !c.is_finite() || c < 0.0) {
            return Err(SurveyError::InvalidParameter(
                "Counts must be finite and non-negative".to_string(),
            ));
        }

        let mut proportions = DMatrix::zeros(counts.nrows(), counts.ncols());
        for (i, label) in row_labels.iter().enumerate() {
            let total: f64 = counts.row(i).sum();
            if total <= 0.0 {
                return Err(SurveyError::NumericDomain(format!(
                    "Row '{}' has no observations to normalise",
                    label
                )));
            }
            for j in 0..counts.ncols() {
                proportions[(i, j)] = counts[(i, j)] / total;
            }
        }

        Ok(Self {
            row_field: row_field.to_string(),
            column_field: column_field.to_string(),
            row_labels,
            column_labels,
            counts,
            proportions,
        })
    }

    /// Number of rows (grouping levels).
    pub fn n_rows(&self) -> usize {
        self.row_labels.len()
    }

    /// Number of columns (category levels).
    pub fn n_cols(&self) -> usize {
        self.column_labels.len()
    }

    pub fn row_labels(&self) -> &[String] {
        &self.row_labels
    }

    pub fn column_labels(&self) -> &[String] {
        &self.column_labels
    }

    /// Raw counts.
    pub fn counts(&self) -> &DMatrix<f64> {
        &self.counts
    }

    /// Row-normalised proportions.
    pub fn proportions(&self) -> &DMatrix<f64> {
        &self.proportions
    }

    pub fn row_index(&self, label: &str) -> Option<usize> {
        self.row_labels.iter().position(|l| l == label)
    }

    pub fn column_index(&self, label: &str) -> Option<usize> {
        self.column_labels.iter().position(|l| l == label)
    }

    /// Proportion for a row/column label pair.
    pub fn get(&self, row: &str, column: &str) -> Option<f64> {
        Some(self.proportions[(self.row_index(row)?, self.column_index(column)?)])
    }

    /// Raw count for a row/column label pair.
    pub fn count(&self, row: &str, column: &str) -> Option<f64> {
        Some(self.counts[(self.row_index(row)?, self.column_index(column)?)])
    }

    /// Number of records counted in each row.
    pub fn row_totals(&self) -> Vec<f64> {
        (0..self.n_rows()).map(|i| self.counts.row(i).sum()).collect()
    }

    /// Same table with rows and columns rearranged.
    ///
    /// `row_order[k]` is the current index of the row placed at position `k`.
    pub(crate) fn permuted(&self, row_order: &[usize], column_order: &[usize]) -> Self {
        let pick = |m: &DMatrix<f64>| {
            DMatrix::from_fn(row_order.len(), column_order.len(), |i, j| {
                m[(row_order[i], column_order[j])]
            })
        };
        Self {
            row_field: self.row_field.clone(),
            column_field: self.column_field.clone(),
            row_labels: row_order.iter().map(|&i| self.row_labels[i].clone()).collect(),
            column_labels: column_order
                .iter()
                .map(|&j| self.column_labels[j].clone())
                .collect(),
            counts: pick(&self.counts),
            proportions: pick(&self.proportions),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_from_counts_normalises_rows() {
        let counts = DMatrix::from_row_slice(2, 3, &[1.0, 1.0, 2.0, 0.0, 3.0, 0.0]);
        let table = ContingencyTable::from_counts(
            "ris",
            "Category",
            labels(&["EPrints", "Pure"]),
            labels(&["a", "b", "c"]),
            counts,
        )
        .unwrap();

        assert_relative_eq!(table.get("EPrints", "c").unwrap(), 0.5);
        assert_relative_eq!(table.get("Pure", "b").unwrap(), 1.0);
        assert_eq!(table.count("EPrints", "a"), Some(1.0));
        assert_eq!(table.row_totals(), vec![4.0, 3.0]);
        assert_eq!(table.get("Pure", "missing"), None);
    }

    #[test]
    fn test_from_counts_rejects_bad_input() {
        let shape = ContingencyTable::from_counts(
            "g",
            "c",
            labels(&["A"]),
            labels(&["x", "y"]),
            DMatrix::from_row_slice(2, 2, &[1.0, 1.0, 1.0, 1.0]),
        );
        assert!(matches!(shape, Err(SurveyError::InvalidParameter(_))));

        let negative = ContingencyTable::from_counts(
            "g",
            "c",
            labels(&["A"]),
            labels(&["x", "y"]),
            DMatrix::from_row_slice(1, 2, &[-1.0, 2.0]),
        );
        assert!(matches!(negative, Err(SurveyError::InvalidParameter(_))));

        let empty_row = ContingencyTable::from_counts(
            "g",
            "c",
            labels(&["A", "B"]),
            labels(&["x", "y"]),
            DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 0.0, 0.0]),
        );
        assert!(matches!(empty_row, Err(SurveyError::NumericDomain(_))));
    }

    #[test]
    fn test_permuted() {
        let table = ContingencyTable::from_counts(
            "g",
            "c",
            labels(&["A", "B"]),
            labels(&["x", "y"]),
            DMatrix::from_row_slice(2, 2, &[1.0, 3.0, 2.0, 2.0]),
        )
        .unwrap();
        let swapped = table.permuted(&[1, 0], &[1, 0]);

        assert_eq!(swapped.row_labels(), &["B", "A"]);
        assert_eq!(swapped.column_labels(), &["y", "x"]);
        assert_relative_eq!(swapped.get("A", "y").unwrap(), 0.75);
        assert_eq!(swapped.count("B", "x"), Some(2.0));
    }
}
