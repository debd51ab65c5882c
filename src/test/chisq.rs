//! Pearson chi-square test of independence for contingency tables.
//!
//! For each cell the expected frequency under independence is
//! `row_total * column_total / grand_total`. The statistic sums
//! `(observed - expected)^2 / expected` over all cells and is compared to a
//! chi-squared distribution with `(rows - 1) * (columns - 1)` degrees of
//! freedom.

use crate::data::ContingencyTable;
use crate::error::{Result, SurveyError};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ChiSquared, ContinuousCDF};

/// Which cells of the table are treated as observed frequencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Observed {
    /// Row-normalised proportions.
    #[default]
    Proportions,
    /// Raw record counts.
    Counts,
}

/// Options for the independence test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChiSquareConfig {
    /// Cells used as observed frequencies.
    pub observed: Observed,
    /// Apply Yates' continuity correction when there is one degree of freedom.
    pub yates_correction: bool,
}

/// Result of a chi-square test of independence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChiSquareResult {
    /// Grouping field of the tested table.
    pub row_field: String,
    /// Category field of the tested table.
    pub column_field: String,
    /// Pearson chi-square statistic (non-negative).
    pub statistic: f64,
    /// Upper-tail probability of the statistic.
    pub p_value: f64,
    /// Degrees of freedom: (rows - 1) * (columns - 1).
    pub dof: usize,
    /// Expected frequencies under independence, same shape as the table.
    pub expected: DMatrix<f64>,
    /// Cells the test was computed on.
    pub observed: Observed,
    /// Whether the continuity correction was applied.
    pub yates_corrected: bool,
}

impl ChiSquareResult {
    /// Check if independence is rejected at `alpha`.
    pub fn is_significant_at(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }
}

/// Test a contingency table for independence of its rows and columns,
/// using the table's proportions as observed frequencies.
///
/// # Errors
/// `DegenerateTable` if the table has fewer than two rows or columns,
/// `NumericDomain` if any expected frequency is zero.
pub fn compute_independence_test(table: &ContingencyTable) -> Result<ChiSquareResult> {
    compute_independence_test_with_config(table, &ChiSquareConfig::default())
}

/// Test a contingency table for independence with explicit options.
pub fn compute_independence_test_with_config(
    table: &ContingencyTable,
    config: &ChiSquareConfig,
) -> Result<ChiSquareResult> {
    let (n_rows, n_cols) = (table.n_rows(), table.n_cols());
    if n_rows < 2 || n_cols < 2 {
        return Err(SurveyError::DegenerateTable {
            rows: n_rows,
            cols: n_cols,
        });
    }

    let observed = match config.observed {
        Observed::Proportions => table.proportions(),
        Observed::Counts => table.counts(),
    };

    let row_totals: Vec<f64> = (0..n_rows).map(|i| observed.row(i).sum()).collect();
    let col_totals: Vec<f64> = (0..n_cols).map(|j| observed.column(j).sum()).collect();
    let grand_total: f64 = row_totals.iter().sum();
    if grand_total <= 0.0 {
        return Err(SurveyError::NumericDomain(
            "Table has no observations".to_string(),
        ));
    }

    let expected =
        DMatrix::from_fn(n_rows, n_cols, |i, j| row_totals[i] * col_totals[j] / grand_total);
    if let Some((i, j)) = (0..n_rows)
        .flat_map(|i| (0..n_cols).map(move |j| (i, j)))
        .find(|&(i, j)| expected[(i, j)] <= 0.0)
    {
        return Err(SurveyError::NumericDomain(format!(
            "Expected frequency is zero for cell ({}, {})",
            table.row_labels()[i],
            table.column_labels()[j]
        )));
    }

    let dof = (n_rows - 1) * (n_cols - 1);
    let yates_corrected = config.yates_correction && dof == 1;
    let correction = if yates_corrected { 0.5 } else { 0.0 };

    let statistic: f64 = observed
        .iter()
        .zip(expected.iter())
        .map(|(&o, &e)| {
            let diff = ((o - e).abs() - correction).max(0.0);
            diff * diff / e
        })
        .sum();
    let statistic = statistic.max(0.0);
    if !statistic.is_finite() {
        return Err(SurveyError::NumericDomain(format!(
            "Chi-square statistic is not finite ({})",
            statistic
        )));
    }

    let chi_sq = ChiSquared::new(dof as f64)
        .map_err(|e| SurveyError::NumericDomain(format!("Chi-squared distribution: {}", e)))?;
    let p_value = chi_sq.sf(statistic).clamp(0.0, 1.0);

    Ok(ChiSquareResult {
        row_field: table.row_field.clone(),
        column_field: table.column_field.clone(),
        statistic,
        p_value,
        dof,
        expected,
        observed: config.observed,
        yates_corrected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn table(rows: usize, cols: usize, counts: &[f64]) -> ContingencyTable {
        ContingencyTable::from_counts(
            "g",
            "c",
            (0..rows).map(|i| format!("r{}", i)).collect(),
            (0..cols).map(|j| format!("c{}", j)).collect(),
            DMatrix::from_row_slice(rows, cols, counts),
        )
        .unwrap()
    }

    #[test]
    fn test_identical_rows_are_independent() {
        let t = table(3, 2, &[2.0, 2.0, 5.0, 5.0, 1.0, 1.0]);
        let result = compute_independence_test(&t).unwrap();

        assert_abs_diff_eq!(result.statistic, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(result.p_value, 1.0, epsilon = 1e-12);
        assert_eq!(result.dof, 2);
    }

    #[test]
    fn test_degenerate_tables() {
        let one_row = table(1, 3, &[1.0, 2.0, 3.0]);
        assert!(matches!(
            compute_independence_test(&one_row),
            Err(SurveyError::DegenerateTable { rows: 1, cols: 3 })
        ));

        let one_col = table(3, 1, &[1.0, 2.0, 3.0]);
        assert!(matches!(
            compute_independence_test(&one_col),
            Err(SurveyError::DegenerateTable { rows: 3, cols: 1 })
        ));
    }

    #[test]
    fn test_dof_three_by_three() {
        let t = table(3, 3, &[5.0, 1.0, 2.0, 1.0, 6.0, 2.0, 3.0, 3.0, 4.0]);
        let result = compute_independence_test(&t).unwrap();
        assert_eq!(result.dof, 4);
        assert_eq!(result.expected.shape(), (3, 3));
    }

    #[test]
    fn test_known_counts_statistic() {
        // Expected [[12, 18], [28, 42]]
        let t = table(2, 2, &[10.0, 20.0, 30.0, 40.0]);
        let config = ChiSquareConfig {
            observed: Observed::Counts,
            yates_correction: false,
        };
        let result = compute_independence_test_with_config(&t, &config).unwrap();

        assert_abs_diff_eq!(result.expected[(0, 0)], 12.0, epsilon = 1e-9);
        assert_abs_diff_eq!(result.expected[(1, 1)], 42.0, epsilon = 1e-9);
        assert_abs_diff_eq!(result.statistic, 0.793651, epsilon = 1e-5);
        assert_abs_diff_eq!(result.p_value, 0.3730, epsilon = 1e-3);
        assert!(!result.yates_corrected);
        assert!(!result.is_significant_at(0.05));
    }

    #[test]
    fn test_known_proportions_statistic() {
        // Proportions [[0.25, 0.75], [0.75, 0.25]], expected 0.5 everywhere.
        let t = table(2, 2, &[1.0, 3.0, 3.0, 1.0]);
        let result = compute_independence_test(&t).unwrap();

        assert_eq!(result.dof, 1);
        assert_abs_diff_eq!(result.expected[(0, 1)], 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(result.statistic, 0.5, epsilon = 1e-12);
        // erfc(0.5)
        assert_abs_diff_eq!(result.p_value, 0.479500, epsilon = 1e-6);
        assert_eq!(result.observed, Observed::Proportions);
    }

    #[test]
    fn test_yates_correction() {
        let t = table(2, 2, &[10.0, 20.0, 30.0, 40.0]);
        let config = ChiSquareConfig {
            observed: Observed::Counts,
            yates_correction: true,
        };
        let result = compute_independence_test_with_config(&t, &config).unwrap();

        assert!(result.yates_corrected);
        assert_abs_diff_eq!(result.statistic, 0.535714, epsilon = 1e-5);
    }

    #[test]
    fn test_yates_ignored_above_one_dof() {
        let t = table(3, 2, &[10.0, 20.0, 30.0, 40.0, 5.0, 5.0]);
        let config = ChiSquareConfig {
            observed: Observed::Counts,
            yates_correction: true,
        };
        let corrected = compute_independence_test_with_config(&t, &config).unwrap();
        let plain = compute_independence_test_with_config(
            &t,
            &ChiSquareConfig {
                yates_correction: false,
                ..config
            },
        )
        .unwrap();

        assert!(!corrected.yates_corrected);
        assert_eq!(corrected.statistic, plain.statistic);
    }

    #[test]
    fn test_zero_column_is_numeric_error() {
        let t = table(2, 3, &[1.0, 0.0, 2.0, 3.0, 0.0, 1.0]);
        let err = compute_independence_test(&t).unwrap_err();
        assert!(matches!(err, SurveyError::NumericDomain(_)));
    }

    #[test]
    fn test_strong_association() {
        let t = table(2, 2, &[50.0, 0.5, 0.5, 50.0]);
        let config = ChiSquareConfig {
            observed: Observed::Counts,
            ..Default::default()
        };
        let result = compute_independence_test_with_config(&t, &config).unwrap();

        assert!(result.statistic > 90.0);
        assert!(result.p_value >= 0.0 && result.p_value < 1e-10);
        assert!(result.is_significant_at(0.05));
    }
}
