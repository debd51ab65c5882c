//! Category shares of a single field.

use crate::data::{distinct_levels, Dataset, Value};
use crate::error::{Result, SurveyError};
use serde::{Deserialize, Serialize};

/// Count and share of one level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryShare {
    pub label: String,
    pub count: usize,
    /// Proportion of non-missing records (0.0-1.0).
    pub proportion: f64,
}

/// Distribution of levels in one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryShares {
    /// Field the shares were computed for.
    pub field: String,
    /// Shares per level, in natural level order.
    pub shares: Vec<CategoryShare>,
    /// Number of non-missing records.
    pub total: usize,
    /// Number of records with a missing value.
    pub n_missing: usize,
}

impl CategoryShares {
    /// Share of a level, if present.
    pub fn get(&self, label: &str) -> Option<&CategoryShare> {
        self.shares.iter().find(|s| s.label == label)
    }

    /// Number of distinct levels.
    pub fn n_levels(&self) -> usize {
        self.shares.len()
    }
}

impl std::fmt::Display for CategoryShares {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Shares of '{}' ({} records)", self.field, self.total)?;
        for share in &self.shares {
            writeln!(
                f,
                "  {}: {} ({:.1}%)",
                share.label,
                share.count,
                share.proportion * 100.0
            )?;
        }
        if self.n_missing > 0 {
            writeln!(f, "  Missing: {}", self.n_missing)?;
        }
        Ok(())
    }
}

/// Count how many records fall into each level of `field`.
pub fn category_shares(dataset: &Dataset, field: &str) -> Result<CategoryShares> {
    let values = dataset.column(field)?;
    let n_missing = values.iter().filter(|v| v.is_missing()).count();
    let total = values.len() - n_missing;
    if total == 0 {
        return Err(SurveyError::EmptyData(format!(
            "Field '{}' has no values",
            field
        )));
    }

    let shares = distinct_levels(values.iter().copied())
        .iter()
        .map(|level| {
            let label = level.label();
            let count = values
                .iter()
                .filter(|v| !v.is_missing() && v.label() == label)
                .count();
            CategoryShare {
                label,
                count,
                proportion: count as f64 / total as f64,
            }
        })
        .collect();

    Ok(CategoryShares {
        field: field.to_string(),
        shares,
        total,
        n_missing,
    })
}

/// Shares of a field counted directly from values, for callers without a dataset.
pub fn category_shares_of(field: &str, values: &[Value]) -> Result<CategoryShares> {
    let dataset = Dataset::from_rows(&[field], values.iter().map(|v| vec![v.clone()]).collect())?;
    category_shares(&dataset, field)
}
