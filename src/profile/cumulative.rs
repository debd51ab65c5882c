//! Cumulative percentage series over a numeric field.

use crate::data::Dataset;
use crate::error::{Result, SurveyError};
use serde::{Deserialize, Serialize};

/// One record in a cumulative series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CumulativePoint {
    /// Record key, or the record position when the dataset has no key.
    pub label: String,
    pub value: f64,
    /// Running share of the field total, in percent.
    pub cumulative_percentage: f64,
}

/// Records ordered by a numeric field, largest first, with running totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CumulativeSeries {
    pub field: String,
    pub points: Vec<CumulativePoint>,
    pub total: f64,
}

impl CumulativeSeries {
    /// Number of leading records needed to reach `percentage` of the total.
    pub fn records_to_reach(&self, percentage: f64) -> Option<usize> {
        self.points
            .iter()
            .position(|p| p.cumulative_percentage >= percentage)
            .map(|i| i + 1)
    }
}

/// Sort records by `field` descending and accumulate their share of the total.
///
/// Records with a missing value are skipped. Fails with `InvalidParameter`
/// if the field holds non-numeric values and with `NumericDomain` if the
/// total is not positive.
pub fn cumulative_percentage(dataset: &Dataset, field: &str) -> Result<CumulativeSeries> {
    let values = dataset.column(field)?;
    let labels = dataset
        .keys()
        .unwrap_or_else(|| (0..dataset.len()).map(|i| i.to_string()).collect());

    let mut entries = Vec::with_capacity(values.len());
    for (label, value) in labels.into_iter().zip(values) {
        if value.is_missing() {
            continue;
        }
        let v = value.as_f64().ok_or_else(|| {
            SurveyError::InvalidParameter(format!(
                "Field '{}' is not numeric (found '{}')",
                field, value
            ))
        })?;
        entries.push((label, v));
    }

    let total: f64 = entries.iter().map(|(_, v)| v).sum();
    if total <= 0.0 || !total.is_finite() {
        return Err(SurveyError::NumericDomain(format!(
            "Total of '{}' must be positive, got {}",
            field, total
        )));
    }

    entries.sort_by(|a, b| b.1.total_cmp(&a.1));
    let mut running = 0.0;
    let points = entries
        .into_iter()
        .map(|(label, value)| {
            running += value;
            CumulativePoint {
                label,
                value,
                cumulative_percentage: running / total * 100.0,
            }
        })
        .collect();

    Ok(CumulativeSeries {
        field: field.to_string(),
        points,
        total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Value;
    use approx::assert_relative_eq;

    fn records() -> Dataset {
        Dataset::from_rows(
            &["name", "sw"],
            vec![
                vec!["Leeds".into(), 10i64.into()],
                vec!["York".into(), 0i64.into()],
                vec!["Durham".into(), 30i64.into()],
                vec!["Keele".into(), Value::Missing],
                vec!["Exeter".into(), 10i64.into()],
            ],
        )
        .unwrap()
        .with_key_field("name")
        .unwrap()
    }

    #[test]
    fn test_cumulative_percentage() {
        let series = cumulative_percentage(&records(), "sw").unwrap();

        assert_relative_eq!(series.total, 50.0);
        let labels: Vec<&str> = series.points.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["Durham", "Leeds", "Exeter", "York"]);
        assert_relative_eq!(series.points[0].cumulative_percentage, 60.0);
        assert_relative_eq!(series.points[2].cumulative_percentage, 100.0);
        assert_relative_eq!(series.points[3].cumulative_percentage, 100.0);
        assert_eq!(series.records_to_reach(80.0), Some(2));
    }

    #[test]
    fn test_non_numeric_field() {
        let err = cumulative_percentage(&records(), "name").unwrap_err();
        assert!(matches!(err, SurveyError::InvalidParameter(_)));
    }

    #[test]
    fn test_zero_total() {
        let data = Dataset::from_rows(&["sw"], vec![vec![0i64.into()]]).unwrap();
        let err = cumulative_percentage(&data, "sw").unwrap_err();
        assert!(matches!(err, SurveyError::NumericDomain(_)));
    }
}
