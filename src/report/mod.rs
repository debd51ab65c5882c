//! Plain-text and structured reporting of analysis results.
//!
//! Display options are passed explicitly through [`ReportConfig`] rather
//! than held as global state.

use crate::data::{ContingencyTable, Dataset};
use crate::error::{Result, SurveyError};
use crate::profile::{CategoryShares, CumulativeSeries};
use crate::test::ChiSquareResult;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

const RULE: &str = "******************************************************";

/// Formatting options for text reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Decimal places for proportions and statistics.
    pub precision: usize,
    /// Maximum rows printed per table; `None` prints all rows.
    pub max_rows: Option<usize>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            precision: 4,
            max_rows: None,
        }
    }
}

/// Output encoding for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Yaml,
}

impl FromStr for OutputFormat {
    type Err = SurveyError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "yaml" => Ok(Self::Yaml),
            other => Err(SurveyError::InvalidParameter(format!(
                "Unknown output format '{}'; expected text, json or yaml",
                other
            ))),
        }
    }
}

/// Serialize any result type as JSON or YAML.
pub fn to_structured<T: Serialize>(value: &T, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(value)?),
        OutputFormat::Yaml => Ok(serde_yaml::to_string(value)?),
        OutputFormat::Text => Err(SurveyError::InvalidParameter(
            "Text output has no structured encoding".to_string(),
        )),
    }
}

/// Render a contingency table of proportions with row totals.
pub fn format_table(table: &ContingencyTable, title: &str, config: &ReportConfig) -> String {
    let p = config.precision;
    let label_width = table
        .row_labels()
        .iter()
        .map(String::len)
        .chain(std::iter::once(table.row_field.len()))
        .max()
        .unwrap_or(0);
    let col_widths: Vec<usize> = table
        .column_labels()
        .iter()
        .map(|l| l.len().max(p + 2))
        .collect();

    let mut out = String::new();
    if !title.is_empty() {
        out.push_str(&format!("{}\n", title));
    }
    out.push_str(&format!("{:<width$}", table.row_field, width = label_width));
    for (label, w) in table.column_labels().iter().zip(&col_widths) {
        out.push_str(&format!("  {:>w$}", label, w = *w));
    }
    out.push_str(&format!("  {:>5}\n", "n"));

    let totals = table.row_totals();
    let shown = config.max_rows.unwrap_or(usize::MAX).min(table.n_rows());
    for (i, label) in table.row_labels().iter().take(shown).enumerate() {
        out.push_str(&format!("{:<width$}", label, width = label_width));
        for (j, w) in col_widths.iter().enumerate() {
            out.push_str(&format!(
                "  {:>w$.p$}",
                table.proportions()[(i, j)],
                w = *w,
                p = p
            ));
        }
        out.push_str(&format!("  {:>5}\n", totals[i]));
    }
    if shown < table.n_rows() {
        out.push_str(&format!("... {} more rows\n", table.n_rows() - shown));
    }
    out.push_str(&format!(
        "[{} rows x {} columns, categories of '{}']\n",
        table.n_rows(),
        table.n_cols(),
        table.column_field
    ));
    out
}

/// Render a chi-square test result under a banner.
pub fn format_chisq(result: &ChiSquareResult, subhead: &str, config: &ReportConfig) -> String {
    let p = config.precision;
    let mut out = String::new();
    out.push_str(&format!("{}\nChi-square test of independence\n", RULE));
    out.push_str(&format!("{}\n{}\n", subhead, RULE));
    out.push_str(&format!("chi2= {:.p$}\n", result.statistic, p = p));
    out.push_str(&format!("p= {:.p$e}\n", result.p_value, p = p));
    out.push_str(&format!("dof= {}\n", result.dof));
    if result.yates_corrected {
        out.push_str("(Yates continuity correction applied)\n");
    }
    out.push_str("expected=\n");
    for row in result.expected.row_iter() {
        let cells: Vec<String> = row.iter().map(|v| format!("{:.p$}", v, p = p)).collect();
        out.push_str(&format!("  [{}]\n", cells.join(", ")));
    }
    out
}

/// Render category shares.
pub fn format_shares(shares: &CategoryShares, config: &ReportConfig) -> String {
    let p = config.precision.saturating_sub(2);
    let mut out = String::new();
    out.push_str(&format!(
        "Shares of '{}' ({} records)\n",
        shares.field, shares.total
    ));
    let shown = config.max_rows.unwrap_or(usize::MAX);
    for share in shares.shares.iter().take(shown) {
        out.push_str(&format!(
            "  {}: {} ({:.p$}%)\n",
            share.label,
            share.count,
            share.proportion * 100.0,
            p = p
        ));
    }
    if shares.n_missing > 0 {
        out.push_str(&format!("  Missing: {}\n", shares.n_missing));
    }
    out
}

/// Render a cumulative percentage series.
pub fn format_cumulative(series: &CumulativeSeries, config: &ReportConfig) -> String {
    let p = config.precision.saturating_sub(2);
    let mut out = String::new();
    out.push_str(&format!(
        "Cumulative share of '{}' (total {})\n",
        series.field, series.total
    ));
    let shown = config.max_rows.unwrap_or(usize::MAX);
    for point in series.points.iter().take(shown) {
        out.push_str(&format!(
            "  {}: {} ({:.p$}%)\n",
            point.label,
            point.value,
            point.cumulative_percentage,
            p = p
        ));
    }
    if series.points.len() > shown {
        out.push_str(&format!("  ... {} more\n", series.points.len() - shown));
    }
    out
}

/// Render dataset records, one per line.
pub fn format_dataset(dataset: &Dataset, config: &ReportConfig) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", dataset.columns().join(" | ")));
    let shown = config.max_rows.unwrap_or(usize::MAX).min(dataset.len());
    for i in 0..shown {
        if let Some(row) = dataset.row(i) {
            let cells: Vec<String> = row.iter().map(|v| v.to_string()).collect();
            out.push_str(&format!("{}\n", cells.join(" | ")));
        }
    }
    if shown < dataset.len() {
        out.push_str(&format!("... {} more rows\n", dataset.len() - shown));
    }
    out.push_str(&format!(
        "[{} rows x {} columns]\n",
        dataset.len(),
        dataset.columns().len()
    ));
    out
}
