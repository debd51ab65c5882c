//! Pipeline runner for composing and executing analysis steps.

use crate::crosstab::{build_contingency_table_with, TableOrder};
use crate::data::{ContingencyTable, Dataset};
use crate::error::{Result, SurveyError};
use crate::profile::{category_shares, cumulative_percentage, CategoryShares, CumulativeSeries};
use crate::report::{
    format_chisq, format_cumulative, format_dataset, format_shares, format_table, ReportConfig,
};
use crate::test::{compute_independence_test_with_config, ChiSquareConfig, ChiSquareResult};
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// A step in the analysis pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AnalysisStep {
    // === Record selection ===
    /// Keep only the named columns (the key column is always kept).
    Select { fields: Vec<String> },
    /// Keep records whose numeric field is greater than a threshold.
    FilterGreaterThan { field: String, threshold: f64 },
    /// Sort records by a field.
    SortBy {
        field: String,
        #[serde(default)]
        descending: bool,
    },
    /// Keep the first `n` records.
    Head { n: usize },
    /// Add a boolean column flagging records whose key is in `members`.
    Membership { field: String, members: Vec<String> },

    // === Summaries ===
    /// Report the current records.
    ShowDataset {
        #[serde(default)]
        title: Option<String>,
    },
    /// Count records per level of a field.
    CategoryShares { field: String },
    /// Running share of a numeric field, largest records first.
    CumulativePercentage { field: String },

    // === Association ===
    /// Row-normalised cross-tabulation.
    CrossTab {
        group: String,
        category: String,
        #[serde(default)]
        order: TableOrder,
        #[serde(default)]
        title: Option<String>,
    },
    /// Chi-square independence test of the most recent cross-tabulation.
    IndependenceTest {
        subhead: String,
        #[serde(default)]
        config: ChiSquareConfig,
    },
}

/// Pipeline configuration for serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Name of the pipeline.
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: Option<String>,
    /// Text report options.
    #[serde(default)]
    pub report: ReportConfig,
    /// Steps to execute.
    pub steps: Vec<AnalysisStep>,
}

impl PipelineConfig {
    /// Load from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(SurveyError::from)
    }

    /// Save to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(SurveyError::from)
    }
}

/// One produced result of a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalysisOutput {
    Dataset {
        title: Option<String>,
        dataset: Dataset,
    },
    Shares(CategoryShares),
    Cumulative(CumulativeSeries),
    CrossTab {
        title: Option<String>,
        table: ContingencyTable,
    },
    ChiSquare {
        subhead: String,
        result: ChiSquareResult,
    },
}

/// All outputs of a pipeline run, in step order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub name: String,
    pub description: Option<String>,
    pub outputs: Vec<AnalysisOutput>,
}

impl AnalysisReport {
    /// Number of outputs.
    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    /// Cross-tabulations produced by the run.
    pub fn tables(&self) -> Vec<&ContingencyTable> {
        self.outputs
            .iter()
            .filter_map(|o| match o {
                AnalysisOutput::CrossTab { table, .. } => Some(table),
                _ => None,
            })
            .collect()
    }

    /// Chi-square results produced by the run.
    pub fn chi_square_results(&self) -> Vec<&ChiSquareResult> {
        self.outputs
            .iter()
            .filter_map(|o| match o {
                AnalysisOutput::ChiSquare { result, .. } => Some(result),
                _ => None,
            })
            .collect()
    }

    /// Render every output as text.
    pub fn to_text(&self, config: &ReportConfig) -> String {
        let mut sections = vec![match &self.description {
            Some(desc) => format!("{}\n{}\n", self.name, desc),
            None => format!("{}\n", self.name),
        }];
        for output in &self.outputs {
            sections.push(match output {
                AnalysisOutput::Dataset { title, dataset } => {
                    let body = format_dataset(dataset, config);
                    match title {
                        Some(t) => format!("{}\n{}", t, body),
                        None => body,
                    }
                }
                AnalysisOutput::Shares(shares) => format_shares(shares, config),
                AnalysisOutput::Cumulative(series) => format_cumulative(series, config),
                AnalysisOutput::CrossTab { title, table } => {
                    format_table(table, title.as_deref().unwrap_or(""), config)
                }
                AnalysisOutput::ChiSquare { subhead, result } => {
                    format_chisq(result, subhead, config)
                }
            });
        }
        sections.join("\n")
    }
}

/// Builder for constructing and running analysis pipelines.
#[derive(Debug, Clone)]
pub struct Pipeline {
    steps: Vec<AnalysisStep>,
    name: String,
    description: Option<String>,
    report: ReportConfig,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Pipeline {
    /// Create a new empty pipeline.
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            name: "unnamed".to_string(),
            description: None,
            report: ReportConfig::default(),
        }
    }

    /// Create from a config.
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            steps: config.steps.clone(),
            name: config.name.clone(),
            description: config.description.clone(),
            report: config.report.clone(),
        }
    }

    /// Set the pipeline name.
    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Set the pipeline description.
    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Set the text report options saved with the pipeline.
    pub fn report_config(mut self, report: ReportConfig) -> Self {
        self.report = report;
        self
    }

    /// Text report options.
    pub fn report(&self) -> &ReportConfig {
        &self.report
    }

    /// Steps in execution order.
    pub fn steps(&self) -> &[AnalysisStep] {
        &self.steps
    }

    /// Add a raw step.
    pub fn step(mut self, step: AnalysisStep) -> Self {
        self.steps.push(step);
        self
    }

    /// Keep only the named columns.
    pub fn select(self, fields: &[&str]) -> Self {
        self.step(AnalysisStep::Select {
            fields: fields.iter().map(|f| f.to_string()).collect(),
        })
    }

    /// Keep records with `field > threshold`.
    pub fn filter_greater_than(self, field: &str, threshold: f64) -> Self {
        self.step(AnalysisStep::FilterGreaterThan {
            field: field.to_string(),
            threshold,
        })
    }

    pub fn sort_by(self, field: &str, descending: bool) -> Self {
        self.step(AnalysisStep::SortBy {
            field: field.to_string(),
            descending,
        })
    }

    pub fn head(self, n: usize) -> Self {
        self.step(AnalysisStep::Head { n })
    }

    /// Flag records whose key is one of `members`.
    pub fn membership(self, field: &str, members: &[&str]) -> Self {
        self.step(AnalysisStep::Membership {
            field: field.to_string(),
            members: members.iter().map(|m| m.to_string()).collect(),
        })
    }

    pub fn show_dataset(self, title: Option<&str>) -> Self {
        self.step(AnalysisStep::ShowDataset {
            title: title.map(String::from),
        })
    }

    pub fn category_shares(self, field: &str) -> Self {
        self.step(AnalysisStep::CategoryShares {
            field: field.to_string(),
        })
    }

    pub fn cumulative_percentage(self, field: &str) -> Self {
        self.step(AnalysisStep::CumulativePercentage {
            field: field.to_string(),
        })
    }

    /// Cross-tabulate `group` against `category`.
    pub fn crosstab(self, group: &str, category: &str, order: TableOrder) -> Self {
        self.step(AnalysisStep::CrossTab {
            group: group.to_string(),
            category: category.to_string(),
            order,
            title: None,
        })
    }

    /// Test the previous cross-tabulation for independence.
    pub fn independence_test(self, subhead: &str, config: ChiSquareConfig) -> Self {
        self.step(AnalysisStep::IndependenceTest {
            subhead: subhead.to_string(),
            config,
        })
    }

    /// Convert to config for serialization.
    pub fn to_config(&self, description: Option<&str>) -> PipelineConfig {
        PipelineConfig {
            name: self.name.clone(),
            description: description
                .map(String::from)
                .or_else(|| self.description.clone()),
            report: self.report.clone(),
            steps: self.steps.clone(),
        }
    }

    /// Run the pipeline on a dataset.
    ///
    /// A failing step aborts the run; no partial report is returned.
    pub fn run(&self, dataset: &Dataset) -> Result<AnalysisReport> {
        info!(
            "Running pipeline '{}' ({} steps) on {} records",
            self.name,
            self.steps.len(),
            dataset.len()
        );
        let mut state = PipelineState::new(dataset.clone());

        for (i, step) in self.steps.iter().enumerate() {
            debug!("Step {}: {:?}", i + 1, step);
            state = state.apply(step).map_err(|e| {
                SurveyError::Pipeline(format!("Step {} ({:?}) failed: {}", i + 1, step, e))
            })?;
        }

        Ok(AnalysisReport {
            name: self.name.clone(),
            description: self.description.clone(),
            outputs: state.outputs,
        })
    }
}

/// Internal state during pipeline execution.
struct PipelineState {
    dataset: Dataset,
    last_table: Option<ContingencyTable>,
    outputs: Vec<AnalysisOutput>,
}

impl PipelineState {
    fn new(dataset: Dataset) -> Self {
        Self {
            dataset,
            last_table: None,
            outputs: Vec::new(),
        }
    }

    fn apply(mut self, step: &AnalysisStep) -> Result<Self> {
        match step {
            // === Record selection ===
            AnalysisStep::Select { fields } => {
                let fields: Vec<&str> = fields.iter().map(String::as_str).collect();
                self.dataset = self.dataset.select(&fields)?;
            }
            AnalysisStep::FilterGreaterThan { field, threshold } => {
                self.dataset = self.dataset.filter_greater_than(field, *threshold)?;
                info!(
                    "{} records with {} > {}",
                    self.dataset.len(),
                    field,
                    threshold
                );
            }
            AnalysisStep::SortBy { field, descending } => {
                self.dataset = self.dataset.sort_by(field, *descending)?;
            }
            AnalysisStep::Head { n } => {
                self.dataset = self.dataset.head(*n);
            }
            AnalysisStep::Membership { field, members } => {
                self.dataset = self.dataset.with_membership(field, members)?;
            }

            // === Summaries ===
            AnalysisStep::ShowDataset { title } => {
                self.outputs.push(AnalysisOutput::Dataset {
                    title: title.clone(),
                    dataset: self.dataset.clone(),
                });
            }
            AnalysisStep::CategoryShares { field } => {
                self.outputs
                    .push(AnalysisOutput::Shares(category_shares(&self.dataset, field)?));
            }
            AnalysisStep::CumulativePercentage { field } => {
                self.outputs.push(AnalysisOutput::Cumulative(cumulative_percentage(
                    &self.dataset,
                    field,
                )?));
            }

            // === Association ===
            AnalysisStep::CrossTab {
                group,
                category,
                order,
                title,
            } => {
                let table = build_contingency_table_with(&self.dataset, group, category, order)?;
                self.last_table = Some(table.clone());
                self.outputs.push(AnalysisOutput::CrossTab {
                    title: title.clone(),
                    table,
                });
            }
            AnalysisStep::IndependenceTest { subhead, config } => {
                let table = self.last_table.as_ref().ok_or_else(|| {
                    SurveyError::Pipeline(
                        "Must cross-tabulate before an independence test".to_string(),
                    )
                })?;
                let result = compute_independence_test_with_config(table, config)?;
                info!(
                    "{}: chi2={:.4}, p={:.4e}, dof={}",
                    subhead, result.statistic, result.p_value, result.dof
                );
                self.outputs.push(AnalysisOutput::ChiSquare {
                    subhead: subhead.clone(),
                    result,
                });
            }
        }
        Ok(self)
    }
}

/// Convenience function: cross-tabulate and test in one call.
pub fn run_crosstab_test(
    dataset: &Dataset,
    group: &str,
    category: &str,
    order: TableOrder,
    config: ChiSquareConfig,
) -> Result<(ContingencyTable, ChiSquareResult)> {
    let table = build_contingency_table_with(dataset, group, category, &order)?;
    let result = compute_independence_test_with_config(&table, &config)?;
    Ok((table, result))
}
