//! Repository Survey Analysis Library
//!
//! This library cross-tabulates categorical fields of a tabular survey of
//! institutional repositories and tests them for association.
//!
//! # Overview
//!
//! The library is organized into composable modules:
//!
//! - **data**: Core data structures (Dataset, Value, ContingencyTable)
//! - **crosstab**: Row-normalised cross-tabulation with display ordering
//! - **test**: Pearson chi-square test of independence
//! - **profile**: Category shares and cumulative percentages
//! - **report**: Text, JSON and YAML rendering with explicit options
//! - **pipeline**: Pipeline composition and execution
//!
//! # Example
//!
//! ```no_run
//! use repo_survey::prelude::*;
//!
//! let data = Dataset::from_csv("survey.csv", Some("name")).unwrap();
//!
//! let report = Pipeline::new()
//!     .select(&["ris_software_enum", "Category"])
//!     .category_shares("Category")
//!     .crosstab(
//!         "ris_software_enum",
//!         "Category",
//!         TableOrder::new().sort_by("Contains software"),
//!     )
//!     .independence_test("Software records by RIS framework", ChiSquareConfig::default())
//!     .run(&data)
//!     .unwrap();
//!
//! println!("{}", report.to_text(&ReportConfig::default()));
//! ```

pub mod crosstab;
pub mod data;
pub mod error;
pub mod pipeline;
pub mod profile;
pub mod report;
pub mod test;

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::crosstab::{build_contingency_table, build_contingency_table_with, TableOrder};
    pub use crate::data::{ContingencyTable, Dataset, Value, ValueType};
    pub use crate::error::{Result, SurveyError};
    pub use crate::pipeline::{
        run_crosstab_test, AnalysisOutput, AnalysisReport, AnalysisStep, Pipeline, PipelineConfig,
    };
    pub use crate::profile::{
        category_shares, cumulative_percentage, CategoryShare, CategoryShares, CumulativePoint,
        CumulativeSeries,
    };
    pub use crate::report::{
        format_chisq, format_cumulative, format_dataset, format_shares, format_table,
        to_structured, OutputFormat, ReportConfig,
    };
    pub use crate::test::{
        compute_independence_test, compute_independence_test_with_config, ChiSquareConfig,
        ChiSquareResult, Observed,
    };
}
