//! Pipeline composition and execution for survey analyses.

mod runner;

pub use runner::{
    run_crosstab_test, AnalysisOutput, AnalysisReport, AnalysisStep, Pipeline, PipelineConfig,
};
