//! Statistical hypothesis testing for contingency tables.

pub mod chisq;

pub use chisq::{
    compute_independence_test, compute_independence_test_with_config, ChiSquareConfig,
    ChiSquareResult, Observed,
};
