//! Data structures for repository survey analysis.

mod contingency;
mod dataset;
mod value;

pub use contingency::ContingencyTable;
pub use dataset::Dataset;
pub use value::{distinct_levels, infer_type, Value, ValueType};
