//! Single-field profiles: category shares and cumulative percentages.

pub mod cumulative;
pub mod shares;

pub use cumulative::{cumulative_percentage, CumulativePoint, CumulativeSeries};
pub use shares::{category_shares, category_shares_of, CategoryShare, CategoryShares};
