//! Building contingency tables from a dataset.

use crate::crosstab::order::TableOrder;
use crate::data::{distinct_levels, ContingencyTable, Dataset, Value};
use crate::error::{Result, SurveyError};
use log::debug;
use nalgebra::DMatrix;
use std::collections::HashMap;

/// Cross-tabulate `group_field` against `category_field`, normalised by row.
///
/// Records are partitioned by the distinct values of `group_field`; within
/// each partition, occurrences of each `category_field` value are counted and
/// divided by the partition size. Records with a missing value in either
/// field are skipped. Rows and columns are in natural level order.
///
/// # Errors
/// `InvalidField` if either field is absent, `EmptyData` if no record has
/// values in both fields.
pub fn build_contingency_table(
    dataset: &Dataset,
    group_field: &str,
    category_field: &str,
) -> Result<ContingencyTable> {
    build_contingency_table_with(dataset, group_field, category_field, &TableOrder::default())
}

/// Cross-tabulate and then apply a display order.
pub fn build_contingency_table_with(
    dataset: &Dataset,
    group_field: &str,
    category_field: &str,
    order: &TableOrder,
) -> Result<ContingencyTable> {
    let groups = dataset.column(group_field)?;
    let categories = dataset.column(category_field)?;

    let pairs: Vec<(&Value, &Value)> = groups
        .into_iter()
        .zip(categories)
        .filter(|(g, c)| !g.is_missing() && !c.is_missing())
        .collect();
    if pairs.is_empty() {
        return Err(SurveyError::EmptyData(format!(
            "No records with values for both '{}' and '{}'",
            group_field, category_field
        )));
    }

    let row_labels = level_labels(pairs.iter().map(|(g, _)| *g));
    let column_labels = level_labels(pairs.iter().map(|(_, c)| *c));
    let row_index = index_of(&row_labels);
    let column_index = index_of(&column_labels);

    let mut counts = DMatrix::zeros(row_labels.len(), column_labels.len());
    for (g, c) in &pairs {
        counts[(row_index[&g.label()], column_index[&c.label()])] += 1.0;
    }

    debug!(
        "Cross-tabulated {} records into {} x {} table ({} by {})",
        pairs.len(),
        row_labels.len(),
        column_labels.len(),
        group_field,
        category_field
    );

    let table = ContingencyTable::from_counts(
        group_field,
        category_field,
        row_labels,
        column_labels,
        counts,
    )?;
    Ok(order.apply(table))
}

fn level_labels<'a, I>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a Value>,
{
    distinct_levels(values).iter().map(Value::label).collect()
}

fn index_of(labels: &[String]) -> HashMap<String, usize> {
    labels
        .iter()
        .enumerate()
        .map(|(i, l)| (l.clone(), i))
        .collect()
}
