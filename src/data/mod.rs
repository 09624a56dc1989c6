//! Turning user text into a dataset and the dataset into a chart element.

pub mod chart;
pub mod dataset;
