use thiserror::Error;

/// Reasons a chart cannot be built for the current uploads and selections.
///
/// Every variant is terminal for the render pass: no partial chart exists.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChartError {
    #[error(
        "'Timestamp' column not found in file {}. Available columns: {available:?}",
        .dataset_index + 1
    )]
    TimestampColumnMissing {
        dataset_index: usize,
        available: Vec<String>,
    },

    #[error(
        "Column '{column}' not found in file {}. Available columns: {available:?}",
        .dataset_index + 1
    )]
    ColumnNotFound {
        dataset_index: usize,
        column: String,
        available: Vec<String>,
    },

    #[error("{selections} column selection(s) for {datasets} file(s)")]
    SelectionCountMismatch { datasets: usize, selections: usize },

    #[error("selection refers to file {} but only {datasets} are loaded", .dataset_index + 1)]
    DatasetIndexOutOfRange { dataset_index: usize, datasets: usize },

    #[error("colour palette is empty")]
    EmptyPalette,
}

/// Result type for chart operations
pub type ChartResult<T> = Result<T, ChartError>;
