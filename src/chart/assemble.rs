use crate::data::model::{CellValue, Dataset, TIMESTAMP_COLUMN};

use super::error::{ChartError, ChartResult};
use super::spec::{
    AxisConfig, AxisId, AxisSide, ChartSpec, Color, Trace, TraceMode, XAxisConfig,
};

pub const CHART_TITLE: &str = "Comparison of Data from Multiple Files";
pub const X_AXIS_TITLE: &str = "Timestamp";

/// Horizontal offset added per secondary axis. Axes past the fifth or so can
/// still collide on screen.
pub const AXIS_OFFSET_STEP: f64 = 0.1;

/// Which column of which dataset to plot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SeriesSelection {
    pub dataset_index: usize,
    pub column: String,
}

impl SeriesSelection {
    pub fn new(dataset_index: usize, column: impl Into<String>) -> Self {
        Self {
            dataset_index,
            column: column.into(),
        }
    }
}

/// Check every dataset for the shared `Timestamp` column, then assemble.
pub fn build_chart(
    datasets: &[&Dataset],
    selections: &[SeriesSelection],
    palette: &[Color],
) -> ChartResult<ChartSpec> {
    validate_timestamps(datasets)?;
    assemble(datasets, selections, palette)
}

/// Fails on the first dataset without a `Timestamp` column.
pub fn validate_timestamps(datasets: &[&Dataset]) -> ChartResult<()> {
    match datasets.iter().position(|ds| !ds.has_column(TIMESTAMP_COLUMN)) {
        Some(dataset_index) => Err(ChartError::TimestampColumnMissing {
            dataset_index,
            available: datasets[dataset_index].column_names.clone(),
        }),
        None => Ok(()),
    }
}

/// Build one trace and one y-axis per selection.
///
/// Selection `i` is drawn against axis `y{i+1}` in colour
/// `palette[i % palette.len()]`. The first missing column aborts the whole
/// assembly.
pub fn assemble(
    datasets: &[&Dataset],
    selections: &[SeriesSelection],
    palette: &[Color],
) -> ChartResult<ChartSpec> {
    if palette.is_empty() {
        return Err(ChartError::EmptyPalette);
    }
    if datasets.len() != selections.len() {
        return Err(ChartError::SelectionCountMismatch {
            datasets: datasets.len(),
            selections: selections.len(),
        });
    }

    let mut traces = Vec::with_capacity(selections.len());
    let mut y_axes = Vec::with_capacity(selections.len());

    for (i, selection) in selections.iter().enumerate() {
        let dataset_index = selection.dataset_index;
        let dataset = datasets
            .get(dataset_index)
            .ok_or(ChartError::DatasetIndexOutOfRange {
                dataset_index,
                datasets: datasets.len(),
            })?;

        let values = dataset
            .column(&selection.column)
            .ok_or_else(|| ChartError::ColumnNotFound {
                dataset_index,
                column: selection.column.clone(),
                available: dataset.column_names.clone(),
            })?;
        let timestamps =
            dataset
                .timestamps()
                .ok_or_else(|| ChartError::TimestampColumnMissing {
                    dataset_index,
                    available: dataset.column_names.clone(),
                })?;

        let axis = AxisId(i);
        traces.push(Trace {
            name: format!("Data from {}", selection.column),
            x: timestamps.iter().map(CellValue::as_timestamp).collect(),
            y: values.iter().map(CellValue::as_f64).collect(),
            color: palette[i % palette.len()].clone(),
            axis,
            mode: TraceMode::Lines,
        });
        y_axes.push(axis_config(axis, &selection.column));
    }

    log::debug!("Assembled chart with {} trace(s)", traces.len());
    Ok(ChartSpec {
        title: CHART_TITLE.to_string(),
        x_axis: XAxisConfig {
            title: X_AXIS_TITLE.to_string(),
        },
        y_axes,
        traces,
    })
}

/// Axis 0 sits on the left. Every other axis overlays it, odd ones on the
/// right and even ones on the left, shifted by [`AXIS_OFFSET_STEP`] per index.
pub fn axis_config(axis: AxisId, column: &str) -> AxisConfig {
    let title = format!("Value - Data from {column}");
    if axis.is_primary() {
        return AxisConfig {
            id: axis,
            title,
            side: AxisSide::Left,
            overlaying: None,
            position: None,
        };
    }

    AxisConfig {
        id: axis,
        title,
        side: if axis.0 % 2 == 1 {
            AxisSide::Right
        } else {
            AxisSide::Left
        },
        overlaying: Some(AxisId::PRIMARY),
        position: Some(AXIS_OFFSET_STEP * axis.0 as f64),
    }
}
