use std::collections::HashMap;
use std::ops::RangeInclusive;

use chrono::{DateTime, NaiveDateTime};
use eframe::egui::{Color32, RichText, Ui};
use egui_plot::{AxisHints, GridMark, HPlacement, Legend, Line, Plot, PlotPoint, PlotPoints};

use crate::chart::spec::Trace;
use crate::chart::AxisSide;
use crate::color::screen_colors;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Chart plot (central panel)
// ---------------------------------------------------------------------------

/// Render the assembled chart, or the reason there is none.
pub fn chart_plot(ui: &mut Ui, state: &AppState) {
    let spec = match &state.chart {
        None => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading("Please upload at least one CSV file.  (File → Open CSV files…)");
            });
            return;
        }
        Some(Err(e)) => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.label(RichText::new(e.to_string()).color(Color32::RED).strong());
            });
            return;
        }
        Some(Ok(spec)) => spec,
    };

    ui.vertical_centered(|ui: &mut Ui| {
        ui.heading(&spec.title);
    });

    let scales: Vec<AxisScale> = spec
        .y_axes
        .iter()
        .map(|axis| AxisScale::fit(spec.traces_on(axis.id).flat_map(|t| t.y.iter().flatten().copied())))
        .collect();

    let y_axes: Vec<AxisHints> = spec
        .y_axes
        .iter()
        .zip(&scales)
        .map(|(axis, &scale)| {
            let placement = match axis.side {
                AxisSide::Left => HPlacement::Left,
                AxisSide::Right => HPlacement::Right,
            };
            AxisHints::new_y()
                .label(axis.title.clone())
                .placement(placement)
                .formatter(move |mark: GridMark, _range: &RangeInclusive<f64>| {
                    format_value(scale.from_plot(mark.value))
                })
        })
        .collect();

    let sources: Vec<&str> = state.uploads.iter().map(|u| u.name.as_str()).collect();
    let labels = line_labels(&spec.traces, &sources);
    let hover = hover_scales(&spec.traces, &labels, &scales);

    let trace_colors: Vec<_> = spec.traces.iter().map(|t| &t.color).collect();
    let colors = screen_colors(&trace_colors);

    Plot::new("overlay_plot")
        .legend(Legend::default())
        .x_axis_label(spec.x_axis.title.clone())
        .x_axis_formatter(|mark: GridMark, range: &RangeInclusive<f64>| {
            format_time(mark.value, range.end() - range.start())
        })
        .custom_y_axes(y_axes)
        .label_formatter(move |name: &str, point: &PlotPoint| {
            let time = format_time(point.x, 0.0);
            match hover.get(name) {
                Some(scale) => format!("{name}\n{time}\n{}", format_value(scale.from_plot(point.y))),
                None => time,
            }
        })
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for ((trace, label), &color) in spec.traces.iter().zip(&labels).zip(&colors) {
                let Some(&scale) = scales.get(trace.axis.0) else {
                    continue;
                };
                for segment in segments(trace, scale) {
                    let points: PlotPoints = segment.into_iter().collect();
                    let line = Line::new(points)
                        .name(label)
                        .color(color)
                        .width(1.5);
                    plot_ui.line(line);
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Line labels
// ---------------------------------------------------------------------------

/// On-screen legend names, unique per trace.
///
/// egui_plot groups lines by name, so traces sharing a name get the source
/// file appended, and the file number as well when file names repeat too.
fn line_labels(traces: &[Trace], sources: &[&str]) -> Vec<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for trace in traces {
        *counts.entry(trace.name.as_str()).or_default() += 1;
    }

    let qualified: Vec<String> = traces
        .iter()
        .enumerate()
        .map(|(i, trace)| match sources.get(i) {
            Some(source) if counts[trace.name.as_str()] > 1 => {
                format!("{} ({source})", trace.name)
            }
            _ => trace.name.clone(),
        })
        .collect();

    let mut qualified_counts: HashMap<&str, usize> = HashMap::new();
    for label in &qualified {
        *qualified_counts.entry(label.as_str()).or_default() += 1;
    }
    qualified
        .iter()
        .enumerate()
        .map(|(i, label)| {
            if qualified_counts[label.as_str()] > 1 {
                format!("{label} #{}", i + 1)
            } else {
                label.clone()
            }
        })
        .collect()
}

/// Scale of each trace's own axis, keyed by its on-screen label, so hover
/// text shows data units.
fn hover_scales(
    traces: &[Trace],
    labels: &[String],
    scales: &[AxisScale],
) -> HashMap<String, AxisScale> {
    traces
        .iter()
        .zip(labels)
        .filter_map(|(t, label)| Some((label.clone(), *scales.get(t.axis.0)?)))
        .collect()
}

// ---------------------------------------------------------------------------
// Axis scaling
// ---------------------------------------------------------------------------

/// Maps one axis's data range onto the shared `0..=1` plot range, which is
/// how independently scaled axes overlay a single plot area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisScale {
    min: f64,
    span: f64,
}

impl AxisScale {
    pub fn fit(values: impl Iterator<Item = f64>) -> Self {
        let (min, max) = values
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });
        if !min.is_finite() {
            return AxisScale { min: 0.0, span: 1.0 };
        }
        let span = max - min;
        if span.abs() < f64::EPSILON {
            // Flat series sit in the middle of the plot.
            return AxisScale {
                min: min - 0.5,
                span: 1.0,
            };
        }
        AxisScale { min, span }
    }

    pub fn to_plot(self, value: f64) -> f64 {
        (value - self.min) / self.span
    }

    pub fn from_plot(self, plot_y: f64) -> f64 {
        self.min + plot_y * self.span
    }
}

/// Plot points of `trace`, split wherever a row has no x or no y.
fn segments(trace: &Trace, scale: AxisScale) -> Vec<Vec<[f64; 2]>> {
    let mut out = Vec::new();
    let mut current = Vec::new();
    for (x, y) in trace.x.iter().zip(&trace.y) {
        match (x, y) {
            (Some(x), Some(y)) => current.push([timestamp_to_x(*x), scale.to_plot(*y)]),
            _ => {
                if !current.is_empty() {
                    out.push(std::mem::take(&mut current));
                }
            }
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

/// Seconds since the Unix epoch.
fn timestamp_to_x(ts: NaiveDateTime) -> f64 {
    ts.and_utc().timestamp_millis() as f64 / 1000.0
}

fn format_time(x: f64, visible_span: f64) -> String {
    let Some(dt) = DateTime::from_timestamp_millis((x * 1000.0).round() as i64) else {
        return String::new();
    };
    let fmt = if visible_span > 3.0 * 86_400.0 {
        "%Y-%m-%d"
    } else {
        "%Y-%m-%d %H:%M:%S"
    };
    dt.naive_utc().format(fmt).to_string()
}

fn format_value(v: f64) -> String {
    if v != 0.0 && (v.abs() >= 1e6 || v.abs() < 1e-3) {
        format!("{v:.3e}")
    } else {
        let s = format!("{v:.3}");
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}
