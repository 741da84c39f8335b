//! Standalone HTML export of a [`ChartSpec`] as a Plotly figure.

use std::path::Path;

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use maud::{html, PreEscaped, DOCTYPE};
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::config::ExportConfig;

use super::spec::ChartSpec;

const DATA_URI_PREFIX: &str = "data:text/html;base64,";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";
pub const DOWNLOAD_LABEL: &str = "Download Plotly HTML File";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("not an HTML data URI")]
    NotDataUri,
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("payload is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Where the exported document gets plotly.js from.
#[derive(Debug, Clone, PartialEq)]
pub enum PlotlyJs {
    /// `<script src=...>` pointing at a CDN.
    Cdn(String),
    /// Library source embedded into the document.
    Inline(String),
}

impl PlotlyJs {
    /// Inline the local library when one is configured, else use the CDN.
    pub fn from_config(config: &ExportConfig) -> Result<Self> {
        match &config.plotly_js_path {
            Some(path) => {
                let source = std::fs::read_to_string(path)
                    .with_context(|| format!("reading plotly.js from {}", path.display()))?;
                Ok(PlotlyJs::Inline(source))
            }
            None => Ok(PlotlyJs::Cdn(config.plotly_js_url.clone())),
        }
    }
}

// ---------------------------------------------------------------------------
// Plotly figure JSON
// ---------------------------------------------------------------------------

/// Plotly figure (`{"data": [...], "layout": {...}}`) for `spec`.
///
/// Axis records become the `yaxis`, `yaxis2`, ... layout keys here and
/// nowhere else.
pub fn to_plotly_json(spec: &ChartSpec) -> Value {
    let data: Vec<Value> = spec
        .traces
        .iter()
        .map(|trace| {
            let x: Vec<Option<String>> = trace
                .x
                .iter()
                .map(|ts| ts.map(|ts| ts.format(TIMESTAMP_FORMAT).to_string()))
                .collect();
            json!({
                "type": "scatter",
                "mode": trace.mode.as_str(),
                "name": trace.name,
                "x": x,
                "y": trace.y,
                "line": { "color": trace.color },
                "yaxis": trace.axis.trace_ref(),
            })
        })
        .collect();

    let mut layout = Map::new();
    layout.insert("title".into(), json!({ "text": spec.title }));
    layout.insert(
        "xaxis".into(),
        json!({ "title": { "text": spec.x_axis.title } }),
    );
    for axis in &spec.y_axes {
        let mut cfg = Map::new();
        cfg.insert("title".into(), json!({ "text": axis.title }));
        cfg.insert("side".into(), json!(axis.side));
        if let Some(base) = axis.overlaying {
            cfg.insert("overlaying".into(), json!(base.trace_ref()));
        }
        if let Some(position) = axis.position {
            cfg.insert("position".into(), json!(position));
        }
        layout.insert(axis.id.layout_key(), Value::Object(cfg));
    }

    json!({ "data": data, "layout": layout })
}

// ---------------------------------------------------------------------------
// HTML document
// ---------------------------------------------------------------------------

/// Self-contained HTML page rendering `spec` with plotly.js.
pub fn to_html(spec: &ChartSpec, plotly_js: &PlotlyJs) -> String {
    // `</` inside a JSON string would end the script element early.
    let figure = to_plotly_json(spec).to_string().replace("</", "<\\/");
    let boot = format!(
        "var figure = {figure};\nPlotly.newPlot(\"chart\", figure.data, figure.layout, {{\"responsive\": true}});"
    );

    let markup = html! {
        (DOCTYPE)
        html {
            head {
                meta charset="utf-8";
                title { (spec.title) }
                @match plotly_js {
                    PlotlyJs::Cdn(url) => {
                        script src=(url) {}
                    }
                    PlotlyJs::Inline(source) => {
                        script { (PreEscaped(source)) }
                    }
                }
            }
            body {
                div id="chart" style="width:100%;height:100vh;" {}
                script { (PreEscaped(boot)) }
            }
        }
    };
    markup.into_string()
}

/// Write the HTML document for `spec` to `path`.
pub fn save_html(spec: &ChartSpec, plotly_js: &PlotlyJs, path: &Path) -> Result<()> {
    let document = to_html(spec, plotly_js);
    std::fs::write(path, document.as_bytes())
        .with_context(|| format!("writing {}", path.display()))?;
    log::info!(
        "Exported chart with {} trace(s) to {}",
        spec.traces.len(),
        path.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Data URI download
// ---------------------------------------------------------------------------

/// `data:text/html;base64,...` carrying `document` unchanged.
pub fn data_uri(document: &str) -> String {
    format!("{DATA_URI_PREFIX}{}", STANDARD.encode(document.as_bytes()))
}

/// Recover the document from a URI produced by [`data_uri`].
pub fn decode_data_uri(uri: &str) -> Result<String, ExportError> {
    let payload = uri
        .strip_prefix(DATA_URI_PREFIX)
        .ok_or(ExportError::NotDataUri)?;
    let bytes = STANDARD.decode(payload)?;
    Ok(String::from_utf8(bytes)?)
}

/// Anchor element that downloads `document` as `file_name`.
pub fn download_link(document: &str, file_name: &str) -> String {
    html! {
        a href=(data_uri(document)) download=(file_name) { (DOWNLOAD_LABEL) }
    }
    .into_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::assemble::{assemble, SeriesSelection};
    use crate::chart::spec::Color;
    use crate::data::loader::parse_csv;

    fn two_series_chart() -> ChartSpec {
        let a = parse_csv("a.csv", b"Timestamp,Temp\n2024-01-01 00:00:00,20.5\n2024-01-01 01:00:00,\n").unwrap();
        let b = parse_csv("b.csv", b"Timestamp,</script>\n2024-01-01 00:00:00,1013\n").unwrap();
        assemble(
            &[&a, &b],
            &[SeriesSelection::new(0, "Temp"), SeriesSelection::new(1, "</script>")],
            &[Color::new("blue"), Color::new("red")],
        )
        .unwrap()
    }

    #[test]
    fn figure_json_maps_axes_to_layout_keys() {
        let figure = to_plotly_json(&two_series_chart());

        let data = figure["data"].as_array().unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data[0]["name"], "Data from Temp");
        assert_eq!(data[0]["yaxis"], "y");
        assert_eq!(data[0]["mode"], "lines");
        assert_eq!(data[0]["line"]["color"], "blue");
        assert_eq!(data[0]["x"][0], "2024-01-01 00:00:00");
        assert!(data[0]["y"][1].is_null());
        assert_eq!(data[1]["yaxis"], "y2");

        let layout = &figure["layout"];
        assert_eq!(layout["title"]["text"], "Comparison of Data from Multiple Files");
        assert_eq!(layout["xaxis"]["title"]["text"], "Timestamp");
        assert_eq!(layout["yaxis"]["title"]["text"], "Value - Data from Temp");
        assert!(layout["yaxis"].get("overlaying").is_none());
        assert_eq!(layout["yaxis2"]["overlaying"], "y");
        assert_eq!(layout["yaxis2"]["side"], "right");
        assert_eq!(layout["yaxis2"]["position"], 0.1);
    }

    #[test]
    fn html_embeds_figure_and_loader() {
        let html = to_html(
            &two_series_chart(),
            &PlotlyJs::Cdn("https://cdn.example/plotly.min.js".into()),
        );

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains(r#"<script src="https://cdn.example/plotly.min.js"></script>"#));
        assert!(html.contains("Plotly.newPlot"));
        assert!(html.contains("Data from Temp"));
        // Only the two script elements we emit are closed.
        assert_eq!(html.matches("</script>").count(), 2);
    }

    #[test]
    fn inline_library_is_embedded_verbatim() {
        let html = to_html(&two_series_chart(), &PlotlyJs::Inline("window.Plotly = {};".into()));
        assert!(html.contains("<script>window.Plotly = {};</script>"));
    }

    #[test]
    fn data_uri_is_reversible() {
        let html = to_html(&two_series_chart(), &PlotlyJs::Cdn("plotly.js".into()));
        let uri = data_uri(&html);
        assert!(uri.starts_with("data:text/html;base64,"));
        assert_eq!(decode_data_uri(&uri).unwrap(), html);
        assert!(matches!(decode_data_uri("http://x"), Err(ExportError::NotDataUri)));
    }

    #[test]
    fn download_link_names_the_file() {
        let link = download_link("<p>hi</p>", "plotly_figure.html");
        assert!(link.starts_with("<a href=\"data:text/html;base64,"));
        assert!(link.contains(r#"download="plotly_figure.html""#));
        assert!(link.ends_with(">Download Plotly HTML File</a>"));
    }

    #[test]
    fn save_html_writes_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plotly_figure.html");
        let spec = two_series_chart();
        let js = PlotlyJs::Cdn("plotly.js".into());

        save_html(&spec, &js, &path).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), to_html(&spec, &js));
    }

    #[test]
    fn plotly_js_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let lib = dir.path().join("plotly.min.js");
        std::fs::write(&lib, "/* plotly */").unwrap();

        let mut config = ExportConfig::default();
        assert_eq!(
            PlotlyJs::from_config(&config).unwrap(),
            PlotlyJs::Cdn(config.plotly_js_url.clone())
        );

        config.plotly_js_path = Some(lib);
        assert_eq!(
            PlotlyJs::from_config(&config).unwrap(),
            PlotlyJs::Inline("/* plotly */".into())
        );

        config.plotly_js_path = Some(dir.path().join("missing.js"));
        assert!(PlotlyJs::from_config(&config).is_err());
    }
}
