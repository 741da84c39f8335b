use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::chart::export::{save_html, to_html, PlotlyJs};
use crate::chart::{build_chart, ChartError, ChartSpec, SeriesSelection};
use crate::config::AppConfig;
use crate::data::cache::{DatasetCache, Fingerprint};
use crate::data::loader::{display_name, read_upload};
use crate::data::model::Dataset;

// ---------------------------------------------------------------------------
// Uploads
// ---------------------------------------------------------------------------

/// One successfully parsed upload and the column chosen for it.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    /// Source on disk, used by reload. `None` for in-memory uploads.
    pub path: Option<PathBuf>,
    pub fingerprint: Fingerprint,
    pub dataset: Arc<Dataset>,
    pub selected_column: String,
}

/// An upload that could not be read or parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadFailure {
    pub name: String,
    /// Kept so reload can retry the file. `None` for in-memory uploads.
    pub path: Option<PathBuf>,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: AppConfig,

    /// Parsed uploads in upload order.
    pub uploads: Vec<UploadedFile>,

    /// Uploads that failed to load; they take no part in the chart.
    pub failures: Vec<UploadFailure>,

    /// Outcome of the latest assembly. `None` while nothing is uploaded.
    pub chart: Option<Result<ChartSpec, ChartError>>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    cache: DatasetCache,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            uploads: Vec::new(),
            failures: Vec::new(),
            chart: None,
            status_message: None,
            cache: DatasetCache::new(),
        }
    }

    /// Replace the upload set with `paths`.
    pub fn open_files(&mut self, paths: &[PathBuf]) {
        self.uploads.clear();
        self.failures.clear();
        self.add_files(paths);
    }

    /// Append `paths` to the upload set.
    pub fn add_files(&mut self, paths: &[PathBuf]) {
        for path in paths {
            self.ingest_path(path);
        }
        self.upload_set_changed();
    }

    /// Add an upload from bytes already in memory.
    pub fn add_bytes(&mut self, name: &str, bytes: &[u8]) {
        self.ingest(name, None, bytes);
        self.upload_set_changed();
    }

    pub fn remove_file(&mut self, index: usize) {
        if index < self.uploads.len() {
            let removed = self.uploads.remove(index);
            log::info!("Removed {}", removed.name);
            self.upload_set_changed();
        }
    }

    /// Re-read every upload from disk, retrying earlier failures too.
    /// Selections survive when the column still exists.
    pub fn reload(&mut self) {
        let previous = std::mem::take(&mut self.uploads);
        let failed = std::mem::take(&mut self.failures);

        for upload in previous {
            let Some(path) = upload.path.clone() else {
                self.uploads.push(upload);
                continue;
            };
            let bytes = match read_upload(&path) {
                Ok(bytes) => bytes,
                Err(e) => {
                    self.record_failure(upload.name, Some(path), e.to_string());
                    continue;
                }
            };
            let before = self.uploads.len();
            self.ingest(&upload.name, Some(path), &bytes);
            if self.uploads.len() > before {
                if let Some(reloaded) = self.uploads.last_mut() {
                    if reloaded.dataset.has_column(&upload.selected_column) {
                        reloaded.selected_column = upload.selected_column;
                    }
                }
            }
        }
        for failure in failed {
            if let Some(path) = failure.path {
                self.ingest_path(&path);
            }
        }
        self.upload_set_changed();
    }

    pub fn clear(&mut self) {
        self.uploads.clear();
        self.failures.clear();
        self.cache.clear();
        self.upload_set_changed();
    }

    /// Choose the plotted column of upload `index`.
    pub fn select_column(&mut self, index: usize, column: &str) {
        if let Some(upload) = self.uploads.get_mut(index) {
            if upload.selected_column != column {
                upload.selected_column = column.to_string();
                self.rebuild_chart();
            }
        }
    }

    /// One selection per upload, selection `i` pointing at upload `i`.
    pub fn selections(&self) -> Vec<SeriesSelection> {
        self.uploads
            .iter()
            .enumerate()
            .map(|(i, u)| SeriesSelection::new(i, u.selected_column.clone()))
            .collect()
    }

    /// The assembled chart, if the latest assembly succeeded.
    pub fn chart_spec(&self) -> Option<&ChartSpec> {
        self.chart.as_ref().and_then(|r| r.as_ref().ok())
    }

    /// Re-run the pipeline from scratch over the current uploads.
    pub fn rebuild_chart(&mut self) {
        if self.uploads.is_empty() {
            self.chart = None;
            return;
        }

        let datasets: Vec<&Dataset> = self.uploads.iter().map(|u| u.dataset.as_ref()).collect();
        let result = build_chart(&datasets, &self.selections(), &self.config.palette());
        match &result {
            Ok(spec) => log::info!("Built chart with {} trace(s)", spec.traces.len()),
            Err(e) => log::warn!("Chart not built: {e}"),
        }
        self.chart = Some(result);
    }

    /// HTML document for the current chart.
    pub fn export_html(&self) -> Result<String> {
        let spec = self
            .chart_spec()
            .context("there is no chart to export")?;
        let plotly_js = PlotlyJs::from_config(&self.config.export)?;
        Ok(to_html(spec, &plotly_js))
    }

    /// Write the current chart to `path`.
    pub fn export_to(&self, path: &Path) -> Result<()> {
        let spec = self
            .chart_spec()
            .context("there is no chart to export")?;
        let plotly_js = PlotlyJs::from_config(&self.config.export)?;
        save_html(spec, &plotly_js, path)
    }

    pub fn cache(&self) -> &DatasetCache {
        &self.cache
    }

    fn ingest_path(&mut self, path: &Path) {
        let name = display_name(path);
        match read_upload(path) {
            Ok(bytes) => self.ingest(&name, Some(path.to_path_buf()), &bytes),
            Err(e) => self.record_failure(name, Some(path.to_path_buf()), e.to_string()),
        }
    }

    fn ingest(&mut self, name: &str, path: Option<PathBuf>, bytes: &[u8]) {
        match self.cache.get_or_parse(name, bytes) {
            Ok((fingerprint, dataset)) => {
                log::info!(
                    "Loaded {name}: {} rows, columns {:?}",
                    dataset.len(),
                    dataset.column_names
                );
                let selected_column = dataset.default_value_column().unwrap_or_default().to_string();
                self.uploads.push(UploadedFile {
                    name: name.to_string(),
                    path,
                    fingerprint,
                    dataset,
                    selected_column,
                });
            }
            Err(e) => self.record_failure(name.to_string(), path, e.to_string()),
        }
    }

    /// A newer failure of the same file replaces the old entry.
    fn record_failure(&mut self, name: String, path: Option<PathBuf>, message: String) {
        log::error!("Failed to load {name}: {message}");
        self.failures.retain(|f| f.name != name);
        self.failures.push(UploadFailure { name, path, message });
    }

    fn upload_set_changed(&mut self) {
        let live: HashSet<Fingerprint> = self.uploads.iter().map(|u| u.fingerprint).collect();
        self.cache.retain(&live);
        self.status_message = None;
        self.rebuild_chart();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEMPS: &[u8] = b"Timestamp,Temp,Humidity\n2024-01-01 00:00:00,20.5,40\n2024-01-01 01:00:00,21.0,42\n";
    const PRESSURE: &[u8] = b"Timestamp,Pressure\n2024-01-01 00:00:00,1013\n";
    const NO_TIMESTAMP: &[u8] = b"Time,Temp\n1,2\n";

    #[test]
    fn nothing_uploaded_means_no_chart() {
        let state = AppState::default();
        assert!(state.chart.is_none());
        assert!(state.chart_spec().is_none());
    }

    #[test]
    fn uploads_default_to_first_value_column() {
        let mut state = AppState::default();
        state.add_bytes("a.csv", TEMPS);
        state.add_bytes("b.csv", PRESSURE);

        assert_eq!(
            state.selections(),
            vec![SeriesSelection::new(0, "Temp"), SeriesSelection::new(1, "Pressure")]
        );
        let spec = state.chart_spec().unwrap();
        assert_eq!(spec.traces.len(), 2);
        assert_eq!(spec.traces[1].color.as_str(), "red");
    }

    #[test]
    fn selecting_a_column_rebuilds() {
        let mut state = AppState::default();
        state.add_bytes("a.csv", TEMPS);
        state.select_column(0, "Humidity");

        let spec = state.chart_spec().unwrap();
        assert_eq!(spec.traces[0].name, "Data from Humidity");
        assert_eq!(spec.y_axes[0].title, "Value - Data from Humidity");
    }

    #[test]
    fn missing_timestamp_halts_the_whole_chart() {
        let mut state = AppState::default();
        state.add_bytes("a.csv", TEMPS);
        state.add_bytes("c.csv", NO_TIMESTAMP);

        assert!(matches!(
            state.chart,
            Some(Err(ChartError::TimestampColumnMissing { dataset_index: 1, .. }))
        ));
        assert!(state.export_html().is_err());
    }

    #[test]
    fn unparseable_upload_is_listed_and_skipped() {
        let mut state = AppState::default();
        state.add_bytes("a.csv", TEMPS);
        state.add_bytes("bad.csv", b"Timestamp,A\nnope,1\n");

        assert_eq!(state.uploads.len(), 1);
        assert_eq!(state.failures.len(), 1);
        assert_eq!(state.failures[0].name, "bad.csv");
        assert!(state.chart_spec().is_some());
    }

    #[test]
    fn removing_an_upload_evicts_its_cache_entry() {
        let mut state = AppState::default();
        state.add_bytes("a.csv", TEMPS);
        state.add_bytes("b.csv", PRESSURE);
        assert_eq!(state.cache().len(), 2);

        state.remove_file(0);

        assert_eq!(state.cache().len(), 1);
        assert_eq!(state.uploads[0].name, "b.csv");
        assert_eq!(state.chart_spec().unwrap().traces[0].name, "Data from Pressure");

        state.remove_file(0);
        assert!(state.chart.is_none());
        assert!(state.cache().is_empty());
    }

    #[test]
    fn re_adding_same_bytes_hits_the_cache() {
        let mut state = AppState::default();
        state.add_bytes("a.csv", TEMPS);
        state.add_bytes("a-again.csv", TEMPS);

        assert_eq!(state.cache().misses(), 1);
        assert_eq!(state.cache().hits(), 1);
        assert_eq!(state.uploads.len(), 2);
    }

    #[test]
    fn open_files_replaces_and_reload_keeps_selection() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.csv");
        let b = dir.path().join("b.csv");
        std::fs::write(&a, TEMPS).unwrap();
        std::fs::write(&b, PRESSURE).unwrap();

        let mut state = AppState::default();
        state.add_bytes("memory.csv", PRESSURE);
        state.open_files(&[a.clone(), b.clone(), dir.path().join("missing.csv")]);

        assert_eq!(state.uploads.len(), 2);
        assert_eq!(state.failures.len(), 1);
        state.select_column(0, "Humidity");

        std::fs::write(&a, "Timestamp,Temp,Humidity\n2024-01-02 00:00:00,19,50\n").unwrap();
        state.reload();

        assert_eq!(state.uploads[0].selected_column, "Humidity");
        assert_eq!(state.uploads[0].dataset.len(), 1);
        assert_eq!(state.failures.len(), 1);
        assert_eq!(state.failures[0].name, "missing.csv");
        assert_eq!(state.cache().len(), 2);
    }

    #[test]
    fn reload_recovers_a_file_restored_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.csv");
        std::fs::write(&a, TEMPS).unwrap();

        let mut state = AppState::default();
        state.open_files(&[a.clone()]);
        std::fs::remove_file(&a).unwrap();
        state.reload();

        assert!(state.uploads.is_empty());
        assert_eq!(state.failures.len(), 1);
        assert_eq!(state.failures[0].path.as_deref(), Some(a.as_path()));

        std::fs::write(&a, TEMPS).unwrap();
        state.reload();

        assert_eq!(state.uploads.len(), 1);
        assert!(state.failures.is_empty());
        assert_eq!(state.chart_spec().unwrap().traces[0].name, "Data from Temp");
    }

    #[test]
    fn re_adding_a_bad_file_replaces_its_failure() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("bad.csv");
        std::fs::write(&bad, "Timestamp,A\nnope,1\n").unwrap();

        let mut state = AppState::default();
        state.add_files(&[bad.clone()]);
        state.add_files(&[bad.clone()]);
        state.add_bytes("bad.csv", b"Timestamp,A\nstill-nope,1\n");

        assert_eq!(state.failures.len(), 1);
        assert!(state.failures[0].message.contains("still-nope"));
    }

    #[test]
    fn export_writes_html() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = AppState::default();
        state.add_bytes("a.csv", TEMPS);

        let out = dir.path().join("plotly_figure.html");
        state.export_to(&out).unwrap();

        let html = std::fs::read_to_string(out).unwrap();
        assert!(html.contains("Data from Temp"));
    }

    #[test]
    fn clear_resets_everything() {
        let mut state = AppState::default();
        state.add_bytes("a.csv", TEMPS);
        state.clear();

        assert!(state.uploads.is_empty());
        assert!(state.chart.is_none());
        assert!(state.cache().is_empty());
    }
}
